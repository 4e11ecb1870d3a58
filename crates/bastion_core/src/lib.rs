//! # Bastion Core
//!
//! Energy-economy defense simulation core.
//!
//! Energy is a unified resource: it is both a structure's health and its
//! attack fuel. Towers and the core structure decay passively on a fixed
//! cadence, take combat damage, classify into discrete energy states, and
//! die (or shut down) when depleted. Towers acquire targets, resolve
//! cooldown-gated melee or ranged attacks, and animate a procedural limb
//! whose tip is the live attack origin.
//!
//! This crate contains **only** simulation logic:
//! - No rendering
//! - No IO
//! - No wall-clock time
//!
//! Everything advances through explicit `update(dt)` calls with simulated
//! seconds, so hosts at any frame rate see identical behavior per
//! simulated second.
//!
//! ## Crate Structure
//!
//! - [`components`] - shared value types (pools, layers, classification)
//! - [`consumer`] - towers and the core structure
//! - [`ledger`] - the energy registry and decay cadence
//! - [`targeting`] - candidate tracking and nearest-target selection
//! - [`combat`] - cooldown-gated attack resolution
//! - [`appendage`] - procedural limb animation
//! - [`supply`] - supply beams
//! - [`simulation`] - the top-level orchestrator

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod appendage;
pub mod combat;
pub mod components;
pub mod config;
pub mod consumer;
pub mod error;
pub mod ledger;
pub mod math;
pub mod simulation;
pub mod supply;
pub mod targeting;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::appendage::{AppendageAnimator, AppendagePhase};
    pub use crate::combat::{AttackResolution, CombatDispatcher, FireCommand, ProjectileSpec};
    pub use crate::components::{
        EnergyPool, EnergyState, EntityId, Health, StateChange, TargetLayer, Thresholds,
    };
    pub use crate::config::{AppendageTuning, TuningConfig};
    pub use crate::consumer::{ConsumerKind, EnergyConsumer, TowerStats};
    pub use crate::error::{Result, SimError};
    pub use crate::ledger::{EnergyLedger, LedgerEvent};
    pub use crate::simulation::{Simulation, TargetBody, TickEvents, Tower};
    pub use crate::supply::SupplyBeam;
    pub use crate::targeting::{TargetAcquisition, TargetInfo, TargetView};
}

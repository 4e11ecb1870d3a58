//! Tuning configuration for the energy economy and limb animation.
//!
//! Everything a designer would reasonably retune lives here, with serde
//! support so the host layer can load overrides. Defaults are the shipped
//! balance values.

use serde::{Deserialize, Serialize};

use crate::components::Thresholds;
use crate::error::{Result, SimError};

/// Top-level gameplay tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TuningConfig {
    /// Multiplier applied to every consumer's decay rate.
    pub global_decay_scalar: f32,
    /// Seconds of simulated time between decay passes.
    ///
    /// Decay runs on this fixed cadence regardless of how often the host
    /// calls `update`, so drain per simulated second is frame-rate
    /// independent.
    pub decay_interval: f32,
    /// Tower passive energy loss per second.
    pub tower_decay_rate: f32,
    /// Core structure passive energy loss per second.
    pub core_decay_rate: f32,
    /// Classification thresholds for towers.
    pub tower_thresholds: Thresholds,
    /// Classification thresholds for the core structure.
    pub core_thresholds: Thresholds,
    /// Melee damage multiplier over base damage.
    pub melee_multiplier: f32,
    /// Ranged range as a multiple of melee range, used when a tower is
    /// configured from its melee range alone. A tuned constant, not a law.
    pub ranged_range_multiplier: f32,
    /// Fraction of base damage deducted from the attacker's own energy on
    /// every successful attack.
    pub attack_cost_fraction: f32,
    /// Procedural limb animation tuning.
    pub appendage: AppendageTuning,
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            global_decay_scalar: 1.0,
            decay_interval: 0.1,
            tower_decay_rate: 0.5,
            core_decay_rate: 1.0,
            tower_thresholds: Thresholds::new(0.5, 0.25, 0.0),
            core_thresholds: Thresholds::new(0.45, 0.2, 0.0),
            melee_multiplier: 1.5,
            ranged_range_multiplier: 3.5,
            attack_cost_fraction: 0.1,
            appendage: AppendageTuning::default(),
        }
    }
}

impl TuningConfig {
    /// Validate ordering and positivity constraints.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConfig`] naming the first violated
    /// constraint.
    pub fn validate(&self) -> Result<()> {
        if self.decay_interval <= 0.0 {
            return Err(SimError::InvalidConfig(
                "decay_interval must be positive".into(),
            ));
        }
        if self.global_decay_scalar < 0.0 {
            return Err(SimError::InvalidConfig(
                "global_decay_scalar must not be negative".into(),
            ));
        }
        if !self.tower_thresholds.is_ordered() {
            return Err(SimError::InvalidConfig(
                "tower thresholds must satisfy dead < critical < low <= 1".into(),
            ));
        }
        if !self.core_thresholds.is_ordered() {
            return Err(SimError::InvalidConfig(
                "core thresholds must satisfy dead < critical < low <= 1".into(),
            ));
        }
        if self.ranged_range_multiplier < 1.0 {
            return Err(SimError::InvalidConfig(
                "ranged_range_multiplier must be >= 1 so melee_range <= ranged_range".into(),
            ));
        }
        if self.attack_cost_fraction < 0.0 {
            return Err(SimError::InvalidConfig(
                "attack_cost_fraction must not be negative".into(),
            ));
        }
        self.appendage.validate()
    }
}

/// Tuning for the procedurally deformed attack limb.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppendageTuning {
    /// Number of limb segments. The final segment is the attack tip.
    pub segment_count: usize,
    /// Full limb length in world units.
    pub limb_length: f32,
    /// Sway oscillation speed in radians per second at full energy.
    pub sway_speed: f32,
    /// Sway amplitude in world units at full energy.
    pub sway_amount: f32,
    /// Sway scale when the consumer is fully depleted; sway speed and
    /// amplitude lerp between this and 1.0 by energy fraction.
    pub depleted_sway_scale: f32,
    /// How aggressively segments pointing below horizontal are shortened.
    pub shortening_factor: f32,
    /// Seconds the firing pulse lasts.
    pub fire_duration: f32,
    /// Forward extension of the firing pulse in world units.
    pub fire_extend: f32,
    /// Seconds the melee-attack whip lasts.
    pub melee_attack_duration: f32,
    /// Whip amplitude during a melee attack.
    pub melee_whip: f32,
    /// Seconds the swipe arc lasts. May differ from the attack duration;
    /// both revert to idle independently.
    pub swipe_duration: f32,
    /// Total arc swept during a swipe, in degrees.
    pub swipe_arc_degrees: f32,
    /// Extra reach extension at the peak of a swipe, in world units.
    pub swipe_reach: f32,
    /// How strongly segments lean toward the current target.
    pub target_bias: f32,
}

impl Default for AppendageTuning {
    fn default() -> Self {
        Self {
            segment_count: 8,
            limb_length: 2.0,
            sway_speed: 2.2,
            sway_amount: 0.15,
            depleted_sway_scale: 0.35,
            shortening_factor: 0.6,
            fire_duration: 0.25,
            fire_extend: 0.4,
            melee_attack_duration: 0.3,
            melee_whip: 0.6,
            swipe_duration: 0.4,
            swipe_arc_degrees: 120.0,
            swipe_reach: 0.5,
            target_bias: 0.2,
        }
    }
}

impl AppendageTuning {
    /// Validate animation constraints.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConfig`] naming the first violated
    /// constraint.
    pub fn validate(&self) -> Result<()> {
        if self.segment_count == 0 {
            return Err(SimError::InvalidConfig(
                "appendage segment_count must be positive".into(),
            ));
        }
        if self.limb_length <= 0.0 {
            return Err(SimError::InvalidConfig(
                "appendage limb_length must be positive".into(),
            ));
        }
        for (name, duration) in [
            ("fire_duration", self.fire_duration),
            ("melee_attack_duration", self.melee_attack_duration),
            ("swipe_duration", self.swipe_duration),
        ] {
            if duration <= 0.0 {
                return Err(SimError::InvalidConfig(format!(
                    "appendage {name} must be positive"
                )));
            }
        }
        Ok(())
    }
}

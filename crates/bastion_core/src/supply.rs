//! Supply beams: continuous energy transfer into a consumer.
//!
//! A beam is a mechanical link only. Deciding whether the transfer is
//! affordable, metering a source pool, and rendering the beam are all the
//! host's concern; the beam just pushes `rate * dt` into its target every
//! tick and detaches when the target stops existing.

use serde::{Deserialize, Serialize};

use crate::components::EntityId;
use crate::config::TuningConfig;
use crate::ledger::{EnergyLedger, LedgerEvent};

/// A continuous energy feed into one consumer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SupplyBeam {
    /// The consumer receiving energy.
    pub target: EntityId,
    /// Energy transferred per simulated second.
    pub rate: f32,
    attached: bool,
}

impl SupplyBeam {
    /// Attach a beam to a consumer.
    #[must_use]
    pub fn new(target: EntityId, rate: f32) -> Self {
        Self {
            target,
            rate: rate.max(0.0),
            attached: true,
        }
    }

    /// Whether the beam is still delivering.
    #[must_use]
    pub const fn is_attached(&self) -> bool {
        self.attached
    }

    /// Sever the link. Detached beams are inert and can be dropped.
    pub fn detach(&mut self) {
        self.attached = false;
    }

    /// Deliver `rate * dt` energy to the target.
    ///
    /// Detaches when the target is destroyed or no longer registered.
    /// Returns the ledger events the transfer produced.
    pub fn tick(
        &mut self,
        dt: f32,
        ledger: &mut EnergyLedger,
        config: &TuningConfig,
    ) -> Vec<LedgerEvent> {
        if !self.attached {
            return Vec::new();
        }
        let gone = ledger.get(self.target).map_or(true, |c| c.destroyed);
        if gone {
            tracing::debug!(target_id = self.target, "supply beam lost its target");
            self.attached = false;
            return Vec::new();
        }
        ledger.supply(self.target, self.rate * dt.max(0.0), config)
    }
}

//! Energy consumers: towers and the core structure.
//!
//! A consumer's energy is simultaneously its health and its attack fuel.
//! Kind-specific behavior (decay rate, thresholds, game-over eligibility)
//! is dispatched through [`ConsumerKind`] rather than runtime type
//! inspection. All mutations return change records; threshold crossings are
//! detected by comparing previous vs new classification so passive decay
//! and direct damage share one code path.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::components::{EnergyPool, EnergyState, EntityId, StateChange, Thresholds};
use crate::config::TuningConfig;

/// Variant tag selecting kind-specific energy behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConsumerKind {
    /// Defensive tower. Depletion disables it; supply re-enables it.
    Tower,
    /// Central core structure. Depletion destroys it and ends the run.
    Core,
}

impl ConsumerKind {
    /// Passive energy loss per second for this kind.
    #[must_use]
    pub fn decay_rate(self, config: &TuningConfig) -> f32 {
        match self {
            Self::Tower => config.tower_decay_rate,
            Self::Core => config.core_decay_rate,
        }
    }

    /// Classification thresholds for this kind.
    #[must_use]
    pub fn thresholds(self, config: &TuningConfig) -> Thresholds {
        match self {
            Self::Tower => config.tower_thresholds,
            Self::Core => config.core_thresholds,
        }
    }

    /// Whether depleting this kind ends the run.
    #[must_use]
    pub const fn is_game_over_trigger(self) -> bool {
        matches!(self, Self::Core)
    }
}

/// Combat statistics for a tower.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TowerStats {
    /// Base attack damage.
    pub damage: f32,
    /// Attacks per second.
    pub fire_rate: f32,
    /// Maximum distance for the melee tier.
    pub melee_range: f32,
    /// Maximum distance for the ranged tier.
    pub ranged_range: f32,
    /// Candidate validity radius. Must satisfy
    /// `melee_range <= ranged_range <= detection_range`.
    pub detection_range: f32,
    /// Fraction of incoming damage absorbed, in `[0, 1)`.
    pub armor_reduction: f32,
    /// Projectile travel speed. `None` means no projectile capability is
    /// configured and ranged attacks fall back to instant damage.
    pub projectile_speed: Option<f32>,
}

impl TowerStats {
    /// Create tower stats with explicit ranges.
    #[must_use]
    pub fn new(damage: f32, fire_rate: f32, melee_range: f32, ranged_range: f32) -> Self {
        Self {
            damage,
            fire_rate,
            melee_range,
            ranged_range,
            detection_range: ranged_range,
            armor_reduction: 0.0,
            projectile_speed: None,
        }
    }

    /// Create tower stats from melee range alone, deriving the ranged range
    /// via the configured multiplier.
    #[must_use]
    pub fn from_melee_range(
        damage: f32,
        fire_rate: f32,
        melee_range: f32,
        config: &TuningConfig,
    ) -> Self {
        Self::new(
            damage,
            fire_rate,
            melee_range,
            melee_range * config.ranged_range_multiplier,
        )
    }

    /// Builder method to set armor reduction.
    #[must_use]
    pub fn with_armor_reduction(mut self, armor_reduction: f32) -> Self {
        self.armor_reduction = armor_reduction.clamp(0.0, 0.99);
        self
    }

    /// Builder method to enable projectiles.
    #[must_use]
    pub const fn with_projectile_speed(mut self, speed: f32) -> Self {
        self.projectile_speed = Some(speed);
        self
    }

    /// Builder method to widen the detection radius.
    #[must_use]
    pub fn with_detection_range(mut self, detection_range: f32) -> Self {
        self.detection_range = detection_range.max(self.ranged_range);
        self
    }

    /// Seconds between attacks.
    #[must_use]
    pub fn cooldown(&self) -> f32 {
        if self.fire_rate <= 0.0 {
            f32::INFINITY
        } else {
            1.0 / self.fire_rate
        }
    }
}

impl Default for TowerStats {
    fn default() -> Self {
        Self::new(10.0, 1.0, 1.5, 5.25)
    }
}

/// Result of a damage application.
///
/// `destroyed` and `disabled` are set only when this call caused the
/// transition, guaranteeing at most one notification per consumer.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DamageOutcome {
    /// Damage actually removed after armor reduction and clamping.
    pub actual: f32,
    /// Classification change, if a threshold was crossed.
    pub change: Option<StateChange>,
    /// The consumer was destroyed by this call.
    pub destroyed: bool,
    /// The consumer was disabled by this call.
    pub disabled: bool,
}

/// Result of a supply application.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SupplyOutcome {
    /// Energy actually added after clamping at maximum.
    pub added: f32,
    /// Classification change, if a threshold was crossed.
    pub change: Option<StateChange>,
    /// A disabled tower came back online.
    pub reenabled: bool,
}

/// An energy-bearing entity registered with the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyConsumer {
    /// Entity identifier.
    pub id: EntityId,
    /// Behavior variant.
    pub kind: ConsumerKind,
    /// World position.
    pub position: Vec2,
    /// Unified health-and-fuel pool.
    pub energy: EnergyPool,
    /// Fraction of incoming damage absorbed.
    pub armor_reduction: f32,
    /// Current classification bucket.
    pub state: EnergyState,
    /// Terminal flag; destroyed consumers ignore further mutation.
    pub destroyed: bool,
    /// Towers only: offline but repairable.
    pub disabled: bool,
}

impl EnergyConsumer {
    /// Create a tower consumer at full energy.
    #[must_use]
    pub fn tower(id: EntityId, position: Vec2, max_energy: f32, armor_reduction: f32) -> Self {
        Self {
            id,
            kind: ConsumerKind::Tower,
            position,
            energy: EnergyPool::new(max_energy),
            armor_reduction,
            state: EnergyState::Normal,
            destroyed: false,
            disabled: false,
        }
    }

    /// Create the core structure at full energy.
    #[must_use]
    pub fn core(id: EntityId, position: Vec2, max_energy: f32) -> Self {
        Self {
            id,
            kind: ConsumerKind::Core,
            position,
            energy: EnergyPool::new(max_energy),
            armor_reduction: 0.0,
            state: EnergyState::Normal,
            destroyed: false,
            disabled: false,
        }
    }

    /// Current energy as a fraction of maximum.
    #[must_use]
    pub fn energy_fraction(&self) -> f32 {
        self.energy.fraction()
    }

    /// Whether this consumer can currently act (target and fire).
    #[must_use]
    pub const fn is_operational(&self) -> bool {
        !self.destroyed && !self.disabled
    }

    /// Recompute classification, returning the crossing if one occurred.
    fn reclassify(&mut self, config: &TuningConfig) -> Option<StateChange> {
        let thresholds = self.kind.thresholds(config);
        let current = EnergyState::classify(self.energy.fraction(), &thresholds);
        if current == self.state {
            return None;
        }
        let change = StateChange {
            previous: self.state,
            current,
        };
        self.state = current;
        Some(change)
    }

    /// React to a newly entered Depleted state. Towers shut down; the core
    /// is destroyed (game-over eligibility is the ledger's concern).
    fn on_depleted(&mut self) -> (bool, bool) {
        match self.kind {
            ConsumerKind::Tower => {
                let newly_disabled = !self.disabled;
                self.disabled = true;
                (false, newly_disabled)
            }
            ConsumerKind::Core => {
                let newly_destroyed = !self.destroyed;
                self.destroyed = true;
                (newly_destroyed, false)
            }
        }
    }

    /// Apply combat damage through the armor path.
    ///
    /// Already-destroyed consumers are skipped entirely, so a second hit can
    /// never produce a second destruction notification.
    pub fn take_damage(&mut self, amount: f32, config: &TuningConfig) -> DamageOutcome {
        if self.destroyed {
            return DamageOutcome::default();
        }
        let actual = self
            .energy
            .drain(amount.max(0.0) * (1.0 - self.armor_reduction));
        self.settle(actual, config)
    }

    /// Apply passive decay (no armor on the decay path).
    pub fn apply_decay(&mut self, amount: f32, config: &TuningConfig) -> DamageOutcome {
        if self.destroyed {
            return DamageOutcome::default();
        }
        let actual = self.energy.drain(amount.max(0.0));
        self.settle(actual, config)
    }

    fn settle(&mut self, actual: f32, config: &TuningConfig) -> DamageOutcome {
        let change = self.reclassify(config);
        let (destroyed, disabled) = if self.state == EnergyState::Depleted {
            self.on_depleted()
        } else {
            (false, false)
        };
        DamageOutcome {
            actual,
            change,
            destroyed,
            disabled,
        }
    }

    /// Apply an energy supply.
    ///
    /// Disabling happens at the dead threshold, so re-enabling mirrors it:
    /// supply that lifts the classification out of Depleted brings a
    /// disabled tower back online.
    pub fn apply_supply(&mut self, amount: f32, config: &TuningConfig) -> SupplyOutcome {
        if self.destroyed {
            return SupplyOutcome::default();
        }
        let added = self.energy.supply(amount);
        let change = self.reclassify(config);
        let reenabled = self.disabled && self.state != EnergyState::Depleted;
        if reenabled {
            self.disabled = false;
        }
        SupplyOutcome {
            added,
            change,
            reenabled,
        }
    }
}

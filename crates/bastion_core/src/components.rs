//! Shared value types: identifiers, health, energy pools and classification.
//!
//! These are pure data with no behavior beyond clamped arithmetic. Every
//! gameplay mutation goes through the ledger or the simulation.

use serde::{Deserialize, Serialize};

/// Unique identifier for entities.
pub type EntityId = u64;

// ============================================================================
// Plain damage sink
// ============================================================================

/// Health pool for entities outside the energy economy (enemies, players).
///
/// Anything a tower can hit that lacks the energy-consumer contract is
/// treated as this simpler kind: a float pool with no thresholds, no decay
/// and no classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Health {
    /// Current health points.
    pub current: f32,
    /// Maximum health points.
    pub max: f32,
}

impl Health {
    /// Create a new health pool at full health.
    #[must_use]
    pub const fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    /// Check if the entity is dead.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.current <= 0.0
    }

    /// Apply damage, returning the amount actually removed.
    pub fn apply_damage(&mut self, amount: f32) -> f32 {
        let actual = amount.max(0.0).min(self.current);
        self.current -= actual;
        actual
    }

    /// Heal, returning the amount actually restored.
    pub fn heal(&mut self, amount: f32) -> f32 {
        let actual = amount.max(0.0).min(self.max - self.current);
        self.current += actual;
        actual
    }
}

// ============================================================================
// Target layers
// ============================================================================

/// Bitmask layer for target filtering.
///
/// The external proximity provider reports candidates on enter/exit; the
/// layer mask is the second half of the validity predicate
/// (`distance <= range AND layer matches`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TargetLayer(pub u32);

impl TargetLayer {
    /// Hostile ground entities.
    pub const HOSTILE: Self = Self(1);
    /// Player-controlled entities.
    pub const PLAYER: Self = Self(1 << 1);
    /// Energy-bearing structures.
    pub const STRUCTURE: Self = Self(1 << 2);

    /// Check whether this layer passes the given filter.
    #[must_use]
    pub const fn matches(self, filter: Self) -> bool {
        self.0 & filter.0 != 0
    }

    /// Union of two layers.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

// ============================================================================
// Energy pool and classification
// ============================================================================

/// Energy pool: unified health-and-fuel resource.
///
/// Invariant: `0 <= current <= max` at every observation point. All
/// mutation is clamped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyPool {
    /// Current energy.
    current: f32,
    /// Maximum energy.
    max: f32,
}

impl EnergyPool {
    /// Create a full pool.
    #[must_use]
    pub fn new(max: f32) -> Self {
        let max = max.max(0.0);
        Self { current: max, max }
    }

    /// Current energy.
    #[must_use]
    pub const fn current(&self) -> f32 {
        self.current
    }

    /// Maximum energy.
    #[must_use]
    pub const fn max(&self) -> f32 {
        self.max
    }

    /// Current energy as a fraction of maximum, in `[0, 1]`.
    #[must_use]
    pub fn fraction(&self) -> f32 {
        if self.max <= 0.0 {
            0.0
        } else {
            self.current / self.max
        }
    }

    /// Check if the pool is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.current <= 0.0
    }

    /// Remove energy, clamped at zero. Returns the amount removed.
    pub fn drain(&mut self, amount: f32) -> f32 {
        let actual = amount.max(0.0).min(self.current);
        self.current -= actual;
        actual
    }

    /// Add energy, clamped at maximum. Returns the amount added.
    pub fn supply(&mut self, amount: f32) -> f32 {
        let actual = amount.max(0.0).min(self.max - self.current);
        self.current += actual;
        actual
    }
}

/// Classification thresholds as fractions of maximum energy.
///
/// Ordering invariant: `dead < critical < low <= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Upper bound of the Low band.
    pub low: f32,
    /// Upper bound of the Critical band.
    pub critical: f32,
    /// Upper bound of the Depleted band.
    pub dead: f32,
}

impl Thresholds {
    /// Create thresholds.
    #[must_use]
    pub const fn new(low: f32, critical: f32, dead: f32) -> Self {
        Self {
            low,
            critical,
            dead,
        }
    }

    /// Check the ordering invariant.
    #[must_use]
    pub fn is_ordered(&self) -> bool {
        self.dead < self.critical && self.critical < self.low && self.low <= 1.0
    }
}

/// Discrete energy-state bucket derived from energy fraction and thresholds.
///
/// Exactly one variant holds for any fraction: the bands partition `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum EnergyState {
    /// Healthy energy levels.
    #[default]
    Normal,
    /// Noticeably drained; cosmetic warning territory.
    Low,
    /// Nearly depleted; one step from shutdown.
    Critical,
    /// At or below the dead threshold.
    Depleted,
}

impl EnergyState {
    /// Classify an energy fraction against thresholds.
    ///
    /// Pure and total: every fraction maps to exactly one state.
    #[must_use]
    pub fn classify(fraction: f32, thresholds: &Thresholds) -> Self {
        if fraction <= thresholds.dead {
            Self::Depleted
        } else if fraction <= thresholds.critical {
            Self::Critical
        } else if fraction <= thresholds.low {
            Self::Low
        } else {
            Self::Normal
        }
    }

    /// Severity rank for comparisons; higher is worse.
    #[must_use]
    pub const fn severity(self) -> u8 {
        match self {
            Self::Normal => 0,
            Self::Low => 1,
            Self::Critical => 2,
            Self::Depleted => 3,
        }
    }
}

/// A classification change detected by comparing previous vs new state.
///
/// Threshold-crossing reactions key off these records rather than callback
/// invocation order, so reactions stay deterministic and orderable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChange {
    /// Classification before the mutation.
    pub previous: EnergyState,
    /// Classification after the mutation.
    pub current: EnergyState,
}

impl StateChange {
    /// Whether the state worsened (e.g. Low -> Critical).
    #[must_use]
    pub const fn worsened(&self) -> bool {
        self.current.severity() > self.previous.severity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    const TOWER: Thresholds = Thresholds::new(0.5, 0.25, 0.0);

    #[test]
    fn test_health_damage_clamps_at_zero() {
        let mut health = Health::new(10.0);
        let actual = health.apply_damage(25.0);
        assert_relative_eq!(actual, 10.0);
        assert_relative_eq!(health.current, 0.0);
        assert!(health.is_dead());
    }

    #[test]
    fn test_health_heal_clamps_at_max() {
        let mut health = Health::new(10.0);
        health.apply_damage(4.0);
        let actual = health.heal(100.0);
        assert_relative_eq!(actual, 4.0);
        assert_relative_eq!(health.current, 10.0);
    }

    #[test]
    fn test_layer_matching() {
        let filter = TargetLayer::HOSTILE.union(TargetLayer::PLAYER);
        assert!(TargetLayer::HOSTILE.matches(filter));
        assert!(TargetLayer::PLAYER.matches(filter));
        assert!(!TargetLayer::STRUCTURE.matches(filter));
    }

    #[test]
    fn test_pool_drain_supply_roundtrip() {
        let mut pool = EnergyPool::new(100.0);
        pool.drain(37.5);
        pool.supply(37.5);
        assert_relative_eq!(pool.current(), 100.0);
    }

    #[test]
    fn test_pool_supply_clamps_at_max() {
        let mut pool = EnergyPool::new(50.0);
        pool.drain(10.0);
        let added = pool.supply(1000.0);
        assert_relative_eq!(added, 10.0);
        assert_relative_eq!(pool.current(), 50.0);
    }

    #[test]
    fn test_classify_bands() {
        assert_eq!(EnergyState::classify(1.0, &TOWER), EnergyState::Normal);
        assert_eq!(EnergyState::classify(0.5, &TOWER), EnergyState::Low);
        assert_eq!(EnergyState::classify(0.25, &TOWER), EnergyState::Critical);
        assert_eq!(EnergyState::classify(0.0, &TOWER), EnergyState::Depleted);
    }

    #[test]
    fn test_state_change_worsened() {
        let change = StateChange {
            previous: EnergyState::Low,
            current: EnergyState::Critical,
        };
        assert!(change.worsened());

        let recovery = StateChange {
            previous: EnergyState::Critical,
            current: EnergyState::Normal,
        };
        assert!(!recovery.worsened());
    }

    proptest! {
        /// The pool invariant holds after any drain/supply sequence.
        #[test]
        fn prop_pool_stays_in_bounds(
            ops in prop::collection::vec((any::<bool>(), 0.0f32..500.0), 0..64)
        ) {
            let mut pool = EnergyPool::new(100.0);
            for (is_drain, amount) in ops {
                if is_drain {
                    pool.drain(amount);
                } else {
                    pool.supply(amount);
                }
                prop_assert!(pool.current() >= 0.0);
                prop_assert!(pool.current() <= pool.max());
            }
        }

        /// Classification is total: every fraction lands in exactly one band,
        /// and severity is monotone as energy falls.
        #[test]
        fn prop_classification_total_and_monotone(fraction in 0.0f32..=1.0) {
            let state = EnergyState::classify(fraction, &TOWER);
            let lower = EnergyState::classify((fraction - 0.01).max(0.0), &TOWER);
            prop_assert!(lower.severity() >= state.severity());
        }
    }
}

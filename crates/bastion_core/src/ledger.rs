//! Registry of energy-bearing entities and the decay cadence.
//!
//! The ledger is an explicitly constructed value passed by reference to
//! whoever needs it; there is no global instance. It applies periodic
//! decay, mediates damage and supply, and owns game-over bookkeeping.
//!
//! Decay runs on a fixed simulated-time cadence decoupled from the host's
//! frame rate: `tick(dt)` accumulates elapsed time and fires a decay pass
//! every `decay_interval` seconds, so drain per simulated second is
//! identical whether the host ticks at 30 Hz or 240 Hz.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::components::{EnergyState, EntityId, StateChange};
use crate::config::TuningConfig;
use crate::consumer::{ConsumerKind, DamageOutcome, EnergyConsumer};

/// Events emitted by ledger-mediated mutations.
///
/// Each threshold crossing produces exactly one event; reactions consume
/// these records in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LedgerEvent {
    /// A consumer's classification changed.
    StateCrossed {
        /// The consumer that crossed a threshold.
        id: EntityId,
        /// Previous and new classification.
        change: StateChange,
    },
    /// A tower shut down after reaching its dead threshold.
    Disabled {
        /// The tower that shut down.
        id: EntityId,
    },
    /// A disabled tower came back online after a supply.
    Reenabled {
        /// The tower that came back online.
        id: EntityId,
    },
    /// A consumer was destroyed. Emitted at most once per consumer.
    Destroyed {
        /// The destroyed consumer.
        id: EntityId,
    },
    /// The run ended. Emitted at most once per ledger.
    GameOver,
}

/// Tolerance when testing whether a decay pass is due.
const CADENCE_EPSILON: f32 = 1e-6;

/// Registry of all energy consumers in the simulation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnergyLedger {
    /// Registered consumers by id.
    consumers: HashMap<EntityId, EnergyConsumer>,
    /// One-shot game-over latch.
    game_over: bool,
    /// Simulated seconds accumulated toward the next decay pass.
    decay_accumulator: f32,
}

impl EnergyLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a consumer. Registering an id twice is a no-op; the
    /// original entry is kept.
    pub fn register(&mut self, consumer: EnergyConsumer) {
        self.consumers.entry(consumer.id).or_insert(consumer);
    }

    /// Remove a consumer. Unregistering an absent id is a no-op.
    pub fn unregister(&mut self, id: EntityId) {
        self.consumers.remove(&id);
    }

    /// Check whether an id is registered.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.consumers.contains_key(&id)
    }

    /// Get a registered consumer.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&EnergyConsumer> {
        self.consumers.get(&id)
    }

    /// Get a mutable reference to a registered consumer.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut EnergyConsumer> {
        self.consumers.get_mut(&id)
    }

    /// Number of registered consumers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.consumers.len()
    }

    /// Check if no consumers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.consumers.is_empty()
    }

    /// Sorted consumer ids for deterministic iteration.
    #[must_use]
    pub fn sorted_ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<_> = self.consumers.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Current classification for an id.
    ///
    /// Unknown ids classify as `Normal`: a missing registry entry is not an
    /// error, the caller simply sees a healthy default.
    #[must_use]
    pub fn classify(&self, id: EntityId) -> EnergyState {
        self.consumers.get(&id).map_or(EnergyState::Normal, |c| c.state)
    }

    /// Whether the one-shot game-over has fired.
    #[must_use]
    pub const fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// Fire the game-over latch. Returns `true` only on the call that
    /// actually fired it; re-entrant calls are no-ops.
    pub fn trigger_game_over(&mut self) -> bool {
        if self.game_over {
            return false;
        }
        self.game_over = true;
        tracing::info!("game over triggered");
        true
    }

    /// Advance the decay cadence by `dt` simulated seconds.
    ///
    /// Runs zero or more fixed-interval decay passes and returns the events
    /// they produced. Destroyed entries are pruned lazily at the start of
    /// each pass, so registration and damage calls made between passes never
    /// race an in-progress iteration.
    pub fn tick(&mut self, dt: f32, config: &TuningConfig) -> Vec<LedgerEvent> {
        let mut events = Vec::new();
        self.decay_accumulator += dt.max(0.0);

        // Slack absorbs f32 residue from summing many small dts, so a pass
        // due at exactly one interval of accumulated time always fires
        while self.decay_accumulator >= config.decay_interval - CADENCE_EPSILON {
            self.decay_accumulator = (self.decay_accumulator - config.decay_interval).max(0.0);
            self.run_decay_pass(config, &mut events);
        }

        #[cfg(feature = "debug-validation")]
        self.validate_invariants();

        events
    }

    /// Pool-bounds check after every tick, compiled in with the
    /// `debug-validation` feature.
    #[cfg(feature = "debug-validation")]
    fn validate_invariants(&self) {
        for (id, consumer) in &self.consumers {
            assert!(
                consumer.energy.current() >= 0.0
                    && consumer.energy.current() <= consumer.energy.max(),
                "consumer {id} energy out of bounds: {} / {}",
                consumer.energy.current(),
                consumer.energy.max()
            );
        }
    }

    fn run_decay_pass(&mut self, config: &TuningConfig, events: &mut Vec<LedgerEvent>) {
        // Lazy pruning of entries destroyed since the last pass
        self.consumers.retain(|_, consumer| !consumer.destroyed);

        for id in self.sorted_ids() {
            let Some(consumer) = self.consumers.get_mut(&id) else {
                continue;
            };
            let drain =
                consumer.kind.decay_rate(config) * config.global_decay_scalar * config.decay_interval;
            let kind = consumer.kind;
            let outcome = consumer.apply_decay(drain, config);
            self.collect_damage_events(id, kind, &outcome, events);
        }
    }

    /// Apply combat damage to a consumer.
    ///
    /// Routes through the consumer's own damage handling so armor reduction
    /// is honored. Unknown ids and already-destroyed entries produce no
    /// events, guaranteeing at most one destruction notification.
    pub fn damage(&mut self, id: EntityId, amount: f32, config: &TuningConfig) -> Vec<LedgerEvent> {
        let mut events = Vec::new();
        let Some(consumer) = self.consumers.get_mut(&id) else {
            return events;
        };
        let kind = consumer.kind;
        let outcome = consumer.take_damage(amount, config);
        self.collect_damage_events(id, kind, &outcome, &mut events);
        events
    }

    /// Drain energy bypassing armor, for self-inflicted spend such as
    /// attack costs.
    ///
    /// Threshold crossings and depletion reactions fire exactly as they do
    /// for decay.
    pub fn drain(&mut self, id: EntityId, amount: f32, config: &TuningConfig) -> Vec<LedgerEvent> {
        let mut events = Vec::new();
        let Some(consumer) = self.consumers.get_mut(&id) else {
            return events;
        };
        let kind = consumer.kind;
        let outcome = consumer.apply_decay(amount, config);
        self.collect_damage_events(id, kind, &outcome, &mut events);
        events
    }

    /// Supply energy to a consumer, clamped at its maximum.
    ///
    /// Supply that lifts a disabled tower out of Depleted re-enables it.
    pub fn supply(&mut self, id: EntityId, amount: f32, config: &TuningConfig) -> Vec<LedgerEvent> {
        let mut events = Vec::new();
        let Some(consumer) = self.consumers.get_mut(&id) else {
            return events;
        };
        let outcome = consumer.apply_supply(amount, config);
        if let Some(change) = outcome.change {
            events.push(LedgerEvent::StateCrossed { id, change });
        }
        if outcome.reenabled {
            tracing::debug!(id, "tower re-enabled by supply");
            events.push(LedgerEvent::Reenabled { id });
        }
        events
    }

    fn collect_damage_events(
        &mut self,
        id: EntityId,
        kind: ConsumerKind,
        outcome: &DamageOutcome,
        events: &mut Vec<LedgerEvent>,
    ) {
        if let Some(change) = outcome.change {
            tracing::debug!(
                id,
                previous = ?change.previous,
                current = ?change.current,
                "energy state crossed"
            );
            events.push(LedgerEvent::StateCrossed { id, change });
        }
        if outcome.disabled {
            tracing::debug!(id, "tower disabled at dead threshold");
            events.push(LedgerEvent::Disabled { id });
        }
        if outcome.destroyed {
            tracing::info!(id, "consumer destroyed");
            events.push(LedgerEvent::Destroyed { id });
            if kind.is_game_over_trigger() && self.trigger_game_over() {
                events.push(LedgerEvent::GameOver);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::Vec2;

    fn cfg() -> TuningConfig {
        TuningConfig::default()
    }

    fn ledger_with_core(max_energy: f32) -> EnergyLedger {
        let mut ledger = EnergyLedger::new();
        ledger.register(EnergyConsumer::core(1, Vec2::ZERO, max_energy));
        ledger
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut ledger = EnergyLedger::new();
        let tower = EnergyConsumer::tower(7, Vec2::ZERO, 100.0, 0.0);
        ledger.register(tower);
        // Damage it, then re-register: the original entry survives
        ledger.damage(7, 20.0, &cfg());
        ledger.register(EnergyConsumer::tower(7, Vec2::ZERO, 100.0, 0.0));
        assert_eq!(ledger.len(), 1);
        assert_relative_eq!(ledger.get(7).unwrap().energy.current(), 80.0);
    }

    #[test]
    fn test_unregister_absent_is_noop() {
        let mut ledger = EnergyLedger::new();
        ledger.unregister(42);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_classify_unknown_defaults_normal() {
        let ledger = EnergyLedger::new();
        assert_eq!(ledger.classify(99), EnergyState::Normal);
    }

    #[test]
    fn test_decay_is_frame_rate_independent() {
        let config = cfg();
        let mut coarse = ledger_with_core(100.0);
        let mut fine = ledger_with_core(100.0);

        // One second in 2 coarse steps vs 100 fine steps
        for _ in 0..2 {
            coarse.tick(0.5, &config);
        }
        for _ in 0..100 {
            fine.tick(0.01, &config);
        }

        assert_relative_eq!(
            coarse.get(1).unwrap().energy.current(),
            fine.get(1).unwrap().energy.current(),
            epsilon = 1e-3
        );
        // One simulated second of core decay
        assert_relative_eq!(
            coarse.get(1).unwrap().energy.current(),
            100.0 - config.core_decay_rate,
            epsilon = 1e-3
        );
    }

    #[test]
    fn test_decay_cadence_absorbs_float_residue() {
        let config = cfg();
        let mut ledger = ledger_with_core(100.0);

        // 90 frames at 30 Hz: 1/30 is not exact in f32, so the summed
        // accumulator lands just shy of each interval boundary
        let dt = 1.0 / 30.0;
        for _ in 0..90 {
            ledger.tick(dt, &config);
        }

        // Exactly 3 simulated seconds of core decay, no dropped passes
        assert_relative_eq!(
            ledger.get(1).unwrap().energy.current(),
            100.0 - 3.0 * config.core_decay_rate,
            epsilon = 1e-3
        );
    }

    #[test]
    fn test_sub_interval_dt_applies_no_decay() {
        let config = cfg();
        let mut ledger = ledger_with_core(100.0);
        ledger.tick(config.decay_interval * 0.9, &config);
        assert_relative_eq!(ledger.get(1).unwrap().energy.current(), 100.0);
    }

    #[test]
    fn test_damage_emits_single_destroy_event() {
        let config = cfg();
        let mut ledger = ledger_with_core(100.0);

        let events = ledger.damage(1, 150.0, &config);
        let destroys = events
            .iter()
            .filter(|e| matches!(e, LedgerEvent::Destroyed { .. }))
            .count();
        assert_eq!(destroys, 1);
        assert!(events.contains(&LedgerEvent::GameOver));
        assert_relative_eq!(ledger.get(1).unwrap().energy.current(), 0.0);

        // Second hit: consumer already destroyed, no further events
        let again = ledger.damage(1, 50.0, &config);
        assert!(again.is_empty());
    }

    #[test]
    fn test_game_over_latch_fires_once() {
        let mut ledger = EnergyLedger::new();
        assert!(ledger.trigger_game_over());
        assert!(!ledger.trigger_game_over());
        assert!(ledger.is_game_over());
    }

    #[test]
    fn test_core_decay_to_depletion_ends_run() {
        let mut config = cfg();
        config.core_decay_rate = 50.0;
        let mut ledger = ledger_with_core(10.0);

        // 0.2s of simulated time drains 10 energy
        let events = ledger.tick(0.2, &config);
        assert!(events.contains(&LedgerEvent::GameOver));
        assert!(events
            .iter()
            .any(|e| matches!(e, LedgerEvent::Destroyed { id: 1 })));
    }

    #[test]
    fn test_destroyed_entries_pruned_lazily() {
        let config = cfg();
        let mut ledger = ledger_with_core(100.0);
        ledger.damage(1, 150.0, &config);
        // Entry survives until the next decay pass begins
        assert!(ledger.contains(1));
        ledger.tick(config.decay_interval, &config);
        assert!(!ledger.contains(1));
    }

    #[test]
    fn test_supply_reenable_event() {
        let config = cfg();
        let mut ledger = EnergyLedger::new();
        ledger.register(EnergyConsumer::tower(3, Vec2::ZERO, 60.0, 0.0));

        let events = ledger.damage(3, 60.0, &config);
        assert!(events
            .iter()
            .any(|e| matches!(e, LedgerEvent::Disabled { id: 3 })));
        assert!(!events.iter().any(|e| matches!(e, LedgerEvent::GameOver)));

        let events = ledger.supply(3, 15.0, &config);
        assert!(events
            .iter()
            .any(|e| matches!(e, LedgerEvent::Reenabled { id: 3 })));
        assert!(ledger.get(3).unwrap().is_operational());
    }

    #[test]
    fn test_supply_clamps_at_max() {
        let config = cfg();
        let mut ledger = ledger_with_core(100.0);
        ledger.damage(1, 10.0, &config);
        ledger.supply(1, 500.0, &config);
        assert_relative_eq!(ledger.get(1).unwrap().energy.current(), 100.0);
    }
}

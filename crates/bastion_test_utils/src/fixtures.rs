//! Test fixtures and helpers.
//!
//! Pre-built simulations and consumer configurations for consistent
//! testing across crates.

use bastion_core::prelude::*;
use glam::Vec2;

/// Tuning with passive decay switched off, for tests that want combat
/// behavior without background drain.
#[must_use]
pub fn quiet_config() -> TuningConfig {
    TuningConfig {
        tower_decay_rate: 0.0,
        core_decay_rate: 0.0,
        ..TuningConfig::default()
    }
}

/// A simulation built from [`quiet_config`].
///
/// # Panics
///
/// Panics if the default tuning fails validation, which would be a bug in
/// the defaults themselves.
#[must_use]
pub fn quiet_sim() -> Simulation {
    Simulation::new(quiet_config()).expect("default tuning is valid")
}

/// Default melee-leaning tower stats used across scenario tests.
#[must_use]
pub fn standard_tower() -> TowerStats {
    TowerStats::new(10.0, 1.0, 1.5, 6.0)
}

/// Spawn a tower plus a hostile body already reported as a candidate.
///
/// Returns `(tower_id, hostile_id)`.
///
/// # Panics
///
/// Panics if candidate forwarding fails, which cannot happen for a
/// freshly spawned tower.
pub fn tower_with_hostile(
    sim: &mut Simulation,
    stats: TowerStats,
    hostile_position: Vec2,
    hostile_health: f32,
) -> (EntityId, EntityId) {
    let tower = sim.spawn_tower(Vec2::ZERO, 100.0, stats, TargetLayer::HOSTILE);
    let hostile = sim.spawn_body(hostile_position, hostile_health, TargetLayer::HOSTILE);
    sim.report_enter(tower, hostile)
        .expect("freshly spawned tower accepts candidates");
    (tower, hostile)
}

/// Run `update` in fixed steps for a total of `seconds`, collecting every
/// event produced along the way.
pub fn run_for(sim: &mut Simulation, seconds: f32, step: f32) -> TickEvents {
    let mut collected = TickEvents::default();
    let steps = (seconds / step).round() as usize;
    for _ in 0..steps {
        let events = sim.update(step);
        collected.ledger_events.extend(events.ledger_events);
        collected.attacks.extend(events.attacks);
        collected.projectile_hits.extend(events.projectile_hits);
        collected.deaths.extend(events.deaths);
        collected.game_over |= events.game_over;
    }
    collected
}

//! Cooldown-gated attack resolution.
//!
//! The dispatcher picks the attack tier by distance (melee inside
//! `melee_range`, ranged inside `ranged_range`) and resolves it into a
//! command record the simulation applies. Resolution is fully
//! transactional: if the attacker cannot pay the energy cost, nothing
//! happens -- no damage, no animation signal, no cooldown reset.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::components::EntityId;
use crate::config::TuningConfig;
use crate::consumer::TowerStats;

/// Parameters for a projectile to be spawned by the host or simulation.
///
/// The origin is the appendage's current tip position, not a fixed mount
/// point, so the attack origin always reflects the current animation frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectileSpec {
    /// Spawn position (the limb tip).
    pub origin: Vec2,
    /// Normalized initial direction.
    pub direction: Vec2,
    /// Damage applied on contact.
    pub damage: f32,
    /// Distance after which the projectile expires.
    pub max_range: f32,
    /// Travel speed.
    pub speed: f32,
    /// The entity this projectile is tracking.
    pub target: EntityId,
}

/// How a successful attack resolves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AttackResolution {
    /// Close-quarters hit: damage applied immediately.
    Melee {
        /// The struck entity.
        target: EntityId,
        /// Damage after the melee multiplier.
        damage: f32,
    },
    /// Ranged tier with projectile capability configured.
    RangedProjectile(ProjectileSpec),
    /// Ranged tier without projectile capability: instant direct damage.
    RangedDirect {
        /// The struck entity.
        target: EntityId,
        /// Base damage, no multiplier.
        damage: f32,
    },
}

impl AttackResolution {
    /// Whether this resolution is the melee tier.
    #[must_use]
    pub const fn is_melee(&self) -> bool {
        matches!(self, Self::Melee { .. })
    }
}

/// A resolved attack plus the energy cost the simulation must deduct.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FireCommand {
    /// The resolved attack.
    pub resolution: AttackResolution,
    /// Energy to deduct from the attacker. Already verified affordable.
    pub energy_cost: f32,
}

/// Per-tower attack state: the cooldown clock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CombatDispatcher {
    /// Simulated time of the last successful attack.
    last_fire: Option<f32>,
}

impl CombatDispatcher {
    /// Create a dispatcher that is immediately ready to fire.
    #[must_use]
    pub const fn new() -> Self {
        Self { last_fire: None }
    }

    /// Whether the cooldown gate is open at `now`.
    #[must_use]
    pub fn ready(&self, now: f32, stats: &TowerStats) -> bool {
        self.last_fire
            .map_or(true, |last| now - last >= stats.cooldown())
    }

    /// Attempt an attack against the current target.
    ///
    /// Returns `None` (and changes nothing) when there is no target, the
    /// cooldown gate is closed, the target is outside both tiers, or the
    /// attacker cannot afford the energy cost. On success the cooldown
    /// clock is set and the caller must apply the command.
    pub fn try_fire(
        &mut self,
        now: f32,
        self_position: Vec2,
        tip_position: Vec2,
        stats: &TowerStats,
        target: Option<(EntityId, Vec2)>,
        energy_available: f32,
        config: &TuningConfig,
    ) -> Option<FireCommand> {
        let (target_id, target_position) = target?;
        if !self.ready(now, stats) {
            return None;
        }

        let distance = self_position.distance(target_position);
        let resolution = if distance <= stats.melee_range {
            AttackResolution::Melee {
                target: target_id,
                damage: stats.damage * config.melee_multiplier,
            }
        } else if distance <= stats.ranged_range {
            match stats.projectile_speed {
                Some(speed) => {
                    let direction = (target_position - tip_position).normalize_or_zero();
                    AttackResolution::RangedProjectile(ProjectileSpec {
                        origin: tip_position,
                        direction,
                        damage: stats.damage,
                        max_range: stats.ranged_range,
                        speed,
                        target: target_id,
                    })
                }
                None => AttackResolution::RangedDirect {
                    target: target_id,
                    damage: stats.damage,
                },
            }
        } else {
            // Unreachable when melee_range <= ranged_range <= detection_range
            // holds; guard rather than trust configuration.
            return None;
        };

        let energy_cost = stats.damage * config.attack_cost_fraction;
        if energy_available < energy_cost {
            tracing::trace!(target_id, "attack aborted: insufficient energy");
            return None;
        }

        self.last_fire = Some(now);
        Some(FireCommand {
            resolution,
            energy_cost,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn cfg() -> TuningConfig {
        TuningConfig::default()
    }

    fn stats() -> TowerStats {
        TowerStats::new(10.0, 2.0, 1.5, 6.0)
    }

    #[test]
    fn test_no_target_is_noop() {
        let mut dispatcher = CombatDispatcher::new();
        let result = dispatcher.try_fire(
            0.0,
            Vec2::ZERO,
            Vec2::ZERO,
            &stats(),
            None,
            100.0,
            &cfg(),
        );
        assert!(result.is_none());
        assert!(dispatcher.ready(0.0, &stats()));
    }

    #[test]
    fn test_melee_tier_applies_multiplier() {
        let config = cfg();
        let mut dispatcher = CombatDispatcher::new();
        let command = dispatcher
            .try_fire(
                0.0,
                Vec2::ZERO,
                Vec2::ZERO,
                &stats(),
                Some((5, Vec2::new(1.0, 0.0))),
                100.0,
                &config,
            )
            .expect("melee attack resolves");

        match command.resolution {
            AttackResolution::Melee { target, damage } => {
                assert_eq!(target, 5);
                assert_relative_eq!(damage, 10.0 * config.melee_multiplier);
            }
            other => panic!("expected melee resolution, got {other:?}"),
        }
        assert_relative_eq!(command.energy_cost, 1.0);
    }

    #[test]
    fn test_ranged_without_projectile_falls_back_to_direct() {
        let mut dispatcher = CombatDispatcher::new();
        let command = dispatcher
            .try_fire(
                0.0,
                Vec2::ZERO,
                Vec2::ZERO,
                &stats(),
                Some((5, Vec2::new(5.0, 0.0))),
                100.0,
                &cfg(),
            )
            .expect("ranged attack resolves");

        match command.resolution {
            AttackResolution::RangedDirect { target, damage } => {
                assert_eq!(target, 5);
                assert_relative_eq!(damage, 10.0);
            }
            other => panic!("expected direct ranged resolution, got {other:?}"),
        }
    }

    #[test]
    fn test_ranged_with_projectile_spawns_from_tip() {
        let mut dispatcher = CombatDispatcher::new();
        let tip = Vec2::new(0.5, 1.8);
        let command = dispatcher
            .try_fire(
                0.0,
                Vec2::ZERO,
                tip,
                &stats().with_projectile_speed(12.0),
                Some((5, Vec2::new(5.0, 0.0))),
                100.0,
                &cfg(),
            )
            .expect("projectile attack resolves");

        match command.resolution {
            AttackResolution::RangedProjectile(spec) => {
                assert_eq!(spec.target, 5);
                assert_eq!(spec.origin, tip);
                assert_relative_eq!(spec.speed, 12.0);
                assert_relative_eq!(spec.direction.length(), 1.0, epsilon = 1e-5);
            }
            other => panic!("expected projectile resolution, got {other:?}"),
        }
    }

    #[test]
    fn test_cooldown_gate() {
        let tower = stats(); // fire_rate 2.0 -> 0.5s cooldown
        let mut dispatcher = CombatDispatcher::new();
        let target = Some((5, Vec2::new(1.0, 0.0)));

        assert!(dispatcher
            .try_fire(0.0, Vec2::ZERO, Vec2::ZERO, &tower, target, 100.0, &cfg())
            .is_some());
        // Too early
        assert!(dispatcher
            .try_fire(0.49, Vec2::ZERO, Vec2::ZERO, &tower, target, 100.0, &cfg())
            .is_none());
        // Exactly one cooldown later
        assert!(dispatcher
            .try_fire(0.5, Vec2::ZERO, Vec2::ZERO, &tower, target, 100.0, &cfg())
            .is_some());
    }

    #[test]
    fn test_insufficient_energy_aborts_without_cooldown() {
        let tower = stats();
        let mut dispatcher = CombatDispatcher::new();
        let target = Some((5, Vec2::new(1.0, 0.0)));

        // Cost is 1.0; only 0.5 available
        assert!(dispatcher
            .try_fire(0.0, Vec2::ZERO, Vec2::ZERO, &tower, target, 0.5, &cfg())
            .is_none());
        // The failed attempt did not touch the cooldown clock
        assert!(dispatcher
            .try_fire(0.0, Vec2::ZERO, Vec2::ZERO, &tower, target, 100.0, &cfg())
            .is_some());
    }

    #[test]
    fn test_beyond_ranged_range_is_noop() {
        let mut dispatcher = CombatDispatcher::new();
        assert!(dispatcher
            .try_fire(
                0.0,
                Vec2::ZERO,
                Vec2::ZERO,
                &stats(),
                Some((5, Vec2::new(100.0, 0.0))),
                100.0,
                &cfg(),
            )
            .is_none());
    }
}

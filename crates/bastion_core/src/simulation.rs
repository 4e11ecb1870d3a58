//! Top-level simulation orchestrator.
//!
//! Owns the ledger, the towers, plain-health target bodies, supply beams
//! and in-flight projectiles, and advances everything in one fixed frame
//! order per `update(dt)`:
//!
//! 1. supply beams deliver
//! 2. ledger decay cadence
//! 3. per tower: target refresh, appendage update, attack attempt
//! 4. projectiles advance
//!
//! Each tower exclusively owns its targeting state, its cooldown clock and
//! its appendage; cross-entity effects all flow through the ledger or the
//! returned [`TickEvents`].

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::appendage::AppendageAnimator;
use crate::combat::{AttackResolution, CombatDispatcher, ProjectileSpec};
use crate::components::{EntityId, Health, TargetLayer};
use crate::config::TuningConfig;
use crate::consumer::{EnergyConsumer, TowerStats};
use crate::error::{Result, SimError};
use crate::ledger::{EnergyLedger, LedgerEvent};
use crate::supply::SupplyBeam;
use crate::targeting::{TargetAcquisition, TargetInfo, TargetView};

/// A defensive tower: one consumer entry plus its combat machinery.
#[derive(Debug, Clone, PartialEq)]
pub struct Tower {
    /// Shared entity id, also the ledger key.
    pub id: EntityId,
    /// Combat statistics.
    pub stats: TowerStats,
    /// Candidate tracking and target lock.
    pub targeting: TargetAcquisition,
    /// Cooldown clock.
    pub dispatcher: CombatDispatcher,
    /// Procedural limb; its tip is the attack origin.
    pub appendage: AppendageAnimator,
}

/// A damageable entity outside the energy economy (an attacker, usually).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetBody {
    /// Entity identifier.
    pub id: EntityId,
    /// World position.
    pub position: Vec2,
    /// Layer for target filtering.
    pub layer: TargetLayer,
    /// Plain health pool.
    pub health: Health,
}

/// A projectile in flight toward its target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    spec: ProjectileSpec,
    position: Vec2,
    traveled: f32,
}

impl Projectile {
    fn new(spec: ProjectileSpec) -> Self {
        Self {
            spec,
            position: spec.origin,
            traveled: 0.0,
        }
    }

    /// Current world position, for rendering.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// The entity this projectile is tracking.
    #[must_use]
    pub const fn target(&self) -> EntityId {
        self.spec.target
    }
}

/// An attack a tower resolved this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackRecord {
    /// The firing tower.
    pub attacker: EntityId,
    /// How the attack resolved.
    pub resolution: AttackResolution,
}

/// A projectile reaching its target this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileHit {
    /// The struck entity.
    pub target: EntityId,
    /// Damage applied.
    pub damage: f32,
}

/// Everything that happened during one `update(dt)`, for the host layer.
#[derive(Debug, Default)]
pub struct TickEvents {
    /// Energy-economy events in emission order.
    pub ledger_events: Vec<LedgerEvent>,
    /// Attacks resolved this tick.
    pub attacks: Vec<AttackRecord>,
    /// Projectiles that connected this tick.
    pub projectile_hits: Vec<ProjectileHit>,
    /// Plain-health bodies that died this tick.
    pub deaths: Vec<EntityId>,
    /// Whether the run ended during this tick.
    pub game_over: bool,
}

impl TickEvents {
    fn absorb_ledger(&mut self, events: Vec<LedgerEvent>) {
        if events.contains(&LedgerEvent::GameOver) {
            self.game_over = true;
        }
        self.ledger_events.extend(events);
    }
}

/// The whole simulation state.
///
/// No rendering, no IO, no wall-clock time: callers drive it exclusively
/// through `update(dt)` and the spawn/despawn/proximity API.
#[derive(Debug)]
pub struct Simulation {
    config: TuningConfig,
    ledger: EnergyLedger,
    towers: Vec<Tower>,
    bodies: Vec<TargetBody>,
    beams: Vec<SupplyBeam>,
    projectiles: Vec<Projectile>,
    next_id: EntityId,
    now: f32,
}

impl Simulation {
    /// Create a simulation with validated tuning.
    pub fn new(config: TuningConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ledger: EnergyLedger::new(),
            towers: Vec::new(),
            bodies: Vec::new(),
            beams: Vec::new(),
            projectiles: Vec::new(),
            next_id: 1,
            now: 0.0,
        })
    }

    /// Simulated seconds elapsed since construction.
    #[must_use]
    pub const fn now(&self) -> f32 {
        self.now
    }

    /// The tuning in effect.
    #[must_use]
    pub const fn config(&self) -> &TuningConfig {
        &self.config
    }

    /// The energy registry.
    #[must_use]
    pub const fn ledger(&self) -> &EnergyLedger {
        &self.ledger
    }

    /// Whether the run has ended.
    #[must_use]
    pub const fn is_game_over(&self) -> bool {
        self.ledger.is_game_over()
    }

    /// Towers in spawn order.
    #[must_use]
    pub fn towers(&self) -> &[Tower] {
        &self.towers
    }

    /// A tower by id.
    #[must_use]
    pub fn tower(&self, id: EntityId) -> Option<&Tower> {
        self.towers.iter().find(|t| t.id == id)
    }

    /// A plain-health body by id.
    #[must_use]
    pub fn body(&self, id: EntityId) -> Option<&TargetBody> {
        self.bodies.iter().find(|b| b.id == id)
    }

    /// Projectiles in flight, for rendering.
    #[must_use]
    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    fn allocate_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Spawn a tower: registers its energy entry and its combat machinery.
    pub fn spawn_tower(
        &mut self,
        position: Vec2,
        max_energy: f32,
        stats: TowerStats,
        layer_filter: TargetLayer,
    ) -> EntityId {
        let id = self.allocate_id();
        self.ledger.register(EnergyConsumer::tower(
            id,
            position,
            max_energy,
            stats.armor_reduction,
        ));
        self.towers.push(Tower {
            id,
            stats,
            targeting: TargetAcquisition::new(stats.detection_range, layer_filter),
            dispatcher: CombatDispatcher::new(),
            appendage: AppendageAnimator::new(position, &self.config.appendage),
        });
        tracing::debug!(id, "tower spawned");
        id
    }

    /// Spawn the core structure.
    pub fn spawn_core(&mut self, position: Vec2, max_energy: f32) -> EntityId {
        let id = self.allocate_id();
        self.ledger
            .register(EnergyConsumer::core(id, position, max_energy));
        tracing::debug!(id, "core spawned");
        id
    }

    /// Spawn a plain-health body (an attacker the towers can target).
    pub fn spawn_body(&mut self, position: Vec2, max_health: f32, layer: TargetLayer) -> EntityId {
        let id = self.allocate_id();
        self.bodies.push(TargetBody {
            id,
            position,
            layer,
            health: Health::new(max_health),
        });
        id
    }

    /// Remove an entity of any kind. Absent ids are a no-op.
    pub fn despawn(&mut self, id: EntityId) {
        self.ledger.unregister(id);
        self.towers.retain(|t| t.id != id);
        self.bodies.retain(|b| b.id != id);
        for tower in &mut self.towers {
            tower.targeting.remove_candidate(id);
        }
        self.beams.retain(|b| b.target != id);
        self.projectiles.retain(|p| p.spec.target != id);
    }

    /// Move a body, for host-driven attacker movement.
    pub fn set_body_position(&mut self, id: EntityId, position: Vec2) -> Result<()> {
        let body = self
            .bodies
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or(SimError::EntityNotFound(id))?;
        body.position = position;
        Ok(())
    }

    /// Forward a proximity-provider enter event to a tower.
    pub fn report_enter(&mut self, tower_id: EntityId, candidate: EntityId) -> Result<()> {
        let tower = self.tower_mut(tower_id)?;
        tower.targeting.add_candidate(candidate);
        Ok(())
    }

    /// Forward a proximity-provider exit event to a tower.
    pub fn report_exit(&mut self, tower_id: EntityId, candidate: EntityId) -> Result<()> {
        let tower = self.tower_mut(tower_id)?;
        tower.targeting.remove_candidate(candidate);
        Ok(())
    }

    fn tower_mut(&mut self, id: EntityId) -> Result<&mut Tower> {
        if let Some(index) = self.towers.iter().position(|t| t.id == id) {
            return Ok(&mut self.towers[index]);
        }
        if self.ledger.contains(id) || self.bodies.iter().any(|b| b.id == id) {
            return Err(SimError::NotATower(id));
        }
        Err(SimError::EntityNotFound(id))
    }

    /// Attach a supply beam feeding a consumer.
    pub fn attach_supply_beam(&mut self, target: EntityId, rate: f32) {
        self.beams.push(SupplyBeam::new(target, rate));
    }

    /// Detach every beam feeding a consumer.
    pub fn detach_supply_beams(&mut self, target: EntityId) {
        for beam in self.beams.iter_mut().filter(|b| b.target == target) {
            beam.detach();
        }
    }

    /// Apply external damage (an attacker hitting a structure).
    pub fn apply_damage(&mut self, id: EntityId, amount: f32) -> Vec<LedgerEvent> {
        self.ledger.damage(id, amount, &self.config)
    }

    /// Supply energy directly (a one-shot delivery).
    pub fn apply_supply(&mut self, id: EntityId, amount: f32) -> Vec<LedgerEvent> {
        self.ledger.supply(id, amount, &self.config)
    }

    /// Per-frame view over every damageable entity.
    fn build_view(&self) -> TargetView {
        let mut entries: Vec<(EntityId, TargetInfo)> = self
            .bodies
            .iter()
            .map(|b| {
                (
                    b.id,
                    TargetInfo {
                        position: b.position,
                        layer: b.layer,
                        alive: !b.health.is_dead(),
                    },
                )
            })
            .collect();
        for id in self.ledger.sorted_ids() {
            if let Some(consumer) = self.ledger.get(id) {
                entries.push((
                    id,
                    TargetInfo {
                        position: consumer.position,
                        layer: TargetLayer::STRUCTURE,
                        alive: !consumer.destroyed,
                    },
                ));
            }
        }
        TargetView::new(&entries)
    }

    /// Advance the whole simulation by `dt` simulated seconds.
    pub fn update(&mut self, dt: f32) -> TickEvents {
        let mut events = TickEvents::default();
        self.now += dt.max(0.0);

        for beam in &mut self.beams {
            events.absorb_ledger(beam.tick(dt, &mut self.ledger, &self.config));
        }
        self.beams.retain(SupplyBeam::is_attached);

        events.absorb_ledger(self.ledger.tick(dt, &self.config));

        self.run_towers(dt, &mut events);
        self.run_projectiles(dt, &mut events);
        self.reap_bodies(&mut events);

        events
    }

    fn run_towers(&mut self, dt: f32, events: &mut TickEvents) {
        let view = self.build_view();
        let now = self.now;

        for tower in &mut self.towers {
            let Some(consumer) = self.ledger.get(tower.id) else {
                continue;
            };
            let position = consumer.position;
            let energy_fraction = consumer.energy_fraction();
            let energy_available = consumer.energy.current();
            let operational = consumer.is_operational();

            let target = if operational {
                tower.targeting.refresh_target(position, &view)
            } else {
                None
            };
            let target_position = target.and_then(|id| view.get(id)).map(|i| i.position);

            let target_direction = target_position.map(|p| p - position);
            tower.appendage.update(
                dt,
                position,
                target_direction,
                energy_fraction,
                &self.config.appendage,
            );

            if !operational {
                continue;
            }
            let command = tower.dispatcher.try_fire(
                now,
                position,
                tower.appendage.tip_position(),
                &tower.stats,
                target.zip(target_position),
                energy_available,
                &self.config,
            );
            let Some(command) = command else {
                continue;
            };

            events.absorb_ledger(self.ledger.drain(tower.id, command.energy_cost, &self.config));
            if command.resolution.is_melee() {
                tower.appendage.trigger_melee(&self.config.appendage);
            } else {
                tower.appendage.trigger_fire(&self.config.appendage);
            }

            match command.resolution {
                AttackResolution::Melee { target, damage }
                | AttackResolution::RangedDirect { target, damage } => {
                    apply_hit(&mut self.bodies, &mut self.ledger, &self.config, target, damage, events);
                }
                AttackResolution::RangedProjectile(spec) => {
                    self.projectiles.push(Projectile::new(spec));
                }
            }
            tracing::debug!(attacker = tower.id, "attack resolved");
            events.attacks.push(AttackRecord {
                attacker: tower.id,
                resolution: command.resolution,
            });
        }
    }

    fn run_projectiles(&mut self, dt: f32, events: &mut TickEvents) {
        let mut index = 0;
        while index < self.projectiles.len() {
            let projectile = &mut self.projectiles[index];
            let target_position = live_target_position(&self.bodies, &self.ledger, projectile.spec.target);

            let Some(target_position) = target_position else {
                // Target died or despawned mid-flight
                self.projectiles.swap_remove(index);
                continue;
            };

            let step = projectile.spec.speed * dt.max(0.0);
            let distance = projectile.position.distance(target_position);
            // Contact only counts if the remaining range budget covers
            // the closing distance
            let budget = projectile.spec.max_range - projectile.traveled;
            if distance <= step.min(budget) {
                let spec = projectile.spec;
                self.projectiles.swap_remove(index);
                apply_hit(
                    &mut self.bodies,
                    &mut self.ledger,
                    &self.config,
                    spec.target,
                    spec.damage,
                    events,
                );
                events.projectile_hits.push(ProjectileHit {
                    target: spec.target,
                    damage: spec.damage,
                });
                continue;
            }
            if step >= budget {
                // Range budget exhausted before contact
                self.projectiles.swap_remove(index);
                continue;
            }

            let direction = (target_position - projectile.position).normalize_or_zero();
            projectile.position += direction * step;
            projectile.traveled += step;
            index += 1;
        }
    }

    fn reap_bodies(&mut self, events: &mut TickEvents) {
        for body in &self.bodies {
            if body.health.is_dead() {
                events.deaths.push(body.id);
            }
        }
        self.bodies.retain(|b| !b.health.is_dead());
    }
}

/// Position of a target that can still be hit, whichever table holds it.
fn live_target_position(
    bodies: &[TargetBody],
    ledger: &EnergyLedger,
    id: EntityId,
) -> Option<Vec2> {
    if let Some(body) = bodies.iter().find(|b| b.id == id) {
        if body.health.is_dead() {
            return None;
        }
        return Some(body.position);
    }
    ledger
        .get(id)
        .filter(|c| !c.destroyed)
        .map(|c| c.position)
}

/// Route damage to whichever table holds the target.
fn apply_hit(
    bodies: &mut [TargetBody],
    ledger: &mut EnergyLedger,
    config: &TuningConfig,
    target: EntityId,
    damage: f32,
    events: &mut TickEvents,
) {
    if let Some(body) = bodies.iter_mut().find(|b| b.id == target) {
        body.health.apply_damage(damage);
        return;
    }
    events.absorb_ledger(ledger.damage(target, damage, config));
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sim() -> Simulation {
        // Keep passive decay out of the way unless a test wants it
        let config = TuningConfig {
            tower_decay_rate: 0.0,
            core_decay_rate: 0.0,
            ..TuningConfig::default()
        };
        Simulation::new(config).expect("default tuning is valid")
    }

    fn melee_stats() -> TowerStats {
        TowerStats::new(10.0, 1.0, 1.5, 6.0)
    }

    #[test]
    fn test_melee_attack_damages_body() {
        let mut sim = sim();
        let tower = sim.spawn_tower(Vec2::ZERO, 100.0, melee_stats(), TargetLayer::HOSTILE);
        let raider = sim.spawn_body(Vec2::new(1.0, 0.0), 50.0, TargetLayer::HOSTILE);
        sim.report_enter(tower, raider).unwrap();

        let events = sim.update(0.05);

        assert_eq!(events.attacks.len(), 1);
        assert!(events.attacks[0].resolution.is_melee());
        let multiplier = sim.config().melee_multiplier;
        assert_relative_eq!(
            sim.body(raider).unwrap().health.current,
            50.0 - 10.0 * multiplier
        );
        // Attack cost deducted from the tower's pool
        assert_relative_eq!(
            sim.ledger().get(tower).unwrap().energy.current(),
            100.0 - 10.0 * sim.config().attack_cost_fraction
        );
        // Melee triggers the whip, not the firing pulse
        assert!(sim.tower(tower).unwrap().appendage.is_melee_attacking());
    }

    #[test]
    fn test_cooldown_spaces_attacks() {
        let mut sim = sim();
        let tower = sim.spawn_tower(Vec2::ZERO, 100.0, melee_stats(), TargetLayer::HOSTILE);
        let raider = sim.spawn_body(Vec2::new(1.0, 0.0), 1000.0, TargetLayer::HOSTILE);
        sim.report_enter(tower, raider).unwrap();

        // First shot lands on the first tick at t = 0.1; the cooldown opens
        // again at t = 1.1
        let mut attacks = 0;
        for _ in 0..11 {
            attacks += sim.update(0.1).attacks.len();
        }
        assert_eq!(attacks, 2);
    }

    #[test]
    fn test_projectile_flies_then_hits() {
        let mut sim = sim();
        let stats = melee_stats().with_projectile_speed(10.0);
        let tower = sim.spawn_tower(Vec2::ZERO, 100.0, stats, TargetLayer::HOSTILE);
        let raider = sim.spawn_body(Vec2::new(5.0, 0.0), 50.0, TargetLayer::HOSTILE);
        sim.report_enter(tower, raider).unwrap();

        let events = sim.update(0.05);
        assert_eq!(events.attacks.len(), 1);
        assert_eq!(sim.projectiles().len(), 1);
        // In flight: no damage yet
        assert_relative_eq!(sim.body(raider).unwrap().health.current, 50.0);

        // Speed 10 over ~5 units of travel
        let mut hits = Vec::new();
        for _ in 0..12 {
            hits.extend(sim.update(0.05).projectile_hits);
        }
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].target, raider);
        assert_relative_eq!(sim.body(raider).unwrap().health.current, 40.0);
        assert!(sim.projectiles().is_empty());
    }

    #[test]
    fn test_projectile_expires_when_target_dies() {
        let mut sim = sim();
        let stats = melee_stats().with_projectile_speed(2.0);
        let tower = sim.spawn_tower(Vec2::ZERO, 100.0, stats, TargetLayer::HOSTILE);
        let raider = sim.spawn_body(Vec2::new(5.0, 0.0), 50.0, TargetLayer::HOSTILE);
        sim.report_enter(tower, raider).unwrap();

        sim.update(0.05);
        assert_eq!(sim.projectiles().len(), 1);

        sim.despawn(raider);
        sim.update(0.05);
        assert!(sim.projectiles().is_empty());
    }

    #[test]
    fn test_projectile_expires_at_max_range_without_hitting() {
        let mut sim = sim();
        let stats = melee_stats().with_projectile_speed(10.0);
        let tower = sim.spawn_tower(Vec2::ZERO, 100.0, stats, TargetLayer::HOSTILE);
        let raider = sim.spawn_body(Vec2::new(5.0, 0.0), 50.0, TargetLayer::HOSTILE);
        sim.report_enter(tower, raider).unwrap();

        sim.update(0.05);
        assert_eq!(sim.projectiles().len(), 1);

        // The raider flees beyond the 6.0 range budget; the projectile
        // chases but runs out of range before contact
        sim.set_body_position(raider, Vec2::new(100.0, 0.0)).unwrap();
        for _ in 0..20 {
            sim.update(0.05);
        }
        assert!(sim.projectiles().is_empty());
        assert_relative_eq!(sim.body(raider).unwrap().health.current, 50.0);
    }

    #[test]
    fn test_disabled_tower_does_not_fire() {
        let mut sim = sim();
        let tower = sim.spawn_tower(Vec2::ZERO, 50.0, melee_stats(), TargetLayer::HOSTILE);
        let raider = sim.spawn_body(Vec2::new(1.0, 0.0), 50.0, TargetLayer::HOSTILE);
        sim.report_enter(tower, raider).unwrap();
        sim.apply_damage(tower, 50.0);
        assert!(!sim.ledger().get(tower).unwrap().is_operational());

        let events = sim.update(0.1);
        assert!(events.attacks.is_empty());
        assert_relative_eq!(sim.body(raider).unwrap().health.current, 50.0);
    }

    #[test]
    fn test_supply_beam_restores_and_reenables() {
        let mut sim = sim();
        let tower = sim.spawn_tower(Vec2::ZERO, 50.0, melee_stats(), TargetLayer::HOSTILE);
        sim.apply_damage(tower, 50.0);

        sim.attach_supply_beam(tower, 100.0);
        let events = sim.update(0.1);
        assert!(events
            .ledger_events
            .iter()
            .any(|e| matches!(e, LedgerEvent::Reenabled { .. })));
        assert!(sim.ledger().get(tower).unwrap().is_operational());
    }

    #[test]
    fn test_core_destruction_ends_run() {
        let mut sim = sim();
        let core = sim.spawn_core(Vec2::ZERO, 100.0);

        let events = sim.apply_damage(core, 150.0);
        assert!(events.contains(&LedgerEvent::GameOver));
        assert!(sim.is_game_over());

        // The latch holds across later ticks
        let tick = sim.update(0.1);
        assert!(!tick.ledger_events.contains(&LedgerEvent::GameOver));
        assert!(sim.is_game_over());
    }

    #[test]
    fn test_dead_body_reaped_and_reported() {
        let mut sim = sim();
        let tower = sim.spawn_tower(Vec2::ZERO, 100.0, melee_stats(), TargetLayer::HOSTILE);
        let raider = sim.spawn_body(Vec2::new(1.0, 0.0), 5.0, TargetLayer::HOSTILE);
        sim.report_enter(tower, raider).unwrap();

        let events = sim.update(0.05);
        assert_eq!(events.deaths, vec![raider]);
        assert!(sim.body(raider).is_none());
    }

    #[test]
    fn test_report_enter_rejects_non_tower() {
        let mut sim = sim();
        let core = sim.spawn_core(Vec2::ZERO, 100.0);
        let raider = sim.spawn_body(Vec2::new(1.0, 0.0), 5.0, TargetLayer::HOSTILE);

        assert!(matches!(
            sim.report_enter(core, raider),
            Err(SimError::NotATower(_))
        ));
        assert!(matches!(
            sim.report_enter(999, raider),
            Err(SimError::EntityNotFound(999))
        ));
    }

    #[test]
    fn test_decay_can_disable_idle_tower() {
        let config = TuningConfig {
            tower_decay_rate: 100.0,
            core_decay_rate: 0.0,
            ..TuningConfig::default()
        };
        let mut sim = Simulation::new(config).expect("tuning is valid");
        let tower = sim.spawn_tower(Vec2::ZERO, 10.0, melee_stats(), TargetLayer::HOSTILE);

        let events = sim.update(0.2);
        assert!(events
            .ledger_events
            .iter()
            .any(|e| matches!(e, LedgerEvent::Disabled { .. })));
        assert!(!sim.ledger().get(tower).unwrap().is_operational());
        assert!(!sim.is_game_over());
    }
}

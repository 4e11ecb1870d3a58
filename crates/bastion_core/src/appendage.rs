//! Procedural attack-limb animation.
//!
//! Each tower owns one continuously deforming limb of N segments. The
//! final segment's position is published as the tip -- the live attack
//! origin read by combat -- so this state machine feeds back into gameplay
//! rather than being purely cosmetic.
//!
//! Timed effects are explicit per-tick timers advanced against fixed
//! durations; there is no suspended control flow anywhere. Firing, melee
//! attacking and swiping are independent phases: melee and swipe start
//! together but revert to idle each on their own clock.
//!
//! Limb state is fully transient. It is recomputed every tick and never
//! persisted, which is why nothing here derives serde.

use glam::Vec2;

use crate::components::EnergyState;
use crate::config::AppendageTuning;
use crate::math::{clamp01, ease_out_cubic, lerp, rotate_deg};

/// Dominant limb phase, for hosts that want a single label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppendagePhase {
    /// No timed effect active; only idle sway.
    Idle,
    /// Ranged-attack pulse.
    Firing,
    /// Close-quarters whip.
    MeleeAttacking,
    /// Angular arc sweep.
    Swiping,
}

/// Tolerance when testing whether a phase has elapsed. Summing stepped
/// f32 dts leaves residue well below this, so a phase of duration D ends
/// once D seconds of updates have accumulated.
const PHASE_EPSILON: f32 = 1e-5;

/// Countdown against a fixed duration.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PhaseTimer {
    remaining: f32,
    duration: f32,
}

impl PhaseTimer {
    fn start(duration: f32) -> Self {
        Self {
            remaining: duration,
            duration,
        }
    }

    /// Progress through the phase in `[0, 1]`.
    fn progress(&self) -> f32 {
        clamp01(1.0 - self.remaining / self.duration)
    }
}

fn advance(slot: &mut Option<PhaseTimer>, dt: f32) {
    if let Some(timer) = slot {
        timer.remaining -= dt;
        if timer.remaining <= PHASE_EPSILON {
            *slot = None;
        }
    }
}

/// Per-tower procedural limb state machine.
#[derive(Debug, Clone, PartialEq)]
pub struct AppendageAnimator {
    /// World-space segment positions, attachment-adjacent first.
    segments: Vec<Vec2>,
    /// World-space tip position (the final segment).
    tip: Vec2,
    sway_timer: f32,
    fire: Option<PhaseTimer>,
    melee: Option<PhaseTimer>,
    swipe: Option<PhaseTimer>,
}

impl AppendageAnimator {
    /// Create an idle limb extended along +X from the attachment point.
    #[must_use]
    pub fn new(attachment: Vec2, tuning: &AppendageTuning) -> Self {
        let count = tuning.segment_count.max(1);
        let segments: Vec<Vec2> = (1..=count)
            .map(|i| {
                let t = i as f32 / count as f32;
                attachment + Vec2::X * (tuning.limb_length * t)
            })
            .collect();
        let tip = *segments.last().unwrap_or(&attachment);
        Self {
            segments,
            tip,
            sway_timer: 0.0,
            fire: None,
            melee: None,
            swipe: None,
        }
    }

    /// Enter the firing pulse.
    pub fn trigger_fire(&mut self, tuning: &AppendageTuning) {
        self.fire = Some(PhaseTimer::start(tuning.fire_duration));
    }

    /// Enter the melee whip and the swipe arc together.
    pub fn trigger_melee(&mut self, tuning: &AppendageTuning) {
        self.melee = Some(PhaseTimer::start(tuning.melee_attack_duration));
        self.swipe = Some(PhaseTimer::start(tuning.swipe_duration));
    }

    /// Whether the firing pulse is active.
    #[must_use]
    pub const fn is_firing(&self) -> bool {
        self.fire.is_some()
    }

    /// Whether the melee whip is active.
    #[must_use]
    pub const fn is_melee_attacking(&self) -> bool {
        self.melee.is_some()
    }

    /// Whether the swipe arc is active.
    #[must_use]
    pub const fn is_swiping(&self) -> bool {
        self.swipe.is_some()
    }

    /// Whether no timed effect is active.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        self.fire.is_none() && self.melee.is_none() && self.swipe.is_none()
    }

    /// Dominant phase label.
    #[must_use]
    pub const fn phase(&self) -> AppendagePhase {
        if self.melee.is_some() {
            AppendagePhase::MeleeAttacking
        } else if self.swipe.is_some() {
            AppendagePhase::Swiping
        } else if self.fire.is_some() {
            AppendagePhase::Firing
        } else {
            AppendagePhase::Idle
        }
    }

    /// World-space tip position: the live attack origin.
    #[must_use]
    pub const fn tip_position(&self) -> Vec2 {
        self.tip
    }

    /// World-space segment positions.
    #[must_use]
    pub fn segments(&self) -> &[Vec2] {
        &self.segments
    }

    /// Advance timers and recompute segment geometry for this tick.
    ///
    /// `target_direction` biases segments toward the current target unless
    /// a swipe is in progress. `energy_fraction` scales idle sway
    /// (cosmetic only).
    pub fn update(
        &mut self,
        dt: f32,
        attachment: Vec2,
        target_direction: Option<Vec2>,
        energy_fraction: f32,
        tuning: &AppendageTuning,
    ) {
        advance(&mut self.fire, dt);
        advance(&mut self.melee, dt);
        advance(&mut self.swipe, dt);

        let sway_scale = lerp(
            tuning.depleted_sway_scale,
            1.0,
            clamp01(energy_fraction),
        );
        self.sway_timer += tuning.sway_speed * sway_scale * dt;

        let fire_pulse = self.fire.map(|t| (t.progress() * std::f32::consts::PI).sin());
        let melee_progress = self.melee.map(|t| t.progress());
        let swipe_progress = self.swipe.map(|t| t.progress());
        let target_dir = target_direction.and_then(|d| {
            if d.length_squared() > f32::EPSILON {
                Some(d.normalize())
            } else {
                None
            }
        });

        let count = self.segments.len().max(1);
        for (index, segment) in self.segments.iter_mut().enumerate() {
            let t = (index + 1) as f32 / count as f32;
            let mut local = Vec2::X * (tuning.limb_length * t);

            // Idle sway, strongest at the tip
            local.y +=
                (self.sway_timer + t * std::f32::consts::PI).sin() * tuning.sway_amount * sway_scale * t;

            // Anti-clipping: segments pointing below horizontal contract
            let direction = local.normalize_or_zero();
            if direction.y < 0.0 {
                local *= clamp01(1.0 - tuning.shortening_factor * (-direction.y));
            }

            if let Some(pulse) = fire_pulse {
                // Extend forward, compress vertically
                local.x += pulse * tuning.fire_extend * t;
                local.y *= 1.0 - 0.5 * pulse * t;
            }

            if let Some(progress) = melee_progress {
                local.y += (progress * std::f32::consts::TAU).sin() * tuning.melee_whip * t;
            }

            if let Some(progress) = swipe_progress {
                let eased = ease_out_cubic(progress);
                let half_arc = tuning.swipe_arc_degrees * 0.5;
                let angle = lerp(-half_arc, half_arc, eased);
                local = rotate_deg(local, angle * t);
                let reach = (progress * std::f32::consts::PI).sin() * tuning.swipe_reach * t;
                local += local.normalize_or_zero() * reach;
                local.y += (eased * std::f32::consts::TAU).sin() * tuning.melee_whip * 0.5 * t;
            } else if let Some(dir) = target_dir {
                // Lean toward the target, strongest at the tip
                let desired = dir * (tuning.limb_length * t);
                local = local.lerp(desired, t * tuning.target_bias);
            }

            *segment = attachment + local;
        }

        self.tip = *self.segments.last().unwrap_or(&attachment);
    }
}

/// Cosmetic limb tint from classification and energy fraction.
///
/// Pure output for the renderer; the core never reads it back.
#[must_use]
pub fn energy_tint(state: EnergyState, energy_fraction: f32) -> [f32; 4] {
    let base = match state {
        EnergyState::Normal => [0.35, 0.80, 1.00],
        EnergyState::Low => [0.55, 0.75, 0.60],
        EnergyState::Critical => [1.00, 0.55, 0.20],
        EnergyState::Depleted => [0.45, 0.30, 0.30],
    };
    let brightness = lerp(0.4, 1.0, clamp01(energy_fraction));
    [
        base[0] * brightness,
        base[1] * brightness,
        base[2] * brightness,
        1.0,
    ]
}

//! Property-based testing strategies.
//!
//! Strategies for generating valid tuning values and energy amounts so
//! property tests explore the whole legal input space and nothing else.

use bastion_core::prelude::*;
use glam::Vec2;
use proptest::prelude::*;

/// Energy fractions across the full classification range.
pub fn energy_fraction() -> impl Strategy<Value = f32> {
    0.0f32..=1.0
}

/// Damage and supply amounts, including overkill values.
pub fn energy_amount() -> impl Strategy<Value = f32> {
    0.0f32..500.0
}

/// Well-ordered classification thresholds (`dead < critical < low <= 1`).
pub fn ordered_thresholds() -> impl Strategy<Value = Thresholds> {
    (0.0f32..0.2, 0.25f32..0.45, 0.5f32..1.0)
        .prop_map(|(dead, critical, low)| Thresholds::new(low, critical, dead))
}

/// Positions within a plausible battlefield.
pub fn battlefield_position() -> impl Strategy<Value = Vec2> {
    (-50.0f32..50.0, -50.0f32..50.0).prop_map(|(x, y)| Vec2::new(x, y))
}

/// Tower stats with the range ordering invariant guaranteed.
pub fn tower_stats() -> impl Strategy<Value = TowerStats> {
    (1.0f32..50.0, 0.2f32..5.0, 0.5f32..3.0, 1.0f32..5.0).prop_map(
        |(damage, fire_rate, melee_range, range_factor)| {
            TowerStats::new(damage, fire_rate, melee_range, melee_range * range_factor)
        },
    )
}

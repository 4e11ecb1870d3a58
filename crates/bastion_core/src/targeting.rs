//! Per-tower target acquisition.
//!
//! The candidate set is fed by an external broad-phase proximity provider
//! through enter/exit events; this module only validates candidates and
//! picks the nearest one. Candidates are kept in insertion order, so
//! equal-distance ties resolve to the earlier-inserted candidate --
//! arbitrary, but deterministic for a given candidate ordering.

use std::collections::HashMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::components::{EntityId, TargetLayer};
use crate::math::facing_angle_deg;

/// Snapshot of a potential target for validity checks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetInfo {
    /// World position.
    pub position: Vec2,
    /// Layer for filter matching.
    pub layer: TargetLayer,
    /// Whether the entity still exists and has health left.
    pub alive: bool,
}

/// Per-frame read view over every damageable entity.
///
/// Built once per frame by the simulation and shared by all towers.
#[derive(Debug, Default)]
pub struct TargetView {
    entries: HashMap<EntityId, TargetInfo>,
}

impl TargetView {
    /// Build a view from (id, info) pairs.
    #[must_use]
    pub fn new(entries: &[(EntityId, TargetInfo)]) -> Self {
        Self {
            entries: entries.iter().copied().collect(),
        }
    }

    /// Look up a target.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<TargetInfo> {
        self.entries.get(&id).copied()
    }
}

/// Targeting state for a single tower.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetAcquisition {
    /// Candidate validity radius.
    pub detection_range: f32,
    /// Layers this tower may attack.
    pub layer_filter: TargetLayer,
    /// Candidates reported by the proximity provider, in insertion order.
    candidates: Vec<EntityId>,
    /// Currently locked target.
    current: Option<EntityId>,
}

impl TargetAcquisition {
    /// Create targeting state.
    #[must_use]
    pub fn new(detection_range: f32, layer_filter: TargetLayer) -> Self {
        Self {
            detection_range,
            layer_filter,
            candidates: Vec::new(),
            current: None,
        }
    }

    /// Proximity-provider enter event. Duplicate adds are no-ops.
    pub fn add_candidate(&mut self, id: EntityId) {
        if !self.candidates.contains(&id) {
            self.candidates.push(id);
        }
    }

    /// Proximity-provider exit event. Removing an absent id is a no-op.
    pub fn remove_candidate(&mut self, id: EntityId) {
        self.candidates.retain(|&c| c != id);
        if self.current == Some(id) {
            self.current = None;
        }
    }

    /// Current locked target, if any.
    #[must_use]
    pub const fn current_target(&self) -> Option<EntityId> {
        self.current
    }

    /// Number of live candidates.
    #[must_use]
    pub fn candidate_count(&self) -> usize {
        self.candidates.len()
    }

    /// Revalidate the current target; if it is gone, prune invalid
    /// candidates and lock the nearest remaining one.
    ///
    /// Returns the target in effect after the refresh.
    pub fn refresh_target(&mut self, origin: Vec2, view: &TargetView) -> Option<EntityId> {
        let detection_range = self.detection_range;
        let layer_filter = self.layer_filter;
        let is_valid = |info: TargetInfo| {
            info.alive
                && info.layer.matches(layer_filter)
                && origin.distance_squared(info.position) <= detection_range * detection_range
        };

        if let Some(id) = self.current {
            match view.get(id) {
                Some(info) if is_valid(info) => return Some(id),
                _ => self.current = None,
            }
        }

        self.candidates
            .retain(|&id| matches!(view.get(id), Some(info) if is_valid(info)));

        // Strict less-than keeps the earlier-inserted candidate on ties
        let mut best: Option<(EntityId, f32)> = None;
        for &id in &self.candidates {
            if let Some(info) = view.get(id) {
                let dist_sq = origin.distance_squared(info.position);
                if best.map_or(true, |(_, best_sq)| dist_sq < best_sq) {
                    best = Some((id, dist_sq));
                }
            }
        }

        self.current = best.map(|(id, _)| id);
        self.current
    }

    /// Position of the current target.
    #[must_use]
    pub fn target_position(&self, view: &TargetView) -> Option<Vec2> {
        self.current.and_then(|id| view.get(id)).map(|i| i.position)
    }

    /// Facing angle toward the current target in degrees, `(-180, 180]`.
    #[must_use]
    pub fn facing_angle(&self, origin: Vec2, view: &TargetView) -> Option<f32> {
        self.target_position(view)
            .map(|pos| facing_angle_deg(pos - origin))
    }
}

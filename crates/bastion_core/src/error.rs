//! Error types for the simulation core.
//!
//! Only API misuse surfaces as an error. Gameplay failure modes (invalid
//! target, insufficient energy, duplicate registration, missing projectile
//! capability) are absorbed at the call site that detects them and the
//! simulation keeps ticking.

use thiserror::Error;

/// Result type alias using [`SimError`].
pub type Result<T> = std::result::Result<T, SimError>;

/// Top-level error type for simulation API misuse.
#[derive(Debug, Error)]
pub enum SimError {
    /// Invalid entity reference.
    #[error("Entity not found: {0}")]
    EntityNotFound(u64),

    /// The entity exists but is not a tower.
    #[error("Entity {0} is not a tower")]
    NotATower(u64),

    /// Tuning configuration failed validation.
    #[error("Invalid tuning config: {0}")]
    InvalidConfig(String),
}

//! Shared test fixtures and utilities for Clankers crates.
//!
//! Provides canonical kinematic chains, deterministic RNG setup, and a
//! tracing subscriber for inspecting solver logs in tests.

pub mod chains;
pub mod rng;
pub mod trace;

// ---------------------------------------------------------------------------
// Re-exports for convenience
// ---------------------------------------------------------------------------

pub use chains::{planar_arm, planar_tip_at_sixth_pi, spatial_arm};
pub use rng::{random_angles, seeded_rng};
pub use trace::init_tracing;

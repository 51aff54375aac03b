//! # Duel Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Determinism test harness
//! - Config fixtures and a frame-stepping match driver
//! - Recording render surface and HUD
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod collaborators;
pub mod determinism;
pub mod fixtures;

/// Re-export proptest for convenience.
pub use proptest;

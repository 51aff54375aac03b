//! # Duel Core
//!
//! Deterministic simulation core for a two-fighter arena duel.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering (draw calls go to a [`render::RenderSurface`])
//! - No IO outside explicit config, snapshot and recording files
//! - No system clock (callers pass match time into every frame)
//! - No floating-point math in the frame loop (uses fixed-point)
//!
//! This separation enables:
//! - Headless runs and benchmarks
//! - Snapshot/restore that resumes bit-identically
//! - Input recordings that play back to the same final state
//! - Determinism testing
//!
//! ## Crate Structure
//!
//! - [`config`] - Match configuration and validation
//! - [`clock`] - Deferred-task queue and countdown
//! - [`animation`] - Sprite clips and clip selection
//! - [`input`] - Key bindings and per-frame input snapshots
//! - [`fighter`] - Fighter state and per-frame physics
//! - [`combat`] - Hits, walls and facing
//! - [`simulation`] - Match controller
//! - [`recording`] - Input recordings and playback

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod animation;
pub mod clock;
pub mod combat;
pub mod config;
pub mod error;
pub mod fighter;
pub mod input;
pub mod math;
pub mod recording;
pub mod render;
pub mod scenery;
pub mod simulation;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::animation::{Clip, ClipDef, ClipSet};
    pub use crate::clock::{Countdown, MatchTask, TimerHandle, TimerQueue};
    pub use crate::config::{FighterConfig, MatchConfig, PropConfig};
    pub use crate::error::{DuelError, Result};
    pub use crate::fighter::{Facing, Fighter, FighterSnapshot};
    pub use crate::input::{
        FixedInput, FrameInput, InputSource, InputState, KeyBindings, KeyboardInput, Side,
    };
    pub use crate::math::{Coords, Fixed, Rect};
    pub use crate::recording::{InputRecording, Playback, RecordingInput};
    pub use crate::render::{Colour, Hud, HudUpdate, NullHud, NullSurface, RenderSurface, SpriteDraw};
    pub use crate::simulation::{HaltReason, Match, MatchResult, MatchSnapshot, MatchStatus};
}

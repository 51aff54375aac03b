//! Headless match runner for scripted play and CI verification.
//!
//! Runs a duel without a window or keyboard. Input comes from RON scripts
//! of timed key events, output is a text HUD, an optional ASCII frame and a
//! JSON summary. This enables:
//!
//! - **Scripted matches**: Reproduce a fight from a checked-in script
//! - **CI verification**: Determinism checks across repeated runs
//! - **Recording playback**: Check that a recording reaches its stored hash
//!
//! # Example
//!
//! ```bash
//! # Play the rush script and print the last frame
//! cargo run -p duel_headless -- run --script data/rush.ron --ascii
//!
//! # Record, then verify the recording
//! cargo run -p duel_headless -- run --script data/rush.ron --record rush.bin
//! cargo run -p duel_headless -- playback --file rush.bin --verify
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod ascii;
pub mod runner;
pub mod script;

pub use ascii::{hud_line, AsciiConfig, AsciiSurface};
pub use runner::{
    benchmark, verify_determinism, BenchmarkReport, ConsoleHud, MatchRunner, RunEnd, RunError,
    RunOptions, RunOutcome, RunSummary, VerifyReport,
};
pub use script::{InputScript, KeyEvent, KeyMotion, ScriptError, ScriptedKeyboard};

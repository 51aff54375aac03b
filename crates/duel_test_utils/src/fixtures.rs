//! Test fixtures and helpers.
//!
//! Pre-built configs and a frame-stepping driver for consistent testing.

use std::time::Duration;

use duel_core::clock::{frame_timestamp, DEFAULT_FRAME_RATE};
use duel_core::config::MatchConfig;
use duel_core::fighter::Facing;
use duel_core::input::{FixedInput, FrameInput, InputState};
use duel_core::math::{Coords, Fixed};
use duel_core::recording::{InputRecording, RecordingInput};
use duel_core::simulation::{Match, MatchStatus};

use crate::collaborators::{RecordingHud, RecordingSurface};

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> Fixed {
    Fixed::from_num(n)
}

/// The stock config.
#[must_use]
pub fn canonical_config() -> MatchConfig {
    MatchConfig::default()
}

/// Y at which a fighter's feet touch the floor.
#[must_use]
pub fn standing_y(config: &MatchConfig) -> Fixed {
    config.arena.ground_y() - config.body.height
}

/// Both fighters standing on the floor, `gap` apart, facing each other.
#[must_use]
pub fn face_off_config(player_x: i32, gap: i32) -> MatchConfig {
    let mut config = MatchConfig::default();
    let y = standing_y(&config);
    config.player.start = Coords::new(fixed(player_x), y);
    config.player.facing = Facing::Right;
    config.enemy.start = Coords::new(fixed(player_x + gap), y);
    config.enemy.facing = Facing::Left;
    config
}

/// Input with only the given movement keys held.
#[must_use]
pub fn held(left: bool, right: bool, jump: bool) -> FrameInput {
    FrameInput {
        keys: InputState { left, right, jump },
        attack: false,
    }
}

/// Input with an attack press and nothing held.
#[must_use]
pub fn attack() -> FrameInput {
    FrameInput {
        keys: InputState::default(),
        attack: true,
    }
}

/// Drives a [`Match`] frame by frame on a 60 Hz virtual clock.
#[derive(Debug)]
pub struct MatchDriver {
    /// The match.
    pub game: Match,
    /// Input fed to the next frame.
    pub input: FixedInput,
    /// Draw log.
    pub surface: RecordingSurface,
    /// HUD log.
    pub hud: RecordingHud,
    frames: u64,
}

impl MatchDriver {
    /// Build a match from `config`.
    ///
    /// # Panics
    ///
    /// Panics if the config is invalid.
    #[must_use]
    pub fn new(config: MatchConfig) -> Self {
        Self::from_match(Match::new(config).expect("fixture config must be valid"))
    }

    /// Drive an existing match, e.g. one restored from a snapshot.
    ///
    /// The virtual clock resumes at the match's frame count.
    #[must_use]
    pub fn from_match(game: Match) -> Self {
        let frames = game.frame_count();
        Self {
            game,
            input: FixedInput::neutral(),
            surface: RecordingSurface::default(),
            hud: RecordingHud::default(),
            frames,
        }
    }

    /// Match time of the next frame.
    #[must_use]
    pub fn now(&self) -> Duration {
        frame_timestamp(self.frames, DEFAULT_FRAME_RATE)
    }

    /// Run one frame with the given inputs.
    pub fn step(&mut self, player: FrameInput, enemy: FrameInput) -> MatchStatus {
        self.input.set(player, enemy);
        let now = self.now();
        self.frames += 1;
        self.game
            .frame(now, &mut self.input, &mut self.surface, &mut self.hud)
    }

    /// Run one frame like [`step`](Self::step), appending its inputs to
    /// `recording`.
    pub fn step_recorded(
        &mut self,
        player: FrameInput,
        enemy: FrameInput,
        recording: &mut InputRecording,
    ) -> MatchStatus {
        self.input.set(player, enemy);
        let now = self.now();
        self.frames += 1;
        let mut tee = RecordingInput::new(&mut self.input);
        let status = self
            .game
            .frame(now, &mut tee, &mut self.surface, &mut self.hud);
        recording.record(now, tee.take_frame());
        status
    }

    /// Run one frame with no input.
    pub fn step_neutral(&mut self) -> MatchStatus {
        self.step(FrameInput::NEUTRAL, FrameInput::NEUTRAL)
    }

    /// Run `n` neutral frames, stopping early if the match ends.
    pub fn run_neutral(&mut self, n: u64) -> MatchStatus {
        let mut status = self.game.status().clone();
        for _ in 0..n {
            status = self.step_neutral();
            if !status.is_running() {
                break;
            }
        }
        status
    }
}

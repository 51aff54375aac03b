//! Input recordings for debugging and determinism checks.
//!
//! A recording stores the config a match was built from plus the input
//! snapshots and timestamp of every frame. Feeding those frames back into a
//! fresh match reproduces it exactly, which is checked against the final
//! state hash stored alongside.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::MatchConfig;
use crate::error::{DuelError, Result};
use crate::input::{FixedInput, FrameInput, InputSource, Side};
use crate::render::{Hud, RenderSurface};
use crate::simulation::{Match, MatchResult, MatchStatus};

/// Recording file format version.
pub const RECORDING_VERSION: u32 = 1;

/// Inputs for a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedFrame {
    /// Match time the frame ran at.
    pub at: Duration,
    /// Player then enemy input.
    pub inputs: [FrameInput; 2],
}

/// A recorded match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputRecording {
    /// Format version.
    pub version: u32,
    /// Free-form label (script name, date, ...).
    pub label: String,
    /// The match config, as RON so it round-trips exactly.
    pub config: String,
    /// One entry per simulated frame.
    pub frames: Vec<RecordedFrame>,
    /// Frame count when recording stopped.
    pub final_frame: u64,
    /// State hash when recording stopped.
    pub final_hash: u64,
    /// Result, if the match had ended.
    pub result: Option<MatchResult>,
}

impl InputRecording {
    /// Start an empty recording for a match built from `config`.
    pub fn new(label: impl Into<String>, config: &MatchConfig) -> Result<Self> {
        Ok(Self {
            version: RECORDING_VERSION,
            label: label.into(),
            config: config.to_ron_string()?,
            frames: Vec::new(),
            final_frame: 0,
            final_hash: 0,
            result: None,
        })
    }

    /// Append one frame.
    pub fn record(&mut self, at: Duration, inputs: [FrameInput; 2]) {
        self.frames.push(RecordedFrame { at, inputs });
    }

    /// Store the end state.
    pub fn finalize(&mut self, game: &Match) {
        self.final_frame = game.frame_count();
        self.final_hash = game.state_hash();
        self.result = game.status().result();
    }

    /// Parse the stored config.
    pub fn match_config(&self) -> Result<MatchConfig> {
        MatchConfig::from_ron_str(&self.config)
    }

    /// Number of recorded frames.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Match time of the last recorded frame.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.frames.last().map_or(Duration::ZERO, |f| f.at)
    }

    /// Write to `path` with bincode.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let bytes = bincode::serialize(self)?;
        std::fs::write(path, bytes).map_err(|source| DuelError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    /// Read from `path`, rejecting other format versions.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| DuelError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let recording: Self = bincode::deserialize(&bytes)?;
        if recording.version != RECORDING_VERSION {
            return Err(DuelError::VersionMismatch {
                expected: RECORDING_VERSION,
                found: recording.version,
            });
        }
        Ok(recording)
    }
}

/// Input source wrapper that remembers what it handed out this frame.
pub struct RecordingInput<'a> {
    inner: &'a mut dyn InputSource,
    seen: [FrameInput; 2],
}

impl<'a> RecordingInput<'a> {
    /// Wrap `inner`.
    pub fn new(inner: &'a mut dyn InputSource) -> Self {
        Self {
            inner,
            seen: [FrameInput::NEUTRAL; 2],
        }
    }

    /// Inputs polled since the last call, reset to neutral.
    pub fn take_frame(&mut self) -> [FrameInput; 2] {
        std::mem::replace(&mut self.seen, [FrameInput::NEUTRAL; 2])
    }
}

impl InputSource for RecordingInput<'_> {
    fn poll(&mut self, side: Side) -> FrameInput {
        let input = self.inner.poll(side);
        self.seen[side.index()] = input;
        input
    }

    fn shutdown(&mut self) {
        self.inner.shutdown();
    }
}

/// Plays a recording back into a fresh match.
#[derive(Debug)]
pub struct Playback {
    recording: InputRecording,
    game: Match,
    input: FixedInput,
    cursor: usize,
}

impl Playback {
    /// Build the match the recording was made against.
    pub fn new(recording: InputRecording) -> Result<Self> {
        let game = Match::new(recording.match_config()?)?;
        Ok(Self {
            recording,
            game,
            input: FixedInput::neutral(),
            cursor: 0,
        })
    }

    /// The match being played.
    #[must_use]
    pub const fn game(&self) -> &Match {
        &self.game
    }

    /// The recording being played.
    #[must_use]
    pub const fn recording(&self) -> &InputRecording {
        &self.recording
    }

    /// Frames played so far.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.cursor
    }

    /// Play the next frame. Returns false once nothing is left to play.
    pub fn advance(&mut self, surface: &mut dyn RenderSurface, hud: &mut dyn Hud) -> bool {
        let Some(frame) = self.recording.frames.get(self.cursor) else {
            return false;
        };
        self.input.set(frame.inputs[0], frame.inputs[1]);
        let status = self.game.frame(frame.at, &mut self.input, surface, hud);
        self.cursor += 1;
        status == MatchStatus::Running && self.cursor < self.recording.frames.len()
    }

    /// Play every remaining frame.
    pub fn run_to_end(&mut self, surface: &mut dyn RenderSurface, hud: &mut dyn Hud) {
        while self.advance(surface, hud) {}
    }

    /// Whether the match reached the recorded end state.
    #[must_use]
    pub fn matches_recording(&self) -> bool {
        self.game.frame_count() == self.recording.final_frame
            && self.game.state_hash() == self.recording.final_hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::InputState;
    use crate::math::Fixed;
    use crate::render::{NullHud, NullSurface};

    fn surface() -> NullSurface {
        NullSurface::new(Fixed::from_num(1024), Fixed::from_num(576))
    }

    fn record_short_match() -> InputRecording {
        let config = MatchConfig::default();
        let mut recording = InputRecording::new("unit", &config).unwrap();
        let mut game = Match::new(config).unwrap();
        let mut source = FixedInput::new(
            FrameInput {
                keys: InputState {
                    right: true,
                    ..InputState::default()
                },
                attack: false,
            },
            FrameInput::NEUTRAL,
        );

        for i in 0..120u64 {
            let at = Duration::from_millis(i * 16);
            let mut tee = RecordingInput::new(&mut source);
            game.frame(at, &mut tee, &mut surface(), &mut NullHud);
            let inputs = tee.take_frame();
            recording.record(at, inputs);
        }
        recording.finalize(&game);
        recording
    }

    #[test]
    fn test_playback_reproduces_hash() {
        let recording = record_short_match();
        assert_eq!(recording.frame_count(), 120);

        let mut playback = Playback::new(recording).unwrap();
        playback.run_to_end(&mut surface(), &mut NullHud);
        assert_eq!(playback.position(), 120);
        assert!(playback.matches_recording());
    }

    #[test]
    fn test_tampered_input_diverges() {
        let mut recording = record_short_match();
        recording.frames[10].inputs[0].keys.right = false;

        let mut playback = Playback::new(recording).unwrap();
        playback.run_to_end(&mut surface(), &mut NullHud);
        assert!(!playback.matches_recording());
    }

    #[test]
    fn test_tee_records_polled_inputs() {
        let player = FrameInput {
            keys: InputState::default(),
            attack: true,
        };
        let mut source = FixedInput::new(player, FrameInput::NEUTRAL);
        let mut tee = RecordingInput::new(&mut source);
        tee.poll(Side::Player);
        tee.poll(Side::Enemy);
        assert_eq!(tee.take_frame(), [player, FrameInput::NEUTRAL]);
        assert_eq!(tee.take_frame(), [FrameInput::NEUTRAL; 2]);
    }
}

//! Headless match runner.
//!
//! Drives a [`Match`] from an [`InputScript`] on either a virtual clock
//! (frame `n` runs at `n / frame_rate` seconds, fully reproducible) or the
//! real clock (paced to the frame rate, timestamps read from [`Instant`]).
//! Either way the frames can be captured into an [`InputRecording`] that
//! plays back to the same final state.

use std::io::Write;
use std::time::{Duration, Instant};

use duel_core::clock::{frame_timestamp, DEFAULT_FRAME_RATE};
use duel_core::config::MatchConfig;
use duel_core::error::DuelError;
use duel_core::recording::{InputRecording, RecordingInput};
use duel_core::render::{Hud, HudUpdate, NullHud, NullSurface, RenderSurface};
use duel_core::simulation::{HaltReason, Match, MatchResult, MatchStatus};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ascii::hud_line;
use crate::script::{InputScript, ScriptError, ScriptedKeyboard};

/// Error type for runner operations.
#[derive(Error, Debug)]
pub enum RunError {
    /// Config, recording or match construction failed.
    #[error(transparent)]
    Duel(#[from] DuelError),
    /// Script could not be loaded or uses unbound keys.
    #[error(transparent)]
    Script(#[from] ScriptError),
}

/// Runner configuration.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Stop after this many frames even if the match is still running.
    pub max_frames: u64,
    /// Pace frames against the real clock instead of the virtual one.
    pub realtime: bool,
    /// Frames per second.
    pub frame_rate: u32,
    /// Capture an input recording.
    pub record: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            // A 10 s match at 60 Hz takes 541 frames; leave headroom for
            // longer configured matches.
            max_frames: 36_000,
            realtime: false,
            frame_rate: DEFAULT_FRAME_RATE,
            record: false,
        }
    }
}

/// How a run finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunEnd {
    /// The match reached a result.
    Ended,
    /// The match halted on an invariant violation.
    Halted,
    /// The frame limit was reached first; the match was shut down.
    FrameLimit,
}

/// Machine-readable summary of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Script name.
    pub script: String,
    /// How the run finished.
    pub end: RunEnd,
    /// Result, if the match ended.
    pub result: Option<MatchResult>,
    /// End banner, if the match ended.
    pub banner: Option<String>,
    /// Halt reason, if the match halted.
    pub halt_reason: Option<String>,
    /// Frames simulated.
    pub frames: u64,
    /// Player health at the end.
    pub player_health: i32,
    /// Enemy health at the end.
    pub enemy_health: i32,
    /// Countdown value at the end.
    pub seconds_remaining: u32,
    /// State hash after the last simulated frame.
    pub final_hash: u64,
    /// Match time of the last frame, in milliseconds.
    pub match_time_ms: u64,
}

impl RunSummary {
    /// Serialize as pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Everything a run produced.
#[derive(Debug)]
pub struct RunOutcome {
    /// Summary.
    pub summary: RunSummary,
    /// The input recording, if requested.
    pub recording: Option<InputRecording>,
    /// The match, after shutdown.
    pub game: Match,
}

/// Drives one match from a script.
#[derive(Debug)]
pub struct MatchRunner {
    game: Match,
    input: ScriptedKeyboard,
    options: RunOptions,
    script_name: String,
    recording: Option<InputRecording>,
    last_now: Duration,
}

impl MatchRunner {
    /// Validate `config` and `script` and build the match.
    pub fn new(
        config: MatchConfig,
        script: &InputScript,
        options: RunOptions,
    ) -> Result<Self, RunError> {
        script.check_keys(&config.player.key_bindings, &config.enemy.key_bindings)?;
        let input = ScriptedKeyboard::new(
            script,
            config.player.key_bindings.clone(),
            config.enemy.key_bindings.clone(),
        );
        let recording = if options.record {
            Some(InputRecording::new(script.name.clone(), &config)?)
        } else {
            None
        };
        let game = Match::new(config)?;
        Ok(Self {
            game,
            input,
            options,
            script_name: script.name.clone(),
            recording,
            last_now: Duration::ZERO,
        })
    }

    /// The match being driven.
    #[must_use]
    pub const fn game(&self) -> &Match {
        &self.game
    }

    /// Run one frame at `now`, delivering due script events first.
    pub fn step(
        &mut self,
        now: Duration,
        surface: &mut dyn RenderSurface,
        hud: &mut dyn Hud,
    ) -> MatchStatus {
        self.input.feed(now);
        self.last_now = now;
        match self.recording.as_mut() {
            Some(recording) => {
                let mut tee = RecordingInput::new(&mut self.input);
                let status = self.game.frame(now, &mut tee, surface, hud);
                recording.record(now, tee.take_frame());
                status
            }
            None => self.game.frame(now, &mut self.input, surface, hud),
        }
    }

    /// Run until the match stops or the frame limit is hit, then shut the
    /// match down.
    pub fn run(mut self, surface: &mut dyn RenderSurface, hud: &mut dyn Hud) -> RunOutcome {
        tracing::info!(
            script = %self.script_name,
            realtime = self.options.realtime,
            max_frames = self.options.max_frames,
            "Starting headless run"
        );

        let started = Instant::now();
        let mut status = self.game.status().clone();
        for index in 0..self.options.max_frames {
            if !status.is_running() {
                break;
            }
            let now = if self.options.realtime {
                let target = frame_timestamp(index, self.options.frame_rate);
                let elapsed = started.elapsed();
                if elapsed < target {
                    std::thread::sleep(target - elapsed);
                }
                started.elapsed()
            } else {
                frame_timestamp(index, self.options.frame_rate)
            };
            status = self.step(now, surface, hud);
        }

        // The recording's end state is taken before shutdown, which would
        // otherwise change the hash of a match cut off by the frame limit.
        if let Some(recording) = self.recording.as_mut() {
            recording.finalize(&self.game);
        }
        let summary = self.summary();
        self.game.shutdown(&mut self.input);

        tracing::info!(
            frames = summary.frames,
            end = ?summary.end,
            result = ?summary.result,
            "Headless run finished"
        );

        RunOutcome {
            summary,
            recording: self.recording,
            game: self.game,
        }
    }

    /// Summary of the current state.
    #[must_use]
    pub fn summary(&self) -> RunSummary {
        let status = self.game.status();
        let end = match status {
            MatchStatus::Ended(_) => RunEnd::Ended,
            MatchStatus::Halted(_) => RunEnd::Halted,
            MatchStatus::Running => RunEnd::FrameLimit,
        };
        let halt_reason = match status {
            MatchStatus::Halted(HaltReason::InvariantViolated(why)) => Some(why.clone()),
            MatchStatus::Halted(HaltReason::ShutDown) => Some("shut down".to_string()),
            _ => None,
        };
        let result = status.result();
        RunSummary {
            script: self.script_name.clone(),
            end,
            result,
            banner: result.map(|r| r.banner().to_string()),
            halt_reason,
            frames: self.game.frame_count(),
            player_health: self.game.player().health(),
            enemy_health: self.game.enemy().health(),
            seconds_remaining: self.game.countdown().remaining(),
            final_hash: self.game.state_hash(),
            match_time_ms: u64::try_from(self.last_now.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// HUD that prints a status line per update.
#[derive(Debug)]
pub struct ConsoleHud<W: Write> {
    out: W,
    updates: usize,
}

impl<W: Write> ConsoleHud<W> {
    /// Print to `out`.
    pub const fn new(out: W) -> Self {
        Self { out, updates: 0 }
    }

    /// Updates printed so far.
    #[must_use]
    pub const fn updates(&self) -> usize {
        self.updates
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Hud for ConsoleHud<W> {
    fn update(&mut self, update: &HudUpdate) {
        self.updates += 1;
        if let Err(e) = writeln!(self.out, "{}", hud_line(update)) {
            tracing::warn!("Failed to write HUD line: {}", e);
        }
    }
}

/// Outcome of a determinism check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyReport {
    /// Frame count of each run.
    pub frames: Vec<u64>,
    /// Final hash of each run.
    pub hashes: Vec<u64>,
}

impl VerifyReport {
    /// True if every run ended on the same frame with the same hash.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
            && self.frames.windows(2).all(|w| w[0] == w[1])
    }
}

/// Run the same config and script `runs` times on the virtual clock and
/// compare the end states.
pub fn verify_determinism(
    config: &MatchConfig,
    script: &InputScript,
    runs: u32,
) -> Result<VerifyReport, RunError> {
    let mut report = VerifyReport {
        frames: Vec::new(),
        hashes: Vec::new(),
    };
    for run in 0..runs.max(1) {
        let runner = MatchRunner::new(config.clone(), script, RunOptions::default())?;
        let outcome = runner.run(&mut null_surface(config), &mut NullHud);
        tracing::debug!(
            run,
            frames = outcome.summary.frames,
            hash = outcome.summary.final_hash,
            "Determinism run finished"
        );
        report.frames.push(outcome.summary.frames);
        report.hashes.push(outcome.summary.final_hash);
    }
    Ok(report)
}

/// Throughput measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BenchmarkReport {
    /// Frames simulated.
    pub frames: u64,
    /// Matches started.
    pub matches: u64,
    /// Wall time spent.
    pub elapsed: Duration,
}

impl BenchmarkReport {
    /// Simulated frames per wall-clock second.
    #[must_use]
    pub fn frames_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            #[allow(clippy::cast_precision_loss)]
            let frames = self.frames as f64;
            frames / secs
        } else {
            0.0
        }
    }
}

/// Simulate `frames` frames of the stock match with the rush script,
/// starting a new match whenever one ends.
pub fn benchmark(frames: u64) -> Result<BenchmarkReport, RunError> {
    let config = MatchConfig::default();
    let script = InputScript::rush();
    let mut surface = null_surface(&config);
    let mut report = BenchmarkReport {
        frames: 0,
        matches: 0,
        elapsed: Duration::ZERO,
    };

    let started = Instant::now();
    while report.frames < frames {
        let mut runner = MatchRunner::new(config.clone(), &script, RunOptions::default())?;
        report.matches += 1;
        let mut index = 0;
        while report.frames < frames {
            let status = runner.step(
                frame_timestamp(index, DEFAULT_FRAME_RATE),
                &mut surface,
                &mut NullHud,
            );
            index += 1;
            report.frames += 1;
            if !status.is_running() {
                break;
            }
        }
    }
    report.elapsed = started.elapsed();
    Ok(report)
}

fn null_surface(config: &MatchConfig) -> NullSurface {
    NullSurface::new(config.arena.width, config.arena.height)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(script: &InputScript, options: RunOptions) -> RunOutcome {
        let config = MatchConfig::default();
        let mut surface = null_surface(&config);
        MatchRunner::new(config, script, options)
            .unwrap()
            .run(&mut surface, &mut NullHud)
    }

    #[test]
    fn test_idle_script_runs_out_the_clock() {
        let outcome = run(&InputScript::idle(), RunOptions::default());
        assert_eq!(outcome.summary.end, RunEnd::Ended);
        assert_eq!(outcome.summary.result, Some(MatchResult::Draw));
        assert_eq!(outcome.summary.frames, 541);
        assert_eq!(outcome.summary.seconds_remaining, 0);
        assert_eq!(outcome.summary.banner.as_deref(), Some("Draw, time is up!"));
    }

    #[test]
    fn test_rush_script_wins() {
        let outcome = run(&InputScript::rush(), RunOptions::default());
        assert_eq!(outcome.summary.result, Some(MatchResult::PlayerWin));
        assert!(outcome.summary.enemy_health <= 0);
        assert_eq!(outcome.summary.player_health, 100);
        assert!(outcome.summary.seconds_remaining > 0);
    }

    #[test]
    fn test_frame_limit_shuts_match_down() {
        let outcome = run(
            &InputScript::idle(),
            RunOptions {
                max_frames: 30,
                ..RunOptions::default()
            },
        );
        assert_eq!(outcome.summary.end, RunEnd::FrameLimit);
        assert_eq!(outcome.summary.frames, 30);
        assert_eq!(outcome.summary.result, None);
        assert_eq!(
            outcome.game.status(),
            &MatchStatus::Halted(HaltReason::ShutDown)
        );
        assert!(outcome.game.timers().is_empty());
    }

    #[test]
    fn test_recording_matches_summary() {
        let outcome = run(
            &InputScript::rush(),
            RunOptions {
                record: true,
                ..RunOptions::default()
            },
        );
        let recording = outcome.recording.unwrap();
        assert_eq!(recording.label, "rush");
        assert_eq!(recording.final_frame, outcome.summary.frames);
        assert_eq!(recording.final_hash, outcome.summary.final_hash);
        assert_eq!(recording.result, outcome.summary.result);
        assert_eq!(recording.frame_count() as u64, outcome.summary.frames);
    }

    #[test]
    fn test_console_hud_prints_lines() {
        let config = MatchConfig::default();
        let mut surface = null_surface(&config);
        let mut hud = ConsoleHud::new(Vec::new());
        MatchRunner::new(config, &InputScript::idle(), RunOptions::default())
            .unwrap()
            .run(&mut surface, &mut hud);

        // One line per countdown change; the last one also carries the end.
        assert_eq!(hud.updates(), 10);
        let text = String::from_utf8(hud.into_inner()).unwrap();
        assert!(text.lines().last().unwrap().ends_with("Draw, time is up!"));
    }

    #[test]
    fn test_verify_reports_identical_runs() {
        let report = verify_determinism(&MatchConfig::default(), &InputScript::rush(), 3).unwrap();
        assert_eq!(report.hashes.len(), 3);
        assert!(report.is_deterministic());
    }

    #[test]
    fn test_benchmark_counts_frames_across_matches() {
        let report = benchmark(1_000).unwrap();
        assert_eq!(report.frames, 1_000);
        assert!(report.matches >= 2);
    }

    #[test]
    fn test_summary_json_fields() {
        let outcome = run(&InputScript::idle(), RunOptions::default());
        let json = outcome.summary.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["end"], "ended");
        assert_eq!(value["result"], "Draw");
        assert_eq!(value["frames"], 541);
    }
}

//! Headless duel runner.
//!
//! Plays matches from input scripts without graphics. Designed for CI
//! testing, determinism checks and recording verification.
//!
//! # Usage
//!
//! ```bash
//! # Run the stock match with no input (ends in a draw)
//! cargo run -p duel_headless -- run
//!
//! # Run a scripted match, print JSON
//! cargo run -p duel_headless -- run --script data/rush.ron --json
//!
//! # Check determinism over 10 runs
//! cargo run -p duel_headless -- verify --script data/rush.ron --runs 10
//! ```
//!
//! Results and HUD lines go to stdout, logs to stderr.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use duel_core::config::MatchConfig;
use duel_core::recording::{InputRecording, Playback};
use duel_core::render::{NullHud, NullSurface};
use duel_headless::{
    ascii::{AsciiConfig, AsciiSurface},
    runner::{benchmark, verify_determinism, ConsoleHud, MatchRunner, RunEnd, RunOptions},
    script::InputScript,
};

#[derive(Parser)]
#[command(name = "duel_headless")]
#[command(about = "Headless duel runner for scripted play and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a single match
    Run {
        /// Match config file (RON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Input script file (RON)
        #[arg(short, long)]
        script: Option<PathBuf>,

        /// Pace frames against the wall clock
        #[arg(long)]
        realtime: bool,

        /// Stop after this many frames
        #[arg(long, default_value = "36000")]
        max_frames: u64,

        /// Save an input recording to this file
        #[arg(long)]
        record: Option<PathBuf>,

        /// Print the last frame as ASCII art
        #[arg(long)]
        ascii: bool,

        /// Print a JSON summary instead of HUD lines
        #[arg(long)]
        json: bool,
    },

    /// Verify determinism by running the same script multiple times
    Verify {
        /// Match config file (RON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Input script file (RON)
        #[arg(short, long)]
        script: Option<PathBuf>,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,
    },

    /// Play back an input recording
    Playback {
        /// Recording file path
        #[arg(short, long)]
        file: PathBuf,

        /// Verify playback reaches the recorded hash
        #[arg(long)]
        verify: bool,
    },

    /// Run N frames for benchmarking
    Benchmark {
        /// Number of frames to run
        #[arg(short, long, default_value = "36000")]
        frames: u64,
    },
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    match cli.command {
        Some(Commands::Run {
            config,
            script,
            realtime,
            max_frames,
            record,
            ascii,
            json,
        }) => {
            cmd_run(config, script, realtime, max_frames, record, ascii, json);
        }
        Some(Commands::Verify {
            config,
            script,
            runs,
        }) => {
            cmd_verify(config, script, runs);
        }
        Some(Commands::Playback { file, verify }) => {
            cmd_playback(file, verify);
        }
        Some(Commands::Benchmark { frames }) => {
            cmd_benchmark(frames);
        }
        None => {
            cmd_run(None, None, false, 36_000, None, false, false);
        }
    }
}

fn load_config(path: Option<PathBuf>) -> MatchConfig {
    let Some(path) = path else {
        return MatchConfig::default();
    };
    tracing::info!("Using config: {}", path.display());
    match MatchConfig::load(&path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            std::process::exit(1);
        }
    }
}

fn load_script(path: Option<PathBuf>) -> InputScript {
    let Some(path) = path else {
        return InputScript::idle();
    };
    tracing::info!("Using script: {}", path.display());
    match InputScript::load(&path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to load script: {}", e);
            std::process::exit(1);
        }
    }
}

/// Play a single match
#[allow(clippy::fn_params_excessive_bools)]
fn cmd_run(
    config: Option<PathBuf>,
    script: Option<PathBuf>,
    realtime: bool,
    max_frames: u64,
    record: Option<PathBuf>,
    ascii: bool,
    json: bool,
) {
    let mut config = load_config(config);
    let script = load_script(script);
    if ascii {
        config.show_hitboxes = true;
    }

    let options = RunOptions {
        max_frames,
        realtime,
        record: record.is_some(),
        ..RunOptions::default()
    };
    let mut ascii_surface = ascii.then(|| {
        AsciiSurface::new(
            config.arena.width,
            config.arena.height,
            AsciiConfig::default(),
        )
    });
    let mut null_surface = NullSurface::new(config.arena.width, config.arena.height);

    let runner = match MatchRunner::new(config, &script, options) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Failed to start match: {}", e);
            std::process::exit(1);
        }
    };

    let outcome = if json {
        match ascii_surface.as_mut() {
            Some(surface) => runner.run(surface, &mut NullHud),
            None => runner.run(&mut null_surface, &mut NullHud),
        }
    } else {
        let mut hud = ConsoleHud::new(std::io::stdout());
        match ascii_surface.as_mut() {
            Some(surface) => runner.run(surface, &mut hud),
            None => runner.run(&mut null_surface, &mut hud),
        }
    };

    if let (Some(path), Some(recording)) = (&record, &outcome.recording) {
        if let Err(e) = recording.save(path) {
            eprintln!("Failed to save recording: {}", e);
            std::process::exit(1);
        }
        tracing::info!("Recording saved to {}", path.display());
    }

    let summary = &outcome.summary;
    if json {
        match summary.to_json() {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Failed to serialize summary: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        if let Some(surface) = &ascii_surface {
            println!("{}", surface.render(Some(&outcome.game.hud_state())));
        }
        match summary.end {
            RunEnd::Ended => println!(
                "{} ({} frames)",
                summary.banner.as_deref().unwrap_or_default(),
                summary.frames
            ),
            RunEnd::Halted => println!(
                "Match halted: {}",
                summary.halt_reason.as_deref().unwrap_or("unknown")
            ),
            RunEnd::FrameLimit => println!("Stopped after {} frames", summary.frames),
        }
        println!("Final state hash: {:016x}", summary.final_hash);
    }

    if summary.end == RunEnd::Halted {
        std::process::exit(1);
    }
}

/// Verify determinism
fn cmd_verify(config: Option<PathBuf>, script: Option<PathBuf>, runs: u32) {
    let config = load_config(config);
    let script = load_script(script);
    tracing::info!("Verifying determinism: {} ({} runs)", script.name, runs);

    let report = match verify_determinism(&config, &script, runs) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Failed to run match: {}", e);
            std::process::exit(1);
        }
    };

    if report.is_deterministic() {
        eprintln!("PASS: All {} runs produced identical results", runs);
        eprintln!("  Frames: {}", report.frames.first().copied().unwrap_or(0));
        eprintln!("  Hash:   {:016x}", report.hashes.first().copied().unwrap_or(0));
    } else {
        eprintln!("FAIL: Non-determinism detected!");
        for (i, (frames, hash)) in report.frames.iter().zip(&report.hashes).enumerate() {
            eprintln!("  Run {}: {} frames, hash {:016x}", i, frames, hash);
        }
        std::process::exit(1);
    }
}

/// Play back a recording
fn cmd_playback(file: PathBuf, verify: bool) {
    if verify {
        tracing::info!("Verifying recording: {}", file.display());
    } else {
        tracing::info!("Playing recording: {}", file.display());
    }

    let recording = match InputRecording::load(&file) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Failed to load recording: {}", e);
            std::process::exit(1);
        }
    };

    eprintln!("Loaded recording:");
    eprintln!("  Label: {}", recording.label);
    eprintln!("  Frames: {}", recording.frame_count());
    eprintln!("  Duration: {:.2}s", recording.duration().as_secs_f64());

    let mut playback = match Playback::new(recording) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to create playback: {}", e);
            std::process::exit(1);
        }
    };

    let config = playback.game().config();
    let mut surface = NullSurface::new(config.arena.width, config.arena.height);

    if verify {
        eprintln!("Verifying recording...");
        playback.run_to_end(&mut surface, &mut NullHud);
        if playback.matches_recording() {
            eprintln!("PASS: Playback verification successful");
            eprintln!("  Expected hash: {:016x}", playback.recording().final_hash);
            eprintln!("  Actual hash:   {:016x}", playback.game().state_hash());
        } else {
            eprintln!("FAIL: Playback produced different state!");
            eprintln!(
                "  Expected: frame {} hash {:016x}",
                playback.recording().final_frame,
                playback.recording().final_hash
            );
            eprintln!(
                "  Actual:   frame {} hash {:016x}",
                playback.game().frame_count(),
                playback.game().state_hash()
            );
            std::process::exit(1);
        }
    } else {
        let total = playback.recording().frame_count();
        let mut hud = ConsoleHud::new(std::io::stdout());
        let mut last_percent = 0;

        while playback.advance(&mut surface, &mut hud) {
            let percent = playback.position() * 100 / total.max(1);
            if percent > last_percent && percent % 10 == 0 {
                eprintln!("Progress: {}%", percent);
                last_percent = percent;
            }
        }

        eprintln!("Playback complete at frame {}", playback.game().frame_count());
        eprintln!("Final state hash: {:016x}", playback.game().state_hash());
        if let Some(result) = playback.game().status().result() {
            println!("{}", result.banner());
        }
    }
}

/// Run benchmark
fn cmd_benchmark(frames: u64) {
    tracing::info!("Running {} frame benchmark", frames);

    let report = match benchmark(frames) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Benchmark failed: {}", e);
            std::process::exit(1);
        }
    };

    eprintln!("Benchmark complete:");
    eprintln!("  Frames: {}", report.frames);
    eprintln!("  Matches: {}", report.matches);
    eprintln!("  Time: {:.2?}", report.elapsed);
    eprintln!("  Frames/sec: {:.0}", report.frames_per_second());
    let realtime_factor = report.frames_per_second() / 60.0;
    eprintln!("  Realtime factor: {:.1}x", realtime_factor);
}

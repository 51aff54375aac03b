//! Determinism testing utilities.
//!
//! Provides a harness for verifying that a match produces identical
//! results given identical config and input.
//!
//! # Testing Strategy
//!
//! A match must be bit-reproducible so that snapshots resume exactly and
//! input recordings play back to the recorded state. Sources of
//! non-determinism include:
//!
//! - **Floating-point math**: We use fixed-point arithmetic via
//!   [`duel_core::math::Fixed`] throughout the frame loop.
//!
//! - **Wall-clock time**: The core never reads the clock; every frame is
//!   given its match time explicitly.
//!
//! - **HashMap iteration order**: Simulation state lives in fixed arrays
//!   and vectors, never maps.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Individual component behaviour (physics, combat, timers)
//! 2. **Property tests**: Random input streams still produce deterministic outputs
//! 3. **Integration tests**: Full matches are reproducible
//! 4. **Parallel tests**: Running N matches on separate threads all agree

use std::thread;

use duel_core::config::MatchConfig;
use duel_core::input::FrameInput;
use duel_core::simulation::{Match, MatchSnapshot};

use crate::fixtures::MatchDriver;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of frames simulated.
    pub frames: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for deterministic simulation).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the simulation was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the simulation produced different hashes across runs.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Match is non-deterministic!\n\
                 Runs: {}\n\
                 Frames: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.frames,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the simulation
/// * `frames` - Number of frames to simulate per run
/// * `setup` - Function to create initial state
/// * `step` - Function to advance by one frame; receives the frame index
/// * `hash` - Function to compute state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    frames: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S, u64),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for frame in 0..frames {
            step(&mut state, frame);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        frames,
    }
}

/// Input for frame `index` from a script, neutral past its end.
fn scripted(script: &[[FrameInput; 2]], index: u64) -> [FrameInput; 2] {
    usize::try_from(index)
        .ok()
        .and_then(|i| script.get(i))
        .copied()
        .unwrap_or([FrameInput::NEUTRAL; 2])
}

/// Play `script` against `config` `runs` times and compare final hashes.
pub fn verify_match_determinism(
    config: &MatchConfig,
    script: &[[FrameInput; 2]],
    runs: usize,
) -> DeterminismResult {
    verify_determinism(
        runs,
        script.len() as u64,
        || MatchDriver::new(config.clone()),
        |driver, frame| {
            let [player, enemy] = scripted(script, frame);
            driver.step(player, enemy);
        },
        |driver| driver.game.state_hash(),
    )
}

/// Compare two runs frame-by-frame, finding first divergence.
///
/// Useful for debugging non-determinism by finding exactly when
/// matches start to differ.
///
/// # Returns
///
/// `None` if the runs agree, `Some(frame)` if they diverge after that frame.
pub fn find_first_divergence(config: &MatchConfig, script: &[[FrameInput; 2]]) -> Option<u64> {
    let mut a = MatchDriver::new(config.clone());
    let mut b = MatchDriver::new(config.clone());

    if a.game.state_hash() != b.game.state_hash() {
        return Some(0);
    }

    for (frame, [player, enemy]) in (1..).zip(script.iter().copied()) {
        a.step(player, enemy);
        b.step(player, enemy);

        if a.game.state_hash() != b.game.state_hash() {
            return Some(frame);
        }
    }

    None
}

/// Run `split` frames, snapshot through bincode, restore, and finish the
/// script on both the original and the restored match.
///
/// Returns true if the two agree on every frame after the split.
pub fn verify_snapshot_resume(
    config: &MatchConfig,
    script: &[[FrameInput; 2]],
    split: usize,
) -> bool {
    let mut original = MatchDriver::new(config.clone());
    let split = split.min(script.len());
    for [player, enemy] in &script[..split] {
        original.step(*player, *enemy);
    }

    let Ok(bytes) = original.game.snapshot().to_bytes() else {
        return false;
    };
    let Ok(snapshot) = MatchSnapshot::from_bytes(&bytes) else {
        return false;
    };
    let Ok(restored) = Match::restore(config.clone(), &snapshot) else {
        return false;
    };
    let mut resumed = MatchDriver::from_match(restored);

    if resumed.game.state_hash() != original.game.state_hash() {
        return false;
    }

    for [player, enemy] in &script[split..] {
        original.step(*player, *enemy);
        resumed.step(*player, *enemy);
        if resumed.game.state_hash() != original.game.state_hash() {
            return false;
        }
    }
    true
}

/// Run `num_runs` matches on separate threads and collect final hashes.
pub fn run_parallel_matches(
    config: &MatchConfig,
    script: &[[FrameInput; 2]],
    num_runs: usize,
) -> DeterminismResult {
    let hashes: Vec<u64> = thread::scope(|s| {
        let handles: Vec<_> = (0..num_runs)
            .map(|_| {
                s.spawn(|| {
                    let mut driver = MatchDriver::new(config.clone());
                    for [player, enemy] in script {
                        driver.step(*player, *enemy);
                    }
                    driver.game.state_hash()
                })
            })
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    DeterminismResult {
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
        frames: script.len() as u64,
    }
}

/// Proptest strategies for determinism testing.
///
/// These strategies generate random but reproducible inputs for
/// property-based testing of match determinism.
pub mod strategies {
    use duel_core::input::{FrameInput, InputState};
    use duel_core::math::{Coords, Fixed};
    use proptest::prelude::*;

    /// Generate a held-key state.
    pub fn arb_input_state() -> impl Strategy<Value = InputState> {
        (any::<bool>(), any::<bool>(), any::<bool>())
            .prop_map(|(left, right, jump)| InputState { left, right, jump })
    }

    /// Generate one fighter's frame input. Attacks are rarer than moves.
    pub fn arb_frame_input() -> impl Strategy<Value = FrameInput> {
        (arb_input_state(), prop::bool::weighted(0.1))
            .prop_map(|(keys, attack)| FrameInput { keys, attack })
    }

    /// Generate a script of `len` frames for both fighters.
    pub fn arb_script(len: usize) -> impl Strategy<Value = Vec<[FrameInput; 2]>> {
        prop::collection::vec(
            (arb_frame_input(), arb_frame_input()).prop_map(|(p, e)| [p, e]),
            len,
        )
    }

    /// Generate a position inside the default arena, above the floor.
    pub fn arb_arena_position() -> impl Strategy<Value = Coords> {
        (0i32..974, 0i32..330).prop_map(|(x, y)| Coords::from_int(x, y))
    }

    /// Generate damage amounts, including zero and large hits.
    pub fn arb_damage() -> impl Strategy<Value = i32> {
        0i32..250
    }

    /// Generate a horizontal speed.
    pub fn arb_speed() -> impl Strategy<Value = Fixed> {
        (-20i32..=20).prop_map(Fixed::from_num)
    }
}

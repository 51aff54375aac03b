//! Match controller: per-frame orchestration and end-state evaluation.
//!
//! The controller exclusively owns both fighters, the countdown and the
//! deferred-task queue. Each call to [`Match::frame`] runs, in order:
//!
//! 1. every deferred task due at or before the frame timestamp
//! 2. attack presses from this frame's input
//! 3. clear, both attack checks, both wall checks, facing
//! 4. scenery, then each fighter's advance
//! 5. end-state evaluation
//!
//! Once the match has ended (or been shut down) further frames are no-ops.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::animation::FrameCycler;
use crate::clock::{Countdown, MatchTask, TimerQueue, COUNTDOWN_INTERVAL};
use crate::combat::{resolve_attack, resolve_facing, resolve_wall_collision};
use crate::config::MatchConfig;
use crate::error::{DuelError, Result};
use crate::fighter::{Fighter, FighterSnapshot};
use crate::input::{FrameInput, InputSource, Side};
use crate::render::{health_pct, Hud, HudUpdate, RenderSurface};
use crate::scenery::Scenery;

/// Snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// How a finished match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchResult {
    /// The enemy ran out of health.
    PlayerWin,
    /// The player ran out of health (checked first on a double KO).
    EnemyWin,
    /// Time ran out with both fighters standing.
    Draw,
}

impl MatchResult {
    /// Text shown by the HUD when the match ends.
    #[must_use]
    pub const fn banner(self) -> &'static str {
        match self {
            MatchResult::PlayerWin => "Game over, you win!",
            MatchResult::EnemyWin => "Game over, you lose!",
            MatchResult::Draw => "Draw, time is up!",
        }
    }
}

impl std::fmt::Display for MatchResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.banner())
    }
}

/// Why a match stopped without a result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HaltReason {
    /// [`Match::shutdown`] was called while the match was running.
    ShutDown,
    /// Internal state became inconsistent.
    InvariantViolated(String),
}

/// Lifecycle state of a match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchStatus {
    /// Frames are being simulated.
    Running,
    /// Finished with a result.
    Ended(MatchResult),
    /// Stopped without a result.
    Halted(HaltReason),
}

impl MatchStatus {
    /// Whether frames still mutate state.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        matches!(self, MatchStatus::Running)
    }

    /// The result, if the match ended normally.
    #[must_use]
    pub const fn result(&self) -> Option<MatchResult> {
        match self {
            MatchStatus::Ended(result) => Some(*result),
            _ => None,
        }
    }
}

/// Everything needed to resume a match bit-identically.
///
/// Static settings are not included; restore against the same
/// [`MatchConfig`] the snapshot was taken from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchSnapshot {
    /// Format version.
    pub version: u32,
    /// Frames simulated so far.
    pub frame: u64,
    /// Countdown state.
    pub countdown: Countdown,
    /// Pending deferred tasks.
    pub timers: TimerQueue<MatchTask>,
    /// Lifecycle state.
    pub status: MatchStatus,
    /// Player then enemy.
    pub fighters: [FighterSnapshot; 2],
    /// Scenery frame counters.
    pub scenery: Vec<FrameCycler>,
}

impl MatchSnapshot {
    /// Encode with bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode from bincode, rejecting other format versions.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let snapshot: Self = bincode::deserialize(data)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(DuelError::VersionMismatch {
                expected: SNAPSHOT_VERSION,
                found: snapshot.version,
            });
        }
        Ok(snapshot)
    }
}

/// A two-fighter match.
#[derive(Debug, Clone)]
pub struct Match {
    config: MatchConfig,
    fighters: [Fighter; 2],
    scenery: Scenery,
    countdown: Countdown,
    timers: TimerQueue<MatchTask>,
    status: MatchStatus,
    frame: u64,
    torn_down: bool,
}

impl Match {
    /// Build a match from `config`.
    ///
    /// Fails if the config does not validate. The first countdown tick is
    /// due immediately, so the countdown shows one less than the configured
    /// duration after the first frame.
    pub fn new(config: MatchConfig) -> Result<Self> {
        config.validate()?;
        let game = Self::build(config);
        tracing::info!(
            player = game.fighters[0].name(),
            enemy = game.fighters[1].name(),
            duration_secs = game.countdown.remaining(),
            "Match started"
        );
        Ok(game)
    }

    fn build(config: MatchConfig) -> Self {
        let fighters = [
            Fighter::new(Side::Player, &config),
            Fighter::new(Side::Enemy, &config),
        ];
        let mut timers = TimerQueue::new();
        timers.schedule(Duration::ZERO, MatchTask::CountdownTick);
        Self {
            scenery: Scenery::new(&config.scenery),
            countdown: Countdown::new(config.match_duration_secs),
            fighters,
            timers,
            status: MatchStatus::Running,
            frame: 0,
            torn_down: false,
            config,
        }
    }

    /// Rebuild a match from a snapshot taken with the same config.
    pub fn restore(config: MatchConfig, snapshot: &MatchSnapshot) -> Result<Self> {
        config.validate()?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(DuelError::VersionMismatch {
                expected: SNAPSHOT_VERSION,
                found: snapshot.version,
            });
        }
        let mut game = Self::build(config);
        for side in Side::ALL {
            game.fighters[side.index()].restore(&snapshot.fighters[side.index()]);
        }
        game.scenery.restore_cyclers(&snapshot.scenery);
        game.countdown = snapshot.countdown;
        game.timers = snapshot.timers.clone();
        game.status = snapshot.status.clone();
        game.frame = snapshot.frame;
        game.torn_down = !game.status.is_running();
        Ok(game)
    }

    /// Capture the dynamic state.
    #[must_use]
    pub fn snapshot(&self) -> MatchSnapshot {
        MatchSnapshot {
            version: SNAPSHOT_VERSION,
            frame: self.frame,
            countdown: self.countdown,
            timers: self.timers.clone(),
            status: self.status.clone(),
            fighters: [self.fighters[0].snapshot(), self.fighters[1].snapshot()],
            scenery: self.scenery.cyclers(),
        }
    }

    /// The config this match was built from.
    #[must_use]
    pub const fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Lifecycle state.
    #[must_use]
    pub const fn status(&self) -> &MatchStatus {
        &self.status
    }

    /// Frames simulated so far.
    #[must_use]
    pub const fn frame_count(&self) -> u64 {
        self.frame
    }

    /// Countdown state.
    #[must_use]
    pub const fn countdown(&self) -> Countdown {
        self.countdown
    }

    /// Pending deferred tasks.
    #[must_use]
    pub const fn timers(&self) -> &TimerQueue<MatchTask> {
        &self.timers
    }

    /// The fighter on `side`.
    #[must_use]
    pub fn fighter(&self, side: Side) -> &Fighter {
        &self.fighters[side.index()]
    }

    /// The left-hand fighter.
    #[must_use]
    pub fn player(&self) -> &Fighter {
        &self.fighters[0]
    }

    /// The right-hand fighter.
    #[must_use]
    pub fn enemy(&self) -> &Fighter {
        &self.fighters[1]
    }

    /// Scenery props.
    #[must_use]
    pub const fn scenery(&self) -> &Scenery {
        &self.scenery
    }

    /// Current HUD values.
    #[must_use]
    pub fn hud_state(&self) -> HudUpdate {
        HudUpdate {
            player_health_pct: health_pct(self.player().health(), self.player().max_health()),
            enemy_health_pct: health_pct(self.enemy().health(), self.enemy().max_health()),
            seconds_remaining: self.countdown.remaining(),
            result: self.status.result(),
        }
    }

    /// Run one frame at match time `now`.
    ///
    /// `now` must not go backwards between calls. Returns the status after
    /// the frame; once it is no longer [`MatchStatus::Running`] the caller
    /// should stop calling.
    pub fn frame(
        &mut self,
        now: Duration,
        input: &mut dyn InputSource,
        surface: &mut dyn RenderSurface,
        hud: &mut dyn Hud,
    ) -> MatchStatus {
        if !self.status.is_running() {
            return self.status.clone();
        }

        let mut hud_dirty = self.run_due_tasks(now);

        let inputs: [FrameInput; 2] = Side::ALL.map(|side| input.poll(side));
        for side in Side::ALL {
            if inputs[side.index()].attack {
                self.fighters[side.index()].start_attack(&mut self.timers, now);
            }
        }

        surface.clear();

        let arena = &self.config.arena;
        let [player, enemy] = &mut self.fighters;
        hud_dirty |= resolve_attack(player, enemy).is_some();
        hud_dirty |= resolve_attack(enemy, player).is_some();
        resolve_wall_collision(player, arena.width);
        resolve_wall_collision(enemy, arena.width);
        resolve_facing(player, enemy);

        self.scenery.update(surface);
        player.advance(&inputs[0].keys, arena, surface);
        enemy.advance(&inputs[1].keys, arena, surface);

        self.frame += 1;

        if let Some(violation) = self
            .fighters
            .iter()
            .find_map(|f| f.check_invariants().err())
        {
            tracing::error!(frame = self.frame, %violation, "Invariant violated, halting match");
            self.status = MatchStatus::Halted(HaltReason::InvariantViolated(violation));
            self.teardown(input);
            return self.status.clone();
        }

        if let Some(result) = self.evaluate_end() {
            tracing::info!(
                frame = self.frame,
                player_health = self.player().health(),
                enemy_health = self.enemy().health(),
                ?result,
                "Match ended"
            );
            self.status = MatchStatus::Ended(result);
            self.teardown(input);
            hud_dirty = true;
        }

        if hud_dirty {
            hud.update(&self.hud_state());
        }

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::debug!(frame = self.frame, state_hash = hash, "Match state hash");
        }

        self.status.clone()
    }

    fn run_due_tasks(&mut self, now: Duration) -> bool {
        let mut countdown_changed = false;
        while let Some((due, task)) = self.timers.pop_due(now) {
            match task {
                MatchTask::CountdownTick => {
                    if let Some(remaining) = self.countdown.tick() {
                        tracing::debug!(remaining, "Countdown tick");
                        countdown_changed = true;
                    }
                    self.timers
                        .schedule(due + COUNTDOWN_INTERVAL, MatchTask::CountdownTick);
                }
                MatchTask::CloseAttackWindow(side) => {
                    self.fighters[side.index()].attack_window_elapsed();
                }
            }
        }
        countdown_changed
    }

    /// Player loss is checked first, so a double KO goes to the enemy.
    fn evaluate_end(&self) -> Option<MatchResult> {
        if self.player().is_defeated() {
            Some(MatchResult::EnemyWin)
        } else if self.enemy().is_defeated() {
            Some(MatchResult::PlayerWin)
        } else if self.countdown.is_expired() {
            Some(MatchResult::Draw)
        } else {
            None
        }
    }

    /// Tear the match down: cancel all deferred tasks and detach input.
    ///
    /// Safe to call more than once. A running match is halted; an ended
    /// match keeps its result.
    pub fn shutdown(&mut self, input: &mut dyn InputSource) {
        if self.status.is_running() {
            tracing::info!(frame = self.frame, "Match shut down");
            self.status = MatchStatus::Halted(HaltReason::ShutDown);
        }
        self.teardown(input);
    }

    fn teardown(&mut self, input: &mut dyn InputSource) {
        if self.torn_down {
            return;
        }
        self.timers.clear();
        for fighter in &mut self.fighters {
            fighter.forget_timers();
        }
        input.shutdown();
        self.torn_down = true;
    }

    /// Hash of all dynamic state, for determinism checks.
    ///
    /// Two matches fed identical config and input produce identical hashes
    /// frame by frame.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.frame.hash(&mut hasher);
        self.countdown.hash(&mut hasher);
        self.status.hash(&mut hasher);
        self.timers.hash(&mut hasher);

        for fighter in &self.fighters {
            let position = fighter.position();
            let velocity = fighter.velocity();
            position.x.to_bits().hash(&mut hasher);
            position.y.to_bits().hash(&mut hasher);
            velocity.x.to_bits().hash(&mut hasher);
            velocity.y.to_bits().hash(&mut hasher);
            fighter.facing().hash(&mut hasher);
            fighter.health().hash(&mut hasher);
            fighter.is_attacking().hash(&mut hasher);
            fighter.animator().hash(&mut hasher);
        }

        for prop in self.scenery.props() {
            prop.cycler().hash(&mut hasher);
        }

        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{FixedInput, InputState};
    use crate::math::{Coords, Fixed};
    use crate::render::{NullHud, NullSurface};

    struct Harness {
        game: Match,
        input: FixedInput,
        surface: NullSurface,
        hud: NullHud,
        now: Duration,
    }

    impl Harness {
        fn new(config: MatchConfig) -> Self {
            Self {
                game: Match::new(config).unwrap(),
                input: FixedInput::neutral(),
                surface: NullSurface::new(Fixed::from_num(1024), Fixed::from_num(576)),
                hud: NullHud,
                now: Duration::ZERO,
            }
        }

        fn step(&mut self) -> MatchStatus {
            let status = self
                .game
                .frame(self.now, &mut self.input, &mut self.surface, &mut self.hud);
            self.now += Duration::from_millis(16);
            status
        }
    }

    fn face_off_config() -> MatchConfig {
        let mut config = MatchConfig::default();
        let ground = 480 - 150;
        config.player.start = Coords::from_int(300, ground);
        config.enemy.start = Coords::from_int(340, ground);
        config
    }

    #[test]
    fn test_first_frame_ticks_countdown() {
        let mut h = Harness::new(MatchConfig::default());
        h.step();
        assert_eq!(h.game.countdown().remaining(), 9);
        assert_eq!(h.game.frame_count(), 1);
    }

    #[test]
    fn test_countdown_runs_out_to_draw() {
        let mut config = MatchConfig::default();
        config.match_duration_secs = 3;
        let mut game = Match::new(config).unwrap();
        let mut input = FixedInput::neutral();
        let mut surface = NullSurface::new(Fixed::from_num(1024), Fixed::from_num(576));

        assert!(game
            .frame(Duration::ZERO, &mut input, &mut surface, &mut NullHud)
            .is_running());
        assert!(game
            .frame(Duration::from_secs(1), &mut input, &mut surface, &mut NullHud)
            .is_running());
        let status = game.frame(Duration::from_secs(2), &mut input, &mut surface, &mut NullHud);
        assert_eq!(status, MatchStatus::Ended(MatchResult::Draw));
        assert!(game.timers().is_empty());
    }

    #[test]
    fn test_attack_lands_once() {
        let mut h = Harness::new(face_off_config());
        h.input.set(
            FrameInput {
                keys: InputState::default(),
                attack: true,
            },
            FrameInput::NEUTRAL,
        );
        h.step();
        h.input.set(FrameInput::NEUTRAL, FrameInput::NEUTRAL);
        h.step();
        h.step();

        assert_eq!(h.game.enemy().health(), 90);
        assert_eq!(h.game.player().health(), 100);
    }

    #[test]
    fn test_attack_window_closes_after_timeout() {
        let mut h = Harness::new(MatchConfig::default());
        h.input.set(
            FrameInput {
                keys: InputState::default(),
                attack: true,
            },
            FrameInput::NEUTRAL,
        );
        h.step();
        assert!(h.game.player().is_attacking());
        h.input.set(FrameInput::NEUTRAL, FrameInput::NEUTRAL);

        // 100ms window, 16ms frames: open through t=96, closed at t=112.
        for _ in 0..6 {
            h.step();
        }
        assert!(h.game.player().is_attacking());
        h.step();
        assert!(!h.game.player().is_attacking());
    }

    #[test]
    fn test_frames_after_end_do_nothing() {
        let mut config = MatchConfig::default();
        config.match_duration_secs = 1;
        let mut h = Harness::new(config);
        assert_eq!(h.step(), MatchStatus::Ended(MatchResult::Draw));

        let hash = h.game.state_hash();
        for _ in 0..10 {
            h.step();
        }
        assert_eq!(h.game.state_hash(), hash);
        assert_eq!(h.game.frame_count(), 1);
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let mut h = Harness::new(MatchConfig::default());
        h.step();
        h.game.shutdown(&mut h.input);
        h.game.shutdown(&mut h.input);
        assert_eq!(
            h.game.status(),
            &MatchStatus::Halted(HaltReason::ShutDown)
        );
        assert!(h.game.timers().is_empty());

        let hash = h.game.state_hash();
        h.step();
        assert_eq!(h.game.state_hash(), hash);
    }

    #[test]
    fn test_runaway_position_halts_match() {
        let mut h = Harness::new(MatchConfig::default());
        h.step();
        let mut snapshot = h.game.snapshot();
        snapshot.fighters[0].position.x = Fixed::from_num(crate::math::POSITION_LIMIT + 1000);
        h.game = Match::restore(MatchConfig::default(), &snapshot).unwrap();

        let status = h.step();
        assert!(matches!(
            status,
            MatchStatus::Halted(HaltReason::InvariantViolated(ref reason)) if reason.contains("player")
        ));
        assert!(h.game.timers().is_empty());

        let frame = h.game.frame_count();
        h.step();
        assert_eq!(h.game.frame_count(), frame);
    }

    #[test]
    fn test_invalid_config_refused() {
        let mut config = MatchConfig::default();
        config.enemy.key_bindings.attack = " ".to_string();
        assert!(Match::new(config).is_err());
    }

    #[test]
    fn test_snapshot_bytes_round_trip() {
        let mut h = Harness::new(face_off_config());
        for _ in 0..20 {
            h.step();
        }
        let bytes = h.game.snapshot().to_bytes().unwrap();
        let snapshot = MatchSnapshot::from_bytes(&bytes).unwrap();
        let restored = Match::restore(face_off_config(), &snapshot).unwrap();
        assert_eq!(restored.state_hash(), h.game.state_hash());
    }

    #[test]
    fn test_snapshot_version_checked() {
        let h = Harness::new(MatchConfig::default());
        let mut snapshot = h.game.snapshot();
        snapshot.version = 99;
        let bytes = snapshot.to_bytes().unwrap();
        assert!(matches!(
            MatchSnapshot::from_bytes(&bytes),
            Err(DuelError::VersionMismatch { found: 99, .. })
        ));
    }

    #[test]
    fn test_banners() {
        assert_eq!(MatchResult::EnemyWin.banner(), "Game over, you lose!");
        assert_eq!(MatchResult::PlayerWin.banner(), "Game over, you win!");
        assert_eq!(MatchResult::Draw.to_string(), "Draw, time is up!");
    }
}

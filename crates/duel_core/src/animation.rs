//! Sprite-strip animation and clip selection.
//!
//! A sprite sheet is a horizontal strip of `total_frames` frames. Each
//! frame is held for `held_frames` render frames before moving on.

use serde::{Deserialize, Serialize};

use crate::math::Fixed;

/// Named animation clips a fighter can play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Clip {
    /// Standing still.
    #[default]
    Idle,
    /// Moving horizontally.
    Run,
    /// Rising.
    Jump,
    /// Falling.
    Fall,
    /// Attacking. Plays once.
    Attack,
}

impl Clip {
    /// Every clip, in declaration order.
    pub const ALL: [Clip; 5] = [Clip::Idle, Clip::Run, Clip::Jump, Clip::Fall, Clip::Attack];

    /// Lowercase name for config errors and logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Clip::Idle => "idle",
            Clip::Run => "run",
            Clip::Jump => "jump",
            Clip::Fall => "fall",
            Clip::Attack => "attack",
        }
    }

    /// Whether the clip wraps back to its first frame.
    #[must_use]
    pub const fn is_looping(self) -> bool {
        !matches!(self, Clip::Attack)
    }
}

/// One sprite strip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClipDef {
    /// Image identifier.
    pub image: String,
    /// Frames in the strip.
    pub total_frames: u32,
}

impl ClipDef {
    /// Create a clip definition.
    #[must_use]
    pub fn new(image: impl Into<String>, total_frames: u32) -> Self {
        Self {
            image: image.into(),
            total_frames,
        }
    }
}

/// The five clips a fighter needs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClipSet {
    /// Idle clip.
    pub idle: ClipDef,
    /// Run clip.
    pub run: ClipDef,
    /// Jump clip.
    pub jump: ClipDef,
    /// Fall clip.
    pub fall: ClipDef,
    /// Attack clip.
    pub attack: ClipDef,
}

impl ClipSet {
    /// Look up a clip.
    #[must_use]
    pub fn get(&self, clip: Clip) -> &ClipDef {
        match clip {
            Clip::Idle => &self.idle,
            Clip::Run => &self.run,
            Clip::Jump => &self.jump,
            Clip::Fall => &self.fall,
            Clip::Attack => &self.attack,
        }
    }
}

/// Frame counter for one sprite strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameCycler {
    current_frame: u32,
    elapsed_frames: u32,
    held_frames: u32,
    total_frames: u32,
    looping: bool,
    finished: bool,
}

impl FrameCycler {
    /// Create a cycler at frame 0.
    ///
    /// `held_frames` and `total_frames` are clamped to at least 1;
    /// configuration validation rejects zero before it gets here.
    #[must_use]
    pub fn new(total_frames: u32, held_frames: u32, looping: bool) -> Self {
        Self {
            current_frame: 0,
            elapsed_frames: 0,
            held_frames: held_frames.max(1),
            total_frames: total_frames.max(1),
            looping,
            finished: false,
        }
    }

    /// Frame to draw.
    #[must_use]
    pub const fn current_frame(&self) -> u32 {
        self.current_frame
    }

    /// Render frames elapsed since the strip started.
    #[must_use]
    pub const fn elapsed_frames(&self) -> u32 {
        self.elapsed_frames
    }

    /// Frames in the strip.
    #[must_use]
    pub const fn total_frames(&self) -> u32 {
        self.total_frames
    }

    /// A non-looping strip has shown its last frame for a full hold.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    /// Advance one render frame.
    pub fn advance(&mut self) {
        self.elapsed_frames = self.elapsed_frames.wrapping_add(1);
        if self.elapsed_frames % self.held_frames != 0 {
            return;
        }
        if self.current_frame + 1 < self.total_frames {
            self.current_frame += 1;
        } else if self.looping {
            self.current_frame = 0;
        } else {
            self.finished = true;
        }
    }
}

/// Animation player for a fighter: one active clip plus its frame counter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpriteAnimator {
    clip: Clip,
    cycler: FrameCycler,
    held_frames: u32,
    frame_counts: [u32; 5],
}

impl SpriteAnimator {
    /// Create an animator over `clips`, starting on [`Clip::Idle`].
    #[must_use]
    pub fn new(clips: &ClipSet, held_frames: u32) -> Self {
        let frame_counts = Clip::ALL.map(|clip| clips.get(clip).total_frames);
        let mut animator = Self {
            clip: Clip::Idle,
            cycler: FrameCycler::new(1, held_frames, true),
            held_frames,
            frame_counts,
        };
        animator.restart(Clip::Idle);
        animator
    }

    /// Active clip.
    #[must_use]
    pub const fn clip(&self) -> Clip {
        self.clip
    }

    /// Frame counter of the active clip.
    #[must_use]
    pub const fn cycler(&self) -> &FrameCycler {
        &self.cycler
    }

    /// Frame to draw.
    #[must_use]
    pub const fn current_frame(&self) -> u32 {
        self.cycler.current_frame
    }

    /// The active clip has run to completion (attack only).
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.cycler.finished
    }

    /// True while the attack clip is playing and has not finished.
    #[must_use]
    pub const fn attack_in_progress(&self) -> bool {
        matches!(self.clip, Clip::Attack) && !self.cycler.finished
    }

    /// Switch clips. Switching to the clip already playing does nothing.
    pub fn set_clip(&mut self, clip: Clip) {
        if clip != self.clip {
            self.restart(clip);
        }
    }

    /// Switch to `clip` and rewind it to frame 0, even if it is playing.
    pub fn restart(&mut self, clip: Clip) {
        let total = self.frame_counts[clip as usize];
        self.clip = clip;
        self.cycler = FrameCycler::new(total, self.held_frames, clip.is_looping());
    }

    /// Advance one render frame.
    pub fn advance(&mut self) {
        self.cycler.advance();
    }
}

/// Choose a fighter's clip from its physical state.
///
/// Priority: jumping, falling, an unfinished attack, running, idle.
#[must_use]
pub fn select_clip(velocity_y: Fixed, attack_in_progress: bool, running: bool) -> Clip {
    if velocity_y < Fixed::ZERO {
        Clip::Jump
    } else if velocity_y > Fixed::ZERO {
        Clip::Fall
    } else if attack_in_progress {
        Clip::Attack
    } else if running {
        Clip::Run
    } else {
        Clip::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clips() -> ClipSet {
        ClipSet {
            idle: ClipDef::new("idle.png", 4),
            run: ClipDef::new("run.png", 8),
            jump: ClipDef::new("jump.png", 2),
            fall: ClipDef::new("fall.png", 2),
            attack: ClipDef::new("attack.png", 3),
        }
    }

    #[test]
    fn test_cycler_holds_then_advances() {
        let mut c = FrameCycler::new(3, 2, true);
        c.advance();
        assert_eq!(c.current_frame(), 0);
        c.advance();
        assert_eq!(c.current_frame(), 1);
    }

    #[test]
    fn test_cycler_loops() {
        let mut c = FrameCycler::new(2, 1, true);
        c.advance();
        c.advance();
        assert_eq!(c.current_frame(), 0);
        assert!(!c.is_finished());
    }

    #[test]
    fn test_non_looping_finishes_on_last_frame() {
        let mut c = FrameCycler::new(2, 1, false);
        c.advance();
        assert_eq!(c.current_frame(), 1);
        assert!(!c.is_finished());
        c.advance();
        assert_eq!(c.current_frame(), 1);
        assert!(c.is_finished());
    }

    #[test]
    fn test_set_clip_same_clip_keeps_progress() {
        let mut anim = SpriteAnimator::new(&clips(), 1);
        anim.set_clip(Clip::Run);
        anim.advance();
        anim.advance();
        assert_eq!(anim.current_frame(), 2);
        anim.set_clip(Clip::Run);
        assert_eq!(anim.current_frame(), 2);
        anim.set_clip(Clip::Idle);
        assert_eq!(anim.current_frame(), 0);
    }

    #[test]
    fn test_attack_runs_to_completion() {
        let mut anim = SpriteAnimator::new(&clips(), 1);
        anim.restart(Clip::Attack);
        assert!(anim.attack_in_progress());
        for _ in 0..3 {
            anim.advance();
        }
        assert!(anim.is_finished());
        assert!(!anim.attack_in_progress());
    }

    #[test]
    fn test_select_clip_priority() {
        let up = Fixed::from_num(-3);
        let down = Fixed::from_num(2);
        let still = Fixed::ZERO;

        assert_eq!(select_clip(up, true, true), Clip::Jump);
        assert_eq!(select_clip(down, true, true), Clip::Fall);
        assert_eq!(select_clip(still, true, true), Clip::Attack);
        assert_eq!(select_clip(still, false, true), Clip::Run);
        assert_eq!(select_clip(still, false, false), Clip::Idle);
    }
}

//! A single fighter: physical state, attack lifecycle and animation.
//!
//! Fighters never look at each other. Anything involving both (hits,
//! facing) goes through [`crate::combat`], and anything involving time
//! goes through the match's [`TimerQueue`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::animation::{select_clip, Clip, ClipSet, SpriteAnimator};
use crate::clock::{MatchTask, TimerHandle, TimerQueue};
use crate::config::{ArenaConfig, BodyDimensions, MatchConfig, PhysicsConfig};
use crate::input::{InputState, Side};
use crate::math::{Coords, Fixed, Rect, POSITION_LIMIT};
use crate::render::{Colour, RenderSurface, SpriteDraw};

/// Horizontal facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Facing {
    /// Facing towards smaller x.
    Left,
    /// Facing towards larger x.
    Right,
}

/// Restorable part of a fighter's state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FighterSnapshot {
    /// Body top-left.
    pub position: Coords,
    /// Velocity applied at the start of the next advance.
    pub velocity: Coords,
    /// Facing.
    pub facing: Facing,
    /// Health.
    pub health: i32,
    /// Attack window open.
    pub is_attacking: bool,
    /// Pending attack-window close, if any.
    pub pending_close: Option<TimerHandle>,
    /// Animation sub-state.
    pub animation: SpriteAnimator,
}

/// One of the two combatants.
#[derive(Debug, Clone)]
pub struct Fighter {
    side: Side,
    name: String,
    position: Coords,
    velocity: Coords,
    facing: Facing,
    health: i32,
    max_health: i32,
    attack_damage: i32,
    is_attacking: bool,
    attack_box: Rect,
    pending_close: Option<TimerHandle>,
    body: BodyDimensions,
    physics: PhysicsConfig,
    attack_window: Duration,
    animator: SpriteAnimator,
    clips: ClipSet,
    scale: Fixed,
    sprite_offset: Coords,
    colour: Colour,
    show_hitboxes: bool,
}

impl Fighter {
    /// Build the fighter for `side` from a validated config.
    #[must_use]
    pub fn new(side: Side, config: &MatchConfig) -> Self {
        let fc = config.fighter(side);
        let mut fighter = Self {
            side,
            name: fc.name.clone(),
            position: fc.start,
            velocity: fc.velocity,
            facing: fc.facing,
            health: config.combat.starting_health,
            max_health: config.combat.starting_health,
            attack_damage: config.combat.attack_damage,
            is_attacking: false,
            attack_box: Rect::default(),
            pending_close: None,
            body: config.body.clone(),
            physics: config.physics.clone(),
            attack_window: config.combat.attack_window(),
            animator: SpriteAnimator::new(&fc.clips, fc.held_frames),
            clips: fc.clips.clone(),
            scale: fc.scale,
            sprite_offset: fc.sprite_offset,
            colour: fc.colour,
            show_hitboxes: config.show_hitboxes,
        };
        fighter.recompute_attack_box();
        fighter
    }

    /// Which side this fighter is on.
    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Body top-left.
    #[must_use]
    pub const fn position(&self) -> Coords {
        self.position
    }

    /// Current velocity.
    #[must_use]
    pub const fn velocity(&self) -> Coords {
        self.velocity
    }

    /// Current facing.
    #[must_use]
    pub const fn facing(&self) -> Facing {
        self.facing
    }

    /// Current health. May be negative.
    #[must_use]
    pub const fn health(&self) -> i32 {
        self.health
    }

    /// Health at match start.
    #[must_use]
    pub const fn max_health(&self) -> i32 {
        self.max_health
    }

    /// Damage dealt per hit.
    #[must_use]
    pub const fn attack_damage(&self) -> i32 {
        self.attack_damage
    }

    /// Whether the attack window is open.
    #[must_use]
    pub const fn is_attacking(&self) -> bool {
        self.is_attacking
    }

    /// Health has run out.
    #[must_use]
    pub const fn is_defeated(&self) -> bool {
        self.health <= 0
    }

    /// The attack box, derived from position and facing.
    #[must_use]
    pub const fn attack_box(&self) -> Rect {
        self.attack_box
    }

    /// The body rectangle hits are tested against.
    #[must_use]
    pub fn body_rect(&self) -> Rect {
        Rect::new(self.position, self.body.width, self.body.height)
    }

    /// Animation state.
    #[must_use]
    pub const fn animator(&self) -> &SpriteAnimator {
        &self.animator
    }

    /// Pending attack-window close.
    #[must_use]
    pub const fn pending_close(&self) -> Option<TimerHandle> {
        self.pending_close
    }

    /// Overwrite velocity.
    pub fn set_velocity(&mut self, velocity: Coords) {
        self.velocity = velocity;
    }

    /// Overwrite facing. The attack box follows.
    pub fn set_facing(&mut self, facing: Facing) {
        self.facing = facing;
        self.recompute_attack_box();
    }

    fn set_position(&mut self, position: Coords) {
        self.position = position;
        self.recompute_attack_box();
    }

    fn expected_attack_box(&self) -> Rect {
        let x = match self.facing {
            Facing::Right => self.position.x,
            Facing::Left => self.position.x + self.body.width - self.body.attack_width,
        };
        Rect::new(
            Coords::new(x, self.position.y),
            self.body.attack_width,
            self.body.attack_height,
        )
    }

    fn recompute_attack_box(&mut self) {
        self.attack_box = self.expected_attack_box();
    }

    /// Subtract `amount` from health. No clamping.
    pub fn apply_damage(&mut self, amount: i32) {
        self.health -= amount;
    }

    /// Open the attack window and play the attack clip.
    ///
    /// The window closes `attack_window` after `now`. Attacking again while
    /// the window is open restarts it.
    pub fn start_attack(&mut self, timers: &mut TimerQueue<MatchTask>, now: Duration) {
        if let Some(handle) = self.pending_close.take() {
            timers.cancel(handle);
        }
        self.is_attacking = true;
        self.animator.restart(Clip::Attack);
        self.pending_close =
            Some(timers.schedule(now + self.attack_window, MatchTask::CloseAttackWindow(self.side)));
        tracing::trace!(side = self.side.name(), "attack started");
    }

    /// Close the attack window early, after a landed hit.
    ///
    /// Any scheduled close stays queued; firing it on a closed window is
    /// harmless and a new attack cancels it.
    pub fn close_attack_window(&mut self) {
        self.is_attacking = false;
    }

    /// The scheduled close for this fighter fired.
    pub fn attack_window_elapsed(&mut self) {
        self.is_attacking = false;
        self.pending_close = None;
    }

    /// Forget the scheduled close after the timer queue was cleared.
    pub fn forget_timers(&mut self) {
        self.pending_close = None;
    }

    /// Simulate one frame, then draw and animate.
    pub fn advance(
        &mut self,
        keys: &InputState,
        arena: &ArenaConfig,
        surface: &mut dyn RenderSurface,
    ) {
        self.set_position(self.position + self.velocity);

        if self.position.y + self.body.height + self.velocity.y >= arena.ground_y() {
            self.velocity.y = Fixed::ZERO;
        } else {
            self.velocity.y += self.physics.gravity;
        }

        self.velocity.x = match (keys.left, keys.right) {
            (false, true) => self.physics.move_speed,
            (true, false) => -self.physics.move_speed,
            _ => Fixed::ZERO,
        };

        if keys.jump && self.velocity.y == Fixed::ZERO {
            self.velocity.y = -self.physics.jump_height;
        }

        let clip = select_clip(
            self.velocity.y,
            self.animator.attack_in_progress(),
            keys.has_horizontal(),
        );
        self.animator.set_clip(clip);

        self.draw(surface);
        self.animator.advance();
    }

    /// Draw the current sprite frame, plus hitboxes if enabled.
    pub fn draw(&self, surface: &mut dyn RenderSurface) {
        let clip = self.clips.get(self.animator.clip());
        surface.draw_sprite(&SpriteDraw {
            image: &clip.image,
            frame_index: self.animator.current_frame(),
            total_frames: self.animator.cycler().total_frames(),
            position: self.position - self.sprite_offset,
            scale: self.scale,
        });

        if self.show_hitboxes {
            surface.draw_rect(self.body_rect(), self.colour);
            if self.is_attacking {
                surface.draw_rect(self.attack_box, Colour::Blue);
            }
        }
    }

    /// Capture restorable state.
    #[must_use]
    pub fn snapshot(&self) -> FighterSnapshot {
        FighterSnapshot {
            position: self.position,
            velocity: self.velocity,
            facing: self.facing,
            health: self.health,
            is_attacking: self.is_attacking,
            pending_close: self.pending_close,
            animation: self.animator.clone(),
        }
    }

    /// Restore state captured by [`snapshot`](Self::snapshot).
    pub fn restore(&mut self, snapshot: &FighterSnapshot) {
        self.position = snapshot.position;
        self.velocity = snapshot.velocity;
        self.facing = snapshot.facing;
        self.health = snapshot.health;
        self.is_attacking = snapshot.is_attacking;
        self.pending_close = snapshot.pending_close;
        self.animator = snapshot.animation.clone();
        self.recompute_attack_box();
    }

    /// Check internal consistency. Returns a description of the first
    /// violation found.
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.attack_box != self.expected_attack_box() {
            return Err(format!(
                "{} attack box {:?} out of sync with position {:?}",
                self.side.name(),
                self.attack_box,
                self.position
            ));
        }
        let limit = Fixed::from_num(POSITION_LIMIT);
        if self.position.x.abs() > limit || self.position.y.abs() > limit {
            return Err(format!(
                "{} position {:?} left the simulation bounds",
                self.side.name(),
                self.position
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::NullSurface;

    fn surface() -> NullSurface {
        NullSurface::new(Fixed::from_num(1024), Fixed::from_num(576))
    }

    fn grounded_player(config: &MatchConfig) -> Fighter {
        let mut fighter = Fighter::new(Side::Player, config);
        let ground = config.arena.ground_y() - config.body.height;
        fighter.restore(&FighterSnapshot {
            position: Coords::new(Fixed::from_num(200), ground),
            velocity: Coords::ZERO,
            ..fighter.snapshot()
        });
        fighter
    }

    #[test]
    fn test_attack_box_follows_facing() {
        let config = MatchConfig::default();
        let mut fighter = Fighter::new(Side::Player, &config);
        assert_eq!(fighter.attack_box().position, fighter.position());

        fighter.set_facing(Facing::Left);
        let expected_x = fighter.position().x + Fixed::from_num(50) - Fixed::from_num(100);
        assert_eq!(fighter.attack_box().position.x, expected_x);
        assert_eq!(fighter.attack_box().position.y, fighter.position().y);
    }

    #[test]
    fn test_apply_damage_is_exact_and_unclamped() {
        let config = MatchConfig::default();
        let mut fighter = Fighter::new(Side::Enemy, &config);
        fighter.apply_damage(10);
        assert_eq!(fighter.health(), 90);
        fighter.apply_damage(95);
        assert_eq!(fighter.health(), -5);
        assert!(fighter.is_defeated());
    }

    #[test]
    fn test_gravity_applies_while_airborne() {
        let config = MatchConfig::default();
        let mut fighter = Fighter::new(Side::Player, &config);
        fighter.advance(&InputState::default(), &config.arena, &mut surface());
        assert_eq!(fighter.velocity().y, config.physics.gravity);
        assert_eq!(fighter.animator().clip(), Clip::Fall);
    }

    #[test]
    fn test_grounded_jump() {
        let config = MatchConfig::default();
        let mut fighter = grounded_player(&config);
        let jump = InputState {
            jump: true,
            ..InputState::default()
        };
        fighter.advance(&jump, &config.arena, &mut surface());
        assert_eq!(fighter.velocity().y, -config.physics.jump_height);
        assert_eq!(fighter.animator().clip(), Clip::Jump);
    }

    #[test]
    fn test_airborne_jump_ignored() {
        let config = MatchConfig::default();
        let mut fighter = Fighter::new(Side::Player, &config);
        let jump = InputState {
            jump: true,
            ..InputState::default()
        };
        fighter.advance(&jump, &config.arena, &mut surface());
        assert_eq!(fighter.velocity().y, config.physics.gravity);
    }

    #[test]
    fn test_horizontal_input() {
        let config = MatchConfig::default();
        let mut fighter = grounded_player(&config);
        let right = InputState {
            right: true,
            ..InputState::default()
        };
        fighter.advance(&right, &config.arena, &mut surface());
        assert_eq!(fighter.velocity().x, config.physics.move_speed);
        assert_eq!(fighter.animator().clip(), Clip::Run);

        let both = InputState {
            left: true,
            right: true,
            jump: false,
        };
        fighter.advance(&both, &config.arena, &mut surface());
        assert_eq!(fighter.velocity().x, Fixed::ZERO);
        assert_eq!(fighter.animator().clip(), Clip::Idle);
    }

    #[test]
    fn test_attack_window_restarts() {
        let config = MatchConfig::default();
        let mut fighter = Fighter::new(Side::Player, &config);
        let mut timers = TimerQueue::new();

        fighter.start_attack(&mut timers, Duration::ZERO);
        let first = fighter.pending_close().unwrap();
        fighter.start_attack(&mut timers, Duration::from_millis(50));
        let second = fighter.pending_close().unwrap();

        assert_ne!(first, second);
        assert!(!timers.is_pending(first));
        assert_eq!(timers.len(), 1);
        assert_eq!(timers.next_due(), Some(Duration::from_millis(150)));
        assert!(fighter.is_attacking());
    }

    #[test]
    fn test_attack_clip_not_preempted_by_running() {
        let config = MatchConfig::default();
        let mut fighter = grounded_player(&config);
        let mut timers = TimerQueue::new();
        fighter.start_attack(&mut timers, Duration::ZERO);

        let right = InputState {
            right: true,
            ..InputState::default()
        };
        fighter.advance(&right, &config.arena, &mut surface());
        assert_eq!(fighter.animator().clip(), Clip::Attack);
    }

    #[test]
    fn test_snapshot_restore() {
        let config = MatchConfig::default();
        let mut fighter = Fighter::new(Side::Enemy, &config);
        let snap = fighter.snapshot();
        fighter.apply_damage(30);
        fighter.set_facing(Facing::Right);
        fighter.advance(&InputState::default(), &config.arena, &mut surface());

        fighter.restore(&snap);
        assert_eq!(fighter.snapshot(), snap);
        assert!(fighter.check_invariants().is_ok());
    }
}

//! Collaborator interfaces for drawing and for the heads-up display.
//!
//! The core owns no pixels. It issues draw calls against a
//! [`RenderSurface`] and pushes [`HudUpdate`]s to a [`Hud`]; neither is
//! ever read back into simulation state.

use serde::{Deserialize, Serialize};

use crate::math::{Coords, Fixed, Rect};
use crate::simulation::MatchResult;

/// Flat colours used for debug rectangles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Colour {
    /// Red.
    #[default]
    Red,
    /// Green.
    Green,
    /// Blue (attack boxes).
    Blue,
    /// Black (background clear).
    Black,
}

/// One sprite-sheet frame to blit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteDraw<'a> {
    /// Image identifier (asset path).
    pub image: &'a str,
    /// Frame within the horizontal strip.
    pub frame_index: u32,
    /// Number of frames in the strip.
    pub total_frames: u32,
    /// Top-left destination.
    pub position: Coords,
    /// Uniform scale factor.
    pub scale: Fixed,
}

/// A 2D drawing target.
pub trait RenderSurface {
    /// Clear the whole viewport.
    fn clear(&mut self);

    /// Fill a rectangle.
    fn draw_rect(&mut self, rect: Rect, colour: Colour);

    /// Draw one frame of a sprite strip.
    fn draw_sprite(&mut self, sprite: &SpriteDraw<'_>);

    /// Viewport size as `(width, height)`.
    fn viewport(&self) -> (Fixed, Fixed);
}

/// Surface that discards every draw call.
#[derive(Debug, Clone, Copy)]
pub struct NullSurface {
    width: Fixed,
    height: Fixed,
}

impl NullSurface {
    /// Create a surface reporting the given viewport.
    #[must_use]
    pub const fn new(width: Fixed, height: Fixed) -> Self {
        Self { width, height }
    }
}

impl RenderSurface for NullSurface {
    fn clear(&mut self) {}

    fn draw_rect(&mut self, _rect: Rect, _colour: Colour) {}

    fn draw_sprite(&mut self, _sprite: &SpriteDraw<'_>) {}

    fn viewport(&self) -> (Fixed, Fixed) {
        (self.width, self.height)
    }
}

/// Values shown by the heads-up display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HudUpdate {
    /// Player health bar fill, 0..=100.
    pub player_health_pct: u8,
    /// Enemy health bar fill, 0..=100.
    pub enemy_health_pct: u8,
    /// Countdown value.
    pub seconds_remaining: u32,
    /// Final result once the match has ended.
    pub result: Option<MatchResult>,
}

/// Heads-up display sink.
pub trait Hud {
    /// Show new values.
    fn update(&mut self, update: &HudUpdate);
}

/// HUD that ignores every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullHud;

impl Hud for NullHud {
    fn update(&mut self, _update: &HudUpdate) {}
}

/// Health bar fill for `health` out of `max`, clamped to 0..=100.
///
/// Health may go negative in the simulation; the bar just empties.
#[must_use]
pub fn health_pct(health: i32, max: i32) -> u8 {
    if max <= 0 {
        return 0;
    }
    let pct = (i64::from(health) * 100 / i64::from(max)).clamp(0, 100);
    u8::try_from(pct).unwrap_or(0)
}

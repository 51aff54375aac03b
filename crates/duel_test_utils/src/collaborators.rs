//! Render and HUD collaborators that remember what they were given.

use duel_core::math::{Coords, Fixed, Rect};
use duel_core::render::{Colour, Hud, HudUpdate, RenderSurface, SpriteDraw};

/// One call made against a [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawCall {
    /// `clear()`.
    Clear,
    /// `draw_rect()`.
    Rect(Rect, Colour),
    /// `draw_sprite()`.
    Sprite {
        /// Image identifier.
        image: String,
        /// Frame drawn.
        frame_index: u32,
        /// Frames in the strip.
        total_frames: u32,
        /// Destination.
        position: Coords,
        /// Scale.
        scale: Fixed,
    },
}

/// Surface that logs every draw call.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    width: Fixed,
    height: Fixed,
    /// Calls in the order they were made.
    pub calls: Vec<DrawCall>,
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self::new(Fixed::from_num(1024), Fixed::from_num(576))
    }
}

impl RecordingSurface {
    /// Create a surface with the given viewport.
    #[must_use]
    pub fn new(width: Fixed, height: Fixed) -> Self {
        Self {
            width,
            height,
            calls: Vec::new(),
        }
    }

    /// Calls made since the most recent `clear()`, i.e. the last frame.
    #[must_use]
    pub fn last_frame(&self) -> &[DrawCall] {
        let start = self
            .calls
            .iter()
            .rposition(|c| *c == DrawCall::Clear)
            .map_or(0, |i| i + 1);
        &self.calls[start..]
    }

    /// Rectangles of `colour` in the last frame.
    #[must_use]
    pub fn rects_of(&self, colour: Colour) -> Vec<Rect> {
        self.last_frame()
            .iter()
            .filter_map(|c| match c {
                DrawCall::Rect(rect, col) if *col == colour => Some(*rect),
                _ => None,
            })
            .collect()
    }

    /// Images drawn in the last frame, in order.
    #[must_use]
    pub fn sprites(&self) -> Vec<&str> {
        self.last_frame()
            .iter()
            .filter_map(|c| match c {
                DrawCall::Sprite { image, .. } => Some(image.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Forget everything recorded so far.
    pub fn reset(&mut self) {
        self.calls.clear();
    }
}

impl RenderSurface for RecordingSurface {
    fn clear(&mut self) {
        self.calls.push(DrawCall::Clear);
    }

    fn draw_rect(&mut self, rect: Rect, colour: Colour) {
        self.calls.push(DrawCall::Rect(rect, colour));
    }

    fn draw_sprite(&mut self, sprite: &SpriteDraw<'_>) {
        self.calls.push(DrawCall::Sprite {
            image: sprite.image.to_string(),
            frame_index: sprite.frame_index,
            total_frames: sprite.total_frames,
            position: sprite.position,
            scale: sprite.scale,
        });
    }

    fn viewport(&self) -> (Fixed, Fixed) {
        (self.width, self.height)
    }
}

/// HUD that keeps every update.
#[derive(Debug, Clone, Default)]
pub struct RecordingHud {
    /// Updates in arrival order.
    pub updates: Vec<HudUpdate>,
}

impl RecordingHud {
    /// Most recent update.
    #[must_use]
    pub fn last(&self) -> Option<&HudUpdate> {
        self.updates.last()
    }

    /// Banner text of the final result, if one was shown.
    #[must_use]
    pub fn banner(&self) -> Option<&'static str> {
        self.updates
            .iter()
            .rev()
            .find_map(|u| u.result)
            .map(|r| r.banner())
    }
}

impl Hud for RecordingHud {
    fn update(&mut self, update: &HudUpdate) {
        self.updates.push(*update);
    }
}

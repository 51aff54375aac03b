//! Decorative background props.

use crate::animation::FrameCycler;
use crate::config::PropConfig;
use crate::math::{Coords, Fixed};
use crate::render::{RenderSurface, SpriteDraw};

/// An animated sprite with no gameplay effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prop {
    name: String,
    image: String,
    position: Coords,
    scale: Fixed,
    cycler: FrameCycler,
}

impl Prop {
    /// Build a prop from its config.
    #[must_use]
    pub fn new(config: &PropConfig) -> Self {
        Self {
            name: config.name.clone(),
            image: config.image.clone(),
            position: config.position,
            scale: config.scale,
            cycler: FrameCycler::new(config.total_frames, config.held_frames, true),
        }
    }

    /// Prop name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Frame counter.
    #[must_use]
    pub const fn cycler(&self) -> &FrameCycler {
        &self.cycler
    }

    /// Draw the current frame, then advance.
    pub fn update(&mut self, surface: &mut dyn RenderSurface) {
        surface.draw_sprite(&SpriteDraw {
            image: &self.image,
            frame_index: self.cycler.current_frame(),
            total_frames: self.cycler.total_frames(),
            position: self.position,
            scale: self.scale,
        });
        self.cycler.advance();
    }
}

/// All props, drawn in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scenery {
    props: Vec<Prop>,
}

impl Scenery {
    /// Build from config.
    #[must_use]
    pub fn new(props: &[PropConfig]) -> Self {
        Self {
            props: props.iter().map(Prop::new).collect(),
        }
    }

    /// The props.
    #[must_use]
    pub fn props(&self) -> &[Prop] {
        &self.props
    }

    /// Frame counters, for snapshots.
    #[must_use]
    pub fn cyclers(&self) -> Vec<FrameCycler> {
        self.props.iter().map(|p| p.cycler).collect()
    }

    /// Restore frame counters. Extra or missing entries are ignored.
    pub fn restore_cyclers(&mut self, cyclers: &[FrameCycler]) {
        for (prop, cycler) in self.props.iter_mut().zip(cyclers) {
            prop.cycler = *cycler;
        }
    }

    /// Draw and advance every prop.
    pub fn update(&mut self, surface: &mut dyn RenderSurface) {
        for prop in &mut self.props {
            prop.update(surface);
        }
    }
}

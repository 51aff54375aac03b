//! ASCII rendering for terminal output.
//!
//! [`AsciiSurface`] is a [`RenderSurface`] that rasterises rectangles onto a
//! character grid. Sprites have no pixels here; they are only counted. Turn
//! on `show_hitboxes` in the match config to see the fighters.

use duel_core::math::{Fixed, Rect};
use duel_core::render::{Colour, HudUpdate, RenderSurface, SpriteDraw};

/// Configuration for ASCII output.
#[derive(Debug, Clone)]
pub struct AsciiConfig {
    /// Output width in characters.
    pub width: usize,
    /// Output height in characters.
    pub height: usize,
    /// Use ANSI colors.
    pub use_color: bool,
    /// Show the legend line.
    pub show_legend: bool,
}

impl Default for AsciiConfig {
    fn default() -> Self {
        Self {
            width: 64,
            height: 18,
            use_color: false,
            show_legend: true,
        }
    }
}

/// ANSI color codes.
mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const BLUE: &str = "\x1b[34m";
    pub const GRAY: &str = "\x1b[90m";
}

const EMPTY: char = ' ';

fn colour_char(colour: Colour) -> char {
    match colour {
        Colour::Red => '#',
        Colour::Green => '%',
        Colour::Blue => '=',
        Colour::Black => '.',
    }
}

fn colour_code(ch: char) -> &'static str {
    match ch {
        '#' => colors::RED,
        '%' => colors::GREEN,
        '=' => colors::BLUE,
        _ => colors::GRAY,
    }
}

/// Render surface that draws into a character grid.
#[derive(Debug, Clone)]
pub struct AsciiSurface {
    config: AsciiConfig,
    viewport: (Fixed, Fixed),
    grid: Vec<Vec<char>>,
    sprites: usize,
}

impl AsciiSurface {
    /// Create a surface mapping a `width` x `height` arena onto the grid.
    #[must_use]
    pub fn new(width: Fixed, height: Fixed, config: AsciiConfig) -> Self {
        let grid = vec![vec![EMPTY; config.width.max(1)]; config.height.max(1)];
        Self {
            config,
            viewport: (width, height),
            grid,
            sprites: 0,
        }
    }

    /// Sprites drawn since the last clear.
    #[must_use]
    pub const fn sprite_count(&self) -> usize {
        self.sprites
    }

    /// Character at a grid cell, if in range.
    #[must_use]
    pub fn cell(&self, col: usize, row: usize) -> Option<char> {
        self.grid.get(row).and_then(|r| r.get(col)).copied()
    }

    fn to_col(&self, x: Fixed) -> isize {
        scale(x, self.viewport.0, self.grid[0].len())
    }

    fn to_row(&self, y: Fixed) -> isize {
        scale(y, self.viewport.1, self.grid.len())
    }

    /// Render the grid, framed, with an optional HUD line on top.
    #[must_use]
    pub fn render(&self, hud: Option<&HudUpdate>) -> String {
        let mut output = String::new();
        let width = self.grid[0].len();

        if let Some(hud) = hud {
            output.push_str(&hud_line(hud));
            output.push('\n');
        }

        output.push('+');
        output.push_str(&"-".repeat(width));
        output.push_str("+\n");
        for row in &self.grid {
            output.push('|');
            for &ch in row {
                if self.config.use_color && ch != EMPTY {
                    output.push_str(colour_code(ch));
                    output.push(ch);
                    output.push_str(colors::RESET);
                } else {
                    output.push(ch);
                }
            }
            output.push_str("|\n");
        }
        output.push('+');
        output.push_str(&"-".repeat(width));
        output.push('+');

        if self.config.show_legend {
            output.push_str("\n# player  % enemy  = attack");
        }
        output
    }
}

/// Map `value` in `0..extent` onto `0..cells`. May fall outside the grid.
fn scale(value: Fixed, extent: Fixed, cells: usize) -> isize {
    if extent <= Fixed::ZERO {
        return 0;
    }
    let ratio = value.to_num::<f64>() / extent.to_num::<f64>();
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    let cell = (ratio * cells as f64).floor() as isize;
    cell
}

impl RenderSurface for AsciiSurface {
    fn clear(&mut self) {
        for row in &mut self.grid {
            row.fill(EMPTY);
        }
        self.sprites = 0;
    }

    #[allow(clippy::cast_possible_wrap)]
    fn draw_rect(&mut self, rect: Rect, colour: Colour) {
        let ch = colour_char(colour);
        let cols = self.grid[0].len() as isize;
        let rows = self.grid.len() as isize;

        let left = self.to_col(rect.position.x).clamp(0, cols);
        let right = self.to_col(rect.right()).clamp(-1, cols - 1);
        let top = self.to_row(rect.position.y).clamp(0, rows);
        let bottom = self.to_row(rect.bottom()).clamp(-1, rows - 1);

        for row in top..=bottom {
            for col in left..=right {
                // Bounds were clamped above; both are non-negative here.
                self.grid[row.unsigned_abs()][col.unsigned_abs()] = ch;
            }
        }
    }

    fn draw_sprite(&mut self, _sprite: &SpriteDraw<'_>) {
        self.sprites += 1;
    }

    fn viewport(&self) -> (Fixed, Fixed) {
        self.viewport
    }
}

/// One-line HUD: both health bars, the clock and the banner once decided.
#[must_use]
pub fn hud_line(hud: &HudUpdate) -> String {
    let mut line = format!(
        "P [{}] {:>3}%  {:>2}s  {:>3}% [{}] E",
        bar(hud.player_health_pct),
        hud.player_health_pct,
        hud.seconds_remaining,
        hud.enemy_health_pct,
        bar(hud.enemy_health_pct),
    );
    if let Some(result) = hud.result {
        line.push_str("  ");
        line.push_str(result.banner());
    }
    line
}

fn bar(pct: u8) -> String {
    let filled = usize::from(pct.min(100)) / 10;
    format!("{}{}", "=".repeat(filled), " ".repeat(10 - filled))
}

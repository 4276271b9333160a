//! Drawing sink for the runner
//!
//! The simulation never reads pixels back; it only describes what to paint.
//! Every entity exposes a `draw` that emits sprite blits into a [`Renderer`].

pub mod recording;
pub mod sprites;

pub use recording::{DrawCommand, RecordingRenderer};
pub use sprites::Sprite;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// A rectangle in surface pixels (or sprite-sheet pixels for blit sources)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub pos: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            pos: Vec2::new(x, y),
            size: Vec2::new(width, height),
        }
    }

    /// Build from integer pixel coordinates
    pub fn from_pixels(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self::new(x as f32, y as f32, width as f32, height as f32)
    }

    /// Same rectangle with position and size multiplied (HiDPI sprite sheets)
    pub fn scaled(&self, factor: f32) -> Self {
        Self {
            pos: self.pos * factor,
            size: self.size * factor,
        }
    }
}

/// Opaque 2D surface the runner paints into
pub trait Renderer {
    /// Blit `source` from the sprite sheet of `sprite` onto `dest`.
    /// Sources are always given in 1x sheet coordinates.
    fn draw_sprite(&mut self, sprite: Sprite, source: Rect, dest: Rect);

    /// Clear an area of the surface
    fn clear(&mut self, area: Rect);

    /// Global opacity for subsequent blits (1.0 = opaque)
    fn set_alpha(&mut self, _alpha: f32) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_scaled() {
        let rect = Rect::from_pixels(10, 4, 44, 47).scaled(2.0);
        assert_eq!(rect, Rect::new(20.0, 8.0, 88.0, 94.0));
    }
}

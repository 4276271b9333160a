//! Renderer that records draw calls instead of painting
//!
//! Used by the headless host and by tests to observe what a frame contains.

use super::{Rect, Renderer, Sprite};

/// A single recorded draw call
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear(Rect),
    Sprite {
        sprite: Sprite,
        source: Rect,
        dest: Rect,
        alpha: f32,
    },
}

/// Keeps the draw calls issued since the last clear (i.e. the current frame)
#[derive(Debug, Clone)]
pub struct RecordingRenderer {
    commands: Vec<DrawCommand>,
    alpha: f32,
    /// Total blits since creation, across clears
    pub total_draws: u64,
}

impl Default for RecordingRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            alpha: 1.0,
            total_draws: 0,
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Destination rectangles of every blit of `sprite` in the current frame
    pub fn draws_of(&self, sprite: Sprite) -> Vec<Rect> {
        self.commands
            .iter()
            .filter_map(|cmd| match cmd {
                DrawCommand::Sprite { sprite: s, dest, .. } if *s == sprite => Some(*dest),
                _ => None,
            })
            .collect()
    }

    pub fn has_drawn(&self, sprite: Sprite) -> bool {
        !self.draws_of(sprite).is_empty()
    }
}

impl Renderer for RecordingRenderer {
    fn draw_sprite(&mut self, sprite: Sprite, source: Rect, dest: Rect) {
        self.total_draws += 1;
        self.commands.push(DrawCommand::Sprite {
            sprite,
            source,
            dest,
            alpha: self.alpha,
        });
    }

    fn clear(&mut self, area: Rect) {
        self.commands.clear();
        self.commands.push(DrawCommand::Clear(area));
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.alpha = alpha.clamp(0.0, 1.0);
    }
}

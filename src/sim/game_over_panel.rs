//! "Game over" text and restart button overlay

use crate::renderer::{Rect, Renderer, Sprite};
use crate::round_half_up;

const TEXT_X: i32 = 0;
const TEXT_Y: i32 = 13;
const TEXT_WIDTH: i32 = 191;
const TEXT_HEIGHT: i32 = 11;
const RESTART_WIDTH: i32 = 36;
const RESTART_HEIGHT: i32 = 32;

#[derive(Debug, Clone)]
pub struct GameOverPanel {
    width: i32,
    height: i32,
}

impl GameOverPanel {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub fn update_dimensions(&mut self, width: i32, height: Option<i32>) {
        self.width = width;
        if let Some(height) = height {
            self.height = height;
        }
    }

    /// Destination of the "GAME OVER" text
    pub fn text_rect(&self) -> Rect {
        let center_x = self.width as f64 / 2.0;
        let x = round_half_up(center_x - TEXT_WIDTH as f64 / 2.0) as i32;
        let y = round_half_up((self.height - 25) as f64 / 3.0) as i32;
        Rect::from_pixels(x, y, TEXT_WIDTH, TEXT_HEIGHT)
    }

    /// Destination of the restart icon
    pub fn restart_rect(&self) -> Rect {
        Rect::new(
            self.width as f32 / 2.0 - RESTART_WIDTH as f32 / 2.0,
            self.height as f32 / 2.0,
            RESTART_WIDTH as f32,
            RESTART_HEIGHT as f32,
        )
    }

    pub fn draw(&self, renderer: &mut dyn Renderer) {
        renderer.draw_sprite(
            Sprite::Text,
            Rect::from_pixels(TEXT_X, TEXT_Y, TEXT_WIDTH, TEXT_HEIGHT),
            self.text_rect(),
        );
        renderer.draw_sprite(
            Sprite::Restart,
            Rect::from_pixels(0, 0, RESTART_WIDTH, RESTART_HEIGHT),
            self.restart_rect(),
        );
    }
}

//! Scrolling ground line
//!
//! Two strips, each one sprite wide, tile the ground. The leading strip is
//! moved and the trailing one is pinned right behind it; once the leading
//! strip has scrolled fully off screen it jumps to the back of the queue
//! and picks a new texture.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::SimRng;
use crate::consts::{BOTTOM_PAD, FPS};
use crate::renderer::{Rect, Renderer, Sprite};

pub const WIDTH: i32 = 600;
pub const HEIGHT: i32 = 12;
/// Probability threshold above which a strip uses the bumpy texture
pub const BUMP_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HorizonLine {
    pub x_pos: [i32; 2],
    /// Texture offset per strip: 0 is flat, `WIDTH` is bumpy
    pub source_x_pos: [i32; 2],
    pub y_pos: i32,
}

impl HorizonLine {
    /// The leading strip starts flat, the trailing one is random
    pub fn new(surface_height: i32, rng: &mut SimRng) -> Self {
        Self {
            x_pos: [0, WIDTH],
            source_x_pos: [0, Self::random_type(rng)],
            y_pos: surface_height - BOTTOM_PAD - 13,
        }
    }

    fn random_type(rng: &mut SimRng) -> i32 {
        if rng.random::<f64>() > BUMP_THRESHOLD {
            WIDTH
        } else {
            0
        }
    }

    fn update_x_pos(&mut self, line: usize, increment: i32, rng: &mut SimRng) {
        let other = 1 - line;

        self.x_pos[line] -= increment;
        self.x_pos[other] = self.x_pos[line] + WIDTH;

        if self.x_pos[line] <= -WIDTH {
            self.x_pos[line] += WIDTH * 2;
            self.x_pos[other] = self.x_pos[line] - WIDTH;
            self.source_x_pos[line] = Self::random_type(rng);
        }
    }

    pub fn update(&mut self, delta_time: f64, speed: f64, rng: &mut SimRng) {
        let increment = (speed * (FPS / 1000.0) * delta_time).floor() as i32;
        if self.x_pos[0] <= 0 {
            self.update_x_pos(0, increment, rng);
        } else {
            self.update_x_pos(1, increment, rng);
        }
    }

    pub fn set_surface_height(&mut self, surface_height: i32) {
        self.y_pos = surface_height - BOTTOM_PAD - 13;
    }

    pub fn reset(&mut self) {
        self.x_pos = [0, WIDTH];
    }

    pub fn draw(&self, renderer: &mut dyn Renderer) {
        for (x, source_x) in self.x_pos.iter().zip(self.source_x_pos) {
            renderer.draw_sprite(
                Sprite::Horizon,
                Rect::from_pixels(source_x, 0, WIDTH, HEIGHT),
                Rect::from_pixels(*x, self.y_pos, WIDTH, HEIGHT),
            );
        }
    }
}

//! Background clouds

use serde::{Deserialize, Serialize};

use super::SimRng;
use crate::random_num;
use crate::renderer::{Rect, Renderer, Sprite};

pub const WIDTH: i32 = 46;
pub const HEIGHT: i32 = 14;
pub const MIN_CLOUD_GAP: i32 = 100;
pub const MAX_CLOUD_GAP: i32 = 400;
/// Highest (smallest y) a cloud may sit
pub const MAX_SKY_LEVEL: i32 = 30;
pub const MIN_SKY_LEVEL: i32 = 71;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cloud {
    pub x_pos: i32,
    pub y_pos: i32,
    /// Distance from the right edge before the next cloud may appear
    pub cloud_gap: i32,
    pub remove: bool,
}

impl Cloud {
    /// New cloud entering at the right edge of a field `field_width` wide
    pub fn new(field_width: i32, rng: &mut SimRng) -> Self {
        Self {
            x_pos: field_width,
            y_pos: random_num(rng, MAX_SKY_LEVEL, MIN_SKY_LEVEL),
            cloud_gap: random_num(rng, MIN_CLOUD_GAP, MAX_CLOUD_GAP),
            remove: false,
        }
    }

    pub fn update(&mut self, speed: f64) {
        if self.remove {
            return;
        }
        self.x_pos -= speed.ceil() as i32;
        if !self.is_visible() {
            self.remove = true;
        }
    }

    pub fn is_visible(&self) -> bool {
        self.x_pos + WIDTH > 0
    }

    pub fn draw(&self, renderer: &mut dyn Renderer) {
        renderer.draw_sprite(
            Sprite::Cloud,
            Rect::from_pixels(0, 0, WIDTH, HEIGHT),
            Rect::from_pixels(self.x_pos, self.y_pos, WIDTH, HEIGHT),
        );
    }
}

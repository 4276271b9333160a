//! Distance meter: score digits, high score and the milestone flash

use serde::{Deserialize, Serialize};

use crate::renderer::{Rect, Renderer, Sprite};
use crate::round_half_up;

/// Glyph size in the text sprite
pub const WIDTH: i32 = 10;
pub const HEIGHT: i32 = 13;
/// Horizontal pitch between drawn glyphs
pub const DEST_WIDTH: i32 = 11;

pub const MAX_DISTANCE_UNITS: usize = 5;
pub const ACHIEVEMENT_DISTANCE: u64 = 100;
/// Raw distance (pixels) to displayed distance
pub const COEFFICIENT: f64 = 0.025;
pub const FLASH_DURATION: f64 = 1000.0 / 4.0;
pub const FLASH_ITERATIONS: u32 = 3;

/// Glyph indices of the "HI" marker in the text sprite
const GLYPH_H: u8 = 10;
const GLYPH_I: u8 = 11;
const HIGH_SCORE_ALPHA: f32 = 0.8;

/// Displayed distance for a raw pixel distance
pub fn actual_distance(distance: f64) -> u64 {
    if distance <= 0.0 {
        return 0;
    }
    round_half_up(distance * COEFFICIENT) as u64
}

fn padded_digits(distance: u64) -> [u8; MAX_DISTANCE_UNITS] {
    let mut digits = [0; MAX_DISTANCE_UNITS];
    let mut rest = distance;
    for digit in digits.iter_mut().rev() {
        *digit = (rest % 10) as u8;
        rest /= 10;
    }
    digits
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistanceMeter {
    pub x: i32,
    pub y: i32,
    pub max_score: u64,
    digits: [u8; MAX_DISTANCE_UNITS],
    /// `H`, `I`, a blank, then the padded high score digits
    high_score: Vec<Option<u8>>,
    pub achievement: bool,
    flash_timer: f64,
    flash_iterations: u32,
    /// Highest milestone (`distance / ACHIEVEMENT_DISTANCE`) already celebrated
    last_milestone: u64,
    /// False while the flash hides the digits
    paint: bool,
}

impl DistanceMeter {
    pub fn new(surface_width: i32) -> Self {
        let mut meter = Self {
            x: 0,
            y: 5,
            max_score: 10u64.pow(MAX_DISTANCE_UNITS as u32) - 1,
            digits: [0; MAX_DISTANCE_UNITS],
            high_score: Vec::new(),
            achievement: false,
            flash_timer: 0.0,
            flash_iterations: 0,
            last_milestone: 0,
            paint: true,
        };
        meter.calc_x_pos(surface_width);
        meter
    }

    pub fn calc_x_pos(&mut self, surface_width: i32) {
        self.x = surface_width - DEST_WIDTH * (MAX_DISTANCE_UNITS as i32 + 1);
    }

    pub fn digits(&self) -> &[u8; MAX_DISTANCE_UNITS] {
        &self.digits
    }

    pub fn high_score(&self) -> &[Option<u8>] {
        &self.high_score
    }

    /// True while the digits are being drawn this frame
    pub fn is_painted(&self) -> bool {
        self.paint
    }

    /// Update the digits for `distance` (raw pixels). Returns true when a
    /// milestone was just reached and the achievement sound should play.
    pub fn update(&mut self, delta_time: f64, distance: f64) -> bool {
        self.paint = true;
        let mut play_sound = false;

        if !self.achievement {
            let distance = actual_distance(distance);
            let milestone = distance / ACHIEVEMENT_DISTANCE;
            if milestone > self.last_milestone {
                self.last_milestone = milestone;
                self.achievement = true;
                self.flash_timer = 0.0;
                play_sound = true;
            }
            self.digits = padded_digits(distance);
        } else if self.flash_iterations <= FLASH_ITERATIONS {
            self.flash_timer += delta_time;
            if self.flash_timer < FLASH_DURATION {
                self.paint = false;
            } else if self.flash_timer > FLASH_DURATION * 2.0 {
                self.flash_timer = 0.0;
                self.flash_iterations += 1;
            }
        } else {
            self.stop_flashing();
        }

        play_sound
    }

    /// Stop an in-progress achievement flash
    pub fn stop_flashing(&mut self) {
        self.achievement = false;
        self.flash_iterations = 0;
        self.flash_timer = 0.0;
        self.paint = true;
    }

    /// Wrap the raw distance back to zero once the display would overflow.
    /// Checked against the rounded-up distance the digits show.
    pub fn wrap(&mut self, distance: f64) -> f64 {
        if actual_distance(distance.ceil()) > self.max_score {
            self.last_milestone = 0;
            0.0
        } else {
            distance
        }
    }

    pub fn set_high_score(&mut self, distance: f64) {
        let digits = padded_digits(actual_distance(distance).min(self.max_score));
        self.high_score = [Some(GLYPH_H), Some(GLYPH_I), None]
            .into_iter()
            .chain(digits.into_iter().map(Some))
            .collect();
    }

    /// Back to zero for a new run, keeping the high score
    pub fn reset(&mut self, high_score: f64) {
        self.stop_flashing();
        self.last_milestone = 0;
        self.update(0.0, 0.0);
        if high_score > 0.0 {
            self.set_high_score(high_score);
        }
    }

    fn draw_glyph(&self, renderer: &mut dyn Renderer, origin_x: i32, pos: usize, glyph: u8) {
        renderer.draw_sprite(
            Sprite::Text,
            Rect::from_pixels(WIDTH * glyph as i32, 0, WIDTH, HEIGHT),
            Rect::from_pixels(origin_x + pos as i32 * DEST_WIDTH, self.y, WIDTH, HEIGHT),
        );
    }

    pub fn draw(&self, renderer: &mut dyn Renderer) {
        if self.paint {
            for (pos, digit) in self.digits.iter().enumerate() {
                self.draw_glyph(renderer, self.x, pos, *digit);
            }
        }

        if !self.high_score.is_empty() {
            let high_score_x = self.x - (MAX_DISTANCE_UNITS as i32 * 2) * WIDTH;
            renderer.set_alpha(HIGH_SCORE_ALPHA);
            for (pos, glyph) in self.high_score.iter().enumerate() {
                if let Some(glyph) = glyph {
                    self.draw_glyph(renderer, high_score_x, pos, *glyph);
                }
            }
            renderer.set_alpha(1.0);
        }
    }
}

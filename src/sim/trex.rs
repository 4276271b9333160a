//! The player character
//!
//! Jump physics are integrated against elapsed milliseconds, scaled into
//! "reference frames" of the current animation, so the arc is the same at any
//! refresh rate.

use glam::IVec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::SimRng;
use super::collision::{Collidable, CollisionBox, inset_sprite_box};
use crate::consts::{BOTTOM_PAD, MS_PER_FRAME};
use crate::renderer::{Rect, Renderer, Sprite};
use crate::round_half_up;

pub const WIDTH: i32 = 44;
pub const HEIGHT: i32 = 47;
/// Velocity a released jump is capped to once the minimum height is reached
pub const DROP_VELOCITY: f64 = -5.0;
pub const INITIAL_JUMP_VELOCITY: f64 = 10.0;
/// Intro slide duration (ms) from x = 0 to `START_X_POS`
pub const INTRO_DURATION: f64 = 1500.0;
pub const MAX_JUMP_HEIGHT: i32 = 30;
pub const MIN_JUMP_HEIGHT: i32 = 30;
pub const SPEED_DROP_COEFFICIENT: f64 = 3.0;
pub const START_X_POS: i32 = 50;
/// Upper bound (ms) of the randomized idle blink delay
pub const BLINK_TIMING: f64 = 7000.0;

/// Detail boxes relative to the (inset) sprite box
pub const COLLISION_BOXES: [CollisionBox; 6] = [
    CollisionBox::new(1, -1, 30, 26),
    CollisionBox::new(32, 0, 8, 16),
    CollisionBox::new(10, 35, 14, 8),
    CollisionBox::new(1, 24, 29, 5),
    CollisionBox::new(5, 30, 21, 4),
    CollisionBox::new(9, 34, 15, 4),
];

/// Character state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrexStatus {
    Waiting,
    Running,
    Jumping,
    Crashed,
}

/// Sprite-sheet x offsets and frame duration for one status
pub struct AnimFrames {
    pub frames: &'static [i32],
    pub ms_per_frame: f64,
}

impl TrexStatus {
    pub fn anim(&self) -> AnimFrames {
        match self {
            TrexStatus::Waiting => AnimFrames {
                frames: &[44, 0],
                ms_per_frame: 1000.0 / 3.0,
            },
            TrexStatus::Running => AnimFrames {
                frames: &[88, 132],
                ms_per_frame: 1000.0 / 12.0,
            },
            TrexStatus::Crashed => AnimFrames {
                frames: &[220],
                ms_per_frame: MS_PER_FRAME,
            },
            TrexStatus::Jumping => AnimFrames {
                frames: &[0],
                ms_per_frame: MS_PER_FRAME,
            },
        }
    }
}

/// The T-Rex
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trex {
    pub pos: IVec2,
    pub ground_y_pos: i32,
    pub min_jump_height: i32,
    pub status: TrexStatus,
    pub jumping: bool,
    pub jump_velocity: f64,
    /// Completed jumps since the session began
    pub jump_count: u32,
    pub reached_min_height: bool,
    pub speed_drop: bool,
    pub playing_intro: bool,
    current_frame: usize,
    timer: f64,
    ms_per_frame: f64,
    /// Accumulated time driving the idle blink
    anim_clock: f64,
    anim_start_time: f64,
    blink_delay: f64,
}

impl Trex {
    /// Create a character standing on the ground of a surface `surface_height` tall
    pub fn new(surface_height: i32, rng: &mut SimRng) -> Self {
        let ground_y_pos = surface_height - HEIGHT - BOTTOM_PAD;
        let mut trex = Self {
            pos: IVec2::new(0, ground_y_pos),
            ground_y_pos,
            min_jump_height: ground_y_pos - MIN_JUMP_HEIGHT,
            status: TrexStatus::Waiting,
            jumping: false,
            jump_velocity: 0.0,
            jump_count: 0,
            reached_min_height: false,
            speed_drop: false,
            playing_intro: false,
            current_frame: 0,
            timer: 0.0,
            ms_per_frame: MS_PER_FRAME,
            anim_clock: 0.0,
            anim_start_time: 0.0,
            blink_delay: 0.0,
        };
        trex.update(0.0, Some(TrexStatus::Waiting), rng);
        trex
    }

    fn set_blink_delay(&mut self, rng: &mut SimRng) {
        self.blink_delay = (rng.random::<f64>() * BLINK_TIMING).ceil();
    }

    /// Advance the animation by `delta_time` ms, optionally switching status.
    pub fn update(&mut self, delta_time: f64, opt_status: Option<TrexStatus>, rng: &mut SimRng) {
        self.timer += delta_time;
        self.anim_clock += delta_time;

        if let Some(status) = opt_status {
            self.status = status;
            self.current_frame = 0;
            self.ms_per_frame = status.anim().ms_per_frame;
            if status == TrexStatus::Waiting {
                self.anim_start_time = self.anim_clock;
                self.set_blink_delay(rng);
            }
        }

        if self.playing_intro && self.pos.x < START_X_POS {
            let step = round_half_up(START_X_POS as f64 / INTRO_DURATION * delta_time) as i32;
            self.pos.x = (self.pos.x + step).min(START_X_POS);
        }

        if self.status == TrexStatus::Waiting
            && self.blink_window_open()
            && self.current_frame == 1
        {
            self.set_blink_delay(rng);
            self.anim_start_time = self.anim_clock;
        }

        if self.timer >= self.ms_per_frame {
            let frame_count = self.status.anim().frames.len();
            self.current_frame = (self.current_frame + 1) % frame_count;
            self.timer = 0.0;
        }
    }

    fn blink_window_open(&self) -> bool {
        self.anim_clock - self.anim_start_time >= self.blink_delay
    }

    /// Sprite-sheet x of the frame currently shown
    pub fn sprite_x(&self) -> i32 {
        if self.status == TrexStatus::Waiting && !self.blink_window_open() {
            // Idle pose between blinks
            return 0;
        }
        let frames = self.status.anim().frames;
        frames[self.current_frame.min(frames.len() - 1)]
    }

    /// Begin a jump. Ignored while already airborne.
    pub fn start_jump(&mut self, initial_velocity: f64, rng: &mut SimRng) {
        if self.jumping {
            return;
        }
        self.update(0.0, Some(TrexStatus::Jumping), rng);
        self.jump_velocity = -initial_velocity;
        self.jumping = true;
        self.reached_min_height = false;
        self.speed_drop = false;
    }

    /// Jump key released: cut the ascent short once the minimum height is reached
    pub fn end_jump(&mut self) {
        if self.reached_min_height && self.jump_velocity < DROP_VELOCITY {
            self.jump_velocity = DROP_VELOCITY;
        }
    }

    /// Duck mid-air: fall fast
    pub fn set_speed_drop(&mut self) {
        self.speed_drop = true;
        self.jump_velocity = 1.0;
    }

    /// Integrate the jump over `delta_time` ms
    pub fn update_jump(&mut self, delta_time: f64, gravity: f64, rng: &mut SimRng) {
        let ms_per_frame = self.status.anim().ms_per_frame;
        let frames_elapsed = delta_time.max(0.0) / ms_per_frame;

        let step = if self.speed_drop {
            self.jump_velocity * SPEED_DROP_COEFFICIENT * frames_elapsed
        } else {
            self.jump_velocity * frames_elapsed
        };
        self.pos.y += round_half_up(step) as i32;
        self.jump_velocity += gravity * frames_elapsed;

        if self.pos.y < self.min_jump_height || self.speed_drop {
            self.reached_min_height = true;
        }
        if self.pos.y < MAX_JUMP_HEIGHT || self.speed_drop {
            self.end_jump();
        }
        if self.pos.y > self.ground_y_pos {
            self.reset(rng);
            self.jump_count += 1;
        }

        self.update(delta_time, None, rng);
    }

    /// Back on the ground, running
    pub fn reset(&mut self, rng: &mut SimRng) {
        self.pos.y = self.ground_y_pos;
        self.jump_velocity = 0.0;
        self.jumping = false;
        self.update(0.0, Some(TrexStatus::Running), rng);
        self.speed_drop = false;
    }

    /// Re-anchor to a surface of a different height
    pub fn set_surface_height(&mut self, surface_height: i32) {
        let ground_y_pos = surface_height - HEIGHT - BOTTOM_PAD;
        let lift = ground_y_pos - self.ground_y_pos;
        self.ground_y_pos = ground_y_pos;
        self.min_jump_height = ground_y_pos - MIN_JUMP_HEIGHT;
        self.pos.y += lift;
    }

    pub fn draw(&self, renderer: &mut dyn Renderer) {
        renderer.draw_sprite(
            Sprite::Trex,
            Rect::from_pixels(self.sprite_x(), 0, WIDTH, HEIGHT),
            Rect::from_pixels(self.pos.x, self.pos.y, WIDTH, HEIGHT),
        );
    }
}

impl Collidable for Trex {
    fn bounds(&self) -> CollisionBox {
        inset_sprite_box(self.pos, WIDTH, HEIGHT)
    }

    fn detail_boxes(&self) -> &[CollisionBox] {
        &COLLISION_BOXES
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::DEFAULT_HEIGHT;
    use proptest::prelude::*;
    use rand::SeedableRng;

    const GRAVITY: f64 = 0.6;

    fn trex() -> (Trex, SimRng) {
        let mut rng = SimRng::seed_from_u64(1);
        let trex = Trex::new(DEFAULT_HEIGHT, &mut rng);
        (trex, rng)
    }

    #[test]
    fn test_starts_waiting_on_ground() {
        let (trex, _) = trex();
        assert_eq!(trex.status, TrexStatus::Waiting);
        assert_eq!(trex.pos.y, DEFAULT_HEIGHT - HEIGHT - BOTTOM_PAD);
        assert_eq!(trex.ground_y_pos, 93);
        assert!(!trex.jumping);
    }

    #[test]
    fn test_start_jump_sets_upward_velocity() {
        let (mut trex, mut rng) = trex();
        trex.start_jump(INITIAL_JUMP_VELOCITY, &mut rng);
        assert!(trex.jumping);
        assert_eq!(trex.status, TrexStatus::Jumping);
        assert_eq!(trex.jump_velocity, -10.0);

        // A second press mid-air does nothing
        trex.update_jump(MS_PER_FRAME, GRAVITY, &mut rng);
        let v = trex.jump_velocity;
        trex.start_jump(14.0, &mut rng);
        assert_eq!(trex.jump_velocity, v);
    }

    #[test]
    fn test_jump_lands_within_bounded_ticks() {
        let (mut trex, mut rng) = trex();
        trex.start_jump(10.0, &mut rng);

        let mut ticks = 0;
        while trex.jumping {
            trex.update_jump(1000.0 / 60.0, GRAVITY, &mut rng);
            assert!(trex.pos.y <= trex.ground_y_pos);
            ticks += 1;
            assert!(ticks < 200, "jump never landed");
        }

        assert_eq!(trex.jump_count, 1);
        assert_eq!(trex.pos.y, trex.ground_y_pos);
        assert_eq!(trex.status, TrexStatus::Running);
        assert_eq!(trex.jump_velocity, 0.0);
    }

    #[test]
    fn test_jump_reaches_expected_apex() {
        let (mut trex, mut rng) = trex();
        trex.start_jump(10.0, &mut rng);
        let mut apex = trex.pos.y;
        while trex.jumping {
            trex.update_jump(MS_PER_FRAME, GRAVITY, &mut rng);
            apex = apex.min(trex.pos.y);
        }
        // Roughly v^2 / 2g = 83px above ground at 60 Hz
        let height = trex.ground_y_pos - apex;
        assert!((70..=95).contains(&height), "apex height {height}");
    }

    #[test]
    fn test_end_jump_caps_velocity_after_min_height() {
        let (mut trex, mut rng) = trex();
        trex.start_jump(10.0, &mut rng);

        // Too low: release has no effect
        trex.end_jump();
        assert_eq!(trex.jump_velocity, -10.0);

        while !trex.reached_min_height {
            trex.update_jump(MS_PER_FRAME, GRAVITY, &mut rng);
        }
        if trex.jump_velocity < DROP_VELOCITY {
            trex.end_jump();
            assert_eq!(trex.jump_velocity, DROP_VELOCITY);
        }
    }

    #[test]
    fn test_speed_drop_lands_sooner() {
        let (mut normal, mut rng) = trex();
        let mut dropping = normal.clone();
        normal.start_jump(10.0, &mut rng);
        dropping.start_jump(10.0, &mut rng);

        for _ in 0..5 {
            normal.update_jump(MS_PER_FRAME, GRAVITY, &mut rng);
            dropping.update_jump(MS_PER_FRAME, GRAVITY, &mut rng);
        }
        dropping.set_speed_drop();

        let mut normal_ticks = 0;
        while normal.jumping {
            normal.update_jump(MS_PER_FRAME, GRAVITY, &mut rng);
            normal_ticks += 1;
        }
        let mut drop_ticks = 0;
        while dropping.jumping {
            dropping.update_jump(MS_PER_FRAME, GRAVITY, &mut rng);
            drop_ticks += 1;
        }
        assert!(drop_ticks < normal_ticks);
        assert!(!dropping.speed_drop);
    }

    #[test]
    fn test_intro_slides_to_start_position() {
        let (mut trex, mut rng) = trex();
        trex.playing_intro = true;
        for _ in 0..200 {
            trex.update(MS_PER_FRAME, None, &mut rng);
        }
        assert_eq!(trex.pos.x, START_X_POS);
    }

    #[test]
    fn test_running_animation_cycles() {
        let (mut trex, mut rng) = trex();
        trex.update(0.0, Some(TrexStatus::Running), &mut rng);
        assert_eq!(trex.sprite_x(), 88);
        trex.update(1000.0 / 12.0, None, &mut rng);
        assert_eq!(trex.sprite_x(), 132);
        trex.update(1000.0 / 12.0, None, &mut rng);
        assert_eq!(trex.sprite_x(), 88);
    }

    #[test]
    fn test_waiting_blinks_after_delay() {
        let (mut trex, mut rng) = trex();
        assert_eq!(trex.sprite_x(), 0);
        // Each blink delay is at most BLINK_TIMING
        let mut blinked = false;
        for _ in 0..((20.0 * BLINK_TIMING / MS_PER_FRAME) as usize) {
            trex.update(MS_PER_FRAME, None, &mut rng);
            blinked |= trex.sprite_x() == 44;
        }
        assert!(blinked);
    }

    #[test]
    fn test_crashed_frame() {
        let (mut trex, mut rng) = trex();
        trex.update(100.0, Some(TrexStatus::Crashed), &mut rng);
        assert_eq!(trex.sprite_x(), 220);
    }

    proptest! {
        #[test]
        fn prop_jump_settles_on_ground(
            velocity in 1.0f64..20.0,
            deltas in prop::collection::vec(0.0f64..250.0, 1..400),
        ) {
            let mut rng = SimRng::seed_from_u64(3);
            let mut trex = Trex::new(DEFAULT_HEIGHT, &mut rng);
            trex.start_jump(velocity, &mut rng);

            for dt in deltas {
                if !trex.jumping {
                    break;
                }
                trex.update_jump(dt, GRAVITY, &mut rng);
                prop_assert!(trex.pos.y <= trex.ground_y_pos);
            }

            // Finish the jump with regular frames
            let mut guard = 0;
            while trex.jumping {
                trex.update_jump(MS_PER_FRAME, GRAVITY, &mut rng);
                guard += 1;
                prop_assert!(guard < 10_000);
            }
            prop_assert_eq!(trex.pos.y, trex.ground_y_pos);
            prop_assert_eq!(trex.jump_count, 1);
        }
    }
}

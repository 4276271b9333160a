//! Obstacles and the field that spawns them
//!
//! Obstacles enter at the right edge and scroll left with the world. A new
//! obstacle is only scheduled once the previous one has moved far enough in
//! for its gap to fit on screen, so the field never holds overlapping
//! obstacles and the gap grows with speed.

use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::SimRng;
use super::collision::{Collidable, CollisionBox, inset_sprite_box};
use crate::consts::{BOTTOM_PAD, FPS};
use crate::random_num;
use crate::renderer::{Rect, Renderer, Sprite};
use crate::round_half_up;

/// Upper bound of a gap relative to its minimum
pub const MAX_GAP_COEFFICIENT: f64 = 1.5;
/// Maximum number of cacti drawn side by side in one obstacle
pub const MAX_OBSTACLE_LENGTH: i32 = 3;

/// The closed set of obstacle types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObstacleKind {
    CactusSmall,
    CactusLarge,
}

/// Static description of an obstacle type
#[derive(Debug)]
pub struct ObstacleType {
    pub width: i32,
    pub height: i32,
    /// Minimum speed at which the type may be drawn more than once wide
    pub multiple_speed: f64,
    pub min_gap: f64,
    pub collision_boxes: [CollisionBox; 3],
    pub sprite: Sprite,
}

const CACTUS_SMALL: ObstacleType = ObstacleType {
    width: 17,
    height: 35,
    multiple_speed: 3.0,
    min_gap: 180.0,
    collision_boxes: [
        CollisionBox::new(0, 7, 5, 27),
        CollisionBox::new(4, 0, 6, 34),
        CollisionBox::new(10, 4, 7, 14),
    ],
    sprite: Sprite::CactusSmall,
};

const CACTUS_LARGE: ObstacleType = ObstacleType {
    width: 25,
    height: 50,
    multiple_speed: 6.0,
    min_gap: 180.0,
    collision_boxes: [
        CollisionBox::new(0, 12, 7, 38),
        CollisionBox::new(8, 0, 7, 49),
        CollisionBox::new(13, 10, 10, 38),
    ],
    sprite: Sprite::CactusLarge,
};

impl ObstacleKind {
    pub const ALL: [ObstacleKind; 2] = [ObstacleKind::CactusSmall, ObstacleKind::CactusLarge];

    pub fn config(&self) -> &'static ObstacleType {
        match self {
            ObstacleKind::CactusSmall => &CACTUS_SMALL,
            ObstacleKind::CactusLarge => &CACTUS_LARGE,
        }
    }
}

/// A single (possibly multi-cactus) obstacle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub kind: ObstacleKind,
    /// Number of cacti side by side
    pub size: i32,
    pub pos: IVec2,
    /// Total width in pixels (`type width * size`)
    pub width: i32,
    /// Distance to keep free after this obstacle before the next one
    pub gap: i32,
    pub remove: bool,
    pub following_obstacle_created: bool,
    collision_boxes: [CollisionBox; 3],
}

impl Obstacle {
    /// Spawn an obstacle of random size at the right edge of the field
    pub fn new(
        kind: ObstacleKind,
        field_width: i32,
        surface_height: i32,
        gap_coefficient: f64,
        speed: f64,
        rng: &mut SimRng,
    ) -> Self {
        let size = random_num(rng, 1, MAX_OBSTACLE_LENGTH);
        Self::with_size(
            kind,
            size,
            field_width,
            surface_height,
            gap_coefficient,
            speed,
            rng,
        )
    }

    /// Spawn with a requested size; clamped to 1 below the type's multi-size speed
    pub fn with_size(
        kind: ObstacleKind,
        size: i32,
        field_width: i32,
        surface_height: i32,
        gap_coefficient: f64,
        speed: f64,
        rng: &mut SimRng,
    ) -> Self {
        let config = kind.config();
        let mut size = size.clamp(1, MAX_OBSTACLE_LENGTH);
        if size > 1 && config.multiple_speed > speed {
            size = 1;
        }
        let width = config.width * size;

        let mut collision_boxes = config.collision_boxes;
        if size > 1 {
            // Stretch the trunk box across the extra cacti and move the right arm
            collision_boxes[1].width = width - collision_boxes[0].width - collision_boxes[2].width;
            collision_boxes[2].x = width - collision_boxes[2].width;
        }

        let mut obstacle = Self {
            kind,
            size,
            pos: IVec2::new(
                field_width - width,
                surface_height - BOTTOM_PAD - config.height,
            ),
            width,
            gap: 0,
            remove: false,
            following_obstacle_created: false,
            collision_boxes,
        };
        obstacle.gap = obstacle.random_gap(gap_coefficient, speed, rng);
        obstacle
    }

    /// Inclusive range a gap is drawn from at `speed`
    pub fn gap_range(&self, gap_coefficient: f64, speed: f64) -> (i32, i32) {
        let min_gap =
            round_half_up(self.width as f64 * speed + self.kind.config().min_gap * gap_coefficient);
        let max_gap = round_half_up(min_gap * MAX_GAP_COEFFICIENT);
        (min_gap as i32, max_gap as i32)
    }

    fn random_gap(&self, gap_coefficient: f64, speed: f64, rng: &mut SimRng) -> i32 {
        let (min_gap, max_gap) = self.gap_range(gap_coefficient, speed);
        random_num(rng, min_gap, max_gap)
    }

    /// Scroll left by `delta_time` ms at `speed`
    pub fn update(&mut self, delta_time: f64, speed: f64) {
        if self.remove {
            return;
        }
        self.pos.x -= (speed * FPS / 1000.0 * delta_time).floor() as i32;
        if !self.is_visible() {
            self.remove = true;
        }
    }

    /// Any part of the obstacle still on screen
    pub fn is_visible(&self) -> bool {
        self.pos.x + self.width > 0
    }

    pub fn draw(&self, renderer: &mut dyn Renderer) {
        let config = self.kind.config();
        // The sheet holds the 1, 2 and 3 wide variants back to back
        let source_x = config.width * self.size * (self.size - 1) / 2;
        renderer.draw_sprite(
            config.sprite,
            Rect::from_pixels(source_x, 0, self.width, config.height),
            Rect::from_pixels(self.pos.x, self.pos.y, self.width, config.height),
        );
    }
}

impl Collidable for Obstacle {
    fn bounds(&self) -> CollisionBox {
        inset_sprite_box(self.pos, self.width, self.kind.config().height)
    }

    fn detail_boxes(&self) -> &[CollisionBox] {
        &self.collision_boxes
    }
}

/// The ordered set of live obstacles, oldest first
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObstacleField {
    obstacles: Vec<Obstacle>,
    pub width: i32,
    pub surface_height: i32,
    pub gap_coefficient: f64,
}

impl ObstacleField {
    pub fn new(width: i32, surface_height: i32, gap_coefficient: f64) -> Self {
        Self {
            obstacles: Vec::new(),
            width,
            surface_height,
            gap_coefficient,
        }
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    /// Nearest obstacle to the character
    pub fn first(&self) -> Option<&Obstacle> {
        self.obstacles.first()
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    /// Append a random obstacle at the right edge
    pub fn spawn(&mut self, current_speed: f64, rng: &mut SimRng) {
        let kind = ObstacleKind::ALL[random_num(rng, 0, ObstacleKind::ALL.len() as i32 - 1) as usize];
        let obstacle = Obstacle::new(
            kind,
            self.width,
            self.surface_height,
            self.gap_coefficient,
            current_speed,
            rng,
        );
        log::debug!(
            "Spawned {:?} x{} at x={} (gap {})",
            obstacle.kind,
            obstacle.size,
            obstacle.pos.x,
            obstacle.gap
        );
        self.obstacles.push(obstacle);
    }

    /// Scroll every obstacle, drop the ones that left the screen and schedule the next
    pub fn update(&mut self, delta_time: f64, current_speed: f64, rng: &mut SimRng) {
        for obstacle in &mut self.obstacles {
            obstacle.update(delta_time, current_speed);
        }
        self.obstacles.retain(|o| !o.remove);

        let field_width = self.width;
        match self.obstacles.last_mut() {
            Some(last) => {
                if !last.following_obstacle_created
                    && last.is_visible()
                    && last.pos.x + last.width + last.gap < field_width
                {
                    last.following_obstacle_created = true;
                    self.spawn(current_speed, rng);
                }
            }
            None => self.spawn(current_speed, rng),
        }
    }

    pub fn clear(&mut self) {
        self.obstacles.clear();
    }

    /// New spawn edge and ground level; live obstacles stay on the ground
    pub fn resize(&mut self, width: i32, surface_height: i32) {
        self.width = width;
        self.surface_height = surface_height;
        for obstacle in &mut self.obstacles {
            obstacle.pos.y = surface_height - BOTTOM_PAD - obstacle.kind.config().height;
        }
    }

    pub fn draw(&self, renderer: &mut dyn Renderer) {
        for obstacle in &self.obstacles {
            obstacle.draw(renderer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{DEFAULT_HEIGHT, DEFAULT_WIDTH, MS_PER_FRAME};
    use proptest::prelude::*;
    use rand::SeedableRng;

    fn rng() -> SimRng {
        SimRng::seed_from_u64(42)
    }

    #[test]
    fn test_small_cactus_gap_range_at_speed_six() {
        let mut rng = rng();
        for _ in 0..200 {
            let o = Obstacle::with_size(
                ObstacleKind::CactusSmall,
                1,
                DEFAULT_WIDTH,
                DEFAULT_HEIGHT,
                1.0,
                6.0,
                &mut rng,
            );
            assert_eq!(o.width, 17);
            assert_eq!(o.gap_range(1.0, 6.0), (282, 423));
            assert!((282..=423).contains(&o.gap), "gap {}", o.gap);
        }
    }

    #[test]
    fn test_size_forced_to_one_below_multiple_speed() {
        let mut rng = rng();
        let o = Obstacle::with_size(
            ObstacleKind::CactusLarge,
            3,
            DEFAULT_WIDTH,
            DEFAULT_HEIGHT,
            1.0,
            5.9,
            &mut rng,
        );
        assert_eq!(o.size, 1);
        assert_eq!(o.width, 25);

        let o = Obstacle::with_size(
            ObstacleKind::CactusLarge,
            3,
            DEFAULT_WIDTH,
            DEFAULT_HEIGHT,
            1.0,
            6.0,
            &mut rng,
        );
        assert_eq!(o.size, 3);
        assert_eq!(o.width, 75);
    }

    #[test]
    fn test_multi_size_collision_boxes_stretch() {
        let mut rng = rng();
        let o = Obstacle::with_size(
            ObstacleKind::CactusSmall,
            3,
            DEFAULT_WIDTH,
            DEFAULT_HEIGHT,
            1.0,
            6.0,
            &mut rng,
        );
        let boxes = o.detail_boxes();
        assert_eq!(boxes[1].width, 51 - 5 - 7);
        assert_eq!(boxes[2].x, 51 - 7);
        // Detail boxes stay inside the sprite
        for b in boxes {
            assert!(b.x >= 0 && b.x + b.width <= o.width);
        }
    }

    #[test]
    fn test_obstacle_sits_on_ground_at_right_edge() {
        let mut rng = rng();
        let o = Obstacle::with_size(
            ObstacleKind::CactusSmall,
            1,
            DEFAULT_WIDTH,
            DEFAULT_HEIGHT,
            1.0,
            6.0,
            &mut rng,
        );
        assert_eq!(o.pos, IVec2::new(DEFAULT_WIDTH - 17, 105));
        let large = Obstacle::with_size(
            ObstacleKind::CactusLarge,
            1,
            DEFAULT_WIDTH,
            DEFAULT_HEIGHT,
            1.0,
            6.0,
            &mut rng,
        );
        assert_eq!(large.pos.y, 90);
    }

    #[test]
    fn test_update_scrolls_and_marks_removal() {
        let mut rng = rng();
        let mut o = Obstacle::with_size(
            ObstacleKind::CactusSmall,
            1,
            DEFAULT_WIDTH,
            DEFAULT_HEIGHT,
            1.0,
            6.0,
            &mut rng,
        );
        let x = o.pos.x;
        o.update(10.0, 6.0);
        // floor(6 * 60 / 1000 * 10)
        assert_eq!(o.pos.x, x - 3);

        o.pos.x = -16;
        o.update(MS_PER_FRAME, 6.0);
        assert!(o.remove);
        let x = o.pos.x;
        o.update(MS_PER_FRAME, 6.0);
        assert_eq!(o.pos.x, x);
    }

    #[test]
    fn test_empty_field_spawns_immediately() {
        let mut rng = rng();
        let mut field = ObstacleField::new(DEFAULT_WIDTH, DEFAULT_HEIGHT, 1.0);
        assert!(field.is_empty());
        field.update(MS_PER_FRAME, 6.0, &mut rng);
        assert_eq!(field.len(), 1);
    }

    #[test]
    fn test_single_pending_follow_up() {
        let mut rng = rng();
        let mut field = ObstacleField::new(DEFAULT_WIDTH, DEFAULT_HEIGHT, 1.0);
        field.update(0.0, 6.0, &mut rng);
        assert_eq!(field.len(), 1);

        // Not enough room for the gap yet
        field.update(MS_PER_FRAME, 6.0, &mut rng);
        assert_eq!(field.len(), 1);

        let mut frames = 0;
        while field.len() < 2 {
            field.update(MS_PER_FRAME, 6.0, &mut rng);
            frames += 1;
            assert!(frames < 1000);
        }
        assert!(field.obstacles()[0].following_obstacle_created);
        assert!(!field.obstacles()[1].following_obstacle_created);
    }

    #[test]
    fn test_off_screen_obstacles_purged_oldest_first() {
        let mut rng = rng();
        let mut field = ObstacleField::new(DEFAULT_WIDTH, DEFAULT_HEIGHT, 1.0);
        for _ in 0..2000 {
            field.update(MS_PER_FRAME, 6.0, &mut rng);
        }
        // Plenty of obstacles have come and gone, the field stays small
        assert!(field.len() <= 4);
        assert!(field.obstacles().iter().all(|o| o.is_visible()));
    }

    proptest! {
        #[test]
        fn prop_obstacles_never_overlap(
            seed in any::<u64>(),
            steps in prop::collection::vec((0.0f64..120.0, 6.0f64..13.0), 1..600),
        ) {
            let mut rng = SimRng::seed_from_u64(seed);
            let mut field = ObstacleField::new(DEFAULT_WIDTH, DEFAULT_HEIGHT, 1.0);
            for (dt, speed) in steps {
                field.update(dt, speed, &mut rng);
                for pair in field.obstacles().windows(2) {
                    let (a, b) = (&pair[0], &pair[1]);
                    prop_assert!(
                        a.pos.x + a.width <= b.pos.x,
                        "overlap: [{}, {}) and [{}, {})",
                        a.pos.x, a.pos.x + a.width, b.pos.x, b.pos.x + b.width
                    );
                }
            }
        }
    }
}

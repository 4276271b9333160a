//! Axis-aligned collision boxes
//!
//! Every entity is one coarse box plus a handful of detail boxes expressed
//! relative to the coarse box origin. Detail boxes always lie inside the
//! coarse box, so a coarse miss rules out every detail pair.

use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::obstacle::Obstacle;
use super::trex::Trex;

/// An axis-aligned rectangle in surface pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl CollisionBox {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// True iff the boxes overlap on both axes. Touching edges don't count.
    #[inline]
    pub fn intersects(&self, other: &CollisionBox) -> bool {
        intersects(self, other)
    }

    /// Translate a relative detail box by the origin of `by`
    #[inline]
    pub fn offset(&self, by: &CollisionBox) -> CollisionBox {
        offset(self, by)
    }
}

/// Open-interval overlap test on both axes
#[inline]
pub fn intersects(a: &CollisionBox, b: &CollisionBox) -> bool {
    a.x < b.x + b.width && a.x + a.width > b.x && a.y < b.y + b.height && a.y + a.height > b.y
}

/// Move a relative box into absolute coordinates, keeping its size
#[inline]
pub fn offset(relative: &CollisionBox, by: &CollisionBox) -> CollisionBox {
    CollisionBox::new(
        relative.x + by.x,
        relative.y + by.y,
        relative.width,
        relative.height,
    )
}

/// Anything that can be hit-tested against another entity
pub trait Collidable {
    /// Coarse bounding box in absolute surface coordinates
    fn bounds(&self) -> CollisionBox;
    /// Detail boxes relative to the coarse box origin
    fn detail_boxes(&self) -> &[CollisionBox];
}

/// Check two entities for a collision.
///
/// Coarse boxes are compared first; only when they overlap are all detail
/// box pairs tested. The result does not depend on argument order.
pub fn check_collision<A, B>(a: &A, b: &B) -> bool
where
    A: Collidable + ?Sized,
    B: Collidable + ?Sized,
{
    let a_bounds = a.bounds();
    let b_bounds = b.bounds();

    if !intersects(&a_bounds, &b_bounds) {
        return false;
    }

    a.detail_boxes().iter().any(|a_box| {
        let a_abs = offset(a_box, &a_bounds);
        b.detail_boxes()
            .iter()
            .any(|b_box| intersects(&a_abs, &offset(b_box, &b_bounds)))
    })
}

/// Whether the character has run into `obstacle`
pub fn check_for_collision(obstacle: &Obstacle, trex: &Trex) -> bool {
    check_collision(obstacle, trex)
}

/// Shrink a sprite-sized box by the 1px transparent border around each sprite
#[inline]
pub fn inset_sprite_box(pos: IVec2, width: i32, height: i32) -> CollisionBox {
    CollisionBox::new(pos.x + 1, pos.y + 1, width - 2, height - 2)
}

//! Collision detection for axis-aligned boxes
//!
//! Every entity in the field is a rectangle; the tick loop does a full
//! pairwise scan each frame (tens of entities, no spatial index needed).

use glam::Vec2;

/// Axis-aligned rectangle (top-left position + size, screen coordinates)
#[derive(Debug, Clone, Copy, PartialEq)]
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

    pub fn from_pos_size(pos: Vec2, size: Vec2) -> Self {
        Self { pos, size }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }
}

/// Check whether two rectangles overlap
///
/// Projections must overlap strictly on both axes: rectangles that only
/// share an edge do not collide.
#[inline]
pub fn aabb_intersects(a: &Rect, b: &Rect) -> bool {
    a.pos.x < b.pos.x + b.size.x
        && a.pos.x + a.size.x > b.pos.x
        && a.pos.y < b.pos.y + b.size.y
        && a.pos.y + a.size.y > b.pos.y
}

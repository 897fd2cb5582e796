//! Axis-aligned bounding-box overlap.
//!
//! Discrete only: each test uses current positions, so a fast entity can skip
//! past a thin one between ticks.

use crate::entities::{
    Bullet, Enemy, Player, PowerUp, BULLET_HEIGHT, BULLET_WIDTH, POWER_UP_SIZE,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Rect { x, y, w, h }
    }

    /// Strict overlap: rectangles that merely touch edges do not collide.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.x + other.w
            && self.x + self.w > other.x
            && self.y < other.y + other.h
            && self.y + self.h > other.y
    }
}

pub trait Bounds {
    fn bounds(&self) -> Rect;
}

impl Bounds for Player {
    fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

impl Bounds for Enemy {
    fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.size(), self.size())
    }
}

impl Bounds for Bullet {
    fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, BULLET_WIDTH, BULLET_HEIGHT)
    }
}

impl Bounds for PowerUp {
    fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, POWER_UP_SIZE, POWER_UP_SIZE)
    }
}

pub fn collides(a: &impl Bounds, b: &impl Bounds) -> bool {
    a.bounds().overlaps(&b.bounds())
}

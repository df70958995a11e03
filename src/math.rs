//! Types, aliases and helper operations for doing math with `ultraviolet`,
//! plus conversions to and from the vector types `rapier2d` uses.
pub use ultraviolet as uv;

use rapier2d::math::{Point, Real, Vector};

/// Positions and velocities are in window pixels, y pointing down.
pub type Vec2 = uv::Vec2;

#[inline]
pub fn to_vector(v: Vec2) -> Vector<Real> {
    Vector::new(v.x, v.y)
}

#[inline]
pub fn from_vector(v: &Vector<Real>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

#[inline]
pub fn from_point(p: &Point<Real>) -> Vec2 {
    Vec2::new(p.x, p.y)
}

/// True if neither component is NaN or infinite.
#[inline]
pub fn is_finite(v: Vec2) -> bool {
    v.x.is_finite() && v.y.is_finite()
}

/// Axis-aligned rectangle from the origin to `size`, i.e. the window area.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Upper bound along an axis, 0 for x and 1 for y.
    #[inline]
    pub fn extent(&self, axis: usize) -> f32 {
        if axis == 0 {
            self.width
        } else {
            self.height
        }
    }
}

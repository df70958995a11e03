//! Keeping entities inside the window.
//!
//! The physics world has no walls. Instead, after every step each entity that
//! is touching or past an edge while still moving outward gets that velocity
//! component turned back inward. Entities already moving inward are left alone,
//! so applying this twice in a row changes nothing.

use crate::math::{self as m, Bounds};

/// Result of reflecting a velocity at the window edges.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Reflection {
    pub velocity: m::Vec2,
    /// Whether the x and y components were flipped.
    pub flipped: [bool; 2],
}

impl Reflection {
    /// Number of axes that were flipped.
    #[inline]
    pub fn flip_count(&self) -> usize {
        self.flipped.iter().filter(|f| **f).count()
    }
}

/// Turn outward-moving velocity components inward for an entity
/// whose extent from its center along each axis is `half_size`.
pub fn reflect(position: m::Vec2, velocity: m::Vec2, half_size: f32, bounds: Bounds) -> Reflection {
    let x = reflect_axis(position.x, velocity.x, half_size, bounds.extent(0));
    let y = reflect_axis(position.y, velocity.y, half_size, bounds.extent(1));
    Reflection {
        velocity: m::Vec2::new(x.unwrap_or(velocity.x), y.unwrap_or(velocity.y)),
        flipped: [x.is_some(), y.is_some()],
    }
}

fn reflect_axis(pos: f32, vel: f32, half_size: f32, upper: f32) -> Option<f32> {
    if pos - half_size <= 0.0 && vel < 0.0 {
        Some(vel.abs())
    } else if pos + half_size >= upper && vel > 0.0 {
        Some(-vel.abs())
    } else {
        None
    }
}

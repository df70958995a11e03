use serde::{Deserialize, Serialize};

use crate::{
    color::Rgb,
    physics::{BodyHandle, ColliderShape},
};

/// The form an entity currently has.
///
/// Contacts in the cycling policy advance this through
/// box → triangle → circle → box.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Geometry {
    Box,
    Triangle,
    Circle,
}

impl Geometry {
    pub const ALL: [Geometry; 3] = [Geometry::Box, Geometry::Triangle, Geometry::Circle];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Geometry::Box => 0,
            Geometry::Triangle => 1,
            Geometry::Circle => 2,
        }
    }

    #[inline]
    pub fn from_index(idx: usize) -> Self {
        Self::ALL[idx % Self::ALL.len()]
    }

    #[inline]
    pub fn next(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    /// Collider for an entity of this geometry with the given edge length or diameter.
    pub fn collider_shape(self, size: f32) -> ColliderShape {
        let half = size / 2.0;
        match self {
            Geometry::Box => ColliderShape::Rect { hw: half, hh: half },
            Geometry::Triangle => ColliderShape::Triangle { hw: half, hh: half },
            Geometry::Circle => ColliderShape::Circle { r: half },
        }
    }

    /// Moment of inertia around the center.
    /// Triangles use the enclosing square's moment.
    pub fn moment_of_inertia(self, mass: f32, size: f32) -> f32 {
        match self {
            Geometry::Box | Geometry::Triangle => mass * (size * size + size * size) / 12.0,
            Geometry::Circle => {
                let r = size / 2.0;
                mass * r * r / 2.0
            }
        }
    }
}

/// One simulated shape: a physics body plus the state drawn on top of it.
#[derive(Clone, Copy, Debug)]
pub struct Entity {
    pub body: BodyHandle,
    pub geometry: Geometry,
    /// Edge length or diameter in pixels.
    pub size: f32,
    pub color: Rgb,
    /// Number of contacts this entity has started.
    pub hits: u32,
}

impl Entity {
    #[inline]
    pub fn half_size(&self) -> f32 {
        self.size / 2.0
    }
}

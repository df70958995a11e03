//! What happens to an entity when it starts touching another one.

use serde::{Deserialize, Serialize};

use super::Entity;
use crate::{
    color::Rgb,
    physics::{Material, World},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollisionPolicy {
    /// Contacts only bounce.
    Bounce,
    /// Alternate between the strike and struck colors.
    ColorToggle,
    /// Toggle the color and advance to the next geometry.
    ToggleAndCycle,
}

/// The two colors a contact alternates between.
#[derive(Clone, Copy, Debug)]
pub struct TogglePalette {
    pub strike: Rgb,
    pub struck: Rgb,
}

impl TogglePalette {
    /// Struck entities go back to the strike color,
    /// anything else (including the slowest highlight) becomes struck.
    #[inline]
    pub fn toggle(&self, color: Rgb) -> Rgb {
        if color == self.struck {
            self.strike
        } else {
            self.struck
        }
    }
}

impl CollisionPolicy {
    /// Apply the policy to one participant of a contact.
    /// The physics world still resolves the contact normally.
    pub fn apply(
        self,
        entity: &mut Entity,
        palette: &TogglePalette,
        world: &mut World,
        material: Material,
    ) {
        entity.hits += 1;
        match self {
            CollisionPolicy::Bounce => {}
            CollisionPolicy::ColorToggle => {
                entity.color = palette.toggle(entity.color);
            }
            CollisionPolicy::ToggleAndCycle => {
                entity.color = palette.toggle(entity.color);
                entity.geometry = entity.geometry.next();
                world.replace_collider(
                    &mut entity.body,
                    entity.geometry.collider_shape(entity.size),
                    material,
                );
            }
        }
    }
}

//! Simulation parameters.
//!
//! A [`SimConfig`] is built once at startup, either from one of the
//! [`Variant`] presets or from a RON file, and never changes afterwards.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{
    color::Rgb,
    math::{self as m, Bounds},
    sim::{CollisionPolicy, Geometry},
};

/// The built-in demo setups.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Variant {
    /// Randomly colored balls that just bounce.
    Balls,
    /// Balls that toggle color on every contact.
    BallWar,
    /// Shapes that toggle color and change form on contact,
    /// with the slowest one highlighted.
    ShapesOfWar,
}

/// An error that occurred while loading or validating a configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file")]
    Parse(#[from] ron::Error),
    #[error("Invalid value for `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Initial window size in physical pixels.
    pub window_size: [u32; 2],
    /// Frames per second, also the number of physics steps per second.
    pub frame_rate: u32,
    /// Number of entities to spawn.
    pub count: usize,
    /// Maximum magnitude of each spawn velocity component, pixels per second.
    pub speed: f32,
    /// Edge length or diameter of every entity in pixels.
    pub size: f32,
    pub mass: f32,
    pub elasticity: f32,
    pub friction: f32,
    /// Acceleration in pixels per second squared, y pointing down.
    pub gravity: [f32; 2],
    /// Geometry every entity spawns with.
    pub geometry: Geometry,
    pub collision_policy: CollisionPolicy,
    /// Highlight the entity with the lowest speed.
    pub track_slowest: bool,
    /// Give every entity a random color at spawn instead of the strike color.
    pub random_colors: bool,
    /// Draw the strike/struck counter.
    pub show_counter: bool,
    pub strike_color: Rgb,
    pub struck_color: Rgb,
    pub slowest_color: Rgb,
    pub text_color: Rgb,
    pub font_size: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::preset(Variant::ShapesOfWar)
    }
}

impl SimConfig {
    pub fn preset(variant: Variant) -> Self {
        match variant {
            Variant::Balls => SimConfig {
                window_size: [800, 600],
                frame_rate: 60,
                count: 100,
                speed: 250.0,
                size: 20.0,
                mass: 1.0,
                elasticity: 1.0,
                friction: 0.0,
                gravity: [0.0, 0.0],
                geometry: Geometry::Circle,
                collision_policy: CollisionPolicy::Bounce,
                track_slowest: false,
                random_colors: true,
                show_counter: false,
                strike_color: Rgb::WHITE,
                struck_color: Rgb::GREEN,
                slowest_color: Rgb::RED,
                text_color: Rgb::WHITE,
                font_size: 40.0,
            },
            Variant::BallWar => SimConfig {
                window_size: [800, 600],
                frame_rate: 70,
                count: 100,
                speed: 100.0,
                size: 20.0,
                mass: 1.0,
                elasticity: 1.0,
                friction: 0.0,
                gravity: [0.0, 0.0],
                geometry: Geometry::Circle,
                collision_policy: CollisionPolicy::ColorToggle,
                track_slowest: false,
                random_colors: false,
                show_counter: true,
                strike_color: Rgb::WHITE,
                struck_color: Rgb::GREEN,
                slowest_color: Rgb::RED,
                text_color: Rgb::WHITE,
                font_size: 40.0,
            },
            Variant::ShapesOfWar => SimConfig {
                window_size: [1024, 768],
                frame_rate: 80,
                count: 100,
                speed: 50.0,
                size: 20.0,
                mass: 50.0,
                elasticity: 1.2,
                friction: 0.0,
                gravity: [0.2, 0.2],
                geometry: Geometry::Box,
                collision_policy: CollisionPolicy::ToggleAndCycle,
                track_slowest: true,
                random_colors: false,
                show_counter: true,
                strike_color: Rgb::GREEN,
                struck_color: Rgb::WHITE,
                slowest_color: Rgb::RED,
                text_color: Rgb::WHITE,
                font_size: 30.0,
            },
        }
    }

    /// Read and validate a configuration from a RON file.
    /// Fields missing from the file take their values from the default preset.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_ron(&text)
    }

    /// Parse and validate a configuration from RON text.
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = ron::de::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_ron(&self) -> Result<String, ConfigError> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }

    /// Check that the values can actually be simulated.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(field: &'static str, reason: &'static str) -> Result<(), ConfigError> {
            Err(ConfigError::Invalid { field, reason })
        }

        if self.window_size[0] == 0 || self.window_size[1] == 0 {
            return invalid("window_size", "both dimensions must be at least 1");
        }
        if self.frame_rate == 0 {
            return invalid("frame_rate", "must be at least 1");
        }
        if !(self.speed.is_finite() && self.speed >= 0.0) {
            return invalid("speed", "must be finite and non-negative");
        }
        if !(self.size.is_finite() && self.size > 0.0) {
            return invalid("size", "must be finite and positive");
        }
        if !(self.mass.is_finite() && self.mass > 0.0) {
            return invalid("mass", "must be finite and positive");
        }
        if !(self.elasticity.is_finite() && self.elasticity >= 0.0) {
            return invalid("elasticity", "must be finite and non-negative");
        }
        if !(self.friction.is_finite() && self.friction >= 0.0) {
            return invalid("friction", "must be finite and non-negative");
        }
        if !self.gravity.iter().all(|g| g.is_finite()) {
            return invalid("gravity", "must be finite");
        }
        if !(self.font_size.is_finite() && self.font_size > 0.0) {
            return invalid("font_size", "must be finite and positive");
        }
        Ok(())
    }

    /// Length of one frame and physics step in seconds.
    #[inline]
    pub fn dt(&self) -> f32 {
        1.0 / self.frame_rate as f32
    }

    #[inline]
    pub fn gravity(&self) -> m::Vec2 {
        m::Vec2::new(self.gravity[0], self.gravity[1])
    }

    #[inline]
    pub fn initial_bounds(&self) -> Bounds {
        Bounds::new(self.window_size[0] as f32, self.window_size[1] as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARIANTS: [Variant; 3] = [Variant::Balls, Variant::BallWar, Variant::ShapesOfWar];

    #[test]
    fn presets_are_valid() {
        for v in VARIANTS {
            SimConfig::preset(v).validate().unwrap();
        }
    }

    #[test]
    fn presets_survive_ron() {
        for v in VARIANTS {
            let config = SimConfig::preset(v);
            let text = config.to_ron().unwrap();
            assert_eq!(SimConfig::from_ron(&text).unwrap(), config);
        }
    }

    #[test]
    fn partial_file_fills_from_default() {
        let config = SimConfig::from_ron("(count: 7, collision_policy: ColorToggle)").unwrap();
        assert_eq!(config.count, 7);
        assert_eq!(config.collision_policy, CollisionPolicy::ColorToggle);
        assert_eq!(config.window_size, [1024, 768]);
        assert_eq!(config.strike_color, Rgb::GREEN);
    }

    #[test]
    fn colors_parse_as_tuples() {
        let config = SimConfig::from_ron("(strike_color: (1, 2, 3))").unwrap();
        assert_eq!(config.strike_color, Rgb(1, 2, 3));
    }

    #[test]
    fn rejects_bad_values() {
        let cases = [
            ("(frame_rate: 0)", "frame_rate"),
            ("(size: 0.0)", "size"),
            ("(mass: -1.0)", "mass"),
            ("(speed: -5.0)", "speed"),
            ("(window_size: (0, 600))", "window_size"),
        ];
        for (text, expected) in cases {
            match SimConfig::from_ron(text) {
                Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, expected),
                other => panic!("{} should be invalid, got {:?}", text, other),
            }
        }
    }

    #[test]
    fn rejects_malformed_text() {
        assert!(matches!(
            SimConfig::from_ron("(count: \"many\")"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn dt_matches_frame_rate() {
        assert_eq!(SimConfig::preset(Variant::ShapesOfWar).dt(), 1.0 / 80.0);
    }
}

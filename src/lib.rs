pub mod color;
pub use color::Rgb;

pub mod config;
pub use config::{ConfigError, SimConfig, Variant};

pub mod demo;
pub use demo::Demo;

pub mod game;
pub use game::{Game, GameError, GameState};

pub mod graphics;
pub use graphics::{Renderer, ShapeRenderer};

pub mod math;
pub use math::{uv, Bounds, Vec2};

pub mod physics;
pub use physics::{BodyHandle, ColliderShape, EntityContact, Material, Outline, World};

pub mod sim;
pub use sim::{CollisionPolicy, Entity, Geometry, Simulation};

// Re-exported wgpu and winit to guarantee versions match
pub use wgpu;
pub use winit;

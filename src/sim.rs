//! The simulation: entities, the physics world they live in,
//! and the per-frame rules layered on top of the physics.

mod boundary;
pub use boundary::{reflect, Reflection};

mod contact;
pub use contact::{CollisionPolicy, TogglePalette};

mod entity;
pub use entity::{Entity, Geometry};

mod spawn;
pub use spawn::{random_color, random_states, SpawnState};

use rand::Rng;
use thunderdome::{Arena, Index};

use crate::{
    color::Rgb,
    config::SimConfig,
    math::{self as m, Bounds},
    physics::{EntityContact, Mass, Material, Outline, World},
};

pub struct Simulation {
    config: SimConfig,
    world: World,
    entities: Arena<Entity>,
    bounds: Bounds,
    slowest: Option<Index>,
}

impl Simulation {
    /// Spawn `config.count` entities at random and mark the slowest one if tracking is enabled.
    pub fn new(config: SimConfig, rng: &mut impl Rng) -> Self {
        let mut sim = Self::empty(config);
        let geometry = sim.config.geometry;
        for state in random_states(&sim.config, rng) {
            sim.insert_entity(state.position, state.velocity, geometry, state.color);
        }
        if sim.config.track_slowest {
            sim.update_slowest();
        }
        log::debug!("spawned {} entities", sim.entities.len());
        sim
    }

    /// A simulation with no entities.
    pub fn empty(config: SimConfig) -> Self {
        let world = World::new(config.gravity(), config.dt(), config.size);
        let bounds = config.initial_bounds();
        Self {
            config,
            world,
            entities: Arena::new(),
            bounds,
            slowest: None,
        }
    }

    /// Add an entity with the configured size, mass and material.
    pub fn insert_entity(
        &mut self,
        position: m::Vec2,
        velocity: m::Vec2,
        geometry: Geometry,
        color: Rgb,
    ) -> Index {
        let size = self.config.size;
        let mass = Mass {
            mass: self.config.mass,
            moment_of_inertia: geometry.moment_of_inertia(self.config.mass, size),
        };
        let body = self.world.insert(
            position,
            velocity,
            geometry.collider_shape(size),
            mass,
            self.material(),
        );
        let idx = self.entities.insert(Entity {
            body,
            geometry,
            size,
            color,
            hits: 0,
        });
        self.world.set_owner(&body, idx);
        idx
    }

    /// Advance one frame.
    pub fn tick(&mut self) {
        let contacts = self.world.step();
        self.apply_contacts(&contacts);
        self.constrain_to_window();
        if self.config.track_slowest {
            self.update_slowest();
        }
    }

    /// Run the collision policy on both participants of every contact.
    pub fn apply_contacts(&mut self, contacts: &[EntityContact]) {
        let policy = self.config.collision_policy;
        let palette = self.palette();
        let material = self.material();
        for &EntityContact(a, b) in contacts {
            for idx in [a, b] {
                if let Some(entity) = self.entities.get_mut(idx) {
                    policy.apply(entity, &palette, &mut self.world, material);
                }
            }
        }
    }

    /// Turn entities moving out of the window back inward,
    /// and put entities whose position has blown up back in the middle at rest.
    pub fn constrain_to_window(&mut self) {
        let bounds = self.bounds;
        for (idx, entity) in self.entities.iter() {
            let pos = self.world.position(&entity.body);
            if !m::is_finite(pos) {
                log::warn!("entity {:?} had position {:?}, resetting", idx, pos);
                self.world.set_position(&entity.body, bounds.center());
                self.world.set_velocity(&entity.body, m::Vec2::zero());
                self.world.set_angular_velocity(&entity.body, 0.0);
                continue;
            }

            let vel = self.world.velocity(&entity.body);
            let refl = reflect(pos, vel, entity.half_size(), bounds);
            if refl.flip_count() == 0 {
                continue;
            }
            self.world.set_velocity(&entity.body, refl.velocity);
            // one negation per flipped axis: a corner bounce keeps the spin on purpose
            if entity.geometry == Geometry::Triangle && refl.flip_count() % 2 == 1 {
                let angvel = self.world.angular_velocity(&entity.body);
                self.world.set_angular_velocity(&entity.body, -angvel);
            }
        }
    }

    /// Find the entity with the lowest speed and give it the slowest color.
    ///
    /// Ties go to the entity that comes first in iteration order.
    /// The previously marked entity gets the strike color back
    /// unless a contact has already repainted it.
    pub fn update_slowest(&mut self) {
        let slowest = self
            .entities
            .iter()
            .map(|(idx, e)| (idx, self.world.velocity(&e.body).mag()))
            .filter(|(_, speed)| speed.is_finite())
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(idx, _)| idx);

        let slowest_color = self.config.slowest_color;
        if slowest != self.slowest {
            if let Some(prev) = self.slowest.and_then(|idx| self.entities.get_mut(idx)) {
                if prev.color == slowest_color {
                    prev.color = self.config.strike_color;
                }
            }
        }
        if let Some(entity) = slowest.and_then(|idx| self.entities.get_mut(idx)) {
            entity.color = slowest_color;
        }
        self.slowest = slowest;
    }

    /// Change the area entities are kept inside.
    pub fn resize(&mut self, width: f32, height: f32) {
        log::debug!("simulation bounds {}x{}", width, height);
        self.bounds = Bounds::new(width, height);
    }

    //
    // queries
    //

    /// Number of entities wearing the strike and struck colors, in that order.
    pub fn counts(&self) -> (usize, usize) {
        self.entities
            .iter()
            .fold((0, 0), |(strike, struck), (_, e)| {
                if e.color == self.config.strike_color {
                    (strike + 1, struck)
                } else if e.color == self.config.struck_color {
                    (strike, struck + 1)
                } else {
                    (strike, struck)
                }
            })
    }

    pub fn counter_text(&self) -> String {
        let (strike, struck) = self.counts();
        format!("Strike: {} | Struck: {}", strike, struck)
    }

    /// World-space outline and color of every entity that has a finite position.
    pub fn shapes(&self) -> impl Iterator<Item = (Outline, Rgb)> + '_ {
        self.entities.iter().filter_map(move |(_, e)| {
            if !m::is_finite(self.world.position(&e.body)) {
                return None;
            }
            self.world.outline(&e.body).map(|o| (o, e.color))
        })
    }

    pub fn entities(&self) -> impl Iterator<Item = (Index, &Entity)> + '_ {
        self.entities.iter()
    }

    pub fn entity(&self, idx: Index) -> Option<&Entity> {
        self.entities.get(idx)
    }

    #[inline]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    #[inline]
    pub fn world(&self) -> &World {
        &self.world
    }

    #[inline]
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    #[inline]
    pub fn slowest(&self) -> Option<Index> {
        self.slowest
    }

    #[inline]
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    #[inline]
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    fn palette(&self) -> TogglePalette {
        TogglePalette {
            strike: self.config.strike_color,
            struck: self.config.struck_color,
        }
    }

    fn material(&self) -> Material {
        Material {
            elasticity: self.config.elasticity,
            friction: self.config.friction,
        }
    }
}

//
// tests
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Variant;
    use rand::{rngs::StdRng, SeedableRng};

    fn bounce_config() -> SimConfig {
        SimConfig {
            window_size: [800, 600],
            frame_rate: 60,
            mass: 1.0,
            elasticity: 1.0,
            size: 20.0,
            gravity: [0.0, 0.0],
            geometry: Geometry::Circle,
            collision_policy: CollisionPolicy::Bounce,
            track_slowest: false,
            ..SimConfig::preset(Variant::BallWar)
        }
    }

    fn tracking_config() -> SimConfig {
        SimConfig {
            track_slowest: true,
            ..bounce_config()
        }
    }

    #[test]
    fn single_ball_bounces_off_right_wall() {
        let mut sim = Simulation::empty(bounce_config());
        let idx = sim.insert_entity(
            m::Vec2::new(400.0, 300.0),
            m::Vec2::new(500.0, 0.0),
            Geometry::Circle,
            Rgb::WHITE,
        );
        let body = sim.entity(idx).unwrap().body;

        let mut bounced = false;
        for _ in 0..300 {
            sim.tick();
            let pos = sim.world().position(&body);
            let vel = sim.world().velocity(&body);
            if pos.x + 10.0 >= 800.0 {
                assert!(vel.x <= 0.0, "moving out at x = {}", pos.x);
            }
            bounced |= vel.x < 0.0;
            // radius plus one step of travel
            assert!((-20.0..820.0).contains(&pos.x), "escaped to x = {}", pos.x);
        }
        assert!(bounced);
    }

    #[test]
    fn entities_stay_inside_the_window() {
        let config = SimConfig::preset(Variant::BallWar);
        let dt = config.dt();
        let mut sim = Simulation::new(config, &mut StdRng::seed_from_u64(1));
        let bounds = sim.bounds();

        for tick in 0..3000 {
            sim.tick();
            for (idx, e) in sim.entities() {
                let pos = sim.world().position(&e.body);
                let vel = sim.world().velocity(&e.body);
                assert!(m::is_finite(pos), "{:?} blew up at tick {}", idx, tick);
                // half size plus the distance covered in one step
                let slack = e.half_size() + vel.mag() * dt + 1e-3;
                assert!(
                    pos.x >= -slack
                        && pos.x <= bounds.width + slack
                        && pos.y >= -slack
                        && pos.y <= bounds.height + slack,
                    "{:?} at {:?} outside the window at tick {}",
                    idx,
                    pos,
                    tick
                );
            }
        }
    }

    #[test]
    fn nan_position_resets_to_center() {
        let mut sim = Simulation::empty(bounce_config());
        let idx = sim.insert_entity(
            m::Vec2::new(10.0, 10.0),
            m::Vec2::new(5.0, 5.0),
            Geometry::Box,
            Rgb::WHITE,
        );
        let body = sim.entity(idx).unwrap().body;
        sim.world_mut()
            .set_position(&body, m::Vec2::new(f32::NAN, f32::NAN));
        sim.world_mut().set_angular_velocity(&body, 3.0);
        assert_eq!(sim.shapes().count(), 0);

        sim.constrain_to_window();
        assert_eq!(sim.world().position(&body), m::Vec2::new(400.0, 300.0));
        assert_eq!(sim.world().velocity(&body), m::Vec2::zero());
        assert_eq!(sim.world().angular_velocity(&body), 0.0);
        assert_eq!(sim.shapes().count(), 1);
    }

    #[test]
    fn triangles_flip_spin_per_flipped_axis() {
        let mut sim = Simulation::empty(bounce_config());
        let tri = sim.insert_entity(
            m::Vec2::new(5.0, 300.0),
            m::Vec2::new(-10.0, 0.0),
            Geometry::Triangle,
            Rgb::WHITE,
        );
        let corner_tri = sim.insert_entity(
            m::Vec2::new(5.0, 5.0),
            m::Vec2::new(-10.0, -10.0),
            Geometry::Triangle,
            Rgb::WHITE,
        );
        let boxed = sim.insert_entity(
            m::Vec2::new(795.0, 300.0),
            m::Vec2::new(10.0, 0.0),
            Geometry::Box,
            Rgb::WHITE,
        );
        let bodies = [tri, corner_tri, boxed].map(|idx| sim.entity(idx).unwrap().body);
        for body in &bodies {
            sim.world_mut().set_angular_velocity(body, 2.0);
        }

        sim.constrain_to_window();
        let w = sim.world();
        assert_eq!(w.velocity(&bodies[0]), m::Vec2::new(10.0, 0.0));
        assert_eq!(w.angular_velocity(&bodies[0]), -2.0);
        assert_eq!(w.velocity(&bodies[1]), m::Vec2::new(10.0, 10.0));
        assert_eq!(w.angular_velocity(&bodies[1]), 2.0);
        assert_eq!(w.velocity(&bodies[2]), m::Vec2::new(-10.0, 0.0));
        assert_eq!(w.angular_velocity(&bodies[2]), 2.0);
    }

    #[test]
    fn resize_moves_the_walls() {
        let mut sim = Simulation::empty(bounce_config());
        let idx = sim.insert_entity(
            m::Vec2::new(395.0, 100.0),
            m::Vec2::new(10.0, 0.0),
            Geometry::Circle,
            Rgb::WHITE,
        );
        let body = sim.entity(idx).unwrap().body;

        sim.constrain_to_window();
        assert_eq!(sim.world().velocity(&body).x, 10.0);
        sim.resize(400.0, 300.0);
        sim.constrain_to_window();
        assert_eq!(sim.world().velocity(&body).x, -10.0);
        assert_eq!(sim.bounds(), Bounds::new(400.0, 300.0));
    }

    fn spread_out(sim: &mut Simulation, velocities: &[m::Vec2]) -> Vec<Index> {
        velocities
            .iter()
            .enumerate()
            .map(|(i, vel)| {
                let pos = m::Vec2::new(100.0 + 150.0 * i as f32, 300.0);
                sim.insert_entity(pos, *vel, Geometry::Circle, Rgb::WHITE)
            })
            .collect()
    }

    fn slowest_colored(sim: &Simulation) -> Vec<Index> {
        sim.entities()
            .filter(|(_, e)| e.color == sim.config().slowest_color)
            .map(|(idx, _)| idx)
            .collect()
    }

    #[test]
    fn slowest_is_argmin_of_speed() {
        let mut sim = Simulation::empty(tracking_config());
        let ids = spread_out(
            &mut sim,
            &[
                m::Vec2::new(30.0, 0.0),
                m::Vec2::new(0.0, -5.0),
                m::Vec2::new(10.0, 10.0),
            ],
        );
        sim.update_slowest();
        assert_eq!(sim.slowest(), Some(ids[1]));
        assert_eq!(slowest_colored(&sim), vec![ids[1]]);

        let body = sim.entity(ids[2]).unwrap().body;
        sim.world_mut().set_velocity(&body, m::Vec2::new(1.0, 0.0));
        sim.update_slowest();
        assert_eq!(sim.slowest(), Some(ids[2]));
        assert_eq!(slowest_colored(&sim), vec![ids[2]]);
        assert_eq!(sim.entity(ids[1]).unwrap().color, Rgb::WHITE);
    }

    #[test]
    fn slowest_ties_go_to_first() {
        let mut sim = Simulation::empty(tracking_config());
        let ids = spread_out(
            &mut sim,
            &[
                m::Vec2::new(5.0, 0.0),
                m::Vec2::new(0.0, 5.0),
                m::Vec2::new(3.0, 4.0),
            ],
        );
        sim.update_slowest();
        assert_eq!(sim.slowest(), Some(ids[0]));
    }

    #[test]
    fn slowest_is_repainted_after_contact() {
        let config = SimConfig {
            collision_policy: CollisionPolicy::ColorToggle,
            ..tracking_config()
        };
        let mut sim = Simulation::empty(config);
        let ids = spread_out(&mut sim, &[m::Vec2::new(1.0, 0.0), m::Vec2::new(50.0, 0.0)]);
        sim.update_slowest();
        assert_eq!(slowest_colored(&sim), vec![ids[0]]);

        sim.apply_contacts(&[EntityContact(ids[0], ids[1])]);
        assert_eq!(sim.entity(ids[0]).unwrap().color, sim.config().struck_color);
        sim.update_slowest();
        assert_eq!(slowest_colored(&sim), vec![ids[0]]);
        assert_eq!(sim.entity(ids[1]).unwrap().color, sim.config().struck_color);
    }

    #[test]
    fn spawn_marks_the_true_slowest() {
        let config = SimConfig {
            count: 25,
            ..SimConfig::preset(Variant::ShapesOfWar)
        };
        let sim = Simulation::new(config, &mut StdRng::seed_from_u64(11));
        assert_eq!(sim.entity_count(), 25);

        let expected = sim
            .entities()
            .map(|(idx, e)| (idx, sim.world().velocity(&e.body).mag()))
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(idx, _)| idx);
        assert_eq!(sim.slowest(), expected);
        assert_eq!(slowest_colored(&sim).len(), 1);
    }

    #[test]
    fn colors_stay_in_palette_and_geometry_follows_hits() {
        let config = SimConfig {
            count: 40,
            ..SimConfig::preset(Variant::ShapesOfWar)
        };
        let mut sim = Simulation::new(config, &mut StdRng::seed_from_u64(5));
        let allowed = [
            sim.config().strike_color,
            sim.config().struck_color,
            sim.config().slowest_color,
        ];

        for _ in 0..200 {
            sim.tick();
            assert!(slowest_colored(&sim).len() <= 1);
            for (_, e) in sim.entities() {
                assert!(allowed.contains(&e.color));
                assert_eq!(e.geometry.index(), e.hits as usize % 3);
                assert_eq!(sim.world().collider_count(&e.body), 1);
            }
        }
        assert_eq!(sim.world().body_count(), 40);
    }

    #[test]
    fn toggle_color_follows_hit_parity() {
        let config = SimConfig {
            count: 40,
            ..SimConfig::preset(Variant::BallWar)
        };
        let mut sim = Simulation::new(config, &mut StdRng::seed_from_u64(9));
        for _ in 0..200 {
            sim.tick();
        }
        assert!(sim.entities().any(|(_, e)| e.hits > 0));
        for (_, e) in sim.entities() {
            let expected = if e.hits % 2 == 0 {
                sim.config().strike_color
            } else {
                sim.config().struck_color
            };
            assert_eq!(e.color, expected);
        }
    }

    #[test]
    fn counter_counts_toggle_colors() {
        let mut sim = Simulation::empty(bounce_config());
        let strike = sim.config().strike_color;
        let struck = sim.config().struck_color;
        for (i, color) in [strike, struck, strike, Rgb::RED].into_iter().enumerate() {
            let pos = m::Vec2::new(50.0 + 100.0 * i as f32, 100.0);
            sim.insert_entity(pos, m::Vec2::zero(), Geometry::Box, color);
        }
        assert_eq!(sim.counts(), (2, 1));
        assert_eq!(sim.counter_text(), "Strike: 2 | Struck: 1");
    }

    #[test]
    fn shapes_follow_geometry_and_color() {
        let mut sim = Simulation::empty(bounce_config());
        sim.insert_entity(
            m::Vec2::new(100.0, 100.0),
            m::Vec2::zero(),
            Geometry::Circle,
            Rgb::RED,
        );
        sim.insert_entity(
            m::Vec2::new(300.0, 100.0),
            m::Vec2::zero(),
            Geometry::Triangle,
            Rgb::GREEN,
        );
        let shapes: Vec<_> = sim.shapes().collect();
        assert_eq!(shapes.len(), 2);
        assert!(shapes
            .iter()
            .any(|s| matches!(s, (Outline::Circle { r, .. }, Rgb::RED) if *r == 10.0)));
        assert!(shapes
            .iter()
            .any(|s| matches!(s, (Outline::Polygon(p), Rgb::GREEN) if p.len() == 3)));
    }
}

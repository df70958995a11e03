use rand::Rng;

use crate::{color::Rgb, config::SimConfig, math as m};

/// Initial state of one entity before it is registered with the world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnState {
    pub position: m::Vec2,
    pub velocity: m::Vec2,
    pub color: Rgb,
}

/// Draw `config.count` random initial states.
///
/// Positions are uniform over the window, velocity components uniform in
/// `[-speed, speed]`. Colors are the strike color unless the configuration
/// asks for random ones.
pub fn random_states(config: &SimConfig, rng: &mut impl Rng) -> Vec<SpawnState> {
    let [width, height] = config.window_size;
    let speed = config.speed;
    (0..config.count)
        .map(|_| {
            let position = m::Vec2::new(
                rng.gen_range(0.0..=width as f32),
                rng.gen_range(0.0..=height as f32),
            );
            let velocity = m::Vec2::new(
                rng.gen_range(-speed..=speed),
                rng.gen_range(-speed..=speed),
            );
            let color = if config.random_colors {
                random_color(rng)
            } else {
                config.strike_color
            };
            SpawnState {
                position,
                velocity,
                color,
            }
        })
        .collect()
}

/// A color bright enough to show up against the black background.
pub fn random_color(rng: &mut impl Rng) -> Rgb {
    Rgb(
        rng.gen_range(10..=255),
        rng.gen_range(25..=255),
        rng.gen_range(25..=255),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SimConfig, Variant};
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn states_stay_in_range() {
        let config = SimConfig::preset(Variant::BallWar);
        let mut rng = StdRng::seed_from_u64(7);
        let states = random_states(&config, &mut rng);
        assert_eq!(states.len(), config.count);
        for s in &states {
            assert!((0.0..=800.0).contains(&s.position.x));
            assert!((0.0..=600.0).contains(&s.position.y));
            assert!(s.velocity.x.abs() <= config.speed);
            assert!(s.velocity.y.abs() <= config.speed);
            assert_eq!(s.color, config.strike_color);
        }
    }

    #[test]
    fn random_colors_respect_channel_floors() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            let Rgb(r, g, b) = random_color(&mut rng);
            assert!(r >= 10 && g >= 25 && b >= 25);
        }
    }

    #[test]
    fn same_seed_same_states() {
        let config = SimConfig::preset(Variant::Balls);
        let a = random_states(&config, &mut StdRng::seed_from_u64(42));
        let b = random_states(&config, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn zero_speed_spawns_at_rest() {
        let config = SimConfig {
            speed: 0.0,
            count: 3,
            ..SimConfig::preset(Variant::ShapesOfWar)
        };
        for s in random_states(&config, &mut StdRng::seed_from_u64(1)) {
            assert_eq!(s.velocity, m::Vec2::zero());
        }
    }
}

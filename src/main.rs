use anyhow::{Context, Result};
use clap::Parser;
use rand::{rngs::StdRng, SeedableRng};
use std::{path::PathBuf, process::ExitCode};

use bouncefield::{Demo, Game, SimConfig, Simulation, Variant};

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Which preset to run.
    #[arg(long, value_enum, default_value = "shapes-of-war")]
    variant: Variant,
    /// Load the whole configuration from a RON file instead of a preset.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Seed for spawn positions, velocities and colors.
    #[arg(long)]
    seed: Option<u64>,
    /// Override the number of entities.
    #[arg(long)]
    count: Option<usize>,
}

fn load_config(args: &Args) -> Result<SimConfig> {
    let mut config = match &args.config {
        Some(path) => SimConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => SimConfig::preset(args.variant),
    };
    if let Some(count) = args.count {
        config.count = count;
    }
    config.validate()?;
    Ok(config)
}

fn run(args: Args) -> Result<()> {
    let config = load_config(&args)?;
    let seed = args.seed.unwrap_or_else(rand::random);
    match &args.config {
        Some(path) => log::info!("running {} with {} entities", path.display(), config.count),
        None => log::info!("running {:?} with {} entities", args.variant, config.count),
    }
    log::info!("seed: {}", seed);

    let [width, height] = config.window_size;
    let window = winit::window::WindowBuilder::new()
        .with_title("Press 'Q' to quit")
        .with_inner_size(winit::dpi::PhysicalSize::new(width, height))
        .with_resizable(true);
    let game = Game::init(config.frame_rate, window)?;

    let sim = Simulation::new(config, &mut StdRng::seed_from_u64(seed));
    let demo = Demo::new(sim, &game);
    game.run(demo)?;
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

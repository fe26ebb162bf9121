use anyhow::Context;
use clap::Parser;

use pointcloud_visuals::config::Theme;
use pointcloud_visuals::headless::{self, HeadlessContext, ManualHost};
use pointcloud_visuals::host::SurfaceSize;
use pointcloud_visuals::{AppOptions, ShapeKind, Visual, VisualConfig};

/// Procedural point cloud visuals rendered with wgpu.
#[derive(Parser, Debug)]
#[command(name = "pointcloud-visuals", version, about)]
struct Args {
    /// Shape to show: star, helix, flower, dice or camera.
    #[arg(short, long, default_value = "flower")]
    shape: ShapeKind,

    /// Page theme (light or dark); overrides the config file.
    #[arg(long)]
    theme: Option<Theme>,

    /// JSON config file.
    #[arg(long)]
    config: Option<String>,

    /// Fixed seed for the random point placement.
    #[arg(long)]
    seed: Option<u64>,

    /// Run the animation without a window and print the final state.
    #[arg(long)]
    headless: bool,

    /// Frames to run in headless mode.
    #[arg(long, default_value_t = 300)]
    frames: usize,
}

fn load_config(args: &Args) -> anyhow::Result<VisualConfig> {
    let mut config = match &args.config {
        Some(path) => VisualConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path))?,
        None => VisualConfig::default(),
    };
    if let Some(theme) = args.theme {
        config.theme = theme;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    config.validate()?;
    Ok(config)
}

fn run_headless(shape: ShapeKind, config: VisualConfig, frames: usize) -> anyhow::Result<()> {
    let mut rng = config.rng();
    let scene = shape.scene(&config, &mut rng);
    log::info!("{} has {} points", shape, scene.point_count());

    let context = HeadlessContext::new();
    let ledger = context.ledger();
    let host = ManualHost::new(SurfaceSize::new(1280, 720));
    let mut visual = Visual::new(context, host, config);
    visual.start(scene)?;
    let ran = headless::drive(&mut visual, frames)?;

    let stats = visual.stats();
    println!("{}: {} frames, t = {:.3}", shape, ran, stats.time);
    for (label, transform) in visual.transforms() {
        println!(
            "  {:<12} rotation ({:.3}, {:.3}, {:.3}) position ({:.3}, {:.3}, {:.3})",
            label,
            transform.rotation.x,
            transform.rotation.y,
            transform.rotation.z,
            transform.position.x,
            transform.position.y,
            transform.position.z,
        );
    }
    visual.stop();

    let ledger = ledger.borrow();
    anyhow::ensure!(ledger.all_released(), "resources leaked: {:?}", ledger.live());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = load_config(&args)?;

    if args.headless {
        return run_headless(args.shape, config, args.frames);
    }
    pollster::block_on(pointcloud_visuals::run(AppOptions::new(args.shape, config)))?;
    Ok(())
}

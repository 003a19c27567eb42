use std::{path::PathBuf, time::Instant};

use clap::{Parser, Subcommand};
use plan_playback_core::{
    AnimationTimer, AppConfig, Collaborators, InterpolationMethod, Plan, PlaybackController,
    PlaybackSpeed, ViewMode,
};
use tracing_subscriber::EnvFilter;

fn main() -> plan_playback_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(method) = cli.method {
        config.playback.method = method;
    }

    match cli.command {
        Commands::Play { plan, speed } => {
            if let Some(speed) = speed {
                config.playback.speed = speed;
            }
            run_play(&plan, config)
        }
        Commands::Frames { plan, samples } => {
            if let Some(samples) = samples {
                config.playback.sample_count = samples;
            }
            run_frames(&plan, config)
        }
        Commands::Inspect { plan } => run_inspect(&plan),
        Commands::Commit { plan, execute } => {
            if execute {
                config.playback.visualization_only = false;
            }
            run_commit(&plan, config)
        }
    }
}

fn run_play(path: &PathBuf, mut config: AppConfig) -> plan_playback_core::Result<()> {
    let plan = Plan::load(path)?;
    tracing::info!(?path, speed = %config.playback.speed, "starting playback");

    config.playback.view_mode = ViewMode::Continuous;
    let timer = AnimationTimer::new(config.playback.target_fps);
    let mut controller = controller(&config);

    let origin = Instant::now();
    let mut deadline = origin.elapsed();
    controller.set_plan(Some(plan))?;
    while controller.is_animating() {
        deadline = timer.next_deadline(deadline, origin.elapsed());
        if let Some(wait) = deadline.checked_sub(origin.elapsed()) {
            std::thread::sleep(wait);
        }
        controller.tick()?;
    }

    let status = controller.status();
    tracing::info!(time = status.time, slider = status.slider.value(), "playback finished");
    Ok(())
}

fn run_frames(path: &PathBuf, mut config: AppConfig) -> plan_playback_core::Result<()> {
    let plan = Plan::load(path)?;
    config.playback.view_mode = ViewMode::Frames;
    let mut controller = controller(&config);
    controller.set_plan(Some(plan))?;

    let json = serde_json::to_string_pretty(controller.frames())?;
    println!("{json}");
    Ok(())
}

fn run_inspect(path: &PathBuf) -> plan_playback_core::Result<()> {
    let plan = Plan::load(path)?;
    println!("{}", plan.label());
    println!(
        "keyframes: {}, joints: {}",
        plan.len(),
        plan.joint_count().unwrap_or(0)
    );
    Ok(())
}

fn run_commit(path: &PathBuf, mut config: AppConfig) -> plan_playback_core::Result<()> {
    let plan = Plan::load(path)?;
    config.playback.view_mode = ViewMode::Frames;
    let mut controller = controller(&config);
    controller.set_plan(Some(plan))?;
    controller.execute()?;
    Ok(())
}

fn controller(config: &AppConfig) -> PlaybackController {
    PlaybackController::new(&config.playback, Collaborators::tracing()).with_gradient(config.frames)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Robot plan playback", long_about = None)]
struct Cli {
    /// Optional JSON configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Interpolation method: linear, cubic-spline or pchip.
    #[arg(short, long, global = true)]
    method: Option<InterpolationMethod>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Animate a plan in real time, logging every pose.
    Play {
        /// Path to the plan JSON file.
        plan: PathBuf,
        /// Playback speed such as `1/2x`, `1x` or `2x`.
        #[arg(short, long)]
        speed: Option<PlaybackSpeed>,
    },
    /// Sample a plan into evenly spaced frames and print them as JSON.
    Frames {
        plan: PathBuf,
        /// Number of frames to sample.
        #[arg(short = 'n', long)]
        samples: Option<usize>,
    },
    /// Print a summary of a plan.
    Inspect { plan: PathBuf },
    /// Commit a plan, either as the visualized robot state or to the executor.
    Commit {
        plan: PathBuf,
        /// Send the plan to the executor instead of only updating the robot state.
        #[arg(long)]
        execute: bool,
    },
}

use anyhow::Context;
use clap::{Parser, Subcommand};
use orbitlight_app::{
    CancelToken, FixedStepScheduler, SceneApp, SceneConfig, Viewport, pivot_angle, run_loop,
};
use orbitlight_render::DebugTextRenderer;
use orbitlight_tools::inspector::SceneInspector;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "orbitlight-cli", about = "Headless runner for the orbit light scene")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and a summary of the default scene
    Info,
    /// Run the animation at a fixed frame rate and print debug frames
    Simulate {
        /// Number of frames to run
        #[arg(short, long, default_value = "120")]
        frames: u64,
        /// Frames per second of the simulated clock
        #[arg(long, default_value = "60")]
        fps: f64,
        /// Scene config file (.json, .yaml or .yml)
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long, default_value = "800")]
        width: u32,
        #[arg(long, default_value = "600")]
        height: u32,
        /// Print every Kth frame (0 prints none)
        #[arg(long, default_value = "30")]
        print_every: u64,
    },
    /// List every node after updating to a timestamp
    Inspect {
        /// Timestamp in milliseconds
        #[arg(long, default_value = "0")]
        at_ms: f64,
    },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<SceneConfig> {
    match path {
        Some(path) => SceneConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(SceneConfig::default()),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("orbitlight-cli v{}", env!("CARGO_PKG_VERSION"));
            let config = SceneConfig::default();
            let app = SceneApp::new(config.clone(), Viewport::new(800, 600))?;
            println!("{}", SceneInspector::summary(app.scene()));
            println!(
                "frame order: {}  orbit speed: {} deg/s",
                config.frame_order, config.animation.degrees_per_second
            );
        }
        Commands::Simulate {
            frames,
            fps,
            config,
            width,
            height,
            print_every,
        } => {
            let config = load_config(config.as_ref())?;
            let mut app = SceneApp::new(config, Viewport::new(width, height))?;
            let mut renderer = DebugTextRenderer::new(width, height);
            app.resize(&mut renderer, width, height);

            let mut scheduler = FixedStepScheduler::new(fps).with_limit(frames);
            let mut index = 0u64;
            let stats = run_loop(
                &mut app,
                &mut scheduler,
                &mut renderer,
                &CancelToken::new(),
                |t, out| {
                    index += 1;
                    if print_every > 0 && (index == 1 || index % print_every == 0) {
                        println!("t={t:.1}ms");
                        print!("{out}");
                    }
                },
            );

            println!(
                "Simulated {} frames, last t={:.1}ms, stop={:?}",
                stats.frames,
                stats.last_timestamp_ms.unwrap_or_default(),
                stats.stop
            );
            println!("{}", SceneInspector::summary(app.scene()));
        }
        Commands::Inspect { at_ms } => {
            let mut app = SceneApp::new(SceneConfig::default(), Viewport::new(800, 600))?;
            app.update(at_ms);

            println!(
                "t={at_ms}ms pivot angle={:.4} rad",
                pivot_angle(at_ms, app.config().animation.degrees_per_second)
            );
            println!("{}", SceneInspector::summary(app.scene()));
            if let Some(target) = app.light_target() {
                println!(
                    "light target: ({:.3}, {:.3}, {:.3})",
                    target.x, target.y, target.z
                );
            }
            for info in SceneInspector::list_nodes(app.scene()) {
                println!("  {info}");
            }
        }
    }

    Ok(())
}

use clap::{Parser, Subcommand};
use roadscene_input::{Action, ScreenPoint, Viewport};
use roadscene_render::{DebugTextRenderer, OrbitControls, RenderPipeline};
use roadscene_runtime::{
    FrameDriver, PickOutcome, SceneConfig, SceneContext, Session, load_road_texture,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "roadscene-cli", about = "Headless driver for the road scene")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML file overriding scene defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and the effective scene configuration
    Info,
    /// Run frames through the debug renderer, clicking between them
    Simulate {
        /// Number of frames to run
        #[arg(short, long, default_value = "60")]
        frames: u64,
        /// Click at pixel X,Y (repeatable); clicks are spread over the run
        #[arg(long, value_parser = parse_point)]
        click: Vec<ScreenPoint>,
        /// Viewport width in pixels
        #[arg(long, default_value = "1280")]
        width: u32,
        /// Viewport height in pixels
        #[arg(long, default_value = "720")]
        height: u32,
        /// Also load the configured model before running
        #[arg(long)]
        with_model: bool,
    },
}

fn parse_point(s: &str) -> Result<ScreenPoint, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got {s:?}"))?;
    let x: f32 = x.trim().parse().map_err(|e| format!("bad X in {s:?}: {e}"))?;
    let y: f32 = y.trim().parse().map_err(|e| format!("bad Y in {s:?}: {e}"))?;
    Ok(ScreenPoint::new(x, y))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = match &cli.config {
        Some(path) => SceneConfig::load(path)?,
        None => SceneConfig::default(),
    };

    match cli.command {
        Commands::Info => {
            println!("roadscene-cli v{}", env!("CARGO_PKG_VERSION"));
            print!("{}", config.to_yaml_string()?);
        }
        Commands::Simulate {
            frames,
            click,
            width,
            height,
            with_model,
        } => {
            let viewport = Viewport::new(width, height);
            let mut ctx = SceneContext::build(
                &config,
                viewport,
                OrbitControls::new(config.controls),
                DebugTextRenderer::new(RenderPipeline::with_bloom(config.bloom)),
                load_road_texture(&config),
            );
            if with_model {
                ctx.on_model_loaded(roadscene_assets::load_model(&config.model_path));
            }

            // Spread clicks evenly: click i fires after frame (i + 1) * frames / (n + 1).
            let n = click.len() as u64;
            let due: Vec<u64> = (0..n).map(|i| (i + 1) * frames / (n + 1)).collect();
            let mut clicks = click.into_iter().zip(due).peekable();

            let mut driver = FrameDriver::from_config(&config);
            let mut session = Session::new();
            if frames == 0 {
                session.end();
            }
            driver.run(&mut ctx, &mut session, |ctx, session| {
                let frame = ctx.renderer.frames();
                while let Some((point, _)) = clicks.next_if(|(_, at)| *at <= frame) {
                    report_pick(point, ctx.apply(&Action::Click(point)));
                }
                if frame >= frames {
                    session.end();
                }
            });
            for (point, _) in clicks {
                report_pick(point, ctx.apply(&Action::Click(point)));
            }

            println!("{}", ctx.renderer.last_frame());
            let events = ctx.scene.drain_events();
            println!("Scene events: {}", events.len());
            for event in events {
                println!("  {event:?}");
            }
        }
    }

    Ok(())
}

fn report_pick(point: ScreenPoint, outcome: Option<PickOutcome>) {
    match outcome {
        Some(PickOutcome::Hit {
            object,
            distance,
            swapped,
        }) => println!(
            "click ({:.0}, {:.0}): hit {} at {:.2}{}",
            point.x,
            point.y,
            object.short(),
            distance,
            if swapped { ", swapped to road material" } else { "" }
        ),
        _ => println!("click ({:.0}, {:.0}): miss", point.x, point.y),
    }
}

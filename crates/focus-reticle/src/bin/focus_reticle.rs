use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use focus_reticle::core::{Plane, Projection};
use focus_reticle::io::{run_replay, ReplayConfig, ReplayFrame, ReplayIoError, TimedPlane};
use focus_reticle::{ReticleError, ReticleParams, StyleConfig};
use nalgebra::{Point3, Vector3};

#[derive(Parser)]
#[command(
    name = "focus-reticle",
    version,
    about = "Replay scripted AR sessions through the focus reticle"
)]
struct Cli {
    /// Log verbosity on stderr; `RUST_LOG` directives refine it per target.
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Warn)]
    log_level: LogLevel,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a session config and write a per-frame report
    Replay(ReplayArgs),
    /// Write a sample session config
    Init(InitArgs),
}

#[derive(Args)]
struct ReplayArgs {
    /// Session config (JSON)
    config: PathBuf,
    /// Report path; defaults to the config's `output_path`
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args)]
struct InitArgs {
    /// Where to write the config
    path: PathBuf,
    #[arg(long, value_enum, default_value_t = StyleArg::Classic)]
    style: StyleArg,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum StyleArg {
    Classic,
    Colored,
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Io(#[from] ReplayIoError),
    #[error(transparent)]
    Reticle(#[from] ReticleError),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    let result = match cli.command {
        Commands::Replay(args) => replay(args),
        Commands::Init(args) => init(args),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(level: LogLevel) {
    #[cfg(feature = "tracing")]
    {
        let _ = tracing_log::LogTracer::init();
        focus_reticle::core::init_tracing(level.into(), false);
    }
    #[cfg(not(feature = "tracing"))]
    {
        if let Err(err) = focus_reticle::core::init_with_level(level.into()) {
            eprintln!("logger not installed: {err}");
        }
    }
}

fn replay(args: ReplayArgs) -> Result<(), CliError> {
    let config = ReplayConfig::load_json(&args.config)?;
    let report = run_replay(&config)?;
    let out = args.out.unwrap_or_else(|| config.output_path());
    report.write_json(&out)?;
    println!(
        "replayed {} frames: final state {:?}, {} transitions, {} leaked nodes",
        report.frames.len(),
        report.final_state,
        report.events.len(),
        report.leaked_nodes
    );
    println!("wrote report to {}", out.display());
    Ok(())
}

/// Two seconds at 60 Hz panning across a floor that shows up after a
/// quarter second and vanishes at 1.5 s. A low-confidence wall behind it
/// only ever yields `Unknown` hits.
fn sample_config(style: StyleArg) -> ReplayConfig {
    let frames = (0..120)
        .map(|i| {
            let t = i as f64 / 60.0;
            ReplayFrame {
                timestamp: t,
                eye: Point3::new(0.0, 1.4, 0.0),
                target: Point3::new((t as f32 - 1.0) * 0.5, 0.0, -1.0),
            }
        })
        .collect();
    ReplayConfig {
        params: ReticleParams::default(),
        style: match style {
            StyleArg::Classic => StyleConfig::classic(),
            StyleArg::Colored => StyleConfig::colored(),
        },
        projection: Projection::default(),
        planes: vec![
            TimedPlane {
                plane: Plane::horizontal(Point3::origin()).with_extent(3.0, 3.0),
                appear_at: 0.25,
                disappear_at: Some(1.5),
            },
            TimedPlane {
                plane: Plane::vertical(Point3::new(0.0, 0.0, -4.0), Vector3::z())
                    .with_extent(4.0, 10.0)
                    .with_confidence(0.3),
                appear_at: 0.0,
                disappear_at: None,
            },
        ],
        restyle: Vec::new(),
        frames,
        output_path: Some("focus_reticle_replay.json".to_string()),
    }
}

fn init(args: InitArgs) -> Result<(), CliError> {
    sample_config(args.style).write_json(&args.path)?;
    println!("wrote sample config to {}", args.path.display());
    Ok(())
}

//! Spacerunner entry point
//!
//! Runs a headless session or replays a saved capture. The window binding
//! lives outside this crate, so both subcommands drive an in-memory surface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use thiserror::Error;

use spacerunner::capture::{FrameStatus, Playback};
use spacerunner::platform::MemorySurface;
use spacerunner::session::Session;
use spacerunner::settings::DEFAULT_SETTINGS_FILE;
use spacerunner::{CaptureError, SettingsError, Settings, SimError};

#[derive(Parser)]
#[command(name = "spacerunner", about = "Endless asteroid-field flyer")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fly a fixed number of frames and optionally save the capture
    Run(RunArgs),
    /// Play a saved capture frame by frame
    Replay(ReplayArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Settings file, created with defaults if missing
    #[arg(short, long, default_value = DEFAULT_SETTINGS_FILE)]
    settings: PathBuf,

    /// Frames to simulate
    #[arg(short, long, default_value_t = 600)]
    frames: u32,

    /// Seconds per frame
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,

    /// RNG seed, overrides the settings file
    #[arg(long)]
    seed: Option<u64>,

    /// Hold the thrust key for the whole run
    #[arg(long)]
    thrust: bool,

    /// Save the capture under this base name when the run ends
    #[arg(long)]
    save: Option<PathBuf>,

    #[arg(long, default_value_t = 1000)]
    width: u32,

    #[arg(long, default_value_t = 800)]
    height: u32,
}

#[derive(Args)]
struct ReplayArgs {
    /// Capture file (.srv3)
    file: PathBuf,

    #[arg(long, default_value_t = 1000)]
    width: u32,

    #[arg(long, default_value_t = 800)]
    height: u32,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Sim(#[from] SimError),
    #[error(transparent)]
    Capture(#[from] CaptureError),
}

fn run(args: RunArgs) -> Result<(), CliError> {
    let mut settings = Settings::load_or_create(&args.settings)?;
    if args.seed.is_some() {
        settings.seed = args.seed;
    }

    let surface = MemorySurface::counting(args.width, args.height);
    let mut session = Session::new(settings, surface)?;
    if args.thrust {
        let thrust = session.scene().settings.key_thrust;
        session.key_down(thrust)?;
    }

    for _ in 0..args.frames {
        session.frame(args.dt)?;
    }
    log::info!(
        "Ran {} frames (seed {}), score {}",
        args.frames,
        session.scene().seed,
        session.score()
    );

    if let Some(base) = args.save {
        session.save_capture_as(&base)?;
    }
    Ok(())
}

fn replay(args: ReplayArgs) -> Result<(), CliError> {
    let surface = MemorySurface::counting(args.width, args.height);
    let mut playback = Playback::open(&args.file, surface)?;
    loop {
        match playback.advance_one_frame() {
            Ok(FrameStatus::More) => {}
            Ok(FrameStatus::Exhausted) => break,
            Err(e) => {
                log::warn!("Playback stopped early: {e}");
                break;
            }
        }
    }
    let frames = playback.frames();
    let surface = playback.into_surface();
    log::info!("Replayed {} frames, {} lines", frames, surface.lines());
    Ok(())
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Run(args) => run(args),
        Command::Replay(args) => replay(args),
    };
    if let Err(e) = result {
        log::error!("{e}");
        std::process::exit(1);
    }
}

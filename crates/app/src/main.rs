use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use palette_sequencer_core::{
    FrameDriver, ProcessMode, SequencerConfig, SequencerError, SwatchSink,
};
use tracing_subscriber::EnvFilter;

fn main() -> palette_sequencer_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            ticks,
            delta,
            mode,
            autostart,
        } => run_sequence(&config, ticks, delta, mode, autostart),
        Commands::Resolve { config, index } => run_resolve(&config, index),
        Commands::Init { output } => run_init(&output),
    }
}

fn run_sequence(
    path: &Path,
    ticks: u64,
    delta: f32,
    mode: Option<ModeArg>,
    autostart: bool,
) -> palette_sequencer_core::Result<()> {
    let mut config = SequencerConfig::load(path)?;
    apply_overrides(&mut config, mode, autostart);
    if !config.autostart {
        tracing::warn!("autostart is off; the sequence stays paused (pass --autostart to play)");
    }
    tracing::info!(
        ?path,
        palettes = config.palettes.len(),
        fps = config.frames_per_second,
        ticks,
        delta,
        "running palette sequence"
    );

    let mut driver = FrameDriver::from_config(config)?;
    driver.sequencer_mut().on_any(|event| match serde_json::to_string(event) {
        Ok(line) => println!("{line}"),
        Err(err) => tracing::warn!(%err, "failed to serialise event"),
    });

    let swatch = SwatchSink::new();
    driver.attach_sink(swatch.clone());
    driver.run(delta, ticks);

    tracing::info!(
        index = driver.sequencer().current_index(),
        installs = swatch.applied_count(),
        paused = driver.sequencer().is_paused(),
        "sequence finished"
    );
    Ok(())
}

/// Command line flags take precedence over the loaded configuration.
fn apply_overrides(config: &mut SequencerConfig, mode: Option<ModeArg>, autostart: bool) {
    if let Some(mode) = mode {
        config.process_mode = mode.into();
    }
    config.autostart |= autostart;
}

fn run_resolve(path: &Path, index: i64) -> palette_sequencer_core::Result<()> {
    let config = SequencerConfig::load(path)?;
    if config.palettes.is_empty() {
        return Err(SequencerError::msg("configuration contains no palettes"));
    }

    let resolved = config.palettes.full_palette(index, config.looping);
    println!("{}", serde_json::to_string_pretty(&resolved)?);
    Ok(())
}

fn run_init(output: &PathBuf) -> palette_sequencer_core::Result<()> {
    tracing::info!(?output, "writing default configuration");
    SequencerConfig::default().save(output)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Palette animation sequencer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Step a configured sequence and print every event as a JSON line.
    Run {
        /// JSON configuration describing the palettes and playback flags.
        #[arg(short, long)]
        config: PathBuf,
        /// Number of host ticks to simulate.
        #[arg(short, long, default_value_t = 48)]
        ticks: u64,
        /// Seconds fed to the sequencer on each tick.
        #[arg(short, long, default_value_t = 1.0 / 60.0)]
        delta: f32,
        /// Overrides the configured time source.
        #[arg(short, long, value_enum)]
        mode: Option<ModeArg>,
        /// Start playing even if the configuration has autostart disabled.
        #[arg(short, long)]
        autostart: bool,
    },
    /// Print the padded palette at an index.
    Resolve {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long, allow_negative_numbers = true)]
        index: i64,
    },
    /// Write a default configuration file.
    Init {
        output: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Idle,
    Fixed,
    Unscaled,
}

impl From<ModeArg> for ProcessMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Idle => ProcessMode::Idle,
            ModeArg::Fixed => ProcessMode::Fixed,
            ModeArg::Unscaled => ProcessMode::Unscaled,
        }
    }
}

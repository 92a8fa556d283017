//! slot-sim — headless spin driver
//!
//! Runs a number of spins through the orchestrator on a fixed frame step,
//! logs the lifecycle and prints session stats.

use std::error::Error;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use rf_slot_lab::{
    LogPort, RecordingPort, SlotConfig, SpinOrchestrator, TimingConfig, TimingProfile,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Profile {
    Normal,
    Turbo,
    Studio,
}

impl From<Profile> for TimingProfile {
    fn from(profile: Profile) -> Self {
        match profile {
            Profile::Normal => TimingProfile::Normal,
            Profile::Turbo => TimingProfile::Turbo,
            Profile::Studio => TimingProfile::Studio,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "slot-sim", version, about = "Drive reel spins without a renderer")]
struct Cli {
    /// Number of spins to run
    #[arg(short = 'n', long, default_value_t = 10)]
    spins: u32,

    /// RNG seed (overrides the config file)
    #[arg(short, long)]
    seed: Option<u64>,

    /// JSON or YAML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Timing profile (overrides the config file)
    #[arg(short, long, value_enum)]
    profile: Option<Profile>,

    /// Win probability per spin
    #[arg(short, long)]
    win_chance: Option<f64>,

    /// Frame rate of the simulated driver
    #[arg(long)]
    fps: Option<f64>,

    /// Write recorded stage traces as JSON
    #[arg(short, long)]
    trace: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let config = build_config(&cli)?;
    let frame_ms = 1000.0 / config.timing.target_fps;
    // Generous bound: the timer schedule plus time to settle
    let timeout_ms = config.timing.finalize_offset(config.reels.reel_count) + 10_000.0;

    log::info!(
        "Running {} spins ({:?} timing, {} reels, win chance {})",
        cli.spins,
        config.timing.profile,
        config.reels.reel_count,
        config.win.win_chance
    );

    let recorder = RecordingPort::new();
    let mut slot = SpinOrchestrator::new(config, (LogPort, recorder.clone()))?;

    for _ in 0..cli.spins {
        if slot.spin().is_none() {
            continue;
        }
        match slot.run_until_stopped(frame_ms, timeout_ms) {
            Some(outcome) => {
                let symbols: Vec<String> = outcome
                    .symbols
                    .iter()
                    .map(|reel| {
                        reel.iter()
                            .map(|s| s.to_string())
                            .collect::<Vec<_>>()
                            .join(" ")
                    })
                    .collect();
                println!(
                    "spin {:>4}  {:<6}  roll {:.4}  [{}]",
                    outcome.spin_id,
                    if outcome.won { "WIN" } else { "-" },
                    outcome.roll.sample,
                    symbols.join(" | ")
                );
            }
            None => {
                slot.shutdown();
            }
        }
    }

    let stats = slot.stats();
    println!(
        "\n{} spins, {} wins, {} losses, hit rate {:.1}%",
        stats.total_spins,
        stats.wins,
        stats.losses,
        stats.hit_rate()
    );

    if let Some(path) = &cli.trace {
        let config = slot.config();
        let traces: Vec<_> = recorder
            .traces()
            .into_iter()
            .map(|trace| {
                trace
                    .with_metadata("profile", config.timing.profile.name().into())
                    .with_metadata("win_chance", config.win.win_chance.into())
                    .with_metadata("seed", serde_json::json!(config.seed))
            })
            .collect();

        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, &traces)?;
        log::info!("Wrote {} traces to {}", traces.len(), path.display());
    }

    Ok(())
}

fn build_config(cli: &Cli) -> Result<SlotConfig, Box<dyn Error>> {
    let mut config = match &cli.config {
        Some(path) => SlotConfig::load(path)?,
        None => SlotConfig::default(),
    };

    if let Some(profile) = cli.profile {
        let fps = config.timing.target_fps;
        config.timing = TimingConfig::from_profile(profile.into());
        config.timing.target_fps = fps;
    }
    if let Some(fps) = cli.fps {
        config.timing.target_fps = fps;
    }
    if let Some(chance) = cli.win_chance {
        config.win.win_chance = chance;
    }
    if let Some(seed) = cli.seed {
        config.seed = Some(seed);
    }

    config.validate()?;
    Ok(config)
}

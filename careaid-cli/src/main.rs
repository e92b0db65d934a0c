//! Care-Aid CLI
//!
//! Distress signal scoring from recorded classifier output or synthetic
//! sensor channels.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use careaid_core::{EngineConfig, ProfileRegistry, ScoringEngine};
use careaid_runtime::{Monitor, MonitorConfig, MonitorStats, Reading};
use careaid_sensors::{
    create_replay_classifier, AcousticSource, SignalSource, SilentCapture, SourceConfig,
    SyntheticConfig, SyntheticSource, WINDOW_SAMPLES,
};

#[derive(Parser)]
#[command(name = "care-aid")]
#[command(author, version, about = "Care-Aid: distress signal scoring", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Extra engine profile (TOML); registered alongside the embedded ones
    #[arg(long, global = true, env = "CAREAID_PROFILE_FILE")]
    config: Option<PathBuf>,

    /// Verbosity level (0-3)
    #[arg(short, long, default_value = "1")]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// List available engine profiles
    Profiles,

    /// Score one set of direct channel intensities
    Score {
        /// Engine profile
        #[arg(short, long, default_value = "micro-signals")]
        profile: String,

        /// Channel intensity as id=value (repeatable)
        #[arg(short, long = "set", value_parser = parse_assignment)]
        set: Vec<(String, f64)>,

        /// Situational context multiplier (weighted-sum profiles)
        #[arg(long)]
        context: Option<f64>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Replay recorded classifier observations (JSON Lines)
    Replay {
        /// Observation file, one JSON array of {label, score} per line
        #[arg(short, long)]
        input: PathBuf,

        /// Engine profile
        #[arg(short, long, default_value = "acoustic")]
        profile: String,

        /// Observation tick in milliseconds
        #[arg(long, default_value = "1000", value_parser = clap::value_parser!(u64).range(1..))]
        interval_ms: u64,

        /// Maximum runtime in seconds (0 = until the file is exhausted)
        #[arg(long, default_value = "0")]
        timeout: u64,

        /// Print JSON readings instead of text
        #[arg(long)]
        json: bool,
    },

    /// Run the synthetic sensor simulation
    Simulate {
        /// Engine profile
        #[arg(short, long, default_value = "micro-signals")]
        profile: String,

        /// Number of observation ticks to run
        #[arg(short, long, default_value = "30")]
        ticks: u64,

        /// Observation tick in milliseconds
        #[arg(long, default_value = "2000", value_parser = clap::value_parser!(u64).range(1..))]
        interval_ms: u64,

        /// Chance of an acute event per tick
        #[arg(long, default_value = "0.15")]
        event_probability: f64,

        /// Seed for reproducible runs
        #[arg(long)]
        seed: Option<u64>,

        /// Situational context multiplier (weighted-sum profiles)
        #[arg(long)]
        context: Option<f64>,

        /// Print JSON readings instead of text
        #[arg(long)]
        json: bool,
    },
}

/// Parse `id=value` into a channel assignment
fn parse_assignment(raw: &str) -> Result<(String, f64), String> {
    let (id, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected id=value, got '{}'", raw))?;
    let id = id.trim();
    if id.is_empty() {
        return Err(format!("missing channel id in '{}'", raw));
    }
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid intensity in '{}': {}", raw, e))?;
    Ok((id.to_string(), value))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = match cli.verbose {
        0 => Level::ERROR,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let mut registry = ProfileRegistry::load_embedded();
    if let Some(path) = &cli.config {
        let profile = registry.load_file(path)?;
        info!("Loaded profile {} from {}", profile.name, path.display());
    }

    match cli.command {
        Commands::Profiles => list_profiles(&registry),
        Commands::Score {
            profile,
            set,
            context,
            json,
        } => score(registry.require(&profile)?, &set, context, json)?,
        Commands::Replay {
            input,
            profile,
            interval_ms,
            timeout,
            json,
        } => {
            run_replay(
                registry.require(&profile)?.clone(),
                input,
                interval_ms,
                timeout,
                json,
            )
            .await?;
        }
        Commands::Simulate {
            profile,
            ticks,
            interval_ms,
            event_probability,
            seed,
            context,
            json,
        } => {
            run_simulation(
                registry.require(&profile)?.clone(),
                ticks,
                interval_ms,
                event_probability,
                seed,
                context,
                json,
            )
            .await?;
        }
    }

    Ok(())
}

fn list_profiles(registry: &ProfileRegistry) {
    for profile in registry.iter() {
        let thresholds = profile
            .thresholds
            .resolve()
            .map(|t| format!("{}/{}/{}", t.anomaly, t.probable, t.critical))
            .unwrap_or_else(|_| "invalid".to_string());
        let channels = profile
            .channels
            .iter()
            .map(|c| format!("{}({})", c.id, c.weight))
            .collect::<Vec<_>>()
            .join(", ");

        println!("{}", profile.name);
        if let Some(description) = &profile.description {
            println!("   {}", description);
        }
        println!("   policy: {} | tiers: {}", profile.policy.name(), thresholds);
        println!("   channels: {}", channels);
    }
}

fn score(
    profile: &EngineConfig,
    assignments: &[(String, f64)],
    context: Option<f64>,
    json: bool,
) -> Result<()> {
    let mut engine = ScoringEngine::new(profile)?;
    if let Some(multiplier) = context {
        engine.set_context_multiplier(multiplier);
    }

    for (id, value) in assignments {
        if engine.channel(id).is_none() {
            info!("Channel {} not in profile {}; ignored", id, profile.name);
        }
        engine.ingest_channel_update(id, *value);
    }

    let snapshot = engine.snapshot();
    if json {
        println!("{}", serde_json::to_string(&snapshot)?);
    } else {
        println!("Score: {} ({})", snapshot.aggregate_score, snapshot.tier);
        for (id, value) in &snapshot.per_channel {
            println!("   {:<20} {:>6.1}", id, value);
        }
    }

    Ok(())
}

async fn run_replay(
    profile: EngineConfig,
    input: PathBuf,
    interval_ms: u64,
    timeout: u64,
    json: bool,
) -> Result<()> {
    let mut config = MonitorConfig::new(profile);
    config.observe_interval_ms = interval_ms;
    config.max_runtime_secs = timeout;

    let mut monitor = Monitor::new(config)?;

    let classifier = create_replay_classifier(&input);
    let mut source = AcousticSource::new(SourceConfig::default().with_id("replay"), classifier)
        .with_capture(Box::new(SilentCapture::new(WINDOW_SAMPLES)));

    // A failed load leaves nothing to monitor; surface it and stop.
    source.init().await?;
    monitor.add_source(Box::new(source));

    let stats = monitor.run(|reading| print_reading(reading, json)).await?;
    print_stats(&stats, json);
    Ok(())
}

async fn run_simulation(
    profile: EngineConfig,
    ticks: u64,
    interval_ms: u64,
    event_probability: f64,
    seed: Option<u64>,
    context: Option<f64>,
    json: bool,
) -> Result<()> {
    let mut config = MonitorConfig::new(profile);
    config.observe_interval_ms = interval_ms;
    config.max_ticks = Some(ticks);
    config.seed = seed;

    let mut monitor = Monitor::new(config)?;
    if let Some(multiplier) = context {
        print_reading(&monitor.set_context_multiplier(multiplier), json);
    }

    let source = SyntheticSource::new(
        SourceConfig::default().with_id("synthetic"),
        SyntheticConfig {
            event_probability,
            // Offset so events and drift draw from different streams
            seed: seed.map(|s| s.wrapping_add(1)),
            ..Default::default()
        },
    )?;
    monitor.add_source(Box::new(source));

    let stats = monitor.run(|reading| print_reading(reading, json)).await?;
    print_stats(&stats, json);
    Ok(())
}

fn print_reading(reading: &Reading, json: bool) {
    if json {
        match reading.to_json() {
            Ok(line) => println!("{}", line),
            Err(e) => tracing::error!("Failed to encode reading {}: {}", reading.sequence, e),
        }
        return;
    }

    let channels = reading
        .snapshot
        .per_channel
        .iter()
        .map(|(id, value)| format!("{}={:.1}", id, value))
        .collect::<Vec<_>>()
        .join(" ");
    let status = match &reading.snapshot.top_label {
        Some(_) => format!("{:<17} {}", reading.snapshot.tier.label(), reading.headline()),
        None => reading.snapshot.tier.label().to_string(),
    };
    println!(
        "[{:>4}] {:>3} {} | {}",
        reading.sequence, reading.snapshot.aggregate_score, status, channels
    );
}

fn print_stats(stats: &MonitorStats, json: bool) {
    if json {
        return;
    }
    println!("\nSession {}", stats.session);
    println!(
        "   Readings: {} | observation ticks: {} | drift ticks: {} ({} skipped)",
        stats.readings, stats.observe_ticks, stats.drift_ticks, stats.drifts_skipped
    );
    if let (Some(peak), Some(mean)) = (stats.peak_score, stats.mean_score) {
        println!("   Peak score: {} | mean: {:.1}", peak, mean);
    }
    println!(
        "   Final: {} ({})",
        stats.last.aggregate_score, stats.last.tier
    );
    if stats.source_errors > 0 {
        println!("   Source errors: {}", stats.source_errors);
    }
    if stats.not_ready_polls > 0 {
        println!("   Polls while a source was not ready: {}", stats.not_ready_polls);
    }
}

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tripwire::report::{EventSink, JsonLinesSink, TracingSink};
use tripwire::{CounterConfig, Counting, MultiCounter};

/// Replays a recorded track dump through the line-crossing counter.
#[derive(Parser, Debug)]
#[command(name = "replay")]
struct Args {
    /// Track dump, one `<timestamp>: <json array>` line per frame
    tracks: PathBuf,

    /// JSON counter config; defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value_t = 1280)]
    width: u32,

    #[arg(long, default_value_t = 720)]
    height: u32,

    #[arg(long, default_value = "cam-0")]
    camera_id: String,

    /// Append one JSON report per crossing to this file instead of the log
    #[arg(long)]
    report_jsonl: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("tripwire=info,replay=info")),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => CounterConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => CounterConfig::default(),
    };

    let mut sink: Box<dyn EventSink> = match &args.report_jsonl {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening {}", path.display()))?;

            Box::new(JsonLinesSink::new(file))
        }
        None => Box::new(TracingSink),
    };

    let file = std::fs::File::open(&args.tracks)
        .with_context(|| format!("opening {}", args.tracks.display()))?;
    let dims = (args.width, args.height);
    let mut counter: MultiCounter<i64> = MultiCounter::new(config);

    let summary = tripwire::replay(
        std::io::BufReader::new(file),
        dims,
        &args.camera_id,
        &mut counter,
        sink.as_mut(),
    )?;

    let counts = counter.counts(&args.camera_id);
    info!(
        "{} frames replayed, {} skipped, {} crossings",
        summary.frames, summary.skipped, summary.events
    );
    println!("{}", counts);

    Ok(())
}

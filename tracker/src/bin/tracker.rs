use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hot_address_tracker::record_queue::run_epoch_reset;
use hot_address_tracker::{metrics, RecordQueue, Tracker, TrackerConfig};

#[derive(Debug, Parser)]
#[command(name = "tracker", about = "Top-K request address tracker demo", long_about = None)]
pub struct Cli {
    /// Number of one-off addresses recorded after the popular ones
    #[arg(long, default_value_t = 1000)]
    one_offs: u32,

    /// Top-K size (overrides TRACKER_CAPACITY)
    #[arg(short, long)]
    capacity: Option<usize>,

    /// Record queue bound (overrides TRACKER_QUEUE_CAPACITY)
    #[arg(long)]
    queue_capacity: Option<usize>,

    /// Automatic reset period in seconds (overrides TRACKER_RESET_INTERVAL_SECS)
    #[arg(long)]
    reset_interval_secs: Option<u64>,

    /// Print Prometheus metrics after the run
    #[arg(long, default_value = "false")]
    metrics: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = TrackerConfig::from_env()?;
    if let Some(capacity) = cli.capacity {
        config.capacity = capacity;
    }
    if let Some(queue_capacity) = cli.queue_capacity {
        config.queue_capacity = queue_capacity;
    }
    if let Some(secs) = cli.reset_interval_secs {
        config.reset_interval = (secs > 0).then(|| Duration::from_secs(secs));
    }
    config.validate()?;
    info!("Starting tracker with {:?}", config);

    let tracker = Arc::new(Tracker::from_config(&config)?);
    let (queue, consumer) = RecordQueue::spawn(tracker.clone(), config.queue_capacity);
    let epoch_task = config
        .reset_interval
        .map(|period| run_epoch_reset(tracker.clone(), period));

    for _ in 0..3 {
        queue.record("Fairly Popular IP Address").await?;
    }
    for _ in 0..4 {
        queue.record("The Most Popular IP Address").await?;
    }

    // Synthetic one-off addresses from 10.0.0.0/8
    let started = Instant::now();
    for i in 0..cli.one_offs {
        let address = Ipv4Addr::from(0x0a00_0000 | (i & 0x00ff_ffff)).to_string();
        let record_started = Instant::now();
        queue.record(&address).await?;
        debug!("Recorded {} in {:?}", address, record_started.elapsed());
    }
    queue.flush().await?;
    info!(
        "Recorded {} one-off addresses in {:?} ({} distinct keys)",
        cli.one_offs,
        started.elapsed(),
        tracker.distinct_keys()
    );

    let snapshot_started = Instant::now();
    let snapshot = tracker.snapshot_entries();
    info!(
        "Top {} of {} keys in {:?}",
        snapshot.len(),
        tracker.distinct_keys(),
        snapshot_started.elapsed()
    );
    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    queue.reset().await?;
    queue.flush().await?;
    info!("Epoch {} started", tracker.epoch());

    if let Some(task) = epoch_task {
        task.abort();
    }
    drop(queue);
    consumer.await?;

    if cli.metrics {
        print!("{}", metrics::render());
    }

    Ok(())
}

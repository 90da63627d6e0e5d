// demos/capture_demo.rs
//! Capture a few bursts from the simulated scope and print what was retained

use scope_core::acquisition::{AcquisitionSession, Pausable, WorkerEvent};
use scope_core::config::ConfigLoader;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scope_core=debug,capture_demo=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut loader = ConfigLoader::new();
    let mut config = loader.load_system_config()?;
    // Keep the demo snappy unless a config file asks otherwise
    if config.acquisition.settle_time_ms > 500 {
        config.acquisition.settle_time_ms = 500;
    }
    info!(summary = ?config.get_summary(), "configuration loaded");

    let mut session = AcquisitionSession::from_config(&config)?;
    let events = session.events();
    session.start()?;

    for burst in 1..=3 {
        thread::sleep(Duration::from_millis(200));
        session.pause();
        for (channel, samples) in session.drain_all() {
            let peak = samples.values.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
            let span = samples.timestamps.last().copied().unwrap_or(0.0);
            info!(burst, channel, count = samples.len(), span_s = span, peak_v = peak, "burst captured");
        }
        session.resume();
    }

    let metrics = session.stop_and_join()?;
    info!(?metrics, "acquisition finished");

    for event in events.try_iter() {
        if let WorkerEvent::Failed(reason) = event {
            warn!(%reason, "worker reported a failure");
        }
    }

    Ok(())
}

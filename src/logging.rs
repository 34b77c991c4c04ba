use std::{fs::OpenOptions, sync::Mutex};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::error::FlowResult;

/// Logs go to a file: stdout belongs to the terminal UI.
pub fn init_logging(config: &Config) -> FlowResult<()> {
    config.ensure_data_dir()?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)?;

    let filter =
        EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));

    // A second init (tests, repeated calls) keeps the first subscriber.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .with(filter)
        .try_init()
        .ok();

    Ok(())
}

//! fslink: send text to a TCP endpoint and print the response.
//!
//! Connects, optionally writes a payload, performs a fixed number of
//! single-chunk reads (stopping early when the peer closes), and disconnects.
//! Configuration comes from CLI arguments or a TOML file.

use fslink::config::Config;
use fslink::Session;
use std::io::Write;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    info!(
        host = %config.host,
        port = config.port,
        reads = config.reads,
        "Starting fslink"
    );

    run(&config)
}

fn run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = Session::new();
    session.connect(&config.host, config.port)?;

    if let Some(ref data) = config.data {
        let written = session.write(data)?;
        if written < data.len() {
            info!(written, total = data.len(), "Partial write");
        }
    }

    let mut stdout = std::io::stdout().lock();
    for n in 0..config.reads {
        let chunk = session.read()?;
        if chunk.is_empty() {
            debug!(read = n, "Peer closed connection");
            break;
        }
        stdout.write_all(chunk.text().as_bytes())?;
    }
    stdout.flush()?;

    session.disconnect();
    Ok(())
}

//! Basic usage example
//!
//! Writes a few lines to `./logs/basic.<today>.log` and shuts down cleanly.
//!
//! Run with: cargo run --example basic_usage

use daylog::prelude::*;
use daylog::{info, log};

fn main() -> Result<()> {
    let logger = Logger::create("logs", "basic", 128)?;

    logger.info("Application started")?;
    logger.debug("Loading configuration...")?;
    info!(logger, "Listening on port {}", 8080)?;
    log!(logger, "AUDIT", "user {} signed in", "alice")?;
    logger.raw_write("---- raw separator ----")?;

    let report = logger.close(1000)?;
    println!(
        "closed: drained={} abandoned={} written={}",
        report.drained,
        report.abandoned,
        logger.metrics().written()
    );
    Ok(())
}

//! Per-level files example
//!
//! `ERRO` goes to its own file and is duplicated into the main file with the
//! call site attached; `ACES` goes only to its own file and reports back
//! through a callback.
//!
//! Run with: cargo run --example level_files

use daylog::prelude::*;
use std::sync::Arc;

fn main() -> Result<()> {
    let logger = Logger::builder()
        .directory("logs")
        .base_name("levels")
        .queue_capacity(256)
        .level(ERRO, LevelConfig::new(true, true, true))
        .level(ACES, LevelConfig::new(false, true, false))
        .build()?;

    logger.info("service ready")?;
    logger.error("upstream returned 502")?;

    for path in ["/", "/health", "/orders/7"] {
        logger.access_with_callback(
            format!("GET {}", path),
            Arc::new(|text: &str, stamp: &str| println!("written at {}: {}", stamp, text)),
        )?;
    }

    logger.close(1000)?;
    Ok(())
}

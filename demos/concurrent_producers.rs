//! Concurrent producers example
//!
//! Several threads share one logger through an `Arc`. The small queue makes
//! producers wait on the writer; the metrics show how often that happened.
//!
//! Run with: cargo run --example concurrent_producers

use daylog::prelude::*;
use std::sync::Arc;
use std::thread;

fn main() -> Result<()> {
    let logger = Arc::new(Logger::create("logs", "concurrent", 8)?);

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let logger = Arc::clone(&logger);
            thread::spawn(move || -> Result<()> {
                for job in 0..1000 {
                    logger.info(format!("worker {} finished job {}", worker, job))?;
                }
                Ok(())
            })
        })
        .collect();

    for handle in handles {
        if let Ok(Err(e)) = handle.join() {
            eprintln!("worker failed: {}", e);
        }
    }

    let report = logger.close(5000)?;
    let metrics = logger.metrics();
    println!(
        "written={} blocked={} abandoned={}",
        metrics.written(),
        metrics.block_events(),
        report.abandoned
    );
    Ok(())
}

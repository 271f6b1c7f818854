//! Drives a batcher with synthetic producers and prints a summary.
//!
//! Settings come from the file named by `BATCHPIPE_CONFIG` (YAML or JSON) if
//! set, then `BATCHPIPE_*` overrides. `BATCHPIPE_ELEMENTS` and
//! `BATCHPIPE_PRODUCERS` size the synthetic load.

use batchpipe::config::{BatcherSettings, DEFAULT_ENV_PREFIX};
use batchpipe::validation::validate;
use batchpipe::{logging, Batcher, Error, ErrorContext};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

fn env_count(key: &str, default: u64) -> Result<u64, Box<dyn std::error::Error>> {
    match std::env::var(key) {
        Ok(raw) => Ok(raw.trim().parse()?),
        Err(_) => Ok(default),
    }
}

/// Sum of `0..elements`, or a configuration error if it does not fit in a `u64`.
fn expected_sum(elements: u64) -> batchpipe::Result<u64> {
    elements
        .saturating_sub(1)
        .checked_mul(elements)
        .map(|product| product / 2)
        .ok_or_else(|| {
            Error::configuration_with_context(
                "element count too large for the checksum",
                ErrorContext::new()
                    .with_field_path("BATCHPIPE_ELEMENTS")
                    .with_details(format!("{} elements", elements))
                    .with_source("demo"),
            )
        })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_tracing();

    let settings = match std::env::var("BATCHPIPE_CONFIG") {
        Ok(path) => BatcherSettings::from_path(&path)?,
        Err(_) => BatcherSettings::default().with_name("demo"),
    }
    .with_env_overrides(DEFAULT_ENV_PREFIX)?;

    let issues = validate(&settings);
    for issue in issues.iter() {
        eprintln!("settings {}", issue);
    }
    if !issues.is_valid() {
        return Err(format!("invalid settings: {}", issues.summary()).into());
    }

    let elements = env_count("BATCHPIPE_ELEMENTS", 1_000_000)?;
    let producers = env_count("BATCHPIPE_PRODUCERS", 4)?.max(1);
    let expected = expected_sum(elements)?;

    let sum = Arc::new(AtomicU64::new(0));
    let consumer_sum = Arc::clone(&sum);
    let batcher = Batcher::create()
        .with_settings(&settings)
        .with_consumer(move |batch| {
            let subtotal: u64 = batch.iter().sum();
            consumer_sum.fetch_add(subtotal, Ordering::Relaxed);
        });

    println!(
        "Running {} with {} worker(s), batch size {}, queue size {}",
        settings.name, settings.workers, settings.batch_size, settings.queue_size
    );

    let started = Instant::now();
    batcher.start(settings.workers)?;

    let handles: Vec<_> = (0..producers)
        .map(|p| {
            let batcher = batcher.clone();
            thread::spawn(move || -> batchpipe::Result<()> {
                let mut adder = batcher.adder();
                let mut value = p;
                while value < elements {
                    adder.add(value)?;
                    value += producers;
                }
                adder.flush()
            })
        })
        .collect();

    for handle in handles {
        handle
            .join()
            .map_err(|_| "producer thread panicked")??;
    }
    batcher.stop();

    let elapsed = started.elapsed();
    let snapshot = batcher.snapshot();

    println!("\n=== Summary ===");
    println!("elements processed: {}", snapshot.elements_processed);
    println!("batches processed:  {}", snapshot.batches_processed);
    println!("batches drained:    {}", snapshot.batches_drained);
    println!("batches failed:     {}", snapshot.batches_failed);
    println!("producer blocked:   {:?}", snapshot.enqueue_wait);
    println!("elapsed:            {:?}", elapsed);
    println!(
        "throughput:         {:.0} elements/sec",
        snapshot.elements_processed as f64 / elapsed.as_secs_f64().max(f64::EPSILON)
    );

    let actual = sum.load(Ordering::Relaxed);
    if actual != expected {
        return Err(format!("checksum mismatch: expected {}, got {}", expected, actual).into());
    }
    println!("checksum:           ok");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_sum() {
        assert_eq!(expected_sum(0).unwrap(), 0);
        assert_eq!(expected_sum(1).unwrap(), 0);
        assert_eq!(expected_sum(5).unwrap(), 10);
        assert_eq!(expected_sum(1_000_000).unwrap(), 499_999_500_000);
    }

    #[test]
    fn test_expected_sum_overflow_is_a_configuration_error() {
        let err = expected_sum(7_000_000_000).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
        assert_eq!(
            err.context().and_then(|c| c.field_path.as_deref()),
            Some("BATCHPIPE_ELEMENTS")
        );
    }
}

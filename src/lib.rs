//! # batchpipe
//!
//! 有界的生产者/消费者批处理管道：多线程添加元素，按批交给工作线程池处理，停止时不丢数据。
//!
//! Bounded producer/consumer batch-processing pipeline for threaded Rust code.
//!
//! ## Overview
//!
//! Producers add elements one at a time through their own [`BatchAdder`]. Full
//! batches go onto a bounded queue and are processed by a fixed pool of
//! worker threads. When the queue is full, producers block, which bounds
//! memory use. [`Batcher::stop`] is a synchronous drain point: everything
//! added before it is processed before it returns.
//!
//! ## Core Guarantees
//!
//! - **No loss, no duplication**: every element added before `stop` reaches
//!   the consumer in exactly one batch
//! - **Backpressure**: producers block while `queue_size` batches are pending
//! - **Isolation**: a consumer that fails or panics affects only its own batch
//! - **Single use**: a stopped batcher refuses to start again
//!
//! ## Quick Start
//!
//! ```rust
//! use batchpipe::Batcher;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//! use std::thread;
//!
//! let seen = Arc::new(AtomicUsize::new(0));
//! let counter = Arc::clone(&seen);
//! let batcher = Batcher::create()
//!     .with_name("quickstart")
//!     .with_batch_size(64)
//!     .with_consumer(move |batch| {
//!         counter.fetch_add(batch.len(), Ordering::Relaxed);
//!     });
//! batcher.start(4)?;
//!
//! let producers: Vec<_> = (0..3)
//!     .map(|p| {
//!         let batcher = batcher.clone();
//!         thread::spawn(move || -> batchpipe::Result<()> {
//!             let mut adder = batcher.adder();
//!             for i in 0..1000 {
//!                 adder.add(p * 1000 + i)?;
//!             }
//!             Ok(())
//!         })
//!     })
//!     .collect();
//! for producer in producers {
//!     producer.join().expect("producer panicked")?;
//! }
//!
//! batcher.stop();
//! assert_eq!(seen.load(Ordering::Relaxed), 3000);
//! # Ok::<(), batchpipe::Error>(())
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`batcher`] | Batcher, batch adders, batches and counters |
//! | [`threads`] | Fixed-size worker pool with interrupt and pending-job recovery |
//! | [`state`] | Monitor-guarded state machine |
//! | [`validation`] | Nested validators with an explicit issue accumulator |
//! | [`registry`] | Explicit keyed object store |
//! | [`config`] | Serde-backed batcher settings and environment overrides |
//! | [`logging`] | Tracing subscriber setup |

pub mod batcher;
pub mod config;
pub mod logging;
pub mod registry;
pub mod state;
pub mod threads;
pub mod validation;

pub use batcher::{Batch, BatchAdder, Batcher, BatcherSnapshot, BatcherState};
pub use config::BatcherSettings;
pub use registry::{InstanceId, Registry};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};

pub mod prelude;

//! 批处理器模块：多生产者分批、工作线程池消费、停止时完整排空。
//!
//! # Batcher Module
//!
//! A [`Batcher`] groups individually added elements into batches and hands
//! completed batches to a pool of worker threads through a bounded queue.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`Batcher`] | Owns the queue, the worker pool and the lifecycle |
//! | [`BatchAdder`] | Per-producer staging buffer created by [`Batcher::adder`] |
//! | [`Batch`] | Ordered group of elements passed to the consumer by value |
//! | [`BatcherSnapshot`] | Counters for enqueued, processed and failed batches |
//!
//! ## Lifecycle
//!
//! `Ready → Running → Stopping → Stopped`. [`Batcher::start`] spawns the
//! workers; [`Batcher::stop`] interrupts them, flushes every adder's partial
//! batch, drains the queue and processes whatever is left on the calling
//! thread, so every element added before `stop` is consumed before it returns.
//! A stopped batcher cannot be restarted.
//!
//! ```rust
//! use batchpipe::Batcher;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let total = Arc::new(AtomicUsize::new(0));
//! let counter = Arc::clone(&total);
//!
//! let batcher = Batcher::create()
//!     .with_name("records")
//!     .with_batch_size(16)
//!     .with_queue_size(4)
//!     .with_consumer(move |batch| {
//!         counter.fetch_add(batch.len(), Ordering::SeqCst);
//!     });
//!
//! batcher.start(2)?;
//! let mut adder = batcher.adder();
//! for record in 0..100 {
//!     adder.add(record)?;
//! }
//! batcher.stop();
//!
//! assert_eq!(total.load(Ordering::SeqCst), 100);
//! # Ok::<(), batchpipe::Error>(())
//! ```

mod adder;
mod batch;
mod stats;

pub use adder::BatchAdder;
pub use batch::Batch;
pub use stats::BatcherSnapshot;

use crate::config::BatcherSettings;
use crate::threads::{Interrupt, WorkerPool};
use crate::validation::{self, ValidationContext, Validator};
use crate::{Error, ErrorContext, Result};
use adder::{lock_slot, Slot};
use crossbeam_channel::{bounded, select, Receiver, SendError, Sender};
use stats::BatcherStats;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, trace, warn};

pub const DEFAULT_BATCH_SIZE: usize = 4096;
pub const DEFAULT_QUEUE_SIZE: usize = 8;
pub const DEFAULT_NAME: &str = "Batcher";

/// Execution phase of a batcher. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatcherState {
    Ready,
    Running,
    Stopping,
    Stopped,
}

impl fmt::Display for BatcherState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

type Predicate<E> = Arc<dyn Fn(&Batch<E>) -> bool + Send + Sync>;
type Consumer<E> = Arc<dyn Fn(Batch<E>) -> std::result::Result<(), String> + Send + Sync>;

struct Config<E> {
    name: String,
    batch_size: usize,
    queue_size: usize,
    batch_full_predicate: Option<Predicate<E>>,
    consumer: Option<Consumer<E>>,
}

impl<E> Clone for Config<E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            batch_size: self.batch_size,
            queue_size: self.queue_size,
            batch_full_predicate: self.batch_full_predicate.clone(),
            consumer: self.consumer.clone(),
        }
    }
}

impl<E> Default for Config<E> {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            queue_size: DEFAULT_QUEUE_SIZE,
            batch_full_predicate: None,
            consumer: None,
        }
    }
}

/// Checks run by `start` before anything is allocated.
struct StartCheck<'a, E> {
    config: &'a Config<E>,
    workers: usize,
}

impl<E> Validator for StartCheck<'_, E> {
    fn on_validate(&self, ctx: &mut ValidationContext) {
        ctx.validate(&BatcherSettings {
            name: self.config.name.clone(),
            batch_size: self.config.batch_size,
            queue_size: self.config.queue_size,
            workers: self.workers,
        });
        ctx.problem_if(self.config.consumer.is_none(), "no consumer configured");
    }

    fn validation_target(&self) -> &str {
        &self.config.name
    }
}

struct Queue<E> {
    tx: Sender<Batch<E>>,
    rx: Receiver<Batch<E>>,
}

struct Lifecycle<E> {
    pool: Option<WorkerPool>,
    adders: Vec<Slot<E>>,
}

/// State shared by the batcher handle, its adders and its workers.
pub(crate) struct Shared<E> {
    config: Config<E>,
    state: crate::state::StateMachine<BatcherState>,
    /// Present only while running.
    queue: RwLock<Option<Queue<E>>>,
    /// Hand-offs that may still put a batch on the queue.
    in_flight: AtomicUsize,
    lifecycle: Mutex<Lifecycle<E>>,
    next_batch_id: AtomicU64,
    stats: BatcherStats,
}

impl<E: Send + 'static> Shared<E> {
    fn new(config: Config<E>) -> Self {
        Self {
            config,
            state: crate::state::StateMachine::new(BatcherState::Ready),
            queue: RwLock::new(None),
            in_flight: AtomicUsize::new(0),
            lifecycle: Mutex::new(Lifecycle {
                pool: None,
                adders: Vec::new(),
            }),
            next_batch_id: AtomicU64::new(0),
            stats: BatcherStats::default(),
        }
    }

    pub(crate) fn new_batch(&self) -> Batch<E> {
        let id = self.next_batch_id.fetch_add(1, Ordering::Relaxed);
        Batch::new(id, self.config.batch_size)
    }

    pub(crate) fn is_full(&self, batch: &Batch<E>) -> bool {
        batch.len() >= self.config.batch_size
            || self
                .config
                .batch_full_predicate
                .as_ref()
                .map_or(false, |full| full(batch))
    }

    fn sender(&self) -> Option<Sender<Batch<E>>> {
        self.queue
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .as_ref()
            .map(|q| q.tx.clone())
    }

    /// Moves the slot's batch onto the queue, blocking while the queue is full.
    pub(crate) fn hand_off(&self, slot: &Mutex<Batch<E>>) -> Result<()> {
        // Counted before the queue is looked up so that `stop` can wait for us.
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let result = self.hand_off_counted(slot);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn hand_off_counted(&self, slot: &Mutex<Batch<E>>) -> Result<()> {
        let tx = match self.sender() {
            Some(tx) => tx,
            None if lock_slot(slot).is_empty() => return Ok(()),
            // The queue is gone but stop has yet to collect the adder slots.
            None if self.state.is(BatcherState::Stopping) => return Ok(()),
            None => {
                return Err(Error::lifecycle_with_context(
                    format!("batcher is {}, batch stays staged", self.state.at()),
                    ErrorContext::new().with_source(self.config.name.clone()),
                ))
            }
        };

        let batch = {
            let mut staged = lock_slot(slot);
            if staged.is_empty() {
                return Ok(());
            }
            std::mem::replace(&mut *staged, self.new_batch())
        };

        trace!(batcher = %self.config.name, batch = batch.id(), elements = batch.len(), "enqueueing batch");
        let started = Instant::now();
        match tx.send(batch) {
            Ok(()) => {
                self.stats.record_enqueued(started.elapsed());
                Ok(())
            }
            Err(SendError(batch)) => {
                lock_slot(slot).restore_front(batch);
                Err(Error::runtime_with_context(
                    "batch queue disconnected",
                    ErrorContext::new().with_source(self.config.name.clone()),
                ))
            }
        }
    }

    /// Worker job: processes batches until the batcher leaves `Running`.
    fn work(&self, batches: &Receiver<Batch<E>>, interrupt: &Interrupt) {
        trace!(batcher = %self.config.name, "processing batches");
        while self.state.is(BatcherState::Running) {
            select! {
                recv(batches) -> batch => match batch {
                    Ok(batch) => self.process(batch, false),
                    Err(_) => break,
                },
                recv(interrupt.signal()) -> _ => break,
            }
        }
        trace!(batcher = %self.config.name, "processor is done");
    }

    fn process(&self, batch: Batch<E>, drained: bool) {
        if batch.is_empty() {
            return;
        }
        let Some(consumer) = self.config.consumer.as_ref() else {
            warn!(batcher = %self.config.name, elements = batch.len(), "no consumer, batch discarded");
            return;
        };

        let (id, elements) = (batch.id(), batch.len());
        trace!(batcher = %self.config.name, batch = id, elements, "processing batch");
        let started = Instant::now();

        match panic::catch_unwind(AssertUnwindSafe(|| consumer(batch))) {
            Ok(Ok(())) => {
                self.stats.record_processed(elements, drained);
                trace!(
                    batcher = %self.config.name,
                    batch = id,
                    elements,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "processed batch"
                );
            }
            Ok(Err(message)) => {
                self.stats.record_failed();
                error!(batcher = %self.config.name, batch = id, elements, error = %message, "unable to process batch");
            }
            Err(payload) => {
                self.stats.record_failed();
                error!(
                    batcher = %self.config.name,
                    batch = id,
                    elements,
                    panic = %panic_message(payload.as_ref()),
                    "unable to process batch"
                );
            }
        }
    }

    /// Removes the queue and returns every batch on it, including batches from
    /// hand-offs that were already past the queue lookup.
    fn take_queue(&self) -> Vec<Batch<E>> {
        let Some(queue) = self.queue.write().unwrap_or_else(|p| p.into_inner()).take() else {
            return Vec::new();
        };
        let Queue { tx, rx } = queue;
        drop(tx);

        let mut remaining: Vec<Batch<E>> = rx.try_iter().collect();
        while self.in_flight.load(Ordering::SeqCst) > 0 {
            if let Ok(batch) = rx.recv_timeout(Duration::from_millis(1)) {
                remaining.push(batch);
            }
        }
        remaining.extend(rx.try_iter());
        remaining
    }

    fn lock_lifecycle(&self) -> MutexGuard<'_, Lifecycle<E>> {
        self.lifecycle.lock().unwrap_or_else(|p| p.into_inner())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Bounded producer/consumer batch pipeline.
///
/// A `Batcher` is a cheap handle: clones share the same queue, workers and
/// state, so a clone can be moved into each producer thread to call
/// [`adder`](Self::adder). The `with_*` methods are builders; each returns a
/// newly configured batcher in the `Ready` state and must be used before
/// [`start`](Self::start).
pub struct Batcher<E: Send + 'static> {
    shared: Arc<Shared<E>>,
}

impl<E: Send + 'static> Clone for Batcher<E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<E: Send + 'static> Default for Batcher<E> {
    fn default() -> Self {
        Self::create()
    }
}

impl<E: Send + 'static> fmt::Debug for Batcher<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Batcher")
            .field("name", &self.shared.config.name)
            .field("batch_size", &self.shared.config.batch_size)
            .field("queue_size", &self.shared.config.queue_size)
            .field("state", &self.state())
            .finish()
    }
}

impl<E: Send + 'static> Batcher<E> {
    /// A batcher with default settings (batch size 4096, queue size 8) and no consumer.
    pub fn create() -> Self {
        Self::from_config(Config::default())
    }

    fn from_config(config: Config<E>) -> Self {
        Self {
            shared: Arc::new(Shared::new(config)),
        }
    }

    fn reconfigure(self, apply: impl FnOnce(&mut Config<E>)) -> Self {
        if self.state() != BatcherState::Ready {
            warn!(batcher = %self.shared.config.name, state = %self.state(), "reconfiguring a batcher that was already started");
        }
        let mut config = self.shared.config.clone();
        apply(&mut config);
        Self::from_config(config)
    }

    pub fn with_name(self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.reconfigure(|c| c.name = name)
    }

    pub fn with_batch_size(self, batch_size: usize) -> Self {
        self.reconfigure(|c| c.batch_size = batch_size)
    }

    pub fn with_queue_size(self, queue_size: usize) -> Self {
        self.reconfigure(|c| c.queue_size = queue_size)
    }

    /// Extra condition, checked after every add, that hands a batch off before
    /// it reaches the batch size.
    pub fn with_batch_full_predicate<P>(self, predicate: P) -> Self
    where
        P: Fn(&Batch<E>) -> bool + Send + Sync + 'static,
    {
        self.reconfigure(|c| c.batch_full_predicate = Some(Arc::new(predicate)))
    }

    /// Code to run once per batch. A panic is caught and reported; the worker
    /// carries on with the next batch.
    ///
    /// The consumer may call [`adder`](Self::adder) on its own batcher, but
    /// must not call [`stop`](Self::stop): a worker would wait on itself.
    pub fn with_consumer<F>(self, consumer: F) -> Self
    where
        F: Fn(Batch<E>) + Send + Sync + 'static,
    {
        self.reconfigure(|c| {
            c.consumer = Some(Arc::new(move |batch| {
                consumer(batch);
                Ok(())
            }))
        })
    }

    /// Like [`with_consumer`](Self::with_consumer), for consumers that report failure with an error.
    pub fn with_fallible_consumer<F, Er>(self, consumer: F) -> Self
    where
        F: Fn(Batch<E>) -> std::result::Result<(), Er> + Send + Sync + 'static,
        Er: fmt::Display,
    {
        self.reconfigure(|c| {
            c.consumer = Some(Arc::new(move |batch| {
                consumer(batch).map_err(|e| e.to_string())
            }))
        })
    }

    /// Applies name, batch size and queue size; `workers` is passed to [`start`](Self::start).
    pub fn with_settings(self, settings: &BatcherSettings) -> Self {
        let settings = settings.clone();
        self.reconfigure(|c| {
            c.name = settings.name;
            c.batch_size = settings.batch_size;
            c.queue_size = settings.queue_size;
        })
    }

    pub fn name(&self) -> &str {
        &self.shared.config.name
    }

    pub fn batch_size(&self) -> usize {
        self.shared.config.batch_size
    }

    pub fn queue_size(&self) -> usize {
        self.shared.config.queue_size
    }

    pub fn state(&self) -> BatcherState {
        self.shared.state.at()
    }

    pub fn is_running(&self) -> bool {
        self.shared.state.is(BatcherState::Running)
    }

    pub fn snapshot(&self) -> BatcherSnapshot {
        self.shared.stats.snapshot()
    }

    /// A new staging buffer for one producer, registered for the shutdown flush.
    pub fn adder(&self) -> BatchAdder<E> {
        let mut lifecycle = self.shared.lock_lifecycle();
        // Forget adders that were dropped with nothing staged.
        lifecycle
            .adders
            .retain(|slot| Arc::strong_count(slot) > 1 || !lock_slot(slot).is_empty());

        let slot: Slot<E> = Arc::new(Mutex::new(self.shared.new_batch()));
        lifecycle.adders.push(Arc::clone(&slot));
        BatchAdder::new(Arc::clone(&self.shared), slot)
    }

    /// Starts `workers` worker threads. Starting a running batcher does nothing.
    ///
    /// Fails with a validation error if the configuration is unusable (the
    /// batcher stays `Ready`), and with a lifecycle error if the batcher was
    /// already stopped.
    pub fn start(&self, workers: usize) -> Result<()> {
        let mut lifecycle = self.shared.lock_lifecycle();
        let name = &self.shared.config.name;

        match self.shared.state.at() {
            BatcherState::Ready => {}
            BatcherState::Running => {
                debug!(batcher = %name, "already running");
                return Ok(());
            }
            state @ (BatcherState::Stopping | BatcherState::Stopped) => {
                return Err(Error::lifecycle_with_context(
                    "Cannot restart a Batcher, create a new one instead",
                    ErrorContext::new()
                        .with_details(format!("state: {}", state))
                        .with_source(name.clone()),
                ));
            }
        }

        let issues = validation::validate(&StartCheck {
            config: &self.shared.config,
            workers,
        });
        if !issues.is_valid() {
            return Err(Error::validation(
                format!("{}: {}", name, issues.summary()),
                issues,
            ));
        }

        let pool = WorkerPool::new(format!("{}-Batcher", name), workers)?;
        let (tx, rx) = bounded(self.shared.config.queue_size);
        *self.shared.queue.write().unwrap_or_else(|p| p.into_inner()) = Some(Queue {
            tx,
            rx: rx.clone(),
        });

        // Workers loop while Running, so the transition must precede submission.
        if !self.shared.state.transition(BatcherState::Ready, BatcherState::Running) {
            return Ok(());
        }
        for _ in 0..workers {
            let shared = Arc::clone(&self.shared);
            let batches = rx.clone();
            pool.submit(move |interrupt| shared.work(&batches, interrupt))?;
        }
        lifecycle.pool = Some(pool);

        info!(
            batcher = %name,
            workers,
            batch_size = self.shared.config.batch_size,
            queue_size = self.shared.config.queue_size,
            "started"
        );
        Ok(())
    }

    /// Stops the workers and processes everything that was added, blocking
    /// until done.
    ///
    /// Batches still queued and every adder's partial batch are processed on
    /// the calling thread. Calling `stop` on a batcher that is not running does
    /// nothing; that includes a batcher another thread is already stopping.
    pub fn stop(&self) {
        let name = &self.shared.config.name;

        // The lifecycle lock is released while workers are joined and
        // batches are processed, so a consumer may still call `adder`.
        let pool = {
            let mut lifecycle = self.shared.lock_lifecycle();
            if !self
                .shared
                .state
                .transition(BatcherState::Running, BatcherState::Stopping)
            {
                debug!(batcher = %name, state = %self.state(), "stop ignored, not running");
                return;
            }
            lifecycle.pool.take()
        };
        debug!(batcher = %name, "stopping");

        let pending = match pool {
            Some(pool) => {
                let pending = pool.shutdown_now();
                pool.await_termination();
                pending
            }
            None => Vec::new(),
        };
        debug!(batcher = %name, pending = pending.len(), "workers stopped");
        for job in pending {
            job.run();
        }

        let mut remaining = self.shared.take_queue();
        {
            let mut lifecycle = self.shared.lock_lifecycle();
            for slot in &lifecycle.adders {
                let mut staged = lock_slot(slot);
                if !staged.is_empty() {
                    let partial = std::mem::replace(&mut *staged, self.shared.new_batch());
                    remaining.push(partial);
                }
            }
            lifecycle.adders.retain(|slot| Arc::strong_count(slot) > 1);
        }

        debug!(batcher = %name, remaining = remaining.len(), "processing remaining batches");
        for batch in remaining {
            self.shared.process(batch, true);
        }

        self.shared.state.transition_to(BatcherState::Stopped);
        let snapshot = self.snapshot();
        info!(
            batcher = %name,
            batches = snapshot.batches_processed,
            elements = snapshot.elements_processed,
            failed = snapshot.batches_failed,
            drained = snapshot.batches_drained,
            "stopped"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counting(batch_size: usize) -> (Batcher<u32>, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let elements = Arc::new(AtomicUsize::new(0));
        let batches = Arc::new(AtomicUsize::new(0));
        let (e, b) = (Arc::clone(&elements), Arc::clone(&batches));
        let batcher = Batcher::create()
            .with_name("unit")
            .with_batch_size(batch_size)
            .with_queue_size(2)
            .with_consumer(move |batch: Batch<u32>| {
                e.fetch_add(batch.len(), Ordering::SeqCst);
                b.fetch_add(1, Ordering::SeqCst);
            });
        (batcher, elements, batches)
    }

    #[test]
    fn test_builder_returns_configured_copy() {
        let batcher: Batcher<u32> = Batcher::create();
        assert_eq!(batcher.name(), DEFAULT_NAME);
        assert_eq!(batcher.batch_size(), DEFAULT_BATCH_SIZE);
        assert_eq!(batcher.queue_size(), DEFAULT_QUEUE_SIZE);

        let configured = batcher.with_name("x").with_batch_size(3).with_queue_size(5);
        assert_eq!(configured.name(), "x");
        assert_eq!(configured.batch_size(), 3);
        assert_eq!(configured.queue_size(), 5);
        assert_eq!(configured.state(), BatcherState::Ready);
    }

    #[test]
    fn test_lifecycle_states() {
        let (batcher, _, _) = counting(4);
        assert_eq!(batcher.state(), BatcherState::Ready);
        batcher.start(1).unwrap();
        assert!(batcher.is_running());
        batcher.stop();
        assert_eq!(batcher.state(), BatcherState::Stopped);
        // second stop is a no-op
        batcher.stop();
        assert_eq!(batcher.state(), BatcherState::Stopped);
    }

    #[test]
    fn test_stop_before_start_does_nothing() {
        let (batcher, _, _) = counting(4);
        batcher.stop();
        assert_eq!(batcher.state(), BatcherState::Ready);
        batcher.start(1).unwrap();
        batcher.stop();
    }

    #[test]
    fn test_missing_consumer_fails_validation() {
        let batcher: Batcher<u32> = Batcher::create().with_name("no-consumer");
        let err = batcher.start(2).unwrap_err();
        let issues = err.issues().expect("validation error");
        assert_eq!(issues.problems().count(), 1);
        assert_eq!(batcher.state(), BatcherState::Ready);
    }

    #[test]
    fn test_invalid_sizes_fail_validation() {
        let (batcher, _, _) = counting(0);
        let err = batcher.with_queue_size(0).start(0).unwrap_err();
        assert_eq!(err.issues().map(|i| i.problems().count()), Some(3));
    }

    #[test]
    fn test_partial_batches_are_drained_on_stop() {
        let (batcher, elements, batches) = counting(10);
        batcher.start(2).unwrap();
        let mut a = batcher.adder();
        let mut b = batcher.adder();
        for i in 0..7 {
            a.add(i).unwrap();
        }
        for i in 0..3 {
            b.add(i).unwrap();
        }
        batcher.stop();
        assert_eq!(elements.load(Ordering::SeqCst), 10);
        assert_eq!(batches.load(Ordering::SeqCst), 2);
        assert_eq!(batcher.snapshot().batches_drained, 2);
    }

    #[test]
    fn test_dropped_adder_flushes_while_running() {
        let (batcher, elements, _) = counting(100);
        batcher.start(1).unwrap();
        {
            let mut adder = batcher.adder();
            adder.add(1).unwrap();
            adder.add(2).unwrap();
        }
        assert_eq!(batcher.snapshot().batches_enqueued, 1);
        batcher.stop();
        assert_eq!(elements.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_adder_registrations_are_pruned() {
        let (batcher, _, _) = counting(8);
        for _ in 0..10 {
            drop(batcher.adder());
        }
        let _kept = batcher.adder();
        assert_eq!(batcher.shared.lock_lifecycle().adders.len(), 1);
    }

    #[test]
    fn test_add_before_start_keeps_elements_staged() {
        let (batcher, elements, batches) = counting(2);
        let mut adder = batcher.adder();
        adder.add(1).unwrap();
        assert!(adder.add(2).unwrap_err().is_lifecycle());
        assert_eq!(adder.staged(), 2);

        batcher.start(1).unwrap();
        adder.flush().unwrap();
        assert_eq!(adder.staged(), 0);
        batcher.stop();
        assert_eq!(elements.load(Ordering::SeqCst), 2);
        assert_eq!(batches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_panic_message_extraction() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        let payload: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "add called on a Stopped batcher")]
    fn test_add_after_stop_asserts() {
        let (batcher, _, _) = counting(4);
        let mut adder = batcher.adder();
        batcher.start(1).unwrap();
        batcher.stop();
        let _ = adder.add(1);
    }
}

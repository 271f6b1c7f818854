//! Per-producer staging buffer.

use super::{Batch, BatcherState, Shared};
use crate::{Error, ErrorContext, Result};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::warn;

pub(crate) type Slot<E> = Arc<Mutex<Batch<E>>>;

pub(crate) fn lock_slot<E>(slot: &Mutex<Batch<E>>) -> MutexGuard<'_, Batch<E>> {
    slot.lock().unwrap_or_else(|p| p.into_inner())
}

/// Stages elements for one producer and hands full batches to the batcher.
///
/// An adder belongs to a single producer: `add` takes `&mut self`, so it
/// cannot be shared between threads, but it can be moved into the thread that
/// uses it. The staged batch is only visible to other threads through the
/// batcher's shutdown flush, so `add` never contends with other producers;
/// shared state is touched only when a batch is handed off.
///
/// Dropping an adder hands off its partial batch if the batcher is running;
/// otherwise the batch stays registered and [`Batcher::stop`](super::Batcher::stop)
/// flushes it.
pub struct BatchAdder<E: Send + 'static> {
    shared: Arc<Shared<E>>,
    slot: Slot<E>,
}

impl<E: Send + 'static> BatchAdder<E> {
    pub(crate) fn new(shared: Arc<Shared<E>>, slot: Slot<E>) -> Self {
        Self { shared, slot }
    }

    /// Adds `element` to the staged batch, handing the batch off when full.
    ///
    /// Hand-off blocks while the batcher's queue is full. Before the batcher is
    /// started a full batch cannot be handed off: an error is returned and the
    /// elements stay staged.
    ///
    /// # Panics
    ///
    /// In debug builds, if the batcher is stopping or stopped. Release builds
    /// return a lifecycle error instead.
    pub fn add(&mut self, element: E) -> Result<()> {
        let full = {
            // State is read under the slot lock: `stop` enters Stopping before
            // it collects any slot, so a push either precedes the collection
            // or is rejected here.
            let mut batch = lock_slot(&self.slot);
            let state = self.shared.state.at();
            if matches!(state, BatcherState::Stopping | BatcherState::Stopped) {
                drop(batch);
                if cfg!(debug_assertions) {
                    panic!("{}: add called on a {:?} batcher", self.shared.config.name, state);
                }
                return Err(Error::lifecycle_with_context(
                    format!("cannot add to a {:?} batcher", state),
                    ErrorContext::new().with_source(self.shared.config.name.clone()),
                ));
            }
            batch.push(element);
            self.shared.is_full(&batch)
        };
        if full {
            self.flush()?;
        }
        Ok(())
    }

    /// Hands the staged batch to the queue now, even if it is not full.
    /// Flushing an empty adder does nothing.
    pub fn flush(&mut self) -> Result<()> {
        self.shared.hand_off(&self.slot)
    }

    /// Number of elements staged and not yet handed off.
    pub fn staged(&self) -> usize {
        lock_slot(&self.slot).len()
    }
}

impl<E: Send + 'static> Drop for BatchAdder<E> {
    fn drop(&mut self) {
        if self.staged() == 0 || !self.shared.state.is(BatcherState::Running) {
            return;
        }
        if let Err(e) = self.flush() {
            warn!(
                batcher = %self.shared.config.name,
                staged = self.staged(),
                error = %e,
                "unable to flush dropped adder"
            );
        }
    }
}

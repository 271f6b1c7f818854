//! Monitor-guarded state machine.
//!
//! [`StateMachine`] holds a single `Copy` state behind a mutex and wakes
//! waiters through a condition variable whenever the state changes.

use std::fmt::Debug;
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::debug;

/// Outcome of waiting for a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeState {
    Completed,
    TimedOut,
}

type Receiver<S> = Box<dyn Fn(S) + Send + Sync>;

pub struct StateMachine<S> {
    at: Mutex<S>,
    changed: Condvar,
    receiver: Option<Receiver<S>>,
}

impl<S> StateMachine<S>
where
    S: Copy + Eq + Debug,
{
    pub fn new(initial: S) -> Self {
        Self {
            at: Mutex::new(initial),
            changed: Condvar::new(),
            receiver: None,
        }
    }

    /// Calls `receiver` with every new state, while the state lock is held.
    pub fn with_receiver(mut self, receiver: impl Fn(S) + Send + Sync + 'static) -> Self {
        self.receiver = Some(Box::new(receiver));
        self
    }

    pub fn at(&self) -> S {
        *self.lock()
    }

    pub fn is(&self, state: S) -> bool {
        *self.lock() == state
    }

    pub fn is_not(&self, state: S) -> bool {
        !self.is(state)
    }

    pub fn matches(&self, predicate: impl FnOnce(S) -> bool) -> bool {
        predicate(*self.lock())
    }

    /// Moves to `to` only if the current state is `from`.
    pub fn transition(&self, from: S, to: S) -> bool {
        let mut at = self.lock();
        if *at == from {
            self.set(&mut at, to);
            true
        } else {
            false
        }
    }

    /// Moves to `to` unconditionally and returns the prior state.
    pub fn transition_to(&self, to: S) -> S {
        let mut at = self.lock();
        self.set(&mut at, to)
    }

    pub fn wait_for(&self, state: S, maximum_wait: Duration) -> WakeState {
        self.wait_until(|s| s == state, maximum_wait)
    }

    pub fn wait_for_not(&self, state: S, maximum_wait: Duration) -> WakeState {
        self.wait_until(|s| s != state, maximum_wait)
    }

    /// Blocks until `predicate` holds for the current state or `maximum_wait` elapses.
    pub fn wait_until(&self, predicate: impl Fn(S) -> bool, maximum_wait: Duration) -> WakeState {
        let deadline = Instant::now().checked_add(maximum_wait);
        let mut at = self.lock();
        loop {
            if predicate(*at) {
                return WakeState::Completed;
            }
            let remaining = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return WakeState::TimedOut;
                    }
                    deadline - now
                }
                // Effectively unbounded
                None => Duration::from_secs(u32::MAX as u64),
            };
            at = match self.changed.wait_timeout(at, remaining) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
    }

    fn set(&self, at: &mut MutexGuard<'_, S>, to: S) -> S {
        let prior = **at;
        **at = to;
        debug!(from = ?prior, to = ?to, "state transition");
        self.changed.notify_all();
        if let Some(receiver) = &self.receiver {
            receiver(to);
        }
        prior
    }

    fn lock(&self) -> MutexGuard<'_, S> {
        // The guarded value is a plain Copy state, so a poisoned lock is still consistent.
        self.at.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

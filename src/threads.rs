//! Fixed-size pool of named worker threads.
//!
//! Jobs receive an [`Interrupt`] handle. Shutting the pool down with
//! [`WorkerPool::shutdown_now`] trips the interrupt for every running job and
//! hands back the jobs no worker had picked up yet, so the caller decides
//! whether to run or discard them.

use crate::{Error, ErrorContext, Result};
use crossbeam_channel::{select, unbounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, trace};

pub type Job = Box<dyn FnOnce(&Interrupt) + Send + 'static>;

/// Cancellation handle shared by all jobs of one pool.
#[derive(Clone, Debug)]
pub struct Interrupt {
    flag: Arc<AtomicBool>,
    signal: Receiver<()>,
}

impl Interrupt {
    pub fn is_interrupted(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// A channel that never carries a value and disconnects when the pool is
    /// interrupted; use it in `select!` next to the job's own channels.
    pub fn signal(&self) -> &Receiver<()> {
        &self.signal
    }
}

/// A job that was submitted but never started before shutdown.
pub struct PendingJob {
    job: Job,
    interrupt: Interrupt,
}

impl PendingJob {
    /// Runs the job on the calling thread. Its interrupt is already tripped.
    pub fn run(self) {
        (self.job)(&self.interrupt)
    }
}

pub struct WorkerPool {
    name: String,
    jobs: Mutex<Option<Sender<Job>>>,
    backlog: Receiver<Job>,
    interrupt_tx: Mutex<Option<Sender<()>>>,
    interrupt: Interrupt,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Spawns `threads` workers named `{name}-{index}`.
    pub fn new(name: impl Into<String>, threads: usize) -> Result<Self> {
        let name = name.into();
        if threads == 0 {
            return Err(Error::configuration_with_context(
                "worker pool needs at least one thread",
                ErrorContext::new()
                    .with_field_path("threads")
                    .with_source("worker_pool"),
            ));
        }

        let (jobs_tx, jobs_rx) = unbounded::<Job>();
        let (interrupt_tx, interrupt_rx) = crossbeam_channel::bounded::<()>(0);
        let interrupt = Interrupt {
            flag: Arc::new(AtomicBool::new(false)),
            signal: interrupt_rx,
        };

        let pool = Self {
            name,
            jobs: Mutex::new(Some(jobs_tx)),
            backlog: jobs_rx.clone(),
            interrupt_tx: Mutex::new(Some(interrupt_tx)),
            interrupt: interrupt.clone(),
            handles: Mutex::new(Vec::with_capacity(threads)),
        };

        for index in 0..threads {
            let jobs = jobs_rx.clone();
            let interrupt = interrupt.clone();
            let handle = thread::Builder::new()
                .name(format!("{}-{}", pool.name, index))
                .spawn(move || worker_loop(jobs, interrupt))?;
            pool.lock_handles().push(handle);
        }

        debug!(pool = %pool.name, threads, "worker pool started");
        Ok(pool)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn threads(&self) -> usize {
        self.lock_handles().len()
    }

    pub fn is_shutdown(&self) -> bool {
        self.interrupt.is_interrupted()
    }

    pub fn submit(&self, job: impl FnOnce(&Interrupt) + Send + 'static) -> Result<()> {
        let jobs = self.jobs.lock().unwrap_or_else(|p| p.into_inner());
        match jobs.as_ref() {
            Some(tx) if tx.send(Box::new(job)).is_ok() => Ok(()),
            _ => Err(Error::lifecycle_with_context(
                "worker pool is shut down",
                ErrorContext::new().with_source(self.name.clone()),
            )),
        }
    }

    /// Interrupts running jobs, stops accepting new ones and returns the jobs
    /// that no worker had dequeued.
    pub fn shutdown_now(&self) -> Vec<PendingJob> {
        // Closing submission first means nothing can arrive after the drain below.
        self.jobs.lock().unwrap_or_else(|p| p.into_inner()).take();

        self.interrupt.flag.store(true, Ordering::Release);
        self.interrupt_tx
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .take();

        let pending: Vec<PendingJob> = self
            .backlog
            .try_iter()
            .map(|job| PendingJob {
                job,
                interrupt: self.interrupt.clone(),
            })
            .collect();

        debug!(pool = %self.name, pending = pending.len(), "worker pool shut down");
        pending
    }

    /// Joins every worker. A worker that panicked is reported and skipped.
    pub fn await_termination(&self) {
        let handles: Vec<_> = self.lock_handles().drain(..).collect();
        for handle in handles {
            let thread_name = handle.thread().name().unwrap_or("<unnamed>").to_string();
            if handle.join().is_err() {
                error!(pool = %self.name, thread = %thread_name, "worker thread panicked");
            }
        }
        trace!(pool = %self.name, "all workers terminated");
    }

    fn lock_handles(&self) -> std::sync::MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.handles.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Detach rather than join: a job that ignores its interrupt must not hang the owner.
        if !self.is_shutdown() {
            self.shutdown_now();
        }
    }
}

fn worker_loop(jobs: Receiver<Job>, interrupt: Interrupt) {
    loop {
        if interrupt.is_interrupted() {
            break;
        }
        select! {
            recv(jobs) -> job => match job {
                Ok(job) => job(&interrupt),
                Err(_) => break,
            },
            recv(interrupt.signal()) -> _ => break,
        }
    }
}

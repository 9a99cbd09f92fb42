//! Fixed-size worker pool.
//!
//! Workers pull boxed jobs off one shared channel. Jobs may block (user
//! transaction bodies sleep); the pool makes no attempt to preempt them.
//! Dropping the pool closes the channel and joins every worker, so any job
//! already picked up runs to completion first.

use crossbeam_channel::{unbounded, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::debug;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// A fixed set of threads executing submitted closures.
pub struct WorkerPool {
    jobs: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
    live: Arc<AtomicBool>,
}

impl WorkerPool {
    /// Spawn `threads` workers.
    pub fn new(threads: usize) -> Self {
        let (jobs, intake) = unbounded::<Job>();
        let live = Arc::new(AtomicBool::new(true));
        let workers = (0..threads.max(1))
            .map(|i| {
                let intake = intake.clone();
                std::thread::Builder::new()
                    .name(format!("lockstep-worker-{i}"))
                    .spawn(move || {
                        while let Ok(job) = intake.recv() {
                            job();
                        }
                    })
                    .expect("spawn worker thread")
            })
            .collect();
        WorkerPool {
            jobs: Some(jobs),
            workers,
            live,
        }
    }

    /// Default worker count: twice the logical CPUs.
    pub fn default_threads() -> usize {
        std::thread::available_parallelism()
            .map(|n| n.get() * 2)
            .unwrap_or(8)
    }

    /// Schedule a closure on some worker. Returns false if the pool has
    /// shut down, in which case the job is dropped.
    pub fn run_task(&self, job: impl FnOnce() + Send + 'static) -> bool {
        match &self.jobs {
            Some(jobs) => jobs.send(Box::new(job)).is_ok(),
            None => false,
        }
    }

    /// True while the pool accepts work.
    pub fn active(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    /// Number of worker threads.
    pub fn threads(&self) -> usize {
        self.workers.len()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.live.store(false, Ordering::Release);
        // Closing the channel lets idle workers fall out of recv.
        self.jobs.take();
        debug!(workers = self.workers.len(), "joining worker pool");
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}

//! The client-facing transaction processor.

use crate::pool::WorkerPool;
use crate::scheduler::Scheduler;
use crossbeam_channel::{unbounded, Receiver, Sender};
use lockstep_core::error::{Error, Result};
use lockstep_core::txn::{Program, Txn};
use lockstep_core::types::{CcMode, TxnId};
use lockstep_storage::TxnStore;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::debug;

/// Id assignment and request enqueue share one critical section so that
/// ids are strictly increasing in submission order.
struct SubmitState {
    next_id: u64,
    requests: Sender<Txn>,
}

/// Executes submitted transactions under a concurrency-control regime
/// chosen at construction.
///
/// A processor owns a backing [`TxnStore`], a worker pool, and one
/// scheduler thread that runs until the processor is dropped. Submissions
/// and result retrieval may come from any thread.
///
/// # Example
///
/// ```ignore
/// use lockstep_engine::Processor;
/// use lockstep_core::types::CcMode;
///
/// let processor = Processor::new(CcMode::SharedLocking);
/// processor.submit(my_program)?;
/// let txn = processor.next_result()?;
/// assert!(txn.status().is_final());
/// ```
pub struct Processor {
    submit: Mutex<SubmitState>,
    results_rx: Receiver<Txn>,
    store: Arc<TxnStore>,
    live: Arc<AtomicBool>,
    scheduler: Option<JoinHandle<()>>,
}

impl Processor {
    /// Construct a processor with the default worker count.
    pub fn new(mode: CcMode) -> Self {
        Self::with_workers(mode, WorkerPool::default_threads())
    }

    /// Construct a processor with an explicit worker count.
    pub fn with_workers(mode: CcMode, workers: usize) -> Self {
        let store = Arc::new(TxnStore::new());
        let live = Arc::new(AtomicBool::new(true));
        let (requests_tx, requests_rx) = unbounded();
        let (results_tx, results_rx) = unbounded();

        let scheduler = Scheduler::new(
            mode,
            Arc::clone(&store),
            WorkerPool::new(workers),
            Arc::clone(&live),
            requests_tx.clone(),
            requests_rx,
            results_tx,
        );
        let handle = std::thread::Builder::new()
            .name("lockstep-scheduler".into())
            .spawn(move || scheduler.run())
            .expect("spawn scheduler thread");

        debug!(%mode, workers, "processor started");
        Processor {
            submit: Mutex::new(SubmitState {
                next_id: 1,
                requests: requests_tx,
            }),
            results_rx,
            store,
            live,
            scheduler: Some(handle),
        }
    }

    /// Enqueue a transaction. Assigns and returns its unique id.
    ///
    /// Non-blocking; the transaction runs when the scheduler admits it.
    pub fn submit(&self, program: impl Program) -> Result<TxnId> {
        let mut txn = Txn::new(program);
        let mut submit = self.submit.lock();
        let id = TxnId::new(submit.next_id);
        submit.next_id += 1;
        txn.set_id(id);
        submit.requests.send(txn).map_err(|_| Error::Shutdown)?;
        Ok(id)
    }

    /// Block until some transaction finishes and return it.
    ///
    /// Results are not FIFO across transactions; whichever finishes first
    /// comes out first.
    pub fn next_result(&self) -> Result<Txn> {
        self.results_rx.recv().map_err(|_| Error::Shutdown)
    }

    /// The processor's backing store. Reads are safe from any thread;
    /// writing around the processor defeats its concurrency control.
    pub fn storage(&self) -> &Arc<TxnStore> {
        &self.store
    }
}

impl Drop for Processor {
    fn drop(&mut self) {
        self.live.store(false, Ordering::Release);
        if let Some(handle) = self.scheduler.take() {
            let _ = handle.join();
        }
        debug!("processor stopped");
    }
}

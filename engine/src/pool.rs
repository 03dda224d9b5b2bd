//! Fixed-size pool of engine workers with a shared FIFO request queue.
//!
//! Requests are values carrying a oneshot completion handle. Idle workers
//! pull from a shared receiver; nothing else touches a worker, so each
//! subprocess has exactly one in-flight analysis at any time.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::timeout;

use crate::worker::{EngineWorker, WorkerState};
use crate::{AnalyzeOpts, EngineAnalysis, EngineError, EngineSettings};

const DISPOSE_WAIT: Duration = Duration::from_secs(3);

struct AnalyzeRequest {
    fen: String,
    opts: AnalyzeOpts,
    reply: oneshot::Sender<Result<EngineAnalysis, EngineError>>,
}

struct WorkerSlot {
    id: usize,
    busy: AtomicBool,
    alive: AtomicBool,
}

struct PoolShared {
    queue_len: AtomicUsize,
    active: AtomicUsize,
    alive: AtomicUsize,
    disposed: AtomicBool,
    slots: Vec<WorkerSlot>,
}

/// Snapshot of the pool for observability.
#[derive(Debug, Clone)]
pub struct PoolStatus {
    pub initialized: bool,
    pub worker_count: usize,
    pub active_analyses: usize,
    pub queue_length: usize,
    pub workers: Vec<WorkerStatus>,
}

#[derive(Debug, Clone)]
pub struct WorkerStatus {
    pub id: usize,
    pub ready: bool,
    pub busy: bool,
}

pub struct EnginePool {
    req_tx: mpsc::UnboundedSender<AnalyzeRequest>,
    shared: Arc<PoolShared>,
    settings: EngineSettings,
    handles: Vec<JoinHandle<()>>,
}

impl EnginePool {
    /// Spawn `settings.pool_size` workers. Fails if any worker fails its
    /// handshake; already-spawned workers are torn down.
    pub async fn new(settings: EngineSettings) -> Result<Self, EngineError> {
        let count = settings.pool_size.max(1);
        tracing::info!(workers = count, path = %settings.engine_path, "Initialising engine pool");

        let mut workers = Vec::with_capacity(count);
        for id in 0..count {
            match EngineWorker::spawn(id, &settings).await {
                Ok(worker) => workers.push(worker),
                Err(e) => {
                    for worker in workers {
                        worker.dispose().await;
                    }
                    return Err(e);
                }
            }
        }

        let shared = Arc::new(PoolShared {
            queue_len: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            alive: AtomicUsize::new(count),
            disposed: AtomicBool::new(false),
            slots: (0..count)
                .map(|id| WorkerSlot {
                    id,
                    busy: AtomicBool::new(false),
                    alive: AtomicBool::new(true),
                })
                .collect(),
        });

        let (req_tx, req_rx) = mpsc::unbounded_channel();
        let req_rx = Arc::new(Mutex::new(req_rx));

        let handles = workers
            .into_iter()
            .map(|worker| {
                tokio::spawn(run_worker(
                    worker,
                    req_rx.clone(),
                    shared.clone(),
                    settings.clone(),
                ))
            })
            .collect();

        Ok(Self {
            req_tx,
            shared,
            settings,
            handles,
        })
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Analyse one position through the next idle worker.
    pub async fn analyze(
        &self,
        fen: &str,
        opts: AnalyzeOpts,
    ) -> Result<EngineAnalysis, EngineError> {
        submit(
            self.req_tx.clone(),
            self.shared.clone(),
            fen.to_string(),
            opts,
        )
        .await
    }

    /// Analyse many positions concurrently. Output order matches input
    /// order; completion order does not. `on_progress` fires once per
    /// finished position with (completed, total).
    pub async fn analyze_batch(
        &self,
        positions: &[String],
        opts: AnalyzeOpts,
        mut on_progress: impl FnMut(usize, usize),
    ) -> Result<Vec<EngineAnalysis>, EngineError> {
        let total = positions.len();
        let mut join_set = tokio::task::JoinSet::new();

        for (index, fen) in positions.iter().enumerate() {
            let tx = self.req_tx.clone();
            let shared = self.shared.clone();
            let fen = fen.clone();
            let opts = opts.clone();
            join_set.spawn(async move { (index, submit(tx, shared, fen, opts).await) });
        }

        let mut results: Vec<Option<Result<EngineAnalysis, EngineError>>> =
            (0..total).map(|_| None).collect();
        let mut completed = 0;
        while let Some(joined) = join_set.join_next().await {
            let (index, result) = joined.map_err(|_| EngineError::PoolDisposed)?;
            results[index] = Some(result);
            completed += 1;
            on_progress(completed, total);
        }

        results
            .into_iter()
            .map(|slot| slot.unwrap_or(Err(EngineError::PoolDisposed)))
            .collect()
    }

    pub fn status(&self) -> PoolStatus {
        PoolStatus {
            initialized: true,
            worker_count: self.shared.slots.len(),
            active_analyses: self.shared.active.load(Ordering::Relaxed),
            queue_length: self.shared.queue_len.load(Ordering::Relaxed),
            workers: self
                .shared
                .slots
                .iter()
                .map(|slot| WorkerStatus {
                    id: slot.id,
                    ready: slot.alive.load(Ordering::Relaxed)
                        && !slot.busy.load(Ordering::Relaxed),
                    busy: slot.busy.load(Ordering::Relaxed),
                })
                .collect(),
        }
    }

    /// Reject all queued requests, quit every worker, and kill whatever is
    /// left after the grace period.
    pub async fn dispose(self) {
        let Self {
            req_tx,
            shared,
            handles,
            ..
        } = self;

        tracing::info!("Disposing engine pool");
        shared.disposed.store(true, Ordering::SeqCst);
        drop(req_tx);

        for handle in handles {
            let _ = timeout(DISPOSE_WAIT, handle).await;
        }
    }
}

/// Request helper shared by `analyze` and `analyze_batch`; owns no borrow of
/// the pool so batch tasks can be spawned.
async fn submit(
    tx: mpsc::UnboundedSender<AnalyzeRequest>,
    shared: Arc<PoolShared>,
    fen: String,
    opts: AnalyzeOpts,
) -> Result<EngineAnalysis, EngineError> {
    if shared.disposed.load(Ordering::SeqCst) {
        return Err(EngineError::PoolDisposed);
    }
    if shared.alive.load(Ordering::SeqCst) == 0 {
        return Err(EngineError::PoolExhausted);
    }

    let (reply, rx) = oneshot::channel();
    shared.queue_len.fetch_add(1, Ordering::Relaxed);
    if tx.send(AnalyzeRequest { fen, opts, reply }).is_err() {
        shared.queue_len.fetch_sub(1, Ordering::Relaxed);
        return Err(EngineError::PoolDisposed);
    }

    rx.await.map_err(|_| EngineError::PoolDisposed)?
}

/// Long-lived worker task: pull requests from the shared queue, one at a
/// time, until the queue closes.
async fn run_worker(
    mut worker: EngineWorker,
    req_rx: Arc<Mutex<mpsc::UnboundedReceiver<AnalyzeRequest>>>,
    shared: Arc<PoolShared>,
    settings: EngineSettings,
) {
    let id = worker.id();
    tracing::debug!(worker_id = id, "Pool worker loop started");

    loop {
        let request = {
            let mut rx = req_rx.lock().await;
            rx.recv().await
        };

        let Some(request) = request else {
            break;
        };
        shared.queue_len.fetch_sub(1, Ordering::Relaxed);

        if shared.disposed.load(Ordering::SeqCst) {
            let _ = request.reply.send(Err(EngineError::PoolDisposed));
            continue;
        }

        let slot = &shared.slots[id];
        slot.busy.store(true, Ordering::Relaxed);
        shared.active.fetch_add(1, Ordering::Relaxed);

        let result = worker.analyze(&request.fen, &request.opts).await;
        let failed = worker.state() == WorkerState::Failed;
        let _ = request.reply.send(result);

        shared.active.fetch_sub(1, Ordering::Relaxed);
        slot.busy.store(false, Ordering::Relaxed);

        if failed {
            tracing::warn!(worker_id = id, "Worker failed, attempting replacement");
            match EngineWorker::spawn(id, &settings).await {
                Ok(replacement) => {
                    worker.dispose().await;
                    worker = replacement;
                }
                Err(e) => {
                    tracing::error!(worker_id = id, "Could not replace worker: {}", e);
                    slot.alive.store(false, Ordering::Relaxed);
                    shared.alive.fetch_sub(1, Ordering::SeqCst);
                    worker.dispose().await;
                    return;
                }
            }
        }
    }

    tracing::debug!(worker_id = id, "Pool worker loop exiting");
    worker.dispose().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_reports_all_slots() {
        let shared = PoolShared {
            queue_len: AtomicUsize::new(2),
            active: AtomicUsize::new(1),
            alive: AtomicUsize::new(4),
            disposed: AtomicBool::new(false),
            slots: (0..4)
                .map(|id| WorkerSlot {
                    id,
                    busy: AtomicBool::new(id == 0),
                    alive: AtomicBool::new(true),
                })
                .collect(),
        };

        // Exercise the same mapping `status()` performs.
        let busy: Vec<bool> = shared
            .slots
            .iter()
            .map(|s| s.busy.load(Ordering::Relaxed))
            .collect();
        assert_eq!(busy, vec![true, false, false, false]);
        assert_eq!(shared.queue_len.load(Ordering::Relaxed), 2);
    }
}

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender};
use log::{debug, error, info};

use crate::db::Database;
use crate::error::{ShelverError, WorkerError};
use crate::pipeline::{PipelineConfig, Processor};
use crate::worker::counters::{RunCounters, RunSummary};
use crate::worker::record::DocumentRecord;
use crate::worker::source::PendingSource;

/// A contiguous slice of the pending backlog, processed by one worker.
#[derive(Debug)]
pub struct Batch {
    pub index: usize,
    pub records: Vec<DocumentRecord>,
}

/// Splits the backlog into contiguous batches of at most `size` records,
/// preserving input order. The last batch may be shorter.
///
/// # Panics
/// Panics if `size` is 0.
pub fn partition(records: Vec<DocumentRecord>, size: usize) -> Vec<Batch> {
    assert!(size > 0, "batch size must be > 0");

    let mut batches = Vec::new();
    let mut remaining = records.into_iter();
    let mut index = 0;
    loop {
        let chunk: Vec<DocumentRecord> = remaining.by_ref().take(size).collect();
        if chunk.is_empty() {
            break;
        }
        batches.push(Batch {
            index,
            records: chunk,
        });
        index += 1;
    }
    batches
}

/// Bounded pool of worker threads draining a batch channel.
///
/// Batches are handed out over a bounded crossbeam channel; each worker
/// re-evaluates the time-box guard and the shutdown flag before starting a
/// batch. Counters are shared atomics. The first journal failure any worker
/// hits stops the whole pool and becomes the run's error.
pub struct WorkerPool {
    batch_sender: Sender<Batch>,
    workers: Vec<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
    counters: Arc<RunCounters>,
    first_error: Arc<Mutex<Option<ShelverError>>>,
}

impl WorkerPool {
    /// Spawns the pool.
    ///
    /// # Panics
    /// Panics if `config.worker_count` is 0.
    pub fn new(config: Arc<PipelineConfig>, db: Database, shutdown: Arc<AtomicBool>) -> Self {
        assert!(config.worker_count > 0, "worker_count must be > 0");

        let (batch_sender, batch_receiver) = bounded::<Batch>(config.worker_count * 2);
        let counters = Arc::new(RunCounters::new());
        let first_error: Arc<Mutex<Option<ShelverError>>> = Arc::new(Mutex::new(None));

        let mut workers = Vec::with_capacity(config.worker_count);

        for worker_id in 0..config.worker_count {
            let batch_rx = batch_receiver.clone();
            let shutdown_flag = Arc::clone(&shutdown);
            let worker_counters = Arc::clone(&counters);
            let error_slot = Arc::clone(&first_error);
            let worker_config = Arc::clone(&config);
            let worker_db = db.clone();

            let handle = thread::spawn(move || {
                run_worker(
                    worker_id,
                    batch_rx,
                    shutdown_flag,
                    worker_counters,
                    error_slot,
                    worker_config,
                    worker_db,
                );
            });

            workers.push(handle);
        }

        info!("Started {} workers", workers.len());

        Self {
            batch_sender,
            workers,
            shutdown,
            counters,
            first_error,
        }
    }

    /// Hands a batch to the pool. Blocks while every worker is busy and
    /// the channel is full; errors only when all workers have exited.
    pub fn submit(&self, batch: Batch) -> Result<(), WorkerError> {
        self.batch_sender
            .send(batch)
            .map_err(|_| WorkerError::ChannelClosed)
    }

    /// Closes the batch channel, waits for every worker, and returns the
    /// aggregated summary. A journal failure observed by any worker
    /// surfaces here as the run's error.
    pub fn finish(self) -> Result<RunSummary, ShelverError> {
        // Drop sender to signal workers to exit once the channel drains.
        drop(self.batch_sender);

        for (i, worker) in self.workers.into_iter().enumerate() {
            if let Err(e) = worker.join() {
                error!("Worker {} panicked: {:?}", i, e);
            } else {
                debug!("Worker {} finished", i);
            }
        }

        if let Some(error) = self.first_error.lock().ok().and_then(|mut slot| slot.take()) {
            return Err(error);
        }

        let interrupted = self.shutdown.load(Ordering::Relaxed);
        Ok(self.counters.summary(interrupted))
    }
}

fn run_worker(
    worker_id: usize,
    batch_receiver: Receiver<Batch>,
    shutdown: Arc<AtomicBool>,
    counters: Arc<RunCounters>,
    first_error: Arc<Mutex<Option<ShelverError>>>,
    config: Arc<PipelineConfig>,
    db: Database,
) {
    debug!("Worker {} started", worker_id);

    let processor = Processor::new(&config, db);

    loop {
        if shutdown.load(Ordering::Relaxed) {
            debug!("Worker {} received shutdown signal", worker_id);
            break;
        }

        match batch_receiver.recv_timeout(Duration::from_millis(100)) {
            Ok(batch) => {
                // Time-box guard, re-checked per batch. A batch that started
                // before the cutoff runs to completion.
                if config.cutoff.check_now() {
                    if counters.mark_cutoff() {
                        info!(
                            "Time-box cutoff reached; {} succeeded, {} failed so far. Remaining batches are skipped.",
                            counters.succeeded(),
                            counters.failed()
                        );
                    }
                    debug!(
                        "Worker {} skipping batch {} ({} records) past cutoff",
                        worker_id,
                        batch.index,
                        batch.records.len()
                    );
                    continue;
                }

                debug!(
                    "Worker {} processing batch {} ({} records)",
                    worker_id,
                    batch.index,
                    batch.records.len()
                );

                for record in &batch.records {
                    match processor.process(record) {
                        Ok(outcome) => {
                            if outcome.status.is_success() {
                                counters.record_success();
                            } else {
                                counters.record_failure();
                            }
                        }
                        Err(e) => {
                            // Without the journal the run cannot account for
                            // its work; stop everything.
                            error!(
                                "Worker {}: journal write failed for record {}: {}",
                                worker_id,
                                record.id_hex(),
                                e
                            );
                            if let Ok(mut slot) = first_error.lock() {
                                slot.get_or_insert(ShelverError::Database(e));
                            }
                            shutdown.store(true, Ordering::Relaxed);
                            return;
                        }
                    }
                }
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                continue;
            }
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                debug!("Worker {} batch channel disconnected", worker_id);
                break;
            }
        }
    }

    debug!("Worker {} stopped", worker_id);
}

/// Entry point for one run: fetch the pending backlog, partition it, process
/// it through the bounded pool, and aggregate the result.
pub fn process_backlog(
    db: &Database,
    config: Arc<PipelineConfig>,
    shutdown: Arc<AtomicBool>,
) -> Result<RunSummary, ShelverError> {
    let records = PendingSource::new(db.clone()).fetch()?;
    if records.is_empty() {
        info!("No pending documents; nothing to do");
        return Ok(RunSummary::empty());
    }

    let total = records.len();
    let batches = partition(records, config.batch_size);
    info!(
        "Processing {} documents in {} batches of up to {} ({} workers)",
        total,
        batches.len(),
        config.batch_size,
        config.worker_count
    );

    let pool = WorkerPool::new(Arc::clone(&config), db.clone(), shutdown);
    for batch in batches {
        // A send only fails when every worker has already exited; the
        // cause is picked up from the pool below.
        if pool.submit(batch).is_err() {
            break;
        }
    }

    pool.finish()
}

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use crate::analysis::domain::analyzer::{Analyzer, AnalyzerError};
use crate::pipeline::analyzer_executor::{run_isolated, AnalysisJob, AnalyzerExecutor, AnalyzerRun};

enum WorkerEvent {
    Started {
        slot: usize,
        worker: usize,
        at: Instant,
    },
    Finished {
        slot: usize,
        run: AnalyzerRun,
    },
}

/// Runs analyzers on a bounded pool of worker threads.
///
/// Layout: `job queue → N workers → collector (calling thread)`
///
/// Each analyzer's timeout starts when a worker picks it up. A timed-out
/// analyzer is recorded as failed and its worker is abandoned; a fresh
/// worker takes its place so queued analyzers still run. Returns only once
/// every analyzer has a result or a timeout.
pub struct ThreadedAnalyzerExecutor {
    max_workers: usize,
    timeout: Option<Duration>,
}

impl ThreadedAnalyzerExecutor {
    pub fn new(max_workers: usize, timeout: Option<Duration>) -> Self {
        Self {
            max_workers: max_workers.max(1),
            timeout,
        }
    }
}

impl AnalyzerExecutor for ThreadedAnalyzerExecutor {
    fn execute(&self, analyzers: &[Arc<dyn Analyzer>], job: Arc<AnalysisJob>) -> Vec<AnalyzerRun> {
        let count = analyzers.len();
        if count == 0 {
            return Vec::new();
        }

        let shared: Arc<[Arc<dyn Analyzer>]> = analyzers.to_vec().into();
        let (job_tx, job_rx) = crossbeam_channel::bounded::<usize>(count);
        for slot in 0..count {
            // Capacity equals the job count, so this never blocks.
            let _ = job_tx.send(slot);
        }
        drop(job_tx);

        let (event_tx, event_rx) = crossbeam_channel::unbounded::<WorkerEvent>();
        let mut pool = WorkerPool {
            analyzers: shared,
            job,
            job_rx,
            event_tx,
            handles: Vec::new(),
        };
        for _ in 0..self.max_workers.min(count) {
            pool.spawn();
        }

        let mut runs: Vec<Option<AnalyzerRun>> = (0..count).map(|_| None).collect();
        let mut running: BTreeMap<usize, (usize, Instant)> = BTreeMap::new();
        let mut hung: HashSet<usize> = HashSet::new();
        let mut remaining = count;

        while remaining > 0 {
            let deadline = self.timeout.and_then(|timeout| {
                running.values().map(|(_, at)| *at + timeout).min()
            });
            let event = match deadline {
                Some(deadline) => match event_rx.recv_deadline(deadline) {
                    Ok(event) => Some(event),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => break,
                },
                None => match event_rx.recv() {
                    Ok(event) => Some(event),
                    Err(_) => break,
                },
            };

            match event {
                Some(WorkerEvent::Started { slot, worker, at }) => {
                    running.insert(slot, (worker, at));
                }
                Some(WorkerEvent::Finished { slot, run }) => {
                    // A late result for an analyzer already timed out is dropped.
                    if runs[slot].is_none() {
                        running.remove(&slot);
                        runs[slot] = Some(run);
                        remaining -= 1;
                    }
                }
                None => {
                    let Some(timeout) = self.timeout else {
                        continue;
                    };
                    let now = Instant::now();
                    let expired: Vec<(usize, usize)> = running
                        .iter()
                        .filter(|(_, (_, at))| now >= *at + timeout)
                        .map(|(slot, (worker, _))| (*slot, *worker))
                        .collect();
                    for (slot, worker) in expired {
                        running.remove(&slot);
                        let name = pool.analyzers[slot].name().to_string();
                        log::warn!("Analyzer '{name}' timed out after {timeout:?}, abandoning worker {worker}");
                        runs[slot] = Some(AnalyzerRun {
                            name,
                            outcome: Err(AnalyzerError::TimedOut(timeout)),
                            duration: timeout,
                        });
                        remaining -= 1;
                        hung.insert(worker);
                        pool.spawn();
                    }
                }
            }
        }

        pool.join_idle(&hung);

        runs.into_iter()
            .enumerate()
            .map(|(slot, run)| {
                run.unwrap_or_else(|| AnalyzerRun {
                    name: analyzers[slot].name().to_string(),
                    outcome: Err(AnalyzerError::Failed("worker pool shut down".to_string())),
                    duration: Duration::ZERO,
                })
            })
            .collect()
    }
}

struct WorkerPool {
    analyzers: Arc<[Arc<dyn Analyzer>]>,
    job: Arc<AnalysisJob>,
    job_rx: Receiver<usize>,
    event_tx: Sender<WorkerEvent>,
    handles: Vec<std::thread::JoinHandle<()>>,
}

impl WorkerPool {
    fn spawn(&mut self) {
        let worker = self.handles.len();
        let analyzers = Arc::clone(&self.analyzers);
        let job = Arc::clone(&self.job);
        let job_rx = self.job_rx.clone();
        let event_tx = self.event_tx.clone();

        self.handles.push(std::thread::spawn(move || {
            for slot in job_rx {
                let started = WorkerEvent::Started {
                    slot,
                    worker,
                    at: Instant::now(),
                };
                if event_tx.send(started).is_err() {
                    break;
                }
                let run = run_isolated(analyzers[slot].as_ref(), &job);
                if event_tx.send(WorkerEvent::Finished { slot, run }).is_err() {
                    break;
                }
            }
        }));
    }

    /// Joins every worker except the hung ones, which are left detached.
    /// The job queue is drained by now, so the others exit promptly.
    fn join_idle(self, hung: &HashSet<usize>) {
        for (worker, handle) in self.handles.into_iter().enumerate() {
            if hung.contains(&worker) {
                continue;
            }
            if handle.join().is_err() {
                log::warn!("Analyzer worker {worker} panicked outside an analyzer");
            }
        }
    }
}

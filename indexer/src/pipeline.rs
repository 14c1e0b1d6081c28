use crate::error::IndexError;
use crate::source::DocumentSource;
use serde::Serialize;
use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};
use textdex_core::tokenizer::tokenize;
use textdex_core::{DocId, IndexStore};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Upper bound on worker threads per indexing call.
    pub workers: usize,
    /// How long to wait for the other workers once one has failed.
    pub grace_period: Duration,
}

impl PipelineConfig {
    pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

    pub fn new(workers: usize) -> Self {
        Self { workers, grace_period: Self::DEFAULT_GRACE_PERIOD }
    }

    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndexStats {
    pub elapsed_secs: f64,
    pub throughput_mbps: f64,
    pub total_bytes: u64,
    pub file_count: usize,
    /// Worker threads actually started.
    pub workers: usize,
    /// Documents whose postings were merged into the store.
    pub indexed: usize,
}

impl IndexStats {
    /// True when the folder held no matching files.
    pub fn is_empty(&self) -> bool { self.file_count == 0 }
}

/// Parallel ingestion of a folder into a shared [`IndexStore`].
///
/// Indexing is best effort rather than transactional: a failed run keeps
/// whatever postings its workers merged before the failure.
pub struct Pipeline {
    store: Arc<IndexStore>,
    source: Arc<dyn DocumentSource>,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(store: Arc<IndexStore>, source: Arc<dyn DocumentSource>, config: PipelineConfig) -> Result<Self, IndexError> {
        if config.workers == 0 {
            return Err(IndexError::InvalidWorkerCount(config.workers));
        }
        Ok(Self { store, source, config })
    }

    pub fn store(&self) -> &Arc<IndexStore> { &self.store }

    pub fn index_folder(&self, root: &Path) -> Result<IndexStats, IndexError> {
        let files = self
            .source
            .discover(root)
            .map_err(|source| IndexError::Source { path: root.to_path_buf(), source })?;
        if files.is_empty() {
            info!(root = %root.display(), "no files found");
            return Ok(IndexStats::default());
        }

        let mut paths: HashMap<DocId, PathBuf> = HashMap::with_capacity(files.len());
        for path in &files {
            let doc_id = self.store.register_document(&path.to_string_lossy());
            paths.insert(doc_id, path.clone());
        }

        let mut total_bytes = 0u64;
        for path in &files {
            match self.source.size(path) {
                Ok(n) => total_bytes += n,
                Err(e) => warn!(path = %path.display(), error = %e, "cannot get file size"),
            }
        }

        let mut ids: Vec<DocId> = paths.keys().copied().collect();
        ids.sort_unstable();
        let workers = self.config.workers.min(ids.len()).max(1);
        let buckets = partition_round_robin(&ids, workers);
        info!(root = %root.display(), files = files.len(), workers, "indexing started");

        let start = Instant::now();
        let indexed = self.run_workers(buckets, Arc::new(paths))?;
        let elapsed_secs = start.elapsed().as_secs_f64();

        let throughput_mbps = if elapsed_secs > 0.0 { (total_bytes as f64 / 1e6) / elapsed_secs } else { 0.0 };
        let stats = IndexStats { elapsed_secs, throughput_mbps, total_bytes, file_count: files.len(), workers, indexed };
        info!(
            files = stats.file_count,
            indexed,
            total_bytes,
            elapsed_secs,
            throughput_mbps,
            "indexing finished"
        );
        Ok(stats)
    }

    /// Run one thread per non-empty bucket and collect their reports.
    ///
    /// A worker panic or a failed spawn raises the cancel flag; the workers
    /// still running then get `grace_period` to report before being detached.
    fn run_workers(&self, buckets: Vec<Vec<DocId>>, paths: Arc<HashMap<DocId, PathBuf>>) -> Result<usize, IndexError> {
        let cancel = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::channel::<Report>();
        let mut handles = Vec::with_capacity(buckets.len());
        let mut spawn_fault = None;

        for (n, bucket) in buckets.into_iter().enumerate().filter(|(_, b)| !b.is_empty()) {
            let worker = Worker {
                store: self.store.clone(),
                source: self.source.clone(),
                paths: paths.clone(),
                cancel: cancel.clone(),
            };
            let tx = tx.clone();
            let spawned = thread::Builder::new().name(format!("index-worker-{n}")).spawn(move || {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| worker.run(&bucket)));
                let _ = tx.send((n, outcome));
            });
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    error!(worker = n, error = %e, "failed to start indexing worker");
                    spawn_fault = Some(IndexError::Spawn(e));
                    break;
                }
            }
        }
        drop(tx);

        let drained = drain_reports(&rx, handles.len(), &cancel, self.config.grace_period, spawn_fault);
        if let Some(err) = drained.fault {
            if drained.abandoned > 0 {
                warn!(abandoned = drained.abandoned, "workers still running after grace period");
            }
            return Err(err);
        }
        for handle in handles {
            let _ = handle.join();
        }
        Ok(drained.indexed)
    }
}

/// Worker index and what its loop returned (or the panic payload).
type Report = (usize, thread::Result<usize>);

struct Drained {
    indexed: usize,
    fault: Option<IndexError>,
    /// Workers that had not reported when the grace period ran out.
    abandoned: usize,
}

/// Wait for `pending` reports. Once a fault is known (passed in or reported)
/// the cancel flag is raised and waiting is capped at `grace_period`.
fn drain_reports(
    rx: &mpsc::Receiver<Report>,
    mut pending: usize,
    cancel: &AtomicBool,
    grace_period: Duration,
    mut fault: Option<IndexError>,
) -> Drained {
    let mut deadline = None;
    if fault.is_some() {
        cancel.store(true, Ordering::Relaxed);
        deadline = Some(Instant::now() + grace_period);
    }
    let mut indexed = 0;
    while pending > 0 {
        let report = match deadline {
            None => rx.recv().ok(),
            Some(d) => rx.recv_timeout(d.saturating_duration_since(Instant::now())).ok(),
        };
        let Some((worker, outcome)) = report else { break };
        pending -= 1;
        match outcome {
            Ok(n) => indexed += n,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(worker, %message, "indexing worker panicked");
                if fault.is_none() {
                    cancel.store(true, Ordering::Relaxed);
                    deadline = Some(Instant::now() + grace_period);
                    fault = Some(IndexError::WorkerFault { worker, message });
                }
            }
        }
    }
    Drained { indexed, fault, abandoned: pending }
}

#[derive(Clone)]
struct Worker {
    store: Arc<IndexStore>,
    source: Arc<dyn DocumentSource>,
    paths: Arc<HashMap<DocId, PathBuf>>,
    cancel: Arc<AtomicBool>,
}

impl Worker {
    /// Index `ids` in order; returns how many documents produced postings.
    fn run(&self, ids: &[DocId]) -> usize {
        let mut indexed = 0;
        for &doc_id in ids {
            if self.cancel.load(Ordering::Relaxed) {
                debug!("worker cancelled");
                break;
            }
            let Some(path) = self.paths.get(&doc_id) else { continue };
            match self.source.read(path) {
                Ok(text) => {
                    let freqs = tokenize(&text);
                    if !freqs.is_empty() {
                        self.store.merge_postings(doc_id, &freqs);
                        indexed += 1;
                    }
                }
                Err(e) => warn!(path = %path.display(), error = %e, "failed to read document"),
            }
        }
        indexed
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Deal `items` into `buckets` lists: item `i` goes to bucket `i % buckets`.
/// Relative order is preserved inside each bucket.
pub fn partition_round_robin<T: Copy>(items: &[T], buckets: usize) -> Vec<Vec<T>> {
    let buckets = buckets.max(1);
    let mut parts: Vec<Vec<T>> = (0..buckets)
        .map(|_| Vec::with_capacity(items.len() / buckets + 1))
        .collect();
    for (i, item) in items.iter().enumerate() {
        parts[i % buckets].push(*item);
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_deals_round_robin() {
        let parts = partition_round_robin(&[1, 2, 3, 4, 5, 6, 7], 3);
        assert_eq!(parts, vec![vec![1, 4, 7], vec![2, 5], vec![3, 6]]);
    }

    #[test]
    fn partition_covers_every_item_once() {
        for n in 0..40u32 {
            let items: Vec<u32> = (1..=n).collect();
            for w in 1..10 {
                let parts = partition_round_robin(&items, w);
                assert_eq!(parts.len(), w);
                let mut all: Vec<u32> = parts.iter().flatten().copied().collect();
                assert_eq!(all.len(), items.len());
                all.sort_unstable();
                assert_eq!(all, items);
                for part in &parts {
                    assert!(part.windows(2).all(|p| p[0] < p[1]));
                }
            }
        }
    }

    #[test]
    fn partition_treats_zero_buckets_as_one() {
        assert_eq!(partition_round_robin(&[1, 2], 0), vec![vec![1, 2]]);
    }

    #[test]
    fn spawn_failure_still_drains_running_workers() {
        let (tx, rx) = mpsc::channel::<Report>();
        let cancel = AtomicBool::new(false);
        let started = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            let _ = tx.send((0, Ok(3)));
        });

        let spawn_err = IndexError::Spawn(std::io::Error::new(std::io::ErrorKind::Other, "no threads left"));
        let drained = drain_reports(&rx, 1, &cancel, Duration::from_secs(5), Some(spawn_err));
        started.join().unwrap();

        assert!(cancel.load(Ordering::Relaxed));
        assert_eq!(drained.indexed, 3);
        assert_eq!(drained.abandoned, 0);
        assert!(matches!(drained.fault, Some(IndexError::Spawn(_))));
    }

    #[test]
    fn drain_gives_up_after_the_grace_period() {
        let (tx, rx) = mpsc::channel::<Report>();
        let cancel = AtomicBool::new(false);
        let spawn_err = IndexError::Spawn(std::io::Error::new(std::io::ErrorKind::Other, "no threads left"));

        let start = Instant::now();
        let drained = drain_reports(&rx, 2, &cancel, Duration::from_millis(30), Some(spawn_err));
        assert!(start.elapsed() < Duration::from_secs(2));
        assert_eq!(drained.abandoned, 2);
        assert_eq!(drained.indexed, 0);
        drop(tx);
    }

    #[test]
    fn reported_panic_becomes_the_fault() {
        let (tx, rx) = mpsc::channel::<Report>();
        let cancel = AtomicBool::new(false);
        let payload = panic::catch_unwind(|| panic!("bad bytes")).unwrap_err();
        tx.send((1, Ok(2))).unwrap();
        tx.send((0, Err(payload))).unwrap();
        drop(tx);

        let drained = drain_reports(&rx, 2, &cancel, Duration::from_secs(5), None);
        assert!(cancel.load(Ordering::Relaxed));
        assert_eq!(drained.indexed, 2);
        match drained.fault {
            Some(IndexError::WorkerFault { worker, message }) => {
                assert_eq!(worker, 0);
                assert_eq!(message, "bad bytes");
            }
            other => panic!("unexpected fault: {other:?}"),
        }
    }

    #[test]
    fn panic_message_handles_both_payload_kinds() {
        let a = panic::catch_unwind(|| panic!("static")).unwrap_err();
        let b = panic::catch_unwind(|| panic!("{}", String::from("owned"))).unwrap_err();
        assert_eq!(panic_message(a.as_ref()), "static");
        assert_eq!(panic_message(b.as_ref()), "owned");
    }
}

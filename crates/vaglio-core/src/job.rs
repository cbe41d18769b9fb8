// ABOUTME: Persistence job queue handle used by the engine to schedule whole-file writes.
// ABOUTME: Submission is fire-and-forget over an unbounded channel drained by a single worker.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::sync::{mpsc, oneshot};

/// A snapshot of one collection waiting to be written to `target`.
#[derive(Debug, Clone)]
pub struct PersistenceJob {
    pub target: PathBuf,
    pub snapshot: serde_json::Value,
}

/// Message consumed by the persistence worker.
#[derive(Debug)]
pub enum Job {
    Write(PersistenceJob),
    /// Barrier: answered once every job queued before it has been processed.
    Flush(oneshot::Sender<()>),
}

/// Cloneable sending half of the persistence queue.
#[derive(Debug, Clone)]
pub struct JobQueue {
    tx: mpsc::UnboundedSender<Job>,
}

/// Receiving half of the persistence queue, owned by the worker.
#[derive(Debug)]
pub struct JobReceiver {
    rx: mpsc::UnboundedReceiver<Job>,
}

impl JobQueue {
    /// Create a connected queue handle and receiver.
    pub fn channel() -> (JobQueue, JobReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (JobQueue { tx }, JobReceiver { rx })
    }

    /// Snapshot `data` and queue it for writing to `target`. Never blocks.
    ///
    /// The snapshot is taken immediately, so callers invoke this while they
    /// still hold the lock guarding `data`. A snapshot that fails to
    /// serialize is logged and dropped.
    pub fn submit<T: Serialize + ?Sized>(&self, target: &Path, data: &T) {
        let snapshot = match serde_json::to_value(data) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(path = %target.display(), "dropping persistence job, snapshot failed: {}", e);
                return;
            }
        };

        let job = Job::Write(PersistenceJob {
            target: target.to_path_buf(),
            snapshot,
        });
        if self.tx.send(job).is_err() {
            tracing::error!(path = %target.display(), "persistence worker is gone, write dropped");
        }
    }

    /// Wait until every job submitted before this call has been processed.
    /// Returns false if the worker has already stopped.
    pub async fn flush(&self) -> bool {
        let (tx, rx) = oneshot::channel();
        if self.tx.send(Job::Flush(tx)).is_err() {
            return false;
        }
        rx.await.is_ok()
    }
}

impl JobReceiver {
    /// Next queued job, or None once every queue handle has been dropped.
    pub async fn recv(&mut self) -> Option<Job> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn submit_preserves_order() {
        let (queue, mut rx) = JobQueue::channel();

        queue.submit(Path::new("a.json"), &vec![1, 2]);
        queue.submit(Path::new("b.json"), &serde_json::json!({"eliminate": [3]}));

        match rx.recv().await {
            Some(Job::Write(job)) => {
                assert_eq!(job.target, PathBuf::from("a.json"));
                assert_eq!(job.snapshot, serde_json::json!([1, 2]));
            }
            other => panic!("expected write job, got {:?}", other),
        }
        match rx.recv().await {
            Some(Job::Write(job)) => assert_eq!(job.target, PathBuf::from("b.json")),
            other => panic!("expected write job, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn snapshot_is_taken_at_submit_time() {
        let (queue, mut rx) = JobQueue::channel();
        let mut data = vec![1];

        queue.submit(Path::new("a.json"), &data);
        data.push(2);

        match rx.recv().await {
            Some(Job::Write(job)) => assert_eq!(job.snapshot, serde_json::json!([1])),
            other => panic!("expected write job, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn flush_fails_without_worker() {
        let (queue, rx) = JobQueue::channel();
        drop(rx);
        assert!(!queue.flush().await);
    }
}

// ABOUTME: Background persistence worker draining the job queue one write at a time.
// ABOUTME: Failed writes are logged and dropped; the loop never stops on an error.

use tokio::task::JoinHandle;
use vaglio_core::{Job, JobReceiver, PersistenceJob};

use crate::atomic::{StoreError, write_json_atomic};

/// Totals reported when the worker exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerReport {
    pub written: usize,
    pub failed: usize,
}

/// Spawn the single consumer of the persistence queue. Jobs are applied in
/// submission order; the task exits once every queue handle is dropped and
/// the backlog is drained.
pub fn spawn_worker(mut jobs: JobReceiver) -> JoinHandle<WorkerReport> {
    tokio::spawn(async move {
        let mut report = WorkerReport::default();

        while let Some(job) = jobs.recv().await {
            match job {
                Job::Write(job) => {
                    let target = job.target.clone();
                    match write(job).await {
                        Ok(()) => {
                            report.written += 1;
                            tracing::trace!(path = %target.display(), "snapshot written");
                        }
                        Err(e) => {
                            report.failed += 1;
                            tracing::error!(path = %target.display(), "persistence job dropped: {}", e);
                        }
                    }
                }
                Job::Flush(done) => {
                    // The caller may have stopped waiting
                    let _ = done.send(());
                }
            }
        }

        tracing::info!(
            written = report.written,
            failed = report.failed,
            "persistence worker stopped"
        );
        report
    })
}

/// Run one write on the blocking pool and wait for it, so the next job
/// cannot start before this one has been renamed into place.
async fn write(job: PersistenceJob) -> Result<(), StoreError> {
    tokio::task::spawn_blocking(move || write_json_atomic(&job.target, &job.snapshot))
        .await
        .map_err(|e| StoreError::Io(std::io::Error::other(e)))?
}

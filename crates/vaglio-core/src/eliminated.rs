// ABOUTME: The eliminated set: question ids permanently excluded from assignment.
// ABOUTME: Copy-on-write so scheduling passes read a stable view without holding any lock.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::job::JobQueue;

/// On-disk shape of the eliminated ids file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EliminatedFile {
    #[serde(default)]
    pub eliminate: Vec<i64>,
}

/// An immutable view of the eliminated ids at some point in time.
#[derive(Debug, Clone, Default)]
pub struct EliminatedView(Arc<BTreeSet<i64>>);

impl EliminatedView {
    pub fn from_ids(ids: impl IntoIterator<Item = i64>) -> Self {
        Self(Arc::new(ids.into_iter().collect()))
    }

    pub fn contains(&self, id: i64) -> bool {
        self.0.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Ids in ascending order.
    pub fn to_vec(&self) -> Vec<i64> {
        self.0.iter().copied().collect()
    }
}

/// Thread-safe, grow-only set of eliminated ids, persisted to `path`.
#[derive(Debug)]
pub struct EliminatedSet {
    path: PathBuf,
    current: RwLock<EliminatedView>,
}

impl EliminatedSet {
    pub fn new(path: PathBuf, ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            path,
            current: RwLock::new(EliminatedView::from_ids(ids)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The current view. Cheap: clones an `Arc` under a briefly held read lock.
    pub fn view(&self) -> EliminatedView {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn contains(&self, id: i64) -> bool {
        self.view().contains(id)
    }

    /// Union `ids` into the set and queue the resulting file snapshot.
    ///
    /// The snapshot is queued while the write lock is held, so concurrent
    /// calls reach the worker in the same order they were applied.
    pub fn add_all(&self, ids: impl IntoIterator<Item = i64>, queue: &JobQueue) -> EliminatedView {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);

        let mut next: BTreeSet<i64> = (*current.0).clone();
        let before = next.len();
        next.extend(ids);
        let added = next.len() - before;

        *current = EliminatedView(Arc::new(next));
        queue.submit(
            &self.path,
            &EliminatedFile {
                eliminate: current.to_vec(),
            },
        );

        tracing::info!(added, total = current.len(), "eliminated set updated");
        current.clone()
    }

    /// Ids in ascending order.
    pub fn snapshot(&self) -> Vec<i64> {
        self.view().to_vec()
    }
}

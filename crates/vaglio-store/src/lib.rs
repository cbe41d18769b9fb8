// ABOUTME: Persistence layer for vaglio, owning everything that touches the data directory.
// ABOUTME: Provides atomic JSON files, the background write worker, the directory layout, and seed recovery.

pub mod atomic;
pub mod layout;
pub mod recovery;
pub mod worker;

pub use atomic::{StoreError, read_json, write_json_atomic};
pub use layout::DataLayout;
pub use recovery::{Recovered, recover_engine};
pub use worker::{WorkerReport, spawn_worker};

pub mod config {
    include!("lib/config.rs");
}
pub mod error {
    include!("lib/error.rs");
}
pub mod frequency_table {
    include!("lib/frequency_table.rs");
}
pub mod metrics {
    include!("lib/metrics.rs");
}
pub mod record_queue {
    include!("lib/record_queue.rs");
}
pub mod snapshot {
    include!("lib/snapshot.rs");
}
pub mod top_k_index {
    include!("lib/top_k_index.rs");
}
/// Top-K tracker facade.
///
/// Owns the frequency table and the bounded Top-K index behind a single
/// reader-writer lock. A record applies the table increment and the index
/// fix-up under one write guard, so readers never see a count without its
/// matching index position.
pub mod tracker {
    include!("lib/tracker.rs");
}

pub use config::TrackerConfig;
pub use error::TrackerError;
pub use record_queue::RecordQueue;
pub use snapshot::{AccessEntry, Snapshot};
pub use tracker::Tracker;

//! Read-only views computed from store snapshots: per-field summaries, the
//! mission report and CSV export. Nothing here holds the store lock beyond a
//! single snapshot copy.

mod export;
mod summary;

pub use export::*;
pub use summary::*;

//! History management
//!
//! Merging fresh batches into accumulated series and persisting them.

pub mod merge;
pub mod storage;

pub use merge::*;
pub use storage::*;

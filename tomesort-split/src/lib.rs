//! tomesort-split library interface
//!
//! Re-attributes a category-grouped record corpus into one partition per
//! publication source. Grouping, quarantine, and deduplication live in
//! `partition`; file splitting in `writer`; asset copying in `images`.

pub mod images;
pub mod partition;
pub mod stats;
pub mod writer;

pub use partition::{deduplicate, group_by_source, Grouped};
pub use stats::SplitStats;

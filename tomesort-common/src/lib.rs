//! Shared types for the tomesort tools
//!
//! - Workspace-wide error type
//! - Path-convention configuration (override table, skip rules)
//! - Source catalog loaded from the corpus book list
//! - JSON file I/O and file copy capabilities

pub mod catalog;
pub mod config;
pub mod error;
pub mod fsops;
pub mod json_io;
pub mod records;

pub use error::{Error, Result};

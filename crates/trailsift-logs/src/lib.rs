//! CloudTrail log processing for trailsift
//!
//! This crate compiles directories of line-delimited CloudTrail log files
//! into a single collection, filters collections by field or free-text
//! substring, and streams matching records without collecting them.

mod compiler;
mod dump;
mod error;
mod filter;
mod paths;

pub use compiler::{compile_logs, load_file};
pub use dump::compile_and_print;
pub use error::{CompileError, FilterError};
pub use filter::{Predicate, SEARCH_KEY, apply_filters, filter_records};
pub use paths::expand_tilde;

// Re-export types used in our public API
pub use trailsift_types::{Collection, Record, RecordExt};

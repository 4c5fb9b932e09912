//! dirsorter - sort the files of a directory into per-category subfolders
//!
//! This library classifies files by extension against an immutable
//! [`ExtensionTable`], scans a directory's top level into per-extension
//! buckets, and moves selected files into `<dir>/<category>/` with
//! collision-safe renames, aggregated per-file failures and progress reporting.

pub mod cli;
pub mod config;
pub mod error;
pub mod file_category;
pub mod logging;
pub mod output;
pub mod relocator;
pub mod scanner;

pub use config::{CompiledFilters, ConfigError, SorterConfig};
pub use error::{MoveFailure, MoveFailureReason, SortError, SortResult};
pub use file_category::{ExtensionTable, extension_of, normalize_extension};
pub use relocator::{
    FileMover, FsMover, MovedFile, NoProgress, ProgressObserver, RelocationPlan,
    RelocationReport, Relocator, resolve_collision,
};
pub use scanner::{ExtensionBucket, ScanResult, Scanner};

pub use cli::{Cli, run_cli};

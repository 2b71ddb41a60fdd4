//! # Resmerge Core
//!
//! Collapses resource keys that share an identical value onto one canonical
//! key, then rewrites every reference to a defunct key across a source tree.
//!
//! ## Pipeline
//!
//! ```text
//! Resource table (ordered key/value pairs)
//!     │
//!     ├──> Duplicate Index (value → keys, first-seen order)
//!     │      │
//!     │      ├─> Canonical Key Selector ("Common" key, else first key)
//!     │      │
//!     │      ├─> Table Reducer ──> reduced table written back
//!     │      │
//!     │      └─> Substitution Planner ──> RenameMap (defunct → canonical)
//!     │
//!     └──> Source Scanner (extension allowlist)
//!            └─> File Rewriter (BOM-preserving, writes only changed files)
//! ```
//!
//! Every conflict is detected while planning, before the table or any source
//! file is touched.
//!
//! ## Example
//!
//! ```no_run
//! use resmerge_core::{MergeConfig, ResourceMerger};
//! use std::path::Path;
//!
//! let merger = ResourceMerger::new(MergeConfig::default())?;
//! let report = merger.run(Path::new("Resources/Strings.resx"), Path::new("src"))?;
//!
//! println!("{} values merged, {} files changed", report.merged.len(), report.files_changed.len());
//! # Ok::<(), resmerge_core::MergeError>(())
//! ```

pub mod encoding;

mod config;
mod error;
mod index;
mod merger;
mod planner;
mod reducer;
mod report;
mod rewriter;
mod scanner;
mod selector;
mod substitute;

pub use config::{MergeConfig, ScanConfig, DEFAULT_CANONICAL_MARKER};
pub use encoding::{DecodedText, TextEncoding};
pub use error::{EncodingError, MergeError, Result, RewriteError};
pub use index::{DuplicateGroup, DuplicateIndex};
pub use merger::{MergePlan, ResourceMerger};
pub use planner::{plan_renames, RenameMap};
pub use reducer::{reduce_table, ReducedTable};
pub use report::{FileChange, FileFailure, MergeReport, MergedValue};
pub use rewriter::{FileEditResult, FileRewriter};
pub use scanner::SourceScanner;
pub use selector::{select_canonical_key, CanonicalMapping, CanonicalSelector};
pub use substitute::{Replacement, Substituter, Substitution};

pub use resmerge_table::ResourceEntry;

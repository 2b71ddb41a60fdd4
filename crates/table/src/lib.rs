//! # Resmerge Table
//!
//! Readers and writers for flat, string-keyed resource tables.
//!
//! A table is an ordered sequence of [`ResourceEntry`] values with unique keys.
//! Loading never reorders entries; saving only ever drops entries, so the
//! on-disk document keeps every byte that belongs to a surviving entry.
//!
//! ## Formats
//!
//! ```text
//! *.resx  ──> ResxTable  (string <data> nodes; typed nodes kept verbatim)
//! *.json  ──> JsonTable  (flat object of string → string, order preserved)
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use resmerge_table::table_for_path;
//!
//! let table = table_for_path("Strings.resx")?;
//! let entries = table.load("Strings.resx".as_ref())?;
//! println!("{} entries", entries.len());
//! # Ok::<(), resmerge_table::TableError>(())
//! ```

mod error;
mod format;
mod json;
mod resx;
mod types;
mod write;

pub use error::{Result, TableError};
pub use format::{table_for_path, ResourceTable, TableFormat};
pub use json::JsonTable;
pub use resx::{ResxDocument, ResxTable};
pub use types::ResourceEntry;
pub use write::write_atomic;

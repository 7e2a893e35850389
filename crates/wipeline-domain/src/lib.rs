//! Wipeline Domain Layer
//!
//! This crate contains the core pipeline logic for wipeline: the report
//! document model, the flattening and normalization passes, the erasure/disk
//! assembly rules, batch cleansing and window math. Everything here is pure
//! and synchronous; network and database concerns live in other crates.
//!
//! ## Key Concepts
//!
//! - **ReportDocument**: the parsed hierarchical form of one export response
//! - **FlatRecord**: a dotted-path-to-value projection of one erasure event
//! - **Assembly**: joining erasure events to report sections and disk entries
//! - **Window**: the half-open time range one extraction cycle covers
//!
//! ## Architecture
//!
//! - Document parsing and rendering are self-contained (the export dialect
//!   is fixed and known)
//! - Flattening and assembly are pure functions over an immutable tree
//! - Trait definitions for the export source and the record store; the
//!   implementations live in wipeline-client and wipeline-store

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod assemble;
pub mod cleanse;
pub mod document;
pub mod error;
pub mod flatten;
pub mod normalize;
pub mod record;
pub mod traits;
pub mod window;

mod parser;

// Re-exports for convenience
pub use assemble::assemble_report;
pub use cleanse::{cleanse, DOCUMENT_ID_KEY, MAX_FIELD_CHARS, TRUNCATE_FIELDS};
pub use document::{ReportDocument, ReportNode};
pub use error::ParseError;
pub use flatten::{flatten_children, flatten_node};
pub use normalize::normalize;
pub use record::FlatRecord;
pub use traits::{ExportResponse, RecordStore, ReportSource, StageSummary};
pub use window::{format_boundary, parse_boundary, Window, BOUNDARY_FORMAT};

//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the pipeline logic and
//! infrastructure. Implementations live in other crates.

use std::future::Future;

use crate::record::FlatRecord;
use crate::window::Window;

/// Outcome of one export request for a window
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportResponse {
    /// The console returned a report-collection document body
    Reports(String),

    /// The console had no reports in the requested window
    NoReports,
}

/// Trait for fetching raw report exports
///
/// Implemented by the infrastructure layer (wipeline-client)
pub trait ReportSource {
    /// Error type for fetch operations
    type Error;

    /// Fetch the export for one extraction window
    fn fetch(
        &self,
        window: &Window,
    ) -> impl Future<Output = Result<ExportResponse, Self::Error>> + Send;
}

/// Outcome of staging one cleansed batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageSummary {
    /// Rows written to the staging area
    pub staged: usize,

    /// Batch fields with no matching staging column (schema drift; logged,
    /// never fatal)
    pub unmapped: Vec<String>,
}

/// Trait for staging and merging cleansed record batches
///
/// Implemented by the infrastructure layer (wipeline-store)
pub trait RecordStore {
    /// Error type for store operations
    type Error;

    /// Clear the staging area ahead of a new batch
    fn clear_stage(&mut self) -> Result<(), Self::Error>;

    /// Bulk-insert a cleansed batch into the staging area
    fn stage_batch(&mut self, batch: &[FlatRecord]) -> Result<StageSummary, Self::Error>;

    /// Compute and store the content hash of every staged row
    fn update_hashes(&mut self) -> Result<usize, Self::Error>;

    /// Merge staged rows into the fact table, skipping hashes already loaded.
    ///
    /// Returns the number of rows inserted.
    fn merge(&mut self) -> Result<usize, Self::Error>;
}

//! Counters collected over a pipeline run

/// Totals across all windows of one run
///
/// A run covers every window between the stored checkpoint and the wall
/// clock, so these numbers aggregate multiple extract/load cycles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Windows processed (empty ones included)
    pub windows: usize,

    /// Windows that answered with no reports
    pub empty_windows: usize,

    /// Cleansed records assembled from response documents
    pub records: usize,

    /// Rows written to the staging table
    pub staged: usize,

    /// Rows the merge inserted into the fact table
    pub merged: usize,

    /// Files written by the export sink
    pub files: usize,
}

impl RunStats {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    /// One-line report of the run
    pub fn summary(&self) -> String {
        let mut line = format!(
            "{} windows processed ({} empty), {} records assembled",
            self.windows, self.empty_windows, self.records
        );
        if self.staged > 0 || self.merged > 0 {
            line.push_str(&format!(", {} staged, {} merged", self.staged, self.merged));
        }
        if self.files > 0 {
            line.push_str(&format!(", {} files written", self.files));
        }
        line
    }
}

//! Load-window checkpoint persistence

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use wipeline_domain::{format_boundary, parse_boundary, Window};

use crate::RunnerError;

/// Window state persisted between runs.
///
/// The file records the last completed window; its `to_date` is the next
/// cycle's starting boundary. Timestamps use the shared boundary format,
/// with fractional seconds tolerated on read.
///
/// # Examples
///
/// ```no_run
/// use wipeline_runner::ControlFile;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let control = ControlFile::new("control.json");
/// let checkpoint = control.load_checkpoint()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ControlFile {
    path: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
struct ControlState {
    from_date: String,
    to_date: String,
}

impl ControlFile {
    /// Track window state at the given path
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Path of the underlying file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the checkpoint: the stored window's `to_date`
    pub fn load_checkpoint(&self) -> Result<NaiveDateTime, RunnerError> {
        let raw = fs::read_to_string(&self.path).map_err(|e| {
            RunnerError::Control(format!("cannot read {}: {}", self.path.display(), e))
        })?;
        let state: ControlState = serde_json::from_str(&raw)
            .map_err(|e| RunnerError::Control(format!("invalid control file: {}", e)))?;
        parse_boundary(&state.to_date)
            .map_err(|e| RunnerError::Control(format!("invalid to_date boundary: {}", e)))
    }

    /// Persist a completed window
    pub fn save_window(&self, window: &Window) -> Result<(), RunnerError> {
        let state = ControlState {
            from_date: format_boundary(window.from),
            to_date: format_boundary(window.to),
        };
        let body = serde_json::to_string_pretty(&state)
            .map_err(|e| RunnerError::Control(format!("cannot encode control state: {}", e)))?;
        fs::write(&self.path, body).map_err(|e| {
            RunnerError::Control(format!("cannot write {}: {}", self.path.display(), e))
        })
    }

    /// Seed the file so the next run starts extracting at `boundary`
    pub fn initialize(&self, boundary: NaiveDateTime) -> Result<(), RunnerError> {
        self.save_window(&Window {
            from: boundary,
            to: boundary,
        })
    }
}

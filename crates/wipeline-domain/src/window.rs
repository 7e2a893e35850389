//! Extraction window math.
//!
//! The pipeline walks forward in fixed one-hour windows from a persisted
//! checkpoint, never extracting into the future. Boundaries are naive UTC
//! timestamps at second precision.

use chrono::{Duration, NaiveDateTime};

/// Timestamp format shared by window boundaries, the control file and the
/// export query
pub const BOUNDARY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One half-open extraction range `[from, to)`.
///
/// # Examples
///
/// ```
/// use wipeline_domain::{parse_boundary, Window};
///
/// let checkpoint = parse_boundary("2024-05-01 12:00:00").unwrap();
/// let now = parse_boundary("2024-05-01 15:30:00").unwrap();
/// let window = Window::next(checkpoint, now);
/// assert!(!window.is_idle());
/// assert_eq!(window.to - window.from, chrono::Duration::hours(1));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    /// Inclusive lower boundary
    pub from: NaiveDateTime,

    /// Exclusive upper boundary; equals `from` when the window is idle
    pub to: NaiveDateTime,
}

impl Window {
    /// Compute the window that follows `checkpoint`, bounded by `now`.
    ///
    /// The upper boundary is one hour past the checkpoint. When that would
    /// reach beyond `now` the window collapses to zero width, signalling
    /// that there is nothing to extract yet.
    pub fn next(checkpoint: NaiveDateTime, now: NaiveDateTime) -> Self {
        let to = checkpoint + Duration::hours(1);
        if to > now {
            Self {
                from: checkpoint,
                to: checkpoint,
            }
        } else {
            Self { from: checkpoint, to }
        }
    }

    /// True when the window has zero width and the cycle should idle
    pub fn is_idle(&self) -> bool {
        self.from == self.to
    }
}

/// Parse a boundary timestamp, tolerating fractional seconds by truncation
pub fn parse_boundary(value: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    let head = value.get(..19).unwrap_or(value);
    NaiveDateTime::parse_from_str(head, BOUNDARY_FORMAT)
}

/// Format a boundary timestamp in [`BOUNDARY_FORMAT`]
pub fn format_boundary(value: NaiveDateTime) -> String {
    value.format(BOUNDARY_FORMAT).to_string()
}

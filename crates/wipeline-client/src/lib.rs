//! Wipeline Export Client Layer
//!
//! Implementations of the `ReportSource` trait from `wipeline-domain`.
//!
//! # Architecture
//!
//! The pipeline pulls raw report documents through `ReportSource`; this
//! crate supplies the HTTP implementation plus a deterministic mock so the
//! full pipeline can run in tests without a console.
//!
//! # Sources
//!
//! - `ExportClient`: HTTP report-export API integration
//! - `MockSource`: scripted responses for testing
//!
//! # Examples
//!
//! ```
//! use wipeline_client::MockSource;
//! use wipeline_domain::{parse_boundary, ExportResponse, ReportSource, Window};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let mut source = MockSource::new();
//! source.push_reports("<root><report/></root>");
//!
//! let window = Window {
//!     from: parse_boundary("2024-05-01 12:00:00").unwrap(),
//!     to: parse_boundary("2024-05-01 13:00:00").unwrap(),
//! };
//! let response = source.fetch(&window).await.unwrap();
//! assert!(matches!(response, ExportResponse::Reports(_)));
//! # }
//! ```

#![warn(missing_docs)]

pub mod export;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use thiserror::Error;

use wipeline_domain::{ExportResponse, ReportSource, Window};

pub use export::{build_request_document, classify_response, ClientConfig, ExportClient};

/// Errors that can occur while fetching report exports
#[derive(Error, Debug)]
pub enum ClientError {
    /// Configuration rejected before any request was made
    #[error("Invalid client configuration: {0}")]
    Config(String),

    /// Network-level failure talking to the console
    #[error("Communication error: {0}")]
    Communication(String),

    /// The console rejected the export request
    #[error("Export request failed with HTTP {status}: {body}")]
    Api {
        /// HTTP status code of the rejection
        status: u16,
        /// Response body as returned by the console
        body: String,
    },
}

/// Scripted report source for deterministic testing.
///
/// Responses are queued ahead of a run and handed out one per fetch; an
/// empty queue answers with no reports, so a pipeline draining multiple
/// windows terminates naturally. Clones share the same queue and request
/// log.
///
/// # Examples
///
/// ```
/// use wipeline_client::MockSource;
///
/// let mut source = MockSource::new();
/// source.push_reports("<root><report/></root>");
/// source.push_no_reports();
/// source.push_error("connection refused");
/// assert_eq!(source.call_count(), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockSource {
    outcomes: Arc<Mutex<VecDeque<MockOutcome>>>,
    requests: Arc<Mutex<Vec<Window>>>,
}

#[derive(Debug, Clone)]
enum MockOutcome {
    Respond(ExportResponse),
    Fail(String),
}

impl MockSource {
    /// Create a source with an empty response queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a report-collection response body
    pub fn push_reports(&mut self, body: impl Into<String>) {
        self.outcomes
            .lock()
            .unwrap()
            .push_back(MockOutcome::Respond(ExportResponse::Reports(body.into())));
    }

    /// Queue an empty-window response
    pub fn push_no_reports(&mut self) {
        self.outcomes
            .lock()
            .unwrap()
            .push_back(MockOutcome::Respond(ExportResponse::NoReports));
    }

    /// Queue a communication failure
    pub fn push_error(&mut self, message: impl Into<String>) {
        self.outcomes
            .lock()
            .unwrap()
            .push_back(MockOutcome::Fail(message.into()));
    }

    /// Windows requested so far, in order
    pub fn requests(&self) -> Vec<Window> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of fetches made against this source
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl ReportSource for MockSource {
    type Error = ClientError;

    async fn fetch(&self, window: &Window) -> Result<ExportResponse, ClientError> {
        self.requests.lock().unwrap().push(*window);
        match self.outcomes.lock().unwrap().pop_front() {
            Some(MockOutcome::Respond(response)) => Ok(response),
            Some(MockOutcome::Fail(message)) => Err(ClientError::Communication(message)),
            None => Ok(ExportResponse::NoReports),
        }
    }
}

//! Wipeline Runner
//!
//! Extraction loop driving the Blancco report pipeline: windowed fetch,
//! assembly, and load-or-export of the resulting records.
//!
//! # Overview
//!
//! The runner is responsible for:
//! - **Window scheduling**: Advancing the one-hour extraction window from the
//!   control-file checkpoint, never past the current time
//! - **Orchestration**: Fetching each window from a report source and pushing
//!   the assembled records through staging, hashing and merge
//! - **Checkpointing**: Persisting the processed window after every cycle so
//!   an interrupted run resumes where it stopped
//! - **Export mode**: Writing per-record documents (or raw response bodies)
//!   to disk instead of loading a database
//!
//! # Architecture
//!
//! The pipeline is generic over the [`wipeline_domain::ReportSource`] and
//! [`wipeline_domain::RecordStore`] traits; production runs pair it with
//! `wipeline_client::ExportClient` and `wipeline_store::SqliteStore`, tests
//! with the in-memory mock source.
//!
//! # Usage
//!
//! ## Load
//!
//! ```no_run
//! use wipeline_client::{ClientConfig, ExportClient};
//! use wipeline_runner::{ControlFile, Pipeline};
//! use wipeline_store::SqliteStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::new("https://cloud.blancco.com/api", "svc-export", "secret");
//!     let source = ExportClient::new(config)?;
//!     let mut store = SqliteStore::new("blancco.db")?;
//!
//!     let mut pipeline = Pipeline::new(source, ControlFile::new("blancco_api_control.json"));
//!     let stats = pipeline.run_load(&mut store).await?;
//!     println!("{}", stats.summary());
//!     Ok(())
//! }
//! ```
//!
//! ## Export
//!
//! ```no_run
//! use wipeline_client::{ClientConfig, ExportClient};
//! use wipeline_runner::{ControlFile, ExportSink, Pipeline};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::new("https://cloud.blancco.com/api", "svc-export", "secret");
//!     let source = ExportClient::new(config)?;
//!     let sink = ExportSink::new("exports");
//!
//!     let mut pipeline = Pipeline::new(source, ControlFile::new("blancco_api_control.json"));
//!     let stats = pipeline.run_export(&sink).await?;
//!     println!("{}", stats.summary());
//!     Ok(())
//! }
//! ```
//!
//! # Control File
//!
//! Extraction progress is checkpointed in a small JSON file after every
//! window:
//!
//! ```json
//! {
//!   "from_date": "2024-05-01 12:00:00",
//!   "to_date": "2024-05-01 13:00:00"
//! }
//! ```
//!
//! The next run resumes from `to_date`. When the file does not exist yet,
//! seed it with [`ControlFile::initialize`].

#![warn(missing_docs)]

mod error;
mod stats;
mod control;
mod export;
mod pipeline;

pub use error::RunnerError;
pub use stats::RunStats;
pub use control::ControlFile;
pub use export::ExportSink;
pub use pipeline::Pipeline;

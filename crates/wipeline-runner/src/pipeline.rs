//! Windowed extract-transform-load driver

use chrono::Utc;
use tracing::info;

use wipeline_domain::{
    assemble_report, cleanse, normalize, ExportResponse, FlatRecord, RecordStore, ReportDocument,
    ReportSource, Window,
};

use crate::{ControlFile, ExportSink, RunStats, RunnerError};

/// Drives the pipeline from checkpoint to wall clock.
///
/// Responsible for:
/// - Advancing the extraction window one hour at a time until caught up
/// - Turning each response document into cleansed flat records
/// - Running the clear/stage/hash/merge cycle against a record store, or
///   handing records to a file sink in export mode
/// - Persisting the window checkpoint after every successful cycle
///
/// A failed cycle leaves the checkpoint untouched, so the next run retries
/// the same window.
///
/// # Examples
///
/// ```no_run
/// use wipeline_client::{ClientConfig, ExportClient};
/// use wipeline_runner::{ControlFile, Pipeline};
/// use wipeline_store::SqliteStore;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ClientConfig::new(
///     "https://console.example.com/report-export",
///     "api-user",
///     "secret",
/// );
/// let client = ExportClient::new(config)?;
/// let control = ControlFile::new("control.json");
/// let mut store = SqliteStore::new("wipeline.db")?;
///
/// let mut pipeline = Pipeline::new(client, control);
/// let stats = pipeline.run_load(&mut store).await?;
/// println!("{}", stats.summary());
/// # Ok(())
/// # }
/// ```
pub struct Pipeline<S> {
    source: S,
    control: ControlFile,
}

impl<S: ReportSource> Pipeline<S> {
    /// Create a pipeline over the given source and checkpoint file
    pub fn new(source: S, control: ControlFile) -> Self {
        Self { source, control }
    }

    /// Extract every pending window and load it into the store.
    ///
    /// Each window runs one full cycle: fetch, assemble, cleanse, then
    /// clear staging, bulk-insert, hash and merge. The checkpoint advances
    /// only after the cycle completed, staging included.
    pub async fn run_load<T: RecordStore>(&mut self, store: &mut T) -> Result<RunStats, RunnerError>
    where
        S::Error: std::fmt::Display,
        T::Error: std::fmt::Display,
    {
        let mut stats = RunStats::new();
        let mut window = self.next_window()?;
        if window.is_idle() {
            info!("Nothing to process");
            return Ok(stats);
        }

        while !window.is_idle() {
            let response = self
                .source
                .fetch(&window)
                .await
                .map_err(|e| RunnerError::Source(e.to_string()))?;

            match response {
                ExportResponse::Reports(body) => {
                    let batch = build_batch(&body)?;
                    info!(records = batch.len(), "records assembled");
                    stats.records += batch.len();

                    store
                        .clear_stage()
                        .map_err(|e| RunnerError::Store(e.to_string()))?;
                    let summary = store
                        .stage_batch(&batch)
                        .map_err(|e| RunnerError::Store(e.to_string()))?;
                    store
                        .update_hashes()
                        .map_err(|e| RunnerError::Store(e.to_string()))?;
                    let merged = store.merge().map_err(|e| RunnerError::Store(e.to_string()))?;

                    stats.staged += summary.staged;
                    stats.merged += merged;
                }
                ExportResponse::NoReports => {
                    info!("No reports found");
                    stats.empty_windows += 1;
                }
            }

            self.control.save_window(&window)?;
            stats.windows += 1;
            window = self.next_window()?;
        }

        Ok(stats)
    }

    /// Extract every pending window and write it through the file sink.
    ///
    /// In raw mode each response body lands in one file per window;
    /// otherwise records are assembled and written one document per record.
    pub async fn run_export(&mut self, sink: &ExportSink) -> Result<RunStats, RunnerError>
    where
        S::Error: std::fmt::Display,
    {
        let mut stats = RunStats::new();
        let mut window = self.next_window()?;
        if window.is_idle() {
            info!("Nothing to process");
            return Ok(stats);
        }

        while !window.is_idle() {
            let response = self
                .source
                .fetch(&window)
                .await
                .map_err(|e| RunnerError::Source(e.to_string()))?;

            match response {
                ExportResponse::Reports(body) => {
                    if sink.raw() {
                        let path = sink.write_raw(&window, &body)?;
                        info!(path = %path.display(), "raw export written");
                        stats.files += 1;
                    } else {
                        let batch = build_batch(&body)?;
                        info!(records = batch.len(), "records assembled");
                        stats.records += batch.len();
                        stats.files += sink.write_records(&batch)?;
                    }
                }
                ExportResponse::NoReports => {
                    info!("No reports found");
                    stats.empty_windows += 1;
                }
            }

            self.control.save_window(&window)?;
            stats.windows += 1;
            window = self.next_window()?;
        }

        Ok(stats)
    }

    /// Window following the persisted checkpoint, bounded by the wall clock
    fn next_window(&self) -> Result<Window, RunnerError> {
        let checkpoint = self.control.load_checkpoint()?;
        Ok(Window::next(checkpoint, Utc::now().naive_utc()))
    }
}

/// Parse a response body into the cleansed record batch for one window
fn build_batch(body: &str) -> Result<Vec<FlatRecord>, wipeline_domain::ParseError> {
    let mut document = ReportDocument::parse(body)?;
    normalize(&mut document);

    let mut batch = Vec::new();
    for report in document.reports() {
        batch.extend(assemble_report(report));
    }
    Ok(cleanse(batch))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_REPORT_BODY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<root>
  <report>
    <blancco_data>
      <description>
        <document_id>doc-1</document_id>
      </description>
      <blancco_erasure_report>
        <erasures>
          <erasure>
            <state>Successful</state>
          </erasure>
        </erasures>
      </blancco_erasure_report>
    </blancco_data>
  </report>
  <report>
    <blancco_data>
      <description>
        <document_id>doc-2</document_id>
      </description>
      <blancco_erasure_report>
        <erasures>
          <erasure>
            <state>Failed</state>
          </erasure>
        </erasures>
      </blancco_erasure_report>
    </blancco_data>
  </report>
</root>
"#;

    #[test]
    fn test_build_batch_collects_records_across_reports() {
        let batch = build_batch(TWO_REPORT_BODY).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].value("description.document_id"), Some("doc-1"));
        assert_eq!(batch[0].value("erasure.state"), Some("Successful"));
        assert_eq!(batch[1].value("description.document_id"), Some("doc-2"));
        assert_eq!(batch[1].value("erasure.state"), Some("Failed"));
    }

    #[test]
    fn test_build_batch_cleanses_the_assembled_records() {
        // Second report lacks a document id, so the cleanser drops it
        let body = r#"<root>
  <report>
    <blancco_data>
      <description>
        <document_id>doc-1</document_id>
      </description>
      <blancco_erasure_report>
        <erasures>
          <erasure><state>Successful</state></erasure>
        </erasures>
      </blancco_erasure_report>
    </blancco_data>
  </report>
  <report>
    <blancco_data>
      <blancco_erasure_report>
        <erasures>
          <erasure><state>Failed</state></erasure>
        </erasures>
      </blancco_erasure_report>
    </blancco_data>
  </report>
</root>"#;
        let batch = build_batch(body).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].value("description.document_id"), Some("doc-1"));
    }

    #[test]
    fn test_build_batch_normalizes_entry_tags_first() {
        let body = r#"<root>
  <report>
    <blancco_data>
      <description>
        <document_id>doc-1</document_id>
      </description>
      <blancco_erasure_report>
        <erasures>
          <erasure><state>Successful</state></erasure>
        </erasures>
      </blancco_erasure_report>
    </blancco_data>
    <user_data>
      <fields>
        <entry name="Technician Name">jdoe</entry>
      </fields>
    </user_data>
  </report>
</root>"#;
        let batch = build_batch(body).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(
            batch[0].value("user_data.fields.technician_name"),
            Some("jdoe")
        );
    }

    #[test]
    fn test_build_batch_rejects_malformed_documents() {
        assert!(build_batch("<root><unclosed>").is_err());
    }
}

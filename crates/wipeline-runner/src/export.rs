//! File sink for the export command.
//!
//! Writes one hierarchical document per record, rebuilt from the flattened
//! field paths, or the untouched response body in raw mode.

use std::fs;
use std::path::{Path, PathBuf};

use wipeline_domain::{FlatRecord, ReportDocument, ReportNode, Window};

use crate::RunnerError;

const SERIAL_KEY: &str = "erasure.target.serial";
const STATE_KEY: &str = "erasure.state";

/// Destination directory plus the raw/per-record mode switch
#[derive(Debug, Clone)]
pub struct ExportSink {
    output_dir: PathBuf,
    raw: bool,
}

impl ExportSink {
    /// Sink writing per-record documents into `output_dir`
    pub fn new<P: Into<PathBuf>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.into(),
            raw: false,
        }
    }

    /// Switch to raw mode: one file per window holding the response body
    pub fn with_raw(mut self, raw: bool) -> Self {
        self.raw = raw;
        self
    }

    /// True when the sink writes raw response bodies
    pub fn raw(&self) -> bool {
        self.raw
    }

    /// Write the untouched response body for one window
    pub fn write_raw(&self, window: &Window, body: &str) -> Result<PathBuf, RunnerError> {
        fs::create_dir_all(&self.output_dir)?;
        let filename = format!(
            "blancco_export_{}.xml",
            window.from.format("%Y%m%d%H%M%S")
        );
        let path = self.output_dir.join(filename);
        fs::write(&path, body)?;
        Ok(path)
    }

    /// Write one document per record, named `{target serial}_{state}.xml`.
    ///
    /// Missing name fields fall back to `unknown`; a name that is already
    /// taken gets a numeric suffix so every record keeps its own file.
    pub fn write_records(&self, records: &[FlatRecord]) -> Result<usize, RunnerError> {
        fs::create_dir_all(&self.output_dir)?;
        for record in records {
            let document = ReportDocument {
                root: unflatten(record),
            };
            let path = next_free_path(&self.output_dir, &record_filename(record));
            fs::write(&path, document.render())?;
        }
        Ok(records.len())
    }
}

fn record_filename(record: &FlatRecord) -> String {
    format!(
        "{}_{}.xml",
        filename_component(record.value(SERIAL_KEY)),
        filename_component(record.value(STATE_KEY))
    )
}

/// Sanitize a field value for use in a filename, `unknown` when absent
fn filename_component(value: Option<&str>) -> String {
    let value = value.unwrap_or("").trim();
    if value.is_empty() {
        return "unknown".to_string();
    }
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn next_free_path(dir: &Path, filename: &str) -> PathBuf {
    let candidate = dir.join(filename);
    if !candidate.exists() {
        return candidate;
    }
    let stem = filename.strip_suffix(".xml").unwrap_or(filename);
    let mut suffix = 2;
    loop {
        let candidate = dir.join(format!("{}_{}.xml", stem, suffix));
        if !candidate.exists() {
            return candidate;
        }
        suffix += 1;
    }
}

/// Rebuild a nested document from the record's dotted field paths.
///
/// A record may carry both a scalar and a nested form of the same tag
/// (they were distinct sibling elements in the source document); the two
/// are kept as separate siblings here as well.
fn unflatten(record: &FlatRecord) -> ReportNode {
    let mut root = ReportNode::new("report");
    for (path, value) in record.iter() {
        insert_path(&mut root, path, value);
    }
    root
}

fn insert_path(node: &mut ReportNode, path: &str, value: Option<&str>) {
    match path.split_once('.') {
        Some((head, rest)) => {
            let child = branch_child(node, head);
            insert_path(child, rest, value);
        }
        None => {
            let leaf = leaf_child(node, path);
            leaf.text = value.map(|v| v.to_string());
        }
    }
}

/// Child to descend into: a same-tag node carrying no text, else a new one
fn branch_child<'a>(node: &'a mut ReportNode, tag: &str) -> &'a mut ReportNode {
    let idx = match node
        .children
        .iter()
        .position(|c| c.tag == tag && c.text.is_none())
    {
        Some(idx) => idx,
        None => {
            node.children.push(ReportNode::new(tag));
            node.children.len() - 1
        }
    };
    &mut node.children[idx]
}

/// Child to hold leaf text: a childless same-tag node, else a new one
fn leaf_child<'a>(node: &'a mut ReportNode, tag: &str) -> &'a mut ReportNode {
    let idx = match node
        .children
        .iter()
        .position(|c| c.tag == tag && c.children.is_empty())
    {
        Some(idx) => idx,
        None => {
            node.children.push(ReportNode::new(tag));
            node.children.len() - 1
        }
    };
    &mut node.children[idx]
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use wipeline_domain::{flatten_node, parse_boundary};

    fn record(pairs: &[(&str, Option<&str>)]) -> FlatRecord {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.map(|v| v.to_string())))
            .collect()
    }

    #[test]
    fn test_unflatten_nests_dotted_paths() {
        let record = record(&[
            ("erasure.state", Some("Successful")),
            ("erasure.target.serial", Some("SER-1")),
            ("description.document_id", Some("doc-1")),
        ]);
        let root = unflatten(&record);

        assert_eq!(
            root.descend("erasure/target/serial").and_then(|n| n.text.as_deref()),
            Some("SER-1")
        );
        assert_eq!(
            root.descend("description/document_id").and_then(|n| n.text.as_deref()),
            Some("doc-1")
        );
    }

    #[test]
    fn test_unflatten_round_trips_through_flatten() {
        let original = record(&[
            ("erasure.state", Some("Successful")),
            ("erasure.target.serial", Some("SER-1")),
            ("disk.type", Some("SSD")),
        ]);
        let root = unflatten(&original);

        // Flattening the rebuilt tree recovers every field
        let flattened = flatten_node(&root.children[0], "erasure");
        assert_eq!(flattened.value("erasure.state"), Some("Successful"));
        assert_eq!(flattened.value("erasure.target.serial"), Some("SER-1"));
    }

    #[test]
    fn test_unflatten_keeps_scalar_and_nested_same_tag_as_siblings() {
        let record = record(&[
            ("sim_cards.sim_card", Some("present")),
            ("sim_cards.sim_card.iccid", Some("8901")),
        ]);
        let root = unflatten(&record);

        let sim_cards = root.child("sim_cards").unwrap();
        assert_eq!(sim_cards.children.len(), 2);
        assert_eq!(sim_cards.children[0].text.as_deref(), Some("present"));
        assert_eq!(
            sim_cards.children[1]
                .descend("iccid")
                .and_then(|n| n.text.as_deref()),
            Some("8901")
        );
    }

    #[test]
    fn test_filename_component_falls_back_to_unknown() {
        assert_eq!(filename_component(None), "unknown");
        assert_eq!(filename_component(Some("")), "unknown");
        assert_eq!(filename_component(Some("  ")), "unknown");
        assert_eq!(filename_component(Some("SER/01 X")), "SER_01_X");
    }

    #[test]
    fn test_write_records_names_files_by_serial_and_state() {
        let dir = tempdir().unwrap();
        let sink = ExportSink::new(dir.path());

        let batch = vec![record(&[
            ("description.document_id", Some("doc-1")),
            ("erasure.target.serial", Some("SER-1")),
            ("erasure.state", Some("Successful")),
        ])];
        assert_eq!(sink.write_records(&batch).unwrap(), 1);

        let path = dir.path().join("SER-1_Successful.xml");
        let written = fs::read_to_string(&path).unwrap();
        let document = ReportDocument::parse(&written).unwrap();
        assert_eq!(
            document
                .root
                .descend("erasure/target/serial")
                .and_then(|n| n.text.as_deref()),
            Some("SER-1")
        );
    }

    #[test]
    fn test_write_records_suffixes_colliding_names() {
        let dir = tempdir().unwrap();
        let sink = ExportSink::new(dir.path());

        let row = record(&[
            ("description.document_id", Some("doc-1")),
            ("erasure.target.serial", Some("SER-1")),
            ("erasure.state", Some("Failed")),
        ]);
        sink.write_records(&[row.clone(), row]).unwrap();

        assert!(dir.path().join("SER-1_Failed.xml").exists());
        assert!(dir.path().join("SER-1_Failed_2.xml").exists());
    }

    #[test]
    fn test_write_records_uses_unknown_for_missing_names() {
        let dir = tempdir().unwrap();
        let sink = ExportSink::new(dir.path());

        let batch = vec![record(&[("description.document_id", Some("doc-1"))])];
        sink.write_records(&batch).unwrap();

        assert!(dir.path().join("unknown_unknown.xml").exists());
    }

    #[test]
    fn test_write_raw_names_file_after_window_start() {
        let dir = tempdir().unwrap();
        let sink = ExportSink::new(dir.path()).with_raw(true);
        assert!(sink.raw());

        let window = Window {
            from: parse_boundary("2024-05-01 12:00:00").unwrap(),
            to: parse_boundary("2024-05-01 13:00:00").unwrap(),
        };
        let path = sink.write_raw(&window, "<root/>").unwrap();

        assert_eq!(
            path.file_name().and_then(|n| n.to_str()),
            Some("blancco_export_20240501120000.xml")
        );
        assert_eq!(fs::read_to_string(&path).unwrap(), "<root/>");
    }

    #[test]
    fn test_sink_creates_the_output_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("exports/today");
        let sink = ExportSink::new(&nested);

        let batch = vec![record(&[("description.document_id", Some("doc-1"))])];
        sink.write_records(&batch).unwrap();
        assert!(nested.is_dir());
    }
}

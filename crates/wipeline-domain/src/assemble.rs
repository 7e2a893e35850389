//! Report assembly: one flat record per erasure event.

use crate::document::ReportNode;
use crate::flatten::{flatten_children, flatten_node};
use crate::record::FlatRecord;

/// Staged path of the erasure's target device type, used for the disk join
pub const TARGET_TYPE_KEY: &str = "erasure.target.type";

/// Staged path of a disk entry's device type
pub const DISK_TYPE_KEY: &str = "disk.type";

/// Assemble one normalized report node into flat records.
///
/// The report's scalar sections (description, hardware without disks,
/// software, user fields) are flattened once, then overlaid onto each
/// erasure event. Disks join per cardinality: a single disk joins every
/// erasure unconditionally; with several disks an erasure takes the disks
/// whose `disk.type` equals its `erasure.target.type`, and an erasure with
/// no target type gets no disk at all. Every overlay keeps keys already set
/// by an earlier source.
///
/// A report with no erasure events assembles to an empty list; a missing
/// section contributes nothing but never fails.
pub fn assemble_report(report: &ReportNode) -> Vec<FlatRecord> {
    let blancco_data = report.child("blancco_data");
    let hardware_report = blancco_data.and_then(|n| n.child("blancco_hardware_report"));

    let description = section(blancco_data.and_then(|n| n.child("description")), "description");
    let hardware = match hardware_report {
        Some(node) => flatten_children(node.children.iter().filter(|c| c.tag != "disks"), "hardware"),
        None => FlatRecord::new(),
    };
    let software = section(
        blancco_data.and_then(|n| n.child("blancco_software_report")),
        "software",
    );
    let user_fields = section(report.child("user_data"), "user_data");

    let erasures: Vec<FlatRecord> = blancco_data
        .and_then(|n| n.descend("blancco_erasure_report/erasures"))
        .map(|n| n.children.iter().map(|e| flatten_node(e, "erasure")).collect())
        .unwrap_or_default();

    let disks: Vec<FlatRecord> = hardware_report
        .map(|n| {
            n.children
                .iter()
                .filter(|c| c.tag == "disks")
                .flat_map(|d| d.children.iter())
                .map(|d| flatten_node(d, "disk"))
                .collect()
        })
        .unwrap_or_default();

    erasures
        .into_iter()
        .map(|erasure| {
            let mut record = erasure;
            overlay(&mut record, &description);
            overlay(&mut record, &hardware);
            join_disk(&mut record, &disks);
            overlay(&mut record, &software);
            overlay(&mut record, &user_fields);
            record
        })
        .collect()
}

fn section(node: Option<&ReportNode>, prefix: &str) -> FlatRecord {
    node.map(|n| flatten_node(n, prefix)).unwrap_or_default()
}

/// Merge a section into the record without displacing earlier fields
fn overlay(record: &mut FlatRecord, fields: &FlatRecord) {
    for (key, value) in fields.iter() {
        record.insert_if_absent(key, value.map(str::to_string));
    }
}

fn join_disk(record: &mut FlatRecord, disks: &[FlatRecord]) {
    match disks {
        [] => {}
        [only] => overlay(record, only),
        many => {
            // An erasure that never names its target type joins nothing
            if let Some(target_type) = record.get(TARGET_TYPE_KEY).cloned() {
                for disk in many {
                    if disk.get(DISK_TYPE_KEY) == Some(&target_type) {
                        overlay(record, disk);
                    }
                }
            }
        }
    }
}

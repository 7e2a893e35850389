//! Batch cleansing ahead of the load.

use std::collections::HashSet;

use tracing::debug;

use crate::record::FlatRecord;

/// Field that must be present and non-null for a record to survive cleansing
pub const DOCUMENT_ID_KEY: &str = "description.document_id";

/// Maximum length, in characters, of the free-text fields listed in
/// [`TRUNCATE_FIELDS`]
pub const MAX_FIELD_CHARS: usize = 4000;

/// Free-text fields truncated to [`MAX_FIELD_CHARS`].
///
/// This list mirrors the staging columns sized for operator-entered text,
/// misspellings included (`r_workstaion` is a live field name).
pub const TRUNCATE_FIELDS: [&str; 30] = [
    "user_data.fields.batterycharging",
    "user_data.fields.comments",
    "user_data.fields.country",
    "user_data.fields.device_identifier",
    "user_data.fields.erasure_person",
    "user_data.fields.imei_2",
    "user_data.fields.imei_3",
    "user_data.fields.oppo_device_imeicache_1",
    "user_data.fields.oppo_device_imeicache_2",
    "user_data.fields.persist_sys_show_device_imei_1",
    "user_data.fields.persist_sys_updater_imei_1",
    "user_data.fields.persist_sys_updater_imei_2",
    "user_data.fields.r_counter",
    "user_data.fields.r_country",
    "user_data.fields.r_erasure",
    "user_data.fields.r_esim",
    "user_data.fields.r_fmip",
    "user_data.fields.r_frp",
    "user_data.fields.r_location",
    "user_data.fields.r_mdm",
    "user_data.fields.r_place",
    "user_data.fields.r_process",
    "user_data.fields.r_region",
    "user_data.fields.r_workstaion",
    "user_data.fields.r_workstation",
    "user_data.fields.ro_config_hw_imei_sv_enable_1",
    "user_data.fields.ro_config_hw_imei_sv_show_two_2",
    "user_data.fields.ro_imei_match_status_3",
    "user_data.fields.ro_product_imeisv_3",
    "user_data.fields.technician_name",
];

/// Cleanse one assembled batch before staging.
///
/// In order: exact full-row duplicates are dropped keeping the first
/// occurrence; records with an absent or null [`DOCUMENT_ID_KEY`] are
/// dropped; values of the [`TRUNCATE_FIELDS`] are cut to
/// [`MAX_FIELD_CHARS`] characters. Re-running over an already cleansed
/// batch changes nothing.
pub fn cleanse(batch: Vec<FlatRecord>) -> Vec<FlatRecord> {
    let incoming = batch.len();

    let mut seen = HashSet::new();
    let mut records: Vec<FlatRecord> = Vec::with_capacity(batch.len());
    for record in batch {
        if seen.insert(fingerprint(&record)) {
            records.push(record);
        }
    }
    let duplicates = incoming - records.len();

    let with_duplicates_removed = records.len();
    records.retain(|record| record.value(DOCUMENT_ID_KEY).is_some());
    let missing_identity = with_duplicates_removed - records.len();

    for record in &mut records {
        for field in TRUNCATE_FIELDS {
            if let Some(Some(value)) = record.get_mut(field) {
                if value.chars().count() > MAX_FIELD_CHARS {
                    *value = value.chars().take(MAX_FIELD_CHARS).collect();
                }
            }
        }
    }

    debug!(incoming, duplicates, missing_identity, retained = records.len(), "cleansed batch");
    records
}

/// Order-insensitive identity of a record's full field set
fn fingerprint(record: &FlatRecord) -> Vec<(String, Option<String>)> {
    let mut fields: Vec<(String, Option<String>)> = record
        .iter()
        .map(|(key, value)| (key.to_string(), value.map(str::to_string)))
        .collect();
    fields.sort();
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fields: &[(&str, Option<&str>)]) -> FlatRecord {
        fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.map(str::to_string)))
            .collect()
    }

    fn identified(extra: &[(&str, Option<&str>)]) -> FlatRecord {
        let mut rec = record(&[(DOCUMENT_ID_KEY, Some("doc-1"))]);
        for (k, v) in extra {
            rec.insert(k.to_string(), v.map(str::to_string));
        }
        rec
    }

    #[test]
    fn test_exact_duplicates_dropped_keeping_first() {
        let a = identified(&[("erasure.state", Some("Successful"))]);
        let b = identified(&[("erasure.state", Some("Successful"))]);
        let c = identified(&[("erasure.state", Some("Failed"))]);
        let cleansed = cleanse(vec![a.clone(), b, c.clone()]);
        assert_eq!(cleansed, vec![a, c]);
    }

    #[test]
    fn test_duplicate_detection_ignores_field_order() {
        let a = record(&[(DOCUMENT_ID_KEY, Some("doc-1")), ("erasure.state", Some("ok"))]);
        let b = record(&[("erasure.state", Some("ok")), (DOCUMENT_ID_KEY, Some("doc-1"))]);
        assert_eq!(cleanse(vec![a, b]).len(), 1);
    }

    #[test]
    fn test_null_and_empty_values_are_distinct_rows() {
        let a = identified(&[("erasure.state", None)]);
        let b = identified(&[("erasure.state", Some(""))]);
        assert_eq!(cleanse(vec![a, b]).len(), 2);
    }

    #[test]
    fn test_records_without_document_id_dropped() {
        let absent = record(&[("erasure.state", Some("ok"))]);
        let null = record(&[(DOCUMENT_ID_KEY, None)]);
        let empty = record(&[(DOCUMENT_ID_KEY, Some(""))]);
        let cleansed = cleanse(vec![absent, null, empty.clone()]);
        // An empty string still counts as an identity; only null/absent drop
        assert_eq!(cleansed, vec![empty]);
    }

    #[test]
    fn test_truncates_listed_fields_to_limit() {
        let long = "x".repeat(MAX_FIELD_CHARS + 50);
        let rec = identified(&[("user_data.fields.comments", Some(long.as_str()))]);
        let cleansed = cleanse(vec![rec]);
        assert_eq!(
            cleansed[0].value("user_data.fields.comments").map(str::len),
            Some(MAX_FIELD_CHARS)
        );
    }

    #[test]
    fn test_truncation_counts_characters_not_bytes() {
        let long = "ü".repeat(MAX_FIELD_CHARS + 1);
        let rec = identified(&[("user_data.fields.comments", Some(long.as_str()))]);
        let cleansed = cleanse(vec![rec]);
        let value = cleansed[0].value("user_data.fields.comments").unwrap();
        assert_eq!(value.chars().count(), MAX_FIELD_CHARS);
    }

    #[test]
    fn test_unlisted_fields_not_truncated() {
        let long = "x".repeat(MAX_FIELD_CHARS + 50);
        let rec = identified(&[("erasure.erasure_details.failure.message", Some(long.as_str()))]);
        let cleansed = cleanse(vec![rec]);
        assert_eq!(
            cleansed[0]
                .value("erasure.erasure_details.failure.message")
                .map(str::len),
            Some(MAX_FIELD_CHARS + 50)
        );
    }

    #[test]
    fn test_cleanse_is_idempotent() {
        let long = "y".repeat(MAX_FIELD_CHARS + 10);
        let batch = vec![
            identified(&[("user_data.fields.country", Some(long.as_str()))]),
            identified(&[("user_data.fields.country", Some(long.as_str()))]),
            record(&[("erasure.state", Some("orphan"))]),
        ];
        let once = cleanse(batch);
        let twice = cleanse(once.clone());
        assert_eq!(once, twice);
    }
}

//! Content-hash computation for the dedup merge key.

use sha2::{Digest, Sha256};

/// Staging columns hashed into `hash_data`, in concatenation order.
///
/// These are the identity-relevant fields of an erasure event: document id,
/// event start/end/timestamp, standard name, target serial, and the mobile
/// device identifiers.
pub const HASH_COLUMNS: [&str; 10] = [
    "description.document_id",
    "erasure.start_time",
    "erasure.end_time",
    "erasure.erasure_standard_name",
    "erasure.timestamp",
    "erasure.target.serial",
    "hardware.system.imei",
    "hardware.system.imei_two",
    "hardware.system.meid",
    "hardware.system.meid_fourteen",
];

/// SHA-256 over the concatenated field values, lower-hex encoded.
///
/// Null fields contribute an empty string, so a null and an empty value
/// hash identically. Known limitation, kept for compatibility: the fact
/// table has always conflated the two.
pub fn content_hash<'a, I>(values: I) -> String
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut hasher = Sha256::new();
    for value in values {
        hasher.update(value.unwrap_or("").as_bytes());
    }
    hex::encode(hasher.finalize())
}

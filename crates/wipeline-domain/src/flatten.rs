//! Tree-to-record flattening.
//!
//! Projects a node subtree into a [`FlatRecord`] keyed by dotted path. The
//! projection is pure: the same subtree always yields the same record, and
//! nothing outside the accumulator is touched.

use crate::document::ReportNode;
use crate::record::FlatRecord;

/// Flatten the given nodes under a dotted prefix.
///
/// Each leaf contributes `<prefix>.<tag>` (lower-cased) mapped to its text.
/// Each branch is flattened recursively under `<prefix>.<tag>`, and its
/// result is merged keeping only keys not already present, so when two
/// sibling branches produce the same path the earlier branch wins.
///
/// # Examples
///
/// ```
/// use wipeline_domain::{flatten_children, ReportNode};
///
/// let system = ReportNode::new("system")
///     .with_child(ReportNode::leaf("Serial", "XYZ-1"))
///     .with_child(ReportNode::leaf("model", "A1"));
/// let record = flatten_children([&system], "hardware");
/// assert_eq!(record.value("hardware.system.serial"), Some("XYZ-1"));
/// assert_eq!(record.value("hardware.system.model"), Some("A1"));
/// ```
pub fn flatten_children<'a, I>(nodes: I, prefix: &str) -> FlatRecord
where
    I: IntoIterator<Item = &'a ReportNode>,
{
    let mut record = FlatRecord::new();
    for node in nodes {
        let key = format!("{}.{}", prefix, node.tag);
        if node.is_leaf() {
            record.insert(key.to_lowercase(), node.text.clone());
        } else {
            let nested = flatten_children(&node.children, &key);
            for (field, value) in nested.iter() {
                record.insert_if_absent(field, value.map(str::to_string));
            }
        }
    }
    record
}

/// Flatten one node's children under a dotted prefix
pub fn flatten_node(node: &ReportNode, prefix: &str) -> FlatRecord {
    flatten_children(&node.children, prefix)
}

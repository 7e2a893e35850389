//! Tag normalizer for named entry elements.
//!
//! Export documents wrap free-form fields in generic entry elements whose
//! real name sits in a `name` attribute, e.g.
//! `<entry name="erasure_person">…</entry>`. The normalizer rewrites those
//! tags in place so the flattener can treat the whole tree uniformly.

use tracing::warn;

use crate::document::{ReportDocument, ReportNode};

/// Tags whose `name` attribute carries the real field name
const ENTRY_TAGS: [&str; 2] = ["entries", "entry"];

/// Rewrite named entry elements into semantic tags, in place.
///
/// For every node tagged `entries` or `entry` that carries a `name`
/// attribute: the tag becomes the sanitized name (spaces and periods turn
/// into underscores; a leading digit moves the first two characters to the
/// end, reversed, to keep the identifier shape valid) and the `name`
/// attribute is dropped. The `type` attribute is dropped whether or not the
/// rename succeeded. A name that cannot form a valid tag is logged and
/// skipped; sibling nodes are always still processed.
///
/// # Examples
///
/// ```
/// use wipeline_domain::{normalize, ReportDocument, ReportNode};
///
/// let mut doc = ReportDocument {
///     root: ReportNode::new("fields").with_child(
///         ReportNode::leaf("entry", "John").with_attr("name", "erasure person"),
///     ),
/// };
/// normalize(&mut doc);
/// assert_eq!(doc.root.children[0].tag, "erasure_person");
/// assert!(doc.root.children[0].attr("name").is_none());
/// ```
pub fn normalize(document: &mut ReportDocument) {
    normalize_node(&mut document.root);
}

fn normalize_node(node: &mut ReportNode) {
    if ENTRY_TAGS.contains(&node.tag.as_str()) && node.attributes.contains_key("name") {
        let name = node.attr("name").unwrap_or_default().to_string();
        match sanitize_tag(&name) {
            Ok(tag) => {
                node.tag = tag;
                node.remove_attr("name");
            }
            Err(reason) => {
                warn!(name = %name, reason, "failed to rename entry element, skipping");
            }
        }
        node.remove_attr("type");
    }
    for child in &mut node.children {
        normalize_node(child);
    }
}

/// Turn a `name` attribute value into a valid element tag
fn sanitize_tag(name: &str) -> Result<String, &'static str> {
    let mut tag = name.replace([' ', '.'], "_");
    if tag.is_empty() {
        return Err("empty name attribute");
    }
    if tag.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        let head: String = tag.chars().take(2).collect();
        let tail: String = tag.chars().skip(2).collect();
        tag = format!("{}{}", tail, head.chars().rev().collect::<String>());
    }
    if !is_valid_tag(&tag) {
        return Err("sanitized name is not a valid tag");
    }
    Ok(tag)
}

fn is_valid_tag(tag: &str) -> bool {
    let mut chars = tag.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ':'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str) -> ReportNode {
        ReportNode::leaf("entry", "value")
            .with_attr("name", name)
            .with_attr("type", "string")
    }

    fn normalized(node: ReportNode) -> ReportNode {
        let mut doc = ReportDocument { root: node };
        normalize(&mut doc);
        doc.root
    }

    #[test]
    fn test_spaces_and_periods_become_underscores() {
        let node = normalized(entry("Company name"));
        assert_eq!(node.tag, "Company_name");
        let node = normalized(entry("ro.product.model"));
        assert_eq!(node.tag, "ro_product_model");
    }

    #[test]
    fn test_name_and_type_attributes_removed_on_rename() {
        let node = normalized(entry("serial"));
        assert_eq!(node.tag, "serial");
        assert!(node.attr("name").is_none());
        assert!(node.attr("type").is_none());
    }

    #[test]
    fn test_leading_digit_rule() {
        // "2nd_pass": "2n" moves to the end reversed
        let node = normalized(entry("2nd_pass"));
        assert_eq!(node.tag, "d_passn2");
    }

    #[test]
    fn test_unsalvageable_digit_name_is_skipped() {
        let node = normalized(entry("12"));
        assert_eq!(node.tag, "entry");
        assert_eq!(node.attr("name"), Some("12"));
        assert!(node.attr("type").is_none());
    }

    #[test]
    fn test_empty_name_is_skipped_but_type_still_removed() {
        let node = normalized(entry(""));
        assert_eq!(node.tag, "entry");
        assert_eq!(node.attr("name"), Some(""));
        assert!(node.attr("type").is_none());
    }

    #[test]
    fn test_non_entry_tags_untouched() {
        let node = normalized(
            ReportNode::leaf("field", "value")
                .with_attr("name", "serial")
                .with_attr("type", "string"),
        );
        assert_eq!(node.tag, "field");
        assert_eq!(node.attr("name"), Some("serial"));
        assert_eq!(node.attr("type"), Some("string"));
    }

    #[test]
    fn test_entry_without_name_untouched() {
        let node = normalized(ReportNode::leaf("entry", "value").with_attr("type", "string"));
        assert_eq!(node.tag, "entry");
        assert_eq!(node.attr("type"), Some("string"));
    }

    #[test]
    fn test_other_attributes_survive() {
        let node = normalized(entry("serial").with_attr("unit", "GB"));
        assert_eq!(node.tag, "serial");
        assert_eq!(node.attr("unit"), Some("GB"));
    }

    #[test]
    fn test_recurses_into_children() {
        let root = ReportNode::new("user_data")
            .with_child(ReportNode::new("fields").with_child(entry("technician name")));
        let node = normalized(root);
        assert_eq!(node.children[0].children[0].tag, "technician_name");
    }

    #[test]
    fn test_one_bad_sibling_does_not_stop_the_rest() {
        let root = ReportNode::new("fields")
            .with_child(entry(""))
            .with_child(entry("country"));
        let node = normalized(root);
        assert_eq!(node.children[0].tag, "entry");
        assert_eq!(node.children[1].tag, "country");
    }
}

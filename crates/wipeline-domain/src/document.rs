//! Report document tree - the raw hierarchical form of an export response

use indexmap::IndexMap;
use std::fmt::Write as _;

use crate::error::ParseError;
use crate::parser;

/// One named node in a report document.
///
/// A node carries a tag, zero or more attributes (in document order), an
/// optional text value, and zero or more children. Leaf nodes (no children)
/// are the only nodes whose text is meaningful to the flattener; character
/// data between the children of a branch node is discarded at parse time.
///
/// # Examples
///
/// ```
/// use wipeline_domain::ReportNode;
///
/// let node = ReportNode::new("disks")
///     .with_child(ReportNode::leaf("type", "USB"))
///     .with_child(ReportNode::leaf("serial", "A1B2"));
/// assert_eq!(node.children.len(), 2);
/// assert!(node.children[0].is_leaf());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportNode {
    /// Element tag, possibly rewritten by the tag normalizer
    pub tag: String,

    /// Attributes in document order
    pub attributes: IndexMap<String, String>,

    /// Character data; `None` for an empty element
    pub text: Option<String>,

    /// Child elements in document order
    pub children: Vec<ReportNode>,
}

impl ReportNode {
    /// Create an empty node with the given tag
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: IndexMap::new(),
            text: None,
            children: Vec::new(),
        }
    }

    /// Create a leaf node carrying a text value
    pub fn leaf(tag: impl Into<String>, text: impl Into<String>) -> Self {
        let mut node = Self::new(tag);
        node.text = Some(text.into());
        node
    }

    /// Add an attribute, returning the node (builder style)
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Add a child, returning the node (builder style)
    pub fn with_child(mut self, child: ReportNode) -> Self {
        self.children.push(child);
        self
    }

    /// True when the node has no child elements
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Look up an attribute value by name
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Remove an attribute by name, preserving the order of the rest
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        self.attributes.shift_remove(name)
    }

    /// First child with the given tag
    pub fn child(&self, tag: &str) -> Option<&ReportNode> {
        self.children.iter().find(|c| c.tag == tag)
    }

    /// Walk a `/`-separated path of child tags from this node
    pub fn descend(&self, path: &str) -> Option<&ReportNode> {
        let mut current = self;
        for segment in path.split('/') {
            current = current.child(segment)?;
        }
        Some(current)
    }

    /// Render this subtree as an indented document fragment
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out, 0);
        out
    }

    fn render_into(&self, out: &mut String, depth: usize) {
        for _ in 0..depth {
            out.push_str("  ");
        }
        out.push('<');
        out.push_str(&self.tag);
        for (name, value) in &self.attributes {
            let _ = write!(out, " {}=\"{}\"", name, escape(value, true));
        }
        if self.children.is_empty() {
            match &self.text {
                Some(text) => {
                    let _ = write!(out, ">{}</{}>", escape(text, false), self.tag);
                }
                None => out.push_str("/>"),
            }
        } else {
            out.push('>');
            for child in &self.children {
                out.push('\n');
                child.render_into(out, depth + 1);
            }
            out.push('\n');
            for _ in 0..depth {
                out.push_str("  ");
            }
            let _ = write!(out, "</{}>", self.tag);
        }
    }
}

/// A parsed report-collection document.
///
/// The export API returns one document per extraction window; its root holds
/// one `report` child per erasure report in the window. The document is
/// owned transiently per cycle: parsed, normalized in place, assembled, then
/// dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportDocument {
    /// Document root
    pub root: ReportNode,
}

impl ReportDocument {
    /// Parse a document from export response text.
    ///
    /// The parser accepts the fixed export dialect: elements, attributes,
    /// character data, CDATA sections, comments and an optional XML
    /// declaration. Anything structurally malformed is a [`ParseError`].
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        parser::parse_document(input)
    }

    /// The report nodes contained in this document.
    ///
    /// Returns the root's `report` children, or the root itself when the
    /// document holds a single bare `report` element.
    pub fn reports(&self) -> Vec<&ReportNode> {
        if self.root.tag == "report" {
            vec![&self.root]
        } else {
            self.root
                .children
                .iter()
                .filter(|c| c.tag == "report")
                .collect()
        }
    }

    /// Render the whole document, declaration included
    pub fn render(&self) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{}\n",
            self.root.render()
        )
    }
}

/// Escape markup-significant characters for element or attribute context
fn escape(value: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '\'' if attribute => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

//! Namespace-agnostic lookups over `roxmltree` documents.
//!
//! SCAP documents mix several namespaces (ARF, XCCDF, OVAL, XHTML); all
//! lookups here match on local element names only.

use crate::services::reducer::ReduceError;
use roxmltree::Node;

#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[error("report is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),
    #[error("malformed XML: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("missing <{0}> element")]
    MissingElement(&'static str),
    #[error("<{element}> is missing the {attribute} attribute")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },
    #[error("unrecognised rule result {value:?} for {rule}")]
    InvalidOutcome { rule: String, value: String },
    #[error(transparent)]
    Reduce(#[from] ReduceError),
    #[error("report could not be serialized: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub fn utf8(bytes: &[u8]) -> Result<&str, ParseError> {
    Ok(std::str::from_utf8(bytes)?)
}

pub fn is_named(node: &Node, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name
}

pub fn first_descendant<'a, 'input>(
    node: Node<'a, 'input>,
    name: &'static str,
) -> Result<Node<'a, 'input>, ParseError> {
    node.descendants()
        .find(|n| is_named(n, name))
        .ok_or(ParseError::MissingElement(name))
}

pub fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| is_named(n, name))
}

pub fn required_attribute(
    node: Node,
    element: &'static str,
    attribute: &'static str,
) -> Result<String, ParseError> {
    node.attribute(attribute)
        .map(str::to_string)
        .ok_or(ParseError::MissingAttribute { element, attribute })
}

/// Concatenated text of every descendant text node.
pub fn text_content(node: Node) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}

/// Text of the named child with whitespace runs folded to single spaces,
/// or an empty string when the child is absent.
pub fn child_text(node: Node, name: &str) -> String {
    child(node, name)
        .map(|c| collapse_whitespace(&text_content(c)))
        .unwrap_or_default()
}

pub fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

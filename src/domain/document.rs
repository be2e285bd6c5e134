//! Rich-text document model produced by the post editor and stored by the CMS.
//!
//! Stored documents are a JSON tree of nodes tagged by `type`. Decoding is
//! total: anything that does not fit the schema degrades to an
//! [`Node::Unknown`] (which keeps its children) or to a raw string body, so a
//! malformed post can always be displayed.

use serde_json::{Map, Value};

/// Language class applied to code blocks that carry no language attribute.
pub const DEFAULT_CODE_LANGUAGE: &str = "plaintext";

const MAX_HEADING_LEVEL: u8 = 6;

/// Post body as received from the CMS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Document {
    /// A structured node tree.
    Tree(Node),
    /// Literal body text: either a string that is not a JSON document, or a
    /// legacy HTML body that predates the structured format.
    Raw(String),
}

impl Document {
    /// Decode a JSON value taken from a post's content field.
    ///
    /// Strings are parsed as JSON first, since some CMS versions store the
    /// document as a JSON-encoded string.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(text) => Self::parse(text),
            Value::Null => Self::Raw(String::new()),
            Value::Bool(_) | Value::Number(_) => Self::Raw(value.to_string()),
            Value::Object(_) | Value::Array(_) => Self::Tree(Node::from_value(value)),
        }
    }

    /// Parse a JSON-encoded document, falling back to treating `input` as text.
    pub fn parse(input: &str) -> Self {
        match serde_json::from_str::<Value>(input) {
            Ok(value @ (Value::Object(_) | Value::Array(_))) => Self::Tree(Node::from_value(&value)),
            _ => Self::Raw(input.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Document::Tree(node) => node.children().is_empty() && !node.is_leaf(),
            Document::Raw(text) => text.trim().is_empty(),
        }
    }
}

impl From<&Value> for Document {
    fn from(value: &Value) -> Self {
        Self::from_value(value)
    }
}

/// Inline annotation attached to a text node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mark {
    Bold,
    Italic,
    Code,
    Strike,
    Underline,
    Link { href: Option<String> },
    /// A mark type this renderer does not know; the text is kept unwrapped.
    Unknown(String),
}

impl Mark {
    fn from_value(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            return Mark::Unknown(String::new());
        };
        match node_type(object) {
            "bold" | "strong" => Mark::Bold,
            "italic" | "em" => Mark::Italic,
            "code" => Mark::Code,
            "strike" => Mark::Strike,
            "underline" => Mark::Underline,
            "link" => Mark::Link {
                href: attr_string(object, "href"),
            },
            other => Mark::Unknown(other.to_string()),
        }
    }
}

/// One element of a document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Doc {
        children: Vec<Node>,
    },
    Paragraph {
        children: Vec<Node>,
    },
    Heading {
        /// Clamped to the HTML range 1..=6.
        level: u8,
        children: Vec<Node>,
    },
    Blockquote {
        children: Vec<Node>,
    },
    BulletList {
        children: Vec<Node>,
    },
    OrderedList {
        children: Vec<Node>,
    },
    ListItem {
        children: Vec<Node>,
    },
    CodeBlock {
        language: Option<String>,
        children: Vec<Node>,
    },
    Image {
        src: Option<String>,
        alt: Option<String>,
        title: Option<String>,
    },
    Text {
        text: String,
        marks: Vec<Mark>,
    },
    HardBreak,
    HorizontalRule,
    /// Node whose `type` is not part of the schema. It renders no markup of
    /// its own but its children are still walked.
    Unknown {
        kind: String,
        children: Vec<Node>,
    },
}

impl Node {
    /// Decode a node from JSON. Never fails.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(object) => Self::from_object(object),
            Value::Array(items) => Node::Unknown {
                kind: String::new(),
                children: items.iter().map(Node::from_value).collect(),
            },
            _ => Node::Unknown {
                kind: String::new(),
                children: Vec::new(),
            },
        }
    }

    fn from_object(object: &Map<String, Value>) -> Self {
        let kind = node_type(object);
        match kind {
            "doc" => Node::Doc {
                children: decode_children(object),
            },
            "paragraph" => Node::Paragraph {
                children: decode_children(object),
            },
            "heading" => Node::Heading {
                level: heading_level(object),
                children: decode_children(object),
            },
            "blockquote" => Node::Blockquote {
                children: decode_children(object),
            },
            "bulletList" => Node::BulletList {
                children: decode_children(object),
            },
            "orderedList" => Node::OrderedList {
                children: decode_children(object),
            },
            "listItem" => Node::ListItem {
                children: decode_children(object),
            },
            "codeBlock" => Node::CodeBlock {
                language: attr_string(object, "language"),
                children: decode_children(object),
            },
            "image" => Node::Image {
                src: attr_string(object, "src"),
                alt: attr_string(object, "alt"),
                title: attr_string(object, "title"),
            },
            "text" => Node::Text {
                text: object
                    .get("text")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                marks: object
                    .get("marks")
                    .and_then(Value::as_array)
                    .map(|marks| marks.iter().map(Mark::from_value).collect())
                    .unwrap_or_default(),
            },
            "hardBreak" => Node::HardBreak,
            "horizontalRule" => Node::HorizontalRule,
            other => Node::Unknown {
                kind: other.to_string(),
                children: decode_children(object),
            },
        }
    }

    /// Child nodes in render order; empty for leaves.
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Doc { children }
            | Node::Paragraph { children }
            | Node::Heading { children, .. }
            | Node::Blockquote { children }
            | Node::BulletList { children }
            | Node::OrderedList { children }
            | Node::ListItem { children }
            | Node::CodeBlock { children, .. }
            | Node::Unknown { children, .. } => children,
            Node::Image { .. } | Node::Text { .. } | Node::HardBreak | Node::HorizontalRule => &[],
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(
            self,
            Node::Image { .. } | Node::Text { .. } | Node::HardBreak | Node::HorizontalRule
        )
    }

    /// Pre-order, document-order iterator over this node and its descendants.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }
}

pub struct Descendants<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children().iter().rev());
        Some(node)
    }
}

fn node_type(object: &Map<String, Value>) -> &str {
    object
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or_default()
}

fn decode_children(object: &Map<String, Value>) -> Vec<Node> {
    object
        .get("content")
        .and_then(Value::as_array)
        .map(|items| items.iter().map(Node::from_value).collect())
        .unwrap_or_default()
}

fn attr_string(object: &Map<String, Value>, key: &str) -> Option<String> {
    object
        .get("attrs")
        .and_then(Value::as_object)
        .and_then(|attrs| attrs.get(key))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn heading_level(object: &Map<String, Value>) -> u8 {
    let raw = object
        .get("attrs")
        .and_then(Value::as_object)
        .and_then(|attrs| attrs.get("level"))
        .and_then(|level| match level {
            Value::Number(number) => number.as_u64(),
            Value::String(text) => text.trim().parse().ok(),
            _ => None,
        })
        .unwrap_or(1);

    u8::try_from(raw).unwrap_or(MAX_HEADING_LEVEL).clamp(1, MAX_HEADING_LEVEL)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn string_content_is_parsed_as_json_first() {
        let encoded = r#"{"type":"doc","content":[{"type":"paragraph"}]}"#;
        let document = Document::from_value(&Value::String(encoded.to_string()));
        assert_eq!(
            document,
            Document::Tree(Node::Doc {
                children: vec![Node::Paragraph {
                    children: Vec::new()
                }]
            })
        );
    }

    #[test]
    fn unparseable_string_stays_raw() {
        assert_eq!(
            Document::parse("not json {"),
            Document::Raw("not json {".to_string())
        );
        // Valid JSON that is not a tree is still literal text.
        assert_eq!(Document::parse("42"), Document::Raw("42".to_string()));
    }

    #[test]
    fn null_is_an_empty_raw_body() {
        let document = Document::from_value(&Value::Null);
        assert_eq!(document, Document::Raw(String::new()));
        assert!(document.is_empty());
    }

    #[test]
    fn unknown_types_keep_their_children() {
        let node = Node::from_value(&json!({
            "type": "callout",
            "content": [{"type": "text", "text": "inside"}]
        }));

        match node {
            Node::Unknown { kind, children } => {
                assert_eq!(kind, "callout");
                assert_eq!(children.len(), 1);
            }
            other => panic!("expected unknown node, got {other:?}"),
        }
    }

    #[test]
    fn heading_level_is_clamped_and_accepts_strings() {
        let deep = Node::from_value(&json!({"type": "heading", "attrs": {"level": 9}}));
        assert!(matches!(deep, Node::Heading { level: 6, .. }));

        let textual = Node::from_value(&json!({"type": "heading", "attrs": {"level": "2"}}));
        assert!(matches!(textual, Node::Heading { level: 2, .. }));

        let missing = Node::from_value(&json!({"type": "heading"}));
        assert!(matches!(missing, Node::Heading { level: 1, .. }));

        let zero = Node::from_value(&json!({"type": "heading", "attrs": {"level": 0}}));
        assert!(matches!(zero, Node::Heading { level: 1, .. }));
    }

    #[test]
    fn marks_decode_in_order() {
        let node = Node::from_value(&json!({
            "type": "text",
            "text": "x",
            "marks": [
                {"type": "bold"},
                {"type": "link", "attrs": {"href": "https://example.com"}},
                {"type": "highlight"}
            ]
        }));

        assert_eq!(
            node,
            Node::Text {
                text: "x".to_string(),
                marks: vec![
                    Mark::Bold,
                    Mark::Link {
                        href: Some("https://example.com".to_string())
                    },
                    Mark::Unknown("highlight".to_string()),
                ],
            }
        );
    }

    #[test]
    fn wrongly_typed_fields_degrade_instead_of_failing() {
        let node = Node::from_value(&json!({
            "type": "paragraph",
            "content": "not-an-array",
            "text": 12
        }));
        assert_eq!(
            node,
            Node::Paragraph {
                children: Vec::new()
            }
        );

        let text = Node::from_value(&json!({"type": "text", "text": 12, "marks": {}}));
        assert_eq!(
            text,
            Node::Text {
                text: String::new(),
                marks: Vec::new()
            }
        );
    }

    #[test]
    fn descendants_walk_in_document_order() {
        let node = Node::from_value(&json!({
            "type": "doc",
            "content": [
                {"type": "paragraph", "content": [{"type": "text", "text": "a"}]},
                {"type": "image", "attrs": {"src": "b"}},
                {"type": "text", "text": "c"}
            ]
        }));

        let order: Vec<String> = node
            .descendants()
            .filter_map(|node| match node {
                Node::Text { text, .. } => Some(text.clone()),
                Node::Image { src, .. } => src.clone(),
                _ => None,
            })
            .collect();

        assert_eq!(order, vec!["a", "b", "c"]);
    }
}

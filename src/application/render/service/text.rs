use std::{cell::RefCell, rc::Rc};

use lol_html::html_content::TextType;
use lol_html::{RewriteStrSettings, doc_text, element, end_tag, rewrite_str};
use tracing::debug;

use crate::domain::document::{Document, Node};

const ELLIPSIS: &str = "...";

/// Elements whose tags separate words once markup is stripped.
const BLOCK_ELEMENTS: &str = "address, article, aside, blockquote, br, dd, div, dl, dt, \
     figcaption, figure, footer, h1, h2, h3, h4, h5, h6, header, hr, li, main, nav, ol, p, \
     pre, section, table, td, th, tr, ul";

/// Extract whitespace-collapsed plain text, bounded to `max_length` characters.
///
/// The result matches stripping tags from [`render_to_html`] output with
/// entities decoded. When the text is longer than `max_length` it is cut and
/// `...` is appended, so the result never exceeds `max_length + 3` characters.
///
/// [`render_to_html`]: super::html::render_to_html
pub fn extract_plain_text(document: &Document, max_length: usize) -> String {
    let text = match document {
        Document::Tree(node) => {
            let mut raw = String::new();
            collect_text(&mut raw, node);
            collapse_whitespace(&raw)
        }
        Document::Raw(body) => collapse_whitespace(&html_to_text(body)),
    };

    truncate_chars(&text, max_length)
}

fn collect_text(out: &mut String, node: &Node) {
    match node {
        Node::Text { text, .. } => out.push_str(text),
        Node::HardBreak | Node::HorizontalRule => out.push(' '),
        Node::Image { .. } => {}
        Node::Doc { children } | Node::Unknown { children, .. } => {
            for child in children {
                collect_text(out, child);
            }
        }
        Node::Paragraph { children }
        | Node::Heading { children, .. }
        | Node::Blockquote { children }
        | Node::BulletList { children }
        | Node::OrderedList { children }
        | Node::ListItem { children }
        | Node::CodeBlock { children, .. } => {
            out.push(' ');
            for child in children {
                collect_text(out, child);
            }
            out.push(' ');
        }
    }
}

fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_chars(text: &str, max_length: usize) -> String {
    match text.char_indices().nth(max_length) {
        None => text.to_string(),
        Some((cut, _)) => format!("{}{ELLIPSIS}", text[..cut].trim_end()),
    }
}

/// Text content of an HTML fragment with entities decoded.
///
/// Script and style bodies and comments are dropped. Block element
/// boundaries become spaces; inline tags join their text.
fn html_to_text(html: &str) -> String {
    let buffer = Rc::new(RefCell::new(String::with_capacity(html.len())));

    let result = rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![element!(BLOCK_ELEMENTS, {
                let buffer = Rc::clone(&buffer);
                move |el| {
                    buffer.borrow_mut().push(' ');
                    if el.can_have_content() {
                        let buffer = Rc::clone(&buffer);
                        el.on_end_tag(end_tag!(move |_end| {
                            buffer.borrow_mut().push(' ');
                            Ok(())
                        }))?;
                    }
                    Ok(())
                }
            })],
            document_content_handlers: vec![doc_text!({
                let buffer = Rc::clone(&buffer);
                move |chunk| {
                    if matches!(chunk.text_type(), TextType::Data | TextType::RCData) {
                        buffer.borrow_mut().push_str(chunk.as_str());
                    }
                    Ok(())
                }
            })],
            ..RewriteStrSettings::default()
        },
    );

    if let Err(err) = result {
        debug!(error = %err, "legacy body could not be fully parsed for text");
    }

    let text = buffer.take();
    html_escape::decode_html_entities(&text).into_owned()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::application::render::service::html::render_to_html;

    fn document(value: serde_json::Value) -> Document {
        Document::from_value(&value)
    }

    #[test]
    fn blocks_are_separated_by_spaces() {
        let doc = document(json!({
            "type": "doc",
            "content": [
                {"type": "heading", "attrs": {"level": 1}, "content": [{"type": "text", "text": "Title"}]},
                {"type": "paragraph", "content": [
                    {"type": "text", "text": "bold", "marks": [{"type": "bold"}]},
                    {"type": "text", "text": "er and   more"}
                ]}
            ]
        }));
        assert_eq!(extract_plain_text(&doc, 160), "Title bolder and more");
    }

    #[test]
    fn truncation_appends_ellipsis_only_when_cut() {
        let doc = Document::Raw("abcdef".to_string());
        assert_eq!(extract_plain_text(&doc, 6), "abcdef");
        assert_eq!(extract_plain_text(&doc, 3), "abc...");
        assert_eq!(extract_plain_text(&doc, 0), "...");
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let doc = Document::Raw("안녕하세요 세계".to_string());
        assert_eq!(extract_plain_text(&doc, 5), "안녕하세요...");
        assert_eq!(extract_plain_text(&doc, 6), "안녕하세요...");
    }

    #[test]
    fn output_is_bounded_for_every_length() {
        let doc = document(json!({
            "type": "doc",
            "content": [
                {"type": "paragraph", "content": [{"type": "text", "text": "The quick brown fox jumps over the lazy dog"}]},
                {"type": "codeBlock", "content": [{"type": "text", "text": "fn main() {}"}]}
            ]
        }));
        for max in 0..80 {
            let text = extract_plain_text(&doc, max);
            assert!(text.chars().count() <= max + ELLIPSIS.len(), "max={max}: {text}");
        }
    }

    #[test]
    fn raw_html_bodies_are_stripped_and_decoded() {
        let doc = Document::Raw("<p>Fish &amp; chips</p><p>a &lt; b</p>".to_string());
        assert_eq!(extract_plain_text(&doc, 160), "Fish & chips a < b");

        let unterminated = Document::Raw("a < b and c".to_string());
        assert_eq!(extract_plain_text(&unterminated, 160), "a < b and c");
    }

    #[test]
    fn raw_html_drops_scripts_styles_and_comments() {
        let doc = Document::Raw(
            "<style>p { color: red }</style><p>It&#8217;s here</p>\
             <script>var secret = 1;</script><!-- a > b -->"
                .to_string(),
        );
        assert_eq!(extract_plain_text(&doc, 160), "It\u{2019}s here");
    }

    #[test]
    fn raw_html_decodes_numeric_and_named_entities() {
        let doc = Document::Raw("<p>caf&eacute; &#x2014; na&#239;ve&nbsp;text</p>".to_string());
        assert_eq!(extract_plain_text(&doc, 160), "caf\u{e9} \u{2014} na\u{ef}ve text");
    }

    #[test]
    fn raw_html_joins_inline_and_splits_blocks() {
        let doc = Document::Raw("<p><strong>bold</strong>er</p><p>next<br>line</p>".to_string());
        assert_eq!(extract_plain_text(&doc, 160), "bolder next line");
    }

    #[test]
    fn malformed_input_yields_plain_text() {
        let doc = Document::parse("not json {");
        assert_eq!(extract_plain_text(&doc, 160), "not json {");
    }

    #[test]
    fn matches_stripped_html() {
        let doc = document(json!({
            "type": "doc",
            "content": [
                {"type": "blockquote", "content": [{"type": "paragraph", "content": [{"type": "text", "text": "Fish & chips"}]}]},
                {"type": "bulletList", "content": [
                    {"type": "listItem", "content": [{"type": "paragraph", "content": [{"type": "text", "text": "one"}]}]},
                    {"type": "listItem", "content": [{"type": "paragraph", "content": [{"type": "text", "text": "two", "marks": [{"type": "code"}]}]}]}
                ]},
                {"type": "paragraph", "content": [
                    {"type": "text", "text": "bold", "marks": [{"type": "bold"}]},
                    {"type": "text", "text": "er", "marks": [{"type": "italic"}]},
                    {"type": "hardBreak"},
                    {"type": "text", "text": "a<b"}
                ]},
                {"type": "image", "attrs": {"src": "/x.png", "alt": "ignored"}}
            ]
        }));

        let stripped = Document::Raw(render_to_html(&doc));
        assert_eq!(
            extract_plain_text(&stripped, usize::MAX),
            extract_plain_text(&doc, usize::MAX)
        );
    }
}

use std::borrow::Cow;

use crate::domain::document::{DEFAULT_CODE_LANGUAGE, Document, Mark, Node};

/// Render a document to HTML.
///
/// Text and attribute values are escaped. Containers that end up with no
/// content emit nothing, so every emitted opening tag has its closing tag.
pub fn render_to_html(document: &Document) -> String {
    match document {
        Document::Tree(node) => {
            let mut out = String::new();
            write_node(&mut out, node);
            out
        }
        Document::Raw(text) if text.is_empty() => String::new(),
        Document::Raw(text) => format!("<p>{}</p>", escape_html(text)),
    }
}

fn write_node(out: &mut String, node: &Node) {
    match node {
        Node::Doc { children } | Node::Unknown { children, .. } => write_children(out, children),
        Node::Paragraph { children } => write_container(out, "<p>", "</p>", children),
        Node::Heading { level, children } => {
            let open = format!("<h{level}>");
            let close = format!("</h{level}>");
            write_container(out, &open, &close, children);
        }
        Node::Blockquote { children } => {
            write_container(out, "<blockquote>", "</blockquote>", children)
        }
        Node::BulletList { children } => write_container(out, "<ul>", "</ul>", children),
        Node::OrderedList { children } => write_container(out, "<ol>", "</ol>", children),
        Node::ListItem { children } => write_container(out, "<li>", "</li>", children),
        Node::CodeBlock { language, children } => {
            let language = language
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .unwrap_or(DEFAULT_CODE_LANGUAGE);
            let open = format!("<pre><code class=\"language-{}\">", escape_html(language));
            write_container(out, &open, "</code></pre>", children);
        }
        Node::Image { src, alt, title } => write_image(out, src, alt, title),
        Node::Text { text, marks } => write_text(out, text, marks),
        Node::HardBreak => out.push_str("<br/>"),
        Node::HorizontalRule => out.push_str("<hr/>"),
    }
}

fn write_children(out: &mut String, children: &[Node]) {
    for child in children {
        write_node(out, child);
    }
}

fn write_container(out: &mut String, open: &str, close: &str, children: &[Node]) {
    let mut inner = String::new();
    write_children(&mut inner, children);
    if inner.is_empty() {
        return;
    }
    out.push_str(open);
    out.push_str(&inner);
    out.push_str(close);
}

fn write_image(out: &mut String, src: &Option<String>, alt: &Option<String>, title: &Option<String>) {
    let Some(src) = src.as_deref().filter(|src| !src.is_empty()) else {
        return;
    };
    if !is_safe_url(src, UrlContext::Image) {
        return;
    }

    out.push_str("<img src=\"");
    out.push_str(&escape_html(src));
    out.push('"');
    if let Some(alt) = alt {
        out.push_str(" alt=\"");
        out.push_str(&escape_html(alt));
        out.push('"');
    }
    if let Some(title) = title {
        out.push_str(" title=\"");
        out.push_str(&escape_html(title));
        out.push('"');
    }
    out.push_str("/>");
}

fn write_text(out: &mut String, text: &str, marks: &[Mark]) {
    if text.is_empty() {
        return;
    }

    // The first mark ends up innermost.
    let mut html = escape_html(text).into_owned();
    for mark in marks {
        html = match mark {
            Mark::Bold => format!("<strong>{html}</strong>"),
            Mark::Italic => format!("<em>{html}</em>"),
            Mark::Code => format!("<code>{html}</code>"),
            Mark::Strike => format!("<s>{html}</s>"),
            Mark::Underline => format!("<u>{html}</u>"),
            Mark::Link { href: Some(href) } if is_safe_url(href, UrlContext::Link) => {
                format!("<a href=\"{}\">{html}</a>", escape_html(href))
            }
            Mark::Link { .. } | Mark::Unknown(_) => html,
        };
    }
    out.push_str(&html);
}

fn escape_html(input: &str) -> Cow<'_, str> {
    html_escape::encode_quoted_attribute(input)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum UrlContext {
    Link,
    Image,
}

/// Rejects URLs whose scheme can execute script. `data:` is allowed only for
/// inline images.
fn is_safe_url(url: &str, context: UrlContext) -> bool {
    // Browsers ignore whitespace and control characters inside the scheme.
    let compact: String = url
        .chars()
        .filter(|ch| !ch.is_ascii_whitespace() && !ch.is_control())
        .take(32)
        .collect::<String>()
        .to_ascii_lowercase();

    let scheme = match compact.find(':') {
        Some(index) if !compact[..index].contains(['/', '?', '#']) => &compact[..index],
        _ => return true,
    };

    match scheme {
        "javascript" | "vbscript" => false,
        "data" => context == UrlContext::Image && compact.starts_with("data:image/"),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn render(value: serde_json::Value) -> String {
        render_to_html(&Document::from_value(&value))
    }

    #[test]
    fn renders_containers_in_order() {
        let html = render(json!({
            "type": "doc",
            "content": [
                {"type": "blockquote", "content": [
                    {"type": "paragraph", "content": [{"type": "text", "text": "quoted"}]}
                ]},
                {"type": "bulletList", "content": [
                    {"type": "listItem", "content": [{"type": "paragraph", "content": [{"type": "text", "text": "one"}]}]},
                    {"type": "listItem", "content": [{"type": "paragraph", "content": [{"type": "text", "text": "two"}]}]}
                ]},
                {"type": "orderedList", "content": [
                    {"type": "listItem", "content": [{"type": "text", "text": "first"}]}
                ]}
            ]
        }));

        assert_eq!(
            html,
            "<blockquote><p>quoted</p></blockquote>\
             <ul><li><p>one</p></li><li><p>two</p></li></ul>\
             <ol><li>first</li></ol>"
        );
    }

    #[test]
    fn code_blocks_carry_language_class() {
        let with_language = render(json!({
            "type": "codeBlock",
            "attrs": {"language": "rust"},
            "content": [{"type": "text", "text": "let x = 1 < 2;"}]
        }));
        assert_eq!(
            with_language,
            "<pre><code class=\"language-rust\">let x = 1 &lt; 2;</code></pre>"
        );

        let without_language = render(json!({
            "type": "codeBlock",
            "content": [{"type": "text", "text": "plain"}]
        }));
        assert_eq!(
            without_language,
            "<pre><code class=\"language-plaintext\">plain</code></pre>"
        );
    }

    #[test]
    fn marks_wrap_first_innermost() {
        let html = render(json!({
            "type": "text",
            "text": "hi",
            "marks": [
                {"type": "bold"},
                {"type": "italic"},
                {"type": "link", "attrs": {"href": "https://example.com/?a=1&b=2"}}
            ]
        }));
        assert_eq!(
            html,
            "<a href=\"https://example.com/?a=1&amp;b=2\"><em><strong>hi</strong></em></a>"
        );
    }

    #[test]
    fn text_is_escaped() {
        let html = render(json!({
            "type": "paragraph",
            "content": [{"type": "text", "text": "<script>alert(\"x\")</script>"}]
        }));
        assert_eq!(
            html,
            "<p>&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt;</p>"
        );
    }

    #[test]
    fn scriptable_links_render_as_text() {
        let html = render(json!({
            "type": "text",
            "text": "click",
            "marks": [{"type": "link", "attrs": {"href": " JaVa\tScript:alert(1)"}}]
        }));
        assert_eq!(html, "click");

        let data_link = render(json!({
            "type": "text",
            "text": "data",
            "marks": [{"type": "link", "attrs": {"href": "data:text/html,<b>x</b>"}}]
        }));
        assert_eq!(data_link, "data");
    }

    #[test]
    fn images_need_a_source() {
        assert_eq!(render(json!({"type": "image", "attrs": {"alt": "none"}})), "");
        assert_eq!(render(json!({"type": "image", "attrs": {"src": ""}})), "");
        assert_eq!(
            render(json!({"type": "image", "attrs": {"src": "/a.png", "alt": "A \"cat\""}})),
            "<img src=\"/a.png\" alt=\"A &quot;cat&quot;\"/>"
        );
        assert_eq!(
            render(json!({"type": "image", "attrs": {"src": "data:image/png;base64,AAAA"}})),
            "<img src=\"data:image/png;base64,AAAA\"/>"
        );
        assert_eq!(
            render(json!({"type": "image", "attrs": {"src": "javascript:alert(1)"}})),
            ""
        );
    }

    #[test]
    fn empty_nodes_emit_nothing() {
        let html = render(json!({
            "type": "doc",
            "content": [
                {"type": "paragraph"},
                {"type": "paragraph", "content": [{"type": "text", "text": ""}]},
                {"type": "heading", "attrs": {"level": 2}, "content": []}
            ]
        }));
        assert_eq!(html, "");
    }

    #[test]
    fn unknown_nodes_pass_children_through() {
        let html = render(json!({
            "type": "doc",
            "content": [{"type": "callout", "content": [
                {"type": "paragraph", "content": [{"type": "text", "text": "kept"}]}
            ]}]
        }));
        assert_eq!(html, "<p>kept</p>");
    }

    #[test]
    fn breaks_and_rules() {
        let html = render(json!({
            "type": "doc",
            "content": [
                {"type": "paragraph", "content": [
                    {"type": "text", "text": "a"},
                    {"type": "hardBreak"},
                    {"type": "text", "text": "b"}
                ]},
                {"type": "horizontalRule"}
            ]
        }));
        assert_eq!(html, "<p>a<br/>b</p><hr/>");
    }

    #[test]
    fn raw_strings_are_wrapped_and_escaped() {
        assert_eq!(
            render_to_html(&Document::parse("not json {")),
            "<p>not json {</p>"
        );
        assert_eq!(
            render_to_html(&Document::parse("a & <b>")),
            "<p>a &amp; &lt;b&gt;</p>"
        );
        assert_eq!(render_to_html(&Document::Raw(String::new())), "");
    }

    #[test]
    fn relative_and_fragment_urls_are_safe() {
        assert!(is_safe_url("/posts/a:b", UrlContext::Link));
        assert!(is_safe_url("#section", UrlContext::Link));
        assert!(is_safe_url("mailto:me@example.com", UrlContext::Link));
        assert!(!is_safe_url("vbscript:msgbox", UrlContext::Link));
    }
}

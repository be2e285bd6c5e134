use std::{cell::RefCell, rc::Rc};

use lol_html::{RewriteStrSettings, element, rewrite_str};
use tracing::debug;

use crate::domain::document::{Document, Node};

/// Return the `src` of the first image in document order, verbatim.
///
/// Raw bodies are scanned for the first `<img src>` so legacy HTML posts
/// still yield a thumbnail.
pub fn extract_first_image(document: &Document) -> Option<String> {
    match document {
        Document::Tree(node) => node.descendants().find_map(|node| match node {
            Node::Image { src: Some(src), .. } if !src.is_empty() => Some(src.clone()),
            _ => None,
        }),
        Document::Raw(body) => scan_html_for_image(body),
    }
}

fn scan_html_for_image(html: &str) -> Option<String> {
    let found: Rc<RefCell<Option<String>>> = Rc::new(RefCell::new(None));
    let result = rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![element!("img[src]", {
                let found = Rc::clone(&found);
                move |el| {
                    let mut found = found.borrow_mut();
                    if found.is_none()
                        && let Some(src) = el.get_attribute("src")
                        && !src.is_empty()
                    {
                        *found = Some(src);
                    }
                    Ok(())
                }
            })],
            ..RewriteStrSettings::default()
        },
    );

    if let Err(err) = result {
        debug!(error = %err, "legacy body could not be scanned for images");
        return None;
    }

    found.take()
}

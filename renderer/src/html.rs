//! HTML placeholders for the interactive widgets.
//!
//! Each valid block becomes a `div.interactive-<kind>` whose `data-config`
//! attribute holds the author's configuration as JSON, keys unchanged; the
//! page's scripts hydrate it.
//! A `<noscript>` fallback shows the title. Invalid blocks become a warning
//! admonition so authors notice them in the built site.

use fencekit::{BlockKind, Document, Segment};
use tracing::warn;

use crate::descriptor::Descriptor;
use crate::pipeline::process_block;

/// Render one descriptor as its widget placeholder.
///
/// Fails when the configuration has no JSON form, such as a mapping keyed by a sequence.
pub fn render_widget(descriptor: &Descriptor) -> Result<String, serde_json::Error> {
    let config = serde_json::to_string(&descriptor.config)?;
    Ok(format!(
        "<div class=\"interactive-{}\" data-config=\"{}\"><noscript><p><strong>{}</strong> (requires JavaScript)</p></noscript></div>",
        descriptor.widget.kind(),
        escape_attribute(&config),
        escape_text(&descriptor.title),
    ))
}

/// The admonition shown in place of a block that failed validation.
pub fn render_invalid(kind: BlockKind) -> String {
    format!(
        "<div class=\"admonition warning\"><p>Invalid interactive component configuration ({})</p></div>",
        kind
    )
}

/// Rewrite a page, replacing every recognized block with its HTML.
/// Prose, other code fences and unterminated fences are copied verbatim.
pub fn transform_page(document: &Document) -> String {
    let mut out = String::with_capacity(document.source().len());
    for segment in document.segments() {
        match segment {
            Segment::Text(text) => out.push_str(text),
            Segment::Block(block) => {
                let html = match process_block(&block).map(|d| render_widget(&d)) {
                    Ok(Ok(html)) => html,
                    Ok(Err(e)) => {
                        warn!(block = %block.id, error = %e, "cannot embed block configuration");
                        render_invalid(block.kind)
                    }
                    Err(_) => render_invalid(block.kind),
                };
                out.push_str(&html);
                if document.source()[block.span.bytes.clone()].ends_with('\n') {
                    out.push('\n');
                }
            }
        }
    }
    out
}

fn escape_attribute(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('\'', "&#39;")
        .replace('"', "&quot;")
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

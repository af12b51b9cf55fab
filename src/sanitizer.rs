//! HTML sanitization for submitted translation bodies.
//!
//! Every value is cleaned before it reaches the store; stored values
//! are already clean and are never re-sanitized on read. The allow-list
//! matches rich post content: common block and inline markup survives,
//! anything script-executing is stripped.

use std::collections::HashSet;
use std::sync::OnceLock;

use ammonia::Builder;

/// Sanitizer shared across requests (initialized lazily).
static SANITIZER: OnceLock<Builder<'static>> = OnceLock::new();

fn sanitizer() -> &'static Builder<'static> {
    SANITIZER.get_or_init(|| {
        let mut builder = Builder::new();

        let tags: HashSet<&str> = [
            "a", "abbr", "b", "blockquote", "br", "caption", "cite", "code", "col", "colgroup",
            "dd", "del", "div", "dl", "dt", "em", "figcaption", "figure", "h1", "h2", "h3", "h4",
            "h5", "h6", "hr", "i", "img", "ins", "li", "mark", "ol", "p", "pre", "q", "s", "small",
            "span", "strike", "strong", "sub", "sup", "table", "tbody", "td", "tfoot", "th",
            "thead", "tr", "u", "ul",
        ]
        .into_iter()
        .collect();

        builder
            .tags(tags)
            .add_generic_attributes(&["class", "id", "title", "dir", "lang"])
            .add_tag_attributes("a", &["href", "rel", "target"])
            .add_tag_attributes("img", &["src", "alt", "width", "height"])
            .add_tag_attributes("td", &["colspan", "rowspan"])
            .add_tag_attributes("th", &["colspan", "rowspan", "scope"])
            .add_tag_attributes("ol", &["start", "type"])
            .url_schemes(["http", "https", "mailto"].into_iter().collect())
            .link_rel(None);

        builder
    })
}

/// Clean untrusted HTML down to the rich-content allow-list.
///
/// Never fails: unsafe input degrades to its safe subset rather than
/// being rejected. Idempotent: `clean(clean(x)) == clean(x)`.
pub fn clean(html: &str) -> String {
    sanitizer().clean(html).to_string()
}

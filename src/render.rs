//! Content rendering pipeline.
//!
//! The standalone counterpart of the host CMS's `the_content` filter
//! stack. Rendering is context-sensitive (shortcodes resolve against
//! the content item being displayed), so the context travels as an
//! explicit [`RenderContext`] parameter instead of a process-wide
//! "current item" global; there is nothing to save and restore around
//! a nested render.
//!
//! Filters are registered against the chain at startup and applied in
//! registration order. The same chain renders canonical bodies and
//! translated bodies, which is what makes the exporter's RENDERED
//! format identical to front-end rendering.

use std::sync::OnceLock;

use regex::Regex;

use crate::db::ContentItem;
use crate::i18n::Language;
use crate::router;

/// The content item and language a body is being rendered for.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub item: &'a ContentItem,
    pub language: &'a Language,
}

/// A single stage of the rendering pipeline.
pub trait ContentFilter: Send + Sync {
    /// Filter name, used in logs.
    fn name(&self) -> &'static str;

    fn apply(&self, body: &str, ctx: &RenderContext<'_>) -> String;
}

/// Ordered chain of content filters.
pub struct FilterChain {
    filters: Vec<Box<dyn ContentFilter>>,
}

impl FilterChain {
    /// An empty chain. Filters run in the order they are registered.
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// The chain every deployment gets: paragraph auto-formatting
    /// followed by shortcode expansion.
    pub fn with_defaults() -> Self {
        let mut chain = Self::new();
        chain.register(Box::new(AutoParagraphFilter));
        chain.register(Box::new(ShortcodeFilter));
        chain
    }

    pub fn register(&mut self, filter: Box<dyn ContentFilter>) {
        tracing::debug!("Registering content filter '{}'", filter.name());
        self.filters.push(filter);
    }

    /// Run the full chain over a body for the given context.
    pub fn render(&self, body: &str, ctx: &RenderContext<'_>) -> String {
        self.filters
            .iter()
            .fold(body.to_string(), |acc, f| f.apply(&acc, ctx))
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl Default for FilterChain {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Wraps bare blocks of text in `<p>` tags. Blocks are separated by
/// blank lines; blocks that already start with a tag are left alone.
pub struct AutoParagraphFilter;

impl ContentFilter for AutoParagraphFilter {
    fn name(&self) -> &'static str {
        "auto_paragraph"
    }

    fn apply(&self, body: &str, _ctx: &RenderContext<'_>) -> String {
        body.split("\n\n")
            .map(str::trim)
            .filter(|block| !block.is_empty())
            .map(|block| {
                if block.starts_with('<') {
                    block.to_string()
                } else {
                    format!("<p>{}</p>", block)
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Expands `[shortcode]` constructs against the render context:
/// `[title]` becomes the item's title, `[permalink]` its
/// language-aware link. Unknown shortcodes are left untouched.
pub struct ShortcodeFilter;

static SHORTCODE_RE: OnceLock<Regex> = OnceLock::new();

impl ContentFilter for ShortcodeFilter {
    fn name(&self) -> &'static str {
        "shortcode"
    }

    fn apply(&self, body: &str, ctx: &RenderContext<'_>) -> String {
        let re = SHORTCODE_RE
            .get_or_init(|| Regex::new(r"\[([a-z_]+)\]").expect("shortcode pattern is valid"));

        re.replace_all(body, |caps: &regex::Captures<'_>| match &caps[1] {
            "title" => ctx.item.title.clone(),
            "permalink" => router::content_link(ctx.item, ctx.language),
            _ => caps[0].to_string(),
        })
        .into_owned()
    }
}

//! Read-time content resolution.
//!
//! Resolution never fails: every invalid or missing case degrades to
//! the canonical body. The default language always resolves straight
//! to canonical content; no translation entry is consulted for it.

use tracing::warn;

use crate::db::{ContentItem, Database};
use crate::i18n::LanguageRegistry;

/// The body to display for a content item in the requested language.
///
/// Returns the stored translated body when `requested` is a valid
/// non-default code with a non-empty entry; the canonical body in
/// every other case (default code, unregistered code, no translation
/// set, absent entry, empty entry, or a store read failure).
pub fn resolve(
    db: &Database,
    registry: &LanguageRegistry,
    item: &ContentItem,
    requested: &str,
) -> String {
    if requested == registry.default_code() || !registry.is_valid(requested) {
        return item.body.clone();
    }

    let set = match db.get_translations(item.id) {
        Ok(set) => set,
        Err(e) => {
            warn!(
                "Falling back to canonical body for item {}: {:#}",
                item.id, e
            );
            return item.body.clone();
        }
    };

    match set.as_ref().and_then(|s| s.get(requested)) {
        Some(body) if !body.is_empty() => body.to_string(),
        _ => item.body.clone(),
    }
}

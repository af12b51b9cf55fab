//! The translation editing surface: form-field decoding, the save
//! policy, and the tabbed-editor state machine.
//!
//! Submissions arrive as `translations[<code>]` form fields plus a
//! one-time edit token. Saving replaces the whole stored map; keys are
//! validated against the language registry and every value is
//! sanitized before it reaches the store.

use std::collections::BTreeMap;

use anyhow::Result;
use thiserror::Error;
use tracing::warn;

use crate::config::Config;
use crate::db::{Database, TranslationSet};
use crate::i18n::LanguageRegistry;
use crate::sanitizer;
use crate::security;

/// Why a write was rejected. Rejections are silent toward the caller:
/// nothing is persisted and no detail is returned beyond the refusal.
#[derive(Debug, Error)]
pub enum SaveError {
    /// Caller lacks edit rights on the content item.
    #[error("permission denied")]
    PermissionDenied,

    /// The one-time edit token is missing, wrong, expired, or reused,
    /// or the content item does not exist.
    #[error("invalid request")]
    InvalidRequest,

    /// Store failure unrelated to the caller.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Decode `translations[<code>]` form fields into a sanitized
/// [`TranslationSet`].
///
/// Keys that are not of that shape, name an unregistered code, or name
/// the default code (whose content is the canonical body, never a
/// stored translation) are dropped with a warning; the rest of the
/// submission stands.
pub fn decode_translation_fields<'a, I>(fields: I, registry: &LanguageRegistry) -> TranslationSet
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut set = TranslationSet::new();

    for (key, value) in fields {
        let code = match key
            .strip_prefix("translations[")
            .and_then(|k| k.strip_suffix(']'))
        {
            Some(code) => code,
            None => continue,
        };

        if !registry.is_valid(code) {
            warn!("Dropping translation field for unregistered language '{}'", code);
            continue;
        }
        if code == registry.default_code() {
            warn!("Dropping translation field for default language '{}'", code);
            continue;
        }

        set.insert(code, sanitizer::clean(value));
    }

    set
}

/// Persist a translation submission for a content item.
///
/// Enforced in order: the content item must exist, the caller must
/// present the editor API key (edit rights), and the one-time edit
/// token must verify and consume. Only then is the decoded, sanitized
/// map stored, replacing any prior value. Returns the stored set.
pub fn save_translations<'a, I>(
    db: &Database,
    config: &Config,
    registry: &LanguageRegistry,
    content_id: i64,
    api_key: Option<&str>,
    token: Option<&str>,
    fields: I,
) -> Result<TranslationSet, SaveError>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    if db.get_content(content_id)?.is_none() {
        warn!("Rejected translation save for unknown item {}", content_id);
        return Err(SaveError::InvalidRequest);
    }

    if !security::verify_api_key(&config.api_key, api_key) {
        warn!("Rejected translation save for item {}: bad API key", content_id);
        return Err(SaveError::PermissionDenied);
    }

    let token = token.ok_or_else(|| {
        warn!("Rejected translation save for item {}: missing token", content_id);
        SaveError::InvalidRequest
    })?;
    if !db.consume_edit_token(content_id, token, config.token_ttl_secs)? {
        warn!("Rejected translation save for item {}: bad token", content_id);
        return Err(SaveError::InvalidRequest);
    }

    let set = decode_translation_fields(fields, registry);
    db.put_translations(content_id, &set)?;

    Ok(set)
}

/// The tabbed editor's state machine.
///
/// One holding field per non-default language plus a single live
/// widget buffer showing the active language. Switching tabs flushes
/// the buffer into the outgoing language's holding field before the
/// buffer is replaced, and the flush always re-reads the current
/// buffer, so the last-edited content survives any sequence of
/// switches, mode changes, teardown, and submit.
#[derive(Debug)]
pub struct TranslationEditor {
    active: Option<String>,
    widget: String,
    fields: BTreeMap<String, String>,
}

impl TranslationEditor {
    /// Open the editor over a content item's stored translations. Tabs
    /// are the registry's non-default languages in order; the first tab
    /// starts active.
    pub fn new(registry: &LanguageRegistry, existing: Option<&TranslationSet>) -> Self {
        let mut fields = BTreeMap::new();
        let mut order = Vec::new();
        for lang in registry.translatable() {
            let value = existing
                .and_then(|set| set.get(&lang.code))
                .unwrap_or_default();
            fields.insert(lang.code.clone(), value.to_string());
            order.push(lang.code.clone());
        }

        let active = order.first().cloned();
        let widget = active
            .as_ref()
            .and_then(|code| fields.get(code))
            .cloned()
            .unwrap_or_default();

        Self {
            active,
            widget,
            fields,
        }
    }

    /// The currently active language code, if the registry has any
    /// non-default languages.
    pub fn active_language(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// The live widget buffer.
    pub fn widget_content(&self) -> &str {
        &self.widget
    }

    /// Replace the widget buffer, as typing into the widget does.
    pub fn set_widget_content(&mut self, content: impl Into<String>) {
        self.widget = content.into();
    }

    /// The holding field for a language.
    pub fn field(&self, code: &str) -> Option<&str> {
        self.fields.get(code).map(String::as_str)
    }

    /// Copy the current widget buffer into the active language's
    /// holding field. Idempotent; reads the buffer as it is now.
    /// Also invoked on widget-mode switches and editor teardown.
    pub fn flush(&mut self) {
        if let Some(active) = &self.active {
            self.fields.insert(active.clone(), self.widget.clone());
        }
    }

    /// Activate another language tab: flush the outgoing language
    /// first, then load the incoming language's holding field into the
    /// widget. Switching to the already-active tab is a no-op.
    pub fn switch_tab(&mut self, code: &str) -> Result<()> {
        if !self.fields.contains_key(code) {
            anyhow::bail!("No editor tab for language '{}'", code);
        }
        if self.active.as_deref() == Some(code) {
            return Ok(());
        }

        self.flush();
        self.active = Some(code.to_string());
        self.widget = self.fields.get(code).cloned().unwrap_or_default();
        Ok(())
    }

    /// Flush once more and yield the full map for submission, exactly
    /// as the surrounding form's submit event does.
    pub fn submit(&mut self) -> TranslationSet {
        self.flush();
        self.fields
            .iter()
            .map(|(code, value)| (code.clone(), value.clone()))
            .collect()
    }

    /// The submission as `translations[<code>]` form pairs.
    pub fn form_fields(&mut self) -> Vec<(String, String)> {
        self.flush();
        self.fields
            .iter()
            .map(|(code, value)| (format!("translations[{}]", code), value.clone()))
            .collect()
    }
}

//! Translation storage and delivery for published content.
//!
//! Attaches a per-language translation set to each content item,
//! sanitizes and persists submissions, swaps displayed content based
//! on a URL-derived language, and projects the stored translations
//! through a RAW/RENDERED query surface.

pub mod config;
pub mod db;
pub mod editor;
pub mod i18n;
pub mod render;
pub mod resolver;
pub mod router;
pub mod sanitizer;
pub mod schema;
pub mod security;
pub mod server;

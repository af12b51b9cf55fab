//! HTTP surface: wires the write, read, and query endpoints onto the
//! domain modules. Handlers stay thin; policy lives in `editor`,
//! `resolver`, `router`, and `schema`.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Form, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::Config;
use crate::db::Database;
use crate::editor::{self, SaveError};
use crate::i18n::LanguageRegistry;
use crate::render::{FilterChain, RenderContext};
use crate::resolver;
use crate::router;
use crate::schema::{self, ContentFormat};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub registry: Arc<LanguageRegistry>,
    pub chain: Arc<FilterChain>,
    pub config: Arc<Config>,
}

/// Build the application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/api/content", post(create_content))
        .route("/api/content/:id/edit-token", get(issue_edit_token))
        .route(
            "/api/content/:id/translations",
            get(query_translations).post(save_translations),
        )
        .route("/api/schema/translations", get(describe_schema))
        .fallback(get(render_page))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until shutdown.
pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{}", state.config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);
    axum::serve(listener, app(state)).await?;
    Ok(())
}

fn api_key<'a>(headers: &'a HeaderMap) -> Option<&'a str> {
    headers.get("x-api-key").and_then(|v| v.to_str().ok())
}

fn internal_error(e: anyhow::Error) -> Response {
    error!("Internal error: {:#}", e);
    StatusCode::INTERNAL_SERVER_ERROR.into_response()
}

// ==================== Write Endpoints ====================

#[derive(Debug, Deserialize)]
struct CreateContent {
    slug: String,
    title: String,
    body: String,
}

async fn create_content(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateContent>,
) -> Response {
    if !crate::security::verify_api_key(&state.config.api_key, api_key(&headers)) {
        return StatusCode::FORBIDDEN.into_response();
    }

    match state
        .db
        .insert_content(&payload.slug, &payload.title, &payload.body)
    {
        Ok(id) => (StatusCode::CREATED, Json(json!({ "id": id }))).into_response(),
        Err(e) => internal_error(e),
    }
}

async fn issue_edit_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    if !crate::security::verify_api_key(&state.config.api_key, api_key(&headers)) {
        return StatusCode::FORBIDDEN.into_response();
    }

    match state.db.get_content(id) {
        Ok(Some(_)) => {}
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(e) => return internal_error(e),
    }

    match state.db.issue_edit_token(id, state.config.token_ttl_secs) {
        Ok(token) => Json(json!({ "token": token })).into_response(),
        Err(e) => internal_error(e),
    }
}

/// The write endpoint: `translations[<code>]` form fields plus a
/// one-time `token` field. Rejections carry no body.
async fn save_translations(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Response {
    let token = fields
        .iter()
        .find(|(k, _)| k == "token")
        .map(|(_, v)| v.as_str());
    let pairs = fields.iter().map(|(k, v)| (k.as_str(), v.as_str()));

    match editor::save_translations(
        &state.db,
        &state.config,
        &state.registry,
        id,
        api_key(&headers),
        token,
        pairs,
    ) {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(SaveError::PermissionDenied) => StatusCode::FORBIDDEN.into_response(),
        Err(SaveError::InvalidRequest) => StatusCode::BAD_REQUEST.into_response(),
        Err(SaveError::Internal(e)) => internal_error(e),
    }
}

// ==================== Query Endpoints ====================

/// The query endpoint: full projection, or a single language field
/// when `lang` is given. `format` defaults to RENDERED.
async fn query_translations(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let item = match state.db.get_content(id) {
        Ok(Some(item)) => item,
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(e) => return internal_error(e),
    };

    let format = match params.get("format") {
        Some(value) => match ContentFormat::parse(value) {
            Ok(format) => format,
            Err(_) => return StatusCode::BAD_REQUEST.into_response(),
        },
        None => ContentFormat::default(),
    };

    match params.get("lang") {
        Some(code) => {
            if !state.registry.is_valid(code) || code == state.registry.default_code() {
                return StatusCode::NOT_FOUND.into_response();
            }
            match schema::resolve_translation(
                &state.db,
                &state.chain,
                &state.registry,
                &item,
                code,
                format,
            ) {
                Ok(resolved) => Json(resolved).into_response(),
                Err(e) => internal_error(e),
            }
        }
        None => {
            match schema::project_translations(
                &state.db,
                &state.chain,
                &state.registry,
                &item,
                format,
            ) {
                Ok(projected) => {
                    let map: serde_json::Map<String, serde_json::Value> = projected
                        .into_iter()
                        .map(|(code, resolved)| (code, json!({ "content": resolved.content })))
                        .collect();
                    Json(serde_json::Value::Object(map)).into_response()
                }
                Err(e) => internal_error(e),
            }
        }
    }
}

async fn describe_schema(State(state): State<AppState>) -> Response {
    Json(schema::translations_schema(&state.registry)).into_response()
}

// ==================== Read Endpoint ====================

/// The front-end read path. Language comes from the URL (path prefix
/// or `lang` query parameter); the body is the translated content when
/// one exists, the canonical body otherwise, rendered through the
/// filter chain either way.
async fn render_page(
    State(state): State<AppState>,
    uri: axum::http::Uri,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let decision = router::language_for(
        uri.path(),
        params.get("lang").map(String::as_str),
        &state.registry,
    );
    let slug = router::slug_from_path(&decision.rest);

    if slug.is_empty() {
        return home_page(&state, &decision).await;
    }

    let item = match state.db.get_content_by_slug(slug) {
        Ok(item) => item,
        Err(e) => return internal_error(e),
    };

    let item = match item {
        Some(item) => item,
        None => {
            // Closest-match redirect guessing stays off whenever the
            // request carries a language signal, so the guesser never
            // fights language-prefixed paths.
            if !decision.has_language_signal {
                if let Ok(slugs) = state.db.list_slugs() {
                    if let Some(guessed) = router::guess_slug(&slugs, slug) {
                        return Redirect::permanent(&format!("/{}/", guessed)).into_response();
                    }
                }
            }
            return StatusCode::NOT_FOUND.into_response();
        }
    };

    let body = resolver::resolve(&state.db, &state.registry, &item, decision.language.code());
    let ctx = RenderContext {
        item: &item,
        language: &decision.language,
    };
    let rendered = state.chain.render(&body, &ctx);

    Html(format!(
        "<!doctype html><html lang=\"{}\"><head><title>{}</title></head><body>{}</body></html>",
        decision.language.code(),
        item.title,
        rendered
    ))
    .into_response()
}

/// The `/` and `/{lang}/` home contexts: an index of content links in
/// the active language.
async fn home_page(state: &AppState, decision: &router::RouteDecision) -> Response {
    let slugs = match state.db.list_slugs() {
        Ok(slugs) => slugs,
        Err(e) => return internal_error(e),
    };

    let mut links = String::new();
    for slug in slugs {
        let item = match state.db.get_content_by_slug(&slug) {
            Ok(Some(item)) => item,
            Ok(None) => continue,
            Err(e) => return internal_error(e),
        };
        let href = router::content_link(&item, &decision.language);
        links.push_str(&format!("<li><a href=\"{}\">{}</a></li>", href, item.title));
    }

    Html(format!(
        "<!doctype html><html lang=\"{}\"><body><ul>{}</ul></body></html>",
        decision.language.code(),
        links
    ))
    .into_response()
}

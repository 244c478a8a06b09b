use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderValue, Method, Request, Response, StatusCode};
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tracing::info;

use crate::catalog;
use crate::history::{HistorySink, JsonHistoryStore};
use crate::preferences::{JsonPreferenceStore, TagPreference};
use crate::settings;

use super::models::{
    CatalogSummary, ErrorResponse, RecognizeRequest, RecognizeResponse, SearchRequest,
    SearchResponse, TagSearchRequest,
};
use super::service::{
    ServerError, recognize_request, search_request, tag_search_request,
    update_preferences_request,
};
use super::state::ServerState;

type HandlerResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

pub async fn run_server(settings: settings::Settings, addr: String) -> Result<()> {
    let catalog = catalog::load_catalog(settings.catalog_dir.as_deref())?;
    let history: Option<Arc<dyn HistorySink>> = if settings.history_enabled {
        Some(Arc::new(JsonHistoryStore::open_default(settings.history_limit)))
    } else {
        None
    };
    let state = Arc::new(ServerState::new(
        settings,
        catalog,
        Arc::new(JsonPreferenceStore::open_default()),
        history,
    ));
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind server address: {}", addr))?;
    info!("server: listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

pub(crate) fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/recognize", post(recognize))
        .route("/search", post(search))
        .route("/search/tags", post(search_tags))
        .route("/preferences/:user", get(preferences).put(update_preferences))
        .route("/catalog/reload", post(reload_catalog))
        .with_state(state)
        .layer(axum::middleware::from_fn(cors_middleware))
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

async fn cors_middleware(req: Request<Body>, next: Next) -> Result<Response<Body>, StatusCode> {
    if req.method() == Method::OPTIONS {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        apply_cors_headers(response.headers_mut());
        return Ok(response);
    }
    let mut response = next.run(req).await;
    apply_cors_headers(response.headers_mut());
    Ok(response)
}

fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert("access-control-allow-origin", HeaderValue::from_static("*"));
    headers.insert(
        "access-control-allow-methods",
        HeaderValue::from_static("GET,POST,PUT,OPTIONS"),
    );
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static("content-type,authorization"),
    );
}

fn reject(err: ServerError) -> (StatusCode, Json<ErrorResponse>) {
    (err.status, Json(ErrorResponse { error: err.message }))
}

async fn recognize(
    State(state): State<Arc<ServerState>>,
    Json(payload): Json<RecognizeRequest>,
) -> HandlerResult<RecognizeResponse> {
    let catalog = state.snapshot();
    let user = payload
        .user
        .as_deref()
        .map(str::trim)
        .filter(|user| !user.is_empty())
        .map(str::to_string);
    let outcome = recognize_request(&catalog, payload).map_err(reject)?;
    if let Some(user) = user {
        // fire-and-forget; the response does not wait for history writes
        let _ = state.record_browsing(&catalog, &user, &outcome.browsed);
    }
    Ok(Json(outcome.response))
}

async fn search(
    State(state): State<Arc<ServerState>>,
    Json(payload): Json<SearchRequest>,
) -> HandlerResult<SearchResponse> {
    let catalog = state.snapshot();
    let response = search_request(&state, &catalog, payload).map_err(reject)?;
    Ok(Json(response))
}

async fn search_tags(
    State(state): State<Arc<ServerState>>,
    Json(payload): Json<TagSearchRequest>,
) -> HandlerResult<SearchResponse> {
    let catalog = state.snapshot();
    Ok(Json(tag_search_request(&catalog, payload)))
}

async fn preferences(
    State(state): State<Arc<ServerState>>,
    Path(user): Path<String>,
) -> HandlerResult<Vec<TagPreference>> {
    let list = state
        .preferences
        .list(user.trim())
        .map_err(|err| reject(err.into()))?;
    Ok(Json(list))
}

async fn update_preferences(
    State(state): State<Arc<ServerState>>,
    Path(user): Path<String>,
    Json(payload): Json<Vec<TagPreference>>,
) -> HandlerResult<Vec<TagPreference>> {
    let catalog = state.snapshot();
    let stored = update_preferences_request(&state, &catalog, &user, payload).map_err(reject)?;
    Ok(Json(stored))
}

async fn reload_catalog(State(state): State<Arc<ServerState>>) -> HandlerResult<CatalogSummary> {
    let dir = state.settings.catalog_dir.clone();
    let loaded = tokio::task::spawn_blocking(move || catalog::load_catalog(dir.as_deref()))
        .await
        .map_err(|err| reject(ServerError::internal(format!("reload task failed: {}", err))))?
        .map_err(|err| reject(err.into()))?;
    let summary = CatalogSummary {
        dishes: loaded.dishes().len(),
        tags: loaded.tags().len(),
    };
    state.replace_catalog(loaded);
    info!(
        "catalog: reloaded ({} dishes, {} tags)",
        summary.dishes, summary.tags
    );
    Ok(Json(summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::test_support::sample_catalog;
    use crate::history::MemoryHistory;
    use crate::preferences::{MemoryPreferenceStore, Preference};
    use serde_json::json;

    fn build_state(settings: settings::Settings) -> Arc<ServerState> {
        Arc::new(ServerState::new(
            settings,
            sample_catalog(),
            Arc::new(MemoryPreferenceStore::new()),
            Some(Arc::new(MemoryHistory::new(0))),
        ))
    }

    #[tokio::test]
    async fn preferences_round_trip_through_handlers() {
        let state = build_state(settings::Settings::default());
        let body = vec![TagPreference::new("猪肉", Preference::Dislike)];
        let Json(stored) = update_preferences(
            State(state.clone()),
            Path("alice".to_string()),
            Json(body.clone()),
        )
        .await
        .expect("update");
        assert_eq!(stored, body);

        let Json(listed) = preferences(State(state.clone()), Path("alice".to_string()))
            .await
            .expect("list");
        assert_eq!(listed, body);

        let Json(found) = search(
            State(state),
            Json(SearchRequest {
                query: "辣".to_string(),
                filters: None,
                user: Some("alice".to_string()),
            }),
        )
        .await
        .expect("search");
        assert_eq!(found.ids, vec![1, 6]);
    }

    #[tokio::test]
    async fn recognize_handler_maps_errors_to_json() {
        let state = build_state(settings::Settings::default());
        let err = recognize(State(state), Json(RecognizeRequest::default()))
            .await
            .err()
            .expect("error");
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
        assert_eq!(err.1.error, "lines or ocr_result is required");
    }

    #[tokio::test]
    async fn recognize_handler_returns_matches() {
        let state = build_state(settings::Settings::default());
        let payload = RecognizeRequest {
            user: Some("alice".to_string()),
            lines: Some(json!([{
                "text": "麻婆豆腐",
                "tokens": [
                    { "text": "麻", "left": 0, "top": 0, "width": 10, "height": 10 },
                    { "text": "婆", "left": 10, "top": 0, "width": 10, "height": 10 },
                    { "text": "豆", "left": 20, "top": 0, "width": 10, "height": 10 },
                    { "text": "腐", "left": 30, "top": 0, "width": 10, "height": 10 }
                ]
            }])),
            ocr_result: None,
        };
        let Json(response) = recognize(State(state), Json(payload))
            .await
            .expect("recognize");
        assert_eq!(response.results.len(), 1);
        assert_eq!(response.results[0].display_name, "Mapo Tofu");
    }

    #[tokio::test]
    async fn reload_reads_configured_catalog_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("tags.json"), r#"[{ "name": "汤" }]"#).expect("tags");
        std::fs::write(
            dir.path().join("dishes.json"),
            r#"[{ "name": "酸辣汤", "tags": ["汤"] }, { "name": "番茄蛋汤", "tags": ["汤"] }]"#,
        )
        .expect("dishes");
        let settings = settings::Settings {
            catalog_dir: Some(dir.path().to_path_buf()),
            ..settings::Settings::default()
        };
        let state = build_state(settings);
        let Json(summary) = reload_catalog(State(state.clone())).await.expect("reload");
        assert_eq!((summary.dishes, summary.tags), (2, 1));
        assert_eq!(state.snapshot().dishes()[1].name, "番茄蛋汤");
    }

    #[test]
    fn router_builds() {
        let _ = router(build_state(settings::Settings::default()));
    }
}

use axum::http::StatusCode;
use tracing::{debug, info};

use crate::catalog::{Catalog, DishId, EntryRef};
use crate::matcher::{MatchResult, match_line};
use crate::ocr::{RecognizedLine, parse_ocr_space_response};
use crate::preferences::TagPreference;
use crate::search::{search, search_by_tags};

use super::models::{
    MatchView, RecognizeRequest, RecognizeResponse, SearchRequest, SearchResponse,
    TagSearchRequest,
};
use super::state::ServerState;

#[derive(Debug)]
pub(crate) struct ServerError {
    pub(crate) status: StatusCode,
    pub(crate) message: String,
}

impl ServerError {
    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(err: anyhow::Error) -> Self {
        ServerError::internal(format!("{:#}", err))
    }
}

pub(crate) struct RecognizeOutcome {
    pub(crate) response: RecognizeResponse,
    pub(crate) browsed: Vec<DishId>,
}

pub(crate) fn recognize_request(
    catalog: &Catalog,
    request: RecognizeRequest,
) -> Result<RecognizeOutcome, ServerError> {
    let lines = match (request.lines, request.ocr_result) {
        (Some(_), Some(_)) => {
            return Err(ServerError::bad_request(
                "lines and ocr_result cannot be provided together",
            ));
        }
        (None, None) => {
            return Err(ServerError::bad_request("lines or ocr_result is required"));
        }
        (Some(lines), None) => serde_json::from_value::<Vec<RecognizedLine>>(lines)
            .map_err(|err| ServerError::bad_request(format!("invalid lines: {}", err)))?,
        (None, Some(payload)) => parse_ocr_space_response(&payload)
            .map_err(|err| ServerError::bad_request(err.to_string()))?,
    };

    let mut results = Vec::new();
    let mut browsed = Vec::new();
    for (line_idx, line) in lines.iter().enumerate() {
        for found in match_line(catalog.index(), line) {
            if let EntryRef::Dish(id) = found.entry {
                browsed.push(id);
            }
            if let Some(view) = match_view(catalog, line_idx, found) {
                results.push(view);
            }
        }
    }
    info!(
        "recognize: {} lines, {} matches ({} dishes)",
        lines.len(),
        results.len(),
        browsed.len()
    );

    Ok(RecognizeOutcome {
        response: RecognizeResponse { results },
        browsed,
    })
}

fn match_view(catalog: &Catalog, line: usize, found: MatchResult) -> Option<MatchView> {
    let (display_name, image_url) = match found.entry {
        EntryRef::Dish(id) => {
            let dish = catalog.dish(id)?;
            (
                dish.display_name().to_string(),
                dish.primary_image().unwrap_or_default().to_string(),
            )
        }
        EntryRef::Tag(id) => (catalog.tag(id)?.display_name().to_string(), String::new()),
    };
    Some(MatchView {
        line,
        matched_substring: found.text,
        catalog_entry_id: found.entry.id(),
        kind: found.entry.kind(),
        display_name,
        image_url,
        bounding_box: found.bounding_box,
    })
}

pub(crate) fn search_request(
    state: &ServerState,
    catalog: &Catalog,
    request: SearchRequest,
) -> Result<SearchResponse, ServerError> {
    let filters = match (request.filters, request.user.as_deref()) {
        (Some(filters), _) => filters,
        (None, Some(user)) if !user.trim().is_empty() => state.preferences.list(user.trim())?,
        (None, _) => Vec::new(),
    };
    let ids = search(catalog, &request.query, &filters);
    debug!(
        "search: query={:?} filters={} hits={}",
        request.query,
        filters.len(),
        ids.len()
    );
    Ok(SearchResponse { ids })
}

pub(crate) fn tag_search_request(catalog: &Catalog, request: TagSearchRequest) -> SearchResponse {
    SearchResponse {
        ids: search_by_tags(catalog, &request.tags),
    }
}

pub(crate) fn update_preferences_request(
    state: &ServerState,
    catalog: &Catalog,
    user: &str,
    preferences: Vec<TagPreference>,
) -> Result<Vec<TagPreference>, ServerError> {
    let user = user.trim();
    if user.is_empty() {
        return Err(ServerError::bad_request("user is empty"));
    }
    if let Some(unknown) = preferences
        .iter()
        .find(|entry| catalog.tag_by_name(&entry.tag).is_none())
    {
        return Err(ServerError::bad_request(format!(
            "unknown tag: {}",
            unknown.tag
        )));
    }
    Ok(state.preferences.replace_all(user, &preferences)?)
}

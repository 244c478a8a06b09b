use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::DishId;
use crate::ocr::BoundingBox;
use crate::preferences::TagPreference;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub(crate) struct RecognizeRequest {
    pub(crate) user: Option<String>,
    pub(crate) lines: Option<Value>,
    pub(crate) ocr_result: Option<Value>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RecognizeResponse {
    pub(crate) results: Vec<MatchView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MatchView {
    pub(crate) line: usize,
    pub(crate) matched_substring: String,
    pub(crate) catalog_entry_id: u32,
    pub(crate) kind: &'static str,
    pub(crate) display_name: String,
    pub(crate) image_url: String,
    pub(crate) bounding_box: BoundingBox,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub(crate) struct SearchRequest {
    pub(crate) query: String,
    pub(crate) filters: Option<Vec<TagPreference>>,
    pub(crate) user: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub(crate) struct TagSearchRequest {
    pub(crate) tags: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SearchResponse {
    pub(crate) ids: Vec<DishId>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CatalogSummary {
    pub(crate) dishes: usize,
    pub(crate) tags: usize,
}

#[derive(Debug, Serialize)]
pub(crate) struct ErrorResponse {
    pub(crate) error: String,
}

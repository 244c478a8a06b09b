use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use super::{RecognizedLine, RecognizedToken, ShapeError};

const EXIT_CODE_SUCCESS: i64 = 1;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR processing failed (exit code {exit_code}): {message}")]
    Failed { exit_code: i64, message: String },

    #[error("failed to parse OCR response: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Shape(#[from] ShapeError),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OcrSpaceResponse {
    #[serde(rename = "OCRExitCode", default)]
    ocr_exit_code: i64,
    #[serde(default)]
    parsed_results: Vec<ParsedResult>,
    #[serde(default)]
    error_message: Value,
    #[serde(default)]
    error_details: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ParsedResult {
    #[serde(default)]
    text_overlay: Option<TextOverlay>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TextOverlay {
    #[serde(default)]
    lines: Vec<OverlayLine>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OverlayLine {
    #[serde(default)]
    words: Vec<OverlayWord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OverlayWord {
    word_text: String,
    left: f64,
    top: f64,
    width: f64,
    height: f64,
}

/// Converts an OCR.space overlay response into recognized lines.
///
/// Line text is rebuilt from the overlay words so it always lines up with the
/// tokens. Words longer than one character have their box split evenly
/// across their characters.
pub fn parse_ocr_space_response(payload: &Value) -> Result<Vec<RecognizedLine>, OcrError> {
    let response: OcrSpaceResponse = serde_json::from_value(payload.clone())?;
    if response.ocr_exit_code != EXIT_CODE_SUCCESS {
        return Err(OcrError::Failed {
            exit_code: response.ocr_exit_code,
            message: error_text(&response.error_message, &response.error_details),
        });
    }

    let mut lines = Vec::new();
    for result in response.parsed_results {
        let Some(overlay) = result.text_overlay else {
            continue;
        };
        for line in overlay.lines {
            if line.words.is_empty() {
                continue;
            }
            let mut text = String::new();
            let mut tokens = Vec::new();
            for word in &line.words {
                text.push_str(&word.word_text);
                tokens.extend(split_word(word));
            }
            lines.push(RecognizedLine::new(text, tokens)?);
        }
    }
    Ok(lines)
}

fn split_word(word: &OverlayWord) -> Vec<RecognizedToken> {
    let left = to_px(word.left);
    let top = to_px(word.top);
    let width = to_px(word.width);
    let height = to_px(word.height);
    let chars = word.word_text.chars().collect::<Vec<_>>();
    let count = chars.len() as u64;
    // offsets are computed in u64; each stays <= width so the narrowing is lossless
    let offset = |idx: u64| (u64::from(width) * idx / count) as u32;
    chars
        .into_iter()
        .enumerate()
        .map(|(idx, c)| {
            let idx = idx as u64;
            let start = offset(idx);
            let end = offset(idx + 1);
            RecognizedToken::new(
                c.to_string(),
                left.saturating_add(start),
                top,
                end - start,
                height,
            )
        })
        .collect()
}

fn to_px(value: f64) -> u32 {
    if value.is_finite() && value > 0.0 {
        value.round() as u32
    } else {
        0
    }
}

fn error_text(message: &Value, details: &Value) -> String {
    let mut parts = Vec::new();
    for value in [message, details] {
        match value {
            Value::String(text) if !text.trim().is_empty() => parts.push(text.trim().to_string()),
            Value::Array(items) => parts.extend(
                items
                    .iter()
                    .filter_map(|item| item.as_str())
                    .map(|item| item.trim().to_string())
                    .filter(|item| !item.is_empty()),
            ),
            _ => {}
        }
    }
    if parts.is_empty() {
        "no error details".to_string()
    } else {
        parts.join("; ")
    }
}

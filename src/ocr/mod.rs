mod geom;
mod parse;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use geom::{bounding_box, enclosing_box};
pub use parse::{OcrError, parse_ocr_space_response};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub top_left: Point,
    pub bottom_right: Point,
}

/// One recognized unit with its geometry in source-image pixels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognizedToken {
    pub text: String,
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl RecognizedToken {
    pub fn new(text: impl Into<String>, left: u32, top: u32, width: u32, height: u32) -> Self {
        Self {
            text: text.into(),
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> u32 {
        self.left.saturating_add(self.width)
    }

    pub fn bottom(&self) -> u32 {
        self.top.saturating_add(self.height)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShapeError {
    #[error("line {text:?} has {tokens} tokens for {chars} characters")]
    TokenCountMismatch {
        text: String,
        chars: usize,
        tokens: usize,
    },
}

/// A line of recognized text with one token per character, left to right.
///
/// The one-token-per-character invariant is checked on construction and on
/// deserialization, so the matcher can index tokens by character offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRecognizedLine")]
pub struct RecognizedLine {
    text: String,
    tokens: Vec<RecognizedToken>,
}

#[derive(Deserialize)]
struct RawRecognizedLine {
    text: String,
    #[serde(default)]
    tokens: Vec<RecognizedToken>,
}

impl TryFrom<RawRecognizedLine> for RecognizedLine {
    type Error = ShapeError;

    fn try_from(raw: RawRecognizedLine) -> Result<Self, Self::Error> {
        RecognizedLine::new(raw.text, raw.tokens)
    }
}

impl RecognizedLine {
    pub fn new(text: impl Into<String>, tokens: Vec<RecognizedToken>) -> Result<Self, ShapeError> {
        let text = text.into();
        let chars = text.chars().count();
        if chars != tokens.len() {
            return Err(ShapeError::TokenCountMismatch {
                text,
                chars,
                tokens: tokens.len(),
            });
        }
        Ok(Self { text, tokens })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tokens(&self) -> &[RecognizedToken] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[cfg(test)]
pub(crate) fn uniform_line(text: &str, left: u32, top: u32, width: u32, height: u32) -> RecognizedLine {
    let tokens = text
        .chars()
        .enumerate()
        .map(|(idx, c)| RecognizedToken::new(c.to_string(), left + idx as u32 * width, top, width, height))
        .collect();
    RecognizedLine::new(text, tokens).expect("uniform line")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_requires_one_token_per_char() {
        let tokens = vec![RecognizedToken::new("麻", 0, 0, 10, 10)];
        let err = RecognizedLine::new("麻婆", tokens).unwrap_err();
        assert_eq!(
            err,
            ShapeError::TokenCountMismatch {
                text: "麻婆".to_string(),
                chars: 2,
                tokens: 1,
            }
        );
    }

    #[test]
    fn line_counts_chars_not_bytes() {
        let line = uniform_line("豆腐", 0, 0, 10, 10);
        assert_eq!(line.len(), 2);
        assert_eq!(line.text().len(), 6);
    }

    #[test]
    fn deserialization_checks_shape() {
        let ok = serde_json::json!({
            "text": "鱼香",
            "tokens": [
                { "text": "鱼", "left": 0, "top": 0, "width": 10, "height": 10 },
                { "text": "香", "left": 10, "top": 0, "width": 10, "height": 10 }
            ]
        });
        let line: RecognizedLine = serde_json::from_value(ok).expect("valid line");
        assert_eq!(line.tokens()[1].right(), 20);

        let bad = serde_json::json!({ "text": "鱼香", "tokens": [] });
        let err = serde_json::from_value::<RecognizedLine>(bad).unwrap_err();
        assert!(err.to_string().contains("0 tokens for 2 characters"));
    }
}

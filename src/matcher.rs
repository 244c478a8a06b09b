//! Greedy longest-first matching of recognized lines against the catalog.
//!
//! The cursor walks the line one character at a time. At a target-script
//! character it tries windows of [`MAX_WINDOW`] characters down to
//! [`MIN_WINDOW`]; the first exact catalog hit is emitted and the cursor jumps
//! past it. A window containing a non-target character abandons the position
//! entirely, without trying the shorter windows.

use serde::Serialize;

use crate::catalog::{CatalogIndex, EntryRef};
use crate::ocr::{BoundingBox, RecognizedLine, enclosing_box};
use crate::script::{all_target_script, count_target_script, is_target_script};

pub const MAX_WINDOW: usize = 6;
pub const MIN_WINDOW: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchResult {
    pub entry: EntryRef,
    pub text: String,
    /// Offset of the first matched character within the line.
    pub start: usize,
    pub bounding_box: BoundingBox,
}

impl MatchResult {
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

pub fn match_line(index: &CatalogIndex, line: &RecognizedLine) -> Vec<MatchResult> {
    let chars = line.text().chars().collect::<Vec<_>>();
    let tokens = line.tokens();
    let n = chars.len();
    let mut matches = Vec::new();
    if count_target_script(line.text()) < MIN_WINDOW {
        return matches;
    }

    let mut i = 0;
    while i < n {
        if !is_target_script(chars[i]) {
            i += 1;
            continue;
        }

        let mut advance = 1;
        let longest = MAX_WINDOW.min(n - i);
        for len in (MIN_WINDOW..=longest).rev() {
            let window = &chars[i..i + len];
            if !all_target_script(window) {
                break;
            }
            let text = window.iter().collect::<String>();
            let Some(entry) = index.lookup_exact(&text) else {
                continue;
            };
            // RecognizedLine guarantees one token per char, so i + len <= tokens.len()
            matches.push(MatchResult {
                entry,
                text,
                start: i,
                bounding_box: enclosing_box(&tokens[i], &tokens[i + 1..i + len]),
            });
            advance = len;
            break;
        }
        i += advance;
    }

    matches
}

/// Matches every line, keeping line order. The outer vector is parallel to
/// `lines`.
pub fn match_lines(index: &CatalogIndex, lines: &[RecognizedLine]) -> Vec<Vec<MatchResult>> {
    lines.iter().map(|line| match_line(index, line)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::catalog::test_support::{dish, sample_catalog, tag};
    use crate::ocr::{Point, bounding_box, uniform_line};

    fn texts(matches: &[MatchResult]) -> Vec<&str> {
        matches.iter().map(|m| m.text.as_str()).collect()
    }

    #[test]
    fn line_without_target_script_has_no_matches() {
        let catalog = sample_catalog();
        for text in ["", "Mapo Tofu 28.00", "   ", "ABCDEF"] {
            let line = uniform_line(text, 0, 0, 10, 10);
            assert!(match_line(catalog.index(), &line).is_empty(), "{text:?}");
        }
    }

    #[test]
    fn longest_match_wins_over_contained_shorter_name() {
        let catalog = sample_catalog();
        let line = uniform_line("宫保鸡丁", 0, 0, 10, 10);
        let matches = match_line(catalog.index(), &line);
        assert_eq!(texts(&matches), vec!["宫保鸡丁"]);
        assert_eq!(matches[0].entry, EntryRef::Dish(1));
        assert_eq!(matches[0].bounding_box.bottom_right, Point { x: 40, y: 10 });
    }

    #[test]
    fn shorter_name_matches_when_longer_is_absent() {
        let catalog = sample_catalog();
        let line = uniform_line("炒鸡丁", 0, 0, 10, 10);
        let matches = match_line(catalog.index(), &line);
        assert_eq!(texts(&matches), vec!["鸡丁"]);
        assert_eq!(matches[0].start, 1);
        assert_eq!(matches[0].bounding_box.top_left, Point { x: 10, y: 0 });
        assert_eq!(matches[0].bounding_box.bottom_right, Point { x: 30, y: 10 });
    }

    #[test]
    fn every_hit_carries_the_box_of_its_tokens() {
        let catalog = sample_catalog();
        let line = uniform_line("海鲜水煮鱼宫保鸡丁鸡丁", 5, 3, 12, 16);
        let matches = match_line(catalog.index(), &line);
        assert_eq!(texts(&matches), vec!["海鲜", "水煮鱼", "宫保鸡丁", "鸡丁"]);
        for found in &matches {
            let span = &line.tokens()[found.start..found.start + found.len()];
            assert_eq!(Some(found.bounding_box), bounding_box(span), "{}", found.text);
        }
    }

    #[test]
    fn matches_are_ordered_and_disjoint() {
        let catalog = sample_catalog();
        let line = uniform_line("今日推荐麻婆豆腐和回锅肉还有辣的水煮鱼", 5, 7, 12, 14);
        let matches = match_line(catalog.index(), &line);
        assert_eq!(texts(&matches), vec!["麻婆豆腐", "回锅肉", "水煮鱼"]);
        let mut end = 0;
        for m in &matches {
            assert!(m.start >= end);
            end = m.start + m.len();
            assert!((MIN_WINDOW..=MAX_WINDOW).contains(&m.len()));
            assert_eq!(count_target_script(&m.text), m.len());
        }
        assert_eq!(matches[1].entry, EntryRef::Dish(5));
        assert_eq!(
            matches[2].bounding_box,
            BoundingBox {
                top_left: Point { x: 5 + 16 * 12, y: 7 },
                bottom_right: Point { x: 5 + 19 * 12, y: 21 },
            }
        );
    }

    #[test]
    fn single_character_names_are_never_matched() {
        let catalog = sample_catalog();
        let line = uniform_line("辣 辣", 0, 0, 10, 10);
        assert!(match_line(catalog.index(), &line).is_empty());
    }

    #[test]
    fn tag_names_match_like_dishes() {
        let catalog = sample_catalog();
        let line = uniform_line("海鲜", 0, 0, 10, 10);
        let matches = match_line(catalog.index(), &line);
        assert_eq!(matches[0].entry, EntryRef::Tag(5));
    }

    #[test]
    fn non_target_character_in_window_abandons_position() {
        let catalog = sample_catalog();
        // window "鸡丁x" contains a non-target char; the 2-char "鸡丁" at the
        // same start is not tried
        let line = uniform_line("鸡丁x", 0, 0, 10, 10);
        assert!(match_line(catalog.index(), &line).is_empty());

        // every later start position runs into the same character
        let line = uniform_line("炒鸡丁x", 0, 0, 10, 10);
        assert!(match_line(catalog.index(), &line).is_empty());

        let line = uniform_line("x鸡丁", 0, 0, 10, 10);
        assert_eq!(texts(&match_line(catalog.index(), &line)), vec!["鸡丁"]);
    }

    #[test]
    fn window_is_capped_at_six_characters() {
        let catalog = Catalog::new(
            vec![tag(1, "辣", "")],
            vec![
                dish(1, "四川麻辣香锅", "", &[]),
                dish(2, "重庆老火锅底料", "", &[]),
            ],
        )
        .expect("catalog");
        let line = uniform_line("四川麻辣香锅重庆老火锅底料", 0, 0, 10, 10);
        assert_eq!(texts(&match_line(catalog.index(), &line)), vec!["四川麻辣香锅"]);
    }

    #[test]
    fn short_lines_yield_nothing() {
        let catalog = sample_catalog();
        let line = uniform_line("鸡", 0, 0, 10, 10);
        assert!(match_line(catalog.index(), &line).is_empty());
    }

    #[test]
    fn matching_is_idempotent() {
        let catalog = sample_catalog();
        let line = uniform_line("宫保鸡丁麻婆豆腐", 0, 0, 10, 10);
        let first = match_line(catalog.index(), &line);
        let second = match_line(catalog.index(), &line);
        assert_eq!(first, second);
        assert_eq!(match_lines(catalog.index(), &[line.clone(), line]), vec![first.clone(), first]);
    }
}

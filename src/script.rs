/// First code point of the CJK Unified Ideographs block.
pub const CJK_UNIFIED_START: char = '\u{4E00}';
/// Last code point of the CJK Unified Ideographs block.
pub const CJK_UNIFIED_END: char = '\u{9FFF}';

/// Returns true when `c` belongs to the script dish names are matched in.
pub fn is_target_script(c: char) -> bool {
    (CJK_UNIFIED_START..=CJK_UNIFIED_END).contains(&c)
}

pub fn all_target_script(chars: &[char]) -> bool {
    chars.iter().copied().all(is_target_script)
}

pub fn count_target_script(text: &str) -> usize {
    text.chars().filter(|c| is_target_script(*c)).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_block_boundaries() {
        assert!(is_target_script('\u{4E00}'));
        assert!(is_target_script('\u{9FFF}'));
        assert!(!is_target_script('\u{4DFF}'));
        assert!(!is_target_script('\u{A000}'));
    }

    #[test]
    fn rejects_latin_digits_and_punctuation() {
        for c in ['a', 'Z', '7', ' ', '，', '。', 'あ', 'ア'] {
            assert!(!is_target_script(c), "{c:?} should not be target script");
        }
        assert!(is_target_script('麻'));
        assert!(is_target_script('婆'));
    }

    #[test]
    fn counts_mixed_text() {
        assert_eq!(count_target_script("麻婆豆腐 ¥28"), 4);
        assert_eq!(count_target_script("Mapo Tofu"), 0);
        assert!(all_target_script(&['宫', '保']));
        assert!(!all_target_script(&['宫', '1']));
    }
}

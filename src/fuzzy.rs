//! Tolerant text matching for OCR readings.
//!
//! OCR routinely drops or substitutes a single glyph ("Completd", "Wrld"), so
//! every comparison against the curated vocabulary goes through
//! [`fuzzy_substring_match`] instead of string equality.

/// Returns true when `needle` occurs somewhere in `haystack` with at most
/// `max_distance` Levenshtein edits, case-insensitively.
///
/// Every window of `haystack` with the needle's length is compared. When the
/// haystack is shorter than the needle the two strings are compared whole.
/// An empty needle never matches.
pub fn fuzzy_substring_match(haystack: &str, needle: &str, max_distance: usize) -> bool {
    let haystack: Vec<char> = haystack.to_lowercase().chars().collect();
    let needle: String = needle.to_lowercase();
    let needle_len = needle.chars().count();

    if needle_len == 0 {
        return false;
    }

    if haystack.len() < needle_len {
        let whole: String = haystack.iter().collect();
        return strsim::levenshtein(&whole, &needle) <= max_distance;
    }

    haystack.windows(needle_len).any(|window| {
        let window: String = window.iter().collect();
        strsim::levenshtein(&window, &needle) <= max_distance
    })
}

/// Case-insensitive "does `haystack` mention `needle`" check used by guards.
///
/// Exact containment wins; otherwise falls back to a fuzzy match with one
/// edit of tolerance.
pub fn compare_text(needle: &str, haystack: &str) -> bool {
    let needle_lower = needle.to_lowercase();
    let haystack_lower = haystack.to_lowercase();

    haystack_lower.contains(&needle_lower) || fuzzy_substring_match(&haystack_lower, &needle_lower, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_deletion_matches() {
        assert!(fuzzy_substring_match("completed", "completd", 1));
        assert!(fuzzy_substring_match("Idle", "Idl", 1));
    }

    #[test]
    fn test_unrelated_words_do_not_match() {
        assert!(!fuzzy_substring_match("not ready", "completed", 1));
    }

    #[test]
    fn test_case_insensitive() {
        assert!(fuzzy_substring_match("ALLIANCE", "alliance", 0));
        assert!(fuzzy_substring_match("mail", "MAIL", 0));
    }

    #[test]
    fn test_window_inside_longer_title() {
        assert!(fuzzy_substring_match("Alliance Tech Research", "Tech", 0));
        assert!(fuzzy_substring_match("Chief Profle", "Chief Profile", 1));
        assert!(!fuzzy_substring_match("Chief Prfle", "Chief Profile", 1));
    }

    #[test]
    fn test_short_haystack_compared_whole() {
        assert!(fuzzy_substring_match("VI", "VIP", 1));
        assert!(!fuzzy_substring_match("V", "VIP", 1));
    }

    #[test]
    fn test_empty_needle_never_matches() {
        assert!(!fuzzy_substring_match("anything", "", 1));
        assert!(!fuzzy_substring_match("", "", 1));
    }

    #[test]
    fn test_non_ascii_windows() {
        assert!(fuzzy_substring_match("Почта", "почта", 0));
        assert!(fuzzy_substring_match("Пчта", "почта", 1));
    }

    #[test]
    fn test_compare_text_contains_or_fuzzy() {
        assert!(compare_text("ready", "Status: READY"));
        assert!(compare_text("completed", "Completd"));
        assert!(!compare_text("completed", "idle"));
    }
}

//! Shared helpers for the command modules

/// Case-insensitive wildcard search used by `--match`.
///
/// The pattern may contain `*` (any run of characters) and is matched as a
/// substring of `text`: `test_*` selects every target containing `test_`.
/// An empty pattern selects everything.
pub fn wildcard_search(text: &str, pattern: &str) -> bool {
    if pattern.is_empty() {
        return true;
    }
    let text: Vec<char> = text.to_lowercase().chars().collect();
    let pattern: Vec<char> = pattern.to_lowercase().chars().collect();
    // Substring semantics: implicit '*' on both ends.
    let mut full = Vec::with_capacity(pattern.len() + 2);
    full.push('*');
    full.extend_from_slice(&pattern);
    full.push('*');
    glob_match(&text, &full)
}

/// Iterative `*`-only glob with backtracking over the last star.
fn glob_match(text: &[char], pattern: &[char]) -> bool {
    let (mut t, mut p) = (0usize, 0usize);
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && pattern[p] == '*' {
            star = Some((p, t));
            p += 1;
        } else if p < pattern.len() && pattern[p] == text[t] {
            p += 1;
            t += 1;
        } else if let Some((star_p, star_t)) = star {
            p = star_p + 1;
            t = star_t + 1;
            star = Some((star_p, star_t + 1));
        } else {
            return false;
        }
    }
    while p < pattern.len() && pattern[p] == '*' {
        p += 1;
    }
    p == pattern.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_pattern_matches_everything() {
        assert!(wildcard_search("anything", ""));
        assert!(wildcard_search("", ""));
    }

    #[test]
    fn test_plain_substring() {
        assert!(wildcard_search("src/app_main.cpp", "app"));
        assert!(!wildcard_search("src/app_main.cpp", "test"));
    }

    #[test]
    fn test_case_insensitive() {
        assert!(wildcard_search("Test_Runner", "test_*"));
        assert!(wildcard_search("TEST_RUNNER", "test_runner"));
    }

    #[test]
    fn test_star_spans_runs() {
        assert!(wildcard_search("test_foo_bar", "test_*_bar"));
        assert!(wildcard_search("libfoo.a", "lib*.a"));
        assert!(!wildcard_search("libfoo.so", "lib*.a"));
    }
}

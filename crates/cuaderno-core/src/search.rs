//! Free-text search over `LIKE` columns.

/// Escape character used by [`contains_pattern`]. Pair the bound pattern with
/// `ESCAPE '\'` in SQL.
pub const LIKE_ESCAPE: char = '\\';

/// Builds a `%term%` pattern where `%`, `_` and the escape character in the
/// user's text match literally.
pub fn contains_pattern(term: &str) -> String {
    let term = term.trim();
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_term() {
        assert_eq!(contains_pattern("  álgebra "), "%álgebra%");
    }

    #[test]
    fn test_wildcards_are_escaped() {
        assert_eq!(contains_pattern("100%"), r"%100\%%");
        assert_eq!(contains_pattern("a_b"), r"%a\_b%");
        assert_eq!(contains_pattern(r"c:\tmp"), r"%c:\\tmp%");
    }
}

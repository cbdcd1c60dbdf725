//! Echo fallback: describes the request target instead of returning 404.

/// Body for an unrouted request target (path plus query, as received).
pub fn describe(target: &str) -> String {
    format!(
        "Requested path: {}\nPath length: {}",
        target,
        target.chars().count()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe() {
        assert_eq!(describe("/abc"), "Requested path: /abc\nPath length: 4");
        assert_eq!(describe("/a?b=1"), "Requested path: /a?b=1\nPath length: 6");
    }

    #[test]
    fn test_length_counts_characters() {
        assert_eq!(describe("/żółw"), "Requested path: /żółw\nPath length: 5");
    }
}

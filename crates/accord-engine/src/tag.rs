use regex::Regex;
use std::sync::LazyLock;

/// Proposals are referenced in chat as `#p<number>`, case-insensitive.
static TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)#p(\d+)").unwrap());

/// Tag plus trailing whitespace, for carving a reference out of body text.
static STRIP_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)#p\d+\s*").unwrap());

/// Display tag for a proposal number, e.g. `#p3`.
pub fn format_tag(number: i64) -> String {
    format!("#p{number}")
}

/// First proposal reference in the text, if any.
pub fn parse_tag(text: &str) -> Option<i64> {
    TAG_PATTERN
        .captures(text)
        .and_then(|caps| caps[1].parse().ok())
}

/// Every proposal reference in the text, left to right.
pub fn extract_tags(text: &str) -> Vec<i64> {
    TAG_PATTERN
        .captures_iter(text)
        .filter_map(|caps| caps[1].parse().ok())
        .collect()
}

/// Remove the addressed (first) proposal reference, leaving the rest of the
/// text intact. Later references stay: they are part of what the author said.
pub fn strip_tag(text: &str) -> String {
    STRIP_PATTERN.replacen(text, 1, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_tag() {
        assert_eq!(format_tag(7), "#p7");
    }

    #[test]
    fn parses_first_reference() {
        assert_eq!(parse_tag("move #p2 and #p9 forward"), Some(2));
        assert_eq!(parse_tag("no references here"), None);
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(parse_tag("consent #P4"), Some(4));
    }

    #[test]
    fn extracts_all_references_in_order() {
        assert_eq!(extract_tags("#p1 and #p12"), vec![1, 12]);
        assert!(extract_tags("nothing").is_empty());
    }

    #[test]
    fn strips_only_the_addressed_reference() {
        assert_eq!(strip_tag("#p1 this worries me"), "this worries me");
        assert_eq!(strip_tag("#p1 overlaps with #p2"), "overlaps with #p2");
        assert_eq!(strip_tag("#p1"), "");
        assert_eq!(strip_tag("no tag at all"), "no tag at all");
    }
}

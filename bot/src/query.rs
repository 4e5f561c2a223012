/// Search query parsing for incoming messages.
///
/// Any plain text is treated as a meal-name search, the way typing into
/// the original search box fired a lookup. A leading `area:` token
/// switches to cuisine filtering instead.
use once_cell::sync::Lazy;
use regex::Regex;

/// Parsed search intent from a message or command argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedQuery {
    /// Free-text meal-name search.
    Name(String),
    /// Cuisine filter, e.g. "area:Italian".
    Area(String),
    /// Nothing searchable in the text.
    Empty,
}

static AREA_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^area\s*:\s*(\S.*)$").unwrap()
});

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Collapse runs of whitespace and trim the ends.
pub fn normalize(text: &str) -> String {
    WHITESPACE_RE.replace_all(text.trim(), " ").to_string()
}

/// Parse a message into a search query.
pub fn parse_query(text: &str) -> ParsedQuery {
    let text = normalize(text);
    if text.is_empty() {
        return ParsedQuery::Empty;
    }

    if let Some(cap) = AREA_RE.captures(&text) {
        return ParsedQuery::Area(cap[1].trim().to_string());
    }

    ParsedQuery::Name(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_a_name_search() {
        assert_eq!(
            parse_query("chicken curry"),
            ParsedQuery::Name("chicken curry".to_string())
        );
    }

    #[test]
    fn whitespace_is_normalized() {
        assert_eq!(
            parse_query("  chicken \t  curry \n"),
            ParsedQuery::Name("chicken curry".to_string())
        );
    }

    #[test]
    fn area_prefix_is_detected_case_insensitive() {
        assert_eq!(
            parse_query("area:Italian"),
            ParsedQuery::Area("Italian".to_string())
        );
        assert_eq!(
            parse_query("AREA : Mexican"),
            ParsedQuery::Area("Mexican".to_string())
        );
    }

    #[test]
    fn area_without_value_is_a_name_search() {
        // "area:" with nothing after it has no cuisine to filter on
        assert_eq!(parse_query("area:"), ParsedQuery::Name("area:".to_string()));
    }

    #[test]
    fn empty_text_parses_to_empty() {
        assert_eq!(parse_query("   "), ParsedQuery::Empty);
        assert_eq!(parse_query(""), ParsedQuery::Empty);
    }
}

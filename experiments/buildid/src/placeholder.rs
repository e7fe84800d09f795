use regex::Regex;
use std::sync::OnceLock;

/// Matches `%NAME%`, `${NAME}` and `{{ name }}` template tokens.
///
/// `%NAME%` needs at least three characters between the percent signs so
/// percent-encoded bytes such as `%E2%80%` are not mistaken for tokens.
fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"%[A-Z][A-Z0-9_]{2,}%|\$\{[^}\s]*\}|\{\{\s*[A-Za-z_][A-Za-z0-9_.]*\s*\}\}")
            .expect("placeholder pattern is a valid regex")
    })
}

/// A template token found in a scanned document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// 1-based line number
    pub line: usize,
    pub text: String,
}

/// Whether a value still carries unexpanded template syntax.
///
/// Any `${` counts, even without a closing brace: a half-expanded value is
/// just as unusable as a whole token.
#[must_use]
pub fn is_placeholder(value: &str) -> bool {
    value.contains("${") || token_pattern().is_match(value)
}

/// Find every template token in `content`, in document order
#[must_use]
pub fn find_tokens(content: &str) -> Vec<Token> {
    content
        .lines()
        .enumerate()
        .flat_map(|(idx, line)| {
            token_pattern().find_iter(line).map(move |m| Token {
                line: idx + 1,
                text: m.as_str().to_string(),
            })
        })
        .collect()
}

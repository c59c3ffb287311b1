//! Best-effort classification of query text and field values.

/// Keywords accepted as boolean text, matched case-insensitively
const TRUE_WORDS: [&str; 4] = ["true", "t", "yes", "y"];
const FALSE_WORDS: [&str; 4] = ["false", "f", "no", "n"];

/// Result of guessing the scalar type behind a piece of text
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarGuess {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text,
}

/// Parse one of the boolean keywords without allocating
pub fn parse_bool_keyword(text: &str) -> Option<bool> {
    let text = text.trim();
    if TRUE_WORDS.iter().any(|w| w.eq_ignore_ascii_case(text)) {
        Some(true)
    } else if FALSE_WORDS.iter().any(|w| w.eq_ignore_ascii_case(text)) {
        Some(false)
    } else {
        None
    }
}

/// Parse an integer: optional sign and digits only
pub fn parse_int(text: &str) -> Option<i64> {
    text.trim().parse::<i64>().ok()
}

/// Parse a finite float. `inf` and `nan` spellings are not numbers here.
pub fn parse_float(text: &str) -> Option<f64> {
    let text = text.trim();
    let starts_numeric = text
        .chars()
        .next()
        .map_or(false, |c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.'));
    if !starts_numeric {
        return None;
    }
    text.parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Classify literal text: boolean keyword, then integer, then float, then text
pub fn classify_literal(text: &str) -> ScalarGuess {
    if let Some(b) = parse_bool_keyword(text) {
        ScalarGuess::Bool(b)
    } else if let Some(i) = parse_int(text) {
        ScalarGuess::Int(i)
    } else if let Some(f) = parse_float(text) {
        ScalarGuess::Float(f)
    } else {
        ScalarGuess::Text
    }
}

/// Cheap per-record guess for a field value, keyed on its first non-blank char
pub fn sniff_field(text: &str) -> ScalarGuess {
    let Some(first) = text.chars().find(|c| !c.is_whitespace()) else {
        return ScalarGuess::Text;
    };

    match first.to_ascii_lowercase() {
        'y' | 'n' | 't' | 'f' => parse_bool_keyword(text)
            .map(ScalarGuess::Bool)
            .unwrap_or(ScalarGuess::Text),
        c if c.is_ascii_digit() || matches!(c, '+' | '-' | '.') => {
            if let Some(i) = parse_int(text) {
                ScalarGuess::Int(i)
            } else if let Some(f) = parse_float(text) {
                ScalarGuess::Float(f)
            } else {
                ScalarGuess::Text
            }
        }
        _ => ScalarGuess::Text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bool_keywords() {
        for word in ["true", "TRUE", "Yes", "t", "Y", " yes "] {
            assert_eq!(parse_bool_keyword(word), Some(true), "{}", word);
        }
        for word in ["false", "No", "F", "n"] {
            assert_eq!(parse_bool_keyword(word), Some(false), "{}", word);
        }
        assert_eq!(parse_bool_keyword("yess"), None);
        assert_eq!(parse_bool_keyword("1"), None);
        assert_eq!(parse_bool_keyword(""), None);
    }

    #[test]
    fn test_classify_literal() {
        assert_eq!(classify_literal("27"), ScalarGuess::Int(27));
        assert_eq!(classify_literal("-4"), ScalarGuess::Int(-4));
        assert_eq!(classify_literal("27.5"), ScalarGuess::Float(27.5));
        assert_eq!(classify_literal("1e3"), ScalarGuess::Float(1000.0));
        assert_eq!(classify_literal("true"), ScalarGuess::Bool(true));
        assert_eq!(classify_literal("Y"), ScalarGuess::Bool(true));
        assert_eq!(classify_literal("abc"), ScalarGuess::Text);
        assert_eq!(classify_literal("NM_000546.6"), ScalarGuess::Text);
        assert_eq!(classify_literal(""), ScalarGuess::Text);
    }

    #[test]
    fn test_non_finite_is_text() {
        assert_eq!(classify_literal("inf"), ScalarGuess::Text);
        assert_eq!(classify_literal("NaN"), ScalarGuess::Text);
        assert_eq!(parse_float("-infinity"), None);
    }

    #[test]
    fn test_int_overflow_falls_back_to_float() {
        assert_eq!(
            sniff_field("99999999999999999999"),
            ScalarGuess::Float(99999999999999999999.0)
        );
    }

    #[test]
    fn test_sniff_field() {
        assert_eq!(sniff_field("  42"), ScalarGuess::Int(42));
        assert_eq!(sniff_field(".5"), ScalarGuess::Float(0.5));
        assert_eq!(sniff_field("no"), ScalarGuess::Bool(false));
        assert_eq!(sniff_field("nothing"), ScalarGuess::Text);
        assert_eq!(sniff_field("12abc"), ScalarGuess::Text);
        // Only y/n/t/f can start a boolean field value
        assert_eq!(sniff_field("  "), ScalarGuess::Text);
        assert_eq!(sniff_field("hello"), ScalarGuess::Text);
    }
}

// Query tokens for lexical analysis

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    /// Bare word: field name or unquoted literal
    Word(String),
    Number(String),
    /// Single or double quoted string, quotes removed
    QuotedString(String),
    /// Backtick quoted field name
    Identifier(String),

    // Keywords
    And,
    Or,
    Not,
    Xor,
    Sub,
    In,
    Like,
    Between,
    True,
    False,

    // Operators
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,

    // Delimiters
    LeftParen,
    RightParen,
    Comma,

    // Special
    Eof,
}

impl Token {
    /// Check if the token is a keyword
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            Token::And
                | Token::Or
                | Token::Not
                | Token::Xor
                | Token::Sub
                | Token::In
                | Token::Like
                | Token::Between
                | Token::True
                | Token::False
        )
    }

    /// Convert a word to a keyword token if it matches
    pub fn keyword_from_str(s: &str) -> Option<Token> {
        match s.to_uppercase().as_str() {
            "AND" => Some(Token::And),
            "OR" => Some(Token::Or),
            "NOT" => Some(Token::Not),
            "XOR" => Some(Token::Xor),
            "SUB" => Some(Token::Sub),
            "IN" => Some(Token::In),
            "LIKE" => Some(Token::Like),
            "BETWEEN" => Some(Token::Between),
            "TRUE" => Some(Token::True),
            "FALSE" => Some(Token::False),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_detection() {
        assert!(Token::Between.is_keyword());
        assert!(Token::True.is_keyword());
        assert!(!Token::Word("age".to_string()).is_keyword());
        assert!(!Token::LessEqual.is_keyword());
    }

    #[test]
    fn test_keyword_from_str() {
        assert_eq!(Token::keyword_from_str("AND"), Some(Token::And));
        assert_eq!(Token::keyword_from_str("xor"), Some(Token::Xor));
        assert_eq!(Token::keyword_from_str("Between"), Some(Token::Between));
        assert_eq!(Token::keyword_from_str("yes"), None);
    }
}

// Query lexer - tokenizes query text

use super::token::Token;
use crate::query::classify;
use anyhow::{bail, Result};

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    current_char: Option<char>,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        let input: Vec<char> = input.chars().collect();
        let current_char = input.first().copied();
        Lexer {
            input,
            position: 0,
            current_char,
        }
    }

    /// Get the next token from the input
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace();

        let Some(ch) = self.current_char else {
            return Ok(Token::Eof);
        };

        let token = match ch {
            '=' => {
                self.advance();
                // `==` is accepted as a synonym
                if self.current_char == Some('=') {
                    self.advance();
                }
                Token::Equal
            }
            '<' => {
                self.advance();
                if self.current_char == Some('=') {
                    self.advance();
                    Token::LessEqual
                } else if self.current_char == Some('>') {
                    self.advance();
                    Token::NotEqual
                } else {
                    Token::Less
                }
            }
            '>' => {
                self.advance();
                if self.current_char == Some('=') {
                    self.advance();
                    Token::GreaterEqual
                } else {
                    Token::Greater
                }
            }
            '!' => {
                self.advance();
                if self.current_char == Some('=') {
                    self.advance();
                    Token::NotEqual
                } else {
                    bail!("Expected '=' after '!' at position {}", self.position)
                }
            }
            '(' => {
                self.advance();
                Token::LeftParen
            }
            ')' => {
                self.advance();
                Token::RightParen
            }
            ',' => {
                self.advance();
                Token::Comma
            }
            '\'' | '"' => Token::QuotedString(self.read_quoted(ch)?),
            '`' => Token::Identifier(self.read_quoted('`')?),
            c if is_word_char(c) => self.read_word(),
            c => bail!("Unexpected character '{}' at position {}", c, self.position),
        };

        Ok(token)
    }

    /// Advance to the next character
    fn advance(&mut self) {
        self.position += 1;
        self.current_char = self.input.get(self.position).copied();
    }

    /// Peek at the next character without advancing
    fn peek(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    /// Skip whitespace characters
    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Read a bare word, keyword or number
    fn read_word(&mut self) -> Token {
        let mut word = String::new();

        while let Some(ch) = self.current_char {
            if is_word_char(ch) {
                word.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if let Some(keyword) = Token::keyword_from_str(&word) {
            return keyword;
        }

        let numeric_start = word
            .starts_with(|c: char| c.is_ascii_digit() || matches!(c, '+' | '-' | '.'));
        if numeric_start
            && (classify::parse_int(&word).is_some() || classify::parse_float(&word).is_some())
        {
            Token::Number(word)
        } else {
            Token::Word(word)
        }
    }

    /// Read text up to the closing `quote`. A doubled quote is a literal quote.
    fn read_quoted(&mut self, quote: char) -> Result<String> {
        let start = self.position;
        self.advance(); // Skip opening quote
        let mut text = String::new();

        loop {
            match self.current_char {
                Some(ch) if ch == quote => {
                    if self.peek() == Some(quote) {
                        text.push(quote);
                        self.advance();
                        self.advance();
                    } else {
                        self.advance(); // Skip closing quote
                        return Ok(text);
                    }
                }
                Some('\\') if self.peek() == Some(quote) => {
                    text.push(quote);
                    self.advance();
                    self.advance();
                }
                Some(ch) => {
                    text.push(ch);
                    self.advance();
                }
                None => bail!("Unterminated {} quote starting at position {}", quote, start),
            }
        }
    }

    /// Tokenize the entire input
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token()?;
            if token == Token::Eof {
                tokens.push(token);
                break;
            }
            tokens.push(token);
        }

        Ok(tokens)
    }
}

/// Characters that may appear in a bare word
fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '+' | '.' | '|' | '*' | '?' | ':')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        Lexer::new(input).tokenize().unwrap()
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            tokens("= == != <> < <= > >="),
            vec![
                Token::Equal,
                Token::Equal,
                Token::NotEqual,
                Token::NotEqual,
                Token::Less,
                Token::LessEqual,
                Token::Greater,
                Token::GreaterEqual,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_words_and_numbers() {
        assert_eq!(
            tokens("seq-id NM_000546.6 27 -3 2.5 1e3 brc*"),
            vec![
                Token::Word("seq-id".to_string()),
                Token::Word("NM_000546.6".to_string()),
                Token::Number("27".to_string()),
                Token::Number("-3".to_string()),
                Token::Number("2.5".to_string()),
                Token::Number("1e3".to_string()),
                Token::Word("brc*".to_string()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_quoted() {
        assert_eq!(
            tokens(r#""open" 'it''s' "say \"hi\"" `my field`"#),
            vec![
                Token::QuotedString("open".to_string()),
                Token::QuotedString("it's".to_string()),
                Token::QuotedString("say \"hi\"".to_string()),
                Token::Identifier("my field".to_string()),
                Token::Eof,
            ]
        );
        assert_eq!(tokens(r#""""#)[0], Token::QuotedString(String::new()));
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            tokens("a not in (1, 2) AND true"),
            vec![
                Token::Word("a".to_string()),
                Token::Not,
                Token::In,
                Token::LeftParen,
                Token::Number("1".to_string()),
                Token::Comma,
                Token::Number("2".to_string()),
                Token::RightParen,
                Token::And,
                Token::True,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_no_space_around_operators() {
        assert_eq!(
            tokens("age>=18"),
            vec![
                Token::Word("age".to_string()),
                Token::GreaterEqual,
                Token::Number("18".to_string()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_errors() {
        assert!(Lexer::new(r#"name = "open"#).tokenize().is_err());
        assert!(Lexer::new("a ! b").tokenize().is_err());
        assert!(Lexer::new("a = #").tokenize().is_err());
    }
}

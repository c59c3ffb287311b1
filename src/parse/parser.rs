// Query parser - converts tokens to a query tree

use super::lexer::Lexer;
use super::token::Token;
use crate::query::{NodeId, Operator, QueryTree};
use anyhow::{bail, Context, Result};

pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
    tree: QueryTree,
}

impl Parser {
    pub fn new(query: &str) -> Result<Self> {
        let mut lexer = Lexer::new(query);
        let tokens = lexer
            .tokenize()
            .with_context(|| format!("Failed to tokenize query: {}", query))?;
        Ok(Parser {
            tokens,
            position: 0,
            tree: QueryTree::new(),
        })
    }

    /// Parse the whole query into a tree
    pub fn parse(mut self) -> Result<QueryTree> {
        if self.match_token(&Token::Eof) {
            bail!("Empty query");
        }

        let root = self.parse_expression()?;
        if !self.match_token(&Token::Eof) {
            bail!("Unexpected {:?} after end of query", self.current_token());
        }

        self.tree.set_root(root);
        Ok(self.tree)
    }

    /// Parse expression
    fn parse_expression(&mut self) -> Result<NodeId> {
        self.parse_or()
    }

    /// Parse OR chain into one n-ary node
    fn parse_or(&mut self) -> Result<NodeId> {
        let first = self.parse_xor()?;
        let mut operands = vec![first];

        while self.match_token(&Token::Or) {
            self.advance();
            operands.push(self.parse_xor()?);
        }

        Ok(self.chain(Operator::Or, operands))
    }

    /// Parse XOR expression
    fn parse_xor(&mut self) -> Result<NodeId> {
        let mut left = self.parse_and()?;

        while self.match_token(&Token::Xor) {
            self.advance();
            let right = self.parse_and()?;
            left = self.tree.add_operator(Operator::Xor, false, vec![left, right]);
        }

        Ok(left)
    }

    /// Parse AND chain into one n-ary node
    fn parse_and(&mut self) -> Result<NodeId> {
        let first = self.parse_sub()?;
        let mut operands = vec![first];

        while self.match_token(&Token::And) {
            self.advance();
            operands.push(self.parse_sub()?);
        }

        Ok(self.chain(Operator::And, operands))
    }

    /// Parse SUB (and-not) expression
    fn parse_sub(&mut self) -> Result<NodeId> {
        let mut left = self.parse_not()?;

        while self.match_token(&Token::Sub) {
            self.advance();
            let right = self.parse_not()?;
            left = self.tree.add_operator(Operator::Sub, false, vec![left, right]);
        }

        Ok(left)
    }

    /// Parse NOT expression
    fn parse_not(&mut self) -> Result<NodeId> {
        if self.match_token(&Token::Not) {
            self.advance();
            let operand = self.parse_not()?;
            Ok(self.tree.add_operator(Operator::Not, false, vec![operand]))
        } else {
            self.parse_comparison()
        }
    }

    /// Parse comparison expression
    fn parse_comparison(&mut self) -> Result<NodeId> {
        let left = self.parse_primary()?;

        // NOT binds to the following IN, LIKE or BETWEEN
        let negated = if self.match_token(&Token::Not) {
            match self.peek_token() {
                Token::In | Token::Like | Token::Between => {
                    self.advance();
                    true
                }
                other => bail!("Expected IN, LIKE or BETWEEN after NOT, found {:?}", other),
            }
        } else {
            false
        };

        if self.match_token(&Token::In) {
            self.advance();
            self.expect_token(Token::LeftParen)?;
            let mut operands = vec![left];
            operands.extend(self.parse_value_list()?);
            self.expect_token(Token::RightParen)?;
            return Ok(self.tree.add_operator(Operator::In, negated, operands));
        }

        if self.match_token(&Token::Between) {
            self.advance();
            let low = self.parse_primary()?;
            // Bounds are separated by AND or a comma
            match self.current_token() {
                Token::And | Token::Comma => self.advance(),
                other => bail!("Expected AND or ',' in BETWEEN, found {:?}", other),
            }
            let high = self.parse_primary()?;
            return Ok(self
                .tree
                .add_operator(Operator::Between, negated, vec![left, low, high]));
        }

        if self.match_token(&Token::Like) {
            self.advance();
            let pattern = self.parse_primary()?;
            return Ok(self
                .tree
                .add_operator(Operator::Like, negated, vec![left, pattern]));
        }

        // Standard comparison operators
        let op = match self.current_token() {
            Token::Equal => Some((Operator::Eq, false)),
            Token::NotEqual => Some((Operator::Eq, true)),
            Token::Less => Some((Operator::Lt, false)),
            Token::LessEqual => Some((Operator::Le, false)),
            Token::Greater => Some((Operator::Gt, false)),
            Token::GreaterEqual => Some((Operator::Ge, false)),
            _ => None,
        };

        if let Some((op, negated)) = op {
            self.advance();
            let right = self.parse_primary()?;
            Ok(self.tree.add_operator(op, negated, vec![left, right]))
        } else {
            Ok(left)
        }
    }

    /// Parse a parenthesized expression or a single value
    fn parse_primary(&mut self) -> Result<NodeId> {
        let node = match self.current_token() {
            Token::LeftParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect_token(Token::RightParen)?;
                return Ok(inner);
            }
            Token::Number(text) => {
                if let Ok(i) = text.parse::<i64>() {
                    self.tree.add_int(i)
                } else {
                    let f = text
                        .parse::<f64>()
                        .with_context(|| format!("Invalid number: {}", text))?;
                    self.tree.add_float(f)
                }
            }
            Token::QuotedString(text) => self.tree.add_text(text, true),
            Token::Word(text) => self.tree.add_text(text, false),
            Token::Identifier(name) => self.tree.add_identifier(name),
            Token::True => self.tree.add_bool(true),
            Token::False => self.tree.add_bool(false),
            other if other.is_keyword() => {
                bail!("Unexpected keyword {:?}, use backticks for a field of that name", other)
            }
            other => bail!("Expected value, found {:?}", other),
        };

        self.advance();
        Ok(node)
    }

    /// Parse comma-separated values
    fn parse_value_list(&mut self) -> Result<Vec<NodeId>> {
        let mut values = vec![self.parse_primary()?];

        while self.match_token(&Token::Comma) {
            self.advance();
            values.push(self.parse_primary()?);
        }

        Ok(values)
    }

    /// Build an n-ary node, or pass a lone operand through
    fn chain(&mut self, op: Operator, mut operands: Vec<NodeId>) -> NodeId {
        if operands.len() == 1 {
            operands.remove(0)
        } else {
            self.tree.add_operator(op, false, operands)
        }
    }

    // Helper methods

    /// Get current token
    fn current_token(&self) -> Token {
        self.tokens
            .get(self.position)
            .cloned()
            .unwrap_or(Token::Eof)
    }

    /// Get the token after the current one
    fn peek_token(&self) -> Token {
        self.tokens
            .get(self.position + 1)
            .cloned()
            .unwrap_or(Token::Eof)
    }

    /// Advance to next token
    fn advance(&mut self) {
        if self.position + 1 < self.tokens.len() {
            self.position += 1;
        }
    }

    /// Check if current token matches
    fn match_token(&self, token: &Token) -> bool {
        self.current_token() == *token
    }

    /// Expect a specific token
    fn expect_token(&mut self, token: Token) -> Result<()> {
        if self.current_token() == token {
            self.advance();
            Ok(())
        } else {
            bail!("Expected {:?}, found {:?}", token, self.current_token())
        }
    }
}

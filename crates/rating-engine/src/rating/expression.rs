use std::collections::BTreeMap;

use super::domain::FieldValue;

/// Failure inside the restricted arithmetic sublanguage.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExpressionError {
    #[error("expression is empty")]
    Empty,
    #[error("unexpected character '{0}' in expression")]
    UnexpectedChar(char),
    #[error("expression ended unexpectedly")]
    UnexpectedEnd,
    #[error("unexpected token '{0}' in expression")]
    UnexpectedToken(String),
    #[error("unknown identifier '{0}'")]
    UnknownIdentifier(String),
    #[error("field '{0}' is not numeric")]
    NonNumericField(String),
}

/// Value of an evaluated expression plus any tolerated anomalies.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluated {
    pub value: f64,
    pub warnings: Vec<String>,
}

/// Evaluate a restricted arithmetic expression over named fields.
///
/// The grammar admits numeric literals, identifiers, the four arithmetic
/// operators with standard precedence, unary minus, and parentheses. No
/// function calls, no strings. Identifiers resolve from the scenario inputs
/// first, then from prior applied factor outputs by name. Division by zero
/// resolves to 0 with a recorded warning, matching the tolerant
/// spreadsheet-like semantics underwriters expect.
pub fn evaluate(
    source: &str,
    inputs: &BTreeMap<String, FieldValue>,
    prior_outputs: &BTreeMap<String, f64>,
) -> Result<Evaluated, ExpressionError> {
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err(ExpressionError::Empty);
    }

    let mut parser = Parser {
        tokens,
        position: 0,
        inputs,
        prior_outputs,
        warnings: Vec::new(),
    };
    let value = parser.expression()?;
    if let Some(token) = parser.peek() {
        return Err(ExpressionError::UnexpectedToken(token.render()));
    }

    Ok(Evaluated {
        value,
        warnings: parser.warnings,
    })
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    LeftParen,
    RightParen,
}

impl Token {
    fn render(&self) -> String {
        match self {
            Token::Number(value) => value.to_string(),
            Token::Ident(name) => name.clone(),
            Token::Plus => "+".to_string(),
            Token::Minus => "-".to_string(),
            Token::Star => "*".to_string(),
            Token::Slash => "/".to_string(),
            Token::LeftParen => "(".to_string(),
            Token::RightParen => ")".to_string(),
        }
    }
}

fn tokenize(source: &str) -> Result<Vec<Token>, ExpressionError> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();

    while let Some(&ch) = chars.peek() {
        match ch {
            ' ' | '\t' | '\r' | '\n' => {
                chars.next();
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '*' => {
                chars.next();
                tokens.push(Token::Star);
            }
            '/' => {
                chars.next();
                tokens.push(Token::Slash);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LeftParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RightParen);
            }
            '0'..='9' | '.' => {
                let mut literal = String::new();
                while let Some(&digit) = chars.peek() {
                    if digit.is_ascii_digit() || digit == '.' {
                        literal.push(digit);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value = literal
                    .parse::<f64>()
                    .map_err(|_| ExpressionError::UnexpectedToken(literal.clone()))?;
                tokens.push(Token::Number(value));
            }
            ch if ch.is_ascii_alphabetic() || ch == '_' => {
                let mut name = String::new();
                while let Some(&part) = chars.peek() {
                    if part.is_ascii_alphanumeric() || part == '_' || part == '.' {
                        name.push(part);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(name));
            }
            other => return Err(ExpressionError::UnexpectedChar(other)),
        }
    }

    Ok(tokens)
}

struct Parser<'a> {
    tokens: Vec<Token>,
    position: usize,
    inputs: &'a BTreeMap<String, FieldValue>,
    prior_outputs: &'a BTreeMap<String, f64>,
    warnings: Vec<String>,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn expression(&mut self) -> Result<f64, ExpressionError> {
        let mut value = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.advance();
                    value += self.term()?;
                }
                Some(Token::Minus) => {
                    self.advance();
                    value -= self.term()?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn term(&mut self) -> Result<f64, ExpressionError> {
        let mut value = self.unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.advance();
                    value *= self.unary()?;
                }
                Some(Token::Slash) => {
                    self.advance();
                    let divisor = self.unary()?;
                    if divisor == 0.0 {
                        self.warnings
                            .push("division by zero in expression; result treated as 0".to_string());
                        value = 0.0;
                    } else {
                        value /= divisor;
                    }
                }
                _ => return Ok(value),
            }
        }
    }

    fn unary(&mut self) -> Result<f64, ExpressionError> {
        if matches!(self.peek(), Some(Token::Minus)) {
            self.advance();
            return Ok(-self.unary()?);
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<f64, ExpressionError> {
        match self.advance() {
            Some(Token::Number(value)) => Ok(value),
            Some(Token::Ident(name)) => self.resolve(&name),
            Some(Token::LeftParen) => {
                let value = self.expression()?;
                match self.advance() {
                    Some(Token::RightParen) => Ok(value),
                    Some(token) => Err(ExpressionError::UnexpectedToken(token.render())),
                    None => Err(ExpressionError::UnexpectedEnd),
                }
            }
            Some(token) => Err(ExpressionError::UnexpectedToken(token.render())),
            None => Err(ExpressionError::UnexpectedEnd),
        }
    }

    fn resolve(&self, name: &str) -> Result<f64, ExpressionError> {
        if let Some(value) = self.inputs.get(name) {
            return value
                .as_number()
                .ok_or_else(|| ExpressionError::NonNumericField(name.to_string()));
        }
        if let Some(value) = self.prior_outputs.get(name) {
            return Ok(*value);
        }
        Err(ExpressionError::UnknownIdentifier(name.to_string()))
    }
}

//! Arithmetic evaluator
//!
//! Evaluates the restricted numeric grammar transaction amounts are written
//! in: decimal literals, `+ - * /` with the usual precedence and left
//! associativity, unary signs, parentheses and a fixed set of named
//! constants. Reference tokens (`$id`) must already be substituted; a `$`
//! reaching this layer is rejected as unsafe.
//!
//! Every failure is reported wrapped as
//! `Cannot evaluate expression "<original>": <reason>`.

use crate::error::EvaluationError;

/// Deepest parenthesis / unary nesting accepted
const MAX_NESTING: usize = 256;

/// Evaluate an arithmetic expression to a finite number
pub fn evaluate(expression: &str) -> Result<f64, EvaluationError> {
    evaluate_stripped(expression)
        .map_err(|reason| EvaluationError::in_expression(expression, reason))
}

fn evaluate_stripped(expression: &str) -> Result<f64, EvaluationError> {
    let stripped: String = expression.chars().filter(|c| !c.is_whitespace()).collect();

    if !stripped.chars().all(is_allowed) {
        return Err(EvaluationError::UnsafeExpression(expression.to_string()));
    }

    if stripped.is_empty() {
        return Err(EvaluationError::NonNumericResult("empty expression".into()));
    }

    let tokens = Lexer::new(&stripped).tokenize()?;
    let value = Parser::new(tokens).parse()?;

    if !value.is_finite() {
        return Err(EvaluationError::NonNumericResult(value.to_string()));
    }

    Ok(value)
}

fn is_allowed(c: char) -> bool {
    c.is_ascii_digit()
        || c.is_ascii_alphabetic()
        || matches!(c, '+' | '-' | '*' | '/' | '(' | ')' | '.' | ',')
}

/// Look up a named constant (case-sensitive)
fn constant(name: &str) -> Option<f64> {
    use std::f64::consts;

    let value = match name {
        "pi" | "PI" => consts::PI,
        "e" | "E" => consts::E,
        "tau" => consts::TAU,
        "phi" => 1.618_033_988_749_895,
        "LN2" => consts::LN_2,
        "LN10" => consts::LN_10,
        "LOG2E" => consts::LOG2_E,
        "LOG10E" => consts::LOG10_E,
        "SQRT2" => consts::SQRT_2,
        "Infinity" => f64::INFINITY,
        "NaN" => f64::NAN,
        _ => return None,
    };
    Some(value)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Identifier(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
    Comma,
    Eof,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Identifier(name) => name.clone(),
            Self::Plus => "+".into(),
            Self::Minus => "-".into(),
            Self::Star => "*".into(),
            Self::Slash => "/".into(),
            Self::LParen => "(".into(),
            Self::RParen => ")".into(),
            Self::Comma => ",".into(),
            Self::Eof => "end of expression".into(),
        }
    }
}

struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    fn tokenize(mut self) -> Result<Vec<Token>, EvaluationError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token == Token::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn next_token(&mut self) -> Result<Token, EvaluationError> {
        let Some(ch) = self.peek() else {
            return Ok(Token::Eof);
        };

        if ch.is_ascii_digit() || ch == b'.' {
            return self.scan_number();
        }

        if ch.is_ascii_alphabetic() {
            return Ok(self.scan_identifier());
        }

        self.pos += 1;
        let token = match ch {
            b'+' => Token::Plus,
            b'-' => Token::Minus,
            b'*' => Token::Star,
            b'/' => Token::Slash,
            b'(' => Token::LParen,
            b')' => Token::RParen,
            b',' => Token::Comma,
            other => {
                return Err(EvaluationError::Syntax(format!(
                    "unexpected character '{}'",
                    other as char
                )))
            }
        };
        Ok(token)
    }

    fn scan_number(&mut self) -> Result<Token, EvaluationError> {
        let start = self.pos;

        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
        if self.peek() == Some(b'.') {
            self.pos += 1;
            while self.peek().is_some_and(|b| b.is_ascii_digit()) {
                self.pos += 1;
            }
        }

        // Exponent only when digits follow; a bare `e` is the constant
        if matches!(self.peek(), Some(b'e' | b'E')) {
            let sign = usize::from(matches!(self.peek_at(1), Some(b'+' | b'-')));
            if self.peek_at(1 + sign).is_some_and(|b| b.is_ascii_digit()) {
                self.pos += 1 + sign;
                while self.peek().is_some_and(|b| b.is_ascii_digit()) {
                    self.pos += 1;
                }
            }
        }

        let text = std::str::from_utf8(&self.input[start..self.pos])
            .map_err(|_| EvaluationError::Syntax("invalid number".into()))?;
        text.parse::<f64>()
            .map(Token::Number)
            .map_err(|_| EvaluationError::Syntax(format!("invalid number '{}'", text)))
    }

    fn scan_identifier(&mut self) -> Token {
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_alphanumeric()) {
            self.pos += 1;
        }
        let name = String::from_utf8_lossy(&self.input[start..self.pos]).into_owned();
        Token::Identifier(name)
    }
}

/// Recursive-descent parser that evaluates as it goes
///
/// ```text
/// expr    := term (('+' | '-') term)*
/// term    := unary (('*' | '/') unary)*
/// unary   := ('+' | '-') unary | primary
/// primary := number | constant | '(' expr ')'
/// ```
struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    // The token stream always ends with `Eof` and `advance` never moves past it
    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if token != Token::Eof {
            self.pos += 1;
        }
        token
    }

    fn parse(mut self) -> Result<f64, EvaluationError> {
        let value = self.expr()?;
        match self.peek() {
            Token::Eof => Ok(value),
            other => Err(EvaluationError::Syntax(format!(
                "unexpected '{}'",
                other.describe()
            ))),
        }
    }

    fn expr(&mut self) -> Result<f64, EvaluationError> {
        let mut value = self.term()?;
        loop {
            match self.peek() {
                Token::Plus => {
                    self.advance();
                    value += self.term()?;
                }
                Token::Minus => {
                    self.advance();
                    value -= self.term()?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn term(&mut self) -> Result<f64, EvaluationError> {
        let mut value = self.unary()?;
        loop {
            match self.peek() {
                Token::Star => {
                    self.advance();
                    value *= self.unary()?;
                }
                Token::Slash => {
                    self.advance();
                    value /= self.unary()?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn unary(&mut self) -> Result<f64, EvaluationError> {
        match self.peek() {
            Token::Plus | Token::Minus => {
                let negate = self.advance() == Token::Minus;
                let value = self.nested(Self::unary)?;
                Ok(if negate { -value } else { value })
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<f64, EvaluationError> {
        match self.advance() {
            Token::Number(value) => Ok(value),
            Token::Identifier(name) => {
                constant(&name).ok_or(EvaluationError::UndefinedSymbol(name))
            }
            Token::LParen => {
                let value = self.nested(Self::expr)?;
                match self.advance() {
                    Token::RParen => Ok(value),
                    Token::Eof => Err(EvaluationError::Syntax(
                        "missing closing parenthesis".into(),
                    )),
                    other => Err(EvaluationError::Syntax(format!(
                        "expected ')' but found '{}'",
                        other.describe()
                    ))),
                }
            }
            Token::Eof => Err(EvaluationError::Syntax(
                "unexpected end of expression".into(),
            )),
            other => Err(EvaluationError::Syntax(format!(
                "unexpected '{}'",
                other.describe()
            ))),
        }
    }

    fn nested(
        &mut self,
        rule: fn(&mut Self) -> Result<f64, EvaluationError>,
    ) -> Result<f64, EvaluationError> {
        if self.depth >= MAX_NESTING {
            return Err(EvaluationError::Syntax("expression nested too deeply".into()));
        }
        self.depth += 1;
        let result = rule(self);
        self.depth -= 1;
        result
    }
}

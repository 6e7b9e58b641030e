//! Recursive-descent arithmetic evaluator for the calculator command.
//!
//! ```text
//! expression := term (('+' | '-') term)*
//! term       := factor (('*' | '/') factor)*
//! factor     := ('+' | '-') factor
//!             | primary ('^' factor)?
//! primary    := '(' expression ')' | number | identifier factor
//! ```
//!
//! Trigonometric functions take degrees; `log` is base 10.

use thiserror::Error;

/// Deepest nesting of parentheses, signs, powers and function calls.
pub const MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("unexpected `{found}` at offset {offset}")]
    Unexpected { offset: usize, found: char },
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("unknown function `{0}`")]
    UnknownFunction(String),
    #[error("invalid number `{0}`")]
    InvalidNumber(String),
    #[error("expression nested deeper than {MAX_DEPTH} levels")]
    TooDeep,
}

pub fn evaluate(input: &str) -> Result<f64, EvalError> {
    let mut parser = Parser { src: input, pos: 0, depth: 0 };
    let value = parser.expression()?;
    match parser.peek() {
        None => Ok(value),
        Some(found) => Err(EvalError::Unexpected {
            offset: parser.pos,
            found,
        }),
    }
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    /// Next non-whitespace char, leaving `pos` on it.
    fn peek(&mut self) -> Option<char> {
        let rest = &self.src[self.pos..];
        let trimmed = rest.trim_start();
        self.pos += rest.len() - trimmed.len();
        trimmed.chars().next()
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn error_here(&mut self) -> EvalError {
        match self.peek() {
            Some(found) => EvalError::Unexpected {
                offset: self.pos,
                found,
            },
            None => EvalError::UnexpectedEnd,
        }
    }

    fn expression(&mut self) -> Result<f64, EvalError> {
        let mut x = self.term()?;
        loop {
            if self.eat('+') {
                x += self.term()?;
            } else if self.eat('-') {
                x -= self.term()?;
            } else {
                return Ok(x);
            }
        }
    }

    fn term(&mut self) -> Result<f64, EvalError> {
        let mut x = self.factor()?;
        loop {
            if self.eat('*') {
                x *= self.factor()?;
            } else if self.eat('/') {
                x /= self.factor()?;
            } else {
                return Ok(x);
            }
        }
    }

    fn factor(&mut self) -> Result<f64, EvalError> {
        if self.depth >= MAX_DEPTH {
            return Err(EvalError::TooDeep);
        }
        self.depth += 1;
        let result = self.nested_factor();
        self.depth -= 1;
        result
    }

    fn nested_factor(&mut self) -> Result<f64, EvalError> {
        if self.eat('+') {
            return self.factor();
        }
        if self.eat('-') {
            return Ok(-self.factor()?);
        }

        let mut x = match self.peek() {
            Some('(') => {
                self.pos += 1;
                let inner = self.expression()?;
                if !self.eat(')') {
                    return Err(self.error_here());
                }
                inner
            }
            Some(c) if c.is_ascii_digit() || c == '.' => self.number()?,
            Some(c) if c.is_ascii_lowercase() => {
                let name = self.take_while(|c| c.is_ascii_lowercase());
                let apply = function(name)
                    .ok_or_else(|| EvalError::UnknownFunction(name.to_string()))?;
                apply(self.factor()?)
            }
            _ => return Err(self.error_here()),
        };

        if self.eat('^') {
            x = x.powf(self.factor()?);
        }
        Ok(x)
    }

    fn number(&mut self) -> Result<f64, EvalError> {
        let literal = self.take_while(|c| c.is_ascii_digit() || c == '.');
        literal
            .parse()
            .map_err(|_| EvalError::InvalidNumber(literal.to_string()))
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        let len = self.src[start..]
            .find(|c: char| !pred(c))
            .unwrap_or(self.src.len() - start);
        self.pos += len;
        &self.src[start..start + len]
    }
}

fn function(name: &str) -> Option<fn(f64) -> f64> {
    let f: fn(f64) -> f64 = match name {
        "sqrt" => f64::sqrt,
        "sin" => |deg: f64| deg.to_radians().sin(),
        "cos" => |deg: f64| deg.to_radians().cos(),
        "tan" => |deg: f64| deg.to_radians().tan(),
        "log" => f64::log10,
        _ => return None,
    };
    Some(f)
}

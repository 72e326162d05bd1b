//! Arithmetic calculator tool

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use super::{ToolError, ToolTrait};

const ALLOWED_CHARS: &str = "0123456789+-*/(). ";
const MAX_DEPTH: usize = 256;
const MAX_LEN: usize = 4096;

/// Evaluates `+ - * /` expressions with parentheses
#[derive(Debug, Default, Clone)]
pub struct CalculatorTool;

impl CalculatorTool {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Debug, PartialEq)]
pub enum CalcError {
    DisallowedCharacters,
    Empty,
    UnexpectedEnd,
    UnexpectedChar(char),
    InvalidNumber(String),
    DivisionByZero,
    TooDeep,
    TooLong,
}

impl std::fmt::Display for CalcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CalcError::DisallowedCharacters => write!(f, "expression contains disallowed characters"),
            CalcError::Empty => write!(f, "empty expression"),
            CalcError::UnexpectedEnd => write!(f, "unexpected end of expression"),
            CalcError::UnexpectedChar(c) => write!(f, "unexpected '{}'", c),
            CalcError::InvalidNumber(n) => write!(f, "invalid number '{}'", n),
            CalcError::DivisionByZero => write!(f, "division by zero"),
            CalcError::TooDeep => write!(f, "expression nested deeper than {} levels", MAX_DEPTH),
            CalcError::TooLong => write!(f, "expression longer than {} characters", MAX_LEN),
        }
    }
}

impl std::error::Error for CalcError {}

/// Recursive-descent evaluator over ASCII input
struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(expr: &'a str) -> Self {
        Self {
            bytes: expr.as_bytes(),
            pos: 0,
            depth: 0,
        }
    }

    fn peek(&mut self) -> Option<u8> {
        while self.pos < self.bytes.len() && self.bytes[self.pos] == b' ' {
            self.pos += 1;
        }
        self.bytes.get(self.pos).copied()
    }

    fn expr(&mut self) -> Result<f64, CalcError> {
        let mut value = self.term()?;
        while let Some(op @ (b'+' | b'-')) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            value = if op == b'+' { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64, CalcError> {
        let mut value = self.factor()?;
        while let Some(op @ (b'*' | b'/')) = self.peek() {
            self.pos += 1;
            let rhs = self.factor()?;
            if op == b'*' {
                value *= rhs;
            } else {
                if rhs == 0.0 {
                    return Err(CalcError::DivisionByZero);
                }
                value /= rhs;
            }
        }
        Ok(value)
    }

    /// Parentheses and unary signs recurse; bounded by `MAX_DEPTH`
    fn factor(&mut self) -> Result<f64, CalcError> {
        if self.depth >= MAX_DEPTH {
            return Err(CalcError::TooDeep);
        }
        self.depth += 1;
        let value = self.unary();
        self.depth -= 1;
        value
    }

    fn unary(&mut self) -> Result<f64, CalcError> {
        match self.peek() {
            None => Err(CalcError::UnexpectedEnd),
            Some(b'+') => {
                self.pos += 1;
                self.factor()
            }
            Some(b'-') => {
                self.pos += 1;
                Ok(-self.factor()?)
            }
            Some(b'(') => {
                self.pos += 1;
                let value = self.expr()?;
                match self.peek() {
                    Some(b')') => {
                        self.pos += 1;
                        Ok(value)
                    }
                    Some(c) => Err(CalcError::UnexpectedChar(c as char)),
                    None => Err(CalcError::UnexpectedEnd),
                }
            }
            Some(c) if c.is_ascii_digit() || c == b'.' => self.number(),
            Some(c) => Err(CalcError::UnexpectedChar(c as char)),
        }
    }

    fn number(&mut self) -> Result<f64, CalcError> {
        let start = self.pos;
        while self.pos < self.bytes.len()
            && (self.bytes[self.pos].is_ascii_digit() || self.bytes[self.pos] == b'.')
        {
            self.pos += 1;
        }
        let text = String::from_utf8_lossy(&self.bytes[start..self.pos]).to_string();
        text.parse::<f64>().map_err(|_| CalcError::InvalidNumber(text))
    }
}

/// Evaluate an arithmetic expression
pub fn evaluate(expr: &str) -> Result<f64, CalcError> {
    if !expr.chars().all(|c| ALLOWED_CHARS.contains(c)) {
        return Err(CalcError::DisallowedCharacters);
    }
    if expr.trim().is_empty() {
        return Err(CalcError::Empty);
    }
    if expr.len() > MAX_LEN {
        return Err(CalcError::TooLong);
    }

    let mut parser = Parser::new(expr);
    let value = parser.expr()?;
    match parser.peek() {
        None => Ok(value),
        Some(c) => Err(CalcError::UnexpectedChar(c as char)),
    }
}

/// Integral results print without a fractional part
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[async_trait]
impl ToolTrait for CalculatorTool {
    fn name(&self) -> &str {
        "calculator"
    }

    fn description(&self) -> &str {
        "Evaluate an arithmetic expression. Input should be a math expression such as '2+3*4'."
    }

    fn parameters(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "input": { "type": "string", "description": "Arithmetic expression" }
            },
            "required": ["input"]
        })
    }

    async fn invoke(&self, input: &str) -> Result<String, ToolError> {
        debug!("Evaluating: {}", input);
        Ok(match evaluate(input.trim()) {
            Ok(value) => format!("Result: {}", format_number(value)),
            Err(e) => format!("Calculation error: {}", e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence_and_parentheses() {
        assert_eq!(evaluate("2+3*4"), Ok(14.0));
        assert_eq!(evaluate("(2+3)*4"), Ok(20.0));
        assert_eq!(evaluate("15 * 23 + 7"), Ok(352.0));
        assert_eq!(evaluate("10 / 4"), Ok(2.5));
        assert_eq!(evaluate("-3 + 5"), Ok(2.0));
        assert_eq!(evaluate("2 - -1"), Ok(3.0));
    }

    #[test]
    fn test_errors() {
        assert_eq!(evaluate("1/0"), Err(CalcError::DivisionByZero));
        assert_eq!(evaluate("2+abc"), Err(CalcError::DisallowedCharacters));
        assert_eq!(evaluate("   "), Err(CalcError::Empty));
        assert_eq!(evaluate("(1+2"), Err(CalcError::UnexpectedEnd));
        assert_eq!(evaluate("1 2"), Err(CalcError::UnexpectedChar('2')));
        assert!(matches!(evaluate("1..2"), Err(CalcError::InvalidNumber(_))));
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |n: usize| format!("{}1{}", "(".repeat(n), ")".repeat(n));
        assert_eq!(evaluate(&nested(100)), Ok(1.0));
        assert_eq!(evaluate(&nested(MAX_DEPTH)), Err(CalcError::TooDeep));
        assert_eq!(evaluate(&format!("{}1", "-".repeat(1000))), Err(CalcError::TooDeep));
        assert_eq!(evaluate(&nested(20_000)), Err(CalcError::TooLong));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(5.0), "5");
        assert_eq!(format_number(-12.0), "-12");
        assert_eq!(format_number(2.5), "2.5");
    }

    #[tokio::test]
    async fn test_invoke_never_fails() {
        let tool = CalculatorTool::new();
        assert_eq!(tool.invoke("2+3").await.unwrap(), "Result: 5");
        assert_eq!(
            tool.invoke("1/0").await.unwrap(),
            "Calculation error: division by zero"
        );
        assert!(tool
            .invoke("rm -rf /")
            .await
            .unwrap()
            .starts_with("Calculation error"));

        let deep = format!("{}1{}", "(".repeat(20_000), ")".repeat(20_000));
        assert!(tool
            .invoke(&deep)
            .await
            .unwrap()
            .starts_with("Calculation error"));

        let signs = format!("{}2", "+-".repeat(1500));
        assert_eq!(
            tool.invoke(&signs).await.unwrap(),
            format!("Calculation error: expression nested deeper than {} levels", MAX_DEPTH)
        );
    }
}

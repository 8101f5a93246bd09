use std::fmt::{self, Display};
use std::future::ready;

use local_agent_core::tool::{Tool, ToolResult};
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize, JsonSchema)]
pub struct CalculateToolParameters {
    #[schemars(
        description = "A mathematical expression as a string (e.g., \"2 + 2\", \"10 * 5\")."
    )]
    expression: String,
}

/// A tool for evaluating arithmetic expressions.
///
/// Supports `+ - * / // % **`, parentheses and unary signs over integers
/// and floats. `/` always yields a float, `//` and `%` round toward
/// negative infinity. Integer results that do not fit in an `i64` are
/// errors. Nothing else is evaluated, names are rejected.
pub struct CalculateTool {
    parameter_schema: Value,
}

impl CalculateTool {
    /// Creates a new calculate tool.
    #[inline]
    pub fn new() -> Self {
        CalculateTool {
            parameter_schema: schema_for!(CalculateToolParameters).to_value(),
        }
    }
}

impl Default for CalculateTool {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for CalculateTool {
    type Input = CalculateToolParameters;

    fn name(&self) -> &str {
        "calculate"
    }

    fn description(&self) -> &str {
        "Evaluate a mathematical expression and return the result."
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn execute(
        &self,
        input: CalculateToolParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        // A bad expression is an answer for the model, not a tool failure.
        let output = match evaluate(&input.expression) {
            Ok(value) => format!("Result: {value}"),
            Err(err) => format!("Error calculating: {err}"),
        };
        ready(Ok(output))
    }
}

/// A number produced by [`evaluate`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Number {
    /// An exact integer.
    Int(i64),
    /// A floating point value.
    Float(f64),
}

impl Number {
    #[inline]
    fn as_f64(self) -> f64 {
        match self {
            Number::Int(v) => v as f64,
            Number::Float(v) => v,
        }
    }
}

impl Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Number::Int(v) => write!(f, "{v}"),
            Number::Float(v) if v.is_nan() => f.write_str("nan"),
            Number::Float(v) if v.is_infinite() => {
                f.write_str(if v > 0.0 { "inf" } else { "-inf" })
            }
            Number::Float(v)
                if v != 0.0 && (v.abs() >= 1e16 || v.abs() < 1e-4) =>
            {
                // Signed exponent of at least two digits: `1e+16`, `1.5e-07`.
                let scientific = format!("{v:e}");
                let (mantissa, exponent) = scientific
                    .split_once('e')
                    .unwrap_or((scientific.as_str(), "0"));
                let exponent = exponent.parse::<i32>().unwrap_or_default();
                let sign = if exponent < 0 { '-' } else { '+' };
                write!(f, "{mantissa}e{sign}{:02}", exponent.unsigned_abs())
            }
            // Whole floats keep a trailing `.0` so they read as floats.
            Number::Float(v) if v.fract() == 0.0 => write!(f, "{v:.1}"),
            Number::Float(v) => write!(f, "{v}"),
        }
    }
}

/// How deep signs, powers and parentheses may nest.
const MAX_NESTING: usize = 100;

/// Evaluates an arithmetic expression.
pub fn evaluate(expression: &str) -> Result<Number, String> {
    let tokens = tokenize(expression)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;
    match parser.peek() {
        None => Ok(value),
        Some(token) => Err(format!("invalid syntax near '{token}'")),
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Num(Number),
    Plus,
    Minus,
    Star,
    Slash,
    DoubleSlash,
    Percent,
    DoubleStar,
    LParen,
    RParen,
}

impl Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Num(n) => write!(f, "{n}"),
            Token::Plus => f.write_str("+"),
            Token::Minus => f.write_str("-"),
            Token::Star => f.write_str("*"),
            Token::Slash => f.write_str("/"),
            Token::DoubleSlash => f.write_str("//"),
            Token::Percent => f.write_str("%"),
            Token::DoubleStar => f.write_str("**"),
            Token::LParen => f.write_str("("),
            Token::RParen => f.write_str(")"),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let mut tokens = vec![];
    let mut chars = input.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '0'..='9' | '.' => {
                let mut end = start;
                let mut is_float = false;
                while let Some(&(idx, c)) = chars.peek() {
                    match c {
                        '0'..='9' | '_' => {}
                        '.' => is_float = true,
                        'e' | 'E' => {
                            is_float = true;
                            // Take the exponent sign along with the marker.
                            chars.next();
                            end = idx + 1;
                            if let Some(&(idx, '+' | '-')) = chars.peek() {
                                chars.next();
                                end = idx + 1;
                            }
                            continue;
                        }
                        _ => break,
                    }
                    chars.next();
                    end = idx + c.len_utf8();
                }
                tokens.push(Token::Num(parse_number(
                    &input[start..end],
                    is_float,
                )?));
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut end = start;
                while let Some(&(idx, c)) = chars.peek() {
                    if !(c.is_alphanumeric() || c == '_') {
                        break;
                    }
                    chars.next();
                    end = idx + c.len_utf8();
                }
                return Err(format!("name '{}' is not defined", &input[start..end]));
            }
            _ => {
                chars.next();
                let doubled = chars.peek().map(|&(_, next)| next) == Some(c);
                let token = match c {
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '*' if doubled => Token::DoubleStar,
                    '*' => Token::Star,
                    '/' if doubled => Token::DoubleSlash,
                    '/' => Token::Slash,
                    '%' => Token::Percent,
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    c => return Err(format!("invalid character '{c}'")),
                };
                if matches!(token, Token::DoubleStar | Token::DoubleSlash) {
                    chars.next();
                }
                tokens.push(token);
            }
        }
    }
    Ok(tokens)
}

fn parse_number(literal: &str, is_float: bool) -> Result<Number, String> {
    let invalid = || format!("invalid number literal '{literal}'");
    if literal.starts_with('_') || literal.ends_with('_') {
        return Err(invalid());
    }
    let digits = literal.replace('_', "");
    if !is_float {
        if let Ok(v) = digits.parse::<i64>() {
            return Ok(Number::Int(v));
        }
    }
    digits.parse::<f64>().map(Number::Float).map_err(|_| invalid())
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    #[inline]
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    #[inline]
    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    // expr := term (('+' | '-') term)*
    fn expr(&mut self) -> Result<Number, String> {
        let mut lhs = self.term()?;
        while let Some(op @ (Token::Plus | Token::Minus)) = self.peek().cloned() {
            self.pos += 1;
            let rhs = self.term()?;
            lhs = binary(&op, lhs, rhs)?;
        }
        Ok(lhs)
    }

    // term := factor (('*' | '/' | '//' | '%') factor)*
    fn term(&mut self) -> Result<Number, String> {
        let mut lhs = self.factor()?;
        while let Some(
            op @ (Token::Star | Token::Slash | Token::DoubleSlash | Token::Percent),
        ) = self.peek().cloned()
        {
            self.pos += 1;
            let rhs = self.factor()?;
            lhs = binary(&op, lhs, rhs)?;
        }
        Ok(lhs)
    }

    // Every nested sub-expression goes through here.
    fn factor(&mut self) -> Result<Number, String> {
        if self.depth >= MAX_NESTING {
            return Err("expression is too deeply nested".to_owned());
        }
        self.depth += 1;
        let value = self.unary();
        self.depth -= 1;
        value
    }

    // unary := ('+' | '-') factor | power
    fn unary(&mut self) -> Result<Number, String> {
        match self.peek() {
            Some(Token::Plus) => {
                self.pos += 1;
                self.factor()
            }
            Some(Token::Minus) => {
                self.pos += 1;
                match self.factor()? {
                    Number::Int(v) => {
                        v.checked_neg().map(Number::Int).ok_or_else(overflow)
                    }
                    Number::Float(v) => Ok(Number::Float(-v)),
                }
            }
            _ => self.power(),
        }
    }

    // power := atom ('**' factor)?
    fn power(&mut self) -> Result<Number, String> {
        let base = self.atom()?;
        if self.peek() == Some(&Token::DoubleStar) {
            self.pos += 1;
            let exponent = self.factor()?;
            return binary(&Token::DoubleStar, base, exponent);
        }
        Ok(base)
    }

    // atom := number | '(' expr ')'
    fn atom(&mut self) -> Result<Number, String> {
        match self.next() {
            Some(Token::Num(n)) => Ok(n),
            Some(Token::LParen) => {
                let value = self.expr()?;
                match self.next() {
                    Some(Token::RParen) => Ok(value),
                    Some(token) => Err(format!("invalid syntax near '{token}'")),
                    None => Err("'(' was never closed".to_owned()),
                }
            }
            Some(token) => Err(format!("invalid syntax near '{token}'")),
            None => Err("unexpected end of expression".to_owned()),
        }
    }
}

#[inline]
fn overflow() -> String {
    "integer overflow".to_owned()
}

/// `a ** b` for a non-negative exponent, exact or not at all.
fn int_pow(a: i64, b: i64) -> Option<i64> {
    match u32::try_from(b) {
        Ok(b) => a.checked_pow(b),
        Err(_) => match a {
            0 | 1 => Some(a),
            -1 => Some(if b % 2 == 0 { 1 } else { -1 }),
            _ => None,
        },
    }
}

fn binary(op: &Token, lhs: Number, rhs: Number) -> Result<Number, String> {
    use Number::{Float, Int};

    let value = match (op, lhs, rhs) {
        (Token::Plus, Int(a), Int(b)) => {
            Int(a.checked_add(b).ok_or_else(overflow)?)
        }
        (Token::Minus, Int(a), Int(b)) => {
            Int(a.checked_sub(b).ok_or_else(overflow)?)
        }
        (Token::Star, Int(a), Int(b)) => {
            Int(a.checked_mul(b).ok_or_else(overflow)?)
        }
        (Token::Plus, a, b) => Float(a.as_f64() + b.as_f64()),
        (Token::Minus, a, b) => Float(a.as_f64() - b.as_f64()),
        (Token::Star, a, b) => Float(a.as_f64() * b.as_f64()),
        (Token::Slash, a, b) => {
            if b.as_f64() == 0.0 {
                return Err("division by zero".to_owned());
            }
            Float(a.as_f64() / b.as_f64())
        }
        (Token::DoubleSlash | Token::Percent, Int(_), Int(0)) => {
            return Err("integer division or modulo by zero".to_owned());
        }
        // Floor semantics: the remainder takes the sign of the divisor.
        (Token::DoubleSlash, Int(a), Int(b)) => {
            match (a.checked_div_euclid(b), a.checked_rem_euclid(b)) {
                (Some(q), Some(r)) => Int(if r != 0 && b < 0 { q - 1 } else { q }),
                _ => return Err(overflow()),
            }
        }
        (Token::Percent, Int(a), Int(b)) => match a.checked_rem_euclid(b) {
            Some(r) => Int(if r != 0 && b < 0 { r + b } else { r }),
            None => Int(0),
        },
        (Token::DoubleSlash | Token::Percent, _, b) if b.as_f64() == 0.0 => {
            return Err("float division by zero".to_owned());
        }
        (Token::DoubleSlash, a, b) => Float((a.as_f64() / b.as_f64()).floor()),
        (Token::Percent, a, b) => {
            let (a, b) = (a.as_f64(), b.as_f64());
            let r = a % b;
            Float(if r != 0.0 && (r < 0.0) != (b < 0.0) { r + b } else { r })
        }
        (Token::DoubleStar, Int(a), Int(b)) if b >= 0 => {
            Int(int_pow(a, b).ok_or_else(overflow)?)
        }
        (Token::DoubleStar, a, b) => {
            let (a, b) = (a.as_f64(), b.as_f64());
            if a == 0.0 && b < 0.0 {
                return Err("0.0 cannot be raised to a negative power".to_owned());
            }
            if a < 0.0 && b.fract() != 0.0 {
                return Err("negative number cannot be raised to a fractional power"
                    .to_owned());
            }
            Float(a.powf(b))
        }
        (op, _, _) => return Err(format!("unsupported operator '{op}'")),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval_str(expression: &str) -> String {
        match evaluate(expression) {
            Ok(value) => value.to_string(),
            Err(err) => format!("error: {err}"),
        }
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(eval_str("156 * 89"), "13884");
        assert_eq!(eval_str("65 * 3.5"), "227.5");
        assert_eq!(eval_str("(15 * 8) + (120 / 4) - 17"), "133.0");
        assert_eq!(eval_str("125000 + 98000 + 187000 + 156000"), "566000");
        assert_eq!(eval_str("566000 / 4"), "141500.0");
        assert_eq!(eval_str("0.1 + 0.2"), "0.30000000000000004");
        assert_eq!(eval_str("2 ** 3 ** 2"), "512");
        assert_eq!(eval_str("-2 ** 2"), "-4");
        assert_eq!(eval_str("2 ** -1"), "0.5");
        assert_eq!(eval_str("-(3 - 10) * +2"), "14");
        assert_eq!(eval_str("1e3 + 1_000"), "2000.0");
    }

    #[test]
    fn test_floor_division_and_modulo() {
        assert_eq!(eval_str("7 // 2"), "3");
        assert_eq!(eval_str("-7 // 2"), "-4");
        assert_eq!(eval_str("7 // -2"), "-4");
        assert_eq!(eval_str("-7 % 3"), "2");
        assert_eq!(eval_str("7 % -3"), "-2");
        assert_eq!(eval_str("7.5 // 2"), "3.0");
        assert_eq!(eval_str("-7.5 % 2"), "0.5");
    }

    #[test]
    fn test_errors() {
        assert_eq!(eval_str("10 / 0"), "error: division by zero");
        assert_eq!(
            eval_str("10 // 0"),
            "error: integer division or modulo by zero"
        );
        assert_eq!(eval_str("1.5 % 0"), "error: float division by zero");
        assert_eq!(eval_str("sqrt(4)"), "error: name 'sqrt' is not defined");
        assert_eq!(eval_str("(1 + 2"), "error: '(' was never closed");
        assert_eq!(eval_str("1 +"), "error: unexpected end of expression");
        assert_eq!(eval_str("2 3"), "error: invalid syntax near '3'");
        assert_eq!(eval_str("4 & 1"), "error: invalid character '&'");
        assert_eq!(
            eval_str("0 ** -1"),
            "error: 0.0 cannot be raised to a negative power"
        );
    }

    #[test]
    fn test_integer_overflow() {
        assert_eq!(eval_str("2 ** 64"), "error: integer overflow");
        assert_eq!(
            eval_str("9223372036854775807 + 1"),
            "error: integer overflow"
        );
        assert_eq!(
            eval_str("-9223372036854775807 - 2"),
            "error: integer overflow"
        );
        assert_eq!(eval_str("3037000500 * 3037000500"), "error: integer overflow");
        assert_eq!(eval_str("2 ** 62"), "4611686018427387904");
        assert_eq!(eval_str("1 ** 10000000000"), "1");
        assert_eq!(eval_str("(-1) ** 10000000001"), "-1");
        assert_eq!(eval_str("2.0 ** 64"), "1.8446744073709552e+19");
    }

    #[test]
    fn test_float_display() {
        assert_eq!(eval_str("1e16"), "1e+16");
        assert_eq!(eval_str("1e15"), "1000000000000000.0");
        assert_eq!(eval_str("0.00001"), "1e-05");
        assert_eq!(eval_str("0.0001"), "0.0001");
        assert_eq!(eval_str("1.5e-7"), "1.5e-07");
        assert_eq!(eval_str("-2.5e300"), "-2.5e+300");
        assert_eq!(eval_str("1 / 3"), "0.3333333333333333");
        assert_eq!(eval_str("0.0 * -1"), "-0.0");
        assert_eq!(eval_str("1e400"), "inf");
    }

    #[test]
    fn test_nesting_limit() {
        let parens = format!("{}1{}", "(".repeat(3000), ")".repeat(3000));
        assert_eq!(eval_str(&parens), "error: expression is too deeply nested");
        let signs = format!("{}1", "-".repeat(3000));
        assert_eq!(eval_str(&signs), "error: expression is too deeply nested");
        let powers = format!("1{}", " ** 1".repeat(3000));
        assert_eq!(eval_str(&powers), "error: expression is too deeply nested");

        let shallow = format!("{}7{}", "(".repeat(50), ")".repeat(50));
        assert_eq!(eval_str(&shallow), "7");
        assert_eq!(eval_str(&format!("{}1", "-".repeat(50))), "1");
    }

    #[tokio::test]
    async fn test_execute() {
        let tool = CalculateTool::new();
        let output = tool
            .execute(CalculateToolParameters {
                expression: "156 * 89".to_owned(),
            })
            .await;
        assert_eq!(output, Ok("Result: 13884".to_owned()));

        let output = tool
            .execute(CalculateToolParameters {
                expression: "10 / 0".to_owned(),
            })
            .await;
        assert_eq!(
            output,
            Ok("Error calculating: division by zero".to_owned())
        );

        let output = tool
            .execute(CalculateToolParameters {
                expression: format!("{}1{}", "(".repeat(3000), ")".repeat(3000)),
            })
            .await;
        assert_eq!(
            output,
            Ok("Error calculating: expression is too deeply nested".to_owned())
        );
    }
}

//! Condition list parser.
//!
//! Recursive descent over the grammar
//!
//! ```text
//! list      := condition ("," condition)*
//! condition := "rsi_below" "(" number ")"
//!            | "rsi_above" "(" number ")"
//!            | "macd_bullish"
//!            | "macd_bearish"
//!            | "price_above_ma" "(" ("short" | "medium" | "long") ")"
//! ```
//!
//! Keywords are case-insensitive. Errors carry the byte offset of the
//! offending token.

use crate::domain::error::ParseError;
use crate::domain::rule::{Condition, MaKind};

struct Parser {
    input: String,
    pos: usize,
}

impl Parser {
    fn new(input: &str) -> Self {
        Self {
            input: input.to_ascii_lowercase(),
            pos: 0,
        }
    }

    fn remaining(&self) -> &str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn at_end(&mut self) -> bool {
        self.skip_whitespace();
        self.peek().is_none()
    }

    fn expect_char(&mut self, expected: char) -> Result<(), ParseError> {
        self.skip_whitespace();
        match self.peek() {
            Some(ch) if ch == expected => {
                self.advance();
                Ok(())
            }
            Some(ch) => Err(ParseError {
                message: format!("expected '{}', found '{}'", expected, ch),
                position: self.pos,
            }),
            None => Err(ParseError {
                message: format!("expected '{}', found end of input", expected),
                position: self.pos,
            }),
        }
    }

    fn take_word(&mut self) -> String {
        self.skip_whitespace();
        let word: String = self
            .remaining()
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
            .collect();
        self.pos += word.len();
        word
    }

    fn parse_number(&mut self) -> Result<f64, ParseError> {
        self.skip_whitespace();
        let start = self.pos;
        let mut has_dot = false;
        let mut digits = 0;

        if self.peek() == Some('-') {
            self.advance();
        }

        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                digits += 1;
                self.advance();
            } else if ch == '.' && !has_dot {
                has_dot = true;
                self.advance();
            } else {
                break;
            }
        }

        if digits == 0 {
            return Err(ParseError {
                message: "expected number".to_string(),
                position: start,
            });
        }

        let num_str = &self.input[start..self.pos];
        num_str.parse::<f64>().map_err(|_| ParseError {
            message: format!("invalid number: {}", num_str),
            position: start,
        })
    }

    fn parse_threshold(&mut self) -> Result<f64, ParseError> {
        self.expect_char('(')?;
        let value = self.parse_number()?;
        self.expect_char(')')?;
        Ok(value)
    }

    fn parse_ma_kind(&mut self) -> Result<MaKind, ParseError> {
        self.expect_char('(')?;
        self.skip_whitespace();
        let start = self.pos;
        let kind = match self.take_word().as_str() {
            "short" => MaKind::Short,
            "medium" => MaKind::Medium,
            "long" => MaKind::Long,
            other => {
                return Err(ParseError {
                    message: format!(
                        "expected moving average (short, medium, long), found '{}'",
                        other
                    ),
                    position: start,
                });
            }
        };
        self.expect_char(')')?;
        Ok(kind)
    }

    fn parse_condition(&mut self) -> Result<Condition, ParseError> {
        self.skip_whitespace();
        let start = self.pos;
        let word = self.take_word();
        match word.as_str() {
            "rsi_below" => Ok(Condition::RsiBelow(self.parse_threshold()?)),
            "rsi_above" => Ok(Condition::RsiAbove(self.parse_threshold()?)),
            "macd_bullish" => Ok(Condition::MacdBullish),
            "macd_bearish" => Ok(Condition::MacdBearish),
            "price_above_ma" => Ok(Condition::PriceAboveMa(self.parse_ma_kind()?)),
            "" => Err(ParseError {
                message: match self.peek() {
                    Some(ch) => format!("expected condition, found '{}'", ch),
                    None => "expected condition, found end of input".to_string(),
                },
                position: start,
            }),
            other => Err(ParseError {
                message: format!("unknown condition '{}'", other),
                position: start,
            }),
        }
    }

    fn parse_list(&mut self) -> Result<Vec<Condition>, ParseError> {
        let mut conditions = vec![self.parse_condition()?];
        while !self.at_end() {
            self.expect_char(',')?;
            conditions.push(self.parse_condition()?);
        }
        Ok(conditions)
    }
}

/// Parse a comma-separated condition list. Blank input yields an empty list.
pub fn parse(input: &str) -> Result<Vec<Condition>, ParseError> {
    let mut parser = Parser::new(input);
    if parser.at_end() {
        return Ok(Vec::new());
    }
    parser.parse_list()
}

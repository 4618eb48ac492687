//! Argument parsers.
//!
//! An [`ArgParser`] is a pure leaf parser: one token in, a typed
//! [`ArgValue`] or a structured [`ParseFail`] out. Parsers never raise a
//! fault for bad input — a panic inside a parser is a developer error and is
//! deliberately not caught by the pipeline.
//!
//! The set of built-ins is closed but extensible: hosts add leaf parsers
//! (player lookups, durations, enums) by implementing the trait or wrapping a
//! closure in [`FnParser`]. There are no recursive grammars; a parser sees
//! exactly one token (the parsing loop pre-joins greedy input).

use herald_core::{ArgValue, Sender};

/// A structured parse failure.
///
/// The optional reason is surfaced to the sender through the catalog; leave
/// it `None` when the type name alone says enough.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseFail {
    /// Why the token was rejected, if the parser can say.
    pub reason: Option<String>,
}

impl ParseFail {
    /// A failure with no extra detail.
    pub fn bare() -> Self {
        Self { reason: None }
    }

    /// A failure with a reason.
    pub fn reason(msg: impl Into<String>) -> Self {
        Self {
            reason: Some(msg.into()),
        }
    }
}

/// Result type for leaf parsers.
pub type ParseOutcome = Result<ArgValue, ParseFail>;

/// A leaf parser: token + sender context → value or failure.
pub trait ArgParser: Send + Sync {
    /// The human-readable type name ("int", "player", ...).
    ///
    /// Must be non-blank; checked once at command build time.
    fn type_name(&self) -> &str;

    /// Parses one token. The sender is available for context-dependent
    /// parsers (e.g. "the player named by this token, as visible to the
    /// sender").
    fn parse(&self, token: &str, sender: &dyn Sender) -> ParseOutcome;

    /// Whether this parser may back a greedy argument.
    ///
    /// Only string-shaped parsers can absorb a joined tail of tokens.
    fn supports_greedy(&self) -> bool {
        false
    }
}

// =============================================================================
// Built-in parsers
// =============================================================================

/// Parses a signed integer.
#[derive(Debug, Default, Clone, Copy)]
pub struct IntParser;

impl ArgParser for IntParser {
    fn type_name(&self) -> &str {
        "int"
    }

    fn parse(&self, token: &str, _sender: &dyn Sender) -> ParseOutcome {
        token
            .parse::<i64>()
            .map(ArgValue::Int)
            .map_err(|_| ParseFail::bare())
    }
}

/// Parses a floating-point number.
#[derive(Debug, Default, Clone, Copy)]
pub struct FloatParser;

impl ArgParser for FloatParser {
    fn type_name(&self) -> &str {
        "number"
    }

    fn parse(&self, token: &str, _sender: &dyn Sender) -> ParseOutcome {
        match token.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(ArgValue::Float(v)),
            _ => Err(ParseFail::bare()),
        }
    }
}

/// Parses a boolean, accepting the common spellings.
#[derive(Debug, Default, Clone, Copy)]
pub struct BoolParser;

impl ArgParser for BoolParser {
    fn type_name(&self) -> &str {
        "boolean"
    }

    fn parse(&self, token: &str, _sender: &dyn Sender) -> ParseOutcome {
        match token.to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" => Ok(ArgValue::Bool(true)),
            "false" | "no" | "off" => Ok(ArgValue::Bool(false)),
            _ => Err(ParseFail::reason("expected true/false")),
        }
    }
}

/// Accepts any token verbatim. The only built-in that may back a greedy
/// argument.
#[derive(Debug, Default, Clone, Copy)]
pub struct StringParser;

impl ArgParser for StringParser {
    fn type_name(&self) -> &str {
        "string"
    }

    fn parse(&self, token: &str, _sender: &dyn Sender) -> ParseOutcome {
        Ok(ArgValue::Str(token.to_string()))
    }

    fn supports_greedy(&self) -> bool {
        true
    }
}

/// A closure-backed leaf parser for host-specific types.
///
/// ```rust
/// use herald_framework::parser::{ArgParser, FnParser, ParseFail};
/// use herald_core::ArgValue;
///
/// let level = FnParser::new("level", |token, _sender| {
///     match token {
///         "debug" | "info" | "warn" | "error" => Ok(ArgValue::Str(token.to_string())),
///         _ => Err(ParseFail::reason("unknown level")),
///     }
/// });
/// assert_eq!(level.type_name(), "level");
/// ```
pub struct FnParser<F> {
    name: String,
    f: F,
    greedy: bool,
}

impl<F> FnParser<F>
where
    F: Fn(&str, &dyn Sender) -> ParseOutcome + Send + Sync,
{
    /// Creates a parser from a closure.
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
            greedy: false,
        }
    }

    /// Marks the parser as string-shaped so it may back a greedy argument.
    pub fn greedy_capable(mut self) -> Self {
        self.greedy = true;
        self
    }
}

impl<F> ArgParser for FnParser<F>
where
    F: Fn(&str, &dyn Sender) -> ParseOutcome + Send + Sync,
{
    fn type_name(&self) -> &str {
        &self.name
    }

    fn parse(&self, token: &str, sender: &dyn Sender) -> ParseOutcome {
        (self.f)(token, sender)
    }

    fn supports_greedy(&self) -> bool {
        self.greedy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::MockSender;

    #[test]
    fn int_parser() {
        let sender = MockSender::new("tester");
        assert_eq!(IntParser.parse("42", &sender), Ok(ArgValue::Int(42)));
        assert_eq!(IntParser.parse("-7", &sender), Ok(ArgValue::Int(-7)));
        assert!(IntParser.parse("4.2", &sender).is_err());
        assert!(IntParser.parse("abc", &sender).is_err());
    }

    #[test]
    fn float_parser_rejects_non_finite() {
        let sender = MockSender::new("tester");
        assert_eq!(FloatParser.parse("2.5", &sender), Ok(ArgValue::Float(2.5)));
        assert!(FloatParser.parse("NaN", &sender).is_err());
        assert!(FloatParser.parse("inf", &sender).is_err());
    }

    #[test]
    fn bool_parser_spellings() {
        let sender = MockSender::new("tester");
        for token in ["true", "YES", "On"] {
            assert_eq!(BoolParser.parse(token, &sender), Ok(ArgValue::Bool(true)));
        }
        for token in ["false", "no", "OFF"] {
            assert_eq!(BoolParser.parse(token, &sender), Ok(ArgValue::Bool(false)));
        }
        assert!(BoolParser.parse("maybe", &sender).is_err());
    }

    #[test]
    fn only_string_supports_greedy() {
        assert!(StringParser.supports_greedy());
        assert!(!IntParser.supports_greedy());
        assert!(!BoolParser.supports_greedy());
    }

    #[test]
    fn fn_parser_custom_type() {
        let sender = MockSender::new("tester");
        let parser = FnParser::new("direction", |token, _| match token {
            "north" | "south" | "east" | "west" => Ok(ArgValue::Str(token.to_string())),
            _ => Err(ParseFail::reason("not a direction")),
        });
        assert_eq!(
            parser.parse("north", &sender),
            Ok(ArgValue::Str("north".into()))
        );
        let fail = parser.parse("up", &sender).unwrap_err();
        assert_eq!(fail.reason.as_deref(), Some("not a direction"));
    }
}

// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

// No exponent, no inf/NaN spellings.
static DECIMAL_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:\d+(?:\.\d*)?|\.\d+)$").expect("decimal pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rule {
    Required,
    Length {
        min: Option<usize>,
        max: Option<usize>,
    },
    Integer {
        min: Option<i64>,
        max: Option<i64>,
    },
    Decimal {
        min: Option<f64>,
        max: Option<f64>,
    },
}

/// Message slots a column can override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Required,
    MinLength,
    MaxLength,
    Integer,
    Decimal,
    Regex,
}

impl RuleKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::MinLength => "min_length",
            Self::MaxLength => "max_length",
            Self::Integer => "integer",
            Self::Decimal => "decimal",
            Self::Regex => "regex",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "required" => Some(Self::Required),
            "min_length" => Some(Self::MinLength),
            "max_length" => Some(Self::MaxLength),
            "integer" => Some(Self::Integer),
            "decimal" => Some(Self::Decimal),
            "regex" => Some(Self::Regex),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Messages(BTreeMap<RuleKind, String>);

impl Messages {
    pub fn with(mut self, kind: RuleKind, message: impl Into<String>) -> Self {
        self.0.insert(kind, message.into());
        self
    }

    pub fn set(&mut self, kind: RuleKind, message: impl Into<String>) {
        self.0.insert(kind, message.into());
    }

    pub fn get(&self, kind: RuleKind) -> Option<&str> {
        self.0.get(&kind).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleFailure {
    pub kind: RuleKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleParseError {
    Empty,
    UnknownRule(String),
    MissingBounds(String),
    UnexpectedBounds(String),
    InvalidBound { rule: String, bound: String },
    Unterminated(String),
}

impl fmt::Display for RuleParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("empty rule descriptor"),
            Self::UnknownRule(rule) => write!(
                f,
                "unknown rule {rule:?}; expected required, length, integer, or decimal"
            ),
            Self::MissingBounds(rule) => {
                write!(f, "rule {rule:?} needs at least one bound, e.g. length[2,]")
            }
            Self::UnexpectedBounds(rule) => write!(f, "rule {rule:?} takes no bounds"),
            Self::InvalidBound { rule, bound } => {
                write!(f, "invalid bound {bound:?} in rule {rule:?}")
            }
            Self::Unterminated(rule) => write!(f, "rule {rule:?} is missing a closing `]`"),
        }
    }
}

impl std::error::Error for RuleParseError {}

impl Rule {
    /// Parses one descriptor: `required`, `length[min?,max?]`,
    /// `integer[min?,max?]` or `decimal[min?,max?]`.
    pub fn parse(descriptor: &str) -> Result<Self, RuleParseError> {
        let descriptor = descriptor.trim();
        if descriptor.is_empty() {
            return Err(RuleParseError::Empty);
        }

        let (name, bounds) = match descriptor.split_once('[') {
            Some((name, rest)) => {
                let inner = rest
                    .strip_suffix(']')
                    .ok_or_else(|| RuleParseError::Unterminated(descriptor.to_owned()))?;
                (name.trim(), Some(inner))
            }
            None => (descriptor, None),
        };

        match name {
            "required" => match bounds {
                None => Ok(Self::Required),
                Some(_) => Err(RuleParseError::UnexpectedBounds(descriptor.to_owned())),
            },
            "length" => {
                let (min, max) = match bounds {
                    Some(bounds) => parse_bounds::<usize>(descriptor, bounds)?,
                    None => (None, None),
                };
                if min.is_none() && max.is_none() {
                    return Err(RuleParseError::MissingBounds(descriptor.to_owned()));
                }
                Ok(Self::Length { min, max })
            }
            "integer" => {
                let (min, max) = match bounds {
                    Some(bounds) => parse_bounds::<i64>(descriptor, bounds)?,
                    None => (None, None),
                };
                Ok(Self::Integer { min, max })
            }
            "decimal" => {
                let (min, max) = match bounds {
                    Some(bounds) => parse_bounds::<f64>(descriptor, bounds)?,
                    None => (None, None),
                };
                Ok(Self::Decimal { min, max })
            }
            other => Err(RuleParseError::UnknownRule(other.to_owned())),
        }
    }

    // Evaluation order is fixed regardless of declaration order.
    const fn rank(&self) -> u8 {
        match self {
            Self::Required => 0,
            Self::Length { .. } => 1,
            Self::Integer { .. } => 2,
            Self::Decimal { .. } => 3,
        }
    }

    /// Checks a trimmed value. Only `required` applies to an empty value.
    pub fn check(&self, value: &str) -> Result<(), RuleKind> {
        if value.is_empty() {
            return match self {
                Self::Required => Err(RuleKind::Required),
                _ => Ok(()),
            };
        }

        match *self {
            Self::Required => Ok(()),
            Self::Length { min, max } => {
                let len = value.chars().count();
                if min.is_some_and(|min| len < min) {
                    return Err(RuleKind::MinLength);
                }
                if max.is_some_and(|max| len > max) {
                    return Err(RuleKind::MaxLength);
                }
                Ok(())
            }
            Self::Integer { min, max } => {
                let parsed = value.parse::<i64>().map_err(|_| RuleKind::Integer)?;
                if within(parsed, min, max) {
                    Ok(())
                } else {
                    Err(RuleKind::Integer)
                }
            }
            Self::Decimal { min, max } => {
                if !DECIMAL_SHAPE.is_match(value) {
                    return Err(RuleKind::Decimal);
                }
                let parsed = value.parse::<f64>().map_err(|_| RuleKind::Decimal)?;
                if within(parsed, min, max) {
                    Ok(())
                } else {
                    Err(RuleKind::Decimal)
                }
            }
        }
    }

    pub fn default_message(&self, kind: RuleKind) -> String {
        match (self, kind) {
            (Self::Length { min: Some(min), .. }, RuleKind::MinLength) => {
                format!("enter at least {min} characters")
            }
            (Self::Length { max: Some(max), .. }, RuleKind::MaxLength) => {
                format!("enter at most {max} characters")
            }
            (Self::Integer { min, max }, _) => {
                format!("enter a whole number{}", range_suffix(*min, *max))
            }
            (Self::Decimal { min, max }, _) => {
                format!("enter a number{}", range_suffix(*min, *max))
            }
            _ => default_message_for(kind).to_owned(),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn bound<T: fmt::Display>(value: Option<T>) -> String {
            value.map(|value| value.to_string()).unwrap_or_default()
        }

        match self {
            Self::Required => f.write_str("required"),
            Self::Length { min, max } => write!(f, "length[{},{}]", bound(*min), bound(*max)),
            Self::Integer { min, max } => write!(f, "integer[{},{}]", bound(*min), bound(*max)),
            Self::Decimal { min, max } => write!(f, "decimal[{},{}]", bound(*min), bound(*max)),
        }
    }
}

pub fn default_message_for(kind: RuleKind) -> &'static str {
    match kind {
        RuleKind::Required => "this field is required",
        RuleKind::MinLength => "value is too short",
        RuleKind::MaxLength => "value is too long",
        RuleKind::Integer => "enter a whole number",
        RuleKind::Decimal => "enter a number",
        RuleKind::Regex => "",
    }
}

/// Rule set of one column, kept in evaluation order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet(Vec<Rule>);

impl RuleSet {
    pub fn new(rules: impl IntoIterator<Item = Rule>) -> Self {
        let mut rules = rules.into_iter().collect::<Vec<_>>();
        rules.sort_by_key(Rule::rank);
        Self(rules)
    }

    pub fn parse<I, S>(descriptors: I) -> Result<Self, RuleParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rules = descriptors
            .into_iter()
            .map(|descriptor| Rule::parse(descriptor.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(rules))
    }

    pub fn rules(&self) -> &[Rule] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Runs the rules, then the pattern. The first failure wins.
    pub fn evaluate(
        &self,
        value: &str,
        messages: &Messages,
        pattern: Option<&Regex>,
    ) -> Result<(), RuleFailure> {
        for rule in &self.0 {
            if let Err(kind) = rule.check(value) {
                let message = messages
                    .get(kind)
                    .map_or_else(|| rule.default_message(kind), str::to_owned);
                return Err(RuleFailure { kind, message });
            }
        }

        if let Some(pattern) = pattern
            && !value.is_empty()
            && !pattern.is_match(value)
        {
            return Err(RuleFailure {
                kind: RuleKind::Regex,
                message: messages.get(RuleKind::Regex).unwrap_or_default().to_owned(),
            });
        }

        Ok(())
    }
}

fn parse_bounds<T: std::str::FromStr>(
    descriptor: &str,
    bounds: &str,
) -> Result<(Option<T>, Option<T>), RuleParseError> {
    let (min, max) = match bounds.split_once(',') {
        Some((min, max)) => (min, max),
        None => (bounds, ""),
    };
    Ok((
        parse_bound(descriptor, min)?,
        parse_bound(descriptor, max)?,
    ))
}

fn parse_bound<T: std::str::FromStr>(
    descriptor: &str,
    raw: &str,
) -> Result<Option<T>, RuleParseError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<T>()
        .map(Some)
        .map_err(|_| RuleParseError::InvalidBound {
            rule: descriptor.to_owned(),
            bound: raw.to_owned(),
        })
}

fn within<T: PartialOrd>(value: T, min: Option<T>, max: Option<T>) -> bool {
    min.is_none_or(|min| value >= min) && max.is_none_or(|max| value <= max)
}

fn range_suffix<T: fmt::Display>(min: Option<T>, max: Option<T>) -> String {
    match (min, max) {
        (Some(min), Some(max)) => format!(" between {min} and {max}"),
        (Some(min), None) => format!(" of at least {min}"),
        (None, Some(max)) => format!(" of at most {max}"),
        (None, None) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::{Messages, Rule, RuleKind, RuleParseError, RuleSet};
    use regex::Regex;

    fn name_rules() -> (RuleSet, Messages) {
        let rules = RuleSet::parse(["length[2,]", "required"]).expect("valid descriptors");
        let messages = Messages::default()
            .with(RuleKind::Required, "Required")
            .with(RuleKind::MinLength, "Too short");
        (rules, messages)
    }

    #[test]
    fn parse_accepts_the_descriptor_grammar() {
        assert_eq!(Rule::parse("required"), Ok(Rule::Required));
        assert_eq!(
            Rule::parse("length[2,10]"),
            Ok(Rule::Length {
                min: Some(2),
                max: Some(10)
            })
        );
        assert_eq!(
            Rule::parse("length[,8]"),
            Ok(Rule::Length {
                min: None,
                max: Some(8)
            })
        );
        assert_eq!(
            Rule::parse("integer"),
            Ok(Rule::Integer {
                min: None,
                max: None
            })
        );
        assert_eq!(
            Rule::parse("decimal[-1.5,]"),
            Ok(Rule::Decimal {
                min: Some(-1.5),
                max: None
            })
        );
    }

    #[test]
    fn parse_rejects_malformed_descriptors() {
        assert_eq!(Rule::parse(" "), Err(RuleParseError::Empty));
        assert!(matches!(
            Rule::parse("length"),
            Err(RuleParseError::MissingBounds(_))
        ));
        assert!(matches!(
            Rule::parse("length[,]"),
            Err(RuleParseError::MissingBounds(_))
        ));
        assert!(matches!(
            Rule::parse("integer[a,3]"),
            Err(RuleParseError::InvalidBound { .. })
        ));
        assert!(matches!(
            Rule::parse("integer[1,3"),
            Err(RuleParseError::Unterminated(_))
        ));
        assert!(matches!(
            Rule::parse("email"),
            Err(RuleParseError::UnknownRule(_))
        ));
        let message = Rule::parse("email").expect_err("unknown").to_string();
        assert!(message.contains("expected required, length, integer, or decimal"));
    }

    #[test]
    fn rule_set_runs_required_before_length() {
        let (rules, _) = name_rules();
        assert_eq!(rules.rules()[0], Rule::Required);
    }

    #[test]
    fn required_and_min_length_examples() {
        let (rules, messages) = name_rules();

        let empty = rules.evaluate("", &messages, None).expect_err("empty fails");
        assert_eq!(empty.kind, RuleKind::Required);
        assert_eq!(empty.message, "Required");

        let short = rules.evaluate("a", &messages, None).expect_err("short fails");
        assert_eq!(short.kind, RuleKind::MinLength);
        assert_eq!(short.message, "Too short");

        assert!(rules.evaluate("ab", &messages, None).is_ok());
    }

    #[test]
    fn integer_range_uses_integer_message() {
        let rules = RuleSet::parse(["integer[0,120]"]).expect("valid descriptor");
        let messages = Messages::default().with(RuleKind::Integer, "Age must be 0-120");

        let failure = rules
            .evaluate("200", &messages, None)
            .expect_err("out of range");
        assert_eq!(failure.kind, RuleKind::Integer);
        assert_eq!(failure.message, "Age must be 0-120");
        assert!(rules.evaluate("42", &messages, None).is_ok());
        assert!(rules.evaluate("4.2", &messages, None).is_err());
    }

    #[test]
    fn decimal_rejects_exponent_notation() {
        let rules = RuleSet::parse(["decimal[0,]"]).expect("valid descriptor");
        let messages = Messages::default();

        assert!(rules.evaluate("1.25", &messages, None).is_ok());
        assert!(rules.evaluate(".5", &messages, None).is_ok());
        assert!(rules.evaluate("1e3", &messages, None).is_err());
        assert!(rules.evaluate("NaN", &messages, None).is_err());
        let failure = rules
            .evaluate("-2", &messages, None)
            .expect_err("below minimum");
        assert_eq!(failure.message, "enter a number of at least 0");
    }

    #[test]
    fn optional_empty_value_skips_shape_rules() {
        let rules = RuleSet::parse(["integer[1,5]", "length[3,]"]).expect("valid descriptors");
        let pattern = Regex::new(r"^\d{5}$").expect("valid pattern");
        assert!(rules.evaluate("", &Messages::default(), Some(&pattern)).is_ok());
    }

    #[test]
    fn pattern_runs_after_rules_without_default_message() {
        let rules = RuleSet::default();
        let pattern = Regex::new(r"^[^@\s]+@[^@\s]+$").expect("valid pattern");

        let failure = rules
            .evaluate("nope", &Messages::default(), Some(&pattern))
            .expect_err("pattern mismatch");
        assert_eq!(failure.kind, RuleKind::Regex);
        assert_eq!(failure.message, "");
        assert!(
            rules
                .evaluate("a@b.example", &Messages::default(), Some(&pattern))
                .is_ok()
        );
    }

    #[test]
    fn display_round_trips_through_parse() {
        for descriptor in ["required", "length[2,]", "integer[0,120]", "decimal[,9.5]"] {
            let rule = Rule::parse(descriptor).expect("valid descriptor");
            assert_eq!(rule.to_string(), descriptor);
        }
    }
}

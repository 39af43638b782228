//! `--name value` option parsing with literal coercion.
//!
//! Options are peeled off the front of the token list until the next token is
//! not `--`-prefixed. The parser runs twice per invocation: once for client
//! options, once for the method options after `<api> <method>`.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use serde::Serialize;

use crate::error::CliError;

/// A coerced option value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OptionValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

/// Parsed options keyed by underscored name. Later occurrences overwrite.
pub type Options = BTreeMap<String, OptionValue>;

impl OptionValue {
    /// Coerce a raw token: integer, then float, then boolean, then a quoted
    /// string (unquoted), else the token unchanged.
    pub fn parse(raw: &str) -> Self {
        if let Ok(int) = raw.parse::<i64>() {
            return Self::Int(int);
        }
        if is_integer(raw) {
            // Out of i64 range; keep every digit.
            return Self::Str(raw.to_owned());
        }
        if looks_numeric(raw) {
            if let Ok(float) = raw.parse::<f64>() {
                if float.is_finite() {
                    return Self::Float(float);
                }
            }
        }
        match raw {
            "True" | "true" => return Self::Bool(true),
            "False" | "false" => return Self::Bool(false),
            _ => {}
        }
        Self::Str(unquote(raw).unwrap_or(raw).to_owned())
    }
}

impl fmt::Display for OptionValue {
    /// Form-field rendering; booleans use the server's `True` / `False`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::Str(v) => f.write_str(v),
        }
    }
}

/// Digits, a decimal point, an exponent and signs only; `inf` and `nan`
/// stay strings.
fn looks_numeric(raw: &str) -> bool {
    raw.bytes().any(|b| b.is_ascii_digit())
        && raw
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'))
}

fn is_integer(raw: &str) -> bool {
    let digits = raw.strip_prefix(['+', '-']).unwrap_or(raw);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn unquote(raw: &str) -> Option<&str> {
    let quote = raw.chars().next().filter(|c| matches!(c, '"' | '\''))?;
    raw.strip_prefix(quote)?.strip_suffix(quote)
}

/// `--foo-bar` and `foo-bar` both become `foo_bar`.
pub fn option_name(raw: &str) -> String {
    raw.trim_start_matches('-').replace('-', "_")
}

fn is_option(token: &str) -> bool {
    token.starts_with("--")
}

/// Consume leading options from `tokens`.
///
/// `--name=value` splits on the first `=`; otherwise the next token is the
/// value, whatever it looks like. A bare `--` ends the options and is
/// consumed.
pub fn parse(tokens: &mut VecDeque<String>) -> Result<Options, CliError> {
    let mut options = Options::new();
    while let Some(token) = tokens.front() {
        if !is_option(token) {
            break;
        }
        let Some(token) = tokens.pop_front() else {
            break;
        };
        if token == "--" {
            break;
        }
        let (name, value) = match token.split_once('=') {
            Some((name, value)) => (name.to_owned(), value.to_owned()),
            None => {
                let value = tokens
                    .pop_front()
                    .ok_or_else(|| CliError::MissingValue { option: token.clone() })?;
                (token, value)
            }
        };
        options.insert(option_name(&name), OptionValue::parse(&value));
    }
    Ok(options)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn tokens(items: &[&str]) -> VecDeque<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn integers_coerce_and_mixed_tokens_stay_strings() {
        assert_eq!(OptionValue::parse("123"), OptionValue::Int(123));
        assert_eq!(OptionValue::parse("-7"), OptionValue::Int(-7));
        assert_eq!(OptionValue::parse("123abc"), OptionValue::Str("123abc".into()));
        assert_eq!(OptionValue::parse("foo"), OptionValue::Str("foo".into()));
    }

    #[test]
    fn integers_beyond_i64_keep_their_digits() {
        let value = OptionValue::parse("12345678901234567890123");
        assert_eq!(value, OptionValue::Str("12345678901234567890123".into()));
        assert_eq!(value.to_string(), "12345678901234567890123");
        assert_eq!(
            OptionValue::parse("-99999999999999999999"),
            OptionValue::Str("-99999999999999999999".into())
        );
        assert_eq!(OptionValue::parse("1.5e30"), OptionValue::Float(1.5e30));
    }

    #[test]
    fn floats_booleans_and_quotes() {
        assert_eq!(OptionValue::parse("2.5"), OptionValue::Float(2.5));
        assert_eq!(OptionValue::parse("1e3"), OptionValue::Float(1000.0));
        assert_eq!(OptionValue::parse("inf"), OptionValue::Str("inf".into()));
        assert_eq!(OptionValue::parse("1e999"), OptionValue::Str("1e999".into()));
        assert_eq!(OptionValue::parse("True"), OptionValue::Bool(true));
        assert_eq!(OptionValue::parse("false"), OptionValue::Bool(false));
        assert_eq!(OptionValue::parse("'123'"), OptionValue::Str("123".into()));
        assert_eq!(OptionValue::parse("\"a b\""), OptionValue::Str("a b".into()));
        assert_eq!(OptionValue::parse("'mismatched\""), OptionValue::Str("'mismatched\"".into()));
        assert_eq!(OptionValue::parse("'"), OptionValue::Str("'".into()));
    }

    #[test]
    fn names_are_underscored() {
        assert_eq!(option_name("--foo"), "foo");
        assert_eq!(option_name("--foo-bar"), "foo_bar");
    }

    #[test]
    fn parsing_stops_at_the_first_positional() {
        let mut args = tokens(&["--a=1", "--b", "2", "pos"]);
        let options = parse(&mut args).unwrap();
        assert_eq!(
            options,
            Options::from([
                ("a".to_owned(), OptionValue::Int(1)),
                ("b".to_owned(), OptionValue::Int(2)),
            ])
        );
        assert_eq!(args, tokens(&["pos"]));
    }

    #[test]
    fn equals_splits_once() {
        let mut args = tokens(&["--query=a=b", "--api-token=x"]);
        let options = parse(&mut args).unwrap();
        assert_eq!(options["query"], OptionValue::Str("a=b".into()));
        assert_eq!(options["api_token"], OptionValue::Str("x".into()));
        assert!(args.is_empty());
    }

    #[test]
    fn later_occurrences_overwrite() {
        let mut args = tokens(&["--owner", "a", "--owner", "b"]);
        assert_eq!(parse(&mut args).unwrap()["owner"], OptionValue::Str("b".into()));
    }

    #[test]
    fn missing_value_names_the_option() {
        let mut args = tokens(&["--owner"]);
        let err = parse(&mut args).unwrap_err();
        assert_eq!(err.to_string(), "missing value for argument --owner");
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn leading_positional_yields_nothing() {
        let mut args = tokens(&["forms", "--owner", "bob"]);
        assert!(parse(&mut args).unwrap().is_empty());
        assert_eq!(args.len(), 3);
    }

    #[test]
    fn double_dash_ends_options() {
        let mut args = tokens(&["--a", "1", "--", "--b", "2"]);
        let options = parse(&mut args).unwrap();
        assert_eq!(options.len(), 1);
        assert_eq!(args, tokens(&["--b", "2"]));
    }

    #[test]
    fn values_serialize_untagged() {
        let options = Options::from([
            ("pk".to_owned(), OptionValue::Int(1)),
            ("public".to_owned(), OptionValue::Bool(true)),
            ("owner".to_owned(), OptionValue::Str("bob".into())),
        ]);
        assert_eq!(
            serde_json::to_value(&options).unwrap(),
            serde_json::json!({"pk": 1, "public": true, "owner": "bob"})
        );
    }

    #[test]
    fn display_uses_form_booleans() {
        assert_eq!(OptionValue::Bool(false).to_string(), "False");
        assert_eq!(OptionValue::Int(3).to_string(), "3");
    }
}

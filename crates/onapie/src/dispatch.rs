//! Selector resolution against the command registry.
//!
//! The same routine resolves the API name and then the method name; only the
//! error reported for a missing or unknown selector differs per stage.

use std::collections::VecDeque;

use crate::error::CliError;

/// Anything addressable by name on the command line.
pub trait Named {
    fn name(&self) -> &'static str;
}

/// Which selector is being resolved.
#[derive(Debug, Clone, Copy)]
pub enum Stage<'a> {
    Api,
    Method { api: &'a str },
}

impl Stage<'_> {
    fn missing(self, available: String) -> CliError {
        match self {
            Self::Api => CliError::MissingApi { available },
            Self::Method { api } => CliError::MissingMethod {
                api: api.to_owned(),
                available,
            },
        }
    }

    fn unknown(self, name: String, available: String) -> CliError {
        match self {
            Self::Api => CliError::UnknownApi { name, available },
            Self::Method { api } => CliError::UnknownMethod {
                api: api.to_owned(),
                name,
                available,
            },
        }
    }
}

/// Pop the next token and look it up by exact, case-sensitive name.
pub fn resolve<'e, E: Named>(
    entries: &'e [E],
    tokens: &mut VecDeque<String>,
    stage: Stage<'_>,
) -> Result<&'e E, CliError> {
    let Some(selector) = tokens.pop_front() else {
        return Err(stage.missing(available(entries)));
    };
    entries
        .iter()
        .find(|entry| entry.name() == selector)
        .ok_or_else(|| stage.unknown(selector, available(entries)))
}

/// Every registered name, sorted, joined naturally.
pub fn available<E: Named>(entries: &[E]) -> String {
    let mut names: Vec<&str> = entries.iter().map(Named::name).collect();
    names.sort_unstable();
    names.dedup();
    join(&names, "and")
}

/// `a`, `a and b`, `a, b and c`.
pub fn join<S: AsRef<str>>(items: &[S], separator: &str) -> String {
    match items {
        [] => String::new(),
        [only] => only.as_ref().to_owned(),
        [init @ .., last] => {
            let head: Vec<&str> = init.iter().map(AsRef::as_ref).collect();
            format!("{} {separator} {}", head.join(", "), last.as_ref())
        }
    }
}

//! Method invocation.
//!
//! Parses the method options, drops those the operation does not declare
//! (unless it takes extra fields), runs the handler and maps its failure to a
//! CLI error.

use std::collections::VecDeque;

use tracing::{debug, warn};

use onapie_api::Client;

use crate::commands::{InvokeError, Operation};
use crate::dispatch::join;
use crate::error::CliError;
use crate::options::{self, Options};
use crate::output::Output;

/// Remove every option not in `params`; returns the removed names, sorted.
pub fn drop_surplus(options: &mut Options, params: &[&str]) -> Vec<String> {
    let surplus: Vec<String> = options
        .keys()
        .filter(|name| !params.contains(&name.as_str()))
        .cloned()
        .collect();
    for name in &surplus {
        options.remove(name);
    }
    surplus
}

/// Parse method options from `tokens` and invoke `operation`.
pub fn execute(
    client: &Client,
    operation: &Operation,
    tokens: &mut VecDeque<String>,
) -> Result<Output, CliError> {
    let mut provided = options::parse(tokens)?;
    if !tokens.is_empty() {
        let leftover: Vec<String> = tokens.drain(..).collect();
        warn!("ignoring positional argument(s): {}", join(&leftover, "and"));
    }
    if !operation.variadic {
        let ignored = drop_surplus(&mut provided, operation.params);
        if !ignored.is_empty() {
            warn!("ignoring extra argument(s): {}", join(&ignored, "and"));
        }
    }

    debug!(operation = operation.name, options = ?provided.keys().collect::<Vec<_>>(), "invoking");
    (operation.handler)(client, &provided).map_err(|err| match err {
        InvokeError::BadArguments(message) => {
            let mut valid = operation.params.to_vec();
            valid.sort_unstable();
            CliError::BadArguments {
                message,
                valid: join(&valid, "or"),
            }
        }
        InvokeError::Api(err) => CliError::api_call(err),
    })
}

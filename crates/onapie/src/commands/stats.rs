//! `stats` operations.

use serde::Deserialize;

use onapie_api::Client;

use crate::commands::util::{decode, opt_text, text};
use crate::commands::{InvokeError, Operation};
use crate::options::Options;
use crate::output::Output;

pub const OPERATIONS: &[Operation] = &[Operation {
    name: "get",
    params: &["pk", "method"],
    variadic: false,
    handler: get,
}];

#[derive(Deserialize)]
struct GetArgs {
    #[serde(deserialize_with = "text")]
    pk: String,
    /// mean, median, mode, range, ...
    #[serde(default, deserialize_with = "opt_text")]
    method: Option<String>,
}

fn get(client: &Client, options: &Options) -> Result<Output, InvokeError> {
    let args: GetArgs = decode(options)?;
    Ok(Output::Json(
        client.stats().get(&args.pk, args.method.as_deref())?,
    ))
}

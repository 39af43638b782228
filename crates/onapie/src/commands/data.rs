//! `data` operations.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use onapie_api::{Client, DataQuery};

use crate::commands::util::{comma_list, decode, extras, opt_text, text};
use crate::commands::{InvokeError, Operation};
use crate::options::Options;
use crate::output::Output;

const GET_PARAMS: &[&str] = &["pk", "dataid", "tags"];

pub const OPERATIONS: &[Operation] = &[
    Operation {
        name: "list_endpoints",
        params: &["owner"],
        variadic: false,
        handler: list_endpoints,
    },
    Operation {
        name: "get",
        params: GET_PARAMS,
        variadic: true,
        handler: get,
    },
    Operation {
        name: "delete",
        params: &["pk"],
        variadic: false,
        handler: delete,
    },
    Operation {
        name: "delete_tag",
        params: &["pk", "dataid", "tag"],
        variadic: false,
        handler: delete_tag,
    },
    Operation {
        name: "get_enketo_editlink",
        params: &["pk", "dataid"],
        variadic: false,
        handler: get_enketo_editlink,
    },
];

#[derive(Deserialize)]
struct OwnerArgs {
    #[serde(default, deserialize_with = "opt_text")]
    owner: Option<String>,
}

#[derive(Deserialize)]
struct PkArgs {
    #[serde(deserialize_with = "text")]
    pk: String,
}

#[derive(Deserialize)]
struct GetArgs {
    #[serde(deserialize_with = "text")]
    pk: String,
    #[serde(default, deserialize_with = "opt_text")]
    dataid: Option<String>,
    #[serde(default, deserialize_with = "comma_list")]
    tags: Vec<String>,
}

#[derive(Deserialize)]
struct RecordArgs {
    #[serde(deserialize_with = "text")]
    pk: String,
    #[serde(deserialize_with = "text")]
    dataid: String,
}

#[derive(Deserialize)]
struct DeleteTagArgs {
    #[serde(deserialize_with = "text")]
    pk: String,
    #[serde(deserialize_with = "text")]
    dataid: String,
    #[serde(deserialize_with = "text")]
    tag: String,
}

fn list_endpoints(client: &Client, options: &Options) -> Result<Output, InvokeError> {
    let args: OwnerArgs = decode(options)?;
    Ok(Output::Json(client.data().list_endpoints(args.owner.as_deref())?))
}

/// Undeclared options become `?query=` field filters.
fn get(client: &Client, options: &Options) -> Result<Output, InvokeError> {
    let args: GetArgs = decode(options)?;
    let query: BTreeMap<String, Value> = extras(options, GET_PARAMS)
        .into_iter()
        .map(|(name, value)| {
            serde_json::to_value(value)
                .map(|value| (name.to_owned(), value))
                .map_err(|e| InvokeError::BadArguments(e.to_string()))
        })
        .collect::<Result<_, _>>()?;
    let selection = DataQuery {
        dataid: args.dataid,
        tags: args.tags,
        query,
    };
    Ok(Output::Json(client.data().get(&args.pk, &selection)?))
}

fn delete(client: &Client, options: &Options) -> Result<Output, InvokeError> {
    let args: PkArgs = decode(options)?;
    client.data().delete(&args.pk)?;
    Ok(Output::Empty)
}

fn delete_tag(client: &Client, options: &Options) -> Result<Output, InvokeError> {
    let args: DeleteTagArgs = decode(options)?;
    Ok(Output::Json(
        client.data().delete_tag(&args.pk, &args.dataid, &args.tag)?,
    ))
}

fn get_enketo_editlink(client: &Client, options: &Options) -> Result<Output, InvokeError> {
    let args: RecordArgs = decode(options)?;
    Ok(Output::Json(
        client.data().get_enketo_editlink(&args.pk, &args.dataid)?,
    ))
}

//! `forms` operations.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use onapie_api::{Client, FormDocument, FormSource, FormUpdate, Representation};

use crate::commands::util::{comma_list, decode, extras, flag, opt_text, text};
use crate::commands::{InvokeError, Operation};
use crate::options::Options;
use crate::output::Output;

pub const OPERATIONS: &[Operation] = &[
    Operation {
        name: "create",
        params: &["xls_path", "xls_url", "owner"],
        variadic: false,
        handler: create,
    },
    Operation {
        name: "list",
        params: &["owner"],
        variadic: false,
        handler: list,
    },
    Operation {
        name: "get",
        params: &["pk", "representation", "tags"],
        variadic: false,
        handler: get,
    },
    Operation {
        name: "update",
        params: &["pk", "uuid", "description", "owner", "public", "public_data"],
        variadic: false,
        handler: update,
    },
    Operation {
        name: "patch",
        params: &["pk"],
        variadic: true,
        handler: patch,
    },
    Operation {
        name: "delete",
        params: &["pk"],
        variadic: false,
        handler: delete,
    },
    Operation {
        name: "get_tags",
        params: &["pk"],
        variadic: false,
        handler: get_tags,
    },
    Operation {
        name: "set_tag",
        params: &["pk", "tags"],
        variadic: false,
        handler: set_tag,
    },
    Operation {
        name: "remove_tag",
        params: &["pk", "tag"],
        variadic: false,
        handler: remove_tag,
    },
    Operation {
        name: "get_webformlink",
        params: &["pk"],
        variadic: false,
        handler: get_webformlink,
    },
    Operation {
        name: "get_formdata",
        params: &["pk", "export_format"],
        variadic: false,
        handler: get_formdata,
    },
    Operation {
        name: "share",
        params: &["pk", "username", "role"],
        variadic: false,
        handler: share,
    },
    Operation {
        name: "clone_to_user",
        params: &["pk", "username"],
        variadic: false,
        handler: clone_to_user,
    },
];

// ── Argument structs ─────────────────────────────────────────────────

#[derive(Deserialize)]
struct PkArgs {
    #[serde(deserialize_with = "text")]
    pk: String,
}

#[derive(Deserialize)]
struct OwnerArgs {
    #[serde(default, deserialize_with = "opt_text")]
    owner: Option<String>,
}

#[derive(Deserialize)]
struct CreateArgs {
    #[serde(default, deserialize_with = "opt_text")]
    xls_path: Option<String>,
    #[serde(default, deserialize_with = "opt_text")]
    xls_url: Option<String>,
    #[serde(default, deserialize_with = "opt_text")]
    owner: Option<String>,
}

#[derive(Deserialize)]
struct GetArgs {
    #[serde(deserialize_with = "text")]
    pk: String,
    #[serde(default, deserialize_with = "opt_text")]
    representation: Option<String>,
    #[serde(default, deserialize_with = "comma_list")]
    tags: Vec<String>,
}

#[derive(Deserialize)]
struct UpdateArgs {
    #[serde(deserialize_with = "text")]
    pk: String,
    #[serde(deserialize_with = "text")]
    uuid: String,
    #[serde(deserialize_with = "text")]
    description: String,
    #[serde(deserialize_with = "text")]
    owner: String,
    #[serde(deserialize_with = "flag")]
    public: bool,
    #[serde(deserialize_with = "flag")]
    public_data: bool,
}

#[derive(Deserialize)]
struct SetTagArgs {
    #[serde(deserialize_with = "text")]
    pk: String,
    #[serde(deserialize_with = "comma_list")]
    tags: Vec<String>,
}

#[derive(Deserialize)]
struct RemoveTagArgs {
    #[serde(deserialize_with = "text")]
    pk: String,
    #[serde(deserialize_with = "text")]
    tag: String,
}

#[derive(Deserialize)]
struct FormDataArgs {
    #[serde(deserialize_with = "text")]
    pk: String,
    #[serde(deserialize_with = "text")]
    export_format: String,
}

#[derive(Deserialize)]
struct ShareArgs {
    #[serde(deserialize_with = "text")]
    pk: String,
    #[serde(deserialize_with = "text")]
    username: String,
    #[serde(default, deserialize_with = "opt_text")]
    role: Option<String>,
}

#[derive(Deserialize)]
struct CloneArgs {
    #[serde(deserialize_with = "text")]
    pk: String,
    #[serde(deserialize_with = "text")]
    username: String,
}

// ── Handlers ─────────────────────────────────────────────────────────

fn create(client: &Client, options: &Options) -> Result<Output, InvokeError> {
    let args: CreateArgs = decode(options)?;
    let xls_path = args.xls_path.map(PathBuf::from);
    let source = FormSource::from_options(xls_path.as_deref(), args.xls_url.as_deref())?;
    Ok(Output::Json(client.forms().create(source, args.owner.as_deref())?))
}

fn list(client: &Client, options: &Options) -> Result<Output, InvokeError> {
    let args: OwnerArgs = decode(options)?;
    Ok(Output::Json(client.forms().list(args.owner.as_deref())?))
}

fn get(client: &Client, options: &Options) -> Result<Output, InvokeError> {
    let args: GetArgs = decode(options)?;
    let representation = args
        .representation
        .as_deref()
        .map(Representation::parse)
        .transpose()?;
    match client.forms().get(&args.pk, representation, &args.tags)? {
        FormDocument::Json(value) => Ok(Output::Json(value)),
        FormDocument::Raw { body, .. } => Ok(Output::Bytes(body)),
    }
}

fn update(client: &Client, options: &Options) -> Result<Output, InvokeError> {
    let args: UpdateArgs = decode(options)?;
    let update = FormUpdate {
        uuid: args.uuid,
        description: args.description,
        owner: args.owner,
        public: args.public,
        public_data: args.public_data,
    };
    Ok(Output::Json(client.forms().update(&args.pk, &update)?))
}

/// Every option other than `pk` is a field to update.
fn patch(client: &Client, options: &Options) -> Result<Output, InvokeError> {
    let args: PkArgs = decode(options)?;
    let fields: BTreeMap<String, String> = extras(options, &["pk"])
        .into_iter()
        .map(|(name, value)| (name.to_owned(), value.to_string()))
        .collect();
    Ok(Output::Json(client.forms().patch(&args.pk, &fields)?))
}

fn delete(client: &Client, options: &Options) -> Result<Output, InvokeError> {
    let args: PkArgs = decode(options)?;
    client.forms().delete(&args.pk)?;
    Ok(Output::Empty)
}

fn get_tags(client: &Client, options: &Options) -> Result<Output, InvokeError> {
    let args: PkArgs = decode(options)?;
    Ok(Output::Json(client.forms().get_tags(&args.pk)?))
}

fn set_tag(client: &Client, options: &Options) -> Result<Output, InvokeError> {
    let args: SetTagArgs = decode(options)?;
    Ok(Output::Json(client.forms().set_tag(&args.pk, &args.tags)?))
}

fn remove_tag(client: &Client, options: &Options) -> Result<Output, InvokeError> {
    let args: RemoveTagArgs = decode(options)?;
    Ok(Output::Json(client.forms().remove_tag(&args.pk, &args.tag)?))
}

fn get_webformlink(client: &Client, options: &Options) -> Result<Output, InvokeError> {
    let args: PkArgs = decode(options)?;
    Ok(Output::Json(client.forms().get_webformlink(&args.pk)?))
}

fn get_formdata(client: &Client, options: &Options) -> Result<Output, InvokeError> {
    let args: FormDataArgs = decode(options)?;
    Ok(Output::Bytes(
        client.forms().get_formdata(&args.pk, &args.export_format)?,
    ))
}

fn share(client: &Client, options: &Options) -> Result<Output, InvokeError> {
    let args: ShareArgs = decode(options)?;
    client
        .forms()
        .share(&args.pk, &args.username, args.role.as_deref())?;
    Ok(Output::Empty)
}

fn clone_to_user(client: &Client, options: &Options) -> Result<Output, InvokeError> {
    let args: CloneArgs = decode(options)?;
    Ok(Output::Json(
        client.forms().clone_to_user(&args.pk, &args.username)?,
    ))
}

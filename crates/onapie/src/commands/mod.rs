//! The command registry: every API and operation the CLI can invoke.
//!
//! Each API is a static table of operations. An operation declares the
//! option names it accepts, whether it takes arbitrary extra fields, and a
//! handler that decodes the filtered options and calls the client.

pub mod data;
pub mod forms;
pub mod stats;
pub mod util;

use onapie_api::Client;

use crate::dispatch::{Named, available};
use crate::options::Options;
use crate::output::Output;

/// Why a handler could not complete.
#[derive(Debug)]
pub enum InvokeError {
    /// The options do not fit the operation's parameters.
    BadArguments(String),
    /// The client call failed.
    Api(onapie_api::Error),
}

impl From<onapie_api::Error> for InvokeError {
    fn from(err: onapie_api::Error) -> Self {
        Self::Api(err)
    }
}

pub type Handler = fn(&Client, &Options) -> Result<Output, InvokeError>;

/// One invocable method.
#[derive(Debug)]
pub struct Operation {
    pub name: &'static str,
    /// Accepted option names.
    pub params: &'static [&'static str],
    /// Keep undeclared options as extra named fields instead of dropping them.
    pub variadic: bool,
    pub handler: Handler,
}

/// One API and its methods.
#[derive(Debug)]
pub struct Api {
    pub name: &'static str,
    pub operations: &'static [Operation],
}

impl Named for Operation {
    fn name(&self) -> &'static str {
        self.name
    }
}

impl Named for Api {
    fn name(&self) -> &'static str {
        self.name
    }
}

pub static APIS: &[Api] = &[
    Api {
        name: "forms",
        operations: forms::OPERATIONS,
    },
    Api {
        name: "data",
        operations: data::OPERATIONS,
    },
    Api {
        name: "stats",
        operations: stats::OPERATIONS,
    },
];

/// Registry listing for `--help`.
pub fn listing() -> String {
    let mut apis: Vec<&Api> = APIS.iter().collect();
    apis.sort_by_key(|api| api.name);
    let width = apis.iter().map(|api| api.name.len()).max().unwrap_or(0);
    let lines: Vec<String> = apis
        .iter()
        .map(|api| {
            format!(
                "  {:width$}  {}",
                api.name,
                available(api.operations),
                width = width
            )
        })
        .collect();
    format!("APIs and their methods:\n{}", lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use onapie_api::ResourceKind;

    use super::*;

    #[test]
    fn every_resource_kind_has_an_api() {
        let names: BTreeSet<&str> = APIS.iter().map(|api| api.name).collect();
        for kind in [ResourceKind::Forms, ResourceKind::Data, ResourceKind::Stats] {
            assert!(names.contains(kind.to_string().as_str()), "{kind} missing");
        }
    }

    #[test]
    fn operation_names_are_unique_per_api() {
        for api in APIS {
            let names: BTreeSet<&str> = api.operations.iter().map(|op| op.name).collect();
            assert_eq!(names.len(), api.operations.len(), "{}", api.name);
        }
    }

    #[test]
    fn listing_names_every_api_and_method() {
        let text = listing();
        assert!(text.contains("forms"));
        assert!(text.contains("clone_to_user"));
        assert!(text.contains("get_enketo_editlink"));
    }
}

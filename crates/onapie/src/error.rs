//! CLI error types with miette diagnostics.
//!
//! Every failure the binary can report, each mapped to a fixed exit code.

use miette::Diagnostic;
use thiserror::Error;

use onapie_config::ConfigError;

/// Process exit codes.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const MISSING_VALUE: i32 = 1;
    pub const API_MISSING: i32 = 2;
    pub const API_UNKNOWN: i32 = 3;
    pub const METHOD_MISSING: i32 = 4;
    pub const METHOD_UNKNOWN: i32 = 5;
    pub const BAD_ARGUMENTS: i32 = 6;
    pub const API_ERROR: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Command line ─────────────────────────────────────────────────

    #[error("missing value for argument {option}")]
    #[diagnostic(code(onapie::missing_value), help("Pass it as {option} <value> or {option}=<value>"))]
    MissingValue { option: String },

    #[error("must specify an api to call on the client")]
    #[diagnostic(code(onapie::api_missing), help("available are {available}"))]
    MissingApi { available: String },

    #[error("api {name} does not exist on the client")]
    #[diagnostic(code(onapie::api_unknown), help("available are {available}"))]
    UnknownApi { name: String, available: String },

    #[error("must specify a method to call on the {api} api")]
    #[diagnostic(code(onapie::method_missing), help("available are {available}"))]
    MissingMethod { api: String, available: String },

    #[error("method {name} does not exist on the {api} api")]
    #[diagnostic(code(onapie::method_unknown), help("available are {available}"))]
    UnknownMethod {
        api: String,
        name: String,
        available: String,
    },

    #[error("{message}")]
    #[diagnostic(code(onapie::bad_arguments), help("valid argument(s) are {valid}"))]
    BadArguments { message: String, valid: String },

    // ── API ──────────────────────────────────────────────────────────

    #[error("{error}")]
    #[diagnostic(code(onapie::api_error))]
    ApiCall {
        error: onapie_api::Error,
        #[help]
        detail: Option<String>,
    },

    #[error("could not create the Ona client")]
    #[diagnostic(code(onapie::client))]
    Client {
        #[source]
        source: onapie_api::Error,
        #[help]
        detail: Option<String>,
    },

    // ── Configuration ────────────────────────────────────────────────

    #[error(transparent)]
    #[diagnostic(
        code(onapie::config),
        help("Check ~/.onapierc, ONAPIE_* environment variables and client options")
    )]
    Config(#[from] ConfigError),

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    #[diagnostic(code(onapie::io))]
    Io(#[from] std::io::Error),

    #[error("could not render the result: {message}")]
    #[diagnostic(code(onapie::render))]
    Render { message: String },
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::MissingValue { .. } => exit_code::MISSING_VALUE,
            Self::MissingApi { .. } => exit_code::API_MISSING,
            Self::UnknownApi { .. } => exit_code::API_UNKNOWN,
            Self::MissingMethod { .. } => exit_code::METHOD_MISSING,
            Self::UnknownMethod { .. } => exit_code::METHOD_UNKNOWN,
            Self::BadArguments { .. } => exit_code::BAD_ARGUMENTS,
            Self::ApiCall { .. } => exit_code::API_ERROR,
            Self::Client { .. } | Self::Config(_) | Self::Io(_) | Self::Render { .. } => {
                exit_code::GENERAL
            }
        }
    }

    pub fn api_call(error: onapie_api::Error) -> Self {
        let detail = response_detail(&error);
        Self::ApiCall { error, detail }
    }

    pub fn client(source: onapie_api::Error) -> Self {
        let detail = response_detail(&source).or_else(|| match &source {
            onapie_api::Error::Transport(_) => {
                Some("Check api_addr and that the server is reachable".into())
            }
            onapie_api::Error::Authentication { .. } => {
                Some("Check the username and password, or supply token_key".into())
            }
            _ => None,
        });
        Self::Client { source, detail }
    }
}

/// The body of an error response, when it has one.
fn response_detail(err: &onapie_api::Error) -> Option<String> {
    let text = err.response()?.text();
    let text = text.trim();
    (!text.is_empty()).then(|| format!("server said: {text}"))
}

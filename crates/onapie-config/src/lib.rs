//! Layered settings for the onapie CLI.
//!
//! Defaults, then the JSON file at `~/.onapierc`, then `ONAPIE_*`
//! environment variables, then client options given on the command line.
//! The result converts into `onapie_api::ClientConfig`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::BaseDirs;
use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized},
    value::Dict,
};
use secrecy::SecretString;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;
use tracing::{debug, warn};

use onapie_api::client::{DEFAULT_API_ADDR, DEFAULT_API_ENTRYPOINT, DEFAULT_AUTH_PATH};
use onapie_api::transport::default_user_agent;
use onapie_api::{ClientConfig, Credentials, TlsMode, TransportConfig};

pub const CONFIG_FILE_NAME: &str = ".onapierc";
pub const ENV_PREFIX: &str = "ONAPIE_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Settings ────────────────────────────────────────────────────────

/// How results are written to stdout.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Json,
    JsonCompact,
    Yaml,
    Plain,
}

/// Every recognised client option.
pub const KEYS: &[&str] = &[
    "api_addr",
    "token_key",
    "api_token",
    "username",
    "password",
    "api_entrypoint",
    "auth_path",
    "fetch_catalog",
    "timeout",
    "read_timeout",
    "ssl_verify",
    "ca_cert",
    "max_retries",
    "user_agent",
    "output",
];

/// Merged client settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub api_addr: String,

    /// Pre-issued API token (`api_token` is accepted too).
    #[serde(
        alias = "api_token",
        deserialize_with = "opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub token_key: Option<String>,

    #[serde(deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    pub api_entrypoint: String,
    pub auth_path: String,
    pub fetch_catalog: bool,

    /// Connect timeout in seconds.
    pub timeout: f64,

    /// Read timeout in seconds.
    pub read_timeout: f64,

    pub ssl_verify: bool,

    /// Extra CA certificate (PEM) to trust.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    pub max_retries: u32,
    #[serde(deserialize_with = "text")]
    pub user_agent: String,
    pub output: OutputFormat,
}

/// Credentials and names made only of digits arrive as numbers from the
/// command line and the environment; take any scalar as its text.
fn text<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    match serde_json::Value::deserialize(de)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Bool(true) => Ok("True".into()),
        serde_json::Value::Bool(false) => Ok("False".into()),
        other => Err(D::Error::custom(format!("expected a single value, got {other}"))),
    }
}

fn opt_text<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
    text(de).map(Some)
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_addr: DEFAULT_API_ADDR.into(),
            token_key: None,
            username: None,
            password: None,
            api_entrypoint: DEFAULT_API_ENTRYPOINT.into(),
            auth_path: DEFAULT_AUTH_PATH.into(),
            fetch_catalog: true,
            timeout: 20.0,
            read_timeout: 20.0,
            ssl_verify: true,
            ca_cert: None,
            max_retries: 5,
            user_agent: default_user_agent(),
            output: OutputFormat::Json,
        }
    }
}

impl Settings {
    /// Translate into the library's client configuration.
    ///
    /// A token wins over username/password. A username without a password
    /// (or the reverse) falls back to anonymous access.
    pub fn client_config(&self) -> Result<ClientConfig, ConfigError> {
        let credentials = match (&self.token_key, &self.username, &self.password) {
            (Some(token), _, _) => Credentials::Token(SecretString::from(token.clone())),
            (None, Some(username), Some(password)) => Credentials::Basic {
                username: username.clone(),
                password: SecretString::from(password.clone()),
            },
            (None, Some(_), None) | (None, None, Some(_)) => {
                warn!("username and password must be given together, continuing anonymously");
                Credentials::Anonymous
            }
            (None, None, None) => Credentials::Anonymous,
        };

        let tls = if !self.ssl_verify {
            TlsMode::DangerAcceptInvalid
        } else if let Some(ca) = &self.ca_cert {
            TlsMode::CustomCa(ca.clone())
        } else {
            TlsMode::System
        };

        Ok(ClientConfig {
            api_addr: self.api_addr.clone(),
            credentials,
            api_entrypoint: self.api_entrypoint.clone(),
            auth_path: self.auth_path.clone(),
            fetch_catalog: self.fetch_catalog,
            transport: TransportConfig {
                tls,
                timeout: seconds("timeout", self.timeout)?,
                read_timeout: seconds("read_timeout", self.read_timeout)?,
                max_retries: self.max_retries,
                user_agent: self.user_agent.clone(),
            },
        })
    }
}

fn seconds(field: &str, value: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(value).map_err(|_| ConfigError::Validation {
        field: field.into(),
        reason: format!("{value} is not a non-negative number of seconds"),
    })
}

// ── Config file path ────────────────────────────────────────────────

/// `~/.onapierc`.
pub fn config_path() -> PathBuf {
    BaseDirs::new().map_or_else(
        || PathBuf::from(CONFIG_FILE_NAME),
        |dirs| dirs.home_dir().join(CONFIG_FILE_NAME),
    )
}

// ── Loading ─────────────────────────────────────────────────────────

/// Load settings from `path` (or `~/.onapierc`), the environment, and the
/// given client-option overrides.
pub fn load<T: Serialize>(path: Option<&Path>, overrides: &T) -> Result<Settings, ConfigError> {
    let path = path.map_or_else(config_path, Path::to_path_buf);
    load_from(&path, ENV_PREFIX, overrides)
}

fn load_from<T: Serialize>(
    path: &Path,
    env_prefix: &str,
    overrides: &T,
) -> Result<Settings, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(Settings::default()));
    if readable_json(path) {
        figment = figment.merge(Json::file(path));
    }
    let settings: Settings = figment
        .merge(Env::prefixed(env_prefix).ignore(&["config"]))
        .merge(Serialized::globals(overrides))
        .extract()?;
    debug!(api_addr = %settings.api_addr, "settings loaded");
    Ok(settings)
}

/// A missing file counts as empty; a file that is not a JSON object is
/// skipped with a warning.
fn readable_json(path: &Path) -> bool {
    if !path.is_file() {
        debug!(path = %path.display(), "no configuration file");
        return false;
    }
    match Figment::from(Json::file(path)).extract::<Dict>() {
        Ok(_) => true,
        Err(err) => {
            warn!("ignoring non-json configuration file at {}", path.display());
            debug!(error = %err, "configuration file rejected");
            false
        }
    }
}

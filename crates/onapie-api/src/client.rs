// Top-level Ona API client
//
// Owns the `Connection`, performs the credential-for-token exchange, and
// binds resource managers to the paths found in the API catalog.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, info};

use crate::catalog::{Catalog, ResourceKind};
use crate::connection::{BasicAuth, Connection, Extras};
use crate::data::Data;
use crate::error::Error;
use crate::forms::Forms;
use crate::stats::Stats;
use crate::transport::TransportConfig;

pub const DEFAULT_API_ADDR: &str = "https://api.ona.io";
pub const DEFAULT_API_ENTRYPOINT: &str = "/api/v1";
pub const DEFAULT_AUTH_PATH: &str = "/user";

/// Exactly one authentication mode per client.
#[derive(Debug, Default)]
pub enum Credentials {
    /// A pre-issued API token; no network round-trip.
    Token(SecretString),
    /// Username and password exchanged for a token at construction.
    Basic {
        username: String,
        password: SecretString,
    },
    #[default]
    Anonymous,
}

/// Everything needed to construct a [`Client`].
#[derive(Debug)]
pub struct ClientConfig {
    pub api_addr: String,
    pub credentials: Credentials,
    pub api_entrypoint: String,
    /// Appended to `api_entrypoint` for the token exchange.
    pub auth_path: String,
    /// Fetch the catalog on construction; otherwise default paths are used.
    pub fetch_catalog: bool,
    pub transport: TransportConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_addr: DEFAULT_API_ADDR.into(),
            credentials: Credentials::Anonymous,
            api_entrypoint: DEFAULT_API_ENTRYPOINT.into(),
            auth_path: DEFAULT_AUTH_PATH.into(),
            fetch_catalog: true,
            transport: TransportConfig::default(),
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    api_token: Option<String>,
}

/// Client for one Ona server.
#[derive(Debug)]
pub struct Client {
    conn: Connection,
    catalog: Catalog,
    api_entrypoint: String,
    auth_path: String,
    exports_path: String,
}

impl Client {
    /// Connect, authenticate, and (optionally) fetch the catalog.
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        let conn = Connection::new(&config.api_addr, &config.transport)?;
        Self::with_connection(conn, config)
    }

    /// Like [`Client::new`] but over an already-open connection.
    ///
    /// `config.api_addr` and `config.transport` are ignored; the connection
    /// already carries them.
    pub fn with_connection(conn: Connection, config: ClientConfig) -> Result<Self, Error> {
        let api_entrypoint = config.api_entrypoint.trim_end_matches('/').to_owned();
        let mut client = Self {
            conn,
            catalog: Catalog::with_defaults(&api_entrypoint),
            auth_path: format!("{api_entrypoint}{}", config.auth_path),
            exports_path: format!("{api_entrypoint}/exports"),
            api_entrypoint,
        };

        match config.credentials {
            Credentials::Token(token) => client.set_auth_token(token),
            Credentials::Basic { username, password } => {
                client.authenticate(&username, password)?;
            }
            Credentials::Anonymous => debug!("no credentials configured, requests are anonymous"),
        }

        if config.fetch_catalog {
            client.fetch_catalog()?;
        }
        Ok(client)
    }

    /// Exchange credentials for an API token and install it.
    ///
    /// `GET <api_entrypoint><auth_path>` with HTTP Basic auth; the response
    /// must carry an `api_token` field.
    pub fn authenticate(
        &mut self,
        username: &str,
        password: SecretString,
    ) -> Result<SecretString, Error> {
        let extras = Extras {
            basic_auth: Some(BasicAuth {
                username: username.to_owned(),
                password,
            }),
            ..Extras::default()
        };
        let resp = self.conn.get_with(&self.auth_path, &extras)?;
        let token = resp
            .json::<TokenResponse>()?
            .api_token
            .ok_or_else(|| Error::Authentication {
                message: format!("{} returned no api_token", self.auth_path),
            })?;

        info!(username, "authenticated");
        self.set_auth_token(SecretString::from(token.clone()));
        Ok(SecretString::from(token))
    }

    /// Install a token for all subsequent requests.
    pub fn set_auth_token(&mut self, token: SecretString) {
        debug!(len = token.expose_secret().len(), "installing api token");
        self.conn.set_auth_token(token);
    }

    /// `GET <api_entrypoint>` and rebind every resource to its catalog path.
    pub fn fetch_catalog(&mut self) -> Result<&Catalog, Error> {
        let resp = self.conn.get(&self.api_entrypoint)?;
        self.catalog = Catalog::from_document(&resp.body, &self.api_entrypoint)?;
        debug!(catalog = ?self.catalog, "catalog fetched");
        Ok(&self.catalog)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    // ── Resource managers ────────────────────────────────────────────

    pub fn forms(&self) -> Forms<'_> {
        Forms::new(
            &self.conn,
            self.catalog.path(ResourceKind::Forms),
            &self.exports_path,
        )
    }

    pub fn data(&self) -> Data<'_> {
        Data::new(&self.conn, self.catalog.path(ResourceKind::Data))
    }

    pub fn stats(&self) -> Stats<'_> {
        Stats::new(&self.conn, self.catalog.path(ResourceKind::Stats))
    }
}

// Shared transport configuration for building the blocking reqwest session.
//
// Timeouts, TLS verification, retry count and user agent are settled here so
// every request issued through a `Connection` sees the same settings.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::Error;

/// TLS verification mode.
#[derive(Debug, Clone, Default)]
pub enum TlsMode {
    /// Use the built-in root certificate store.
    #[default]
    System,
    /// Additionally trust a CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (`ssl_verify = false`).
    DangerAcceptInvalid,
}

/// Transport settings applied uniformly to every request.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    /// Time allowed to establish the connection.
    pub timeout: Duration,
    /// Time allowed for the response once connected.
    pub read_timeout: Duration,
    /// Connection-level retries for requests that fail to connect.
    pub max_retries: u32,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: Duration::from_secs(20),
            read_timeout: Duration::from_secs(20),
            max_retries: 5,
            user_agent: default_user_agent(),
        }
    }
}

/// `onapie/<version>`.
pub fn default_user_agent() -> String {
    format!("onapie/{}", env!("CARGO_PKG_VERSION"))
}

impl TransportConfig {
    /// Build a blocking `reqwest::blocking::Client` from this config.
    ///
    /// The blocking client only exposes a connect timeout and a whole-request
    /// timeout, so the read budget is added on top of the connect budget.
    pub fn build_client(&self) -> Result<reqwest::blocking::Client, Error> {
        let mut builder = reqwest::blocking::Client::builder()
            .connect_timeout(self.timeout)
            .timeout(self.timeout + self.read_timeout)
            .user_agent(self.user_agent.as_str());

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }

    /// Convenience for the common `ssl_verify` boolean.
    pub fn with_ssl_verify(mut self, verify: bool) -> Self {
        if !verify {
            self.tls = TlsMode::DangerAcceptInvalid;
        } else if matches!(self.tls, TlsMode::DangerAcceptInvalid) {
            self.tls = TlsMode::System;
        }
        self
    }
}

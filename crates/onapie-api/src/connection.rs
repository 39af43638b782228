// HTTP connection to an Ona server
//
// Wraps the blocking `reqwest` session with absolute-URL construction from
// relative paths, default headers (user agent + token), connection-level
// retries and status classification. Resource managers borrow a
// `Connection` from the owning `Client`; there is no shared global instance.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use reqwest::blocking::multipart;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

// ── Request types ────────────────────────────────────────────────────

/// In-memory request payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// `application/x-www-form-urlencoded` pairs, sent in order.
    Form(Vec<(String, String)>),
    /// A JSON document.
    Json(serde_json::Value),
}

/// A file sent as one multipart part, read fully into memory before sending.
#[derive(Debug, Clone, PartialEq)]
pub struct FileUpload {
    /// Multipart field name.
    pub field: String,
    pub path: PathBuf,
}

impl FileUpload {
    pub fn new(field: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            field: field.into(),
            path: path.into(),
        }
    }
}

/// HTTP Basic credentials for a single request.
#[derive(Debug)]
pub struct BasicAuth {
    pub username: String,
    pub password: SecretString,
}

/// Per-call request extras.
#[derive(Debug, Default)]
pub struct Extras {
    /// Headers merged over the connection defaults (same name wins).
    pub headers: HeaderMap,
    /// Basic credentials, used only by the token exchange.
    pub basic_auth: Option<BasicAuth>,
}

/// Request body after any file has been loaded.
enum Body {
    Empty,
    Form(Vec<(String, String)>),
    Json(serde_json::Value),
    Multipart {
        field: String,
        file_name: String,
        data: Vec<u8>,
        fields: Vec<(String, String)>,
    },
}

impl Body {
    fn prepare(
        file: Option<&FileUpload>,
        payload: Option<&Payload>,
        method: &Method,
    ) -> Result<Self, Error> {
        match (file, payload) {
            (None, None) => Err(Error::client(format!("{method} requires a file or a payload"))),
            (None, Some(Payload::Form(pairs))) => Ok(Self::Form(pairs.clone())),
            (None, Some(Payload::Json(value))) => Ok(Self::Json(value.clone())),
            (Some(_), Some(Payload::Json(_))) => Err(Error::client(
                "a JSON payload cannot accompany a file upload",
            )),
            (Some(upload), form) => {
                let data = std::fs::read(&upload.path).map_err(|source| Error::Io {
                    path: upload.path.clone(),
                    source,
                })?;
                let fields = match form {
                    Some(Payload::Form(pairs)) => pairs.clone(),
                    _ => Vec::new(),
                };
                Ok(Self::Multipart {
                    field: upload.field.clone(),
                    file_name: file_name(&upload.path),
                    data,
                    fields,
                })
            }
        }
    }

    fn apply(
        &self,
        builder: reqwest::blocking::RequestBuilder,
    ) -> reqwest::blocking::RequestBuilder {
        match self {
            Self::Empty => builder,
            Self::Form(pairs) => builder.form(pairs),
            Self::Json(value) => builder.json(value),
            Self::Multipart {
                field,
                file_name,
                data,
                fields,
            } => {
                let mut form = multipart::Form::new();
                for (name, value) in fields {
                    form = form.text(name.clone(), value.clone());
                }
                let part = multipart::Part::bytes(data.clone()).file_name(file_name.clone());
                builder.multipart(form.part(field.clone(), part))
            }
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| "upload".to_owned(), |name| name.to_string_lossy().into_owned())
}

// ── Response envelope ────────────────────────────────────────────────

/// A fully-read HTTP response.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    /// Canonical reason phrase for `status` (empty when unknown).
    pub reason: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Response {
    fn read(resp: reqwest::blocking::Response) -> Result<Self, Error> {
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.bytes()?;
        Ok(Self {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_owned(),
            headers,
            body,
        })
    }

    /// The body decoded as UTF-8, lossily.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        serde_json::from_slice(&self.body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: self.text().into_owned(),
        })
    }

    /// Decode the body as loosely-typed JSON; an empty body is `null`.
    pub fn json_value(&self) -> Result<serde_json::Value, Error> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(serde_json::Value::Null);
        }
        self.json()
    }

    /// The `Content-Type` header, if present and readable.
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    /// Classify the status: 200-399 passes, everything else is an error.
    fn classify(self) -> Result<Self, Error> {
        if (200..400).contains(&self.status) {
            Ok(self)
        } else {
            Err(Error::from_response(self))
        }
    }
}

/// Append URL-encoded query pairs to a path. No pairs, no `?`.
pub(crate) fn with_query(path: &str, pairs: &[(&str, &str)]) -> String {
    if pairs.is_empty() {
        return path.to_owned();
    }
    let query = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish();
    format!("{path}?{query}")
}

// ── Connection ───────────────────────────────────────────────────────

/// Authenticated HTTP handle for one Ona server.
pub struct Connection {
    http: reqwest::blocking::Client,
    base_url: Url,
    max_retries: u32,
    auth_token: Option<SecretString>,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("base_url", &self.base_url.as_str())
            .field("max_retries", &self.max_retries)
            .field("authenticated", &self.auth_token.is_some())
            .finish_non_exhaustive()
    }
}

impl Connection {
    /// Open a connection to `base_url` (`http` or `https` only).
    pub fn new(base_url: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let base_url = Url::parse(base_url)?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(Error::client(format!(
                "{} protocol is not supported",
                base_url.scheme()
            )));
        }
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            max_retries: transport.max_retries,
            auth_token: None,
        })
    }

    /// The server base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Install a token sent as `Authorization: Token <value>` on every
    /// subsequent request made through this handle.
    pub fn set_auth_token(&mut self, token: SecretString) {
        self.auth_token = Some(token);
    }

    pub fn has_auth_token(&self) -> bool {
        self.auth_token.is_some()
    }

    /// Resolve a relative path (optionally carrying a query) against the
    /// server's scheme and authority.
    pub fn url(&self, path: &str) -> Result<Url, Error> {
        let path: Cow<'_, str> = if path.starts_with('/') {
            Cow::Borrowed(path)
        } else {
            Cow::Owned(format!("/{path}"))
        };
        Ok(self.base_url.join(&path)?)
    }

    // ── Verbs ────────────────────────────────────────────────────────

    pub fn get(&self, path: &str) -> Result<Response, Error> {
        self.request(Method::GET, path, None, None, &Extras::default())
    }

    pub fn get_with(&self, path: &str, extras: &Extras) -> Result<Response, Error> {
        self.request(Method::GET, path, None, None, extras)
    }

    pub fn post(
        &self,
        path: &str,
        file: Option<&FileUpload>,
        payload: Option<&Payload>,
    ) -> Result<Response, Error> {
        self.request_with_body(Method::POST, path, file, payload)
    }

    pub fn put(
        &self,
        path: &str,
        file: Option<&FileUpload>,
        payload: Option<&Payload>,
    ) -> Result<Response, Error> {
        self.request_with_body(Method::PUT, path, file, payload)
    }

    pub fn patch(
        &self,
        path: &str,
        file: Option<&FileUpload>,
        payload: Option<&Payload>,
    ) -> Result<Response, Error> {
        self.request_with_body(Method::PATCH, path, file, payload)
    }

    pub fn delete(&self, path: &str) -> Result<Response, Error> {
        self.request(Method::DELETE, path, None, None, &Extras::default())
    }

    fn request_with_body(
        &self,
        method: Method,
        path: &str,
        file: Option<&FileUpload>,
        payload: Option<&Payload>,
    ) -> Result<Response, Error> {
        if file.is_none() && payload.is_none() {
            return Err(Error::client(format!("{method} requires a file or a payload")));
        }
        self.request(method, path, file, payload, &Extras::default())
    }

    /// Send one request and classify the response.
    ///
    /// Requests that fail to connect are retried up to `max_retries` times;
    /// HTTP error statuses are never retried.
    pub fn request(
        &self,
        method: Method,
        path: &str,
        file: Option<&FileUpload>,
        payload: Option<&Payload>,
        extras: &Extras,
    ) -> Result<Response, Error> {
        let url = self.url(path)?;
        let body = if file.is_none() && payload.is_none() {
            Body::Empty
        } else {
            Body::prepare(file, payload, &method)?
        };
        let headers = self.headers(extras)?;

        debug!("{} {}", method, url);

        let mut attempt = 0;
        let resp = loop {
            let mut builder = self
                .http
                .request(method.clone(), url.clone())
                .headers(headers.clone());
            if let Some(auth) = &extras.basic_auth {
                builder = builder.basic_auth(&auth.username, Some(auth.password.expose_secret()));
            }
            match body.apply(builder).send() {
                Ok(resp) => break resp,
                Err(err) if err.is_connect() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(%url, attempt, max_retries = self.max_retries, "connection failed, retrying");
                }
                Err(err) => return Err(Error::Transport(err)),
            }
        };

        let response = Response::read(resp)?;
        debug!(status = response.status, "{} {}", method, url);
        response.classify()
    }

    /// Default headers overlaid with the per-call ones.
    fn headers(&self, extras: &Extras) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &self.auth_token {
            let mut value = HeaderValue::from_str(&format!("Token {}", token.expose_secret()))
                .map_err(|_| Error::client("auth token contains characters not allowed in a header"))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        for (name, value) in &extras.headers {
            headers.insert(name.clone(), value.clone());
        }
        Ok(headers)
    }
}

// XLSForm endpoints
//
// Forms live under the catalog's `forms` path; exports hang off the API
// entrypoint. Most responses are loosely-typed JSON because the field set
// varies with the form definition.

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use bytes::Bytes;
use serde_json::{Value, json};
use strum::{AsRefStr, Display, EnumString};
use tracing::{debug, warn};

use crate::connection::{Connection, FileUpload, Payload, Response, with_query};
use crate::error::Error;

/// Form representations served at `<forms>/<pk>/form.<ext>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Representation {
    Json,
    Xml,
    Xls,
    Csv,
}

impl Representation {
    /// Parse a representation name, rejecting anything unsupported.
    pub fn parse(name: &str) -> Result<Self, Error> {
        Self::from_str(name).map_err(|_| {
            Error::client(format!(
                "unsupported form representation '{name}': expected csv, json, xml or xls"
            ))
        })
    }
}

/// Roles a form can be shared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ShareRole {
    Readonly,
    Dataentry,
    Editor,
    Manager,
}

/// Where a new form definition comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormSource<'a> {
    File(&'a Path),
    Url(&'a str),
}

impl<'a> FormSource<'a> {
    /// Exactly one of `xls_path` / `xls_url` must be given.
    pub fn from_options(xls_path: Option<&'a Path>, xls_url: Option<&'a str>) -> Result<Self, Error> {
        match (xls_path, xls_url) {
            (Some(path), None) => Ok(Self::File(path)),
            (None, Some(url)) => Ok(Self::Url(url)),
            _ => Err(Error::client(
                "You must provide a path or a url for creation. \
                 The two args are mutually exclusive!",
            )),
        }
    }
}

/// Full form update (`PUT`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormUpdate {
    pub uuid: String,
    pub description: String,
    pub owner: String,
    pub public: bool,
    pub public_data: bool,
}

impl FormUpdate {
    fn to_pairs(&self) -> Vec<(String, String)> {
        vec![
            ("uuid".into(), self.uuid.clone()),
            ("description".into(), self.description.clone()),
            ("owner".into(), self.owner.clone()),
            ("public".into(), python_bool(self.public)),
            ("public_data".into(), python_bool(self.public_data)),
        ]
    }
}

/// The server expects `True` / `False` in form-encoded booleans.
fn python_bool(value: bool) -> String {
    if value { "True" } else { "False" }.to_owned()
}

/// A form fetched in some representation.
#[derive(Debug, Clone, PartialEq)]
pub enum FormDocument {
    Json(Value),
    Raw {
        content_type: Option<String>,
        body: Bytes,
    },
}

/// Forms manager bound to a connection and a catalog path.
#[derive(Debug, Clone, Copy)]
pub struct Forms<'c> {
    conn: &'c Connection,
    path: &'c str,
    exports_path: &'c str,
}

impl<'c> Forms<'c> {
    pub fn new(conn: &'c Connection, path: &'c str, exports_path: &'c str) -> Self {
        Self {
            conn,
            path: path.trim_end_matches('/'),
            exports_path: exports_path.trim_end_matches('/'),
        }
    }

    fn form_path(&self, pk: &str) -> String {
        format!("{}/{pk}", self.path)
    }

    /// Upload a new XLSForm from a local file or a URL.
    ///
    /// `POST <forms>` with `xls_file` (multipart) or `xls_url` (form field).
    pub fn create(&self, source: FormSource<'_>, owner: Option<&str>) -> Result<Value, Error> {
        let mut fields: Vec<(String, String)> = Vec::new();
        if let Some(owner) = owner {
            fields.push(("owner".into(), owner.into()));
        }
        let resp = match source {
            FormSource::File(path) => {
                debug!(path = %path.display(), "uploading xlsform");
                let upload = FileUpload::new("xls_file", path);
                let payload = (!fields.is_empty()).then(|| Payload::Form(fields));
                self.conn.post(self.path, Some(&upload), payload.as_ref())?
            }
            FormSource::Url(url) => {
                debug!(url, "creating form from url");
                fields.push(("xls_url".into(), url.into()));
                self.conn.post(self.path, None, Some(&Payload::Form(fields)))?
            }
        };
        resp.json_value()
    }

    /// List forms, optionally filtered by owner username.
    ///
    /// `GET <forms>[?owner=<owner>]`
    pub fn list(&self, owner: Option<&str>) -> Result<Value, Error> {
        let query: Vec<(&str, &str)> = owner.map(|o| ("owner", o)).into_iter().collect();
        self.conn.get(&with_query(self.path, &query))?.json_value()
    }

    /// Fetch a form, its representation, or either filtered by tags.
    ///
    /// `GET <forms>/<pk>[/form.<repr>][?tags=a,b]`
    pub fn get(
        &self,
        pk: &str,
        representation: Option<Representation>,
        tags: &[String],
    ) -> Result<FormDocument, Error> {
        let mut path = self.form_path(pk);
        if let Some(repr) = representation {
            path = format!("{path}/form.{repr}");
        }
        let joined = tags.join(",");
        let query: Vec<(&str, &str)> = if tags.is_empty() {
            Vec::new()
        } else {
            vec![("tags", joined.as_str())]
        };
        let resp = self.conn.get(&with_query(&path, &query))?;
        match representation {
            None | Some(Representation::Json) => resp.json_value().map(FormDocument::Json),
            Some(_) => Ok(raw_document(resp)),
        }
    }

    /// Replace a form's metadata.
    ///
    /// `PUT <forms>/<pk>`
    pub fn update(&self, pk: &str, update: &FormUpdate) -> Result<Value, Error> {
        let payload = Payload::Form(update.to_pairs());
        self.conn
            .put(&self.form_path(pk), None, Some(&payload))?
            .json_value()
    }

    /// Update selected form properties.
    ///
    /// `PATCH <forms>/<pk>`
    pub fn patch(&self, pk: &str, fields: &BTreeMap<String, String>) -> Result<Value, Error> {
        if fields.is_empty() {
            return Err(Error::client("patch requires at least one field to update"));
        }
        let pairs = fields
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        self.conn
            .patch(&self.form_path(pk), None, Some(&Payload::Form(pairs)))?
            .json_value()
    }

    /// Delete a form. The service must answer `204 No Content`.
    ///
    /// `DELETE <forms>/<pk>`
    pub fn delete(&self, pk: &str) -> Result<(), Error> {
        let resp = self.conn.delete(&self.form_path(pk))?;
        expect_no_content(resp, "Invalid api delete response")
    }

    /// `GET <forms>/<pk>/labels`
    pub fn get_tags(&self, pk: &str) -> Result<Value, Error> {
        self.conn
            .get(&format!("{}/labels", self.form_path(pk)))?
            .json_value()
    }

    /// Tag a form.
    ///
    /// `POST <forms>/<pk>/labels` with `{"tags": [...]}`
    pub fn set_tag(&self, pk: &str, tags: &[String]) -> Result<Value, Error> {
        let payload = Payload::Json(json!({ "tags": tags }));
        self.conn
            .post(&format!("{}/labels", self.form_path(pk)), None, Some(&payload))?
            .json_value()
    }

    /// `DELETE <forms>/<pk>/labels/<tag>`
    pub fn remove_tag(&self, pk: &str, tag: &str) -> Result<Value, Error> {
        self.conn
            .delete(&format!("{}/labels/{tag}", self.form_path(pk)))?
            .json_value()
    }

    /// Enketo web-form link.
    ///
    /// `GET <forms>/<pk>/enketo`
    pub fn get_webformlink(&self, pk: &str) -> Result<Value, Error> {
        self.conn
            .get(&format!("{}/enketo", self.form_path(pk)))?
            .json_value()
    }

    /// Export submitted data in `export_format` (csv, xls, ...).
    ///
    /// `GET <exports>/<pk>.<format>`
    pub fn get_formdata(&self, pk: &str, export_format: &str) -> Result<Bytes, Error> {
        let resp = self
            .conn
            .get(&format!("{}/{pk}.{export_format}", self.exports_path))?;
        Ok(resp.body)
    }

    /// Share a form with a user. Unknown roles are left out of the request.
    ///
    /// `POST <forms>/<pk>/share`; the service must answer `204 No Content`.
    pub fn share(&self, pk: &str, username: &str, role: Option<&str>) -> Result<(), Error> {
        let mut pairs = vec![("username".to_owned(), username.to_owned())];
        match role.map(|r| (r, ShareRole::from_str(r))) {
            Some((_, Ok(role))) => pairs.push(("role".into(), role.to_string())),
            Some((name, Err(_))) => warn!(role = name, "ignoring unknown share role"),
            None => {}
        }
        let resp = self.conn.post(
            &format!("{}/share", self.form_path(pk)),
            None,
            Some(&Payload::Form(pairs)),
        )?;
        expect_no_content(resp, "Invalid api form share response")
    }

    /// Clone a form into another user's account.
    ///
    /// `POST <forms>/<pk>/clone`
    pub fn clone_to_user(&self, pk: &str, username: &str) -> Result<Value, Error> {
        let payload = Payload::Form(vec![("username".into(), username.into())]);
        self.conn
            .post(&format!("{}/clone", self.form_path(pk)), None, Some(&payload))?
            .json_value()
    }
}

fn raw_document(resp: Response) -> FormDocument {
    FormDocument::Raw {
        content_type: resp.content_type().map(str::to_owned),
        body: resp.body,
    }
}

fn expect_no_content(resp: Response, context: &str) -> Result<(), Error> {
    if resp.status == 204 {
        return Ok(());
    }
    Err(Error::Client {
        message: format!("{context}: {}, {}", resp.status, resp.reason),
        response: Some(Box::new(resp)),
    })
}

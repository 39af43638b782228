// Submitted-data endpoints

use std::collections::BTreeMap;

use serde_json::Value;

use crate::connection::{Connection, with_query};
use crate::error::Error;

/// Selection for `Data::get`.
///
/// A `dataid` wins over `query`, which wins over `tags`; only one of them
/// shapes the request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataQuery {
    pub dataid: Option<String>,
    pub tags: Vec<String>,
    /// Field filters sent as `?query=<json object>`.
    pub query: BTreeMap<String, Value>,
}

/// Data manager bound to a connection and a catalog path.
#[derive(Debug, Clone, Copy)]
pub struct Data<'c> {
    conn: &'c Connection,
    path: &'c str,
}

impl<'c> Data<'c> {
    pub fn new(conn: &'c Connection, path: &'c str) -> Self {
        Self {
            conn,
            path: path.trim_end_matches('/'),
        }
    }

    /// List data endpoints. Pass `public` as the owner for public endpoints.
    ///
    /// `GET <data>[?owner=<owner>]`
    pub fn list_endpoints(&self, owner: Option<&str>) -> Result<Value, Error> {
        let query: Vec<(&str, &str)> = owner.map(|o| ("owner", o)).into_iter().collect();
        self.conn.get(&with_query(self.path, &query))?.json_value()
    }

    /// Submitted data for a form: one record, a filtered set, or a tagged set.
    ///
    /// `GET <data>/<pk>[/<dataid> | ?query=<json> | ?tags=a,b]`
    pub fn get(&self, pk: &str, selection: &DataQuery) -> Result<Value, Error> {
        let base = format!("{}/{pk}", self.path);
        let path = if let Some(dataid) = &selection.dataid {
            format!("{base}/{dataid}")
        } else if !selection.query.is_empty() {
            let query = serde_json::to_string(&selection.query).map_err(|e| {
                Error::client(format!("query terms cannot be encoded: {e}"))
            })?;
            with_query(&base, &[("query", query.as_str())])
        } else if !selection.tags.is_empty() {
            with_query(&base, &[("tags", selection.tags.join(",").as_str())])
        } else {
            base
        };
        self.conn.get(&path)?.json_value()
    }

    /// `DELETE <data>/<pk>`
    pub fn delete(&self, pk: &str) -> Result<(), Error> {
        self.conn.delete(&format!("{}/{pk}", self.path))?;
        Ok(())
    }

    /// Remove a tag from one submission.
    ///
    /// `DELETE <data>/<pk>/<dataid>/labels/<tag>`
    pub fn delete_tag(&self, pk: &str, dataid: &str, tag: &str) -> Result<Value, Error> {
        self.conn
            .delete(&format!("{}/{pk}/{dataid}/labels/{tag}", self.path))?
            .json_value()
    }

    /// Enketo edit link for one submission.
    ///
    /// `GET <data>/<pk>/<dataid>/enketo`
    pub fn get_enketo_editlink(&self, pk: &str, dataid: &str) -> Result<Value, Error> {
        self.conn
            .get(&format!("{}/{pk}/{dataid}/enketo", self.path))?
            .json_value()
    }
}

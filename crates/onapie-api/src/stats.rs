// Form statistics endpoints
//
// Summary statistics per form. The response shape depends on the requested
// method (mean, median, mode, range, ...), so it stays loosely typed.

use serde_json::Value;
use tracing::debug;

use crate::connection::{Connection, with_query};
use crate::error::Error;

/// Stats manager bound to a connection and a catalog path.
#[derive(Debug, Clone, Copy)]
pub struct Stats<'c> {
    conn: &'c Connection,
    path: &'c str,
}

impl<'c> Stats<'c> {
    pub fn new(conn: &'c Connection, path: &'c str) -> Self {
        Self {
            conn,
            path: path.trim_end_matches('/'),
        }
    }

    /// Statistics for a form, optionally restricted to one method.
    ///
    /// `GET <stats>/<pk>[?method=<method>]`
    pub fn get(&self, pk: &str, method: Option<&str>) -> Result<Value, Error> {
        let query: Vec<(&str, &str)> = method.map(|m| ("method", m)).into_iter().collect();
        debug!(pk, ?method, "fetching form stats");
        self.conn
            .get(&with_query(&format!("{}/{pk}", self.path), &query))?
            .json_value()
    }
}

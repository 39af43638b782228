// API catalog discovery
//
// The service root (`GET /api/v1`) answers with a map of resource names to
// absolute URLs. Only the path component is kept, so managers stay bound to
// the connection's own scheme and host.

use std::collections::BTreeMap;

use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};
use tracing::debug;
use url::Url;

use crate::error::Error;

/// The resources this client knows how to manage.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, AsRefStr, EnumString, EnumIter,
)]
#[strum(serialize_all = "lowercase")]
pub enum ResourceKind {
    Forms,
    Data,
    Stats,
}

/// Resource paths discovered from (or defaulted for) the API entrypoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    paths: BTreeMap<ResourceKind, String>,
}

impl Catalog {
    /// `<entrypoint>/<name>` for every resource, used when no catalog is
    /// fetched.
    pub fn with_defaults(entrypoint: &str) -> Self {
        let paths = ResourceKind::iter()
            .map(|kind| (kind, default_path(entrypoint, kind)))
            .collect();
        Self { paths }
    }

    /// Parse the entrypoint document.
    ///
    /// The body must be a JSON object. Entries for unknown resources are
    /// ignored; missing entries fall back to the default path.
    pub fn from_document(body: &[u8], entrypoint: &str) -> Result<Self, Error> {
        let document: BTreeMap<String, serde_json::Value> =
            serde_json::from_slice(body).map_err(|e| Error::Deserialization {
                message: format!("invalid catalog document: {e}"),
                body: String::from_utf8_lossy(body).into_owned(),
            })?;

        let mut paths = BTreeMap::new();
        for kind in ResourceKind::iter() {
            let path = match document.get(kind.as_ref()) {
                Some(serde_json::Value::String(link)) => path_of(link)?,
                Some(other) => {
                    return Err(Error::Deserialization {
                        message: format!("catalog entry '{kind}' is not a URL"),
                        body: other.to_string(),
                    });
                }
                None => {
                    debug!(resource = %kind, "catalog has no entry, using default path");
                    default_path(entrypoint, kind)
                }
            };
            paths.insert(kind, path);
        }
        Ok(Self { paths })
    }

    /// The relative path bound to `kind`.
    pub fn path(&self, kind: ResourceKind) -> &str {
        self.paths.get(&kind).map_or("", String::as_str)
    }
}

fn default_path(entrypoint: &str, kind: ResourceKind) -> String {
    format!("{}/{kind}", entrypoint.trim_end_matches('/'))
}

/// Path component of an absolute link; relative links are taken as paths.
fn path_of(link: &str) -> Result<String, Error> {
    match Url::parse(link) {
        Ok(url) => Ok(url.path().to_owned()),
        Err(url::ParseError::RelativeUrlWithoutBase) => Ok(link.to_owned()),
        Err(e) => Err(Error::InvalidUrl(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_names_are_lowercase() {
        assert_eq!(ResourceKind::Forms.to_string(), "forms");
        assert_eq!("stats".parse::<ResourceKind>().unwrap(), ResourceKind::Stats);
        assert!("Forms".parse::<ResourceKind>().is_err());
    }

    #[test]
    fn defaults_hang_off_the_entrypoint() {
        let catalog = Catalog::with_defaults("/api/v1/");
        assert_eq!(catalog.path(ResourceKind::Forms), "/api/v1/forms");
        assert_eq!(catalog.path(ResourceKind::Data), "/api/v1/data");
        assert_eq!(catalog.path(ResourceKind::Stats), "/api/v1/stats");
    }

    #[test]
    fn document_links_are_reduced_to_paths() {
        let body = br#"{
            "forms": "https://api.ona.io/api/v1/forms",
            "data": "https://api.ona.io/api/v1/data",
            "stats": "/api/v1/stats",
            "charts": "https://api.ona.io/api/v1/charts"
        }"#;
        let catalog = Catalog::from_document(body, "/api/v1").unwrap();
        assert_eq!(catalog.path(ResourceKind::Forms), "/api/v1/forms");
        assert_eq!(catalog.path(ResourceKind::Data), "/api/v1/data");
        assert_eq!(catalog.path(ResourceKind::Stats), "/api/v1/stats");
    }

    #[test]
    fn missing_entries_fall_back_to_defaults() {
        let catalog =
            Catalog::from_document(br#"{"forms": "http://h/x/forms"}"#, "/api/v1").unwrap();
        assert_eq!(catalog.path(ResourceKind::Forms), "/x/forms");
        assert_eq!(catalog.path(ResourceKind::Data), "/api/v1/data");
    }

    #[test]
    fn malformed_document_is_a_deserialization_error() {
        let err = Catalog::from_document(b"<html>", "/api/v1").unwrap_err();
        assert!(matches!(err, Error::Deserialization { .. }));

        let err = Catalog::from_document(b"[]", "/api/v1").unwrap_err();
        assert!(matches!(err, Error::Deserialization { .. }));

        let err = Catalog::from_document(br#"{"forms": 3}"#, "/api/v1").unwrap_err();
        assert!(matches!(err, Error::Deserialization { .. }));
    }
}

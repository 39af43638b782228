// onapie-api: Blocking Rust client for the Ona forms / data-collection API

pub mod catalog;
pub mod client;
pub mod connection;
pub mod data;
pub mod error;
pub mod forms;
pub mod schema;
pub mod stats;
pub mod transport;

pub use catalog::{Catalog, ResourceKind};
pub use client::{Client, ClientConfig, Credentials};
pub use connection::{BasicAuth, Connection, Extras, FileUpload, Payload, Response};
pub use data::{Data, DataQuery};
pub use error::Error;
pub use forms::{FormDocument, FormSource, FormUpdate, Forms, Representation, ShareRole};
pub use schema::{FormSchema, Label, SchemaNode};
pub use stats::Stats;
pub use transport::{TlsMode, TransportConfig};

//! External programme catalog client.

pub mod http;
pub mod types;

pub use http::{CatalogConfig, HttpCatalogClient};
pub use types::{
    Ancestor, CatalogClient, CatalogError, ProgrammeKind, ProgrammeMeta, SearchHit, Version,
};

//! Remote SPARQL execution: session configuration, the config magics that
//! mutate it, the static query vocabulary, and the HTTP client.

pub mod client;
pub mod config;
pub mod language;
pub mod magics;

pub use client::{QueryExecutor, SparqlClient, render_response};
pub use config::{
    Auth, AuthMethod, DEFAULT_TEXT_LANGUAGES, DisplayMode, HttpMethod, QueryConfig, ResultFormat,
};
pub use language::{KEYWORD_HELP, QUERY_STARTERS, SPARQL_KEYWORDS};
pub use magics::{MAGICS, process_magic};

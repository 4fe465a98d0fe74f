//! Process-lifetime configuration for remote query execution.
//!
//! Created once at session start and mutated incrementally by config
//! magics; read by the query client on every execution.

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use url::Url;

/// Languages preferred for literal filtering when none are configured.
pub const DEFAULT_TEXT_LANGUAGES: &[&str] = &["en", "es", "fr", "de", "it"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum ResultFormat {
    #[default]
    Json,
    Xml,
    N3,
    Csv,
    Tsv,
    Any,
}

impl ResultFormat {
    /// HTTP Accept header value requested from the endpoint.
    pub fn accept(self) -> &'static str {
        match self {
            ResultFormat::Json => "application/sparql-results+json",
            ResultFormat::Xml => "application/sparql-results+xml",
            ResultFormat::N3 => "text/rdf+n3, text/turtle",
            ResultFormat::Csv => "text/csv",
            ResultFormat::Tsv => "text/tab-separated-values",
            ResultFormat::Any => "*/*",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    Raw,
    #[default]
    Table,
    Diagram,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    Get,
    #[default]
    Post,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    Basic,
    Digest,
}

/// HTTP credentials for the endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Auth {
    pub method: AuthMethod,
    pub user: String,
    pub password: String,
}

/// Mutable remote-query configuration record.
#[derive(Debug, Clone)]
pub struct QueryConfig {
    pub endpoint: Option<Url>,
    pub auth: Option<Auth>,
    /// Extra query parameters sent with every request, insertion order.
    pub query_params: IndexMap<String, String>,
    /// Extra HTTP headers sent with every request, insertion order.
    pub http_headers: IndexMap<String, String>,
    /// PREFIX declarations prepended to every query, insertion order.
    pub prefixes: IndexMap<String, String>,
    /// Free-form SPARQL header lines prepended after the prefixes.
    pub header_lines: Vec<String>,
    pub default_graph: Option<String>,
    pub format: ResultFormat,
    pub display: DisplayMode,
    pub languages: Vec<String>,
    /// Maximum number of result rows shown; `None` means all.
    pub result_limit: Option<usize>,
    pub outfile: Option<PathBuf>,
    pub method: HttpMethod,
    pub log_level: String,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            auth: None,
            query_params: IndexMap::new(),
            http_headers: IndexMap::new(),
            prefixes: IndexMap::new(),
            header_lines: Vec::new(),
            default_graph: None,
            format: ResultFormat::default(),
            display: DisplayMode::default(),
            languages: DEFAULT_TEXT_LANGUAGES
                .iter()
                .map(|lang| (*lang).to_string())
                .collect(),
            result_limit: None,
            outfile: None,
            method: HttpMethod::default(),
            log_level: "info".to_string(),
        }
    }
}

impl QueryConfig {
    /// PREFIX and header lines prepended to each outgoing query.
    pub fn preamble(&self) -> String {
        let mut out = String::new();
        for (name, uri) in &self.prefixes {
            out.push_str(&format!("PREFIX {name}: <{uri}>\n"));
        }
        for line in &self.header_lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preamble_preserves_prefix_order() {
        let mut cfg = QueryConfig::default();
        cfg.prefixes
            .insert("zzz".to_string(), "http://example.org/z#".to_string());
        cfg.prefixes
            .insert("aaa".to_string(), "http://example.org/a#".to_string());
        cfg.header_lines.push("FROM <http://example.org/g>".to_string());
        let preamble = cfg.preamble();
        let z = preamble.find("zzz").unwrap();
        let a = preamble.find("aaa").unwrap();
        assert!(z < a);
        assert!(preamble.ends_with("FROM <http://example.org/g>\n"));
    }

    #[test]
    fn format_names_parse_case_insensitively() {
        assert_eq!("json".parse::<ResultFormat>().unwrap(), ResultFormat::Json);
        assert_eq!("N3".parse::<ResultFormat>().unwrap(), ResultFormat::N3);
        assert!("bogus".parse::<ResultFormat>().is_err());
    }
}

//! Remote query execution over HTTP.
//!
//! [`QueryExecutor`] is the seam the dispatcher talks to; [`SparqlClient`]
//! is the production implementation built on a blocking reqwest client.
//! Tests substitute a stub executor so no network is involved.

use std::fs;
use std::time::Duration;

use anyhow::Context;
use reqwest::blocking::{Client, RequestBuilder};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{KernelError, Result};

use super::config::{AuthMethod, DisplayMode, HttpMethod, QueryConfig, ResultFormat};

const USER_AGENT: &str = concat!("shacl-kernel/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Executes one remote query under the current configuration and returns
/// the text to display. `seq` is the evaluation cycle's sequence number;
/// it tags logs and names per-cycle output files.
pub trait QueryExecutor {
    fn execute(&self, query: &str, seq: u64, cfg: &QueryConfig) -> Result<String>;
}

/// HTTP client for SPARQL endpoints.
pub struct SparqlClient {
    http: Client,
}

impl SparqlClient {
    pub fn new() -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { http })
    }

    fn build_request(&self, query: &str, cfg: &QueryConfig) -> Result<RequestBuilder> {
        let endpoint = cfg.endpoint.clone().ok_or_else(|| {
            KernelError::Precondition(
                "No endpoint configured. Use %endpoint to set one first.".to_string(),
            )
        })?;

        let full_query = format!("{}{}", cfg.preamble(), query);
        debug!(endpoint = %endpoint, method = %cfg.method, "sending query");

        let mut params: Vec<(&str, &str)> = vec![("query", &full_query)];
        if let Some(graph) = &cfg.default_graph {
            params.push(("default-graph-uri", graph));
        }
        for (name, value) in &cfg.query_params {
            params.push((name, value));
        }

        let mut request = match cfg.method {
            HttpMethod::Get => self.http.get(endpoint).query(&params),
            HttpMethod::Post => self.http.post(endpoint).form(&params),
        };

        request = request.header("Accept", cfg.format.accept());
        for (name, value) in &cfg.http_headers {
            request = request.header(name, value);
        }

        if let Some(auth) = &cfg.auth {
            match auth.method {
                AuthMethod::Basic => {
                    request = request.basic_auth(&auth.user, Some(&auth.password));
                }
                AuthMethod::Digest => {
                    return Err(KernelError::RemoteQuery(
                        "digest authentication is not supported; use basic".to_string(),
                    ));
                }
            }
        }

        Ok(request)
    }
}

impl QueryExecutor for SparqlClient {
    fn execute(&self, query: &str, seq: u64, cfg: &QueryConfig) -> Result<String> {
        let request = self.build_request(query, cfg)?;

        let response = request
            .send()
            .map_err(|err| KernelError::RemoteQuery(err.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .map_err(|err| KernelError::RemoteQuery(err.to_string()))?;

        if !status.is_success() {
            return Err(KernelError::RemoteQuery(format!(
                "endpoint returned {status}: {}",
                body.trim()
            )));
        }
        info!(seq, status = %status, bytes = body.len(), "query succeeded");

        if let Some(path) = &cfg.outfile {
            let path = outfile_path(path, seq);
            fs::write(&path, &body)
                .with_context(|| format!("failed to write results to {}", path.display()))?;
        }

        render_response(&body, cfg)
    }
}

/// Resolve the configured output file for one cycle: a `%d` in the file
/// name is replaced with the cycle sequence number.
fn outfile_path(configured: &std::path::Path, seq: u64) -> std::path::PathBuf {
    match configured.to_str() {
        Some(text) if text.contains("%d") => {
            std::path::PathBuf::from(text.replace("%d", &seq.to_string()))
        }
        _ => configured.to_path_buf(),
    }
}

/// Render the endpoint's response body according to the display mode.
///
/// Only JSON results have structure worth rendering; every other format
/// passes through verbatim.
pub fn render_response(body: &str, cfg: &QueryConfig) -> Result<String> {
    if cfg.display == DisplayMode::Raw || cfg.format != ResultFormat::Json {
        return Ok(body.to_string());
    }
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        // Endpoint ignored the Accept header; show what it sent.
        Err(_) => return Ok(body.to_string()),
    };

    if let Some(answer) = value.get("boolean").and_then(Value::as_bool) {
        return Ok(format!("Answer: {answer}"));
    }

    let vars: Vec<String> = value
        .pointer("/head/vars")
        .and_then(Value::as_array)
        .map(|vars| {
            vars.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    let bindings = value
        .pointer("/results/bindings")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    if vars.is_empty() {
        return Ok(body.to_string());
    }

    let rows: Vec<Vec<String>> = bindings
        .iter()
        .filter(|binding| row_matches_languages(binding, &cfg.languages))
        .map(|binding| {
            vars.iter()
                .map(|var| binding.get(var).map(render_term).unwrap_or_default())
                .collect()
        })
        .collect();

    let total = rows.len();
    let shown = cfg.result_limit.map_or(total, |limit| limit.min(total));
    let mut out = render_table(&vars, &rows[..shown]);
    if shown < total {
        out.push_str(&format!("\n({shown} of {total} rows shown)"));
    } else {
        out.push_str(&format!("\n({total} rows)"));
    }
    Ok(out)
}

/// A row passes if every lang-tagged literal in it uses a preferred
/// language. An empty preference list admits everything.
fn row_matches_languages(binding: &Value, languages: &[String]) -> bool {
    if languages.is_empty() {
        return true;
    }
    let Some(cells) = binding.as_object() else {
        return true;
    };
    cells.values().all(|cell| {
        match cell.get("xml:lang").and_then(Value::as_str) {
            Some(lang) => {
                let primary = lang.split('-').next().unwrap_or(lang);
                languages.iter().any(|pref| pref == primary)
            }
            None => true,
        }
    })
}

fn render_term(cell: &Value) -> String {
    let value = cell
        .get("value")
        .and_then(Value::as_str)
        .unwrap_or_default();
    match cell.get("type").and_then(Value::as_str) {
        Some("uri") => format!("<{value}>"),
        Some("bnode") => format!("_:{value}"),
        _ => value.to_string(),
    }
}

fn render_table(vars: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = vars.iter().map(String::len).collect();
    for row in rows {
        for (index, cell) in row.iter().enumerate() {
            widths[index] = widths[index].max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let header: Vec<String> = vars
        .iter()
        .enumerate()
        .map(|(index, var)| format!("{var:<width$}", width = widths[index]))
        .collect();
    out.push_str(&header.join(" | "));
    out.push('\n');
    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    out.push_str(&rule.join("-|-"));
    for row in rows {
        out.push('\n');
        let cells: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(index, cell)| format!("{cell:<width$}", width = widths[index]))
            .collect();
        out.push_str(&cells.join(" | "));
    }
    out
}

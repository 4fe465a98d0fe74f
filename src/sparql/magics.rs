//! Config magics: directive lines that mutate the [`QueryConfig`].
//!
//! Every handler returns notification text; nothing here fails a cycle.
//! Unrecognized names and malformed arguments both surface as
//! informational notifications so the rest of the cell keeps running.

use std::path::PathBuf;
use std::str::FromStr;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use url::Url;

use super::config::{Auth, AuthMethod, DEFAULT_TEXT_LANGUAGES, QueryConfig};

/// Argument synopsis and description per config magic, discovery order.
pub static MAGICS: Lazy<IndexMap<&'static str, (&'static str, &'static str)>> = Lazy::new(|| {
    IndexMap::from([
        ("%endpoint", ("<url>", "Set the SPARQL endpoint. Required before queries can run.")),
        ("%auth", ("basic|digest|none <user> <password>", "Set HTTP authentication for the endpoint.")),
        ("%qparam", ("<name> [<value>]", "Add (or, without a value, delete) a custom query parameter.")),
        ("%http_header", ("<name> [<value>]", "Add (or, without a value, delete) an HTTP request header.")),
        ("%prefix", ("<name> [<uri>]", "Set (or, without a URI, delete) a PREFIX sent with every query.")),
        ("%header", ("<line> | OFF", "Append a SPARQL header line, or OFF to remove them all.")),
        ("%graph", ("<uri>", "Set the default graph for queries.")),
        ("%format", ("JSON|XML|N3|CSV|TSV|ANY", "Set the requested result format.")),
        ("%display", ("raw|table|diagram", "Set how results are rendered.")),
        ("%lang", ("<lang> [...] | default | all", "Set the preferred language(s) for literals.")),
        ("%show", ("<n> | all", "Set the maximum number of result rows shown.")),
        ("%outfile", ("<file> | off", "Also write raw query results to a file.")),
        ("%log", ("critical|error|warning|info|debug", "Set the logging level.")),
        ("%method", ("get|post", "Set the HTTP method used for queries.")),
        ("%lsmagics", ("", "List all available magics.")),
    ])
});

/// Apply one config magic line to the configuration, returning the text
/// reported back to the user.
pub fn process_magic(line: &str, cfg: &mut QueryConfig) -> String {
    let mut tokens = line.split_whitespace();
    let name = tokens.next().unwrap_or_default().to_ascii_lowercase();
    let args: Vec<&str> = tokens.collect();

    match name.as_str() {
        "%endpoint" => set_endpoint(&args, cfg),
        "%auth" => set_auth(&args, cfg),
        "%qparam" => set_pair(&args, &mut cfg.query_params, "Query parameter", "%qparam"),
        "%http_header" => set_pair(&args, &mut cfg.http_headers, "HTTP header", "%http_header"),
        "%prefix" => set_pair(&args, &mut cfg.prefixes, "Prefix", "%prefix"),
        "%header" => set_header(&args, cfg),
        "%graph" => match args.first() {
            Some(uri) => {
                cfg.default_graph = Some((*uri).to_string());
                format!("Default graph: {uri}")
            }
            None => usage("%graph"),
        },
        "%format" => set_parsed(&args, "%format", "Result format", &mut cfg.format),
        "%display" => set_parsed(&args, "%display", "Display mode", &mut cfg.display),
        "%lang" => set_languages(&args, cfg),
        "%show" => set_result_limit(&args, cfg),
        "%outfile" => set_outfile(&args, cfg),
        "%log" => set_log_level(&args, cfg),
        "%method" => set_parsed(&args, "%method", "HTTP method", &mut cfg.method),
        "%lsmagics" => list_magics(),
        other => format!("Unknown magic command: {other}. Use %lsmagics to list available magics."),
    }
}

fn usage(name: &str) -> String {
    match MAGICS.get(name) {
        Some((args, help)) => format!("Usage: {name} {args}\n{help}"),
        None => format!("Unknown magic command: {name}."),
    }
}

fn set_endpoint(args: &[&str], cfg: &mut QueryConfig) -> String {
    let Some(raw) = args.first() else {
        return usage("%endpoint");
    };
    match Url::parse(raw) {
        Ok(url) => {
            let text = format!("Endpoint set to: {url}");
            cfg.endpoint = Some(url);
            text
        }
        Err(err) => format!("Invalid endpoint URL {raw}: {err}"),
    }
}

fn set_auth(args: &[&str], cfg: &mut QueryConfig) -> String {
    match args {
        ["none"] => {
            cfg.auth = None;
            "Authentication disabled.".to_string()
        }
        [method, user, password] => match AuthMethod::from_str(method) {
            Ok(method) => {
                cfg.auth = Some(Auth {
                    method,
                    user: (*user).to_string(),
                    password: (*password).to_string(),
                });
                format!("Authentication: {method}, user {user}")
            }
            Err(_) => usage("%auth"),
        },
        _ => usage("%auth"),
    }
}

fn set_pair(
    args: &[&str],
    map: &mut IndexMap<String, String>,
    what: &str,
    magic: &str,
) -> String {
    match args {
        [name] => {
            if map.shift_remove(*name).is_some() {
                format!("{what} deleted: {name}")
            } else {
                format!("{what} not set: {name}")
            }
        }
        [name, value] => {
            map.insert((*name).to_string(), (*value).to_string());
            format!("{what} set: {name} = {value}")
        }
        _ => usage(magic),
    }
}

fn set_header(args: &[&str], cfg: &mut QueryConfig) -> String {
    if args.is_empty() {
        return usage("%header");
    }
    if args.len() == 1 && args[0].eq_ignore_ascii_case("off") {
        cfg.header_lines.clear();
        return "Header lines removed.".to_string();
    }
    let line = args.join(" ");
    cfg.header_lines.push(line.clone());
    format!("Header line added: {line}")
}

fn set_parsed<T>(args: &[&str], magic: &str, what: &str, slot: &mut T) -> String
where
    T: FromStr + std::fmt::Display,
{
    let Some(raw) = args.first() else {
        return usage(magic);
    };
    match T::from_str(raw) {
        Ok(value) => {
            *slot = value;
            format!("{what}: {slot}")
        }
        Err(_) => usage(magic),
    }
}

fn set_languages(args: &[&str], cfg: &mut QueryConfig) -> String {
    if args.is_empty() {
        return usage("%lang");
    }
    cfg.languages = match args {
        ["default"] => DEFAULT_TEXT_LANGUAGES
            .iter()
            .map(|lang| (*lang).to_string())
            .collect(),
        ["all"] => Vec::new(),
        langs => langs.iter().map(|lang| (*lang).to_string()).collect(),
    };
    if cfg.languages.is_empty() {
        "Preferred languages: all".to_string()
    } else {
        format!("Preferred languages: {}", cfg.languages.join(", "))
    }
}

fn set_result_limit(args: &[&str], cfg: &mut QueryConfig) -> String {
    match args.first() {
        Some(raw) if raw.eq_ignore_ascii_case("all") => {
            cfg.result_limit = None;
            "Result limit: all rows shown.".to_string()
        }
        Some(raw) => match raw.parse::<usize>() {
            Ok(limit) => {
                cfg.result_limit = Some(limit);
                format!("Result limit: {limit} rows.")
            }
            Err(_) => usage("%show"),
        },
        None => usage("%show"),
    }
}

fn set_outfile(args: &[&str], cfg: &mut QueryConfig) -> String {
    match args.first() {
        Some(raw) if raw.eq_ignore_ascii_case("off") => {
            cfg.outfile = None;
            "Output file disabled.".to_string()
        }
        Some(raw) => {
            cfg.outfile = Some(PathBuf::from(raw));
            format!("Output file: {raw}")
        }
        None => usage("%outfile"),
    }
}

fn set_log_level(args: &[&str], cfg: &mut QueryConfig) -> String {
    const LEVELS: &[&str] = &["critical", "error", "warning", "info", "debug"];
    let Some(raw) = args.first() else {
        return usage("%log");
    };
    let level = raw.to_ascii_lowercase();
    if !LEVELS.contains(&level.as_str()) {
        return usage("%log");
    }
    if let Err(err) = crate::logging::set_level(&level) {
        return format!("Failed to set logging level: {err}");
    }
    cfg.log_level = level.clone();
    tracing::info!(level = %level, "log level changed by magic");
    format!("Logging level: {level}")
}

fn list_magics() -> String {
    let mut out = String::from("Available magics:\n");
    for (name, (args, _)) in MAGICS.iter() {
        out.push_str(&format!("  {name} {args}\n"));
    }
    out
}

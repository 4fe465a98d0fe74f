//! Startup configuration: CLI arguments merged over an optional YAML/JSON
//! config file. This seeds the session; everything here can still be
//! changed at runtime through config magics.

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

use crate::router::Kernel;
use crate::shacl::InferenceMode;
use crate::sparql::{DisplayMode, HttpMethod, ResultFormat};

/// Resolved startup configuration.
#[derive(Debug, Clone)]
pub struct KernelConfig {
    pub endpoint: Option<Url>,
    pub format: ResultFormat,
    pub display: DisplayMode,
    pub method: HttpMethod,
    pub result_limit: Option<usize>,
    pub languages: Option<Vec<String>>,
    pub inference: InferenceMode,
}

impl KernelConfig {
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let CliArgs {
            config,
            endpoint: cli_endpoint,
            format: cli_format,
            display: cli_display,
            method: cli_method,
            result_limit: cli_result_limit,
            languages: cli_languages,
            inference: cli_inference,
        } = args;

        let file_config = if let Some(path) = config.as_ref() {
            load_config_file(path)?
        } else {
            PartialConfig::default()
        };

        let PartialConfig {
            endpoint: file_endpoint,
            format: file_format,
            display: file_display,
            method: file_method,
            result_limit: file_result_limit,
            languages: file_languages,
            inference: file_inference,
        } = file_config;

        Ok(Self {
            endpoint: cli_endpoint.or(file_endpoint),
            format: cli_format.or(file_format).unwrap_or_default(),
            display: cli_display.or(file_display).unwrap_or_default(),
            method: cli_method.or(file_method).unwrap_or_default(),
            result_limit: cli_result_limit.or(file_result_limit),
            languages: cli_languages.or(file_languages),
            inference: cli_inference.or(file_inference).unwrap_or_default(),
        })
    }

    /// Seed a fresh kernel's runtime state from this configuration.
    pub fn apply(&self, kernel: &mut Kernel) {
        kernel.set_inference(self.inference);
        let cfg = kernel.query_config_mut();
        cfg.endpoint = self.endpoint.clone();
        cfg.format = self.format;
        cfg.display = self.display;
        cfg.method = self.method;
        cfg.result_limit = self.result_limit;
        if let Some(languages) = &self.languages {
            cfg.languages = languages.clone();
        }
    }
}

#[derive(Parser, Debug, Default, Clone)]
#[command(name = "shacl-kernel", about = "SHACL validation kernel with SPARQL support", version)]
pub struct CliArgs {
    #[arg(
        long,
        value_name = "FILE",
        help = "Path to a configuration file (YAML or JSON)",
        global = true
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        env = "SHACL_KERNEL_ENDPOINT",
        value_name = "URL",
        help = "Default SPARQL endpoint"
    )]
    pub endpoint: Option<Url>,

    #[arg(
        long,
        env = "SHACL_KERNEL_FORMAT",
        value_name = "FORMAT",
        help = "Default result format (json, xml, n3, csv, tsv, any)",
        value_parser = parse_format
    )]
    pub format: Option<ResultFormat>,

    #[arg(
        long,
        env = "SHACL_KERNEL_DISPLAY",
        value_name = "MODE",
        help = "Default display mode (raw, table, diagram)",
        value_parser = parse_display
    )]
    pub display: Option<DisplayMode>,

    #[arg(
        long,
        env = "SHACL_KERNEL_METHOD",
        value_name = "METHOD",
        help = "Default HTTP method for queries (get, post)",
        value_parser = parse_method
    )]
    pub method: Option<HttpMethod>,

    #[arg(
        long,
        env = "SHACL_KERNEL_RESULT_LIMIT",
        value_name = "N",
        help = "Maximum number of result rows shown",
        value_parser = clap::value_parser!(usize)
    )]
    pub result_limit: Option<usize>,

    #[arg(
        long,
        env = "SHACL_KERNEL_LANGUAGES",
        value_name = "LANG",
        value_delimiter = ',',
        help = "Comma-separated preferred literal languages"
    )]
    pub languages: Option<Vec<String>>,

    #[arg(
        long,
        env = "SHACL_KERNEL_INFERENCE",
        value_name = "MODE",
        help = "Inference applied before validation (rdfs, none)",
        value_parser = parse_inference
    )]
    pub inference: Option<InferenceMode>,
}

fn parse_format(raw: &str) -> Result<ResultFormat, strum::ParseError> {
    raw.parse()
}

fn parse_display(raw: &str) -> Result<DisplayMode, strum::ParseError> {
    raw.parse()
}

fn parse_method(raw: &str) -> Result<HttpMethod, strum::ParseError> {
    raw.parse()
}

fn parse_inference(raw: &str) -> Result<InferenceMode, strum::ParseError> {
    raw.parse()
}

#[derive(Debug, Default, Deserialize)]
struct PartialConfig {
    endpoint: Option<Url>,
    format: Option<ResultFormat>,
    display: Option<DisplayMode>,
    method: Option<HttpMethod>,
    result_limit: Option<usize>,
    languages: Option<Vec<String>>,
    inference: Option<InferenceMode>,
}

fn load_config_file(path: &Path) -> Result<PartialConfig> {
    if !path.exists() {
        anyhow::bail!("config file {:?} does not exist", path);
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {:?}", path))?;
    let ext = path
        .extension()
        .and_then(|os| os.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let parsed = match ext.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse YAML config {:?}", path))?,
        "json" => serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse JSON config {:?}", path))?,
        other => anyhow::bail!("unsupported config extension: {other}"),
    };
    Ok(parsed)
}

use anyhow::{Context, Result, anyhow};
use url::Url;

use crate::cli::Cli;

const DEFAULT_ES_HOST: &str = "localhost";
const DEFAULT_ES_PORT: u16 = 9200;

/// Everything a sync run needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub content_type: String,
    pub environment: String,
    pub index_name: String,
    pub locale: Option<String>,
    pub verbose: bool,
    pub summary: bool,
    pub quiet: bool,
    pub create_index: bool,
    pub reset: bool,
    pub source: SourceSettings,
    pub destination: DestinationSettings,
}

#[derive(Debug, Clone)]
pub struct SourceSettings {
    pub space_id: Option<String>,
    pub access_token: Option<String>,
    pub host: String,
}

#[derive(Debug, Clone)]
pub struct DestinationSettings {
    /// Scheme, host and port only; credentials are split out below.
    pub url: Url,
    pub username: Option<String>,
    pub password: Option<String>,
    pub compress: bool,
}

impl RunConfig {
    /// Names of the connection settings that were not supplied.
    ///
    /// Absence is only reported, a missing credential surfaces later as a
    /// failed capability check.
    pub fn missing_settings(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.source.space_id.as_deref().is_none_or(str::is_empty) {
            missing.push("CONTENTFUL_SPACE_ID");
        }
        if self.source.access_token.as_deref().is_none_or(str::is_empty) {
            missing.push("CONTENTFUL_ACCESS_TOKEN");
        }
        missing
    }
}

/// Turn parsed CLI arguments (already merged with the environment) into a `RunConfig`.
pub fn resolve_config(args: Cli) -> Result<RunConfig> {
    let destination = resolve_destination(&args)?;

    let index_name = match &args.index {
        Some(name) => name.clone(),
        None => default_index_name(&args.index_prefix, &args.environment, &args.content_type),
    };
    log::debug!("Resolved index name: {}", index_name);

    Ok(RunConfig {
        content_type: args.content_type,
        environment: args.environment,
        index_name,
        locale: args.locale,
        verbose: args.verbose,
        summary: args.summary,
        quiet: args.quiet,
        create_index: !args.no_create_index,
        reset: args.reset,
        source: SourceSettings {
            space_id: args.space_id,
            access_token: args.access_token,
            host: args.contentful_host,
        },
        destination,
    })
}

fn resolve_destination(args: &Cli) -> Result<DestinationSettings> {
    let input_url = match &args.es_url {
        Some(raw) => Url::parse(raw).context("Failed to parse Elasticsearch URL")?,
        None => {
            let host = args.es_host.as_deref().unwrap_or(DEFAULT_ES_HOST);
            let port = args.es_port.unwrap_or(DEFAULT_ES_PORT);
            Url::parse(&format!("http://{}:{}", host, port))
                .with_context(|| format!("Invalid Elasticsearch host: {}", host))?
        }
    };
    log::debug!("Parsed Elasticsearch URL: {}", input_url);

    let host_str = input_url
        .host_str()
        .ok_or_else(|| anyhow!("No host in Elasticsearch URL"))?;
    let port_str = input_url
        .port()
        .map_or("".to_string(), |p| format!(":{}", p));
    let url = Url::parse(&format!("{}://{}{}", input_url.scheme(), host_str, port_str))?;

    // Priority: Flags > URL > None
    let url_username = input_url.username();
    let username = args
        .username
        .as_deref()
        .or_else(|| (!url_username.is_empty()).then_some(url_username))
        .map(|s| s.to_string());
    let password = args
        .password
        .as_deref()
        .or(input_url.password())
        .map(|s| s.to_string());

    Ok(DestinationSettings {
        url,
        username,
        password,
        compress: args.es_compress,
    })
}

/// `{prefix}-{environment}-{content_type}`, normalized.
pub fn default_index_name(prefix: &str, environment: &str, content_type: &str) -> String {
    normalize_index_name(&format!("{}-{}-{}", prefix, environment, content_type))
}

/// Lowercase, dash-separated form of `name`.
///
/// camelCase boundaries and any non-alphanumeric character become a single
/// dash; leading and trailing dashes are dropped.
pub fn normalize_index_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 8);
    let mut prev: Option<char> = None;

    for c in name.chars() {
        if c.is_alphanumeric() {
            let boundary = c.is_uppercase()
                && prev.is_some_and(|p| p.is_lowercase() || p.is_ascii_digit());
            if boundary && !out.ends_with('-') {
                out.push('-');
            }
            out.extend(c.to_lowercase());
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
        prev = Some(c);
    }

    while out.ends_with('-') {
        out.pop();
    }
    out
}

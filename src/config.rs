#![forbid(unsafe_code)]

//! Runtime configuration: listen address plus the upstream endpoints the
//! source adapters talk to.
//!
//! Values are resolved from CLI overrides first, then the process
//! environment, then a `.env` file, then built-in defaults.

use anyhow::{Context, Result, bail};
use std::{
    collections::HashMap,
    env, fs,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

pub const DEFAULT_ENV_PATH: &str = ".env";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 8;
pub const DEFAULT_MAX_FORMATS: usize = 10;
pub const DEFAULT_EMBED_BASE: &str = "https://www.youtube.com";
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Public Invidious instances queried in order by the mirror adapter.
pub const DEFAULT_MIRROR_INSTANCES: &[&str] = &[
    "https://inv.riverside.rocks",
    "https://invidious.private.coffee",
    "https://vid.puffyan.us",
    "https://yt.artemislena.eu",
];

/// Immutable upstream settings shared by every adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    pub mirror_instances: Vec<String>,
    pub embed_base: String,
    pub request_timeout: Duration,
    pub user_agent: String,
    pub max_formats: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            mirror_instances: DEFAULT_MIRROR_INSTANCES
                .iter()
                .map(|instance| instance.to_string())
                .collect(),
            embed_base: DEFAULT_EMBED_BASE.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_formats: DEFAULT_MAX_FORMATS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub host: String,
    pub port: u16,
    pub sources: SourceConfig,
}

pub fn load_runtime_config() -> Result<RuntimeConfig> {
    resolve_runtime_config(RuntimeOverrides::default())
}

#[derive(Debug, Clone, Default)]
pub struct RuntimeOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub mirror_instances: Option<Vec<String>>,
    pub embed_base: Option<String>,
    pub timeout_secs: Option<u64>,
    pub env_path: Option<PathBuf>,
}

pub fn resolve_runtime_config(overrides: RuntimeOverrides) -> Result<RuntimeConfig> {
    let env_path = overrides
        .env_path
        .as_deref()
        .unwrap_or_else(|| Path::new(DEFAULT_ENV_PATH));
    let file_vars = read_env_file(env_path)?;
    build_runtime_config_with_overrides(&file_vars, process_env, overrides)
}

#[cfg(test)]
fn build_runtime_config(
    file_vars: &HashMap<String, String>,
    env_lookup: impl Fn(&str) -> Option<String>,
) -> Result<RuntimeConfig> {
    build_runtime_config_with_overrides(file_vars, env_lookup, RuntimeOverrides::default())
}

const HOST_KEY: &str = "YTDOWN_HOST";
const PORT_KEY: &str = "YTDOWN_PORT";
const MIRRORS_KEY: &str = "YTDOWN_MIRRORS";
const EMBED_BASE_KEY: &str = "YTDOWN_EMBED_BASE";
const TIMEOUT_KEY: &str = "YTDOWN_TIMEOUT_SECS";
const MAX_FORMATS_KEY: &str = "YTDOWN_MAX_FORMATS";

/// `YTDOWN_*` values with the process environment layered over the `.env`
/// file. Blank values on either side count as unset.
struct Settings<'a, F> {
    file_vars: &'a HashMap<String, String>,
    env_lookup: F,
}

impl<F: Fn(&str) -> Option<String>> Settings<'_, F> {
    fn text(&self, key: &str) -> Option<String> {
        let trimmed = |value: String| {
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_string())
        };
        (self.env_lookup)(key)
            .and_then(trimmed)
            .or_else(|| self.file_vars.get(key).cloned().and_then(trimmed))
    }

    /// Unparseable values are ignored.
    fn lenient<T: FromStr>(&self, key: &str) -> Option<T> {
        self.text(key).and_then(|value| value.parse::<T>().ok())
    }

    /// Unparseable values are an error.
    fn strict<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        self.text(key)
            .map(|raw| {
                raw.parse::<T>()
                    .with_context(|| format!("{key} has an invalid value: {raw}"))
            })
            .transpose()
    }

    fn base_urls(&self, key: &str) -> Option<Vec<String>> {
        self.text(key)
            .map(|raw| normalize_base_urls(raw.split(',').map(str::to_string)))
    }
}

fn build_runtime_config_with_overrides(
    file_vars: &HashMap<String, String>,
    env_lookup: impl Fn(&str) -> Option<String>,
    overrides: RuntimeOverrides,
) -> Result<RuntimeConfig> {
    let settings = Settings {
        file_vars,
        env_lookup,
    };

    let host = overrides
        .host
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .or_else(|| settings.text(HOST_KEY))
        .unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = overrides
        .port
        .or_else(|| settings.lenient::<u16>(PORT_KEY))
        .unwrap_or(DEFAULT_PORT);

    let mirror_instances = overrides
        .mirror_instances
        .filter(|list| !list.is_empty())
        .map(normalize_base_urls)
        .or_else(|| settings.base_urls(MIRRORS_KEY))
        .unwrap_or_else(|| SourceConfig::default().mirror_instances);
    let embed_base = overrides
        .embed_base
        .map(|value| normalize_base_urls([value]))
        .or_else(|| settings.base_urls(EMBED_BASE_KEY))
        .and_then(|urls| urls.into_iter().next())
        .unwrap_or_else(|| DEFAULT_EMBED_BASE.to_string());

    let timeout_secs = match overrides.timeout_secs {
        Some(value) => value,
        None => settings.strict::<u64>(TIMEOUT_KEY)?.unwrap_or(DEFAULT_TIMEOUT_SECS),
    };
    if timeout_secs == 0 {
        bail!("request timeout must be greater than zero seconds");
    }

    let max_formats = settings
        .lenient::<usize>(MAX_FORMATS_KEY)
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_MAX_FORMATS);

    Ok(RuntimeConfig {
        host,
        port,
        sources: SourceConfig {
            mirror_instances,
            embed_base,
            request_timeout: Duration::from_secs(timeout_secs),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_formats,
        },
    })
}

fn normalize_base_urls(values: impl IntoIterator<Item = String>) -> Vec<String> {
    values
        .into_iter()
        .map(|value| value.trim().trim_end_matches('/').to_string())
        .filter(|value| !value.is_empty())
        .collect()
}

fn process_env(key: &str) -> Option<String> {
    env::var(key).ok()
}

/// Reads `KEY=value` pairs from a dotenv-style file. A missing file yields an
/// empty map.
pub fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("Reading {}", path.display()))?;
    Ok(content
        .lines()
        .filter_map(parse_env_line)
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect())
}

/// Splits one line into key and value. Comments, blank lines, and lines
/// without `=` yield `None`; an `export ` prefix and one layer of matching
/// quotes are stripped.
fn parse_env_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.starts_with('#') {
        return None;
    }
    let line = line.strip_prefix("export ").unwrap_or(line);
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    let value = value.trim();
    let unquoted = ['"', '\'']
        .iter()
        .find_map(|quote| value.strip_prefix(*quote)?.strip_suffix(*quote))
        .unwrap_or(value);
    Some((key, unquoted))
}

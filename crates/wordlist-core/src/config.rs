//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` + `config.<env>.toml`
//! + `APP_*` env vars (`APP_INDEXER__SNIPPET_RADIUS=60` sets `indexer.snippet_radius`).
//! Provides helpers to expand `~` and `${VAR}` and to resolve relative paths
//! against a known base directory.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Spans whose whole content is left out of the word list: footnotes,
/// cross references, alternate/published verse and chapter numbers, added words.
pub const DEFAULT_DROP_SPANS: &[&str] = &["f", "fe", "x", "va", "vp", "ca", "add", "addpn"];
pub const DEFAULT_SNIPPET_RADIUS: usize = 40;
pub const DEFAULT_CLOUD_LIMIT: usize = 150;

/// What to do with a drop-content span whose closing marker never appears.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnclosedSpanPolicy {
    /// Skip only the opening marker and index the text after it.
    #[default]
    KeepContent,
    /// Treat the rest of the verse as part of the span.
    DropToEnd,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerSettings {
    pub snippet_radius: usize,
    pub drop_spans: Vec<String>,
    pub skip_attributes: bool,
    pub unclosed_spans: UnclosedSpanPolicy,
    pub cloud_limit: usize,
}

impl Default for IndexerSettings {
    fn default() -> Self {
        Self {
            snippet_radius: DEFAULT_SNIPPET_RADIUS,
            drop_spans: DEFAULT_DROP_SPANS.iter().map(|s| s.to_string()).collect(),
            skip_attributes: true,
            unclosed_spans: UnclosedSpanPolicy::KeepContent,
            cloud_limit: DEFAULT_CLOUD_LIMIT,
        }
    }
}

impl IndexerSettings {
    pub fn validate(&self) -> Result<()> {
        for name in &self.drop_spans {
            let ok = !name.is_empty()
                && name.chars().next().is_some_and(|c| c.is_ascii_lowercase())
                && name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
            if !ok {
                return Err(Error::InvalidConfig(format!("drop span '{}' is not a USFM marker name", name)));
            }
        }
        if self.cloud_limit == 0 {
            return Err(Error::InvalidConfig("cloud_limit must be at least 1".to_string()));
        }
        Ok(())
    }
}

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Self::defaults().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.validate_for_env(&env_name)?;
        Ok(config)
    }

    /// Build from an explicit figment layered over the built-in defaults.
    pub fn from_provider(provider: Figment) -> anyhow::Result<Self> {
        let config = Self { figment: Self::defaults().merge(provider) };
        config.indexer_settings()?;
        Ok(config)
    }

    fn defaults() -> Figment {
        Figment::new().merge(Serialized::default("indexer", IndexerSettings::default()))
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    pub fn indexer_settings(&self) -> anyhow::Result<IndexerSettings> {
        let settings: IndexerSettings = self.get("indexer")?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate_for_env(&self, env: &str) -> anyhow::Result<()> {
        let settings = self.indexer_settings()?;
        match env {
            "prod" | "production" if settings.unclosed_spans == UnclosedSpanPolicy::DropToEnd => {
                tracing::warn!("indexer.unclosed_spans = drop_to_end can hide whole verses on malformed input");
            }
            _ => {}
        }
        Ok(())
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

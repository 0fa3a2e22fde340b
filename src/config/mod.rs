// src/config/mod.rs
//! Application configuration: defaults, then an optional TOML file, then
//! environment overrides (`.env` is loaded by the binary beforehand).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;

use crate::retry::Backoff;

pub const ENV_CONFIG_PATH: &str = "IDEA_INBOX_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/idea_inbox.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Supabase,
    File,
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "supabase" => Ok(StoreBackend::Supabase),
            "file" | "json" => Ok(StoreBackend::File),
            "memory" | "mem" => Ok(StoreBackend::Memory),
            other => Err(anyhow!("unsupported store backend '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub supabase_url: Option<String>,
    pub supabase_key: Option<String>,
    pub table: String,
    pub file_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::File,
            supabase_url: None,
            supabase_key: None,
            table: "ideas".to_string(),
            file_path: PathBuf::from("data/idea_vault.json"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub max_attempts: u32,
    /// Base delay of the exponential persist backoff; 0 disables waiting.
    pub backoff_ms: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_ms: 500,
        }
    }
}

impl IngestConfig {
    pub fn backoff(&self) -> Backoff {
        if self.backoff_ms == 0 {
            Backoff::None
        } else {
            Backoff::Exponential {
                base_ms: self.backoff_ms,
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            connect_timeout_secs: 4,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub reddit_subreddit: String,
    pub producthunt_api_key: Option<String>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            reddit_subreddit: "startups".to_string(),
            producthunt_api_key: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub bind_addr: String,
    /// Attached to every idea as its owner (`USER_ID`).
    pub owner: Option<String>,
    pub log_format: LogFormat,
    pub store: StoreConfig,
    pub ingest: IngestConfig,
    pub http: HttpConfig,
    pub providers: ProvidersConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5000".to_string(),
            owner: None,
            log_format: LogFormat::default(),
            store: StoreConfig::default(),
            ingest: IngestConfig::default(),
            http: HttpConfig::default(),
            providers: ProvidersConfig::default(),
        }
    }
}

impl AppConfig {
    /// Parse a TOML config file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    /// Resolve configuration:
    /// 1) $IDEA_INBOX_CONFIG (must exist when set)
    /// 2) config/idea_inbox.toml
    /// 3) built-in defaults
    ///
    /// then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                bail!("{ENV_CONFIG_PATH} points to non-existent path {}", pb.display());
            }
            Self::load_from(&pb)?
        } else {
            let default = PathBuf::from(DEFAULT_CONFIG_PATH);
            if default.exists() {
                Self::load_from(&default)?
            } else {
                Self::default()
            }
        };
        cfg.apply_env(|k| std::env::var(k).ok())?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Overlay values from `lookup` (normally the process environment).
    /// Empty values count as unset.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(v) = get("BIND_ADDR") {
            self.bind_addr = v;
        }
        if let Some(v) = get("USER_ID") {
            self.owner = Some(v);
        }
        if let Some(v) = get("LOG_FORMAT") {
            self.log_format = if v.eq_ignore_ascii_case("json") {
                LogFormat::Json
            } else {
                LogFormat::Compact
            };
        }
        if let Some(v) = get("STORE_BACKEND") {
            self.store.backend = v.parse()?;
        }
        if let Some(v) = get("SUPABASE_URL") {
            self.store.supabase_url = Some(v);
        }
        if let Some(v) = get("SUPABASE_KEY") {
            self.store.supabase_key = Some(v);
        }
        if let Some(v) = get("SUPABASE_TABLE") {
            self.store.table = v;
        }
        if let Some(v) = get("IDEA_VAULT_PATH") {
            self.store.file_path = PathBuf::from(v);
        }
        if let Some(v) = get("PERSIST_MAX_ATTEMPTS") {
            self.ingest.max_attempts = v
                .parse()
                .with_context(|| format!("PERSIST_MAX_ATTEMPTS='{v}'"))?;
        }
        if let Some(v) = get("PERSIST_BACKOFF_MS") {
            self.ingest.backoff_ms = v
                .parse()
                .with_context(|| format!("PERSIST_BACKOFF_MS='{v}'"))?;
        }
        if let Some(v) = get("HTTP_TIMEOUT_SECS") {
            self.http.timeout_secs = v
                .parse()
                .with_context(|| format!("HTTP_TIMEOUT_SECS='{v}'"))?;
        }
        if let Some(v) = get("REDDIT_SUBREDDIT") {
            self.providers.reddit_subreddit = v;
        }
        if let Some(v) = get("PH_API_KEY") {
            self.providers.producthunt_api_key = Some(v);
        }
        Ok(())
    }

    /// Clamp numeric knobs and reject unusable store settings.
    pub fn validate(&mut self) -> Result<()> {
        self.ingest.max_attempts = self.ingest.max_attempts.max(1);
        self.http.timeout_secs = self.http.timeout_secs.max(1);
        self.http.connect_timeout_secs = self.http.connect_timeout_secs.max(1);
        if self.store.backend == StoreBackend::Supabase
            && (self.store.supabase_url.is_none() || self.store.supabase_key.is_none())
        {
            bail!("STORE_BACKEND=supabase requires SUPABASE_URL and SUPABASE_KEY");
        }
        Ok(())
    }
}

//! Runtime configuration: defaults, then an optional TOML file, then
//! `ROSTER_`-prefixed environment variables.
//!
//! Nested keys use `__` in the environment, e.g.
//! `ROSTER_ENRICHMENT__TTL_SECS=3600`.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::{Context as _, ensure};
use config::{Config, ConfigBuilder, Environment, File, builder::DefaultState};
use roster_enrich::{Endpoints, Url};
use serde::Deserialize;

/// Where lookup responses are cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
  /// The `lookup_cache` table next to the records.
  Sqlite,
  /// A process-local map; lost on restart.
  Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnrichmentConfig {
  pub age_url:         String,
  pub gender_url:      String,
  pub nationality_url: String,
  pub ttl_secs:        u64,
  pub timeout_secs:    u64,
}

impl EnrichmentConfig {
  pub fn endpoints(&self) -> anyhow::Result<Endpoints> {
    let parse = |key: &str, raw: &str| {
      Url::parse(raw).with_context(|| format!("enrichment.{key} is not a valid URL: {raw:?}"))
    };
    Ok(Endpoints {
      age:         parse("age_url", &self.age_url)?,
      gender:      parse("gender_url", &self.gender_url)?,
      nationality: parse("nationality_url", &self.nationality_url)?,
    })
  }

  pub fn ttl(&self) -> Duration { Duration::from_secs(self.ttl_secs) }

  pub fn timeout(&self) -> Duration { Duration::from_secs(self.timeout_secs) }
}

/// Runtime server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  pub cache:      CacheBackend,
  pub enrichment: EnrichmentConfig,
}

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// A builder preloaded with every default.
fn defaults() -> anyhow::Result<ConfigBuilder<DefaultState>> {
  Ok(
    Config::builder()
      .set_default("host", "0.0.0.0")?
      .set_default("port", 8080)?
      .set_default("store_path", "roster.db")?
      .set_default("cache", "sqlite")?
      .set_default("enrichment.age_url", "https://api.agify.io/")?
      .set_default("enrichment.gender_url", "https://api.genderize.io/")?
      .set_default("enrichment.nationality_url", "https://api.nationalize.io/")?
      .set_default("enrichment.ttl_secs", 86_400)?
      .set_default("enrichment.timeout_secs", 10)?,
  )
}

fn finish(builder: ConfigBuilder<DefaultState>) -> anyhow::Result<ServerConfig> {
  let cfg: ServerConfig = builder
    .build()
    .context("failed to read configuration")?
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  ensure!(cfg.enrichment.ttl_secs > 0, "enrichment.ttl_secs must be positive");
  ensure!(cfg.enrichment.timeout_secs > 0, "enrichment.timeout_secs must be positive");
  Ok(cfg)
}

/// Load configuration from `path` (if it exists) and the environment.
pub fn load(path: &Path) -> anyhow::Result<ServerConfig> {
  finish(
    defaults()?
      .add_source(File::from(path).required(false))
      .add_source(
        Environment::with_prefix("ROSTER")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true),
      ),
  )
}

//! roster-server binary.
//!
//! Reads `roster.toml` (or the path given with `--config`), opens the SQLite
//! store, wires the enrichment lookups and serves the JSON API over HTTP.

mod settings;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::Context as _;
use axum::Router;
use clap::Parser;
use roster_api::PeopleService;
use roster_core::cache::CacheStore;
use roster_enrich::{Endpoints, Enricher, HttpUpstream, LookupClient, MemoryCache};
use roster_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use settings::CacheBackend;

#[derive(Parser)]
#[command(author, version, about = "Roster person registry server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "roster.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let cfg = settings::load(&cli.config)?;

  // Expand `~` in store path.
  let store_path = expand_tilde(&cfg.store_path);

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let upstream = HttpUpstream::new(cfg.enrichment.timeout())
    .context("failed to build HTTP client")?;
  let endpoints = cfg.enrichment.endpoints()?;
  let ttl = cfg.enrichment.ttl();

  let app = match cfg.cache {
    CacheBackend::Sqlite => {
      let cache = Arc::new(store.lookup_cache());
      build_app(store, cache, upstream, endpoints, ttl)
    }
    CacheBackend::Memory => build_app(store, Arc::new(MemoryCache::new()), upstream, endpoints, ttl),
  };

  let address = cfg.address();
  tracing::info!(cache = ?cfg.cache, store = ?store_path, "Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  tracing::info!("server stopped");
  Ok(())
}

/// Assemble the API over `store` with lookups cached in `cache`.
fn build_app<C: CacheStore + 'static>(
  store:     SqliteStore,
  cache:     Arc<C>,
  upstream:  HttpUpstream,
  endpoints: Endpoints,
  ttl:       Duration,
) -> Router {
  let enricher = Enricher::new(LookupClient::new(cache, upstream), endpoints).with_ttl(ttl);
  let service = PeopleService::new(Arc::new(store), Arc::new(enricher));
  roster_api::api_router(Arc::new(service)).layer(TraceLayer::new_for_http())
}

/// Resolve on Ctrl+C. In-flight requests are allowed to finish.
async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::warn!(error = %e, "failed to listen for Ctrl+C");
    std::future::pending::<()>().await;
  }
  tracing::info!("shutdown requested");
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn tilde_expansion_only_touches_a_leading_home_prefix() {
    assert_eq!(expand_tilde(Path::new("/var/lib/roster.db")), PathBuf::from("/var/lib/roster.db"));
    assert_eq!(expand_tilde(Path::new("data/~/roster.db")), PathBuf::from("data/~/roster.db"));
    if let Ok(home) = std::env::var("HOME") {
      assert_eq!(expand_tilde(Path::new("~/roster.db")), PathBuf::from(home).join("roster.db"));
    }
  }

  #[test]
  fn cli_defaults_to_roster_toml() {
    let cli = Cli::parse_from(["roster-server"]);
    assert_eq!(cli.config, PathBuf::from("roster.toml"));

    let cli = Cli::parse_from(["roster-server", "--config", "/etc/roster.toml"]);
    assert_eq!(cli.config, PathBuf::from("/etc/roster.toml"));
  }
}

//! matric-api server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens the
//! SQLite store and the uploads directory, optionally seeds the
//! certificate catalog, and serves the admission API over HTTP.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use matric_api::{AppState, ServerConfig, seed::seed_catalog};
use matric_core::service::{AdmissionService, UploadPolicy};
use matric_files::FsDocumentStore;
use matric_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "matric admission API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
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

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("MATRIC"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Open the database and the uploads directory.
  let store = SqliteStore::open(&server_cfg.database_path)
    .await
    .with_context(|| {
      format!("failed to open store at {:?}", server_cfg.database_path)
    })?;
  let files = FsDocumentStore::open(&server_cfg.uploads_dir)
    .await
    .with_context(|| {
      format!("failed to open uploads dir {:?}", server_cfg.uploads_dir)
    })?;

  if let Some(catalog_path) = &server_cfg.catalog_path {
    seed_catalog(&store, catalog_path).await?;
  }

  // Build application state.
  let service = AdmissionService::new(
    Arc::new(store),
    Arc::new(files),
    UploadPolicy {
      default_max_size_bytes: server_cfg.max_upload_bytes,
    },
  );
  let state = AppState {
    service: Arc::new(service),
    config:  Arc::new(server_cfg.clone()),
  };

  let app = matric_api::router(state).layer(TraceLayer::new_for_http());
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

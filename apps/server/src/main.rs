use std::{env, net::SocketAddr, path::PathBuf, sync::Arc};

use agrisync_core::{AppConfig, Core};
use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

mod auth;
mod error;
mod logging;
mod routes;
mod utils;

/// Sync and audit anchoring server for agrisync field devices
#[derive(Debug, Parser)]
#[command(name = "agrisync-server", version)]
struct Args {
	/// Directory holding `agrisync.json`, the database and logs
	#[arg(long, env = "DATA_DIR")]
	data_dir: Option<PathBuf>,

	/// Port to listen on; the bind address comes from the config file
	#[arg(long, env = "PORT")]
	port: Option<u16>,

	/// Database URL, overriding the SQLite file in the data directory
	#[arg(long, env = "AGRISYNC_DATABASE_URL")]
	database_url: Option<String>,

	#[arg(long, env = "AGRISYNC_S3_BUCKET")]
	s3_bucket: Option<String>,

	#[arg(long, env = "AGRISYNC_S3_REGION")]
	s3_region: Option<String>,

	#[arg(long, env = "AGRISYNC_S3_ENDPOINT")]
	s3_endpoint: Option<String>,

	#[arg(long, env = "AGRISYNC_S3_ACCESS_KEY_ID", hide_env_values = true)]
	s3_access_key_id: Option<String>,

	#[arg(long, env = "AGRISYNC_S3_SECRET_ACCESS_KEY", hide_env_values = true)]
	s3_secret_access_key: Option<String>,
}

impl Args {
	fn data_dir(&self) -> anyhow::Result<PathBuf> {
		match &self.data_dir {
			Some(path) => Ok(path.clone()),
			None => Ok(env::current_dir()
				.context("Unable to get your current directory. Maybe try setting $DATA_DIR?")?
				.join("agrisync_data")),
		}
	}

	/// Flags and environment win over the config file
	fn apply(self, config: &mut AppConfig) {
		if let Some(url) = self.database_url {
			config.database_url = Some(url);
		}
		if let Some(bucket) = self.s3_bucket {
			config.media.bucket = bucket;
		}
		if let Some(region) = self.s3_region {
			config.media.region = region;
		}
		if let Some(endpoint) = self.s3_endpoint {
			config.media.endpoint = Some(endpoint);
		}
		if let Some(key) = self.s3_access_key_id {
			config.media.access_key_id = Some(key);
		}
		if let Some(secret) = self.s3_secret_access_key {
			config.media.secret_access_key = Some(secret);
		}
	}
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let args = Args::parse();
	let data_dir = args.data_dir()?;
	let port = args.port;

	let mut config = AppConfig::load_from(&data_dir).context("Unable to load config")?;
	args.apply(&mut config);

	let _log_guard = logging::init(&config.logs_dir(), &config.log_level)?;

	let mut addr = config
		.server
		.bind
		.parse::<SocketAddr>()
		.with_context(|| format!("Invalid bind address `{}`", config.server.bind))?;
	if let Some(port) = port {
		addr.set_port(port);
	}

	let auth = Arc::new(auth::StaticTokens::from_config(&config.auth));
	if auth.is_empty() {
		warn!("No bearer tokens configured; every authenticated request will be rejected");
	}

	let core = Core::new(config).await.context("Unable to start core")?;

	let app = routes::router(routes::AppState {
		core: Arc::new(core),
		auth,
	});

	let listener = tokio::net::TcpListener::bind(addr)
		.await
		.with_context(|| format!("Unable to bind {addr}"))?;
	info!("Listening on http://{}", addr);

	axum::serve(listener, app)
		.with_graceful_shutdown(utils::axum_shutdown_signal())
		.await
		.context("Error with HTTP server!")?;

	Ok(())
}

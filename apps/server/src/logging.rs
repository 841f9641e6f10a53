//! Log output for the server process

use std::path::Path;
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Stdout plus a daily-rotated file under `logs_dir`
///
/// `RUST_LOG` wins over `level`. Keep the returned guard alive for as long as
/// file output is wanted; dropping it flushes and closes the file writer.
pub fn init(logs_dir: &Path, level: &str) -> anyhow::Result<WorkerGuard> {
	std::fs::create_dir_all(logs_dir)?;

	let (file_writer, guard) = tracing_appender::non_blocking(rolling::daily(logs_dir, "server.log"));

	let default_filter = format!("agrisync_core={level},agrisync_server={level},tower_http={level}");

	tracing_subscriber::registry()
		.with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
		.with(fmt::layer().with_target(true).with_writer(std::io::stdout))
		.with(
			fmt::layer()
				.with_target(true)
				.with_thread_ids(true)
				.with_ansi(false)
				.with_writer(file_writer),
		)
		.try_init()?;

	Ok(guard)
}

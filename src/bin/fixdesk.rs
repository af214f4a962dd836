use clap::Parser;
use fixdesk::Settings;
use fixdesk::cli::{Cli, run};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt, reload};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();

	// Logging starts before settings load so `.env` problems are reported;
	// the configured filter replaces the bootstrap one afterwards.
	let (filter, handle) = reload::Layer::new(EnvFilter::new("info"));
	tracing_subscriber::registry()
		.with(filter)
		.with(fmt::layer())
		.init();

	let settings = Settings::load()?;
	handle.reload(EnvFilter::new(cli.log_filter(&settings)))?;

	run(cli, settings).await
}

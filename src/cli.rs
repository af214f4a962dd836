//! Command-line interface of the `fixdesk` binary.

use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;

use crate::{AppContext, HttpServer, SeedAccount, Settings, ShutdownCoordinator, build_app};

/// Extra body allowance on top of the upload limit for form fields.
const BODY_OVERHEAD_BYTES: usize = 1024 * 1024;

/// fixdesk management CLI
#[derive(Debug, Parser)]
#[command(name = "fixdesk")]
#[command(about = "Campus facility complaint tracker", long_about = None)]
#[command(version)]
pub struct Cli {
	#[command(subcommand)]
	pub command: Commands,

	/// Verbosity level (can be repeated for more output)
	#[arg(short, long, action = clap::ArgAction::Count, global = true)]
	pub verbosity: u8,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
	/// Run the API server
	Serve {
		/// Interface to bind (overrides FIXDESK_HOST)
		#[arg(long)]
		host: Option<String>,

		/// Port to bind (overrides FIXDESK_PORT)
		#[arg(long)]
		port: Option<u16>,
	},

	/// Create the admin account and default technicians if they are missing
	Seed {
		#[arg(long, default_value = "Facility Manager")]
		admin_name: String,

		#[arg(long, default_value = "admin@campus.com")]
		admin_email: String,

		#[arg(long, env = "FIXDESK_ADMIN_PASSWORD", default_value = "admin123")]
		admin_password: String,

		/// Technician as NAME:PASSWORD[:EMAIL]; repeatable. Defaults to the two
		/// stock technicians when omitted.
		#[arg(long = "technician", value_name = "NAME:PASSWORD[:EMAIL]", value_parser = parse_technician)]
		technicians: Vec<SeedAccount>,
	},
}

impl Cli {
	/// `RUST_LOG` wins; otherwise `-v`/`-vv` raise the configured filter.
	pub fn log_filter(&self, settings: &Settings) -> String {
		if let Ok(filter) = std::env::var("RUST_LOG") {
			return filter;
		}
		match self.verbosity {
			0 => settings.log_filter.clone(),
			1 => "debug".to_string(),
			_ => "trace".to_string(),
		}
	}
}

impl Commands {
	/// The seed accounts described by a `seed` invocation.
	pub fn seed_accounts(&self) -> Vec<SeedAccount> {
		let Commands::Seed {
			admin_name,
			admin_email,
			admin_password,
			technicians,
		} = self
		else {
			return Vec::new();
		};

		let mut accounts = vec![SeedAccount::admin(
			admin_name.as_str(),
			admin_email.as_str(),
			admin_password.as_str(),
		)];
		if technicians.is_empty() {
			accounts.extend(
				SeedAccount::defaults()
					.into_iter()
					.filter(|account| account.role == crate::Role::Technician),
			);
		} else {
			accounts.extend(technicians.iter().cloned());
		}
		accounts
	}
}

/// Parse `NAME:PASSWORD[:EMAIL]`.
///
/// The password may itself contain `:`; only a trailing segment holding an
/// `@` is taken as the email.
pub fn parse_technician(value: &str) -> Result<SeedAccount, String> {
	let (name, rest) = value.split_once(':').unwrap_or((value, ""));
	let name = name.trim();
	let (password, email) = match rest.rsplit_once(':') {
		Some((password, email)) if email.contains('@') => (password, Some(email.trim())),
		Some((password, email)) if email.trim().is_empty() => (password, None),
		_ => (rest, None),
	};

	if name.is_empty() || password.is_empty() {
		return Err(format!(
			"expected NAME:PASSWORD[:EMAIL], got '{}'",
			value
		));
	}
	Ok(SeedAccount::technician(name, password, email.map(str::to_string)))
}

/// Execute a parsed command against loaded settings.
pub async fn run(cli: Cli, mut settings: Settings) -> anyhow::Result<()> {
	match &cli.command {
		Commands::Serve { host, port } => {
			if let Some(host) = host {
				settings.host = host.clone();
			}
			if let Some(port) = port {
				settings.port = *port;
			}
			serve(settings).await
		}
		Commands::Seed { .. } => {
			let ctx = AppContext::from_settings(settings).await?;
			let report = ctx.auth.seed(&cli.command.seed_accounts()).await?;
			tracing::info!(
				created = report.created.len(),
				skipped = report.skipped.len(),
				"Seed complete"
			);
			for user in &report.created {
				println!(
					"created {} {} ({})",
					user.role,
					user.name,
					user.email.as_deref().unwrap_or("no email")
				);
			}
			for name in &report.skipped {
				println!("exists  {}", name);
			}
			Ok(())
		}
	}
}

/// Serve the API until Ctrl+C or SIGTERM.
pub async fn serve(settings: Settings) -> anyhow::Result<()> {
	let addr = settings.bind_addr()?;
	let grace = Duration::from_secs(settings.shutdown_grace_secs);
	let max_body = settings.max_upload_bytes + BODY_OVERHEAD_BYTES;

	let ctx = Arc::new(AppContext::from_settings(settings).await?);
	let handler = build_app(ctx)?;

	let coordinator = ShutdownCoordinator::new(grace);
	coordinator.shutdown_on_signal();

	HttpServer::new(handler)
		.with_max_body_bytes(max_body)
		.listen_with_shutdown(addr, coordinator)
		.await?;

	tracing::info!("Server stopped");
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::Role;
	use rstest::rstest;

	#[rstest]
	#[case("Mike Tech:tech123", "Mike Tech", "tech123", None)]
	#[case("Sarah Fix:pa:ss:sarah@tech.com", "Sarah Fix", "pa:ss", Some("sarah@tech.com"))]
	#[case("Ben:a:b:c", "Ben", "a:b:c", None)]
	#[case("Ben:pw:", "Ben", "pw", None)]
	#[case("Night:pw:Night@Campus.edu", "Night", "pw", Some("night@campus.edu"))]
	fn test_parse_technician(
		#[case] value: &str,
		#[case] name: &str,
		#[case] password: &str,
		#[case] email: Option<&str>,
	) {
		let account = parse_technician(value).unwrap();

		assert_eq!(account.name, name);
		assert_eq!(account.password, password);
		assert_eq!(account.email.as_deref(), email);
		assert_eq!(account.role, Role::Technician);
	}

	#[rstest]
	#[case("nobody")]
	#[case(":pw")]
	#[case("name:")]
	#[case("name::ben@campus.edu")]
	fn test_parse_technician_rejects(#[case] value: &str) {
		assert!(parse_technician(value).is_err());
	}

	#[rstest]
	fn test_seed_defaults() {
		let cli = Cli::try_parse_from(["fixdesk", "seed"]).unwrap();
		let accounts = cli.command.seed_accounts();

		let names: Vec<_> = accounts.iter().map(|a| a.name.as_str()).collect();
		assert_eq!(names, vec!["Facility Manager", "Mike Tech", "Sarah Fix"]);
		assert_eq!(accounts[0].role, Role::Admin);
		assert_eq!(accounts[0].email.as_deref(), Some("admin@campus.com"));
	}

	#[rstest]
	fn test_seed_custom_technicians_replace_defaults() {
		let cli = Cli::try_parse_from([
			"fixdesk",
			"seed",
			"--admin-email",
			"boss@campus.edu",
			"--technician",
			"Ana:pw",
			"--technician",
			"Ben:pw:ben@campus.edu",
		])
		.unwrap();

		let accounts = cli.command.seed_accounts();

		assert_eq!(accounts.len(), 3);
		assert_eq!(accounts[0].email.as_deref(), Some("boss@campus.edu"));
		assert_eq!(accounts[2].email.as_deref(), Some("ben@campus.edu"));
	}

	#[rstest]
	fn test_serve_flags() {
		let cli = Cli::try_parse_from(["fixdesk", "-v", "serve", "--port", "8080"]).unwrap();

		assert_eq!(cli.verbosity, 1);
		assert!(matches!(
			cli.command,
			Commands::Serve {
				host: None,
				port: Some(8080)
			}
		));
	}
}

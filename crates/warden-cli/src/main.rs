// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Warden CLI
//!
//! Validates snapshot documents, evaluates single authorization requests and
//! lists effective permissions against the configured snapshot.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use warden_config::{load_config, load_config_with_file, LogFormat, LoggingConfig};

mod commands;

/// Warden - authorization decisions from the command line
#[derive(Parser, Debug)]
#[command(name = "warden", version, about, long_about = None)]
struct Args {
	/// Path to custom configuration file
	#[arg(short, long)]
	config: Option<PathBuf>,

	/// Snapshot document (overrides config)
	#[arg(short, long)]
	snapshot: Option<PathBuf>,

	/// Log level (overrides config)
	#[arg(short, long)]
	log_level: Option<String>,

	/// Output logs as JSON (overrides config)
	#[arg(long)]
	json_logs: bool,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Build the configured snapshot and report what it contains
	Validate,

	/// Evaluate one decision request given as JSON
	Check {
		/// Request file, or `-` for stdin
		#[arg(long, short, default_value = "-")]
		request: String,

		/// Print only whether the request is allowed
		#[arg(long)]
		public: bool,
	},

	/// Print the effective permissions of an actor in a tenant
	Permissions {
		#[arg(long)]
		tenant: Uuid,

		#[arg(long)]
		actor: Uuid,
	},
}

fn init_tracing(logging: &LoggingConfig) {
	let filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(format!("warden={}", logging.level)));

	match logging.format {
		LogFormat::Json => {
			tracing_subscriber::registry()
				.with(filter)
				.with(fmt::layer().json().with_writer(std::io::stderr))
				.init();
		}
		LogFormat::Compact => {
			tracing_subscriber::registry()
				.with(filter)
				.with(fmt::layer().compact().with_writer(std::io::stderr))
				.init();
		}
		LogFormat::Pretty => {
			tracing_subscriber::registry()
				.with(filter)
				.with(fmt::layer().with_writer(std::io::stderr))
				.init();
		}
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	let args = Args::parse();

	let mut config = match &args.config {
		Some(path) => load_config_with_file(path),
		None => load_config(),
	}
	.context("failed to load configuration")?;

	if let Some(level) = &args.log_level {
		config.logging.level = level.clone();
	}
	if args.json_logs {
		config.logging.format = LogFormat::Json;
	}
	if let Some(path) = &args.snapshot {
		config.snapshot.path = Some(path.clone());
	}

	init_tracing(&config.logging);
	debug!(command = ?args.command, "starting warden");

	let mut stdout = std::io::stdout();
	match args.command {
		Command::Validate => commands::validate(&config, &mut stdout),
		Command::Check { request, public } => {
			let request = commands::read_request(&request)?;
			commands::check(&config, &request, public, &mut stdout).await
		}
		Command::Permissions { tenant, actor } => {
			commands::permissions(&config, tenant.into(), actor.into(), &mut stdout)
		}
	}
}

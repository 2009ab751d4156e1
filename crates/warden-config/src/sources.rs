// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: environment variables and TOML files.

use std::path::PathBuf;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::WardenConfigLayer;
use crate::sections::{
	AuditConfigLayer, EngineConfigLayer, FileSinkConfigLayer, LogFormat, LoggingConfigLayer,
	QueueOverflowPolicy, SnapshotConfigLayer,
};

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<WardenConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<WardenConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(WardenConfigLayer::default())
	}
}

/// TOML file configuration source.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new("/etc/warden/warden.toml")
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<WardenConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(WardenConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: WardenConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: WARDEN_<SECTION>_<FIELD>
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<WardenConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(WardenConfigLayer {
			engine: Some(load_engine_from_env()?),
			snapshot: Some(load_snapshot_from_env()),
			logging: Some(load_logging_from_env()?),
			audit: Some(load_audit_from_env()?),
		})
	}
}

fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_bool(name: &str) -> Option<bool> {
	env_var(name).map(|v| v.eq_ignore_ascii_case("true") || v == "1")
}

fn env_u64(name: &str) -> Result<Option<u64>, ConfigError> {
	match env_var(name) {
		Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid u64 value '{v}'"),
		}),
		None => Ok(None),
	}
}

fn env_usize(name: &str) -> Result<Option<usize>, ConfigError> {
	match env_var(name) {
		Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid usize value '{v}'"),
		}),
		None => Ok(None),
	}
}

fn load_engine_from_env() -> Result<EngineConfigLayer, ConfigError> {
	Ok(EngineConfigLayer {
		owner_attribute: env_var("WARDEN_ENGINE_OWNER_ATTRIBUTE"),
		cache_enabled: env_bool("WARDEN_ENGINE_CACHE_ENABLED"),
		cache_ttl_secs: env_u64("WARDEN_ENGINE_CACHE_TTL_SECS")?,
		cache_capacity: env_usize("WARDEN_ENGINE_CACHE_CAPACITY")?,
	})
}

fn load_snapshot_from_env() -> SnapshotConfigLayer {
	SnapshotConfigLayer {
		path: env_var("WARDEN_SNAPSHOT_PATH").map(PathBuf::from),
	}
}

fn load_logging_from_env() -> Result<LoggingConfigLayer, ConfigError> {
	let format = match env_var("WARDEN_LOG_FORMAT") {
		Some(v) => Some(v.parse::<LogFormat>().map_err(|message| {
			ConfigError::InvalidValue {
				key: "WARDEN_LOG_FORMAT".to_string(),
				message,
			}
		})?),
		None => None,
	};

	Ok(LoggingConfigLayer {
		level: env_var("WARDEN_LOG_LEVEL"),
		format,
	})
}

fn load_audit_from_env() -> Result<AuditConfigLayer, ConfigError> {
	let queue_overflow_policy =
		env_var("WARDEN_AUDIT_OVERFLOW_POLICY").map(|v| match v.to_lowercase().as_str() {
			"block" => QueueOverflowPolicy::Block,
			_ => QueueOverflowPolicy::DropNewest,
		});

	let file_sinks = env_var("WARDEN_AUDIT_FILE_PATH").map(|path| {
		vec![FileSinkConfigLayer {
			name: Some("file".to_string()),
			path: Some(PathBuf::from(path)),
		}]
	});

	Ok(AuditConfigLayer {
		enabled: env_bool("WARDEN_AUDIT_ENABLED"),
		queue_capacity: env_usize("WARDEN_AUDIT_QUEUE_CAPACITY")?,
		queue_overflow_policy,
		min_severity: env_var("WARDEN_AUDIT_MIN_SEVERITY"),
		tracing_sink: env_bool("WARDEN_AUDIT_TRACING_SINK"),
		file_sinks,
	})
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration management for Warden.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe configuration with validation
//! - Consistent environment variable naming (`WARDEN_*`)
//! - Loading of snapshot documents from TOML or JSON files
//!
//! # Usage
//!
//! ```ignore
//! use warden_config::{load_config, load_snapshot};
//!
//! let config = load_config()?;
//! if let Some(path) = &config.snapshot.path {
//!     let builder = load_snapshot(path)?;
//! }
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::WardenConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use std::path::Path;

use tracing::{debug, info};
use warden_authz::{SnapshotBuilder, SnapshotDocument};

/// Fully resolved Warden configuration.
#[derive(Debug, Clone, Default)]
pub struct WardenConfig {
	pub engine: EngineConfig,
	pub snapshot: SnapshotConfig,
	pub logging: LoggingConfig,
	pub audit: AuditConfig,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`WARDEN_*`)
/// 2. Config file (`/etc/warden/warden.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<WardenConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration from environment only (for testing or simple deployments).
pub fn load_config_from_env() -> Result<WardenConfig, ConfigError> {
	let mut merged = WardenConfigLayer::default();
	merged.merge(EnvSource.load()?);
	finalize(merged)
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<WardenConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

fn load_from_sources(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<WardenConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = WardenConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
fn finalize(layer: WardenConfigLayer) -> Result<WardenConfig, ConfigError> {
	let config = WardenConfig {
		engine: layer.engine.unwrap_or_default().finalize(),
		snapshot: layer.snapshot.unwrap_or_default().finalize(),
		logging: layer.logging.unwrap_or_default().finalize(),
		audit: layer.audit.unwrap_or_default().finalize(),
	};

	validate_config(&config)?;

	info!(
		cache_enabled = config.engine.cache_enabled,
		snapshot_path = ?config.snapshot.path,
		log_level = %config.logging.level,
		audit_enabled = config.audit.enabled,
		file_sinks = config.audit.file_sinks.len(),
		"configuration loaded"
	);

	Ok(config)
}

fn validate_config(config: &WardenConfig) -> Result<(), ConfigError> {
	if config.engine.cache_enabled && config.engine.cache_ttl_secs == 0 {
		return Err(ConfigError::Validation(
			"engine.cache_ttl_secs must be greater than 0 when the cache is enabled".to_string(),
		));
	}
	if config.audit.queue_capacity == 0 {
		return Err(ConfigError::Validation(
			"audit.queue_capacity must be greater than 0".to_string(),
		));
	}
	if !LOG_LEVELS.contains(&config.logging.level.to_lowercase().as_str()) {
		return Err(ConfigError::InvalidValue {
			key: "logging.level".to_string(),
			message: format!(
				"'{}' is not one of {}",
				config.logging.level,
				LOG_LEVELS.join(", ")
			),
		});
	}
	Ok(())
}

/// Reads a snapshot document. Files ending in `.json` are parsed as JSON,
/// everything else as TOML.
pub fn load_snapshot_document(path: &Path) -> Result<SnapshotDocument, ConfigError> {
	debug!(path = %path.display(), "loading snapshot document");
	let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
		path: path.to_path_buf(),
		source: e,
	})?;

	let is_json = path
		.extension()
		.is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
	if is_json {
		serde_json::from_str(&content).map_err(|e| ConfigError::JsonParse {
			path: path.to_path_buf(),
			source: e,
		})
	} else {
		toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
			path: path.to_path_buf(),
			source: e,
		})
	}
}

/// Reads a snapshot document and resolves its role references.
///
/// The returned builder still has to be built (or published) to run the
/// remaining validation.
pub fn load_snapshot(path: &Path) -> Result<SnapshotBuilder, ConfigError> {
	load_snapshot_document(path)?
		.into_builder()
		.map_err(|e| ConfigError::Snapshot {
			path: path.to_path_buf(),
			source: e,
		})
}

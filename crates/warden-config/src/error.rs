// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration error types.

use std::path::PathBuf;

use warden_authz::ConfigurationError;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("Missing required configuration: {0}")]
	Missing(String),

	#[error("Invalid value for {key}: {message}")]
	InvalidValue { key: String, message: String },

	#[error("Failed to parse TOML at {path}: {source}")]
	TomlParse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("Failed to parse JSON at {path}: {source}")]
	JsonParse {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},

	#[error("Failed to read file {path}: {source}")]
	FileRead {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Validation error: {0}")]
	Validation(String),

	#[error("Invalid snapshot document {path}: {source}")]
	Snapshot {
		path: PathBuf,
		#[source]
		source: ConfigurationError,
	},
}

impl From<std::io::Error> for ConfigError {
	fn from(e: std::io::Error) -> Self {
		ConfigError::FileRead {
			path: PathBuf::new(),
			source: e,
		}
	}
}

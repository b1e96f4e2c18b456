mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Config, Output, Search, Service};

use std::{env, fs, path::Path};

/// Environment variable and key-file names recognized for the search API key.
const API_KEY_NAMES: &[&str] = &["OPENALEX_API_KEY", "OPENALEX_APIKEY", "OPENALEX_KEY", "api_key"];

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}
	if cfg.search.api_base.trim().is_empty() {
		return Err(Error::Validation { message: "search.api_base must be non-empty.".to_string() });
	}
	if cfg.search.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "search.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.search.per_page == 0 {
		return Err(Error::Validation {
			message: "search.per_page must be greater than zero.".to_string(),
		});
	}
	if cfg.output.max_reference_authors == 0 {
		return Err(Error::Validation {
			message: "output.max_reference_authors must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.search.api_base = cfg.search.api_base.trim().trim_end_matches('/').to_string();
}

/// Looks up the search API key from the environment, then from an optional
/// key=value file. A missing key degrades queries to unauthenticated mode.
pub fn resolve_api_key(cfg: &Config) -> Option<String> {
	for name in API_KEY_NAMES {
		if let Ok(value) = env::var(name) {
			let value = value.trim().to_string();

			if !value.is_empty() {
				return Some(value);
			}
		}
	}

	let path = cfg.search.key_file.clone().unwrap_or_else(|| ".env".into());

	read_key_file(&path)
}

fn read_key_file(path: &Path) -> Option<String> {
	let raw = fs::read_to_string(path).ok()?;

	for line in raw.lines() {
		let line = line.trim();

		if line.is_empty() || line.starts_with('#') {
			continue;
		}

		let Some((key, value)) = line.split_once('=') else { continue };

		if !API_KEY_NAMES.contains(&key.trim()) {
			continue;
		}

		let value = value.trim().trim_matches('\'').trim_matches('"').trim();

		if !value.is_empty() {
			return Some(value.to_string());
		}
	}

	None
}

use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub search: Search,
	#[serde(default)]
	pub output: Output,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Search {
	/// Works-search endpoint, e.g. "https://api.openalex.org/works".
	pub api_base: String,
	#[serde(default = "default_timeout_ms")]
	pub timeout_ms: u64,
	#[serde(default = "default_per_page")]
	pub per_page: u32,
	/// Optional key=value file consulted for the API key after the
	/// environment; relative paths resolve against the working directory.
	pub key_file: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub struct Output {
	/// Cap on author names rendered per reference entry.
	#[serde(default = "default_max_reference_authors")]
	pub max_reference_authors: usize,
}
impl Default for Output {
	fn default() -> Self {
		Self { max_reference_authors: default_max_reference_authors() }
	}
}

fn default_timeout_ms() -> u64 {
	30_000
}

fn default_per_page() -> u32 {
	12
}

fn default_max_reference_authors() -> usize {
	6
}

use std::time::Duration;

use color_eyre::Result;
use reqwest::Client;
use serde_json::Value;

/// One work returned by the search service. Ephemeral, not owned by the
/// engine; only the fields the scorer and bibliography need are kept.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Work {
	pub id: String,
	pub title: String,
	pub year: String,
	pub doi: String,
	pub authors: Vec<String>,
}

impl Work {
	/// Preferred link target: the DOI when present, else the work id.
	pub fn url(&self) -> &str {
		if self.doi.is_empty() { &self.id } else { &self.doi }
	}
}

/// Blocking-free HTTP client for a works-search endpoint. Every request
/// carries the configured timeout and an exact publication-year filter.
pub struct WorksClient {
	client: Client,
	api_base: String,
	per_page: u32,
}

impl WorksClient {
	pub fn new(cfg: &citelink_config::Search) -> Result<Self> {
		let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;

		Ok(Self { client, api_base: cfg.api_base.clone(), per_page: cfg.per_page })
	}

	pub async fn search(
		&self,
		query: &str,
		year: &str,
		api_key: Option<&str>,
	) -> Result<Vec<Work>> {
		let mut params = vec![
			("search".to_string(), query.to_string()),
			("filter".to_string(), format!("publication_year:{year}")),
			("per-page".to_string(), self.per_page.to_string()),
		];

		if let Some(key) = api_key {
			params.push(("api_key".to_string(), key.to_string()));
		}

		let res = self.client.get(&self.api_base).query(&params).send().await?;
		let json: Value = res.error_for_status()?.json().await?;

		Ok(parse_works(&json))
	}
}

/// Extracts works from a search response body. Unknown shapes degrade to an
/// empty list rather than an error.
pub fn parse_works(json: &Value) -> Vec<Work> {
	let Some(results) = json.get("results").and_then(Value::as_array) else { return Vec::new() };

	results.iter().map(parse_work).collect()
}

fn parse_work(raw: &Value) -> Work {
	Work {
		id: string_field(raw, "id"),
		title: string_field(raw, "display_name"),
		year: raw
			.get("publication_year")
			.and_then(Value::as_i64)
			.map(|year| year.to_string())
			.unwrap_or_default(),
		doi: pick_doi(raw),
		authors: parse_authors(raw),
	}
}

fn pick_doi(raw: &Value) -> String {
	let doi = string_field(raw, "doi");

	if !doi.is_empty() {
		return doi;
	}

	raw.get("ids")
		.and_then(|ids| ids.get("doi"))
		.and_then(Value::as_str)
		.unwrap_or("")
		.trim()
		.to_string()
}

fn parse_authors(raw: &Value) -> Vec<String> {
	let Some(authorships) = raw.get("authorships").and_then(Value::as_array) else {
		return Vec::new();
	};

	authorships
		.iter()
		.filter_map(|authorship| {
			let name = authorship.get("author")?.get("display_name")?.as_str()?.trim();

			(!name.is_empty()).then(|| name.to_string())
		})
		.collect()
}

fn string_field(raw: &Value, key: &str) -> String {
	raw.get(key).and_then(Value::as_str).unwrap_or("").trim().to_string()
}

pub mod bibliography;
mod error;
pub mod resolve;
pub mod rewrite;

use std::{collections::BTreeMap, future::Future, pin::Pin};

use serde::Serialize;

use citelink_domain::{
	AtomKey, PatternTable, Registry, candidates, extract_atoms, mine_title_hints,
};
use citelink_providers::{Work, WorksClient};

pub use bibliography::render_bibliography;
pub use error::{Error, Result};
pub use resolve::{
	CitationResolution, ResolutionSource, ResolveOutcome, resolve_atoms, score_work,
};
pub use rewrite::{references_markdown, rewrite_document};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Atom key to verified URL, consumed only by the text rewriter.
pub type LinkMap = BTreeMap<AtomKey, String>;

/// Seam over the external works-search service so resolution logic can be
/// exercised without a network.
pub trait WorksProvider
where
	Self: Send + Sync,
{
	fn search<'a>(
		&'a self,
		query: &'a str,
		year: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Vec<Work>>>;
}

/// Production provider: one HTTP query round per call, credential attached
/// when one was discovered.
pub struct HttpWorksProvider {
	client: WorksClient,
	api_key: Option<String>,
}

impl HttpWorksProvider {
	pub fn new(cfg: &citelink_config::Config) -> color_eyre::Result<Self> {
		Ok(Self {
			client: WorksClient::new(&cfg.search)?,
			api_key: citelink_config::resolve_api_key(cfg),
		})
	}

	pub fn api_key_present(&self) -> bool {
		self.api_key.is_some()
	}
}

impl WorksProvider for HttpWorksProvider {
	fn search<'a>(
		&'a self,
		query: &'a str,
		year: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Vec<Work>>> {
		Box::pin(async move { self.client.search(query, year, self.api_key.as_deref()).await })
	}
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct EnrichStats {
	pub citation_count: usize,
	pub matched_count: usize,
	pub unresolved_count: usize,
	pub corpus_citation_count: usize,
}

/// Everything one enrichment pass produces.
#[derive(Debug)]
pub struct EnrichOutcome {
	pub report_text: String,
	pub matches: Vec<CitationResolution>,
	pub unresolved: Vec<String>,
	pub link_map: LinkMap,
	pub bibtex: String,
	pub api_key_present: bool,
	pub stats: EnrichStats,
}

#[derive(Clone, Copy, Debug)]
pub struct EnrichOptions {
	pub max_reference_authors: usize,
	pub api_key_present: bool,
}

impl Default for EnrichOptions {
	fn default() -> Self {
		Self { max_reference_authors: 6, api_key_present: false }
	}
}

/// Runs one full enrichment pass: extract atoms, mine hints, resolve against
/// the registry and the external service, rewrite the document, and render
/// the references block and bibliography.
pub async fn enrich(
	provider: &dyn WorksProvider,
	registry: &Registry,
	report_text: &str,
	options: &EnrichOptions,
) -> Result<EnrichOutcome> {
	if report_text.trim().is_empty() {
		return Err(Error::InvalidRequest { message: "report text must be non-empty".to_string() });
	}

	let table = PatternTable::new();
	let atoms = extract_atoms(&table, report_text);
	let hints = mine_title_hints(report_text);

	tracing::info!(citation_count = atoms.len(), "Extracted citation atoms.");

	let resolved = resolve_atoms(provider, registry, &hints, &atoms).await;
	let unresolved = rewrite::sort_unresolved(&resolved.unresolved);
	let corpus_citation_count =
		atoms.iter().filter(|atom| !candidates(registry, atom).is_empty()).count();
	let stats = EnrichStats {
		citation_count: atoms.len(),
		matched_count: resolved.matched.len(),
		unresolved_count: unresolved.len(),
		corpus_citation_count,
	};

	tracing::info!(
		matched = stats.matched_count,
		unresolved = stats.unresolved_count,
		corpus = stats.corpus_citation_count,
		"Citation resolution finished."
	);

	let body = rewrite_document(&table, report_text, &resolved.link_map);
	let references = references_markdown(
		&resolved.matched,
		&resolved.unresolved,
		options.max_reference_authors,
	);
	let report_text = format!("{}\n\n{references}", body.trim_end());
	let bibtex = render_bibliography(&resolved.matched);

	Ok(EnrichOutcome {
		report_text,
		matches: resolved.matched,
		unresolved,
		link_map: resolved.link_map,
		bibtex,
		api_key_present: options.api_key_present,
		stats,
	})
}

use std::sync::Mutex;

use citelink_domain::{Registry, RegistryEntry};
use citelink_providers::Work;
use citelink_service::{
	BoxFuture, EnrichOptions, ResolutionSource, WorksProvider, enrich,
};

/// Returns canned works for any query containing the response key and records
/// every query issued.
struct StubProvider {
	responses: Vec<(&'static str, Vec<Work>)>,
	calls: Mutex<Vec<String>>,
	fail: bool,
}

impl StubProvider {
	fn new(responses: Vec<(&'static str, Vec<Work>)>) -> Self {
		Self { responses, calls: Mutex::new(Vec::new()), fail: false }
	}

	fn failing() -> Self {
		Self { responses: Vec::new(), calls: Mutex::new(Vec::new()), fail: true }
	}

	fn call_count(&self) -> usize {
		self.calls.lock().expect("lock poisoned").len()
	}
}

impl WorksProvider for StubProvider {
	fn search<'a>(
		&'a self,
		query: &'a str,
		_year: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Vec<Work>>> {
		Box::pin(async move {
			self.calls.lock().expect("lock poisoned").push(query.to_string());

			if self.fail {
				return Err(color_eyre::eyre::eyre!("connection timed out"));
			}

			let lower = query.to_lowercase();

			Ok(self
				.responses
				.iter()
				.find(|(key, _)| lower.contains(&key.to_lowercase()))
				.map(|(_, works)| works.clone())
				.unwrap_or_default())
		})
	}
}

fn work(id: &str, title: &str, year: &str, doi: &str, authors: &[&str]) -> Work {
	Work {
		id: id.to_string(),
		title: title.to_string(),
		year: year.to_string(),
		doi: doi.to_string(),
		authors: authors.iter().map(|name| name.to_string()).collect(),
	}
}

fn registry(entries: Vec<RegistryEntry>) -> Registry {
	entries.into_iter().map(|entry| (entry.paper_id.clone(), entry)).collect()
}

fn entry(paper_id: &str, year: &str, title: &str, first_author: &str) -> RegistryEntry {
	RegistryEntry {
		paper_id: paper_id.to_string(),
		year: year.to_string(),
		title: title.to_string(),
		first_author: first_author.to_string(),
	}
}

#[tokio::test]
async fn end_to_end_scenario_links_verified_citations() {
	let text = "... depletion was proposed (Baddeley, 2000) and later revised \
		(Baddeley, 2000; Cowan, 2005).";
	let registry = registry(vec![entry("paper_001", "2000", "The episodic buffer", "Baddeley")]);
	let provider = StubProvider::new(vec![
		(
			"episodic buffer",
			vec![work(
				"https://openalex.org/W1",
				"The episodic buffer",
				"2000",
				"https://doi.org/10.1016/x",
				&["Alan Baddeley"],
			)],
		),
		(
			"cowan",
			vec![work(
				"https://openalex.org/W2",
				"Working memory capacity",
				"2005",
				"https://doi.org/10.1016/y",
				&["Nelson Cowan"],
			)],
		),
	]);
	let outcome = enrich(&provider, &registry, text, &EnrichOptions::default())
		.await
		.expect("enrich failed");

	assert_eq!(outcome.stats.citation_count, 2);
	assert_eq!(outcome.stats.matched_count, 2);
	assert_eq!(outcome.stats.unresolved_count, 0);
	assert_eq!(outcome.stats.corpus_citation_count, 1);

	// Both Baddeley occurrences carry one identical link.
	let link = "[Baddeley, 2000](https://doi.org/10.1016/x)";

	assert_eq!(outcome.report_text.matches(link).count(), 2);
	assert!(outcome.report_text.contains("[Cowan, 2005](https://doi.org/10.1016/y)"));
	assert!(outcome.report_text.contains("# References (Verified)"));
	assert!(outcome.report_text.contains("- None"));

	let baddeley =
		outcome.matches.iter().find(|m| m.citation == "Baddeley, 2000").expect("missing");

	assert_eq!(baddeley.source, ResolutionSource::Registry);

	let cowan = outcome.matches.iter().find(|m| m.citation == "Cowan, 2005").expect("missing");

	assert_eq!(cowan.source, ResolutionSource::Search);

	// One query per distinct atom.
	assert_eq!(provider.call_count(), 2);
}

#[tokio::test]
async fn unverified_external_match_stays_unresolved_verbatim() {
	let text = "proposed (Baddeley, 2000) and revised (Cowan, 2005).";
	let registry = registry(vec![entry("paper_001", "2000", "The episodic buffer", "Baddeley")]);
	// Cowan candidate has the wrong first author: the gap tier cannot verify.
	let provider = StubProvider::new(vec![
		(
			"episodic buffer",
			vec![work(
				"https://openalex.org/W1",
				"The episodic buffer",
				"2000",
				"https://doi.org/10.1016/x",
				&["Alan Baddeley"],
			)],
		),
		(
			"cowan",
			vec![work(
				"https://openalex.org/W9",
				"Something else",
				"2005",
				"",
				&["Pat Jones"],
			)],
		),
	]);
	let outcome = enrich(&provider, &registry, text, &EnrichOptions::default())
		.await
		.expect("enrich failed");

	assert_eq!(outcome.stats.matched_count, 1);
	assert_eq!(outcome.unresolved, vec!["Cowan, 2005".to_string()]);
	assert!(outcome.report_text.contains("(Cowan, 2005)"));
	assert!(outcome.report_text.contains("## Unresolved Citations\n\n- Cowan, 2005"));
	assert!(!outcome.report_text.contains("[Cowan, 2005]"));
}

#[tokio::test]
async fn year_mismatch_never_resolves_even_with_identical_title() {
	let text = "proposed (Baddeley, 2000).";
	let registry = registry(vec![entry("paper_001", "2000", "The episodic buffer", "Baddeley")]);
	let provider = StubProvider::new(vec![(
		"episodic buffer",
		vec![work(
			"https://openalex.org/W1",
			"The episodic buffer",
			"2001",
			"https://doi.org/10.1016/x",
			&["Alan Baddeley"],
		)],
	)]);
	let outcome = enrich(&provider, &registry, text, &EnrichOptions::default())
		.await
		.expect("enrich failed");

	assert_eq!(outcome.stats.matched_count, 0);
	assert_eq!(outcome.unresolved, vec!["Baddeley, 2000".to_string()]);
}

#[tokio::test]
async fn ambiguous_registry_entries_without_hint_issue_no_query() {
	let text = "proposed (Baddeley, 2000).";
	let registry = registry(vec![
		entry("paper_001", "2000", "The episodic buffer", "Baddeley"),
		entry("paper_002", "2000", "Working memory and language", "Baddeley"),
	]);
	let provider = StubProvider::new(vec![(
		"baddeley",
		vec![work(
			"https://openalex.org/W1",
			"The episodic buffer",
			"2000",
			"https://doi.org/10.1016/x",
			&["Alan Baddeley"],
		)],
	)]);
	let outcome = enrich(&provider, &registry, text, &EnrichOptions::default())
		.await
		.expect("enrich failed");

	assert_eq!(outcome.stats.matched_count, 0);
	assert_eq!(outcome.unresolved, vec!["Baddeley, 2000".to_string()]);
	assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn unique_narrative_hint_unlocks_ambiguous_registry_pair() {
	let text = "*The episodic buffer* (Baddeley, 2000) refined the model.";
	let registry = registry(vec![
		entry("paper_001", "2000", "The episodic buffer", "Baddeley"),
		entry("paper_002", "2000", "Working memory and language", "Baddeley"),
	]);
	let provider = StubProvider::new(vec![(
		"episodic buffer",
		vec![work(
			"https://openalex.org/W1",
			"The episodic buffer",
			"2000",
			"https://doi.org/10.1016/x",
			&["Alan Baddeley"],
		)],
	)]);
	let outcome = enrich(&provider, &registry, text, &EnrichOptions::default())
		.await
		.expect("enrich failed");

	assert_eq!(outcome.stats.matched_count, 1);
	assert_eq!(outcome.matches[0].source, ResolutionSource::Registry);
}

#[tokio::test]
async fn context_hint_applies_when_registry_has_no_candidates() {
	let text = "*Attention and effort* (Kahneman, 1973) framed the debate.";
	let provider = StubProvider::new(vec![(
		"attention and effort",
		vec![work(
			"https://openalex.org/W3",
			"Attention and effort",
			"1973",
			"",
			&["Daniel Kahneman"],
		)],
	)]);
	let outcome = enrich(&provider, &Registry::new(), text, &EnrichOptions::default())
		.await
		.expect("enrich failed");

	assert_eq!(outcome.stats.matched_count, 1);
	assert_eq!(outcome.matches[0].source, ResolutionSource::ContextTitle);
	assert_eq!(outcome.stats.corpus_citation_count, 0);
}

#[tokio::test]
async fn casing_variants_collapse_to_one_resolution_and_entry() {
	let text = "first (Smith, 2019) and again (SMITH, 2019).";
	let provider = StubProvider::new(vec![(
		"smith",
		vec![work(
			"https://openalex.org/W4",
			"A study of things",
			"2019",
			"https://doi.org/10.1/s",
			&["Jo Smith"],
		)],
	)]);
	let outcome = enrich(&provider, &Registry::new(), text, &EnrichOptions::default())
		.await
		.expect("enrich failed");

	assert_eq!(outcome.stats.citation_count, 1);
	assert_eq!(outcome.matches.len(), 1);
	assert_eq!(outcome.bibtex.matches("@article").count(), 1);
	// Both surface spellings are linked through the shared atom key.
	assert_eq!(outcome.report_text.matches("https://doi.org/10.1/s)").count(), 3);
	assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn transport_failure_degrades_to_unresolved() {
	let provider = StubProvider::failing();
	let outcome = enrich(
		&provider,
		&Registry::new(),
		"as shown (Smith, 2019).",
		&EnrichOptions::default(),
	)
	.await
	.expect("enrich failed");

	assert_eq!(outcome.stats.matched_count, 0);
	assert_eq!(outcome.unresolved, vec!["Smith, 2019".to_string()]);
	assert!(outcome.bibtex.is_empty());
}

#[tokio::test]
async fn empty_document_is_rejected() {
	let provider = StubProvider::new(Vec::new());

	assert!(
		enrich(&provider, &Registry::new(), "   ", &EnrichOptions::default()).await.is_err()
	);
}

#[tokio::test]
async fn enrichment_is_idempotent_on_its_own_output_body() {
	let text = "proposed (Baddeley, 2000) and noted by Cowan (2005).";
	let provider = StubProvider::new(vec![
		(
			"baddeley",
			vec![work(
				"https://openalex.org/W1",
				"The episodic buffer",
				"2000",
				"https://doi.org/10.1016/x",
				&["Alan Baddeley"],
			)],
		),
		(
			"cowan",
			vec![work(
				"https://openalex.org/W2",
				"Working memory capacity",
				"2005",
				"https://doi.org/10.1016/y",
				&["Nelson Cowan"],
			)],
		),
	]);
	let first = enrich(&provider, &Registry::new(), text, &EnrichOptions::default())
		.await
		.expect("enrich failed");
	let body = first.report_text.split("# References (Verified)").next().expect("no body");
	let second = enrich(&provider, &Registry::new(), body, &EnrichOptions::default())
		.await
		.expect("enrich failed");
	let body_again =
		second.report_text.split("# References (Verified)").next().expect("no body");

	assert_eq!(body.trim_end(), body_again.trim_end());
}

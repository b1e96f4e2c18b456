use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use citelink_domain::{
	AtomKey, CitationAtom, Registry, TitleHints, candidates, normalize_author_token,
	select_trusted_title, title_similarity,
};
use citelink_providers::Work;

use crate::WorksProvider;

/// Title similarity a registry-backed hint must reach against the best
/// external candidate.
pub const REGISTRY_TITLE_SIMILARITY: f64 = 0.86;
/// Title similarity a narrative-context hint must reach.
pub const CONTEXT_TITLE_SIMILARITY: f64 = 0.72;
/// Minimum best score for hint-less author+year verification.
pub const UNHINTED_MIN_SCORE: f64 = 7.0;
/// Minimum margin between best and second-best for hint-less verification.
pub const UNHINTED_MIN_GAP: f64 = 1.5;

/// Where the winning evidence for a resolution came from.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum ResolutionSource {
	#[serde(rename = "registry+search")]
	Registry,
	#[serde(rename = "context_title+search")]
	ContextTitle,
	#[serde(rename = "search")]
	Search,
}

/// A verified citation match. Immutable once created; exactly one per
/// distinct atom survives an enrichment pass.
#[derive(Clone, Debug, Serialize)]
pub struct CitationResolution {
	pub citation: String,
	pub source: ResolutionSource,
	pub confidence: f64,
	pub work_id: String,
	pub title: String,
	pub year: String,
	pub doi_or_url: String,
	pub authors: Vec<String>,
}

#[derive(Debug, Default)]
pub struct ResolveOutcome {
	pub matched: Vec<CitationResolution>,
	pub unresolved: Vec<String>,
	pub link_map: BTreeMap<AtomKey, String>,
}

enum VerificationTier {
	RegistryHint,
	ContextHint,
	AuthorYear,
}

/// Normalized surname token of the work's first listed author.
pub fn first_author_token(work: &Work) -> String {
	work.authors
		.first()
		.map(|name| normalize_author_token(name.split_whitespace().last().unwrap_or("")))
		.unwrap_or_default()
}

/// Scores one candidate work against the expected (author, year) key and an
/// optional title hint. Year match +4.0; exact first author +3.0, else +1.0
/// anywhere in the author list; up to +3.0 scaled by title similarity; +0.5
/// when a DOI is exposed.
pub fn score_work(work: &Work, key: &AtomKey, hinted_title: Option<&str>) -> f64 {
	let mut score = 0.0;

	if work.year == key.year {
		score += 4.0;
	}

	let author_tokens: Vec<String> = work
		.authors
		.iter()
		.filter(|name| !name.trim().is_empty())
		.map(|name| normalize_author_token(name.split_whitespace().last().unwrap_or("")))
		.collect();

	if !key.author.is_empty() && first_author_token(work) == key.author {
		score += 3.0;
	} else if !key.author.is_empty() && author_tokens.contains(&key.author) {
		score += 1.0;
	}

	if let Some(hint) = hinted_title {
		score += title_similarity(hint, &work.title) * 3.0;
	}

	if !work.doi.is_empty() {
		score += 0.5;
	}

	score
}

fn verify(
	tier: &VerificationTier,
	work: &Work,
	key: &AtomKey,
	plain_year: &str,
	hinted_title: Option<&str>,
	best_score: f64,
	second_score: f64,
) -> bool {
	let exact_year = work.year == plain_year;
	let exact_author = first_author_token(work) == key.author;

	if !exact_year || !exact_author {
		return false;
	}

	let title_ratio =
		hinted_title.map(|hint| title_similarity(hint, &work.title)).unwrap_or(0.0);

	match tier {
		VerificationTier::RegistryHint => title_ratio >= REGISTRY_TITLE_SIMILARITY,
		VerificationTier::ContextHint => title_ratio >= CONTEXT_TITLE_SIMILARITY,
		VerificationTier::AuthorYear => {
			let gap = best_score - second_score.max(-1.0);

			best_score >= UNHINTED_MIN_SCORE && gap >= UNHINTED_MIN_GAP
		},
	}
}

async fn search_or_empty(provider: &dyn WorksProvider, query: &str, year: &str) -> Vec<Work> {
	match provider.search(query, year).await {
		Ok(works) => works,
		Err(err) => {
			tracing::warn!(error = %err, query, year, "Works search degraded to zero candidates.");

			Vec::new()
		},
	}
}

fn round4(value: f64) -> f64 {
	(value * 10_000.0).round() / 10_000.0
}

/// Resolves every atom sequentially, consulting the per-pass cache before any
/// external query. Failure is isolated per atom; the loop never aborts.
pub async fn resolve_atoms(
	provider: &dyn WorksProvider,
	registry: &Registry,
	hints: &TitleHints,
	atoms: &[CitationAtom],
) -> ResolveOutcome {
	let mut cache: HashMap<String, Option<CitationResolution>> = HashMap::new();
	let mut matched: Vec<CitationResolution> = Vec::new();
	let mut unresolved: Vec<String> = Vec::new();
	let mut link_map: BTreeMap<AtomKey, String> = BTreeMap::new();

	for atom in atoms {
		if let Some(cached) = cache.get(atom.as_str()) {
			match cached {
				Some(resolution) => {
					link_map.insert(atom.key(), resolution.doi_or_url.clone());
					matched.push(resolution.clone());
				},
				None => unresolved.push(atom.as_str().to_string()),
			}
			continue;
		}

		let key = atom.key();
		let registry_candidates = candidates(registry, atom);
		let mut hinted_title = select_trusted_title(atom, &registry_candidates, hints);
		let mut source = if hinted_title.is_some() {
			ResolutionSource::Registry
		} else {
			ResolutionSource::Search
		};

		if hinted_title.is_none() && registry_candidates.is_empty() {
			if let Some(hint) = hints.unique(&key) {
				hinted_title = Some(hint.to_string());
				source = ResolutionSource::ContextTitle;
			}
		}

		let plain_year = atom.plain_year();
		let works = if let Some(hint) = hinted_title.as_deref() {
			let by_title = search_or_empty(provider, hint, plain_year).await;

			if by_title.is_empty() {
				search_or_empty(provider, &format!("{hint} {}", key.year), plain_year).await
			} else {
				by_title
			}
		} else if !registry_candidates.is_empty() {
			// Ambiguous corpus citation with no disambiguating hint: abstain
			// rather than link to the wrong paper.
			Vec::new()
		} else {
			search_or_empty(provider, &format!("{} {}", atom.first_author(), key.year), plain_year)
				.await
		};

		let mut best: Option<&Work> = None;
		let mut best_score = -1.0_f64;
		let mut second_score = -1.0_f64;

		for work in &works {
			let score = score_work(work, &key, hinted_title.as_deref());

			if score > best_score {
				second_score = best_score;
				best_score = score;
				best = Some(work);
			} else if score > second_score {
				second_score = score;
			}
		}

		let tier = if !registry_candidates.is_empty() {
			VerificationTier::RegistryHint
		} else if hinted_title.is_some() {
			VerificationTier::ContextHint
		} else {
			VerificationTier::AuthorYear
		};
		let verified = best
			.map(|work| {
				verify(
					&tier,
					work,
					&key,
					plain_year,
					hinted_title.as_deref(),
					best_score,
					second_score,
				)
			})
			.unwrap_or(false);

		match (best, verified) {
			(Some(work), true) => {
				let resolution = CitationResolution {
					citation: atom.as_str().to_string(),
					source,
					confidence: round4(best_score),
					work_id: work.id.clone(),
					title: work.title.clone(),
					year: if work.year.is_empty() {
						key.year.clone()
					} else {
						work.year.clone()
					},
					doi_or_url: work.url().to_string(),
					authors: work.authors.clone(),
				};

				tracing::info!(
					citation = atom.as_str(),
					work_id = resolution.work_id.as_str(),
					confidence = resolution.confidence,
					"Citation verified."
				);
				link_map.insert(key, resolution.doi_or_url.clone());
				cache.insert(atom.as_str().to_string(), Some(resolution.clone()));
				matched.push(resolution);
			},
			_ => {
				tracing::debug!(citation = atom.as_str(), "Citation unresolved.");
				cache.insert(atom.as_str().to_string(), None);
				unresolved.push(atom.as_str().to_string());
			},
		}
	}

	// Same atom text never appears twice in the matched list.
	let mut seen: HashMap<String, usize> = HashMap::new();
	let mut deduped: Vec<CitationResolution> = Vec::new();

	for resolution in matched {
		if let Some(index) = seen.get(resolution.citation.as_str()).copied() {
			deduped[index] = resolution;
		} else {
			seen.insert(resolution.citation.clone(), deduped.len());
			deduped.push(resolution);
		}
	}

	ResolveOutcome { matched: deduped, unresolved, link_map }
}

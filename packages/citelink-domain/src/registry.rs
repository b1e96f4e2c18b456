use std::collections::BTreeMap;

use serde::Deserialize;

use crate::{
	atom::{CitationAtom, normalize_author_token},
	hints::TitleHints,
	similarity::title_similarity,
};

/// Minimum similarity between a mined narrative hint and a registry title
/// before the registry title is trusted for disambiguation.
pub const HINT_ACCEPT_SIMILARITY: f64 = 0.72;

/// Corpus-internal paper metadata, built upstream and read-only here.
#[derive(Clone, Debug, Deserialize)]
pub struct RegistryEntry {
	pub paper_id: String,
	pub year: String,
	pub title: String,
	pub first_author: String,
}

/// Paper registry keyed by paper id.
pub type Registry = BTreeMap<String, RegistryEntry>;

/// All registry entries sharing the atom's (author token, year).
pub fn candidates<'a>(registry: &'a Registry, atom: &CitationAtom) -> Vec<&'a RegistryEntry> {
	let year = atom.year();
	let author = normalize_author_token(&atom.first_author());

	if author.is_empty() {
		return Vec::new();
	}

	registry
		.values()
		.filter(|entry| {
			entry.year.trim() == year
				&& normalize_author_token(entry.first_author.trim()) == author
		})
		.collect()
}

/// Picks the trusted title among registry candidates. A single candidate is
/// trusted outright; several candidates need a unique narrative hint whose
/// best-matching title clears [`HINT_ACCEPT_SIMILARITY`]. Anything else stays
/// untrusted, preferring abstention over a risky guess.
pub fn select_trusted_title(
	atom: &CitationAtom,
	candidates: &[&RegistryEntry],
	hints: &TitleHints,
) -> Option<String> {
	match candidates {
		[] => None,
		[only] => {
			let title = only.title.trim();

			(!title.is_empty()).then(|| title.to_string())
		},
		_ => {
			let hint = hints.unique(&atom.key())?;
			let mut scored: Vec<(f64, &str)> = candidates
				.iter()
				.filter_map(|entry| {
					let title = entry.title.trim();

					(!title.is_empty()).then(|| (title_similarity(hint, title), title))
				})
				.collect();

			scored.sort_by(|a, b| b.0.total_cmp(&a.0));

			match scored.first() {
				Some((similarity, title)) if *similarity >= HINT_ACCEPT_SIMILARITY =>
					Some((*title).to_string()),
				_ => None,
			}
		},
	}
}

use std::{collections::BTreeMap, sync::LazyLock};

use regex::Regex;

use crate::atom::{AtomKey, parse_citation_atom};

/// Candidate work titles mined from "*Title* (Author, Year)" narrative
/// patterns, keyed by the citation they annotate.
#[derive(Debug, Default)]
pub struct TitleHints {
	hints: BTreeMap<AtomKey, Vec<String>>,
}

impl TitleHints {
	pub fn get(&self, key: &AtomKey) -> &[String] {
		self.hints.get(key).map(Vec::as_slice).unwrap_or(&[])
	}

	/// The hint is usable for disambiguation only when exactly one distinct
	/// title was mined for the key.
	pub fn unique(&self, key: &AtomKey) -> Option<&str> {
		match self.get(key) {
			[title] => Some(title.as_str()),
			_ => None,
		}
	}

	pub fn is_empty(&self) -> bool {
		self.hints.is_empty()
	}
}

static HINT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"\*([^*\n]{3,240})\*\s*\(([^()\n]{1,120})\)").expect("static pattern")
});

pub fn mine_title_hints(text: &str) -> TitleHints {
	let mut hints: BTreeMap<AtomKey, Vec<String>> = BTreeMap::new();

	for caps in HINT_PATTERN.captures_iter(text) {
		let title = caps[1].split_whitespace().collect::<Vec<_>>().join(" ");
		let Some(atom) = parse_citation_atom(caps[2].trim()) else { continue };
		let bucket = hints.entry(atom.key()).or_default();

		if !bucket.contains(&title) {
			bucket.push(title);
		}
	}

	TitleHints { hints }
}

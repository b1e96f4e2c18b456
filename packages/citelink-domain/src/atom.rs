use std::{collections::BTreeMap, fmt, sync::LazyLock};

use regex::Regex;

use crate::patterns::{PatternKind, PatternTable};

/// Canonical citation mention, always of the form "Author, Year".
#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub struct CitationAtom(String);

impl CitationAtom {
	pub fn as_str(&self) -> &str {
		&self.0
	}

	pub fn year(&self) -> &str {
		self.0.rsplit_once(',').map(|(_, year)| year.trim()).unwrap_or("")
	}

	/// Year with any trailing disambiguation letter removed.
	pub fn plain_year(&self) -> &str {
		let year = self.year();

		if year.len() > 4 { &year[..4] } else { year }
	}

	/// The author portion up to the first "and"/"&"/"et al" marker, last word.
	pub fn first_author(&self) -> String {
		let head = self.0.split_once(',').map(|(head, _)| head).unwrap_or(&self.0).trim();
		let head = match AUTHOR_SPLIT.find(head) {
			Some(found) => head[..found.start()].trim(),
			None => head,
		};

		head.split_whitespace().last().unwrap_or("").trim_matches('.').to_string()
	}

	pub fn key(&self) -> AtomKey {
		AtomKey {
			author: normalize_author_token(&self.first_author()),
			year: self.year().to_string(),
		}
	}
}

impl fmt::Display for CitationAtom {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// Normalized (author token, year) pair identifying a citation regardless of
/// surface casing or spacing.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct AtomKey {
	pub author: String,
	pub year: String,
}

impl fmt::Display for AtomKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}|{}", self.author, self.year)
	}
}

/// Common nouns that regularly precede a bare year without being citations.
const STOPWORD_AUTHORS: &[&str] = &[
	"rest",
	"review",
	"model",
	"models",
	"theory",
	"theories",
	"framework",
	"analysis",
	"dynamics",
	"network",
	"networks",
	"system",
	"systems",
	"brain",
	"brains",
	"landscape",
	"landscapes",
];

static LEADING_MARKER: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?i)^(e\.g\.|i\.e\.|cf\.|see also|see)\s*,?\s*").expect("static pattern")
});
static ATOM_SHAPE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^(.+?),\s*(\d{4}[a-z]?)$").expect("static pattern"));
static AUTHOR_SPLIT: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?i)\set al\.?$|\sand\s|&").expect("static pattern"));

pub fn normalize_author_token(author: &str) -> String {
	author.chars().filter(char::is_ascii_alphabetic).collect::<String>().to_lowercase()
}

fn normalize_space(text: &str) -> String {
	text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn strip_leading_marker(text: &str) -> String {
	let value = normalize_space(text);
	let value = LEADING_MARKER.replace(&value, "");

	value.trim_matches([' ', ',', '.', ';', ':']).to_string()
}

/// Parses one candidate span into a canonical atom, rejecting implausible
/// matches (no letters, runaway fragments, stopword single tokens).
pub fn parse_citation_atom(text: &str) -> Option<CitationAtom> {
	let candidate = strip_leading_marker(text);
	let caps = ATOM_SHAPE.captures(&candidate)?;
	let author = normalize_space(&caps[1]);
	let year = &caps[2];

	if !author.chars().any(|ch| ch.is_alphabetic()) {
		return None;
	}
	if author.chars().count() > 80 {
		return None;
	}

	let plain = author.replace('*', "");
	let plain = plain.trim();
	let lower = plain.to_lowercase();
	let lower = lower.trim_matches(['.', ' ']);

	if !lower.contains("et al") && !lower.contains(" and ") && !plain.contains('&') {
		let tokens: Vec<&str> = plain.split_whitespace().collect();

		if tokens.len() == 1 && STOPWORD_AUTHORS.contains(&tokens[0].to_lowercase().as_str()) {
			return None;
		}
	}

	Some(CitationAtom(format!("{author}, {year}")))
}

/// Extracts the deterministic atom set from narrative text: every surface
/// form in the pattern table, one atom per distinct key, sorted output.
pub fn extract_atoms(table: &PatternTable, text: &str) -> Vec<CitationAtom> {
	let mut raw: Vec<CitationAtom> = Vec::new();

	for (kind, re) in table.iter() {
		match kind {
			PatternKind::ParenBlock =>
				for caps in re.captures_iter(text) {
					for part in caps[1].split(';') {
						raw.extend(parse_citation_atom(part.trim()));
					}
				},
			PatternKind::Backtick =>
				for caps in re.captures_iter(text) {
					raw.extend(parse_citation_atom(&caps[1]));
				},
			PatternKind::NarrativeParen | PatternKind::NarrativeComma =>
				for caps in re.captures_iter(text) {
					let author = normalize_space(&caps["author"].replace('*', ""));
					let year = &caps["year"];

					raw.extend(parse_citation_atom(&format!("{author}, {year}")));
				},
		}
	}

	raw.sort();
	raw.dedup();

	// Collapse casing variants: the lexically-first atom per key wins.
	let mut by_key: BTreeMap<AtomKey, CitationAtom> = BTreeMap::new();

	for atom in raw {
		by_key.entry(atom.key()).or_insert(atom);
	}

	by_key.into_values().collect()
}

use regex::Regex;

/// Surface forms a citation mention can take in narrative text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PatternKind {
	/// "(Smith, 2019)" or "(Smith, 2019; Jones, 2020)".
	ParenBlock,
	/// "`Smith, 2019`" left behind by model output.
	Backtick,
	/// "Smith (2019)" in running prose.
	NarrativeParen,
	/// "Smith, 2019" in running prose, no parentheses.
	NarrativeComma,
}

/// Ordered table of compiled citation patterns. Built once and passed around;
/// extraction walks the table in declaration order.
pub struct PatternTable {
	patterns: Vec<(PatternKind, Regex)>,
}

const AUTHOR_WORD: &str = r"[A-Z][A-Za-z\u{C0}-\u{D6}\u{D8}-\u{F6}\u{F8}-\u{FF}'`\-]+";

impl PatternTable {
	pub fn new() -> Self {
		let narrative_author = format!(
			r"(?P<author>\*?{AUTHOR_WORD}(?:\s+(?:et al\.|and\s+{AUTHOR_WORD}|&\s*{AUTHOR_WORD}))?\*?)"
		);
		let patterns = vec![
			(PatternKind::ParenBlock, Regex::new(r"\(([^()\n]{1,240})\)").expect("static pattern")),
			(PatternKind::Backtick, Regex::new(r"`([^`\n]{1,200})`").expect("static pattern")),
			(
				PatternKind::NarrativeParen,
				Regex::new(&format!(r"(?P<full>{narrative_author}\s*\((?P<year>\d{{4}}[a-z]?)\))"))
					.expect("static pattern"),
			),
			(
				PatternKind::NarrativeComma,
				Regex::new(&format!(r"(?P<full>{narrative_author}\s*,\s*(?P<year>\d{{4}}[a-z]?))"))
					.expect("static pattern"),
			),
		];

		Self { patterns }
	}

	pub fn iter(&self) -> impl Iterator<Item = (PatternKind, &Regex)> {
		self.patterns.iter().map(|(kind, re)| (*kind, re))
	}

	pub fn get(&self, kind: PatternKind) -> &Regex {
		&self
			.patterns
			.iter()
			.find(|(k, _)| *k == kind)
			.expect("all kinds are registered")
			.1
	}
}

impl Default for PatternTable {
	fn default() -> Self {
		Self::new()
	}
}

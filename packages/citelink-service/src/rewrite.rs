use std::sync::LazyLock;

use regex::{Captures, Regex};

use citelink_domain::{PatternKind, PatternTable, parse_citation_atom};

use crate::{LinkMap, resolve::CitationResolution};

static LINKED_CITATION: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"\[([^\]\n]{1,200}?\d{4}[a-z]?[^\]\n]{0,80})\]\(https?://[^)\n]+\)")
		.expect("static pattern")
});
static BACKTICK_PAREN: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?i)`\s*\(([^`()]{1,120}?,\s*\d{4}[a-z]?)\)\s*`").expect("static pattern")
});
static BACKTICK_BARE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?i)`\s*([^`()]{1,120}?,\s*\d{4}[a-z]?)\s*`").expect("static pattern")
});
static DOUBLED_PARENS: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(
		r"\(\s*\(\s*(\[[^\]\n]{1,200}\]\(https?://[^)\n]+\)|[A-Za-z][^()\n]{0,120}?,\s*\d{4}[a-z]?)\s*\)\s*\)",
	)
	.expect("static pattern")
});
static PAREN_LEADING_COMMA: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\(\s*,\s*").expect("static pattern"));
static EMPTY_PARENS: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\(\s*\)").expect("static pattern"));
static SPACE_BEFORE_LINK: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\(\s+\[").expect("static pattern"));
static SPACE_AFTER_LINK: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\]\s+\)").expect("static pattern"));

/// Pass 1: drop existing hyperlinks whose visible text looks like a citation
/// span, so re-running enrichment never nests links.
pub fn unlink_citation_links(text: &str) -> String {
	LINKED_CITATION.replace_all(text, "${1}").into_owned()
}

/// Pass 2: strip backticks wrapping citation-like fragments.
pub fn strip_citation_backticks(text: &str) -> String {
	let out = BACKTICK_PAREN.replace_all(text, "(${1})").into_owned();

	BACKTICK_BARE.replace_all(&out, "${1}").into_owned()
}

/// Pass 3: link verified sub-citations inside parenthetical blocks. Blocks
/// with zero resolvable atoms are left untouched.
pub fn link_parenthetical_citations(
	table: &PatternTable,
	text: &str,
	link_map: &LinkMap,
) -> String {
	table
		.get(PatternKind::ParenBlock)
		.replace_all(text, |caps: &Captures| {
			let mut changed = false;
			let parts: Vec<String> = caps[1]
				.split(';')
				.map(|part| {
					let part = part.trim();
					let Some(atom) = parse_citation_atom(part) else { return part.to_string() };

					match link_map.get(&atom.key()) {
						Some(url) => {
							changed = true;

							format!("[{atom}]({url})")
						},
						None => part.to_string(),
					}
				})
				.collect();

			if changed { format!("({})", parts.join("; ")) } else { caps[0].to_string() }
		})
		.into_owned()
}

/// Pass 4: link narrative citation forms, skipping spans that are already a
/// link target and spans bounded by a lone emphasis marker.
pub fn link_narrative_citations(table: &PatternTable, text: &str, link_map: &LinkMap) -> String {
	let out = link_with_pattern(table.get(PatternKind::NarrativeParen), text, link_map);

	link_with_pattern(table.get(PatternKind::NarrativeComma), &out, link_map)
}

fn link_with_pattern(re: &Regex, text: &str, link_map: &LinkMap) -> String {
	re.replace_all(text, |caps: &Captures| {
		let full = caps.name("full").expect("pattern carries a full group");
		let fragment = full.as_str();

		// Already the visible text of a markdown link.
		if full.start() > 0
			&& text.as_bytes()[full.start() - 1] == b'['
			&& text.get(full.end()..full.end() + 2) == Some("](")
		{
			return fragment.to_string();
		}
		// A single emphasis marker means the span is half of an italicized
		// title; linking it would corrupt the emphasis.
		if fragment.matches('*').count() == 1 {
			return fragment.to_string();
		}

		let author = caps["author"].replace('*', "");
		let author = author.split_whitespace().collect::<Vec<_>>().join(" ");
		let year = &caps["year"];
		let Some(atom) = parse_citation_atom(&format!("{author}, {year}")) else {
			return fragment.to_string();
		};

		match link_map.get(&atom.key()) {
			Some(url) => format!("[{fragment}]({url})"),
			None => fragment.to_string(),
		}
	})
	.into_owned()
}

/// Pass 5: cosmetic cleanup, iterated to a fixed point (at most 3 rounds).
pub fn cleanup_citation_parentheses(text: &str) -> String {
	let mut out = text.to_string();

	for _ in 0..3 {
		let mut next = DOUBLED_PARENS.replace_all(&out, "(${1})").into_owned();

		next = PAREN_LEADING_COMMA.replace_all(&next, "(").into_owned();
		next = EMPTY_PARENS.replace_all(&next, "").into_owned();
		next = SPACE_BEFORE_LINK.replace_all(&next, "([").into_owned();
		next = SPACE_AFTER_LINK.replace_all(&next, "])").into_owned();

		if next == out {
			break;
		}

		out = next;
	}

	out
}

/// Runs the five ordered passes over the document body.
pub fn rewrite_document(table: &PatternTable, text: &str, link_map: &LinkMap) -> String {
	let body = unlink_citation_links(text);
	let body = strip_citation_backticks(&body);
	let body = link_parenthetical_citations(table, &body, link_map);
	let body = link_narrative_citations(table, &body, link_map);

	cleanup_citation_parentheses(&body)
}

/// Renders the trailing verified-references and unresolved-citations block.
pub fn references_markdown(
	matched: &[CitationResolution],
	unresolved: &[String],
	max_authors: usize,
) -> String {
	let mut lines = vec!["# References (Verified)".to_string(), String::new()];

	if matched.is_empty() {
		lines.push("- No references could be verified.".to_string());
	} else {
		let mut sorted: Vec<&CitationResolution> = matched.iter().collect();

		sorted.sort_by_key(|item| (item.citation.to_lowercase(), item.year.clone()));

		for item in sorted {
			let author_text = if item.authors.is_empty() {
				citation_first_author(&item.citation)
			} else {
				item.authors.iter().take(max_authors).cloned().collect::<Vec<_>>().join(", ")
			};
			let year = if item.year.is_empty() {
				item.citation.rsplit(',').next().unwrap_or("").trim().to_string()
			} else {
				item.year.clone()
			};
			let link = if item.doi_or_url.is_empty() { &item.work_id } else { &item.doi_or_url };

			lines.push(format!("- {author_text} ({year}). {}. [{link}]({link})", item.title));
		}
	}

	lines.push(String::new());
	lines.push("## Unresolved Citations".to_string());
	lines.push(String::new());

	let unresolved = sort_unresolved(unresolved);

	if unresolved.is_empty() {
		lines.push("- None".to_string());
	} else {
		for citation in unresolved {
			lines.push(format!("- {citation}"));
		}
	}

	lines.join("\n").trim().to_string() + "\n"
}

/// Sorted case-insensitively, exact duplicates removed.
pub fn sort_unresolved(unresolved: &[String]) -> Vec<String> {
	let mut out: Vec<String> = unresolved.to_vec();

	out.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b)));
	out.dedup();

	out
}

fn citation_first_author(citation: &str) -> String {
	parse_citation_atom(citation).map(|atom| atom.first_author()).unwrap_or_default()
}

use citelink_domain::parse_citation_atom;

use crate::resolve::CitationResolution;

/// Renders all verified resolutions as BibTeX. Returns an empty string when
/// nothing was verified; callers must not write an empty artifact.
pub fn render_bibliography(matched: &[CitationResolution]) -> String {
	if matched.is_empty() {
		return String::new();
	}

	let entries: Vec<String> = matched
		.iter()
		.enumerate()
		.map(|(index, item)| render_entry(item, &format!("work{:03}", index + 1)))
		.collect();

	entries.join("\n\n").trim().to_string() + "\n"
}

pub fn render_entry(item: &CitationResolution, key_suffix: &str) -> String {
	let first_author = parse_citation_atom(&item.citation)
		.map(|atom| atom.first_author())
		.unwrap_or_default();
	let key_author = non_empty_or(sanitize(&first_author), "ref");
	let key_year = non_empty_or(sanitize(&item.year), "nd");
	let key = format!("{key_author}{key_year}_{key_suffix}");
	let author = if item.authors.is_empty() {
		non_empty_or(first_author, "Unknown")
	} else {
		item.authors.join(" and ")
	};
	let year = non_empty_or(item.year.clone(), "n.d.");
	let mut lines = vec![
		format!("@article{{{key},"),
		format!("  author = {{{}}},", escape_braces(&author)),
		format!("  title = {{{}}},", escape_braces(&item.title)),
		format!("  year = {{{year}}},"),
	];

	if let Some(doi) = item.doi_or_url.strip_prefix("https://doi.org/") {
		lines.push(format!("  doi = {{{doi}}},"));
		lines.push(format!("  url = {{{}}},", item.doi_or_url));
	} else if !item.doi_or_url.is_empty() {
		lines.push(format!("  url = {{{}}},", item.doi_or_url));
	}
	if !item.work_id.is_empty() {
		lines.push(format!("  note = {{{}}},", item.work_id));
	}

	lines.push("}".to_string());

	lines.join("\n")
}

fn sanitize(value: &str) -> String {
	value.chars().filter(char::is_ascii_alphanumeric).collect()
}

fn escape_braces(value: &str) -> String {
	value.replace('{', "\\{").replace('}', "\\}")
}

fn non_empty_or(value: String, fallback: &str) -> String {
	if value.is_empty() { fallback.to_string() } else { value }
}

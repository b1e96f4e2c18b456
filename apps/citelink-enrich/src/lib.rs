use std::{collections::BTreeMap, fs, path::PathBuf};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use citelink_domain::Registry;
use citelink_service::{EnrichOptions, EnrichOutcome, HttpWorksProvider, enrich};

#[derive(Debug, Parser)]
#[command(
	version = citelink_cli::VERSION,
	rename_all = "kebab",
	styles = citelink_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	/// Narrative markdown document to enrich.
	#[arg(long, value_name = "FILE")]
	pub report: PathBuf,
	/// JSON paper registry keyed by paper id; omit to resolve against the
	/// external service only.
	#[arg(long, value_name = "FILE")]
	pub registry: Option<PathBuf>,
	/// Output directory; defaults to the report's directory.
	#[arg(long, value_name = "DIR")]
	pub out_dir: Option<PathBuf>,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = citelink_config::load(&args.config)?;
	let filter = EnvFilter::new(config.service.log_level.clone());

	tracing_subscriber::fmt().with_env_filter(filter).init();

	let report_text = fs::read_to_string(&args.report)?;
	let registry: Registry = match &args.registry {
		Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
		None => Registry::new(),
	};
	let provider = HttpWorksProvider::new(&config)?;
	let options = EnrichOptions {
		max_reference_authors: config.output.max_reference_authors,
		api_key_present: provider.api_key_present(),
	};
	let outcome = enrich(&provider, &registry, &report_text, &options).await?;

	write_outputs(&args, &outcome)?;

	tracing::info!(
		citations = outcome.stats.citation_count,
		matched = outcome.stats.matched_count,
		unresolved = outcome.stats.unresolved_count,
		"Enrichment pass finished."
	);

	Ok(())
}

fn write_outputs(args: &Args, outcome: &EnrichOutcome) -> color_eyre::Result<()> {
	let out_dir = match &args.out_dir {
		Some(dir) => dir.clone(),
		None => args.report.parent().map(PathBuf::from).unwrap_or_else(|| ".".into()),
	};

	fs::create_dir_all(&out_dir)?;

	let stem = args.report.file_stem().and_then(|stem| stem.to_str()).unwrap_or("report");

	fs::write(out_dir.join(format!("{stem}_enriched.md")), &outcome.report_text)?;

	let link_map: BTreeMap<String, String> =
		outcome.link_map.iter().map(|(key, url)| (key.to_string(), url.clone())).collect();
	let records = serde_json::json!({
		"matches": outcome.matches,
		"unresolved": outcome.unresolved,
		"link_map": link_map,
		"api_key_present": outcome.api_key_present,
		"stats": outcome.stats,
	});

	fs::write(out_dir.join("resolutions.json"), serde_json::to_string_pretty(&records)?)?;

	// An empty bibliography must not leave an empty artifact behind.
	if !outcome.bibtex.is_empty() {
		fs::write(out_dir.join("references.bib"), &outcome.bibtex)?;
	}

	Ok(())
}

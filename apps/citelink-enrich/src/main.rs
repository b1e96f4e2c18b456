use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = citelink_enrich::Args::parse();
	citelink_enrich::run(args).await
}

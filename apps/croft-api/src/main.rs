use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = croft_api::Args::parse();
	croft_api::run(args).await
}

use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = croft_worker::Args::parse();
	croft_worker::run(args).await
}

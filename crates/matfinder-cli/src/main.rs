use clap::Parser;
use tracing_subscriber::EnvFilter;

mod run;
mod snapshot;

#[derive(Debug, Parser)]
#[command(name = "matfinder-enrich")]
#[command(about = "Scrape gym websites and persist enrichment data")]
struct Cli {
    /// Scrape and write the snapshot, but skip the durable persistence step.
    #[arg(long)]
    dry_run: bool,

    /// Cap how many seed gyms are loaded this run.
    #[arg(long)]
    limit: Option<i64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = matfinder_core::load_app_config()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    run::run(&config, cli.limit, cli.dry_run).await
}

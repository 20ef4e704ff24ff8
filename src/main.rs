use anyhow::Result;
use tracing_subscriber::EnvFilter;

use ispcheck::app::App;
use ispcheck::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Progress goes to stderr; stdout carries prompts and results only.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| cli.log_filter().into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let code = App::run(&cli).await?;
    std::process::exit(code);
}

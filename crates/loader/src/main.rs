use anyhow::Result;
use clap::Parser;
use cpiquery_loader::{report, run, Cli};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("cpiquery_loader=info".parse()?),
        )
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    match run(cli).await {
        Ok(summary) => {
            println!("{}", report(&summary));
            Ok(())
        }
        Err(e) => {
            eprintln!("[cpi-loader error] {e:?}");
            std::process::exit(1);
        }
    }
}

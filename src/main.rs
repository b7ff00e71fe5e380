use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use lectern::app::AppContext;
use lectern::cli::{commands, Cli, Commands};
use lectern::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;
    let ctx = if cli.ephemeral {
        AppContext::in_memory(&config)?
    } else {
        AppContext::new(&config)?
    };

    match cli.command {
        Commands::Open { url } => {
            commands::open(&ctx, &url).await?;
        }
        Commands::Fetch { url } => {
            commands::fetch(&ctx, &url).await?;
        }
        Commands::Show { stable_id } => {
            commands::show(&ctx, &stable_id).await?;
        }
        Commands::List => {
            commands::list(&ctx)?;
        }
        Commands::Sites => {
            commands::sites(&ctx)?;
        }
    }

    Ok(())
}

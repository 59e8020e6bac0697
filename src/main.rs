use clap::Parser;

use flagbot::config::{Cli, Config};

#[tokio::main]
async fn main() -> flagbot::error::Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("flagbot=info,serenity=warn"),
    )
    .init();
    log::info!("Starting flagbot Discord bot");

    // .env must be loaded before clap reads env fallbacks
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let result = match Config::from_cli(cli) {
        Ok(config) => flagbot::bot::run(config).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => {
            log::info!("Bot shut down successfully");
            Ok(())
        }
        Err(e) if e.is_startup() => {
            log::error!("Startup failed: {e}");
            Err(e)
        }
        Err(e) => {
            log::error!("Bot encountered an error: {e}");
            Err(e)
        }
    }
}

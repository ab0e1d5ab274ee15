mod cli;
mod config;
mod import;
mod storage;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands};
use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let args = Cli::parse();
    let config = Config::load()?;
    let pool = storage::init_pool(&config.database_path()).await?;

    match args.command {
        Commands::Import {
            file,
            label,
            dry_run,
            json,
            batch_size,
        } => {
            cli::commands::import::handle_import(
                &pool, &config, file, label, dry_run, json, batch_size,
            )
            .await
        }
        Commands::List {
            status,
            limit,
            offset,
            json,
        } => cli::commands::list::handle_list(&pool, status, limit, offset, json).await,
        Commands::Show {
            license_number,
            json,
        } => cli::commands::show::handle_show(&pool, &config, license_number, json).await,
        Commands::Stats { json } => cli::commands::stats::handle_stats(&pool, json).await,
    }
}

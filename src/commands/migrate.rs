//! Migrate command - Database migration management.

use super::{connect, print_json};
use crate::cli::args::{MigrateAction, MigrateArgs};
use crate::config::Config;
use crate::domain::Fingerprint;
use crate::errors::AppResult;
use crate::infra::fingerprint_tree;
use crate::services::BootstrapService;

/// Execute the migrate command
pub async fn execute(args: MigrateArgs, config: Config) -> AppResult<()> {
    match args.action {
        MigrateAction::Up {
            previous_fingerprint,
        } => {
            tracing::info!("Running pending migrations...");
            let services = connect(&config).await?;
            let completion = services
                .bootstrap()
                .migrate(previous_fingerprint.map(Fingerprint::new))
                .await?;
            print_json(&completion)?;
        }
        MigrateAction::Status => {
            tracing::info!("Checking migration status...");
            let services = connect(&config).await?;
            for set in services.bootstrap().status().await? {
                println!("{} ({})", set.set, set.ledger);
                for file in set.files {
                    println!("  {}: {}", file.name, file.state);
                }
            }
        }
        MigrateAction::Fingerprint => {
            println!("{}", fingerprint_tree(&config.migrations_dir).await?);
        }
    }

    Ok(())
}

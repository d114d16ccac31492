//! Schema management and bootstrap for the consignment database.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use sea_orm_migration::MigratorTrait;
use tokio::sync::mpsc;
use tracing::info;

use consignment_api::{
    config, db,
    events::EventSender,
    migrator::Migrator,
    services::registration::RegistrationService,
};

#[derive(Parser)]
#[command(name = "migration", about = "Manage the consignment-api database schema", version)]
struct Cli {
    #[arg(
        long,
        env = "DATABASE_URL",
        help = "Database URL; defaults to the application configuration"
    )]
    database_url: Option<String>,

    #[command(subcommand)]
    command: MigrationCommand,
}

#[derive(Subcommand)]
enum MigrationCommand {
    /// Apply pending migrations
    Up {
        #[arg(long, help = "Apply at most this many migrations")]
        steps: Option<u32>,
    },
    /// Roll back applied migrations
    Down {
        #[arg(long, default_value_t = 1, help = "Number of migrations to roll back")]
        steps: u32,
    },
    /// Show applied and pending migrations
    Status,
    /// Drop every table and re-apply all migrations
    Fresh,
    /// Create a platform administrator account
    CreateAdmin {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        password: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut cfg = config::load_config()?;
    config::init_tracing(cfg.log_level(), cfg.log_json);
    if let Some(url) = cli.database_url {
        cfg.database_url = url;
    }

    info!("Connecting to database");
    let pool = db::establish_connection_from_app_config(&cfg).await?;

    match cli.command {
        MigrationCommand::Up { steps } => {
            Migrator::up(&pool, steps).await?;
            info!("Migrations applied");
        }
        MigrationCommand::Down { steps } => {
            Migrator::down(&pool, Some(steps)).await?;
            info!(steps, "Migrations rolled back");
        }
        MigrationCommand::Status => {
            Migrator::status(&pool).await?;
        }
        MigrationCommand::Fresh => {
            Migrator::fresh(&pool).await?;
            info!("Database recreated");
        }
        MigrationCommand::CreateAdmin {
            email,
            name,
            password,
        } => {
            // Admin creation emits no events; the receiver is never read.
            let (tx, _rx) = mpsc::channel(1);
            let registration = RegistrationService::new(
                Arc::new(pool),
                Arc::new(EventSender::new(tx)),
                Decimal::from(cfg.default_split_percentage),
                cfg.store_code_length,
            );
            let admin = registration.create_admin(&email, &name, &password).await?;
            info!(user_id = %admin.id, email = %admin.email, "Administrator created");
        }
    }

    Ok(())
}

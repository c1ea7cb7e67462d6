//! Migrate command
//!
//! Usage: octo migrate <up|down|status> [--db <PATH>]

use clap::{Args, Subcommand};
use octo_store::config::StoreConfig;
use octo_store::migrations::{apply_migrations, migration_status, rollback_migrations};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// Database path (defaults to OCTO_DB_PATH, then octocore.db)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: MigrateCommand,
}

#[derive(Debug, Subcommand)]
pub enum MigrateCommand {
    /// Apply every pending migration
    Up,
    /// Roll back the most recent migrations
    Down {
        /// Number of migrations to roll back
        #[arg(long, default_value_t = 1)]
        steps: usize,
    },
    /// List migrations and whether they are applied
    Status,
}

/// Execute migrate command
pub fn execute(args: MigrateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let db_path = match args.db {
        Some(path) => path,
        None => StoreConfig::from_env()?.database_path,
    };

    let mut conn = octo_store::db::open(&db_path)?;
    octo_store::db::configure(&conn)?;

    match args.command {
        MigrateCommand::Up => {
            let applied = apply_migrations(&mut conn)?;
            if applied.is_empty() {
                println!("Database is up to date");
            }
            for id in applied {
                println!("✓ Applied {}", id);
            }
        }
        MigrateCommand::Down { steps } => {
            let rolled_back = rollback_migrations(&mut conn, steps)?;
            if rolled_back.is_empty() {
                println!("Nothing to roll back");
            }
            for id in rolled_back {
                println!("✓ Rolled back {}", id);
            }
        }
        MigrateCommand::Status => {
            for status in migration_status(&conn)? {
                match status.applied_at {
                    Some(at) => println!("applied  {}  (at {})", status.id, at),
                    None => println!("pending  {}", status.id),
                }
            }
        }
    }

    Ok(())
}

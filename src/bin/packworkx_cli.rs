use std::{fs, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use packworkx_api::{
    config, db,
    migrator::Migrator,
    models::UserRole,
    openapi::ApiDocV1,
    services::users::{CreateUserRequest, UserService},
};
use sea_orm_migration::MigratorTrait;
use utoipa::OpenApi;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "packworkx", about = "PackWorkX administration CLI", version)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON when available"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply or roll back schema migrations
    #[command(subcommand)]
    Migrate(MigrateCommands),
    /// Create an admin user so the first login is possible
    CreateAdmin {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
        #[arg(long, env = "PACKWORKX_ADMIN_PASSWORD")]
        password: String,
        #[arg(long)]
        company_id: Option<Uuid>,
    },
    /// Write the OpenAPI document to disk
    Openapi {
        #[arg(long, default_value = "openapi/packworkx-api.v1.json")]
        output: PathBuf,
    },
}

#[derive(Subcommand)]
enum MigrateCommands {
    /// Apply all pending migrations
    Up,
    /// Roll back the given number of migrations
    Down {
        #[arg(long, default_value_t = 1)]
        steps: u32,
    },
    /// List applied and pending migrations
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Migrate(command) => handle_migrate(command).await?,
        Commands::CreateAdmin {
            email,
            name,
            password,
            company_id,
        } => handle_create_admin(email, name, password, company_id, cli.json).await?,
        Commands::Openapi { output } => write_openapi(&output)?,
    }

    Ok(())
}

async fn connect() -> Result<db::DbPool> {
    let cfg = config::load_config().context("failed to load configuration")?;
    config::init_tracing(cfg.log_level(), cfg.log_json);
    db::establish_connection_from_app_config(&cfg)
        .await
        .context("failed to connect to the database")
}

async fn handle_migrate(command: MigrateCommands) -> Result<()> {
    let pool = connect().await?;
    match command {
        MigrateCommands::Up => {
            db::run_migrations(&pool)
                .await
                .context("failed to apply migrations")?;
            println!("Migrations applied");
        }
        MigrateCommands::Down { steps } => {
            Migrator::down(&pool, Some(steps))
                .await
                .context("failed to roll back migrations")?;
            println!("Rolled back {} migration(s)", steps);
        }
        MigrateCommands::Status => {
            Migrator::status(&pool)
                .await
                .context("failed to read migration status")?;
        }
    }
    Ok(())
}

async fn handle_create_admin(
    email: String,
    name: String,
    password: String,
    company_id: Option<Uuid>,
    json: bool,
) -> Result<()> {
    let pool = connect().await?;
    let users = UserService::new(Arc::new(pool));
    let user = users
        .create_user(
            CreateUserRequest {
                company_id,
                name,
                email,
                password,
                role: UserRole::Admin,
            },
            None,
        )
        .await
        .context("failed to create admin user")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&user)?);
    } else {
        println!("Admin {} created (id {})", user.email, user.id);
    }
    Ok(())
}

fn write_openapi(output: &PathBuf) -> Result<()> {
    let json = serde_json::to_string_pretty(&ApiDocV1::openapi())?;
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(output, json)?;
    println!("OpenAPI document written to {}", output.display());
    Ok(())
}

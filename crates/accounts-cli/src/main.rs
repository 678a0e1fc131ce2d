//! Accounts CLI - operator tasks against the configured credential store
//!
//! Usage:
//!   accounts hash-password <password>
//!   accounts create-user --fullname <name> --username <username> --password <password> [--role admin]
//!   accounts list-users [--json]
//!   accounts issue-token <user-id>
//!   accounts verify-token <token>
//!
//! Configuration is read the same way as the server (`ACCOUNTS_CONFIG`, then
//! environment variables).

use std::sync::Arc;

use accounts_api::auth::{hash_password_with_config, AuthService, TokenIssuer};
use accounts_api::response::UserResponse;
use accounts_core::{AppConfig, MemoryUserStore, PgUserStore, Role, StoreBackend, UserStore};
use anyhow::Context;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "accounts")]
#[command(about = "User account administration")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print an Argon2id hash of a password
    HashPassword {
        password: String,
    },
    /// Create an account
    CreateUser {
        #[arg(long)]
        fullname: String,
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        /// user or admin
        #[arg(long, default_value = "user")]
        role: Role,
    },
    /// List accounts, newest first
    ListUsers {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Issue a 24 hour bearer token for an account id
    IssueToken {
        user_id: String,
    },
    /// Verify a bearer token and print its subject
    VerifyToken {
        token: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load().context("Failed to load configuration")?;

    match cli.command {
        Commands::HashPassword { password } => {
            let hash = hash_password_with_config(&password, &config.auth.password)?;
            println!("{hash}");
        }
        Commands::CreateUser {
            fullname,
            username,
            password,
            role,
        } => {
            let service = auth_service(&config).await?;
            let id = service
                .create_user(&fullname, &username, &password, Some(role))
                .await?;
            println!("Created {role} account '{username}' with id {id}");
        }
        Commands::ListUsers { json } => {
            let service = auth_service(&config).await?;
            let users: Vec<UserResponse> = service
                .list_all()
                .await?
                .into_iter()
                .map(UserResponse::from)
                .collect();

            if json {
                println!("{}", serde_json::to_string_pretty(&users)?);
            } else {
                println!("{:<36}  {:<20}  {:<6}  FULL NAME", "ID", "USERNAME", "ROLE");
                for user in users {
                    println!(
                        "{:<36}  {:<20}  {:<6}  {}",
                        user.id, user.username, user.role, user.fullname
                    );
                }
            }
        }
        Commands::IssueToken { user_id } => {
            let issuer = TokenIssuer::new(&config.auth.jwt_secret)?;
            println!("{}", issuer.issue(&user_id)?);
        }
        Commands::VerifyToken { token } => {
            let issuer = TokenIssuer::new(&config.auth.jwt_secret)?;
            let subject = issuer.verify(&token).context("Token rejected")?;
            println!("{subject}");
        }
    }

    Ok(())
}

async fn auth_service(config: &AppConfig) -> anyhow::Result<AuthService> {
    config.validate().context("Invalid configuration")?;

    let store: Arc<dyn UserStore> = match config.database.backend {
        StoreBackend::Postgres => {
            let store =
                PgUserStore::connect(&config.database.postgres_url, config.database.pool_size)
                    .await?;
            store.migrate().await?;
            Arc::new(store)
        }
        StoreBackend::Memory => {
            tracing::warn!("STORE_BACKEND=memory: changes made by this command are not persisted");
            Arc::new(MemoryUserStore::new())
        }
    };

    Ok(AuthService::from_config(store, &config.auth)?)
}

use crate::app::App;
use crate::errors::ToolError;
use crate::mcp::server::McpServer;
use crate::services::settings::{Credentials, Settings, ToolTier};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

/// Leostream REST bridge: MCP server plus session and catalog helpers.
#[derive(Debug, Parser)]
#[command(name = "leostream-bridge", version, about)]
pub struct Cli {
    /// Broker base URL, e.g. https://broker.example.org
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Where the session token is kept
    #[arg(long, global = true)]
    pub session_path: Option<PathBuf>,

    /// SQLite endpoint catalog
    #[arg(long, global = true)]
    pub catalog_path: Option<PathBuf>,

    /// Skip TLS certificate verification
    #[arg(long, global = true)]
    pub insecure: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the MCP server on stdio (default)
    Serve {
        /// Tool tier to expose: full or helper
        #[arg(long)]
        tier: Option<String>,
    },

    /// Log in and store a fresh session token
    Login {
        #[arg(long)]
        user: Option<String>,
        /// Falls back to LEOSTREAM_PASSWORD
        #[arg(long)]
        password: Option<String>,
    },

    /// Log the stored session out and forget it
    Logout,

    /// Show the stored session and whether it is still valid
    Status,

    /// Inspect or build the endpoint catalog
    Catalog {
        #[command(subcommand)]
        command: CatalogCommands,
    },
}

#[derive(Debug, Subcommand)]
pub enum CatalogCommands {
    /// Case-sensitive substring search over endpoint paths
    Search { query: String },
    /// Rebuild the catalog from an OpenAPI JSON document
    Import {
        #[arg(long)]
        file: PathBuf,
    },
}

impl Cli {
    /// Environment first, flags on top.
    pub fn settings(&self) -> Result<Settings, ToolError> {
        let mut settings = Settings::from_env()?;
        if let Some(base_url) = &self.base_url {
            let overridden = Settings::new(base_url)?;
            settings.base_url = overridden.base_url;
        }
        if let Some(path) = &self.session_path {
            settings = settings.with_session_path(path.clone());
        }
        if let Some(path) = &self.catalog_path {
            settings = settings.with_catalog_path(path.clone());
        }
        if self.insecure {
            settings.insecure_tls = true;
        }
        if let Some(Commands::Serve { tier: Some(tier) }) = &self.command {
            settings = settings.with_tool_tier(ToolTier::parse(tier)?);
        }
        Ok(settings)
    }
}

fn print_json(value: &Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
    );
}

fn credentials_from_flags(
    user: Option<String>,
    password: Option<String>,
) -> Result<Option<Credentials>, ToolError> {
    match (user, password) {
        (None, None) => Ok(None),
        (Some(user), password) => {
            let password = password
                .or_else(|| crate::utils::paths::env_value("LEOSTREAM_PASSWORD"))
                .ok_or_else(|| {
                    ToolError::invalid_params("--password or LEOSTREAM_PASSWORD is required")
                })?;
            Ok(Some(Credentials::new(user, password)))
        }
        (None, Some(_)) => Err(ToolError::invalid_params("--password needs --user")),
    }
}

pub async fn run(cli: Cli) -> Result<(), ToolError> {
    let app = Arc::new(App::with_settings(cli.settings()?)?);
    match cli.command.unwrap_or(Commands::Serve { tier: None }) {
        Commands::Serve { .. } => McpServer::new(app).run_stdio().await,
        Commands::Login { user, password } => {
            let credentials = credentials_from_flags(user, password)?;
            app.session.create_session(credentials).await?;
            let status = app.session.get_session()?;
            print_json(&serde_json::json!({
                "saved_to": app.session.store().location(),
                "message": status.message(),
            }));
            Ok(())
        }
        Commands::Logout => {
            let receipt = app.session.kill_session().await?;
            print_json(&serde_json::json!({
                "message": format!("Session {} killed successfully.", receipt.token),
                "cleared": receipt.cleared,
            }));
            Ok(())
        }
        Commands::Status => {
            let status = app.session.get_session()?;
            println!("{}", status.message());
            Ok(())
        }
        Commands::Catalog { command } => match command {
            CatalogCommands::Search { query } => {
                let listing: Vec<Value> = app
                    .catalog
                    .search(&query)?
                    .iter()
                    .map(|record| record.to_listing())
                    .collect();
                print_json(&Value::Array(listing));
                Ok(())
            }
            CatalogCommands::Import { file } => {
                let raw = std::fs::read_to_string(&file)?;
                let document: Value = serde_json::from_str(&raw).map_err(|err| {
                    ToolError::invalid_params(format!(
                        "{} is not valid JSON: {}",
                        file.display(),
                        err
                    ))
                })?;
                let rows = app.catalog.import_openapi(&document)?;
                print_json(&serde_json::json!({
                    "rows": rows,
                    "catalog": app.catalog.path().display().to_string(),
                }));
                Ok(())
            }
        },
    }
}

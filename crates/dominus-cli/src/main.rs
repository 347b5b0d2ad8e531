//! Dominus CLI
//!
//! Command-line interface for the Dominus Leads Platform.
//!
//! # Usage
//!
//! ```bash
//! dominus login --username admin --password secret
//! dominus resource list lawyers --filter silva --take 20
//! dominus resource create clients --data '{"name": "Acme Advocacia"}'
//! dominus whoami --format json
//! dominus config set tenant_id acme
//! ```

use std::sync::Arc;

use clap::{Parser, Subcommand};
use dominus_sdk::{ApiClient, ClientConfig, FileStore, MemoryStore, StateStore};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod output;

use commands::config::ConfigCommands;
use commands::resources::ResourceCommands;
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "dominus")]
#[command(version)]
#[command(about = "Dominus Leads Platform command line interface", long_about = None)]
struct Cli {
    /// API endpoint URL
    #[arg(long, env = "DOMINUS_API_URL")]
    api_url: Option<String>,

    /// Tenant identifier override
    #[arg(long, env = "DOMINUS_TENANT_ID")]
    tenant: Option<String>,

    /// Tenant domain format, e.g. "{0}.zensuite.com.br"
    #[arg(long, env = "DOMINUS_TENANT_DOMAIN_FORMAT")]
    tenant_domain_format: Option<String>,

    /// Preferred culture for Accept-Language
    #[arg(long, env = "DOMINUS_CULTURE")]
    culture: Option<String>,

    /// Output format (falls back to the profile's default_format, then
    /// pretty)
    #[arg(long, short, value_enum)]
    format: Option<OutputFormat>,

    /// Profile name from the config file
    #[arg(long, short)]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in with username and password
    Login {
        #[arg(long, short)]
        username: String,
        #[arg(long, short, env = "DOMINUS_PASSWORD")]
        password: String,
    },
    /// Discard the stored session
    Logout,
    /// Show the authenticated user profile
    Whoami,
    /// Work with `/api/app/{resource}` entities
    Resource {
        #[command(subcommand)]
        action: ResourceCommands,
    },
    /// Configure the CLI
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = run(cli).await;
    if let Err(e) = result {
        output::failure(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let command = match cli.command {
        Commands::Config { action } => {
            return commands::config::handle(action, cli.profile.as_deref());
        }
        command => command,
    };

    let file_config = config::Config::load(cli.profile.as_deref())?;
    let format = output::resolve(cli.format, file_config.default_format.as_deref());

    let api_url = cli
        .api_url
        .or(file_config.api_url)
        .unwrap_or_else(|| "https://api.dominusleads.com".to_string());

    let mut client_config = ClientConfig::new(api_url);
    if let Some(format) = cli.tenant_domain_format {
        client_config = client_config.with_tenant_domain_format(format);
    }

    let store: Arc<dyn StateStore> = match FileStore::default_path() {
        Some(path) => Arc::new(FileStore::open(path)),
        None => Arc::new(MemoryStore::new()),
    };

    let client = ApiClient::with_store(client_config, store)?;

    if let Some(tenant) = cli.tenant.or(file_config.tenant_id) {
        client.tenant().set_override(&tenant);
    }
    if let Some(culture) = cli.culture.or(file_config.culture) {
        client.set_culture(&culture);
    }

    match command {
        Commands::Login { username, password } => {
            commands::auth::login(&client, &username, &password).await
        }
        Commands::Logout => commands::auth::logout(&client),
        Commands::Whoami => commands::auth::whoami(&client, format).await,
        Commands::Resource { action } => {
            commands::resources::handle(action, &client, format).await
        }
        Commands::Config { .. } => unreachable!("handled above"),
    }
}

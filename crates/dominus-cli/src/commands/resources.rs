//! Generic resource commands against `/api/app/{resource}`

use anyhow::Context;
use clap::Subcommand;
use dominus_sdk::{ApiClient, ListParams};

use crate::output::{self, OutputFormat};

#[derive(Subcommand)]
pub enum ResourceCommands {
    /// List entities with optional filter and paging
    List {
        name: String,
        #[arg(long)]
        filter: Option<String>,
        #[arg(long)]
        skip: Option<u32>,
        #[arg(long)]
        take: Option<u32>,
    },
    /// Get one entity by id
    Get { name: String, id: String },
    /// Create an entity from a JSON body
    Create {
        name: String,
        #[arg(long, conflicts_with = "file")]
        data: Option<String>,
        #[arg(long, short)]
        file: Option<String>,
    },
    /// Update an entity from a JSON body
    Update {
        name: String,
        id: String,
        #[arg(long, conflicts_with = "file")]
        data: Option<String>,
        #[arg(long, short)]
        file: Option<String>,
    },
    /// Delete an entity by id
    Delete { name: String, id: String },
}

pub async fn handle(
    action: ResourceCommands,
    client: &ApiClient,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match action {
        ResourceCommands::List {
            name,
            filter,
            skip,
            take,
        } => {
            let mut params = ListParams::default();
            if let Some(filter) = filter {
                params = params.filter(filter);
            }
            if let Some(skip) = skip {
                params = params.skip(skip);
            }
            if let Some(take) = take {
                params = params.take(take);
            }

            let page = client.resource::<serde_json::Value>(&name).list(params).await?;
            output::print(&serde_json::to_value(&page)?, format);
        }
        ResourceCommands::Get { name, id } => {
            let entity = client.resource::<serde_json::Value>(&name).get(&id).await?;
            output::print(&entity, format);
        }
        ResourceCommands::Create { name, data, file } => {
            let body = read_body(data, file)?;
            let created = client
                .resource::<serde_json::Value>(&name)
                .create(&body)
                .await?;
            output::print(&created, format);
        }
        ResourceCommands::Update {
            name,
            id,
            data,
            file,
        } => {
            let body = read_body(data, file)?;
            let updated = client
                .resource::<serde_json::Value>(&name)
                .update(&id, &body)
                .await?;
            output::print(&updated, format);
        }
        ResourceCommands::Delete { name, id } => {
            client.resource::<serde_json::Value>(&name).delete(&id).await?;
            output::success(&format!("deleted {name}/{id}"));
        }
    }

    Ok(())
}

fn read_body(data: Option<String>, file: Option<String>) -> anyhow::Result<serde_json::Value> {
    let raw = match (data, file) {
        (Some(data), _) => data,
        (None, Some(path)) => {
            std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?
        }
        (None, None) => anyhow::bail!("provide a JSON body via --data or --file"),
    };

    serde_json::from_str(&raw).context("body is not valid JSON")
}

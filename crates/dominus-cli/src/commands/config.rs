//! CLI configuration commands

use clap::Subcommand;

use crate::config::Config;
use crate::output;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Set a configuration value
    Set { key: String, value: String },
    /// Get a configuration value
    Get { key: String },
    /// List all configuration
    List,
    /// Initialize an empty configuration file
    Init,
}

pub fn handle(action: ConfigCommands, profile: Option<&str>) -> anyhow::Result<()> {
    match action {
        ConfigCommands::Set { key, value } => {
            let mut config = Config::load(profile)?;
            config.set(&key, &value)?;
            config.save(profile)?;
            output::success(&format!("{key} = {value}"));
        }
        ConfigCommands::Get { key } => {
            let config = Config::load(profile)?;
            match config.get(&key)? {
                Some(value) => println!("{value}"),
                None => println!(),
            }
        }
        ConfigCommands::List => {
            let config = Config::load(profile)?;
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigCommands::Init => {
            Config::default().save(profile)?;
            output::success("configuration initialized");
        }
    }

    Ok(())
}

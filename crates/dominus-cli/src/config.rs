//! CLI Configuration

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    pub api_url: Option<String>,
    pub tenant_id: Option<String>,
    pub culture: Option<String>,
    pub default_format: Option<String>,
}

impl Config {
    pub fn load(profile: Option<&str>) -> anyhow::Result<Self> {
        let path = Self::config_path(profile)?;
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, profile: Option<&str>) -> anyhow::Result<()> {
        let path = Self::config_path(profile)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content).with_context(|| format!("writing {}", path.display()))
    }

    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "api_url" => self.api_url = Some(value.to_string()),
            "tenant_id" => self.tenant_id = Some(value.to_string()),
            "culture" => self.culture = Some(value.to_string()),
            "default_format" => self.default_format = Some(value.to_string()),
            other => bail!("unknown config key: {other}"),
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> anyhow::Result<Option<&String>> {
        Ok(match key {
            "api_url" => self.api_url.as_ref(),
            "tenant_id" => self.tenant_id.as_ref(),
            "culture" => self.culture.as_ref(),
            "default_format" => self.default_format.as_ref(),
            other => bail!("unknown config key: {other}"),
        })
    }

    fn config_path(profile: Option<&str>) -> anyhow::Result<PathBuf> {
        let home = dirs::home_dir().context("cannot find home directory")?;
        let filename = match profile {
            Some(p) => format!("config.{p}.toml"),
            None => "config.toml".to_string(),
        };
        Ok(home.join(".dominus").join(filename))
    }
}

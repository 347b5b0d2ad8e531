//! CLI Output

use clap::ValueEnum;
use colored::Colorize;

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    Pretty,
    /// Compact JSON, one document per line
    Json,
}

/// Effective output format: the flag wins, then the profile's persisted
/// `default_format`, then pretty.
pub fn resolve(flag: Option<OutputFormat>, configured: Option<&str>) -> OutputFormat {
    flag.or_else(|| configured.and_then(|name| OutputFormat::from_str(name, true).ok()))
        .unwrap_or(OutputFormat::Pretty)
}

pub fn print(value: &serde_json::Value, format: OutputFormat) {
    match format {
        OutputFormat::Pretty => {
            println!("{}", serde_json::to_string_pretty(value).unwrap_or_default())
        }
        OutputFormat::Json => println!("{}", value),
    }
}

pub fn success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

pub fn failure(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

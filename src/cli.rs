use clap::Parser;
use std::path::PathBuf;

use crate::config::ProviderKind;

/// Mimic - mock API server with synthetic data generation
#[derive(Parser, Debug, Clone)]
#[command(name = "mimic", version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, env = "MIMIC_CONFIG", default_value = "mimic.toml")]
    pub config: PathBuf,

    /// Server host address
    #[arg(long, env = "MIMIC_HOST")]
    pub host: Option<String>,

    /// Server port
    #[arg(long, env = "MIMIC_PORT")]
    pub port: Option<u16>,

    /// Generation backend (faker, openai, anthropic, gemini)
    #[arg(long, env = "MIMIC_PROVIDER", value_parser = parse_provider)]
    pub provider: Option<ProviderKind>,

    /// Model used by the generation backend
    #[arg(long, env = "MIMIC_MODEL")]
    pub model: Option<String>,
}

fn parse_provider(s: &str) -> Result<ProviderKind, String> {
    s.parse()
}

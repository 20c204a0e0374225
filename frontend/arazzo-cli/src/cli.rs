use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "arazzo", about = "Arazzo workflow validation and navigation")]
pub struct Cli {
    /// TOML service config; defaults apply when omitted.
    #[arg(long, env = "ARAZZO_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Report structural and reference problems in a workflow document.
    Validate {
        file: PathBuf,
        /// Skip indexing nearby API descriptions.
        #[arg(long)]
        offline: bool,
    },
    /// Index the API descriptions next to a workflow document.
    Index { file: PathBuf },
    /// Find where an operation id is declared.
    Lookup { file: PathBuf, operation_id: String },
    /// Print the parsed document model.
    Model { file: PathBuf },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

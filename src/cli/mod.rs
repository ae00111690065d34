pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "iiot-objects")]
#[command(about = "IIoT object hierarchy service - HTTP API and maintenance commands")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP API server")]
    Serve {
        #[arg(long, short, help = "Port to listen on (defaults to API_PORT or 3000)")]
        port: Option<u16>,
    },

    #[command(about = "Create the object schema in the configured database")]
    Migrate,

    #[command(about = "Print the object forest")]
    Tree,

    #[command(about = "List the object types offered for selection")]
    Types,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Serve { port } => commands::serve::handle(port).await,
        Commands::Migrate => commands::migrate::handle(output_format).await,
        Commands::Tree => commands::inspect::tree(output_format).await,
        Commands::Types => commands::inspect::types(output_format),
    }
}

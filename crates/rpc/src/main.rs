//! RecordChain CLI - Main entry point

use clap::{Parser, Subcommand};
use recordchain_rpc::{AppConfig, Gateway};
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "recordchain")]
#[command(about = "RecordChain - versioned records and bill endorsement", long_about = None)]
struct Cli {
    /// Data directory path (overrides config and RECORDCHAIN_DATA)
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one contract operation and print the response
    Invoke {
        /// Contract name (bill, category, commodity, goods, users, index)
        contract: String,
        /// Operation name
        function: String,
        /// Operation arguments
        args: Vec<String>,
    },

    /// Print every committed version of a raw key
    History {
        /// Store key
        key: String,
    },

    /// List contracts and their operations
    Contracts,
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    config.apply_env();
    if let Some(data) = cli.data {
        config.data_dir = data;
    }

    let mut gateway = Gateway::open(&config)?;

    match cli.command {
        Commands::Invoke {
            contract,
            function,
            args,
        } => {
            let response = gateway.invoke(&contract, &function, &args);
            println!("{}", response.to_text());
            if !response.is_success() {
                return Ok(ExitCode::FAILURE);
            }
        }

        Commands::History { key } => {
            for version in gateway.history(&key) {
                let line = json!({
                    "txId": version.tx_id,
                    "timestamp": version.timestamp,
                    "isDelete": version.is_delete(),
                    "value": version.value.as_ref().map(|v| String::from_utf8_lossy(v).into_owned()),
                });
                println!("{}", line);
            }
        }

        Commands::Contracts => {
            for contract in gateway.contracts() {
                println!("{}: {}", contract.name(), contract.operations().join(", "));
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

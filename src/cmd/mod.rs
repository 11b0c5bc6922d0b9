use crate::{
    conf::Settings,
    pkg::{client::forms::Tab, server::listen},
    prelude::Result,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod client;
mod deploy;

#[derive(Parser)]
#[command(about = "relays job marketplace actions to the JobMarketplace contract")]
struct Cmd {
    #[command(subcommand)]
    command: Option<SubCommandType>,
}

#[derive(Subcommand)]
enum SubCommandType {
    /// Serve the relay API
    Listen,
    /// Deploy contract bytecode from the default account
    Deploy {
        /// Compiled artifact JSON with a `bytecode` field, or a raw hex file
        #[arg(long)]
        artifact: PathBuf,
    },
    /// Connect a wallet through the ledger node
    Connect {
        /// Keep following account and network changes until ctrl+c
        #[arg(long)]
        watch: bool,
    },
    /// Fill in one form and submit it
    Submit {
        #[arg(value_enum)]
        tab: Tab,
        #[arg(long = "field", value_parser = client::parse_field)]
        fields: Vec<(String, String)>,
    },
}

pub async fn run() -> Result<()> {
    let args = Cmd::parse();
    let settings = Settings::new()?;
    match args.command {
        Some(SubCommandType::Listen) => {
            listen(settings).await?;
        }
        Some(SubCommandType::Deploy { artifact }) => {
            deploy::apply(&settings, &artifact).await?;
        }
        Some(SubCommandType::Connect { watch }) => {
            client::connect(&settings, watch).await?;
        }
        Some(SubCommandType::Submit { tab, fields }) => {
            client::submit(&settings, tab, fields).await?;
        }
        None => {
            tracing::error!("no subcommand passed");
        }
    }
    Ok(())
}

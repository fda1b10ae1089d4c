use std::path::PathBuf;

use anyhow::{Context as _, Result};
use bitcoin::{Network, ScriptBuf};
use btc_swap_core::chain::{ChainParams, check_swap_address, derive_swap_addresses};
use btc_swap_core::swap::{SqliteSwapStore, SwapStore};
use clap::{Parser as _, Subcommand};
use serde_json::json;

#[derive(Debug, clap::Parser)]
struct Args {
    #[arg(long, default_value = "bitcoin", value_parser = parse_network)]
    network: Network,

    #[arg(long)]
    store_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    DeriveAddresses {
        #[arg(long)]
        redeem_script: String,
    },
    CheckAddress {
        #[arg(long)]
        redeem_script: String,

        #[arg(long)]
        address: String,

        #[arg(long)]
        reverse: bool,
    },
    Get {
        #[arg(long)]
        id: String,

        #[arg(long)]
        reverse: bool,
    },
    List {
        #[arg(long)]
        reverse: bool,
    },
    Pending {
        #[arg(long)]
        reverse: bool,
    },
    Refundable {
        #[arg(long)]
        height: u32,
    },
}

fn main() -> Result<()> {
    btc_swap_core::logging::init().context("init logging")?;
    let args = Args::parse();
    let params = ChainParams::from(args.network);

    let out = match args.command {
        Command::DeriveAddresses { redeem_script } => {
            let script = parse_redeem_script(&redeem_script)?;
            let addresses = derive_swap_addresses(&params, &script).context("derive addresses")?;
            serde_json::to_value(addresses)?
        }
        Command::CheckAddress {
            redeem_script,
            address,
            reverse,
        } => {
            let script = parse_redeem_script(&redeem_script)?;
            check_swap_address(&params, &address, &script, reverse)?;

            json!({
              "address": address,
              "reverse": reverse,
              "valid": true,
            })
        }
        Command::Get { id, reverse } => {
            let store = open_store(args.store_path)?;
            if reverse {
                serde_json::to_value(store.get_reverse_swap(&id)?.serialized())?
            } else {
                serde_json::to_value(store.get_swap(&id)?.serialized())?
            }
        }
        Command::List { reverse } => {
            let store = open_store(args.store_path)?;
            if reverse {
                reverse_swaps_json(store.list_reverse_swaps().context("list reverse swaps")?)?
            } else {
                swaps_json(store.list_swaps().context("list swaps")?)?
            }
        }
        Command::Pending { reverse } => {
            let store = open_store(args.store_path)?;
            if reverse {
                reverse_swaps_json(
                    store
                        .list_pending_reverse_swaps()
                        .context("list pending reverse swaps")?,
                )?
            } else {
                swaps_json(store.list_pending_swaps().context("list pending swaps")?)?
            }
        }
        Command::Refundable { height } => {
            let store = open_store(args.store_path)?;
            let swaps = store
                .list_refundable_swaps(height)
                .context("list refundable swaps")?;
            tracing::info!(height, count = swaps.len(), "refundable swaps");
            swaps_json(swaps)?
        }
    };

    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn open_store(path: Option<PathBuf>) -> Result<SqliteSwapStore> {
    let path = path.context("--store-path is required for this command")?;
    Ok(SqliteSwapStore::open(path).context("open sqlite store")?)
}

fn parse_network(s: &str) -> Result<Network, String> {
    s.parse::<Network>().map_err(|e| e.to_string())
}

fn parse_redeem_script(s: &str) -> Result<ScriptBuf> {
    let bytes = hex::decode(s.trim()).context("decode redeem script hex")?;
    Ok(ScriptBuf::from_bytes(bytes))
}

fn swaps_json(swaps: Vec<btc_swap_core::swap::Swap>) -> Result<serde_json::Value> {
    let serialized: Vec<_> = swaps.iter().map(|s| s.serialized()).collect();
    Ok(serde_json::to_value(serialized)?)
}

fn reverse_swaps_json(
    reverse_swaps: Vec<btc_swap_core::swap::ReverseSwap>,
) -> Result<serde_json::Value> {
    let serialized: Vec<_> = reverse_swaps.iter().map(|s| s.serialized()).collect();
    Ok(serde_json::to_value(serialized)?)
}

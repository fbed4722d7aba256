#![doc = include_str!("../README.md")]

mod config;
mod telemetry;

use std::io::Write;

use anyhow::Context;
use clap::Parser;
use config::{CliArgs, Command, WordWidth};
use snowbit::{DecomposedTable, EngineConfig, Snowbit, U256, Word, to_radix_string};
use telemetry::init_telemetry;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    init_telemetry()?;

    let config = EngineConfig::try_from(&args)?;
    let width = WordWidth::for_bits(config.layout.total_bits);
    tracing::info!(
        total_bits = config.layout.total_bits,
        word = ?width,
        location_a = config.location_a,
        location_b = config.location_b,
        policy = %config.policy,
        "engine configured"
    );

    match width {
        WordWidth::U64 => run::<u64>(config, &args.command).await,
        WordWidth::U128 => run::<u128>(config, &args.command).await,
        WordWidth::U256 => run::<U256>(config, &args.command).await,
    }
}

async fn run<W: Word>(config: EngineConfig, command: &Command) -> anyhow::Result<()> {
    let engine = Snowbit::<W>::new(config).context("failed to build the engine")?;
    let mut out = std::io::stdout().lock();

    match *command {
        Command::Generate {
            count,
            radix,
            use_async,
        } => {
            for _ in 0..count {
                let id = if use_async {
                    engine.next_id_tokio().await?
                } else {
                    engine.next_id()?
                };
                writeln!(out, "{}", to_radix_string(id, radix)?)?;
            }
            tracing::debug!(count, "identifiers issued");
        }
        Command::Decompose { ref id, radix } => {
            let id = engine.parse_id(id.trim(), radix)?;
            let parts = engine.decompose(id);
            let widths = engine.layout().widths();
            write!(
                out,
                "{}",
                DecomposedTable {
                    id,
                    parts: &parts,
                    widths,
                }
            )?;
        }
        Command::Describe => writeln!(out, "{}", engine.describe()?)?,
    }

    out.flush()?;
    Ok(())
}

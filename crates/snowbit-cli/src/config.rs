use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use snowbit::{
    DEFAULT_WAIT_TIMEOUT, EngineConfig, LayoutConfig, MAX_RADIX, MIN_RADIX, Policy, SystemClock,
    TimePrecision, TimeSource,
};

/// Command-line and environment configuration for the `snowbit` binary.
///
/// Every layout and identity setting can also come from a `SNOWBIT_*`
/// environment variable or a `.env` file, so a deployment can pin its layout
/// once and only pass the subcommand.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "snowbit",
    version,
    about = "Generate and decode configurable Snowflake-style IDs"
)]
pub struct CliArgs {
    /// Identifier width including the reserved top bit.
    ///
    /// Environment variable: `SNOWBIT_TOTAL_BITS`
    #[arg(long, global = true, env = "SNOWBIT_TOTAL_BITS", default_value_t = 64)]
    pub total_bits: u32,

    /// Time field granularity: `second` or `millisecond`.
    ///
    /// Environment variable: `SNOWBIT_TIME_PRECISION`
    #[arg(long, global = true, env = "SNOWBIT_TIME_PRECISION", default_value_t = TimePrecision::Millisecond)]
    pub time_precision: TimePrecision,

    /// Epoch in milliseconds since 1970-01-01 UTC.
    ///
    /// Changing it after IDs have been issued can reissue an existing ID.
    ///
    /// Environment variable: `SNOWBIT_EPOCH_MS`
    #[arg(long, global = true, env = "SNOWBIT_EPOCH_MS", default_value_t = 1_640_995_200_000)]
    pub epoch_ms: u64,

    /// Environment variable: `SNOWBIT_TIME_BITS`
    #[arg(long, global = true, env = "SNOWBIT_TIME_BITS", default_value_t = 41)]
    pub time_bits: u32,

    /// Environment variable: `SNOWBIT_LOCATION_A_BITS`
    #[arg(long, global = true, env = "SNOWBIT_LOCATION_A_BITS", default_value_t = 5)]
    pub location_a_bits: u32,

    /// Environment variable: `SNOWBIT_LOCATION_B_BITS`
    #[arg(long, global = true, env = "SNOWBIT_LOCATION_B_BITS", default_value_t = 5)]
    pub location_b_bits: u32,

    /// At least 10.
    ///
    /// Environment variable: `SNOWBIT_SEQUENCE_BITS`
    #[arg(long, global = true, env = "SNOWBIT_SEQUENCE_BITS", default_value_t = 12)]
    pub sequence_bits: u32,

    /// Data-center style identity of this instance.
    ///
    /// Every concurrently running instance must own a distinct
    /// `(location_a, location_b)` pair.
    ///
    /// Environment variable: `SNOWBIT_LOCATION_A`
    #[arg(long, global = true, env = "SNOWBIT_LOCATION_A", default_value_t = 0)]
    pub location_a: u64,

    /// Worker style identity of this instance.
    ///
    /// Environment variable: `SNOWBIT_LOCATION_B`
    #[arg(long, global = true, env = "SNOWBIT_LOCATION_B", default_value_t = 0)]
    pub location_b: u64,

    /// Reaction to clock rollback and slot exhaustion: `resilient` or `strict`.
    ///
    /// Environment variable: `SNOWBIT_POLICY`
    #[arg(long, global = true, env = "SNOWBIT_POLICY", default_value_t = Policy::Resilient)]
    pub policy: Policy,

    /// Upper bound in milliseconds for a strict wait. `0` waits indefinitely.
    ///
    /// Environment variable: `SNOWBIT_WAIT_TIMEOUT_MS`
    #[arg(long, global = true, env = "SNOWBIT_WAIT_TIMEOUT_MS", default_value_t = DEFAULT_WAIT_TIMEOUT.as_millis() as u64)]
    pub wait_timeout_ms: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Issue identifiers, one per line.
    Generate {
        #[arg(short = 'n', long, default_value_t = 1)]
        count: u64,

        #[arg(short, long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(i64::from(MIN_RADIX)..=i64::from(MAX_RADIX)))]
        radix: u32,

        /// Wait for exhausted slots on the async runtime instead of spinning.
        #[arg(long = "async", default_value_t = false)]
        use_async: bool,
    },

    /// Split an identifier into its fields.
    Decompose {
        id: String,

        #[arg(short, long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(i64::from(MIN_RADIX)..=i64::from(MAX_RADIX)))]
        radix: u32,
    },

    /// Print the engine layout, identity and counters.
    Describe,
}

/// The integer type a layout is carried in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WordWidth {
    U64,
    U128,
    U256,
}

impl WordWidth {
    /// The narrowest word that holds `total_bits`.
    pub const fn for_bits(total_bits: u32) -> Self {
        if total_bits <= u64::BITS {
            Self::U64
        } else if total_bits <= u128::BITS {
            Self::U128
        } else {
            Self::U256
        }
    }
}

impl TryFrom<&CliArgs> for EngineConfig {
    type Error = anyhow::Error;

    fn try_from(args: &CliArgs) -> Result<Self, Self::Error> {
        let layout = LayoutConfig {
            total_bits: args.total_bits,
            time_precision: args.time_precision,
            epoch: Duration::from_millis(args.epoch_ms),
            time_bits: args.time_bits,
            location_a_bits: args.location_a_bits,
            location_b_bits: args.location_b_bits,
            sequence_bits: args.sequence_bits,
        };
        let wait_timeout = match args.wait_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        };
        let config = Self::new(args.location_a, args.location_b)
            .with_layout(layout)
            .with_policy(args.policy)
            .with_wait_timeout(wait_timeout);

        // Check against the widest word; the engine re-checks against the
        // word it is built on.
        config
            .validate::<snowbit::U256>(SystemClock.current_millis())
            .context("invalid snowbit configuration")?;

        Ok(config)
    }
}

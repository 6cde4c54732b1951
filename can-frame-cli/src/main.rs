//! CAN Frame Codec CLI Application
//!
//! Command-line front end for the can-frame-codec library:
//! - Lists the messages of a schema file
//! - Encodes signal values into frame bytes
//! - Decodes frame bytes into signal values
//! - Shows each message's initial values and initial frame

use anyhow::{Context, Result};
use can_frame_codec::{MessageKey, SchemaSet, SignalValues};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod config;

/// CAN Frame Codec - Encode and decode CAN frames from a signal schema
#[derive(Parser, Debug)]
#[command(name = "can-frame-cli")]
#[command(about = "Encode and decode CAN frames from a signal schema", long_about = None)]
#[command(version)]
struct Args {
    /// Path to the schema file (.toml or .json)
    #[arg(short, long, value_name = "FILE")]
    schema: PathBuf,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every message in the schema
    List,

    /// Encode signal values into frame bytes (printed as hex)
    Encode {
        /// Message ID (decimal or 0x-prefixed hex) or name
        message: MessageKey,

        /// Signal assignments
        #[arg(value_name = "NAME=VALUE", value_parser = parse_assignment)]
        values: Vec<(String, f64)>,
    },

    /// Decode hex frame bytes into signal values (printed as JSON)
    Decode {
        /// Message ID (decimal or 0x-prefixed hex) or name
        message: MessageKey,

        /// Frame bytes as hex, e.g. "2C01000000000000"
        data: String,

        /// Print raw value and unit for every signal
        #[arg(long)]
        detailed: bool,
    },

    /// Show initial signal values and the initial frame
    Initial {
        /// Message ID (decimal or 0x-prefixed hex) or name
        message: MessageKey,
    },
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::debug!("CAN Frame CLI v{}", env!("CARGO_PKG_VERSION"));
    log::debug!("Using codec library v{}", can_frame_codec::VERSION);

    let set = config::load_schema_set(&args.schema)?;

    match args.command {
        Command::List => list_messages(&set),
        Command::Encode { message, values } => {
            let values: SignalValues = values.into_iter().collect();
            let frame = set
                .encode(message.clone(), &values)
                .with_context(|| format!("Failed to encode message {}", message))?;
            println!("{}", hex::encode_upper(frame));
        }
        Command::Decode {
            message,
            data,
            detailed,
        } => {
            let frame = parse_frame(&data)?;
            if detailed {
                let signals = set
                    .decode_signals(message.clone(), &frame)
                    .with_context(|| format!("Failed to decode message {}", message))?;
                for signal in signals {
                    println!("{}", signal);
                }
            } else {
                let values = set
                    .decode(message.clone(), &frame)
                    .with_context(|| format!("Failed to decode message {}", message))?;
                println!("{}", serde_json::to_string_pretty(&values)?);
            }
        }
        Command::Initial { message } => {
            let initial = set.initial_values(message)?;
            let report = serde_json::json!({
                "signals": initial.signals,
                "frame": initial.frame.as_ref().map(hex::encode_upper),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

/// Print a one-line summary per message
fn list_messages(set: &SchemaSet) {
    let stats = set.stats();
    println!(
        "{} messages, {} signals ({} multiplexed messages)",
        stats.num_messages, stats.num_signals, stats.num_multiplexed
    );

    for schema in set.messages() {
        let cycle = schema
            .cycle_time_ms()
            .map(|ms| format!("{} ms", ms))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:>10}  {:<24} {:>2} bytes  {:>3} signals  cycle {}",
            schema.id_hex(),
            schema.name(),
            schema.byte_length(),
            schema.signals().len(),
            cycle
        );
    }
}

/// Parse a `NAME=VALUE` signal assignment
fn parse_assignment(s: &str) -> std::result::Result<(String, f64), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", s))?;

    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing signal name in '{}'", s));
    }

    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid value for '{}': {}", name, e))?;

    Ok((name.to_string(), value))
}

/// Parse frame bytes from hex, ignoring whitespace and an optional 0x prefix
fn parse_frame(data: &str) -> Result<Vec<u8>> {
    let compact: String = data.chars().filter(|c| !c.is_whitespace()).collect();
    let digits = compact
        .strip_prefix("0x")
        .or_else(|| compact.strip_prefix("0X"))
        .unwrap_or(&compact);

    hex::decode(digits).with_context(|| format!("Invalid hex frame data: '{}'", data))
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

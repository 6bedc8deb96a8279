use std::net::{SocketAddr, UdpSocket};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use fluid_pilot::command::CommandArg;
use fluid_pilot::osc::encode_command;
use fluid_pilot::params::parse_bool;

const DEFAULT_TARGET: &str = "127.0.0.1:10001";

#[derive(Parser, Debug, Clone)]
#[command(
    name = "osc_send",
    version,
    about = "Send one control message to a running fluid_pilot"
)]
pub(crate) struct Cli {
    #[arg(long, default_value = DEFAULT_TARGET)]
    pub(crate) target: SocketAddr,

    /// Send the message this many times.
    #[arg(long, default_value_t = 1)]
    pub(crate) repeat: u32,

    #[arg(long, default_value_t = 100)]
    pub(crate) interval_ms: u64,

    #[arg(value_name = "ADDRESS")]
    pub(crate) address: String,

    /// `f:1.5`, `i:3`, `b:true`, `s:text`, or a bare value.
    #[arg(value_name = "ARG", allow_hyphen_values = true)]
    pub(crate) args: Vec<String>,
}

/// Typed prefixes are taken literally; bare values become a bool, an int,
/// a float or a string, whichever parses first.
pub(crate) fn parse_arg(raw: &str) -> Result<CommandArg> {
    if let Some((tag, value)) = raw.split_once(':') {
        return match tag {
            "f" => value
                .parse::<f32>()
                .map(CommandArg::Float)
                .with_context(|| format!("bad float '{value}'")),
            "i" => value
                .parse::<i32>()
                .map(CommandArg::Int)
                .with_context(|| format!("bad int '{value}'")),
            "b" => parse_bool(value)
                .map(CommandArg::Bool)
                .ok_or_else(|| anyhow!("bad bool '{value}'")),
            "s" => Ok(CommandArg::Str(value.to_string())),
            _ => Ok(CommandArg::Str(raw.to_string())),
        };
    }
    if matches!(raw, "true" | "false") {
        return Ok(CommandArg::Bool(raw == "true"));
    }
    if let Ok(v) = raw.parse::<i32>() {
        return Ok(CommandArg::Int(v));
    }
    if let Ok(v) = raw.parse::<f32>() {
        return Ok(CommandArg::Float(v));
    }
    Ok(CommandArg::Str(raw.to_string()))
}

pub(crate) fn validate_args(args: &Cli) -> Result<()> {
    if args.address.is_empty() {
        bail!("address must not be empty");
    }
    if args.repeat == 0 {
        bail!("--repeat must be at least 1");
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();
    run(args)
}

fn run(args: Cli) -> Result<()> {
    validate_args(&args)?;

    let parsed = args
        .args
        .iter()
        .map(|raw| parse_arg(raw))
        .collect::<Result<Vec<_>>>()?;
    let bytes = encode_command(&args.address, &parsed)
        .map_err(|e| anyhow!("encode {}: {e:?}", args.address))?;

    let socket = UdpSocket::bind("0.0.0.0:0").context("bind local socket")?;
    for i in 0..args.repeat {
        if i > 0 {
            thread::sleep(Duration::from_millis(args.interval_ms));
        }
        socket
            .send_to(&bytes, args.target)
            .with_context(|| format!("send to {}", args.target))?;
    }
    println!(
        "sent {} x{} to {} ({} bytes)",
        args.address,
        args.repeat,
        args.target,
        bytes.len()
    );
    Ok(())
}

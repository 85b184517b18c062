//! wlancrypt command line.
//!
//! # Usage
//!
//! ```bash
//! # What does this RSN element offer?
//! wlancrypt decode 30140100000fac040100000fac040100000fac020000
//!
//! # Protect a broadcast deauth with BIP-CMAC-128
//! wlancrypt mmie --igtk 000102030405060708090a0b0c0d0e0f --ipn 1 c0000000ffffffffffff...
//! ```

use std::io::Write;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use wlancrypt_tool::{Command, run};

/// 802.11 security element and MMIE tool
#[derive(Parser, Debug)]
#[command(name = "wlancrypt")]
#[command(about = "Inspect RSN/WPA/WAPI elements and protect management frames")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer().with_writer(std::io::stderr)).with(filter).init();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run(&args.command, &mut out)?;
    out.flush()?;
    Ok(())
}

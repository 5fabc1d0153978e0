//! DrishtiLink server daemon
//!
//! ## Protocol Architecture
//!
//! - **UDP multicast (discovery port)**: fixed ASCII announcement every
//!   beacon interval until both channels are connected
//! - **TCP (video port)**: one client, flow-controlled framed video inbound
//! - **TCP (control port)**: one client, motor commands outbound with
//!   per-command receipts
//!
//! The daemon runs until SIGINT/SIGTERM.

use drishti_link::{AppConfig, LinkApp, Result};
use std::env;
use std::path::Path;

/// Parse config path from command line arguments.
///
/// Supports:
/// - `drishti-link <path>` (positional)
/// - `drishti-link --config <path>` (flag-based)
/// - `drishti-link -c <path>` (short flag)
///
/// Defaults to `/etc/drishti-link.toml` if not specified.
fn parse_config_path() -> String {
    let args: Vec<String> = env::args().collect();

    for i in 1..args.len() {
        if (args[i] == "--config" || args[i] == "-c") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }

    if args.len() > 1 && !args[1].starts_with('-') {
        return args[1].clone();
    }

    "/etc/drishti-link.toml".to_string()
}

fn main() -> Result<()> {
    let config_path = parse_config_path();
    let (config, config_loaded) = if Path::new(&config_path).exists() {
        (AppConfig::from_file(&config_path)?, true)
    } else {
        (AppConfig::default(), false)
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.clone()),
    )
    .init();

    log::info!("DrishtiLink v0.1.0 starting...");
    if config_loaded {
        log::info!("Using config: {}", config_path);
    } else {
        log::info!("No config at {}, using built-in defaults", config_path);
    }

    let mut app = LinkApp::new(config)?;
    app.run()
}

//! Diagnostics setup.
//!
//! Logs go to stderr so stdout carries only operator output. `RUST_LOG`
//! overrides the verbosity flag.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "warn,sp_core=info,sp_cli=info",
        2 => "info,sp_core=debug,sp_cli=debug",
        _ => "debug,sp_core=trace,sp_cli=trace",
    }
}

pub fn init(verbose: u8) -> color_eyre::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()?;
    Ok(())
}

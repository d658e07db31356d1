//! Command-line arguments for the `hashwatt` server.
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--bind` | `0.0.0.0:5000` | Listen address |
//! | `--log-filter` | `RUST_LOG`, else `info` | tracing filter directive |
//!
//! Upstream credentials and cache ttls come from the environment, see
//! [`hashwatt_core::HashwattConfig`].

use std::net::SocketAddr;

use clap::Parser;

/// Bitcoin mining power tracker
///
/// Serves network hash rate and estimated CONUS and global power draw as JSON.
#[derive(Debug, Parser)]
#[command(name = "hashwatt", author, version, about = "Bitcoin mining power tracker")]
pub struct Cli {
    /// Address to listen on.
    #[arg(long, default_value = "0.0.0.0:5000")]
    pub bind: SocketAddr,

    /// tracing filter directive, e.g. `hashwatt_core=debug`.
    #[arg(long)]
    pub log_filter: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_public_port() {
        let cli = Cli::try_parse_from(["hashwatt"]).expect("defaults parse");

        assert_eq!(cli.bind, "0.0.0.0:5000".parse().expect("valid address"));
        assert_eq!(cli.log_filter, None);
    }

    #[test]
    fn accepts_bind_and_filter() {
        let cli = Cli::try_parse_from([
            "hashwatt",
            "--bind",
            "127.0.0.1:8080",
            "--log-filter",
            "hashwatt_core=debug",
        ])
        .expect("flags parse");

        assert_eq!(cli.bind.port(), 8080);
        assert_eq!(cli.log_filter.as_deref(), Some("hashwatt_core=debug"));
    }

    #[test]
    fn rejects_invalid_bind_address() {
        assert!(Cli::try_parse_from(["hashwatt", "--bind", "localhost"]).is_err());
    }
}

//! CLI argument parsing for the sondeo server binary

use clap::{Parser, ValueEnum};

/// Profiler engine to mount behind the REST surface
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum BackendKind {
    /// Signal-based sampling profiler (pprof)
    Sampling,
}

#[derive(Parser, Debug)]
#[command(name = "sondeo")]
#[command(version)]
#[command(about = "Runtime CPU profiling control over HTTP", long_about = None)]
pub struct Cli {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = 8888)]
    pub port: u16,

    /// Route prefix for the profiler endpoints (e.g. /debug)
    #[arg(long, default_value = "")]
    pub prefix: String,

    /// Profiler backend
    #[arg(long, value_enum, default_value = "sampling")]
    pub backend: BackendKind,

    /// Sampling frequency in Hz
    #[arg(long, default_value_t = 99)]
    pub frequency: i32,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["sondeo"]);
        assert_eq!(cli.host, "127.0.0.1");
        assert_eq!(cli.port, 8888);
        assert_eq!(cli.prefix, "");
        assert_eq!(cli.frequency, 99);
        assert!(!cli.debug);
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "sondeo",
            "--host",
            "0.0.0.0",
            "-p",
            "9000",
            "--prefix",
            "/debug",
            "--frequency",
            "250",
            "--debug",
        ]);
        assert_eq!(cli.host, "0.0.0.0");
        assert_eq!(cli.port, 9000);
        assert_eq!(cli.prefix, "/debug");
        assert_eq!(cli.frequency, 250);
        assert!(cli.debug);
    }

    #[test]
    fn test_cli_rejects_unknown_backend() {
        assert!(Cli::try_parse_from(["sondeo", "--backend", "perf"]).is_err());
    }
}

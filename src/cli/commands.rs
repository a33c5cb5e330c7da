use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Main CLI structure for the throughput-watcher application
/// Uses clap's derive macros for automatic CLI generation
#[derive(Parser)]
#[command(author = "Kaipo Chen")]
#[command(version)] // Automatically uses version from Cargo.toml
#[command(about = "Throughput Watcher - aggregate bandwidth-test output and poll interface counters")]
#[command(long_about = "Throughput Watcher folds bandwidth-test output (human or comma-separated layout) \
into one figure per reporting interval, and polls an interface counter table on a timer, writing \
per-tick counter deltas as comma-separated records.")]
pub struct Cli {
    /// Optional settings file (TOML); TPW_* environment variables are applied on top
    #[arg(short, long, global = true, help = "Path to a settings file")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Aggregate bandwidth-test output into per-interval figures
    #[command(about = "Aggregate bandwidth-test output per interval")]
    #[command(long_about = "Reads bandwidth-test output from a file or standard input, detects its layout, \
and prints one 'interval_start,Mbit/s' line per reporting interval. Sum lines override per-stream \
figures; end-of-run totals are skipped.\n\n\
Examples:\n  \
tw bandwidth client.log                 # Aggregate a saved capture\n  \
iperf -c host -i 1 -P 2 | tw bandwidth  # Aggregate live output\n  \
tw bandwidth --interval 0.5 run.csv     # Fix the reporting interval")]
    Bandwidth {
        /// Capture to read; standard input when omitted
        file: Option<PathBuf>,

        /// Reporting interval of the test in seconds (learned from the input by default)
        #[arg(short, long, help = "Reporting interval in seconds")]
        interval: Option<f64>,

        /// Print the interval map as JSON instead of records
        #[arg(long, help = "Output JSON")]
        json: bool,

        /// Print bandwidth with units instead of raw Mbit/s
        #[arg(long, help = "Human-readable bandwidth units")]
        human: bool,
    },

    /// Poll an interface's counters and write per-tick deltas
    #[command(about = "Watch interface counters and write deltas")]
    #[command(long_about = "Polls the counter table for one or more interfaces on a timer and writes a header \
followed by one comma-separated delta record per tick. Runs until Ctrl-C or until --duration elapses.\n\n\
Examples:\n  \
tw watch -I wlan0-mon                   # Watch one interface every second\n  \
tw watch -I eth0 -I wlan0 -i 5          # Two interfaces, every 5 seconds\n  \
tw watch -I eth0 --timestamp -o eth0.csv")]
    Watch {
        /// Interfaces to watch (defaults to the configured interface)
        #[arg(short = 'I', long = "interface", help = "Interface to watch (repeatable)")]
        interfaces: Vec<String>,

        /// Poll period in seconds
        #[arg(short = 'i', long, help = "Poll interval in seconds")]
        interval: Option<u64>,

        /// Prefix records with a timestamp column
        #[arg(short, long, help = "Add a timestamp column")]
        timestamp: bool,

        /// Append records to this file instead of standard output
        #[arg(short, long, help = "Output file")]
        output: Option<PathBuf>,

        /// Stop after this many seconds
        #[arg(short, long, help = "Stop after N seconds")]
        duration: Option<u64>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_watch_command() {
        let cli = Cli::parse_from(["tw", "watch", "-I", "eth0", "-I", "wlan0", "-i", "5", "--timestamp"]);
        match cli.command {
            Commands::Watch {
                interfaces,
                interval,
                timestamp,
                output,
                duration,
            } => {
                assert_eq!(interfaces, vec!["eth0".to_string(), "wlan0".to_string()]);
                assert_eq!(interval, Some(5));
                assert!(timestamp);
                assert!(output.is_none());
                assert!(duration.is_none());
            }
            _ => panic!("expected watch command"),
        }
    }

    #[test]
    fn test_parse_bandwidth_command() {
        let cli = Cli::parse_from(["tw", "--config", "tw.toml", "bandwidth", "run.log", "--interval", "0.5"]);
        assert_eq!(cli.config, Some(PathBuf::from("tw.toml")));
        match cli.command {
            Commands::Bandwidth { file, interval, json, human } => {
                assert_eq!(file, Some(PathBuf::from("run.log")));
                assert_eq!(interval, Some(0.5));
                assert!(!json);
                assert!(!human);
            }
            _ => panic!("expected bandwidth command"),
        }
    }
}

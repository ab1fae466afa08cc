#![forbid(unsafe_code)]

mod config;
mod constants;
mod daemon;
mod exclusion;
mod policy;
#[cfg(test)]
mod test_support;
mod window;
mod x11_utils;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level as TraceLevel;
use tracing_subscriber::FmtSubscriber;

use config::{FileSettings, SettingsSource};
use exclusion::ParseResult;

#[derive(Parser)]
#[command(
    name = "xopacity",
    version,
    about = "Make X11 client windows translucent, except the ones you exclude"
)]
struct Cli {
    /// Settings file (defaults to ~/.config/xopacity/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// trace, debug, info, warn or error (overrides LOG_LEVEL)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Apply opacity to existing windows and keep watching for new ones
    Run {
        /// Apply to existing windows and exit
        #[arg(long)]
        once: bool,
    },
    /// Validate an exclusion list (defaults to the configured one)
    Check {
        patterns: Option<String>,
    },
    /// Show every client window and what the daemon would do with it
    List,
}

fn parse_level(level: &str) -> TraceLevel {
    match level.to_lowercase().as_str() {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    }
}

fn print_check(result: &ParseResult) {
    let mut exact: Vec<_> = result.patterns.exact.iter().map(String::as_str).collect();
    exact.sort_unstable();
    println!("exact:    {}", exact.join(", "));
    println!("contains: {}", result.patterns.contains.join(", "));
    for error in &result.errors {
        println!("error:    {error}");
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // CLI flag wins over LOG_LEVEL, default info
    let log_level = cli
        .log_level
        .clone()
        .or_else(|| std::env::var("LOG_LEVEL").ok())
        .map(|level| parse_level(&level))
        .unwrap_or(TraceLevel::INFO);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let settings = FileSettings::new(cli.config.unwrap_or_else(FileSettings::default_path));

    match cli.command.unwrap_or(Command::Run { once: false }) {
        Command::Run { once } => daemon::run_daemon(settings, once)?,
        Command::Check { patterns } => {
            let raw = patterns.unwrap_or_else(|| settings.read().excluded_windows);
            let result = exclusion::parse(&raw);
            print_check(&result);
            if !result.is_ok() {
                std::process::exit(1);
            }
        }
        Command::List => daemon::list_clients(&settings)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("DEBUG"), TraceLevel::DEBUG);
        assert_eq!(parse_level("warn"), TraceLevel::WARN);
        assert_eq!(parse_level("nonsense"), TraceLevel::INFO);
    }

    #[test]
    fn test_cli_defaults_to_run() {
        let cli = Cli::try_parse_from(["xopacity"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_cli_check_with_patterns() {
        let cli = Cli::try_parse_from(["xopacity", "check", "[Firefox],{term}"]).unwrap();
        match cli.command {
            Some(Command::Check { patterns }) => {
                assert_eq!(patterns.as_deref(), Some("[Firefox],{term}"))
            }
            _ => panic!("expected check command"),
        }
    }

    #[test]
    fn test_cli_run_once_with_config() {
        let cli = Cli::try_parse_from(["xopacity", "run", "--once", "--config", "/tmp/x.json"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Run { once: true })));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/x.json")));
    }
}

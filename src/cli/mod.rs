//! Command-line interface: argument types, commands, and output.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::{history::HistoryArgs, predict::PredictArgs, run::RunArgs};

#[derive(Parser, Debug)]
#[command(name = "lintloop")]
#[command(about = "Run a lint tool to convergence, tuned from commit history", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to .lintloop/config.yaml)
    #[arg(short, long, global = true, env = "LINTLOOP_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check, autocorrect, and commit until the tool reports no offenses
    Run(RunArgs),

    /// Show the configuration a run would start with
    Predict(PredictArgs),

    /// Summarize commit patterns and past loop cycles
    History(HistoryArgs),
}

/// Print the error (as JSON when requested) and exit with status 1.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let chain: Vec<String> = err.chain().skip(1).map(ToString::to_string).collect();
        let body = serde_json::json!({
            "error": err.to_string(),
            "causes": chain,
        });
        println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("Error: {err:#}");
    }
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_run_flags() {
        let cli = Cli::parse_from([
            "lintloop",
            "--json",
            "run",
            "--max-iterations",
            "8",
            "--no-history",
        ]);
        assert!(cli.json);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.max_iterations, Some(8));
                assert!(args.no_history);
                assert_eq!(args.max_duration_secs, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn rejects_zero_iterations() {
        let result = Cli::try_parse_from(["lintloop", "run", "--max-iterations", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::parse_from(["lintloop", "history", "--config", "custom.yaml"]);
        assert_eq!(cli.config, Some(PathBuf::from("custom.yaml")));
    }
}

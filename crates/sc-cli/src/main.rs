//! SafariConverter CLI
//!
//! CLI tool for converting AdGuard filter lists into Safari content blockers.

mod convert;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sc_compiler::{CompilerOptions, SafariVersion};

use crate::convert::{check_lists, convert_lists, read_lists, write_result};

#[derive(Parser)]
#[command(name = "sc-cli")]
#[command(about = "AdGuard filter list to Safari content blocker converter")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert filter lists into Safari content blocker JSON
    Convert {
        /// Input filter list files
        #[arg(short, long, required = true)]
        input: Vec<String>,

        /// Output JSON file
        #[arg(short, long, default_value = "blockerList.json")]
        output: String,

        /// Target Safari version
        #[arg(long, default_value = "13")]
        safari_version: SafariVersion,

        /// Also produce entries for the advanced blocking extension
        #[arg(long)]
        advanced_blocking: bool,

        /// Skip generic element hiding entries
        #[arg(long)]
        optimize: bool,

        /// Max number of Safari entries, capped by the Safari version limit
        #[arg(long)]
        limit: Option<usize>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Report rules that fail to parse
    Check {
        /// Input filter list files
        #[arg(short, long, required = true)]
        input: Vec<String>,

        /// Print errors as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let verbose = matches!(cli.command, Commands::Convert { verbose: true, .. });
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let result = match cli.command {
        Commands::Convert {
            input,
            output,
            safari_version,
            advanced_blocking,
            optimize,
            limit,
            verbose: _,
        } => cmd_convert(
            &input,
            &output,
            safari_version,
            CompilerOptions {
                optimize,
                advanced_blocking,
            },
            limit,
        ),
        Commands::Check { input, json } => cmd_check(&input, json),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn cmd_convert(
    inputs: &[String],
    output: &str,
    version: SafariVersion,
    options: CompilerOptions,
    limit: Option<usize>,
) -> Result<(), String> {
    let lists = read_lists(inputs)?;
    let result = convert_lists(&lists, version, options, limit)?;
    write_result(output, &result)?;

    println!("Converted {} filter lists to '{}'", inputs.len(), output);
    println!("  Entries:  {} of {}", result.converted_count, result.total_converted_count);
    println!("  Errors:   {}", result.errors_count);
    if options.advanced_blocking {
        println!("  Advanced: {}", result.advanced_blocking_converted_count);
    }
    if result.over_limit {
        println!("  Over the limit for Safari {:?}, extra entries were dropped", version);
    }

    Ok(())
}

fn cmd_check(inputs: &[String], json: bool) -> Result<(), String> {
    let lists = read_lists(inputs)?;
    let problems = check_lists(&lists);

    if json {
        let out = serde_json::to_string_pretty(&problems).map_err(|e| format!("Failed to serialize errors: {}", e))?;
        println!("{out}");
    } else {
        for problem in &problems {
            println!("{}:{}: {}: {}", problem.file, problem.line, problem.error, problem.rule);
        }
    }

    if problems.is_empty() {
        if !json {
            println!("No errors in {} filter lists", inputs.len());
        }
        Ok(())
    } else {
        Err(format!("{} rules failed to parse", problems.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convert_defaults_to_safari_13() {
        let cli = Cli::try_parse_from(["sc-cli", "convert", "--input", "list.txt"]).unwrap();
        match cli.command {
            Commands::Convert { safari_version, output, .. } => {
                assert_eq!(safari_version, SafariVersion::Safari13);
                assert_eq!(safari_version.rules_limit(), 50_000);
                assert_eq!(output, "blockerList.json");
            }
            Commands::Check { .. } => panic!("expected convert"),
        }
    }
}

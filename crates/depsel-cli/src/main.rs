//! depsel - select consistent package versions from a dependency graph.

mod check;
mod input;
mod solve;

use clap::{ArgAction, Parser, Subcommand};
use console::style;

#[derive(Parser, Debug)]
#[command(name = "depsel")]
#[command(version, about = "Select one consistent version per package from a dependency graph")]
struct Cli {
    /// Increase log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Solve a graph for a list of solution constraints
    Solve(solve::SolveArgs),

    /// Check that a graph loads and has a solution on its own
    Check(check::CheckArgs),
}

fn main() {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let result = match cli.command {
        Commands::Solve(args) => solve::execute(args),
        Commands::Check(args) => check::execute(args),
    };

    let code = match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {:#}", style("Error:").red().bold(), err);
            1
        }
    };
    std::process::exit(code);
}

/// RUST_LOG wins over the verbosity flag when set
fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

//! Check command - load a graph and verify it has a solution on its own.

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use std::path::PathBuf;

use depsel::{Selector, SolveError};

use crate::input;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Dependency graph description (JSON)
    #[arg(value_name = "GRAPH")]
    pub graph: PathBuf,

    /// Solver configuration (TOML)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

pub fn execute(args: CheckArgs) -> Result<i32> {
    let config = input::load_config(args.config.as_deref())?;
    let graph = input::load_graph(&args.graph)?;
    let selector = Selector::new(graph)
        .context("Invalid dependency graph")?
        .with_config(config);

    let packages: Vec<_> = selector.graph().packages().collect();
    let width = packages.iter().map(|p| p.name().len()).max().unwrap_or(0);
    for package in &packages {
        let count = package.domain().map_or(0, |domain| domain.len());
        let count = if count == 0 {
            style(count).red()
        } else {
            style(count).cyan()
        };
        println!(
            "{:<width$} {} versions",
            style(package.name()).white().bold(),
            count,
            width = width
        );
    }
    println!();

    match selector.check() {
        Ok(()) => {
            println!(
                "{} {} packages, dependency graph is satisfiable",
                style("Success:").green().bold(),
                packages.len()
            );
            Ok(0)
        }
        Err(SolveError::InconsistentGraph) => {
            eprintln!(
                "{} no combination of versions satisfies the dependency graph",
                style("Error:").red().bold()
            );
            Ok(1)
        }
        Err(err) => Err(err.into()),
    }
}

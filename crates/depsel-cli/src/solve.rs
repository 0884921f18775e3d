//! Solve command - select versions for a list of solution constraints.

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use console::style;
use std::path::PathBuf;

use depsel::{
    Lexicographic, MinimizeChurn, Objective, PreferLatest, Selector, Solution, SolutionConstraint, SolveError,
    SolverConfig,
};

use crate::input;

#[derive(Args, Debug)]
pub struct SolveArgs {
    /// Dependency graph description (JSON)
    #[arg(value_name = "GRAPH")]
    pub graph: PathBuf,

    /// Solution constraint such as "A" or "B = 1.0.0"; checked in the order given
    #[arg(short = 'c', long = "constraint", value_name = "NAME[ CONSTRAINT]")]
    pub constraints: Vec<String>,

    /// Currently deployed versions, a JSON object of package name to version
    #[arg(long, value_name = "FILE")]
    pub current: Option<PathBuf>,

    /// Objective used to pick among feasible solutions
    #[arg(long, value_enum, default_value_t = ObjectiveKind::None)]
    pub objective: ObjectiveKind,

    /// Solver configuration (TOML)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Try the lowest versions first
    #[arg(long)]
    pub prefer_lowest: bool,

    /// Give up after this many search nodes
    #[arg(long, value_name = "N")]
    pub max_nodes: Option<u64>,

    /// Give up after this many milliseconds
    #[arg(long, value_name = "N")]
    pub timeout_ms: Option<u64>,

    /// List every package, including those no constraint reaches
    #[arg(long)]
    pub all: bool,

    /// Output as JSON
    #[arg(long)]
    pub format_json: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectiveKind {
    /// Any feasible solution
    None,
    /// Change as few deployed packages as possible
    Churn,
    /// Keep as many packages as possible at their latest version
    Latest,
    /// Latest first, then churn
    LatestThenChurn,
}

pub fn execute(args: SolveArgs) -> Result<i32> {
    let config = solver_config(&args)?;
    let constraints = args
        .constraints
        .iter()
        .map(|c| SolutionConstraint::parse(c).with_context(|| format!("Invalid solution constraint '{}'", c)))
        .collect::<Result<Vec<_>>>()?;

    let current = match &args.current {
        Some(path) => input::load_current(path)?,
        None => Vec::new(),
    };
    if current.is_empty() && matches!(args.objective, ObjectiveKind::Churn | ObjectiveKind::LatestThenChurn) {
        log::warn!("No --current versions given; churn counts nothing");
    }

    let graph = input::load_graph(&args.graph)?;
    let selector = Selector::new(graph)
        .context("Invalid dependency graph")?
        .with_config(config);

    let result = match objective(args.objective, &selector, current) {
        Some(objective) => selector.find_optimal_solution(&constraints, objective.as_ref(), None),
        None => selector.find_solution(&constraints),
    };

    match result {
        Ok(solution) => {
            println!("{}", render(&solution, args.format_json)?);
            Ok(0)
        }
        Err(err) => {
            report(&err);
            Ok(1)
        }
    }
}

/// Configuration file overlaid with command line flags
fn solver_config(args: &SolveArgs) -> Result<SolverConfig> {
    let mut config = input::load_config(args.config.as_deref())?;
    config.prefer_lowest |= args.prefer_lowest;
    config.max_nodes = args.max_nodes.or(config.max_nodes);
    config.timeout_ms = args.timeout_ms.or(config.timeout_ms);
    if args.all {
        config.prune_unreachable = false;
    }
    Ok(config)
}

fn objective(
    kind: ObjectiveKind,
    selector: &Selector,
    current: Vec<(String, depsel::Version)>,
) -> Option<Box<dyn Objective>> {
    match kind {
        ObjectiveKind::None => None,
        ObjectiveKind::Churn => Some(Box::new(MinimizeChurn::new(current))),
        ObjectiveKind::Latest => Some(Box::new(PreferLatest::from_graph(selector.graph()))),
        ObjectiveKind::LatestThenChurn => Some(Box::new(
            Lexicographic::new()
                .then(PreferLatest::from_graph(selector.graph()))
                .then(MinimizeChurn::new(current)),
        )),
    }
}

fn render(solution: &Solution, format_json: bool) -> Result<String> {
    if format_json {
        return Ok(serde_json::to_string_pretty(solution)?);
    }

    let width = solution.iter().map(|s| s.package_name.len()).max().unwrap_or(0);
    let lines: Vec<String> = solution
        .iter()
        .map(|s| {
            format!(
                "{:<width$} {}",
                style(&s.package_name).white().bold(),
                style(&s.version).yellow(),
                width = width
            )
        })
        .collect();
    Ok(lines.join("\n"))
}

fn report(err: &SolveError) {
    eprintln!("{} {}", style("Error:").red().bold(), err);
    if let Some(constraint) = err.unsatisfiable_constraint() {
        eprintln!(
            "{} remove or relax {} and try again",
            style("Hint:").cyan(),
            style(constraint).white().bold()
        );
    }
}

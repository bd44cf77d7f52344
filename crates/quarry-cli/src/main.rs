mod input;
mod report;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use quarry_core::{MissingCost, ReplacementPlanner, TransportationSolver};
use quarry_solver::Solver;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::input::{AnyInput, CliError, ReplacementInput, TransportInput};

#[derive(Parser)]
#[command(name = "quarry")]
#[command(about = "Shipment and equipment replacement planning for a materials supplier", long_about = None)]
struct Cli {
    /// Log solver progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find the minimum-cost shipment plan
    Transport {
        /// JSON file with costs, supply and demand
        file: PathBuf,
        #[arg(short, long, value_enum, default_value_t = Format::Pretty)]
        format: Format,
        /// How to treat cost cells given as null
        #[arg(long, value_enum, default_value_t = MissingCostArg::Zero)]
        missing_cost: MissingCostArg,
        #[command(flatten)]
        solver: SolverArgs,
    },
    /// Plan when to keep and when to replace equipment
    Replace {
        /// JSON file with profit, residual value and replacement cost
        file: PathBuf,
        /// Planning horizon in years (overrides the file)
        #[arg(long)]
        horizon: Option<usize>,
        #[arg(short, long, value_enum, default_value_t = Format::Pretty)]
        format: Format,
        /// Also print the full value table
        #[arg(long)]
        table: bool,
    },
    /// Check an input file for errors
    Check {
        /// The file to check
        file: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Pretty,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum MissingCostArg {
    /// Missing cost means a free lane
    Zero,
    /// Missing cost means the lane cannot be used
    Forbid,
}

impl From<MissingCostArg> for MissingCost {
    fn from(arg: MissingCostArg) -> Self {
        match arg {
            MissingCostArg::Zero => MissingCost::Zero,
            MissingCostArg::Forbid => MissingCost::Forbid,
        }
    }
}

#[derive(clap::Args)]
struct SolverArgs {
    /// Maximum simplex pivots per phase
    #[arg(long, env = "QUARRY_MAX_ITERATIONS", default_value_t = 10000)]
    max_iterations: usize,
    /// Floating point tolerance of the simplex solver
    #[arg(long, env = "QUARRY_TOLERANCE", default_value_t = 1e-9)]
    tolerance: f64,
}

impl SolverArgs {
    fn solver(&self) -> Solver {
        Solver::new()
            .with_max_iterations(self.max_iterations)
            .with_tolerance(self.tolerance)
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Transport {
            file,
            format,
            missing_cost,
            solver,
        } => {
            let input: TransportInput = input::read_json(&file)?;
            let problem = input.into_problem(missing_cost.into())?;
            info!(
                suppliers = problem.num_suppliers(),
                consumers = problem.num_consumers(),
                "loaded {}",
                file.display()
            );

            let solution = TransportationSolver::with_solver(solver.solver()).solve(&problem);
            match format {
                Format::Pretty => print!("{}", report::transport(&solution)),
                Format::Json => print_json(&solution)?,
            }

            if !solution.is_optimal() {
                return Err(CliError::NotOptimal(solution.status));
            }
            Ok(())
        }
        Commands::Replace {
            file,
            horizon,
            format,
            table,
        } => {
            let input: ReplacementInput = input::read_json(&file)?;
            let problem = input.into_problem(horizon)?;
            info!(horizon = problem.horizon(), max_age = problem.max_age(), "loaded {}", file.display());

            let plan = ReplacementPlanner::new().solve(&problem);
            match format {
                Format::Pretty => print!("{}", report::replacement(&plan, table)),
                Format::Json => print_json(&plan)?,
            }
            Ok(())
        }
        Commands::Check { file } => check(&file),
    }
}

fn check(file: &Path) -> Result<(), CliError> {
    let parsed: AnyInput = input::read_json(file).map_err(|e| match e {
        CliError::Json { path, .. } => CliError::UnknownInput(path),
        other => other,
    })?;

    match parsed {
        AnyInput::Transport(input) => {
            let problem = input.into_problem(MissingCost::Zero)?;
            println!("✓ {} is a valid transportation problem", file.display());
            println!("  {} suppliers, total supply {:.2}", problem.num_suppliers(), problem.total_supply());
            println!("  {} consumers, total demand {:.2}", problem.num_consumers(), problem.total_demand());
            if problem.total_supply() != problem.total_demand() {
                println!("  unbalanced: a dummy node will be added");
            }
        }
        AnyInput::Replacement(input) => {
            let problem = input.into_problem(None)?;
            println!("✓ {} is a valid replacement problem", file.display());
            println!("  ages 0..={}", problem.max_age());
            println!("  horizon {} years", problem.horizon());
        }
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(value).map_err(CliError::Output)?;
    println!("{}", json);
    Ok(())
}

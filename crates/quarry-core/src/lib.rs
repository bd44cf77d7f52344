pub mod balance;
pub mod error;
pub mod grid;
pub mod replacement;
pub mod transport;

pub use balance::{BalancedProblem, Dummy, MissingCost, TransportationProblem};
pub use error::ConfigError;
pub use grid::Grid;
pub use quarry_solver::SolutionStatus;
pub use replacement::{Decision, ReplacementPlan, ReplacementPlanner, ReplacementProblem, StrategyStep, TableCell, ValueTable};
pub use transport::{Delivery, TransportModel, TransportSolution, TransportationSolver};

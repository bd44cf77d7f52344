mod problem;
mod simplex;
mod solution;

pub use problem::{Constraint, ConstraintOp, LpProblem, Objective};
pub use simplex::Solver;
pub use solution::{Solution, SolutionStatus};

/// Anything that can solve an [`LpProblem`]
///
/// The optimization core only builds models and reads back status and values,
/// so any LP method can sit behind this trait.
pub trait LpSolver {
    fn solve(&self, problem: &LpProblem) -> Solution;
}

impl<S: LpSolver + ?Sized> LpSolver for &S {
    fn solve(&self, problem: &LpProblem) -> Solution {
        (**self).solve(problem)
    }
}

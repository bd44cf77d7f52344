use tracing::{debug, trace};

use crate::problem::{ConstraintOp, LpProblem};
use crate::solution::Solution;
use crate::LpSolver;

/// Two-phase simplex solver for linear programming problems
#[derive(Debug, Clone)]
pub struct Solver {
    /// Maximum pivots per phase before giving up
    max_iterations: usize,
    /// Tolerance for floating point comparisons
    tolerance: f64,
    /// Consecutive degenerate pivots allowed before switching to Bland's rule
    degenerate_limit: usize,
}

impl Default for Solver {
    fn default() -> Self {
        Self {
            max_iterations: 10000,
            tolerance: 1e-9,
            degenerate_limit: 50,
        }
    }
}

impl LpSolver for Solver {
    fn solve(&self, problem: &LpProblem) -> Solution {
        Solver::solve(self, problem)
    }
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    pub fn with_degenerate_limit(mut self, limit: usize) -> Self {
        self.degenerate_limit = limit;
        self
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Solve the LP problem using the two-phase simplex method
    ///
    /// The solver reports what it finds: an infeasible or unbounded model, or
    /// one it could not finish within the iteration limit, comes back with the
    /// matching status and no values.
    pub fn solve(&self, problem: &LpProblem) -> Solution {
        debug!(
            variables = problem.num_variables(),
            constraints = problem.num_constraints(),
            "solving LP"
        );

        let mut tableau = Tableau::build(problem);
        let mut iterations = 0;

        // Phase 1: find an initial basic feasible solution
        if tableau.n_artificial > 0 {
            let phase1_costs = tableau.phase1_costs();
            tableau.load_objective(&phase1_costs);
            let all_columns = tableau.rhs_col();
            let outcome = self.run(&mut tableau, all_columns, &mut iterations);
            trace!(?outcome, iterations, "phase 1 finished");
            match outcome {
                PhaseOutcome::Optimal => {}
                // The phase 1 objective is bounded by zero, so anything else is numerical trouble
                PhaseOutcome::Unbounded | PhaseOutcome::IterationLimit => {
                    return Solution::undefined(iterations);
                }
            }

            if !self.artificials_cleared(&tableau) {
                debug!(iterations, "LP is infeasible");
                return Solution::infeasible(iterations);
            }
            self.drive_out_artificials(&mut tableau, &mut iterations);
        }

        // Phase 2: optimize the real objective over the original columns
        let costs = tableau.objective.clone();
        tableau.load_objective(&costs);
        let structural = tableau.art_start();
        let outcome = self.run(&mut tableau, structural, &mut iterations);
        trace!(?outcome, iterations, "phase 2 finished");

        match outcome {
            PhaseOutcome::Optimal => self.extract_solution(&tableau, problem, iterations),
            PhaseOutcome::Unbounded => {
                debug!(iterations, "LP is unbounded");
                Solution::unbounded(iterations)
            }
            PhaseOutcome::IterationLimit => {
                debug!(iterations, max_iterations = self.max_iterations, "iteration limit reached");
                Solution::undefined(iterations)
            }
        }
    }

    /// Pivot until no column below `column_limit` can improve the objective
    fn run(&self, tableau: &mut Tableau, column_limit: usize, iterations: &mut usize) -> PhaseOutcome {
        let mut degenerate_streak = 0;
        let mut performed = 0;

        loop {
            let bland = degenerate_streak >= self.degenerate_limit;
            if bland && degenerate_streak == self.degenerate_limit {
                debug!(degenerate_streak, "switching to Bland's rule");
            }

            let Some(pivot_col) = self.find_pivot_column(tableau, column_limit, bland) else {
                return PhaseOutcome::Optimal;
            };
            if performed == self.max_iterations {
                return PhaseOutcome::IterationLimit;
            }
            let Some(pivot_row) = self.find_pivot_row(tableau, pivot_col, bland) else {
                return PhaseOutcome::Unbounded;
            };

            if tableau.rhs(pivot_row).abs() <= self.tolerance {
                degenerate_streak += 1;
            } else {
                degenerate_streak = 0;
            }

            tableau.pivot(pivot_row, pivot_col);
            performed += 1;
            *iterations += 1;
        }
    }

    /// Entering column: most positive reduced cost, or the first positive one under Bland's rule
    fn find_pivot_column(&self, tableau: &Tableau, column_limit: usize, bland: bool) -> Option<usize> {
        let obj_row = tableau.obj_row();

        if bland {
            return (0..column_limit).find(|&j| tableau.data[obj_row][j] > self.tolerance);
        }

        let mut max_val = self.tolerance;
        let mut max_col = None;
        for j in 0..column_limit {
            if tableau.data[obj_row][j] > max_val {
                max_val = tableau.data[obj_row][j];
                max_col = Some(j);
            }
        }
        max_col
    }

    /// Leaving row by the minimum ratio test; Bland's rule breaks ties on the lowest basic index
    fn find_pivot_row(&self, tableau: &Tableau, col: usize, bland: bool) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;

        for i in 0..tableau.obj_row() {
            let val = tableau.data[i][col];
            if val <= self.tolerance {
                continue;
            }
            let ratio = tableau.rhs(i) / val;
            best = match best {
                None => Some((i, ratio)),
                Some((row, min_ratio)) => {
                    let tied = (ratio - min_ratio).abs() <= self.tolerance;
                    if (ratio < min_ratio && !tied)
                        || (bland && tied && tableau.basic_vars[i] < tableau.basic_vars[row])
                    {
                        Some((i, ratio))
                    } else {
                        Some((row, min_ratio))
                    }
                }
            };
        }

        best.map(|(row, _)| row)
    }

    /// Whether every artificial left in the basis sits at zero after phase 1
    fn artificials_cleared(&self, tableau: &Tableau) -> bool {
        let art_start = tableau.art_start();
        let feasibility_tol = self.tolerance * tableau.rhs_scale;
        (0..tableau.obj_row())
            .filter(|&i| tableau.basic_vars[i] >= art_start)
            .all(|i| tableau.rhs(i).abs() <= feasibility_tol)
    }

    /// Pivot zero-level artificials out of the basis so phase 2 cannot raise them again
    ///
    /// A row with no usable original column is redundant (equality systems such as
    /// balanced transportation models always have one); its artificial stays basic
    /// at zero and the row never takes part in a ratio test.
    fn drive_out_artificials(&self, tableau: &mut Tableau, iterations: &mut usize) {
        let art_start = tableau.art_start();
        let mut redundant = 0;

        for i in 0..tableau.obj_row() {
            if tableau.basic_vars[i] < art_start {
                continue;
            }
            let entering = (0..art_start)
                .filter(|&j| tableau.data[i][j].abs() > self.tolerance)
                .max_by(|&a, &b| tableau.data[i][a].abs().total_cmp(&tableau.data[i][b].abs()));
            match entering {
                Some(col) => {
                    tableau.pivot(i, col);
                    *iterations += 1;
                }
                None => redundant += 1,
            }
        }

        if redundant > 0 {
            trace!(redundant, "redundant constraint rows kept at zero");
        }
    }

    fn extract_solution(&self, tableau: &Tableau, problem: &LpProblem, iterations: usize) -> Solution {
        let n_vars = problem.num_variables();

        let mut values = vec![0.0; n_vars];
        for (i, &basic) in tableau.basic_vars.iter().enumerate() {
            if basic < n_vars {
                // Round-off can leave a basic value a hair below zero
                values[basic] = tableau.rhs(i).max(0.0);
            }
        }

        let objective_value = problem.evaluate(&values);
        debug!(objective_value, iterations, "LP solved to optimality");

        Solution::optimal(values, objective_value, iterations)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PhaseOutcome {
    Optimal,
    Unbounded,
    IterationLimit,
}

/// Dense simplex tableau
///
/// Columns are laid out as original variables, then slack/surplus variables,
/// then artificials, then the right-hand side. The last row is the objective,
/// stored so that a positive entry marks a column that improves it.
struct Tableau {
    data: Vec<Vec<f64>>,
    basic_vars: Vec<usize>,
    n_vars: usize,
    n_slack: usize,
    n_artificial: usize,
    /// Phase 2 objective row, already sign-adjusted for maximization
    objective: Vec<f64>,
    /// Largest absolute right-hand side, at least 1
    rhs_scale: f64,
}

impl Tableau {
    fn build(problem: &LpProblem) -> Self {
        let n_vars = problem.num_variables();
        let n_constraints = problem.num_constraints();

        // Normalize every row to a non-negative right-hand side first
        let rows: Vec<(Vec<f64>, ConstraintOp, f64)> = problem
            .constraints
            .iter()
            .map(|c| {
                let mut coefficients = vec![0.0; n_vars];
                for (slot, &coef) in coefficients.iter_mut().zip(&c.coefficients) {
                    *slot = coef;
                }
                if c.rhs < 0.0 {
                    coefficients.iter_mut().for_each(|coef| *coef = -*coef);
                    (coefficients, c.op.flipped(), -c.rhs)
                } else {
                    (coefficients, c.op, c.rhs)
                }
            })
            .collect();

        let mut n_slack = 0;
        let mut n_artificial = 0;
        for (_, op, _) in &rows {
            match op {
                ConstraintOp::Le => n_slack += 1,
                ConstraintOp::Ge => {
                    n_slack += 1; // surplus
                    n_artificial += 1;
                }
                ConstraintOp::Eq => n_artificial += 1,
            }
        }

        let total_cols = n_vars + n_slack + n_artificial + 1; // +1 for RHS
        let mut data = vec![vec![0.0; total_cols]; n_constraints + 1];
        let mut basic_vars = vec![0; n_constraints];

        let mut slack_idx = n_vars;
        let mut artificial_idx = n_vars + n_slack;
        let mut rhs_scale: f64 = 1.0;

        for (i, (coefficients, op, rhs)) in rows.into_iter().enumerate() {
            data[i][..n_vars].copy_from_slice(&coefficients);
            data[i][total_cols - 1] = rhs;
            rhs_scale = rhs_scale.max(rhs);

            match op {
                ConstraintOp::Le => {
                    data[i][slack_idx] = 1.0;
                    basic_vars[i] = slack_idx;
                    slack_idx += 1;
                }
                ConstraintOp::Ge => {
                    data[i][slack_idx] = -1.0;
                    slack_idx += 1;
                    data[i][artificial_idx] = 1.0;
                    basic_vars[i] = artificial_idx;
                    artificial_idx += 1;
                }
                ConstraintOp::Eq => {
                    data[i][artificial_idx] = 1.0;
                    basic_vars[i] = artificial_idx;
                    artificial_idx += 1;
                }
            }
        }

        // Simplex maximizes, so a minimization objective is negated
        let mut objective = vec![0.0; total_cols];
        for (j, &coef) in problem.objective.coefficients.iter().take(n_vars).enumerate() {
            objective[j] = if problem.objective.minimize { -coef } else { coef };
        }

        Self {
            data,
            basic_vars,
            n_vars,
            n_slack,
            n_artificial,
            objective,
            rhs_scale,
        }
    }

    fn obj_row(&self) -> usize {
        self.data.len() - 1
    }

    fn rhs_col(&self) -> usize {
        self.data[0].len() - 1
    }

    fn art_start(&self) -> usize {
        self.n_vars + self.n_slack
    }

    fn rhs(&self, row: usize) -> f64 {
        self.data[row][self.rhs_col()]
    }

    /// Phase 1 objective: maximize the negated sum of artificials
    fn phase1_costs(&self) -> Vec<f64> {
        let mut costs = vec![0.0; self.data[0].len()];
        let art_start = self.art_start();
        for cost in &mut costs[art_start..art_start + self.n_artificial] {
            *cost = -1.0;
        }
        costs
    }

    /// Install an objective row and price out the current basis
    fn load_objective(&mut self, costs: &[f64]) {
        let obj_row = self.obj_row();
        self.data[obj_row].copy_from_slice(costs);

        for i in 0..obj_row {
            let ratio = self.data[obj_row][self.basic_vars[i]];
            if ratio != 0.0 {
                for j in 0..self.data[i].len() {
                    self.data[obj_row][j] -= ratio * self.data[i][j];
                }
            }
        }
    }

    fn pivot(&mut self, row: usize, col: usize) {
        let n_cols = self.data[0].len();

        self.basic_vars[row] = col;

        let pivot_val = self.data[row][col];
        for j in 0..n_cols {
            self.data[row][j] /= pivot_val;
        }

        let pivot_row = self.data[row].clone();
        for (i, current) in self.data.iter_mut().enumerate() {
            if i == row {
                continue;
            }
            let factor = current[col];
            if factor != 0.0 {
                for (cell, &p) in current.iter_mut().zip(&pivot_row) {
                    *cell -= factor * p;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::LpProblem;
    use crate::solution::SolutionStatus;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("x{}", i)).collect()
    }

    #[test]
    fn test_simple_maximization() {
        // Maximize: 3x + 2y
        // Subject to:
        //   x + y <= 4
        //   x <= 3
        //   y <= 3
        // Optimal: x=3, y=1, obj=11
        let mut problem = LpProblem::new(vec!["x".to_string(), "y".to_string()]);
        problem.set_objective(vec![3.0, 2.0], false);
        problem.add_constraint("sum", vec![1.0, 1.0], ConstraintOp::Le, 4.0);
        problem.add_constraint("x_max", vec![1.0, 0.0], ConstraintOp::Le, 3.0);
        problem.add_constraint("y_max", vec![0.0, 1.0], ConstraintOp::Le, 3.0);

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!((solution.values[0] - 3.0).abs() < 1e-6, "x = {} (expected 3)", solution.values[0]);
        assert!((solution.values[1] - 1.0).abs() < 1e-6, "y = {} (expected 1)", solution.values[1]);
        assert!((solution.objective_value - 11.0).abs() < 1e-6, "obj = {} (expected 11)", solution.objective_value);
    }

    #[test]
    fn test_minimization_with_ge() {
        // Minimize: 2x + 3y
        // Subject to:
        //   x + y >= 4
        //   x <= 3
        //   y <= 3
        // Optimal: x=3, y=1, obj=9
        let mut problem = LpProblem::new(vec!["x".to_string(), "y".to_string()]);
        problem.set_objective(vec![2.0, 3.0], true);
        problem.add_constraint("sum", vec![1.0, 1.0], ConstraintOp::Ge, 4.0);
        problem.add_constraint("x_max", vec![1.0, 0.0], ConstraintOp::Le, 3.0);
        problem.add_constraint("y_max", vec![0.0, 1.0], ConstraintOp::Le, 3.0);

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!((solution.values[0] - 3.0).abs() < 1e-6, "x = {} (expected 3)", solution.values[0]);
        assert!((solution.values[1] - 1.0).abs() < 1e-6, "y = {} (expected 1)", solution.values[1]);
        assert!((solution.objective_value - 9.0).abs() < 1e-6, "obj = {} (expected 9)", solution.objective_value);
    }

    #[test]
    fn test_balanced_equalities_with_redundant_row() {
        // 2x2 transportation model: one of the four equalities is implied by the others
        // Supply [5, 5], demand [4, 6], costs [[1, 4], [2, 1]]
        // Optimal: x00=4, x01=1, x11=5, obj=4+4+5=13
        let mut problem = LpProblem::new(names(4));
        problem.set_objective(vec![1.0, 4.0, 2.0, 1.0], true);
        problem.add_constraint("Supply_0", vec![1.0, 1.0, 0.0, 0.0], ConstraintOp::Eq, 5.0);
        problem.add_constraint("Supply_1", vec![0.0, 0.0, 1.0, 1.0], ConstraintOp::Eq, 5.0);
        problem.add_constraint("Demand_0", vec![1.0, 0.0, 1.0, 0.0], ConstraintOp::Eq, 4.0);
        problem.add_constraint("Demand_1", vec![0.0, 1.0, 0.0, 1.0], ConstraintOp::Eq, 6.0);

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!((solution.objective_value - 13.0).abs() < 1e-6, "obj = {}", solution.objective_value);
        assert!(problem.violated_constraints(&solution.values, 1e-6).is_empty());
        assert!(solution.values.iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn test_negative_rhs_is_normalized() {
        // Minimize x subject to -x <= -2, i.e. x >= 2
        let mut problem = LpProblem::new(vec!["x".to_string()]);
        problem.set_objective(vec![1.0], true);
        problem.add_constraint("floor", vec![-1.0], ConstraintOp::Le, -2.0);

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!((solution.values[0] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_infeasible() {
        // x >= 5
        // x <= 3
        let mut problem = LpProblem::new(vec!["x".to_string()]);
        problem.set_objective(vec![1.0], true);
        problem.add_constraint("lower", vec![1.0], ConstraintOp::Ge, 5.0);
        problem.add_constraint("upper", vec![1.0], ConstraintOp::Le, 3.0);

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Infeasible);
        assert!(solution.values.is_empty());
    }

    #[test]
    fn test_unbounded() {
        // Maximize x + y subject to x - y <= 1
        let mut problem = LpProblem::new(names(2));
        problem.set_objective(vec![1.0, 1.0], false);
        problem.add_constraint("gap", vec![1.0, -1.0], ConstraintOp::Le, 1.0);

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Unbounded);
    }

    #[test]
    fn test_iteration_limit_is_undefined() {
        let mut problem = LpProblem::new(vec!["x".to_string(), "y".to_string()]);
        problem.set_objective(vec![3.0, 2.0], false);
        problem.add_constraint("sum", vec![1.0, 1.0], ConstraintOp::Le, 4.0);
        problem.add_constraint("x_max", vec![1.0, 0.0], ConstraintOp::Le, 3.0);

        let solution = Solver::new().with_max_iterations(0).solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Undefined);
        assert!(solution.values.is_empty());
    }

    #[test]
    fn test_degenerate_problem_terminates() {
        // Beale's example, which cycles under the largest-coefficient rule
        // Optimal: x0=1/25, x2=1, obj=-1/20
        let mut problem = LpProblem::new(names(4));
        problem.set_objective(vec![-0.75, 150.0, -0.02, 6.0], true);
        problem.add_constraint("r1", vec![0.25, -60.0, -0.04, 9.0], ConstraintOp::Le, 0.0);
        problem.add_constraint("r2", vec![0.5, -90.0, -0.02, 3.0], ConstraintOp::Le, 0.0);
        problem.add_constraint("r3", vec![0.0, 0.0, 1.0, 0.0], ConstraintOp::Le, 1.0);

        let solution = Solver::new().with_degenerate_limit(5).solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!((solution.objective_value + 0.05).abs() < 1e-9, "obj = {}", solution.objective_value);
    }

    #[test]
    fn test_trait_object_dispatch() {
        let mut problem = LpProblem::new(vec!["x".to_string()]);
        problem.set_objective(vec![1.0], true);
        problem.add_constraint("exact", vec![1.0], ConstraintOp::Eq, 7.0);

        let solver = Solver::new();
        let dynamic: &dyn LpSolver = &solver;
        let solution = dynamic.solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert_eq!(solution.value(0), 7.0);
        assert_eq!(solution.value(3), 0.0);
    }
}

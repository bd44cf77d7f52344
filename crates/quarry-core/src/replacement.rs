//! Finite-horizon equipment replacement planning
//!
//! Each year the operator either keeps the current equipment, earning the
//! profit for its age, or sells it for its residual value, buys new equipment
//! and earns the profit of a new unit. Backward induction over
//! (year, age) finds the policy with the largest cumulative profit.

use std::fmt;

use tracing::debug;

use crate::error::ConfigError;
use crate::grid::Grid;

/// Economics of one piece of equipment over a planning horizon
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ReplacementProblem {
    profit: Vec<f64>,
    residual_value: Vec<f64>,
    replacement_cost: f64,
    horizon: usize,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Decision {
    #[default]
    Keep,
    Replace,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Keep => f.pad("keep"),
            Decision::Replace => f.pad("replace"),
        }
    }
}

/// Outcome of one (year, age) state
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TableCell {
    /// Best cumulative profit from this year to the end of the horizon
    pub value: f64,
    pub decision: Decision,
    /// Candidate value of keeping; `None` where the equipment must be replaced
    pub keep_value: Option<f64>,
    pub replace_value: f64,
}

/// Dynamic programming table over years `1..=horizon` and ages `1..=max_age`
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ValueTable {
    horizon: usize,
    max_age: usize,
    cells: Grid<TableCell>,
}

/// One year of the optimal strategy
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyStep {
    pub year: usize,
    /// Age of the equipment at the start of the year
    pub age: usize,
    pub decision: Decision,
    pub profit_if_keep: Option<f64>,
    pub profit_if_replace: f64,
    /// Profit realized in this year alone
    pub annual_profit: f64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ReplacementPlan {
    /// Optimal cumulative profit starting with one-year-old equipment in year 1
    pub total_profit: f64,
    pub strategy: Vec<StrategyStep>,
    pub table: ValueTable,
}

/// Backward-induction planner; holds no state between calls
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplacementPlanner;

impl ReplacementProblem {
    /// `profit[t]` and `residual_value[t]` describe equipment of age `t`; index 0 is new equipment
    pub fn new(
        profit: Vec<f64>,
        residual_value: Vec<f64>,
        replacement_cost: f64,
        horizon: usize,
    ) -> Result<Self, ConfigError> {
        if horizon < 1 {
            return Err(ConfigError::HorizonTooShort(horizon));
        }
        if profit.len() != residual_value.len() {
            return Err(ConfigError::AgeTableMismatch {
                profit: profit.len(),
                residual: residual_value.len(),
            });
        }
        if profit.len() < 2 {
            return Err(ConfigError::TooFewAges(profit.len()));
        }

        Ok(Self {
            profit,
            residual_value,
            replacement_cost,
            horizon,
        })
    }

    pub fn profit(&self) -> &[f64] {
        &self.profit
    }

    pub fn residual_value(&self) -> &[f64] {
        &self.residual_value
    }

    pub fn replacement_cost(&self) -> f64 {
        self.replacement_cost
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    pub fn max_age(&self) -> usize {
        self.profit.len() - 1
    }

    /// Profit of the year in which equipment of `age` is swapped for new
    fn replacement_profit(&self, age: usize) -> f64 {
        self.residual_value[age] - self.replacement_cost + self.profit[0]
    }

    /// Profit realized in one year by taking `decision` at `age`
    pub fn annual_profit(&self, age: usize, decision: Decision) -> f64 {
        match decision {
            Decision::Keep => self.profit[age],
            Decision::Replace => self.replacement_profit(age),
        }
    }
}

impl ValueTable {
    pub fn horizon(&self) -> usize {
        self.horizon
    }

    pub fn max_age(&self) -> usize {
        self.max_age
    }

    /// The state at `year` (1-based) and `age` (1-based), if inside the table
    pub fn cell(&self, year: usize, age: usize) -> Option<&TableCell> {
        if year == 0 || age == 0 {
            return None;
        }
        self.cells.get(year - 1, age - 1)
    }

    /// # Panics
    /// If `year` is outside `1..=horizon` or `age` outside `1..=max_age`.
    pub fn value(&self, year: usize, age: usize) -> f64 {
        self.cells[(year - 1, age - 1)].value
    }

    /// # Panics
    /// If `year` is outside `1..=horizon` or `age` outside `1..=max_age`.
    pub fn decision(&self, year: usize, age: usize) -> Decision {
        self.cells[(year - 1, age - 1)].decision
    }

    /// Cells of one year, ages ascending
    pub fn year(&self, year: usize) -> &[TableCell] {
        self.cells.row(year - 1)
    }
}

impl ReplacementPlanner {
    pub fn new() -> Self {
        Self
    }

    pub fn solve(&self, problem: &ReplacementProblem) -> ReplacementPlan {
        let table = fill_table(problem);
        let strategy = extract_strategy(problem, &table);
        let total_profit = table.value(1, 1);

        debug!(
            horizon = problem.horizon(),
            max_age = problem.max_age(),
            total_profit,
            "replacement plan computed"
        );

        ReplacementPlan {
            total_profit,
            strategy,
            table,
        }
    }
}

/// Validate the input and plan it
pub fn solve(
    profit: Vec<f64>,
    residual_value: Vec<f64>,
    replacement_cost: f64,
    horizon: usize,
) -> Result<ReplacementPlan, ConfigError> {
    let problem = ReplacementProblem::new(profit, residual_value, replacement_cost, horizon)?;
    Ok(ReplacementPlanner::new().solve(&problem))
}

/// Backward induction, last year first
///
/// `value[k][·]` only reads `value[k + 1][·]`, so years must be filled in
/// strictly decreasing order. Ties go to Keep.
fn fill_table(problem: &ReplacementProblem) -> ValueTable {
    let horizon = problem.horizon();
    let max_age = problem.max_age();
    let mut cells = Grid::new(horizon, max_age, TableCell::default());

    for year in (1..=horizon).rev() {
        let last_year = year == horizon;

        for age in 1..=max_age {
            let (after_replace, after_keep) = if last_year {
                (0.0, Some(0.0))
            } else {
                let next = year; // 0-based row of year + 1
                let after_keep = (age < max_age).then(|| cells[(next, age)].value);
                (cells[(next, 0)].value, after_keep)
            };

            let replace_value = problem.replacement_profit(age) + after_replace;
            let keep_value = after_keep.map(|future| problem.profit[age] + future);

            let (value, decision) = match keep_value {
                Some(keep) if keep >= replace_value => (keep, Decision::Keep),
                _ => (replace_value, Decision::Replace),
            };

            cells[(year - 1, age - 1)] = TableCell {
                value,
                decision,
                keep_value,
                replace_value,
            };
        }
    }

    ValueTable {
        horizon,
        max_age,
        cells,
    }
}

/// Forward walk from one-year-old equipment in year 1
fn extract_strategy(problem: &ReplacementProblem, table: &ValueTable) -> Vec<StrategyStep> {
    let max_age = problem.max_age();
    let mut age = 1;
    let mut strategy = Vec::with_capacity(problem.horizon());

    for year in 1..=problem.horizon() {
        let cell = table.year(year)[age - 1];
        strategy.push(StrategyStep {
            year,
            age,
            decision: cell.decision,
            profit_if_keep: cell.keep_value,
            profit_if_replace: cell.replace_value,
            annual_profit: problem.annual_profit(age, cell.decision),
        });

        age = match cell.decision {
            Decision::Replace => 1,
            Decision::Keep => (age + 1).min(max_age),
        };
    }

    strategy
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Best total over every keep/replace sequence starting from age 1
    fn brute_force(problem: &ReplacementProblem) -> f64 {
        let horizon = problem.horizon();
        let mut best = f64::NEG_INFINITY;

        'sequences: for mask in 0u32..(1 << horizon) {
            let mut age = 1;
            let mut total = 0.0;
            for year in 0..horizon {
                let replace = mask & (1 << year) != 0;
                if replace {
                    total += problem.annual_profit(age, Decision::Replace);
                    age = 1;
                } else {
                    if age == problem.max_age() && year + 1 < horizon {
                        continue 'sequences;
                    }
                    total += problem.annual_profit(age, Decision::Keep);
                    age += 1;
                }
            }
            best = best.max(total);
        }

        best
    }

    #[test]
    fn test_small_case_matches_hand_computation() {
        let plan = solve(vec![5.0, 4.0, 3.0], vec![4.0, 3.0, 2.0], 2.0, 2).unwrap();

        assert_eq!(plan.total_profit, 12.0);

        // Last year
        assert_eq!(plan.table.cell(2, 1).unwrap().keep_value, Some(4.0));
        assert_eq!(plan.table.cell(2, 1).unwrap().replace_value, 6.0);
        assert_eq!(plan.table.decision(2, 1), Decision::Replace);
        assert_eq!(plan.table.value(2, 2), 5.0);

        // First year
        assert_eq!(plan.table.cell(1, 1).unwrap().keep_value, Some(9.0));
        assert_eq!(plan.table.cell(1, 1).unwrap().replace_value, 12.0);
        assert_eq!(plan.table.cell(1, 2).unwrap().keep_value, None);
        assert_eq!(plan.table.value(1, 2), 11.0);

        let decisions: Vec<Decision> = plan.strategy.iter().map(|s| s.decision).collect();
        assert_eq!(decisions, vec![Decision::Replace, Decision::Replace]);
        assert_eq!(plan.strategy[1].age, 1);
        assert_eq!(plan.strategy[0].annual_profit, 6.0);
    }

    #[test]
    fn test_small_case_matches_brute_force() {
        let problem = ReplacementProblem::new(vec![5.0, 4.0, 3.0], vec![4.0, 3.0, 2.0], 2.0, 2).unwrap();
        let plan = ReplacementPlanner::new().solve(&problem);

        assert_eq!(plan.total_profit, brute_force(&problem));
    }

    #[test]
    fn test_fleet_case_matches_brute_force() {
        let problem = ReplacementProblem::new(
            vec![10.0, 9.0, 9.0, 8.0, 8.0, 7.0, 6.0],
            vec![9.0, 8.0, 8.0, 7.0, 6.0, 6.0, 4.0],
            10.0,
            6,
        )
        .unwrap();
        let plan = ReplacementPlanner::new().solve(&problem);

        assert_eq!(plan.strategy.len(), 6);
        assert_eq!(plan.total_profit, brute_force(&problem));

        let realized: f64 = plan.strategy.iter().map(|s| s.annual_profit).sum();
        assert_eq!(realized, plan.total_profit);
    }

    #[test]
    fn test_strategy_follows_ages() {
        let plan = solve(
            vec![10.0, 9.0, 9.0, 8.0, 8.0, 7.0, 6.0],
            vec![9.0, 8.0, 8.0, 7.0, 6.0, 6.0, 4.0],
            10.0,
            6,
        )
        .unwrap();

        assert_eq!(plan.strategy[0].age, 1);
        for pair in plan.strategy.windows(2) {
            let expected = match pair[0].decision {
                Decision::Replace => 1,
                Decision::Keep => pair[0].age + 1,
            };
            assert_eq!(pair[1].age, expected);
            assert_eq!(pair[1].year, pair[0].year + 1);
        }
    }

    #[test]
    fn test_tie_goes_to_keep() {
        // Last year, age 1: keep = 3, replace = 8 - 10 + 5 = 3
        let plan = solve(vec![5.0, 3.0, 1.0], vec![0.0, 8.0, 0.0], 10.0, 1).unwrap();
        let cell = plan.table.cell(1, 1).unwrap();

        assert_eq!(cell.keep_value, Some(cell.replace_value));
        assert_eq!(cell.decision, Decision::Keep);
        assert_eq!(plan.strategy[0].decision, Decision::Keep);
    }

    #[test]
    fn test_max_age_is_always_replaced_before_last_year() {
        // Keeping old equipment would be very lucrative, but it cannot age further
        let plan = solve(vec![1.0, 1.0, 100.0], vec![0.0, 0.0, 0.0], 0.0, 4).unwrap();

        for year in 1..4 {
            let cell = plan.table.cell(year, 2).unwrap();
            assert_eq!(cell.decision, Decision::Replace, "year {year}");
            assert_eq!(cell.keep_value, None);
        }
        // In the last year there is no next age to reach, so keeping is allowed
        assert_eq!(plan.table.decision(4, 2), Decision::Keep);
        assert_eq!(plan.table.value(4, 2), 100.0);
    }

    #[test]
    fn test_single_age_step_replaces_every_year() {
        // max_age = 1: age 1 can never be kept except in the final year
        let plan = solve(vec![3.0, 5.0], vec![1.0, 1.0], 4.0, 3).unwrap();

        assert_eq!(plan.table.decision(1, 1), Decision::Replace);
        assert_eq!(plan.table.decision(2, 1), Decision::Replace);
        assert_eq!(plan.table.decision(3, 1), Decision::Keep);
        // (1 - 4 + 3) * 2 + 5
        assert_eq!(plan.total_profit, 5.0);
    }

    #[test]
    fn test_solve_is_idempotent() {
        let problem = ReplacementProblem::new(vec![5.0, 4.0, 3.0], vec![4.0, 3.0, 2.0], 2.0, 5).unwrap();
        let planner = ReplacementPlanner::new();

        assert_eq!(planner.solve(&problem), planner.solve(&problem));
    }

    #[test]
    fn test_configuration_errors() {
        assert_eq!(
            solve(vec![1.0, 2.0], vec![1.0, 2.0], 1.0, 0),
            Err(ConfigError::HorizonTooShort(0))
        );
        assert_eq!(
            solve(vec![1.0, 2.0, 3.0], vec![1.0, 2.0], 1.0, 2),
            Err(ConfigError::AgeTableMismatch { profit: 3, residual: 2 })
        );
        assert_eq!(solve(vec![1.0], vec![1.0], 1.0, 2), Err(ConfigError::TooFewAges(1)));
    }

    #[test]
    fn test_out_of_range_cells() {
        let plan = solve(vec![5.0, 4.0, 3.0], vec![4.0, 3.0, 2.0], 2.0, 2).unwrap();

        assert!(plan.table.cell(0, 1).is_none());
        assert!(plan.table.cell(3, 1).is_none());
        assert!(plan.table.cell(1, 3).is_none());
        assert_eq!(plan.table.year(1).len(), 2);
    }
}

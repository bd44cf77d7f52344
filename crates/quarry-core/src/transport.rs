use quarry_solver::{ConstraintOp, LpProblem, LpSolver, Solution, SolutionStatus, Solver};
use tracing::{debug, warn};

use crate::balance::{BalancedProblem, TransportationProblem};
use crate::error::ConfigError;

/// Flows at or below this are treated as "nothing shipped" in itemized views
const SHIPMENT_EPSILON: f64 = 1e-9;

/// The LP built from a balanced problem, plus the lane behind each variable
#[derive(Debug, Clone)]
pub struct TransportModel {
    pub lp: LpProblem,
    /// `(supplier, consumer)` for each LP variable, in column order
    pub lanes: Vec<(usize, usize)>,
}

/// Minimum-cost shipment plan
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct TransportSolution {
    /// Outcome reported by the LP solver
    pub status: SolutionStatus,
    /// Shipped quantity per lane of the balanced problem; all zero unless optimal
    pub flows: Vec<Vec<f64>>,
    /// Objective value reported by the solver
    pub total_cost: f64,
    /// The problem the flows refer to
    pub balanced: BalancedProblem,
    /// Total supply of the original problem
    pub total_supply: f64,
    /// Total demand of the original problem
    pub total_demand: f64,
}

/// One positive shipment on a real lane
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub supplier: String,
    pub consumer: String,
    pub quantity: f64,
    pub unit_cost: f64,
    pub cost: f64,
}

/// Solves transportation problems through an [`LpSolver`]
#[derive(Debug, Clone, Default)]
pub struct TransportationSolver<S = Solver> {
    solver: S,
}

impl TransportationSolver<Solver> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S: LpSolver> TransportationSolver<S> {
    pub fn with_solver(solver: S) -> Self {
        Self { solver }
    }

    pub fn solve(&self, problem: &TransportationProblem) -> TransportSolution {
        let balanced = problem.balance();
        let model = build_model(&balanced);
        debug!(
            suppliers = balanced.num_suppliers(),
            consumers = balanced.num_consumers(),
            dummy = ?balanced.dummy,
            variables = model.lanes.len(),
            "solving transportation problem"
        );

        let solution = self.solver.solve(&model.lp);
        if !solution.status.is_optimal() {
            warn!(status = %solution.status, "transportation model was not solved to optimality");
        }

        TransportSolution {
            status: solution.status,
            flows: scatter_flows(&balanced, &model, &solution),
            total_cost: solution.objective_value,
            total_supply: problem.total_supply(),
            total_demand: problem.total_demand(),
            balanced,
        }
    }
}

/// Validate the input and solve it with the default simplex solver
pub fn solve(
    costs: Vec<Vec<f64>>,
    supply: Vec<f64>,
    demand: Vec<f64>,
    supply_names: Vec<String>,
    demand_names: Vec<String>,
) -> Result<TransportSolution, ConfigError> {
    let problem = TransportationProblem::new(costs, supply, demand, supply_names, demand_names)?;
    Ok(TransportationSolver::new().solve(&problem))
}

/// Equality-constrained LP: one variable per open lane, one row per supplier and per consumer
pub fn build_model(balanced: &BalancedProblem) -> TransportModel {
    let lanes: Vec<(usize, usize)> = (0..balanced.num_suppliers())
        .flat_map(|i| (0..balanced.num_consumers()).map(move |j| (i, j)))
        .filter(|&(i, j)| balanced.open[i][j])
        .collect();

    let variables = lanes.iter().map(|(i, j)| format!("x_{}_{}", i, j)).collect();
    let mut lp = LpProblem::new(variables);
    lp.set_objective(lanes.iter().map(|&(i, j)| balanced.costs[i][j]).collect(), true);

    for (i, &supply) in balanced.supply.iter().enumerate() {
        let coefficients = lanes.iter().map(|&(row, _)| if row == i { 1.0 } else { 0.0 }).collect();
        lp.add_constraint(format!("Supply_{}", i), coefficients, ConstraintOp::Eq, supply);
    }
    for (j, &demand) in balanced.demand.iter().enumerate() {
        let coefficients = lanes.iter().map(|&(_, col)| if col == j { 1.0 } else { 0.0 }).collect();
        lp.add_constraint(format!("Demand_{}", j), coefficients, ConstraintOp::Eq, demand);
    }

    TransportModel { lp, lanes }
}

fn scatter_flows(balanced: &BalancedProblem, model: &TransportModel, solution: &Solution) -> Vec<Vec<f64>> {
    let mut flows = vec![vec![0.0; balanced.num_consumers()]; balanced.num_suppliers()];
    if solution.status.is_optimal() {
        for (k, &(i, j)) in model.lanes.iter().enumerate() {
            flows[i][j] = solution.value(k);
        }
    }
    flows
}

impl TransportSolution {
    pub fn is_optimal(&self) -> bool {
        self.status.is_optimal()
    }

    /// Flows restricted to the original suppliers and consumers
    pub fn shipments(&self) -> Vec<Vec<f64>> {
        self.flows
            .iter()
            .take(self.balanced.real_suppliers)
            .map(|row| row[..self.balanced.real_consumers].to_vec())
            .collect()
    }

    /// Cost of the flows on real lanes only
    pub fn real_cost(&self) -> f64 {
        self.shipments()
            .iter()
            .zip(&self.balanced.costs)
            .flat_map(|(flows, costs)| flows.iter().zip(costs))
            .map(|(flow, cost)| flow * cost)
            .sum()
    }

    /// Positive shipments on real lanes, most expensive first
    ///
    /// Zero-cost real lanes are listed like any other; only the balancing node is left out.
    pub fn deliveries(&self) -> Vec<Delivery> {
        let balanced = &self.balanced;
        let mut deliveries = Vec::new();

        for i in 0..balanced.real_suppliers {
            for j in 0..balanced.real_consumers {
                let quantity = self.flows[i][j];
                if quantity <= SHIPMENT_EPSILON {
                    continue;
                }
                let unit_cost = balanced.costs[i][j];
                deliveries.push(Delivery {
                    supplier: balanced.supply_names[i].clone(),
                    consumer: balanced.demand_names[j].clone(),
                    quantity,
                    unit_cost,
                    cost: quantity * unit_cost,
                });
            }
        }

        deliveries.sort_by(|a, b| b.cost.total_cmp(&a.cost));
        deliveries
    }

    /// Capacity each real supplier leaves unused (its flow to the dummy consumer)
    pub fn unshipped_supply(&self) -> Vec<f64> {
        let real = self.balanced.real_consumers;
        (0..self.balanced.real_suppliers)
            .map(|i| if self.balanced.is_dummy_consumer(real) { self.flows[i][real] } else { 0.0 })
            .collect()
    }

    /// Demand each real consumer cannot get (its flow from the dummy supplier)
    pub fn unmet_demand(&self) -> Vec<f64> {
        let real = self.balanced.real_suppliers;
        (0..self.balanced.real_consumers)
            .map(|j| if self.balanced.is_dummy_supplier(real) { self.flows[real][j] } else { 0.0 })
            .collect()
    }
}

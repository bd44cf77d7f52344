use tracing::debug;

use crate::error::ConfigError;

pub const DUMMY_SUPPLIER_NAME: &str = "Dummy supplier";
pub const DUMMY_CONSUMER_NAME: &str = "Dummy consumer";

/// What to do with a cost cell that is missing or could not be parsed
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingCost {
    /// Treat the lane as free (cost 0). This is a modeling simplification:
    /// the lane becomes indistinguishable from a genuinely free one.
    #[default]
    Zero,
    /// Treat the lane as unavailable: no flow may use it
    Forbid,
}

/// Suppliers, consumers and the per-unit cost of every lane between them
///
/// Shape is checked on construction and the problem is immutable afterwards.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct TransportationProblem {
    costs: Vec<Vec<f64>>,
    open: Vec<Vec<bool>>,
    supply: Vec<f64>,
    demand: Vec<f64>,
    supply_names: Vec<String>,
    demand_names: Vec<String>,
}

/// Which side received the balancing node
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dummy {
    /// Demand exceeded supply; the last row is synthetic
    Supplier,
    /// Supply exceeded demand; the last column is synthetic
    Consumer,
}

/// A transportation problem with equal total supply and demand
///
/// At most one dummy row or column is appended, and which one is recorded in
/// `dummy` rather than inferred from its zero costs.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct BalancedProblem {
    pub costs: Vec<Vec<f64>>,
    /// Lanes that may carry flow
    pub open: Vec<Vec<bool>>,
    pub supply: Vec<f64>,
    pub demand: Vec<f64>,
    pub supply_names: Vec<String>,
    pub demand_names: Vec<String>,
    pub dummy: Option<Dummy>,
    /// Suppliers in the original problem
    pub real_suppliers: usize,
    /// Consumers in the original problem
    pub real_consumers: usize,
}

impl TransportationProblem {
    pub fn new(
        costs: Vec<Vec<f64>>,
        supply: Vec<f64>,
        demand: Vec<f64>,
        supply_names: Vec<String>,
        demand_names: Vec<String>,
    ) -> Result<Self, ConfigError> {
        let open = costs.iter().map(|row| vec![true; row.len()]).collect();
        Self::with_lanes(costs, open, supply, demand, supply_names, demand_names)
    }

    /// Build a problem whose nodes are labelled `Supplier 1..m` and `Consumer 1..n`
    pub fn unnamed(costs: Vec<Vec<f64>>, supply: Vec<f64>, demand: Vec<f64>) -> Result<Self, ConfigError> {
        let supply_names = default_names("Supplier", supply.len());
        let demand_names = default_names("Consumer", demand.len());
        Self::new(costs, supply, demand, supply_names, demand_names)
    }

    /// Build a problem from cells that may be missing, normalized by `policy`
    pub fn from_raw_costs(
        raw: Vec<Vec<Option<f64>>>,
        policy: MissingCost,
        supply: Vec<f64>,
        demand: Vec<f64>,
        supply_names: Vec<String>,
        demand_names: Vec<String>,
    ) -> Result<Self, ConfigError> {
        let mut missing = 0;
        let mut costs = Vec::with_capacity(raw.len());
        let mut open = Vec::with_capacity(raw.len());

        for row in raw {
            let mut cost_row = Vec::with_capacity(row.len());
            let mut open_row = Vec::with_capacity(row.len());
            for cell in row {
                match cell.filter(|cost| cost.is_finite()) {
                    Some(cost) => {
                        cost_row.push(cost);
                        open_row.push(true);
                    }
                    None => {
                        missing += 1;
                        cost_row.push(0.0);
                        open_row.push(policy == MissingCost::Zero);
                    }
                }
            }
            costs.push(cost_row);
            open.push(open_row);
        }

        if missing > 0 {
            debug!(missing, ?policy, "normalized missing cost cells");
        }

        Self::with_lanes(costs, open, supply, demand, supply_names, demand_names)
    }

    fn with_lanes(
        costs: Vec<Vec<f64>>,
        open: Vec<Vec<bool>>,
        supply: Vec<f64>,
        demand: Vec<f64>,
        supply_names: Vec<String>,
        demand_names: Vec<String>,
    ) -> Result<Self, ConfigError> {
        let consumers = check_shape(&costs)?;

        if supply.len() != costs.len() {
            return Err(ConfigError::SupplyLength {
                expected: costs.len(),
                found: supply.len(),
            });
        }
        if demand.len() != consumers {
            return Err(ConfigError::DemandLength {
                expected: consumers,
                found: demand.len(),
            });
        }
        if supply_names.len() != supply.len() {
            return Err(ConfigError::SupplyNames {
                expected: supply.len(),
                found: supply_names.len(),
            });
        }
        if demand_names.len() != demand.len() {
            return Err(ConfigError::DemandNames {
                expected: demand.len(),
                found: demand_names.len(),
            });
        }

        Ok(Self {
            costs,
            open,
            supply,
            demand,
            supply_names,
            demand_names,
        })
    }

    pub fn num_suppliers(&self) -> usize {
        self.supply.len()
    }

    pub fn num_consumers(&self) -> usize {
        self.demand.len()
    }

    pub fn costs(&self) -> &[Vec<f64>] {
        &self.costs
    }

    pub fn supply(&self) -> &[f64] {
        &self.supply
    }

    pub fn demand(&self) -> &[f64] {
        &self.demand
    }

    pub fn supply_names(&self) -> &[String] {
        &self.supply_names
    }

    pub fn demand_names(&self) -> &[String] {
        &self.demand_names
    }

    /// Whether flow may use the lane from supplier `i` to consumer `j`
    pub fn is_open(&self, i: usize, j: usize) -> bool {
        self.open[i][j]
    }

    pub fn total_supply(&self) -> f64 {
        self.supply.iter().sum()
    }

    pub fn total_demand(&self) -> f64 {
        self.demand.iter().sum()
    }

    /// Append a zero-cost dummy supplier or consumer absorbing the imbalance
    pub fn balance(&self) -> BalancedProblem {
        let total_supply = self.total_supply();
        let total_demand = self.total_demand();

        let mut balanced = BalancedProblem {
            costs: self.costs.clone(),
            open: self.open.clone(),
            supply: self.supply.clone(),
            demand: self.demand.clone(),
            supply_names: self.supply_names.clone(),
            demand_names: self.demand_names.clone(),
            dummy: None,
            real_suppliers: self.num_suppliers(),
            real_consumers: self.num_consumers(),
        };

        if total_supply > total_demand {
            let surplus = total_supply - total_demand;
            for (costs, open) in balanced.costs.iter_mut().zip(&mut balanced.open) {
                costs.push(0.0);
                open.push(true);
            }
            balanced.demand.push(surplus);
            balanced.demand_names.push(DUMMY_CONSUMER_NAME.to_string());
            balanced.dummy = Some(Dummy::Consumer);
            debug!(surplus, "added dummy consumer");
        } else if total_demand > total_supply {
            let deficit = total_demand - total_supply;
            balanced.costs.push(vec![0.0; self.num_consumers()]);
            balanced.open.push(vec![true; self.num_consumers()]);
            balanced.supply.push(deficit);
            balanced.supply_names.push(DUMMY_SUPPLIER_NAME.to_string());
            balanced.dummy = Some(Dummy::Supplier);
            debug!(deficit, "added dummy supplier");
        }

        balanced
    }
}

/// `"{prefix} 1"` through `"{prefix} {count}"`
pub fn default_names(prefix: &str, count: usize) -> Vec<String> {
    (1..=count).map(|n| format!("{} {}", prefix, n)).collect()
}

/// Number of columns of a non-empty rectangular matrix
fn check_shape(costs: &[Vec<f64>]) -> Result<usize, ConfigError> {
    let Some(first) = costs.first() else {
        return Err(ConfigError::EmptyCosts);
    };
    if first.is_empty() {
        return Err(ConfigError::EmptyCosts);
    }
    let expected = first.len();
    for (row, cells) in costs.iter().enumerate() {
        if cells.len() != expected {
            return Err(ConfigError::RaggedCosts {
                row,
                expected,
                found: cells.len(),
            });
        }
    }
    Ok(expected)
}

impl BalancedProblem {
    pub fn num_suppliers(&self) -> usize {
        self.supply.len()
    }

    pub fn num_consumers(&self) -> usize {
        self.demand.len()
    }

    pub fn total_supply(&self) -> f64 {
        self.supply.iter().sum()
    }

    pub fn total_demand(&self) -> f64 {
        self.demand.iter().sum()
    }

    pub fn is_dummy_supplier(&self, i: usize) -> bool {
        self.dummy == Some(Dummy::Supplier) && i >= self.real_suppliers
    }

    pub fn is_dummy_consumer(&self, j: usize) -> bool {
        self.dummy == Some(Dummy::Consumer) && j >= self.real_consumers
    }

    /// Whether either end of the lane is the balancing node
    pub fn is_dummy_lane(&self, i: usize, j: usize) -> bool {
        self.is_dummy_supplier(i) || self.is_dummy_consumer(j)
    }
}

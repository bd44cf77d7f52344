use std::path::{Path, PathBuf};

use quarry_core::balance::default_names;
use quarry_core::{ConfigError, MissingCost, ReplacementProblem, TransportationProblem};
use serde::Deserialize;
use thiserror::Error;

/// Planning horizon used when the input file does not name one
pub const DEFAULT_HORIZON: usize = 6;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid problem: {0}")]
    Config(#[from] ConfigError),
    #[error("{0} does not describe a transportation or replacement problem")]
    UnknownInput(PathBuf),
    #[error("Transportation model finished with status {0}")]
    NotOptimal(quarry_core::SolutionStatus),
    #[error("Error writing output: {0}")]
    Output(serde_json::Error),
}

/// Transportation problem as stored on disk; `null` marks a missing cost
#[derive(Debug, Clone, Deserialize)]
pub struct TransportInput {
    pub costs: Vec<Vec<Option<f64>>>,
    pub supply: Vec<f64>,
    pub demand: Vec<f64>,
    #[serde(default)]
    pub supply_names: Option<Vec<String>>,
    #[serde(default)]
    pub demand_names: Option<Vec<String>>,
}

/// Replacement problem as stored on disk
#[derive(Debug, Clone, Deserialize)]
pub struct ReplacementInput {
    pub profit: Vec<f64>,
    pub residual_value: Vec<f64>,
    pub replacement_cost: f64,
    #[serde(default)]
    pub horizon: Option<usize>,
}

/// Either kind of input, told apart by its fields
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AnyInput {
    Transport(TransportInput),
    Replacement(ReplacementInput),
}

impl TransportInput {
    pub fn into_problem(self, policy: MissingCost) -> Result<TransportationProblem, ConfigError> {
        let supply_names = self
            .supply_names
            .unwrap_or_else(|| default_names("Supplier", self.supply.len()));
        let demand_names = self
            .demand_names
            .unwrap_or_else(|| default_names("Consumer", self.demand.len()));
        TransportationProblem::from_raw_costs(self.costs, policy, self.supply, self.demand, supply_names, demand_names)
    }
}

impl ReplacementInput {
    /// `horizon` overrides the file, which overrides [`DEFAULT_HORIZON`]
    pub fn into_problem(self, horizon: Option<usize>) -> Result<ReplacementProblem, ConfigError> {
        let horizon = horizon.or(self.horizon).unwrap_or(DEFAULT_HORIZON);
        ReplacementProblem::new(self.profit, self.residual_value, self.replacement_cost, horizon)
    }
}

pub fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, CliError> {
    let source = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_json(&source, path)
}

fn parse_json<T: for<'de> Deserialize<'de>>(source: &str, path: &Path) -> Result<T, CliError> {
    serde_json::from_str(source).map_err(|source| CliError::Json {
        path: path.to_path_buf(),
        source,
    })
}

use thiserror::Error;

/// Malformed input shape, detected before any optimization work starts
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Cost matrix is empty")]
    EmptyCosts,
    #[error("Cost matrix row {row} has {found} entries, expected {expected}")]
    RaggedCosts { row: usize, expected: usize, found: usize },
    #[error("Supply has {found} entries but the cost matrix has {expected} rows")]
    SupplyLength { expected: usize, found: usize },
    #[error("Demand has {found} entries but the cost matrix has {expected} columns")]
    DemandLength { expected: usize, found: usize },
    #[error("{found} supplier names given for {expected} suppliers")]
    SupplyNames { expected: usize, found: usize },
    #[error("{found} consumer names given for {expected} consumers")]
    DemandNames { expected: usize, found: usize },
    #[error("Planning horizon must be at least 1 year, got {0}")]
    HorizonTooShort(usize),
    #[error("Profit has {profit} entries but residual value has {residual}")]
    AgeTableMismatch { profit: usize, residual: usize },
    #[error("At least two ages (new and one year old) are required, got {0}")]
    TooFewAges(usize),
}

//! Tariff costing: tier allocation, annual simulation, and batch driving.

/// Parallel batch costing with exclusion counts.
pub mod batch;
/// Residential off-peak-seeking estimate.
pub mod residential;
pub mod simulator;
pub mod tiers;

// Re-export the main types for convenience
pub use batch::BatchOutcome;
pub use batch::BatchReport;
pub use residential::ResidentialRate;
pub use simulator::CostError;
pub use simulator::CostResult;

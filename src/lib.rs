//! Levelized-cost-of-charging tariff engine.
//!
//! Parses a wide row-per-tariff utility rate table, classifies and filters
//! the rate set, and computes the annualized cost of serving a fixed
//! charging load profile under every surviving tariff.

pub mod config;
/// Tier allocation, annual simulation, and parallel batch costing.
pub mod cost;
pub mod io;
pub mod profile;
/// Tariff model, schedules, classification, and filter passes.
pub mod tariff;
/// Wide-table dataset adapter.
pub mod urdb;

//! CSV export of cost results, classification flags, and residential rates.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::cost::residential::ResidentialRate;
use crate::cost::simulator::CostResult;
use crate::tariff::record::TariffRecord;

/// Column header for per-tariff cost rows.
const COST_HEADER: &str =
    "label,annual_fixed_cost,annual_demand_cost,annual_energy_cost,annual_cost_total,\
     lvl_cost_per_kwh";

/// Column header for classification flag rows.
const FLAGS_HEADER: &str =
    "label,is_demand_rate,is_tier_rate,is_seasonal_rate,is_tou_rate,is_ev_rate";

/// Exports cost results to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_cost_results(results: &[CostResult], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_cost_results(results, io::BufWriter::new(file))
}

/// Writes cost results as CSV to any writer. Produces deterministic output
/// for identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_cost_results(results: &[CostResult], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(COST_HEADER.split(',').map(str::trim))?;
    for r in results {
        wtr.write_record(&[
            r.label.clone(),
            format!("{:.4}", r.annual_fixed_cost),
            format!("{:.4}", r.annual_demand_cost),
            format!("{:.4}", r.annual_energy_cost),
            format!("{:.4}", r.annual_cost_total),
            format!("{:.6}", r.levelized_cost_per_kwh),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes one classification flag row per classified tariff, for
/// downstream filtering and reporting buckets.
///
/// Flags are 1/0; seasonal and TOU are left empty for tariffs whose
/// schedule did not decode. Unclassified records are skipped.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_flags(records: &[TariffRecord], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(FLAGS_HEADER.split(',').map(str::trim))?;
    for record in records {
        let Some(flags) = record.flags else { continue };
        wtr.write_record(&[
            record.label.clone(),
            bit(flags.demand).to_string(),
            bit(flags.tiered).to_string(),
            opt_bit(flags.seasonal),
            opt_bit(flags.time_of_use),
            bit(flags.ev_specific).to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Exports classification flags to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_flags(records: &[TariffRecord], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_flags(records, io::BufWriter::new(file))
}

/// Writes residential levelized rates as CSV.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_residential_rates(rates: &[ResidentialRate], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(["label", "electricity_cost_per_kwh"])?;
    for r in rates {
        wtr.write_record(&[r.label.clone(), format!("{:.6}", r.cost_per_kwh)])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Exports residential rates to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_residential_rates(rates: &[ResidentialRate], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_residential_rates(rates, io::BufWriter::new(file))
}

fn bit(b: bool) -> u8 {
    u8::from(b)
}

fn opt_bit(b: Option<bool>) -> String {
    b.map(|v| bit(v).to_string()).unwrap_or_default()
}

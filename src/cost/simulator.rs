//! Annual cost simulation for one tariff against one load profile summary.

use std::fmt;

use crate::profile::ProfileSummary;
use crate::tariff::record::{DemandCharge, RatePeriod, TariffRecord, UsageUnit};
use crate::tariff::schedule::{DayType, TouSchedule};

use super::tiers::window_cost;

/// Annualized cost of serving one load profile under one tariff.
#[derive(Debug, Clone, PartialEq)]
pub struct CostResult {
    pub label: String,
    pub annual_fixed_cost: f64,
    pub annual_demand_cost: f64,
    pub annual_energy_cost: f64,
    pub annual_cost_total: f64,
    pub levelized_cost_per_kwh: f64,
}

impl fmt::Display for CostResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: fixed={:.2} demand={:.2} energy={:.2} total={:.2} ({:.4} $/kWh)",
            self.label,
            self.annual_fixed_cost,
            self.annual_demand_cost,
            self.annual_energy_cost,
            self.annual_cost_total,
            self.levelized_cost_per_kwh
        )
    }
}

/// Why a tariff was excluded from one profile's costing pass.
///
/// All variants are local to the tariff: the batch counts them and moves
/// on. Negative component totals signal corrupt source encoding and drop
/// the tariff rather than correcting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostError {
    /// A month's peak or energy fell outside the declared bounds.
    Ineligible,
    /// A required schedule failed to decode.
    MalformedSchedule,
    /// The schedule references a period with no rate information
    /// (residential estimate only; the full simulation bills it at zero).
    MissingRate,
    NegativeFixed,
    NegativeDemand,
    NegativeEnergy,
}

impl fmt::Display for CostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ineligible => write!(f, "load outside declared capacity/usage bounds"),
            Self::MalformedSchedule => write!(f, "schedule text did not decode"),
            Self::MissingRate => write!(f, "schedule references a period with no rate"),
            Self::NegativeFixed => write!(f, "negative annual fixed cost"),
            Self::NegativeDemand => write!(f, "negative annual demand cost"),
            Self::NegativeEnergy => write!(f, "negative annual energy cost"),
        }
    }
}

impl std::error::Error for CostError {}

/// Simulates one tariff-year and returns the three cost components.
///
/// The profile summary is pre-aggregated (month×day-type×hour energy grid
/// and monthly peak table), so this runs in periods×months work per
/// tariff. A schedule reference to a period with no rate table bills at
/// zero, matching the source dataset's null-rate fill convention.
///
/// # Errors
///
/// Returns a [`CostError`] when the tariff is ineligible for this load,
/// when a required schedule is undecodable, or when any component total
/// is negative.
pub fn cost_tariff(
    tariff: &TariffRecord,
    summary: &ProfileSummary,
) -> Result<CostResult, CostError> {
    if !tariff
        .bounds
        .admits(&summary.monthly_energy_kwh, &summary.monthly_peak_kw)
    {
        return Err(CostError::Ineligible);
    }

    let annual_fixed_cost = tariff.fixed_charge * 12.0;
    if annual_fixed_cost < 0.0 {
        return Err(CostError::NegativeFixed);
    }

    let annual_demand_cost = demand_cost(tariff, summary)?;
    if annual_demand_cost < 0.0 {
        return Err(CostError::NegativeDemand);
    }

    let annual_energy_cost = energy_cost(tariff, summary)?;
    if annual_energy_cost < 0.0 {
        return Err(CostError::NegativeEnergy);
    }

    let annual_cost_total = annual_fixed_cost + annual_demand_cost + annual_energy_cost;
    let levelized_cost_per_kwh = if summary.annual_energy_kwh > 0.0 {
        annual_cost_total / summary.annual_energy_kwh
    } else {
        0.0
    };

    Ok(CostResult {
        label: tariff.label.clone(),
        annual_fixed_cost,
        annual_demand_cost,
        annual_energy_cost,
        annual_cost_total,
        levelized_cost_per_kwh,
    })
}

/// Sums twelve monthly peak-demand charges through the demand tier table.
fn demand_cost(tariff: &TariffRecord, summary: &ProfileSummary) -> Result<f64, CostError> {
    match &tariff.demand {
        DemandCharge::None => Ok(0.0),
        DemandCharge::Flat {
            periods,
            month_period,
        } => {
            let mut total = 0.0;
            for (month0, &period) in month_period.iter().enumerate() {
                total += period_cost(periods, period, summary.monthly_peak_kw[month0]);
            }
            Ok(total)
        }
        DemandCharge::TimeOfUse { periods, schedule } => {
            let schedule = schedule.as_ref().ok_or(CostError::MalformedSchedule)?;
            let mut total = 0.0;
            for month0 in 0..12 {
                let (day_type, hour) = summary.monthly_peak_slot[month0];
                let period = schedule.period_at(month0, day_type, hour);
                total += period_cost(periods, period, summary.monthly_peak_kw[month0]);
            }
            Ok(total)
        }
    }
}

fn period_cost(periods: &[RatePeriod], period: usize, q: f64) -> f64 {
    match periods.get(period) {
        Some(p) => window_cost(&p.tiers, q, 1.0),
        None => 0.0,
    }
}

/// Assigns the energy grid to periods and allocates each billing window.
fn energy_cost(tariff: &TariffRecord, summary: &ProfileSummary) -> Result<f64, CostError> {
    let schedule = tariff
        .energy_schedule
        .as_ref()
        .ok_or(CostError::MalformedSchedule)?;
    let n_periods = tariff.energy.len().max(schedule.max_period() + 1);

    match tariff.energy_ceiling_unit {
        UsageUnit::KWhPerDay => Ok(daily_energy_cost(tariff, summary, schedule, n_periods)),
        unit => {
            let mut total = 0.0;
            let mut window = vec![0.0_f64; n_periods];
            for month0 in 0..12 {
                window.fill(0.0);
                for day_type in [DayType::Weekday, DayType::Weekend] {
                    for hour in 0..24 {
                        let period = schedule.period_at(month0, day_type, hour);
                        window[period] +=
                            summary.month_hour_energy_kwh[month0][day_type.index()][hour];
                    }
                }
                let scale = match unit {
                    UsageUnit::KWhPerKw => summary.monthly_peak_kw[month0],
                    _ => 1.0,
                };
                for (period, &q) in window.iter().enumerate() {
                    if q > 0.0
                        && let Some(p) = tariff.energy.get(period)
                    {
                        total += window_cost(&p.tiers, q, scale);
                    }
                }
            }
            Ok(total)
        }
    }
}

/// Day-capped tiers: the allocator runs once per calendar day.
fn daily_energy_cost(
    tariff: &TariffRecord,
    summary: &ProfileSummary,
    schedule: &TouSchedule,
    n_periods: usize,
) -> f64 {
    let mut total = 0.0;
    let mut window = vec![0.0_f64; n_periods];
    for day in &summary.days {
        window.fill(0.0);
        for (hour, &energy) in day.hour_energy_kwh.iter().enumerate() {
            let period = schedule.period_at(day.month0, day.day_type, hour);
            window[period] += energy;
        }
        for (period, &q) in window.iter().enumerate() {
            if q > 0.0
                && let Some(p) = tariff.energy.get(period)
            {
                total += window_cost(&p.tiers, q, 1.0);
            }
        }
    }
    total
}

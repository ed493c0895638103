//! Off-peak-seeking levelized rate estimate for residential tariffs.

use std::fmt;

use crate::tariff::classify::is_tiered;
use crate::tariff::record::{RatePeriod, TariffRecord};
use crate::tariff::schedule::DayType;

use super::simulator::CostError;

/// Weekday/weekend day counts used for the day-of-week weighting.
const WEEKDAYS_PER_WEEK: f64 = 5.0;
const WEEKEND_DAYS_PER_WEEK: f64 = 2.0;

/// Levelized residential electricity rate for one tariff.
#[derive(Debug, Clone, PartialEq)]
pub struct ResidentialRate {
    pub label: String,
    pub cost_per_kwh: f64,
}

impl fmt::Display for ResidentialRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:.4} $/kWh", self.label, self.cost_per_kwh)
    }
}

/// Estimates the levelized energy rate for a residential tariff without a
/// demand charge.
///
/// Home charging has no fixed station profile, so this assumes charging
/// is day-of-week- and season-agnostic and always shifted to the cheapest
/// period available that day ("always charge off-peak"): the result is the
/// 5/7-weekday, 2/7-weekend weighted mean over twelve months of each
/// month's minimum period rate. Flat tariffs price a period by its first
/// tier; tiered tariffs by the mean of its rated tiers, assuming charging
/// spreads evenly across brackets. Commercial and demand-charge tariffs
/// must go through the full simulation instead.
///
/// # Errors
///
/// [`CostError::MalformedSchedule`] when the energy schedule did not
/// decode, [`CostError::MissingRate`] when the schedule references a
/// period with no rate, and [`CostError::NegativeEnergy`] when the
/// weighted rate is negative (corrupt encoding).
pub fn levelized_rate(tariff: &TariffRecord) -> Result<ResidentialRate, CostError> {
    let schedule = tariff
        .energy_schedule
        .as_ref()
        .ok_or(CostError::MalformedSchedule)?;
    let tiered = is_tiered(tariff);

    let mut weighted_sum = 0.0;
    for month0 in 0..12 {
        for (day_type, weight) in [
            (DayType::Weekday, WEEKDAYS_PER_WEEK),
            (DayType::Weekend, WEEKEND_DAYS_PER_WEEK),
        ] {
            let row = schedule.row(month0, day_type);
            let mut min_rate = f64::INFINITY;
            for &period in row {
                let rate = period_rate(tariff.energy.get(period as usize), tiered)
                    .ok_or(CostError::MissingRate)?;
                min_rate = min_rate.min(rate);
            }
            weighted_sum += weight * min_rate;
        }
    }

    let cost_per_kwh =
        weighted_sum / (12.0 * (WEEKDAYS_PER_WEEK + WEEKEND_DAYS_PER_WEEK));
    if cost_per_kwh < 0.0 {
        return Err(CostError::NegativeEnergy);
    }

    Ok(ResidentialRate {
        label: tariff.label.clone(),
        cost_per_kwh,
    })
}

fn period_rate(period: Option<&RatePeriod>, tiered: bool) -> Option<f64> {
    let period = period?;
    if tiered {
        period.mean_rate()
    } else {
        period.first_tier_rate()
    }
}

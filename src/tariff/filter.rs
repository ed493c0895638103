//! Tariff set reduction passes, each reported as a removal count.

use std::fmt;

use super::classify::contains_phrase;
use super::record::TariffRecord;

/// Highest minimum service voltage a charging station is assumed able to
/// interconnect at.
const MAX_SERVICE_VOLTAGE: f64 = 900.0;

/// Counts of tariffs removed by each reduction pass.
///
/// All removals are local, per-tariff, and non-fatal; the report is the
/// only trace they leave.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterReport {
    /// Rates with a declared end date (no longer offered).
    pub stale: usize,
    /// Rates whose name or description matched an exclusion phrase.
    pub phrase_matched: usize,
    /// Rates with no energy rate information at all.
    pub missing_rate: usize,
    /// Commercial rates missing fields needed to price a station load.
    pub commercial_fields: usize,
    /// Rates carrying a demand charge, when a no-demand pass is requested.
    pub demand: usize,
}

impl FilterReport {
    pub fn total_removed(&self) -> usize {
        self.stale + self.phrase_matched + self.missing_rate + self.commercial_fields + self.demand
    }
}

impl fmt::Display for FilterReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "filtered {} rates (stale={}, phrase={}, missing-rate={}, commercial-fields={}, demand={})",
            self.total_removed(),
            self.stale,
            self.phrase_matched,
            self.missing_rate,
            self.commercial_fields,
            self.demand
        )
    }
}

/// Removes rates with a declared end date, keeping only active ones.
pub fn retain_active(records: &mut Vec<TariffRecord>, report: &mut FilterReport) {
    let before = records.len();
    records.retain(|r| r.end_date.is_none());
    report.stale += before - records.len();
}

/// Removes rates whose name or description contains any exclusion phrase
/// (special-contract riders, net-metering-only rates, and similar).
pub fn retain_unmatched(
    records: &mut Vec<TariffRecord>,
    phrases: &[String],
    report: &mut FilterReport,
) {
    if phrases.is_empty() {
        return;
    }
    let before = records.len();
    records.retain(|r| {
        !contains_phrase(Some(&r.name), phrases)
            && !contains_phrase(r.description.as_deref(), phrases)
    });
    report.phrase_matched += before - records.len();
}

/// Removes rates with no first-period, first-tier energy rate. Runs before
/// costing so the simulator never sees a rate-less tariff.
pub fn retain_rated(records: &mut Vec<TariffRecord>, report: &mut FilterReport) {
    let before = records.len();
    records.retain(TariffRecord::has_energy_rate);
    report.missing_rate += before - records.len();
}

/// Removes commercial rates that cannot price a station load: demand
/// billed in units other than kW, coincident-demand structures, and
/// high-voltage-only service.
pub fn retain_costable_commercial(records: &mut Vec<TariffRecord>, report: &mut FilterReport) {
    let before = records.len();
    records.retain(|r| {
        r.demand_units_kw
            && !r.has_coincident_demand
            && r.voltage_min.is_none_or(|v| v <= MAX_SERVICE_VOLTAGE)
    });
    report.commercial_fields += before - records.len();
}

/// Removes rates carrying a demand charge. Used for the residential
/// estimate, which has no station load to peak against.
pub fn retain_no_demand(records: &mut Vec<TariffRecord>, report: &mut FilterReport) {
    let before = records.len();
    records.retain(|r| !r.demand.is_present());
    report.demand += before - records.len();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tariff::record::{DemandCharge, RatePeriod, Sector};
    use chrono::NaiveDate;

    fn records() -> Vec<TariffRecord> {
        vec![
            TariffRecord::flat("a", Sector::Residential, 1.0, 0.10),
            TariffRecord::flat("b", Sector::Residential, 1.0, 0.12),
            TariffRecord::flat("c", Sector::Residential, 1.0, 0.14),
        ]
    }

    #[test]
    fn stale_rates_are_removed() {
        let mut set = records();
        set[1].end_date = NaiveDate::from_ymd_opt(2018, 6, 30);
        let mut report = FilterReport::default();
        retain_active(&mut set, &mut report);
        assert_eq!(set.len(), 2);
        assert_eq!(report.stale, 1);
        assert!(set.iter().all(|r| r.end_date.is_none()));
    }

    #[test]
    fn phrase_filter_checks_name_and_description() {
        let mut set = records();
        set[0].name = "General service - net metering".to_string();
        set[1].description = Some("Closed to new customers".to_string());
        let phrases = vec!["net metering".to_string(), "closed".to_string()];
        let mut report = FilterReport::default();
        retain_unmatched(&mut set, &phrases, &mut report);
        assert_eq!(set.len(), 1);
        assert_eq!(report.phrase_matched, 2);
        assert_eq!(set[0].label, "c");
    }

    #[test]
    fn empty_phrase_list_removes_nothing() {
        let mut set = records();
        let mut report = FilterReport::default();
        retain_unmatched(&mut set, &[], &mut report);
        assert_eq!(set.len(), 3);
        assert_eq!(report.phrase_matched, 0);
    }

    #[test]
    fn rateless_tariffs_are_removed() {
        let mut set = records();
        set[2].energy = vec![RatePeriod::default()];
        let mut report = FilterReport::default();
        retain_rated(&mut set, &mut report);
        assert_eq!(set.len(), 2);
        assert_eq!(report.missing_rate, 1);
    }

    #[test]
    fn commercial_field_filter() {
        let mut set = records();
        set[0].voltage_min = Some(4160.0);
        set[1].has_coincident_demand = true;
        set[2].voltage_min = Some(480.0);
        let mut report = FilterReport::default();
        retain_costable_commercial(&mut set, &mut report);
        assert_eq!(set.len(), 1);
        assert_eq!(set[0].label, "c");
        assert_eq!(report.commercial_fields, 2);
    }

    #[test]
    fn demand_filter_keeps_no_demand_rates() {
        let mut set = records();
        set[0].demand = DemandCharge::Flat {
            periods: vec![RatePeriod::flat(10.0)],
            month_period: [0; 12],
        };
        let mut report = FilterReport::default();
        retain_no_demand(&mut set, &mut report);
        assert_eq!(set.len(), 2);
        assert_eq!(report.demand, 1);
    }
}

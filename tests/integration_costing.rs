//! Batch costing behavior across profiles and worker counts.

mod common;

use tariff_sim::cost::batch::cost_all;
use tariff_sim::io::export::write_cost_results;
use tariff_sim::tariff::record::{EligibilityBounds, RatePeriod, RateTier, Sector, TariffRecord};

fn tariff_set() -> Vec<TariffRecord> {
    let mut set = Vec::new();

    let mut small_only = TariffRecord::flat("small_only", Sector::Commercial, 5.0, 0.10);
    small_only.bounds = EligibilityBounds {
        capacity_max_kw: 20.0,
        ..EligibilityBounds::default()
    };
    set.push(small_only);

    let mut large_only = TariffRecord::flat("large_only", Sector::Commercial, 50.0, 0.07);
    large_only.bounds = EligibilityBounds {
        capacity_min_kw: 40.0,
        ..EligibilityBounds::default()
    };
    set.push(large_only);

    let mut tiered = TariffRecord::flat("tiered", Sector::Commercial, 0.0, 0.0);
    tiered.energy = vec![RatePeriod::new(vec![
        RateTier::new(Some(10_000.0), Some(0.12), 0.0),
        RateTier::new(None, Some(0.09), 0.0),
    ])];
    set.push(tiered);

    set.push(TariffRecord::flat("corrupt", Sector::Commercial, -3.0, 0.10));
    set
}

#[test]
fn eligibility_is_per_profile() {
    let set = tariff_set();

    // 10 kW station: too small for "large_only".
    let small = cost_all(&set, &common::constant_summary(10.0), 2);
    assert_eq!(small.report.ineligible, 1);
    assert!(small.results.iter().any(|r| r.label == "small_only"));
    assert!(small.results.iter().all(|r| r.label != "large_only"));

    // 50 kW station: too large for "small_only".
    let large = cost_all(&set, &common::constant_summary(50.0), 2);
    assert_eq!(large.report.ineligible, 1);
    assert!(large.results.iter().any(|r| r.label == "large_only"));
    assert!(large.results.iter().all(|r| r.label != "small_only"));
}

#[test]
fn corrupt_tariffs_are_counted_not_raised() {
    let set = tariff_set();
    let outcome = cost_all(&set, &common::constant_summary(10.0), 2);
    assert_eq!(outcome.report.negative_cost, 1);
    assert!(outcome.report.reconciles());
    assert!(outcome.results.iter().all(|r| r.label != "corrupt"));
}

#[test]
fn tiered_monthly_windows_cross_the_ceiling() {
    let set = tariff_set();
    // 30 kW constant: every month exceeds the 10 000 kWh first bracket.
    let summary = common::constant_summary(30.0);
    let outcome = cost_all(&set, &summary, 2);
    let tiered = outcome
        .results
        .iter()
        .find(|r| r.label == "tiered")
        .expect("tiered tariff costed");
    let expected: f64 = summary
        .monthly_energy_kwh
        .iter()
        .map(|&kwh| 10_000.0_f64.min(kwh) * 0.12 + (kwh - 10_000.0).max(0.0) * 0.09)
        .sum();
    assert!((tiered.annual_energy_cost - expected).abs() < 1e-6);
}

#[test]
fn exported_bytes_are_identical_across_worker_counts() {
    let set = tariff_set();
    let summary = common::constant_summary(25.0);

    let mut buffers = Vec::new();
    for workers in [1, 2, 8] {
        let outcome = cost_all(&set, &summary, workers);
        let mut buf = Vec::new();
        write_cost_results(&outcome.results, &mut buf).expect("export succeeds");
        buffers.push(buf);
    }
    assert_eq!(buffers[0], buffers[1]);
    assert_eq!(buffers[1], buffers[2]);
}

//! Marginal allocation of a billed quantity across ordered rate tiers.

use crate::tariff::record::RateTier;

/// Splits a billing-window total `q` across ordered tiers.
///
/// Ceilings are cumulative inclusive upper bounds in the same unit as `q`;
/// a `None` ceiling is unbounded. Each tier receives
/// `clamp(q - prev_ceiling, 0, ceiling - prev_ceiling)`, so a quantity
/// exactly at a ceiling bills entirely in that ceiling's tier. Quantity
/// beyond a bounded final ceiling spills into the last tier, so the
/// returned quantities always sum to `q`. `ceiling_scale` multiplies every
/// ceiling before allocation (used for kWh-per-kW ceilings, scaled by the
/// window's peak demand); pass 1.0 for absolute units.
pub fn allocate(tiers: &[RateTier], q: f64, ceiling_scale: f64) -> Vec<f64> {
    let mut quantities = vec![0.0; tiers.len()];
    if tiers.is_empty() || q <= 0.0 {
        return quantities;
    }

    let mut prev = 0.0_f64;
    for (i, tier) in tiers.iter().enumerate() {
        let bound = match tier.ceiling {
            Some(c) if i + 1 < tiers.len() => (c * ceiling_scale).max(prev),
            // Last tier absorbs everything above the previous ceiling.
            _ => f64::INFINITY,
        };
        quantities[i] = (q - prev).clamp(0.0, bound - prev);
        prev = bound;
        if prev >= q {
            break;
        }
    }
    quantities
}

/// Total cost of a billing-window quantity: per-tier quantities times
/// effective rates.
pub fn window_cost(tiers: &[RateTier], q: f64, ceiling_scale: f64) -> f64 {
    allocate(tiers, q, ceiling_scale)
        .iter()
        .zip(tiers)
        .map(|(qty, tier)| qty * tier.effective_rate())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn two_tier() -> Vec<RateTier> {
        vec![
            RateTier::new(Some(500.0), Some(0.10), 0.0),
            RateTier::new(None, Some(0.15), 0.0),
        ]
    }

    #[test]
    fn quantities_sum_to_total() {
        let tiers = vec![
            RateTier::new(Some(100.0), Some(0.1), 0.0),
            RateTier::new(Some(250.0), Some(0.2), 0.0),
            RateTier::new(None, Some(0.3), 0.0),
        ];
        for q in [0.0, 50.0, 100.0, 180.0, 250.0, 1000.0] {
            let sum: f64 = allocate(&tiers, q, 1.0).iter().sum();
            assert!((sum - q).abs() < EPS, "q={q} allocated {sum}");
        }
    }

    #[test]
    fn interior_quantities_never_exceed_tier_width() {
        let tiers = vec![
            RateTier::new(Some(100.0), Some(0.1), 0.0),
            RateTier::new(Some(250.0), Some(0.2), 0.0),
            RateTier::new(None, Some(0.3), 0.0),
        ];
        let parts = allocate(&tiers, 10_000.0, 1.0);
        assert!((parts[0] - 100.0).abs() < EPS);
        assert!((parts[1] - 150.0).abs() < EPS);
        assert!((parts[2] - 9750.0).abs() < EPS);
    }

    #[test]
    fn quantity_at_ceiling_bills_in_lower_tier() {
        let parts = allocate(&two_tier(), 500.0, 1.0);
        assert!((parts[0] - 500.0).abs() < EPS);
        assert!(parts[1].abs() < EPS);
    }

    #[test]
    fn two_tier_monthly_example() {
        // 0–500 kWh at $0.10, unbounded at $0.15; 700 kWh in the window.
        let cost = window_cost(&two_tier(), 700.0, 1.0);
        assert!((cost - 80.0).abs() < EPS, "got {cost}");
    }

    #[test]
    fn adjustment_contributes_to_cost() {
        let tiers = vec![RateTier::new(None, Some(0.10), 0.02)];
        assert!((window_cost(&tiers, 100.0, 1.0) - 12.0).abs() < EPS);
    }

    #[test]
    fn ceiling_scale_stretches_brackets() {
        // 10 kWh/kW ceiling with a 50 kW window peak: bracket holds 500 kWh.
        let tiers = vec![
            RateTier::new(Some(10.0), Some(0.10), 0.0),
            RateTier::new(None, Some(0.15), 0.0),
        ];
        let cost = window_cost(&tiers, 700.0, 50.0);
        assert!((cost - 80.0).abs() < EPS, "got {cost}");
    }

    #[test]
    fn bounded_final_ceiling_still_absorbs_overflow() {
        let tiers = vec![
            RateTier::new(Some(100.0), Some(0.1), 0.0),
            RateTier::new(Some(200.0), Some(0.2), 0.0),
        ];
        let parts = allocate(&tiers, 350.0, 1.0);
        assert!((parts[0] - 100.0).abs() < EPS);
        assert!((parts[1] - 250.0).abs() < EPS);
    }

    #[test]
    fn empty_tier_list_bills_nothing() {
        assert!(allocate(&[], 500.0, 1.0).is_empty());
        assert!(window_cost(&[], 500.0, 1.0).abs() < EPS);
    }

    #[test]
    fn zero_and_negative_quantities_bill_nothing() {
        assert!(window_cost(&two_tier(), 0.0, 1.0).abs() < EPS);
        assert!(window_cost(&two_tier(), -5.0, 1.0).abs() < EPS);
    }

    #[test]
    fn raising_a_rate_never_lowers_cost() {
        let base = two_tier();
        let mut raised = two_tier();
        raised[1].rate = Some(0.25);
        for q in [100.0, 500.0, 700.0, 2000.0] {
            assert!(window_cost(&raised, q, 1.0) >= window_cost(&base, q, 1.0));
        }
    }
}

//! Rate structure classification: demand / tiered / seasonal / TOU flags.

use std::collections::BTreeMap;

use super::record::{RateFlags, Sector, TariffRecord};

/// Case-insensitive substring match of any phrase against an optional
/// text field. A missing field never matches.
pub fn contains_phrase(text: Option<&str>, phrases: &[String]) -> bool {
    let Some(text) = text else { return false };
    let lowered = text.to_lowercase();
    phrases
        .iter()
        .any(|phrase| lowered.contains(&phrase.to_lowercase()))
}

/// Derives the classification flags for one tariff.
///
/// `ev_phrases` is the configured list of EV-rate indicator phrases,
/// matched against the tariff name and description for residential rates
/// only. Seasonal and TOU flags stay unset when the energy schedule could
/// not be decoded; the tariff is still classified for demand and tiering,
/// which need no schedule.
pub fn classify(record: &TariffRecord, ev_phrases: &[String]) -> RateFlags {
    let demand = record.demand.is_present();
    let tiered = is_tiered(record);

    let (seasonal, time_of_use) = match &record.energy_schedule {
        Some(sched) => (Some(sched.is_seasonal()), Some(sched.is_time_of_use())),
        None => (None, None),
    };

    let ev_specific = record.sector == Sector::Residential
        && (contains_phrase(Some(&record.name), ev_phrases)
            || contains_phrase(record.description.as_deref(), ev_phrases));

    RateFlags {
        demand,
        tiered,
        seasonal,
        time_of_use,
        ev_specific,
    }
}

/// True when any period prices a second-or-later bracket. Several
/// single-tier periods are a TOU flat rate, not a tier rate.
pub fn is_tiered(record: &TariffRecord) -> bool {
    record
        .energy
        .iter()
        .any(|p| p.tiers.iter().skip(1).any(|t| t.rate.is_some()))
}

/// Runs the classifier over a whole tariff set, storing the flags on each
/// record. Returns how many records were left without seasonal/TOU flags
/// because their schedule text did not decode.
pub fn classify_all(records: &mut [TariffRecord], ev_phrases: &[String]) -> usize {
    let mut unclassifiable = 0;
    for record in records.iter_mut() {
        let flags = classify(record, ev_phrases);
        if flags.seasonal.is_none() {
            unclassifiable += 1;
        }
        record.flags = Some(flags);
    }
    unclassifiable
}

/// Counts tariffs per branch of the classification tree
/// (demand → tier → seasonal → TOU), for reporting buckets.
///
/// Branch keys mirror the reporting layer's naming, e.g.
/// `"no_demand/tier/seasonal/no_tou"`. Records without decoded schedules
/// are counted in the demand/tier levels but omitted from the
/// seasonal/TOU levels.
pub fn classification_counts(records: &[TariffRecord]) -> BTreeMap<String, usize> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut bump = |key: String| *counts.entry(key).or_insert(0) += 1;

    for record in records {
        let Some(flags) = record.flags else { continue };
        let demand = if flags.demand { "demand" } else { "no_demand" };
        let tier = if flags.tiered { "tier" } else { "fixed" };
        bump(demand.to_string());
        bump(format!("{demand}/{tier}"));

        let (Some(seasonal), Some(tou)) = (flags.seasonal, flags.time_of_use) else {
            continue;
        };
        let seasonal = if seasonal { "seasonal" } else { "no_seasonal" };
        let tou = if tou { "tou" } else { "no_tou" };
        bump(format!("{demand}/{tier}/{seasonal}"));
        bump(format!("{demand}/{tier}/{seasonal}/{tou}"));
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tariff::record::{DemandCharge, RatePeriod, RateTier};
    use crate::tariff::schedule::TouSchedule;

    fn ev_phrases() -> Vec<String> {
        vec!["electric vehicle".to_string(), "ev charging".to_string()]
    }

    #[test]
    fn flat_single_period_is_unflagged() {
        let t = TariffRecord::flat("r1", Sector::Residential, 5.0, 0.10);
        let flags = classify(&t, &ev_phrases());
        assert!(!flags.demand);
        assert!(!flags.tiered);
        assert_eq!(flags.seasonal, Some(false));
        assert_eq!(flags.time_of_use, Some(false));
        assert!(!flags.ev_specific);
    }

    #[test]
    fn second_tier_rate_sets_tiered() {
        let mut t = TariffRecord::flat("r1", Sector::Residential, 5.0, 0.10);
        t.energy = vec![RatePeriod::new(vec![
            RateTier::new(Some(500.0), Some(0.10), 0.0),
            RateTier::new(None, Some(0.15), 0.0),
        ])];
        assert!(classify(&t, &ev_phrases()).tiered);
    }

    #[test]
    fn multiple_single_tier_periods_are_not_tiered() {
        let mut t = TariffRecord::flat("r1", Sector::Residential, 5.0, 0.10);
        t.energy = vec![RatePeriod::flat(0.10), RatePeriod::flat(0.25)];
        assert!(!classify(&t, &ev_phrases()).tiered);
    }

    #[test]
    fn demand_flag_follows_structure_presence() {
        let mut t = TariffRecord::flat("c1", Sector::Commercial, 5.0, 0.10);
        t.demand = DemandCharge::Flat {
            periods: vec![RatePeriod::flat(12.0)],
            month_period: [0; 12],
        };
        assert!(classify(&t, &ev_phrases()).demand);
    }

    #[test]
    fn undecoded_schedule_leaves_flags_unset() {
        let mut t = TariffRecord::flat("r1", Sector::Residential, 5.0, 0.10);
        t.energy_schedule = None;
        let flags = classify(&t, &ev_phrases());
        assert_eq!(flags.seasonal, None);
        assert_eq!(flags.time_of_use, None);
        // Demand/tier classification does not need the schedule.
        assert!(!flags.demand);
    }

    #[test]
    fn ev_phrase_matches_name_case_insensitively() {
        let mut t = TariffRecord::flat("r1", Sector::Residential, 5.0, 0.10);
        t.name = "Residential Electric Vehicle Plan".to_string();
        assert!(classify(&t, &ev_phrases()).ev_specific);
    }

    #[test]
    fn ev_phrase_matches_description() {
        let mut t = TariffRecord::flat("r1", Sector::Residential, 5.0, 0.10);
        t.description = Some("Off-peak EV charging discount".to_string());
        assert!(classify(&t, &ev_phrases()).ev_specific);
    }

    #[test]
    fn commercial_rates_never_ev_specific() {
        let mut t = TariffRecord::flat("c1", Sector::Commercial, 5.0, 0.10);
        t.name = "EV charging service".to_string();
        assert!(!classify(&t, &ev_phrases()).ev_specific);
    }

    #[test]
    fn missing_description_is_a_non_match() {
        assert!(!contains_phrase(None, &ev_phrases()));
    }

    #[test]
    fn tree_counts_partition_the_set() {
        let mut records = vec![
            TariffRecord::flat("a", Sector::Residential, 1.0, 0.1),
            TariffRecord::flat("b", Sector::Residential, 1.0, 0.1),
        ];
        records[1].energy_schedule = Some(TouSchedule::uniform(0));
        classify_all(&mut records, &[]);
        let counts = classification_counts(&records);
        assert_eq!(counts.get("no_demand").copied(), Some(2));
        assert_eq!(
            counts.get("no_demand/fixed/no_seasonal/no_tou").copied(),
            Some(2)
        );
        assert_eq!(counts.get("demand"), None);
    }
}

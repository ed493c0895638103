//! Shared test fixtures for integration tests.

use chrono::{Duration, NaiveDate, NaiveDateTime};

use tariff_sim::profile::{LoadProfile, ProfileSummary};
use tariff_sim::tariff::schedule::{DayType, TouSchedule};

/// Constant-power profile covering the non-leap year 2019 at 30-minute
/// resolution.
pub fn constant_profile(kw: f64) -> LoadProfile {
    let start = NaiveDate::from_ymd_opt(2019, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("valid start timestamp");
    let samples: Vec<(NaiveDateTime, f64)> = (0..365 * 48)
        .map(|i| (start + Duration::minutes(30 * i), kw))
        .collect();
    LoadProfile::from_samples(samples).expect("constant profile is valid")
}

/// Summary of [`constant_profile`].
pub fn constant_summary(kw: f64) -> ProfileSummary {
    ProfileSummary::from_profile(&constant_profile(kw))
}

/// Single-period schedule text in the dataset's nested encoding.
pub fn uniform_schedule_text() -> String {
    TouSchedule::uniform(0).encode(DayType::Weekday)
}

/// Two-period schedule text: period 1 during hours 14–18, period 0
/// otherwise, all twelve months, both day types.
pub fn afternoon_peak_schedule_text() -> String {
    let mut grid = [[0u8; 24]; 12];
    for row in &mut grid {
        for h in 14..19 {
            row[h] = 1;
        }
    }
    TouSchedule::from_grids(grid, grid).encode(DayType::Weekday)
}

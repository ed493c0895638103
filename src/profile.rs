//! Annual load profiles and the aggregate summary the costing loops read.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{Datelike, NaiveDateTime, Timelike};

use crate::tariff::schedule::DayType;

/// Load profile validation or read failure.
#[derive(Debug)]
pub enum ProfileError {
    /// File or CSV-level read failure.
    Read(String),
    /// A sample violated an invariant; `index` is the sample position.
    Invalid { index: usize, message: String },
    Empty,
    SpansMultipleYears,
}

impl fmt::Display for ProfileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read(msg) => write!(f, "profile read error: {msg}"),
            Self::Invalid { index, message } => {
                write!(f, "profile sample {index}: {message}")
            }
            Self::Empty => write!(f, "profile contains no samples"),
            Self::SpansMultipleYears => write!(f, "profile spans more than one calendar year"),
        }
    }
}

impl std::error::Error for ProfileError {}

/// An ordered, gap-free power series covering one calendar year at a fixed
/// sub-hourly resolution.
#[derive(Debug, Clone)]
pub struct LoadProfile {
    samples: Vec<(NaiveDateTime, f64)>,
    interval_minutes: i64,
}

impl LoadProfile {
    /// Validates and wraps a sample series.
    ///
    /// # Errors
    ///
    /// Rejects empty series, non-increasing or irregularly spaced
    /// timestamps, intervals of an hour or more, negative power, and
    /// series crossing a calendar-year boundary.
    pub fn from_samples(samples: Vec<(NaiveDateTime, f64)>) -> Result<Self, ProfileError> {
        let first = samples.first().ok_or(ProfileError::Empty)?;
        let year = first.0.year();

        let interval_minutes = match samples.get(1) {
            Some(second) => (second.0 - first.0).num_minutes(),
            None => 15,
        };
        if interval_minutes <= 0 || interval_minutes >= 60 || 60 % interval_minutes != 0 {
            return Err(ProfileError::Invalid {
                index: 1,
                message: format!("interval of {interval_minutes} min is not sub-hourly"),
            });
        }

        for (i, (ts, kw)) in samples.iter().enumerate() {
            if *kw < 0.0 {
                return Err(ProfileError::Invalid {
                    index: i,
                    message: format!("negative power {kw} kW"),
                });
            }
            if ts.year() != year {
                return Err(ProfileError::SpansMultipleYears);
            }
            if i > 0 {
                let gap = (*ts - samples[i - 1].0).num_minutes();
                if gap != interval_minutes {
                    return Err(ProfileError::Invalid {
                        index: i,
                        message: format!("expected {interval_minutes} min spacing, found {gap}"),
                    });
                }
            }
        }

        Ok(Self {
            samples,
            interval_minutes,
        })
    }

    /// Reads a profile from a two-column CSV: timestamp, power in kW.
    ///
    /// The header row is skipped. Timestamps accept `%Y-%m-%d %H:%M:%S`
    /// and `%Y-%m-%d %H:%M`.
    pub fn from_csv_reader(reader: impl Read) -> Result<Self, ProfileError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut samples = Vec::new();
        for (i, record) in rdr.records().enumerate() {
            let record = record.map_err(|e| ProfileError::Read(e.to_string()))?;
            let ts_field = record.get(0).unwrap_or("");
            let kw_field = record.get(1).ok_or_else(|| ProfileError::Invalid {
                index: i,
                message: "missing power column".to_string(),
            })?;
            let ts = parse_timestamp(ts_field).ok_or_else(|| ProfileError::Invalid {
                index: i,
                message: format!("unparseable timestamp \"{ts_field}\""),
            })?;
            let kw: f64 = kw_field.parse().map_err(|_| ProfileError::Invalid {
                index: i,
                message: format!("unparseable power \"{kw_field}\""),
            })?;
            samples.push((ts, kw));
        }
        Self::from_samples(samples)
    }

    /// Reads a profile CSV from disk.
    pub fn from_csv_path(path: &Path) -> Result<Self, ProfileError> {
        let file = File::open(path)
            .map_err(|e| ProfileError::Read(format!("cannot open {}: {e}", path.display())))?;
        Self::from_csv_reader(file)
    }

    pub fn samples(&self) -> &[(NaiveDateTime, f64)] {
        &self.samples
    }

    /// Duration of one metering interval in hours.
    pub fn interval_hours(&self) -> f64 {
        self.interval_minutes as f64 / 60.0
    }
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M"))
        .ok()
}

/// Hourly energy for one calendar day.
#[derive(Debug, Clone)]
pub struct DayEnergy {
    pub month0: usize,
    pub day: u32,
    pub day_type: DayType,
    pub hour_energy_kwh: [f64; 24],
}

impl DayEnergy {
    pub fn total_kwh(&self) -> f64 {
        self.hour_energy_kwh.iter().sum()
    }
}

/// Everything the costing loops need from a load profile, reduced once.
///
/// Sharing this read-only summary across tens of thousands of tariffs is
/// what keeps per-tariff cost proportional to periods×months instead of
/// profile intervals: the month×day-type×hour grid has 576 cells, the peak
/// table twelve entries.
#[derive(Debug, Clone)]
pub struct ProfileSummary {
    pub monthly_energy_kwh: [f64; 12],
    pub monthly_peak_kw: [f64; 12],
    /// Day type and hour of each month's first peak-power sample.
    pub monthly_peak_slot: [(DayType, usize); 12],
    /// Energy by month, day type, and hour of day.
    pub month_hour_energy_kwh: [[[f64; 24]; 2]; 12],
    /// Per-calendar-day hourly energy, in date order (for day-capped tiers).
    pub days: Vec<DayEnergy>,
    pub annual_energy_kwh: f64,
}

impl ProfileSummary {
    /// Aggregates a validated profile into the summary tables.
    pub fn from_profile(profile: &LoadProfile) -> Self {
        let dt_hours = profile.interval_hours();
        let mut monthly_energy = [0.0; 12];
        let mut monthly_peak = [0.0_f64; 12];
        let mut monthly_peak_slot = [(DayType::Weekday, 0usize); 12];
        let mut grid = [[[0.0; 24]; 2]; 12];
        let mut day_map: BTreeMap<(usize, u32), DayEnergy> = BTreeMap::new();

        for (ts, kw) in profile.samples() {
            let month0 = ts.month0() as usize;
            let hour = ts.hour() as usize;
            let day_type = DayType::from_weekday_number(ts.weekday().num_days_from_monday());
            let energy = kw * dt_hours;

            monthly_energy[month0] += energy;
            grid[month0][day_type.index()][hour] += energy;
            if *kw > monthly_peak[month0] {
                monthly_peak[month0] = *kw;
                monthly_peak_slot[month0] = (day_type, hour);
            }

            let entry = day_map.entry((month0, ts.day())).or_insert_with(|| DayEnergy {
                month0,
                day: ts.day(),
                day_type,
                hour_energy_kwh: [0.0; 24],
            });
            entry.hour_energy_kwh[hour] += energy;
        }

        let annual_energy_kwh = monthly_energy.iter().sum();
        Self {
            monthly_energy_kwh: monthly_energy,
            monthly_peak_kw: monthly_peak,
            monthly_peak_slot,
            month_hour_energy_kwh: grid,
            days: day_map.into_values().collect(),
            annual_energy_kwh,
        }
    }
}

//! Adapter from the wide row-per-tariff rate table to [`TariffRecord`]s.
//!
//! Each source row carries up to several hundred columns; this module
//! normalizes them immediately into the nested period→tier form and never
//! exposes column names past the crate boundary. Row-level problems skip
//! the row and bump a counter; the only fatal condition is a file whose
//! top-level schema is unrecognizable.

pub mod columns;

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use csv::StringRecord;

use crate::tariff::record::{
    DemandCharge, EligibilityBounds, RatePeriod, RateTier, Sector, TariffRecord, UsageUnit,
};
use crate::tariff::schedule::TouSchedule;

use columns::{ColumnMap, StructureColumns, flat_demand_month_names, usage_unit_names};

/// Identity and schedule columns every supported vintage must carry.
const REQUIRED_COLUMNS: [&str; 5] = [
    "label",
    "name",
    "sector",
    "energyweekdayschedule",
    "energyweekendschedule",
];

/// Fatal dataset-level failure.
#[derive(Debug)]
pub enum DatasetError {
    Read(String),
    /// The top-level schema is not a rate table this adapter knows.
    MissingColumns {
        missing: Vec<&'static str>,
        found: usize,
    },
}

impl fmt::Display for DatasetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read(msg) => write!(f, "rate table read error: {msg}"),
            Self::MissingColumns { missing, found } => write!(
                f,
                "unrecognized rate table schema: expected columns [{}] among the {} found",
                missing.join(", "),
                found
            ),
        }
    }
}

impl std::error::Error for DatasetError {}

/// Row-level parse counters. Skipped rows leave no other trace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DatasetReport {
    pub rows: usize,
    pub parsed: usize,
    /// Rows with an empty label.
    pub missing_identity: usize,
    /// Rows with an unrecognized sector spelling.
    pub unknown_sector: usize,
    /// Rows with an unrecognized fixed-charge unit.
    pub unit_drift: usize,
    /// Tolerated oddities (unparseable end dates or ceiling units) that
    /// fell back to a default rather than skipping the row.
    pub field_drift: usize,
}

impl fmt::Display for DatasetReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "parsed {}/{} rows (no-label={}, unknown-sector={}, unit-drift={}, field-drift={})",
            self.parsed,
            self.rows,
            self.missing_identity,
            self.unknown_sector,
            self.unit_drift,
            self.field_drift
        )
    }
}

/// A parsed rate table: normalized records plus row-level counters.
#[derive(Debug, Clone)]
pub struct RateDataset {
    pub records: Vec<TariffRecord>,
    pub report: DatasetReport,
}

impl RateDataset {
    /// Parses a rate table from any reader.
    ///
    /// # Errors
    ///
    /// [`DatasetError::MissingColumns`] when required identity or schedule
    /// columns are absent (wrong schema altogether), or
    /// [`DatasetError::Read`] on CSV-level failure. Row-level problems
    /// never error; they are counted in the report.
    pub fn from_reader(reader: impl Read) -> Result<Self, DatasetError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr
            .headers()
            .map_err(|e| DatasetError::Read(e.to_string()))?
            .clone();
        let map = ColumnMap::from_headers(&headers);

        let missing: Vec<&'static str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|c| !map.has(c))
            .collect();
        if !missing.is_empty() {
            return Err(DatasetError::MissingColumns {
                missing,
                found: headers.len(),
            });
        }

        let energy_cols = StructureColumns::resolve(&map, "energyratestructure");
        let flat_demand_cols = StructureColumns::resolve(&map, "flatdemandstructure");
        let tou_demand_cols = StructureColumns::resolve(&map, "demandratestructure");

        let mut report = DatasetReport::default();
        let mut records = Vec::new();
        for row in rdr.records() {
            let row = row.map_err(|e| DatasetError::Read(e.to_string()))?;
            report.rows += 1;
            if let Some(record) = parse_row(
                &map,
                &energy_cols,
                &flat_demand_cols,
                &tou_demand_cols,
                &row,
                &mut report,
            ) {
                report.parsed += 1;
                records.push(record);
            }
        }

        Ok(Self { records, report })
    }

    /// Parses a rate table from disk.
    pub fn from_csv_path(path: &Path) -> Result<Self, DatasetError> {
        let file = File::open(path)
            .map_err(|e| DatasetError::Read(format!("cannot open {}: {e}", path.display())))?;
        Self::from_reader(file)
    }

    /// Splits the records into residential and commercial/industrial sets.
    pub fn into_sectors(self) -> (Vec<TariffRecord>, Vec<TariffRecord>) {
        self.records
            .into_iter()
            .partition(|r| r.sector == Sector::Residential)
    }
}

fn parse_row(
    map: &ColumnMap,
    energy_cols: &StructureColumns,
    flat_demand_cols: &StructureColumns,
    tou_demand_cols: &StructureColumns,
    row: &StringRecord,
    report: &mut DatasetReport,
) -> Option<TariffRecord> {
    let Some(label) = map.get(row, "label") else {
        report.missing_identity += 1;
        return None;
    };
    let Some(sector) = map.get(row, "sector").and_then(Sector::parse) else {
        report.unknown_sector += 1;
        return None;
    };

    let fixed_charge = match parse_fixed_charge(map, row) {
        Some(charge) => charge,
        None => {
            report.unit_drift += 1;
            return None;
        }
    };

    let end_date = match map.get(row, "enddate") {
        None => None,
        Some(text) => match parse_date(text) {
            Some(date) => Some(date),
            None => {
                // Unparseable end date: treated as still active.
                report.field_drift += 1;
                None
            }
        },
    };

    let energy_ceiling_unit = match map.get_any(row, &usage_unit_names()) {
        None => UsageUnit::default(),
        Some(text) => match UsageUnit::parse(text) {
            Some(unit) => unit,
            None => {
                report.field_drift += 1;
                UsageUnit::default()
            }
        },
    };

    let energy_schedule = parse_schedule(map, row, "energyweekdayschedule", "energyweekendschedule");
    let demand = parse_demand(map, flat_demand_cols, tou_demand_cols, row);

    let bounds = EligibilityBounds {
        capacity_min_kw: map.f64(row, "peakkwcapacitymin").unwrap_or(0.0),
        capacity_max_kw: map.f64(row, "peakkwcapacitymax").unwrap_or(f64::INFINITY),
        usage_min_kwh: map.f64(row, "peakkwhusagemin").unwrap_or(0.0),
        usage_max_kwh: map.f64(row, "peakkwhusagemax").unwrap_or(f64::INFINITY),
    };

    Some(TariffRecord {
        label: label.to_string(),
        name: map.get(row, "name").unwrap_or(label).to_string(),
        description: map.get(row, "description").map(str::to_string),
        utility: map.get(row, "utility").map(str::to_string),
        sector,
        end_date,
        fixed_charge,
        energy: parse_periods(map, energy_cols, row),
        energy_ceiling_unit,
        energy_schedule,
        demand,
        bounds,
        voltage_min: map.f64(row, "voltageminimum"),
        has_coincident_demand: map
            .get(row, "coincidentratestructure/period0/tier0rate")
            .is_some(),
        demand_units_kw: units_are_kw(map, row, "demandunits")
            && units_are_kw(map, row, "flatdemandunits"),
        flags: None,
    })
}

/// Fixed charge normalized to $/month. `None` means the unit spelling is
/// unrecognized and the row must be skipped.
fn parse_fixed_charge(map: &ColumnMap, row: &StringRecord) -> Option<f64> {
    let amount = map
        .f64(row, "fixedchargefirstmeter")
        .or_else(|| map.f64(row, "fixedmonthlycharge"))
        .unwrap_or(0.0);
    match map.get(row, "fixedchargeunits") {
        None => Some(amount),
        Some(unit) => match unit.trim().to_ascii_lowercase().as_str() {
            "$/month" => Some(amount),
            "$/day" => Some(amount * 30.0),
            _ => None,
        },
    }
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    // Date formats observed across dataset vintages; time-of-day parts
    // are parsed and discarded.
    const FORMATS: [&str; 4] = [
        "%Y-%m-%d",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%m/%d/%Y",
    ];
    FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(text, f).ok())
}

fn parse_schedule(
    map: &ColumnMap,
    row: &StringRecord,
    weekday_col: &str,
    weekend_col: &str,
) -> Option<TouSchedule> {
    let weekday = map.get(row, weekday_col)?;
    let weekend = map.get(row, weekend_col)?;
    TouSchedule::parse(weekday, weekend)
}

/// Materializes the nested period→tier structure for one row.
///
/// A tier exists when any of its rate/adjustment/ceiling fields is
/// present; tiers are contiguous from tier 0 in every observed vintage.
/// Trailing periods with no tiers are trimmed, interior ones kept empty to
/// preserve schedule index alignment.
fn parse_periods(map: &ColumnMap, cols: &StructureColumns, row: &StringRecord) -> Vec<RatePeriod> {
    let mut periods: Vec<RatePeriod> = Vec::new();
    for tier_cols in &cols.periods {
        let mut tiers = Vec::new();
        for tc in tier_cols {
            let rate = map.f64(row, &tc.rate);
            let adjustment = map.f64(row, &tc.adjustment);
            let ceiling = map.f64(row, &tc.ceiling);
            if rate.is_none() && adjustment.is_none() && ceiling.is_none() {
                break;
            }
            tiers.push(RateTier::new(ceiling, rate, adjustment.unwrap_or(0.0)));
        }
        periods.push(RatePeriod::new(tiers));
    }
    while periods.last().is_some_and(|p| p.tiers.is_empty()) {
        periods.pop();
    }
    periods
}

fn parse_demand(
    map: &ColumnMap,
    flat_cols: &StructureColumns,
    tou_cols: &StructureColumns,
    row: &StringRecord,
) -> DemandCharge {
    // Flat demand takes precedence when a row encodes both shapes.
    let flat_present = flat_cols
        .first_rate_column()
        .is_some_and(|c| map.get(row, c).is_some());
    if flat_present {
        let mut month_period = [0usize; 12];
        for (month0, slot) in month_period.iter_mut().enumerate() {
            *slot = map
                .get_any(row, &flat_demand_month_names(month0))
                .and_then(|v| v.parse::<f64>().ok())
                .map_or(0, |v| v as usize);
        }
        return DemandCharge::Flat {
            periods: parse_periods(map, flat_cols, row),
            month_period,
        };
    }

    let tou_present = tou_cols
        .first_rate_column()
        .is_some_and(|c| map.get(row, c).is_some());
    if tou_present {
        return DemandCharge::TimeOfUse {
            periods: parse_periods(map, tou_cols, row),
            schedule: parse_schedule(map, row, "demandweekdayschedule", "demandweekendschedule"),
        };
    }

    DemandCharge::None
}

fn units_are_kw(map: &ColumnMap, row: &StringRecord, column: &str) -> bool {
    match map.get(row, column) {
        None => true,
        Some(unit) => unit.eq_ignore_ascii_case("kw"),
    }
}

//! Header indexing and column naming for the wide rate-table schema.
//!
//! The source dataset flattens the nested period→tier→{rate, adjustment,
//! ceiling} structure into hundreds of near-duplicate columns
//! (`energyratestructure/period0/tier3rate`, …). Everything name-shaped
//! lives here so the row adapter reads positions, not strings, and vintage
//! drift (renamed columns, alternate month spellings) is absorbed in one
//! place.

use std::collections::HashMap;

use csv::StringRecord;

/// Upper bounds on the period/tier column grid probed in the header.
/// The widest observed vintage uses 24 energy periods and 17 tiers.
pub const MAX_PERIODS: usize = 24;
pub const MAX_TIERS: usize = 17;

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Case-insensitive header index over one dataset vintage.
#[derive(Debug, Clone)]
pub struct ColumnMap {
    index: HashMap<String, usize>,
}

impl ColumnMap {
    pub fn from_headers(headers: &StringRecord) -> Self {
        let index = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_ascii_lowercase(), i))
            .collect();
        Self { index }
    }

    pub fn has(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Non-empty trimmed field under `name`, or `None`.
    pub fn get<'r>(&self, record: &'r StringRecord, name: &str) -> Option<&'r str> {
        let &i = self.index.get(name)?;
        let value = record.get(i)?.trim();
        if value.is_empty() { None } else { Some(value) }
    }

    /// First present non-empty field among alternate spellings.
    pub fn get_any<'r>(&self, record: &'r StringRecord, names: &[String]) -> Option<&'r str> {
        names.iter().find_map(|n| self.get(record, n))
    }

    pub fn f64(&self, record: &StringRecord, name: &str) -> Option<f64> {
        self.get(record, name)?.parse().ok()
    }
}

/// Column names for one tier of one period within a rate structure.
#[derive(Debug, Clone)]
pub struct TierColumns {
    pub rate: String,
    pub adjustment: String,
    pub ceiling: String,
}

/// Pre-resolved period/tier column grid for one structure prefix
/// (`energyratestructure`, `flatdemandstructure`, `demandratestructure`).
///
/// Only (period, tier) cells whose rate column exists in the header are
/// kept, so row parsing never probes absent names.
#[derive(Debug, Clone)]
pub struct StructureColumns {
    pub periods: Vec<Vec<TierColumns>>,
}

impl StructureColumns {
    pub fn resolve(map: &ColumnMap, prefix: &str) -> Self {
        let mut periods = Vec::new();
        for p in 0..MAX_PERIODS {
            let mut tiers = Vec::new();
            for t in 0..MAX_TIERS {
                let rate = format!("{prefix}/period{p}/tier{t}rate");
                if !map.has(&rate) {
                    break;
                }
                tiers.push(TierColumns {
                    rate,
                    adjustment: format!("{prefix}/period{p}/tier{t}adj"),
                    ceiling: format!("{prefix}/period{p}/tier{t}max"),
                });
            }
            if tiers.is_empty() {
                break;
            }
            periods.push(tiers);
        }
        Self { periods }
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// Rate column of the first period's first tier, when the structure
    /// exists in this vintage at all.
    pub fn first_rate_column(&self) -> Option<&str> {
        Some(self.periods.first()?.first()?.rate.as_str())
    }
}

/// Alternate spellings for the flat-demand month→period map
/// (`flatdemandmonth1` in newer vintages, `flatDemandMonth_jan` in older
/// ones; the map is case-normalized).
pub fn flat_demand_month_names(month0: usize) -> [String; 2] {
    [
        format!("flatdemandmonth{}", month0 + 1),
        format!("flatdemandmonth_{}", MONTH_ABBREVIATIONS[month0]),
    ]
}

/// Alternate spellings for the energy tier ceiling unit.
pub fn usage_unit_names() -> [String; 3] {
    [
        "energyratestructure/period0/tier0maxusageunits".to_string(),
        "maxusageunits".to_string(),
        "usageunits".to_string(),
    ]
}

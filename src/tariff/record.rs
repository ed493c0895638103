//! Typed tariff model: rate periods, tiers, demand shapes, and bounds.

use std::fmt;

use chrono::NaiveDate;

use super::schedule::TouSchedule;

/// Customer class a tariff is published for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sector {
    Residential,
    Commercial,
    Industrial,
}

impl Sector {
    /// Parses the source dataset's sector spelling.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "residential" => Some(Self::Residential),
            "commercial" => Some(Self::Commercial),
            "industrial" => Some(Self::Industrial),
            _ => None,
        }
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Residential => write!(f, "residential"),
            Self::Commercial => write!(f, "commercial"),
            Self::Industrial => write!(f, "industrial"),
        }
    }
}

/// Unit of the energy tier ceilings.
///
/// Determines the billing window the tier allocator runs over: absolute
/// kWh ceilings apply per month, kWh-per-kW ceilings scale with the
/// window's peak demand, kWh-per-day ceilings make the allocator run per
/// calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UsageUnit {
    #[default]
    KWh,
    KWhPerKw,
    KWhPerDay,
}

impl UsageUnit {
    /// Parses the source dataset's unit spellings.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kwh" => Some(Self::KWh),
            "kwh/kw" => Some(Self::KWhPerKw),
            "kwh daily" | "kwh/day" => Some(Self::KWhPerDay),
            _ => None,
        }
    }
}

/// One consumption bracket within a pricing period.
///
/// `ceiling` is the inclusive cumulative upper bound of the bracket in the
/// period's usage unit; `None` means unbounded. `rate` is `None` when the
/// source row carried no rate for this bracket (distinct from an explicit
/// zero).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateTier {
    pub ceiling: Option<f64>,
    pub rate: Option<f64>,
    pub adjustment: f64,
}

impl RateTier {
    pub fn new(ceiling: Option<f64>, rate: Option<f64>, adjustment: f64) -> Self {
        Self {
            ceiling,
            rate,
            adjustment,
        }
    }

    /// Flat-rate convenience constructor: unbounded, no adjustment.
    pub fn flat(rate: f64) -> Self {
        Self::new(None, Some(rate), 0.0)
    }

    /// Base rate plus adjustment, with an absent rate billed as zero.
    pub fn effective_rate(&self) -> f64 {
        self.rate.unwrap_or(0.0) + self.adjustment
    }
}

/// An ordered list of tiers for one pricing period.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RatePeriod {
    pub tiers: Vec<RateTier>,
}

impl RatePeriod {
    pub fn new(tiers: Vec<RateTier>) -> Self {
        Self { tiers }
    }

    /// Single unbounded tier at the given rate.
    pub fn flat(rate: f64) -> Self {
        Self::new(vec![RateTier::flat(rate)])
    }

    /// True when no tier in this period carries a rate.
    pub fn is_empty(&self) -> bool {
        self.tiers.iter().all(|t| t.rate.is_none())
    }

    /// Mean of the effective rates across tiers that carry a rate.
    ///
    /// `None` when no tier does. Used by the residential estimate, which
    /// assumes charging spreads evenly across brackets.
    pub fn mean_rate(&self) -> Option<f64> {
        let rated: Vec<f64> = self
            .tiers
            .iter()
            .filter(|t| t.rate.is_some())
            .map(RateTier::effective_rate)
            .collect();
        if rated.is_empty() {
            None
        } else {
            Some(rated.iter().sum::<f64>() / rated.len() as f64)
        }
    }

    /// Effective rate of the first tier, when it carries a rate.
    pub fn first_tier_rate(&self) -> Option<f64> {
        let first = self.tiers.first()?;
        first.rate?;
        Some(first.effective_rate())
    }
}

/// Demand charge shape. A tariff has at most one; flat takes precedence
/// over time-of-use when the source row encodes both.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DemandCharge {
    #[default]
    None,
    /// One period per calendar month, selected by `month_period`.
    Flat {
        periods: Vec<RatePeriod>,
        month_period: [usize; 12],
    },
    /// Period selected by the demand schedule at the time of monthly peak.
    /// `schedule` is `None` when the schedule text failed to decode; such
    /// tariffs are excluded from costing rather than failing the batch.
    TimeOfUse {
        periods: Vec<RatePeriod>,
        schedule: Option<TouSchedule>,
    },
}

impl DemandCharge {
    /// True when either shape carries a first-tier rate.
    pub fn is_present(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Declared load limits a tariff is designed to serve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EligibilityBounds {
    pub capacity_min_kw: f64,
    pub capacity_max_kw: f64,
    pub usage_min_kwh: f64,
    pub usage_max_kwh: f64,
}

impl Default for EligibilityBounds {
    fn default() -> Self {
        Self {
            capacity_min_kw: 0.0,
            capacity_max_kw: f64::INFINITY,
            usage_min_kwh: 0.0,
            usage_max_kwh: f64::INFINITY,
        }
    }
}

impl EligibilityBounds {
    /// True when every month of the candidate load falls inside the
    /// declared limits.
    pub fn admits(&self, monthly_energy_kwh: &[f64; 12], monthly_peak_kw: &[f64; 12]) -> bool {
        let peak_min = monthly_peak_kw.iter().copied().fold(f64::INFINITY, f64::min);
        let peak_max = monthly_peak_kw.iter().copied().fold(0.0_f64, f64::max);
        let energy_min = monthly_energy_kwh
            .iter()
            .copied()
            .fold(f64::INFINITY, f64::min);
        let energy_max = monthly_energy_kwh.iter().copied().fold(0.0_f64, f64::max);

        self.capacity_min_kw <= peak_min
            && self.capacity_max_kw >= peak_max
            && self.usage_min_kwh <= energy_min
            && self.usage_max_kwh >= energy_max
    }
}

/// Classification flags derived by [`crate::tariff::classify`].
///
/// `seasonal` and `time_of_use` stay `None` when the energy schedule could
/// not be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RateFlags {
    pub demand: bool,
    pub tiered: bool,
    pub seasonal: Option<bool>,
    pub time_of_use: Option<bool>,
    /// Residential only; always false for commercial tariffs.
    pub ev_specific: bool,
}

/// One utility rate plan, normalized from the wide source row.
#[derive(Debug, Clone, PartialEq)]
pub struct TariffRecord {
    pub label: String,
    pub name: String,
    pub description: Option<String>,
    pub utility: Option<String>,
    pub sector: Sector,
    /// `None` means the rate is currently active.
    pub end_date: Option<NaiveDate>,
    /// Always $/month; the dataset adapter normalizes $/day rows.
    pub fixed_charge: f64,
    pub energy: Vec<RatePeriod>,
    pub energy_ceiling_unit: UsageUnit,
    /// `None` when the schedule text failed to decode.
    pub energy_schedule: Option<TouSchedule>,
    pub demand: DemandCharge,
    pub bounds: EligibilityBounds,
    /// Minimum service voltage, when declared. High-voltage-only rates are
    /// filtered out of station costing.
    pub voltage_min: Option<f64>,
    /// True when the row carries a coincident-demand structure, which the
    /// engine cannot price (the utility's system peak is unknowable here).
    pub has_coincident_demand: bool,
    /// True when the row's demand units are kW (or demand is absent).
    pub demand_units_kw: bool,
    /// Set by the classifier pass; never hand-authored.
    pub flags: Option<RateFlags>,
}

impl TariffRecord {
    /// Minimal record builder used by tests and synthetic fixtures: a
    /// single-period flat-rate tariff with a uniform schedule.
    pub fn flat(label: &str, sector: Sector, fixed_charge: f64, rate: f64) -> Self {
        Self {
            label: label.to_string(),
            name: label.to_string(),
            description: None,
            utility: None,
            sector,
            end_date: None,
            fixed_charge,
            energy: vec![RatePeriod::flat(rate)],
            energy_ceiling_unit: UsageUnit::KWh,
            energy_schedule: Some(TouSchedule::uniform(0)),
            demand: DemandCharge::None,
            bounds: EligibilityBounds::default(),
            voltage_min: None,
            has_coincident_demand: false,
            demand_units_kw: true,
            flags: None,
        }
    }

    /// True when the first period's first tier carries a rate. Tariffs
    /// failing this have no usable cost information at all.
    pub fn has_energy_rate(&self) -> bool {
        self.energy
            .first()
            .and_then(RatePeriod::first_tier_rate)
            .is_some()
    }
}

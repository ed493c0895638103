//! Tariff model, schedule decoding, classification, and filter passes.

/// Rate-structure classification flags and bucket counts.
pub mod classify;
/// Tariff set reduction passes.
pub mod filter;
pub mod record;
/// Month×hour period schedules.
pub mod schedule;

// Re-export the main types for convenience
pub use record::DemandCharge;
pub use record::EligibilityBounds;
pub use record::RateFlags;
pub use record::RatePeriod;
pub use record::RateTier;
pub use record::Sector;
pub use record::TariffRecord;
pub use record::UsageUnit;
pub use schedule::DayType;
pub use schedule::TouSchedule;

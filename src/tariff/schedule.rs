//! Time-of-use schedule grids and the nested-text decoder.

use std::fmt;
use std::fmt::Write as _;

/// Weekday/weekend distinction used by schedule lookups.
///
/// The source data encodes Monday–Friday and Saturday–Sunday as two
/// separate 12×24 grids; every lookup selects one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayType {
    Weekday,
    Weekend,
}

impl DayType {
    /// Maps a chrono-style weekday number (0 = Monday) to a day type.
    pub fn from_weekday_number(n: u32) -> Self {
        if n < 5 { Self::Weekday } else { Self::Weekend }
    }

    /// Grid index: 0 for weekday, 1 for weekend.
    pub fn index(self) -> usize {
        match self {
            Self::Weekday => 0,
            Self::Weekend => 1,
        }
    }
}

impl fmt::Display for DayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Weekday => write!(f, "weekday"),
            Self::Weekend => write!(f, "weekend"),
        }
    }
}

/// A decoded month×hour pricing schedule.
///
/// Two 12×24 grids of period indices, one for weekdays and one for
/// weekends. Grids are decoded once per tariff; lookups are plain array
/// indexing so the costing loops never touch the text encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TouSchedule {
    weekday: [[u8; 24]; 12],
    weekend: [[u8; 24]; 12],
}

impl TouSchedule {
    /// Builds a schedule directly from decoded grids (used by tests and
    /// synthetic fixtures).
    pub fn from_grids(weekday: [[u8; 24]; 12], weekend: [[u8; 24]; 12]) -> Self {
        Self { weekday, weekend }
    }

    /// Builds a schedule that assigns a single period everywhere.
    pub fn uniform(period: u8) -> Self {
        Self {
            weekday: [[period; 24]; 12],
            weekend: [[period; 24]; 12],
        }
    }

    /// Decodes a schedule from the source dataset's nested bracketed text.
    ///
    /// Each grid is encoded as twelve bracketed month rows, e.g.
    /// `[[0, 0, 1, ...], [0, ...], ...]`. Older vintages carry a leading
    /// sentinel entry per month row (25 entries instead of 24) and an `L`
    /// suffix on integers; both are normalized here. Returns `None` when
    /// either grid does not decode to exactly twelve rows of 24 or 25
    /// entries — callers treat that tariff as unclassifiable rather than
    /// failing the batch.
    pub fn parse(weekday_text: &str, weekend_text: &str) -> Option<Self> {
        Some(Self {
            weekday: parse_grid(weekday_text)?,
            weekend: parse_grid(weekend_text)?,
        })
    }

    /// Period index active for the given month (0–11), day type, and hour
    /// (0–23).
    pub fn period_at(&self, month0: usize, day_type: DayType, hour: usize) -> usize {
        match day_type {
            DayType::Weekday => self.weekday[month0][hour] as usize,
            DayType::Weekend => self.weekend[month0][hour] as usize,
        }
    }

    /// The 24-hour period row for one month and day type.
    pub fn row(&self, month0: usize, day_type: DayType) -> &[u8; 24] {
        match day_type {
            DayType::Weekday => &self.weekday[month0],
            DayType::Weekend => &self.weekend[month0],
        }
    }

    /// True when period assignment differs between months, i.e. at least
    /// two months carry distinct hour rows in either grid.
    pub fn is_seasonal(&self) -> bool {
        let varies = |grid: &[[u8; 24]; 12]| grid.iter().any(|row| row != &grid[0]);
        varies(&self.weekday) || varies(&self.weekend)
    }

    /// True when any single month uses more than one period index within
    /// its 24 hours, in either grid.
    pub fn is_time_of_use(&self) -> bool {
        let mixed = |grid: &[[u8; 24]; 12]| {
            grid.iter()
                .any(|row| row.iter().any(|&p| p != row[0]))
        };
        mixed(&self.weekday) || mixed(&self.weekend)
    }

    /// Highest period index referenced anywhere in either grid.
    pub fn max_period(&self) -> usize {
        let grid_max = |grid: &[[u8; 24]; 12]| {
            grid.iter()
                .flat_map(|row| row.iter())
                .copied()
                .max()
                .unwrap_or(0)
        };
        grid_max(&self.weekday).max(grid_max(&self.weekend)) as usize
    }

    /// Re-serializes one grid in the canonical 24-entry encoding.
    pub fn encode(&self, day_type: DayType) -> String {
        let grid = match day_type {
            DayType::Weekday => &self.weekday,
            DayType::Weekend => &self.weekend,
        };
        let mut out = String::from("[");
        for (m, row) in grid.iter().enumerate() {
            if m > 0 {
                out.push_str(", ");
            }
            out.push('[');
            for (h, p) in row.iter().enumerate() {
                if h > 0 {
                    out.push_str(", ");
                }
                let _ = write!(out, "{p}");
            }
            out.push(']');
        }
        out.push(']');
        out
    }
}

/// Decodes one 12×24 grid from nested bracketed text.
fn parse_grid(text: &str) -> Option<[[u8; 24]; 12]> {
    let mut rows: Vec<Vec<u8>> = Vec::new();
    for chunk in text.split(']') {
        let cleaned = chunk.replace('[', "");
        let mut row = Vec::new();
        for entry in cleaned.split(',') {
            let entry = entry.trim().trim_end_matches('L');
            if entry.is_empty() {
                continue;
            }
            row.push(entry.parse::<u8>().ok()?);
        }
        if !row.is_empty() {
            rows.push(row);
        }
    }

    if rows.len() != 12 {
        return None;
    }

    let mut grid = [[0u8; 24]; 12];
    for (m, row) in rows.iter().enumerate() {
        // Schema drift: some vintages prepend a sentinel entry per month.
        let hours: &[u8] = match row.len() {
            24 => row.as_slice(),
            25 => &row[1..],
            _ => return None,
        };
        grid[m].copy_from_slice(hours);
    }
    Some(grid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_rows(rows: &[[u8; 24]; 12], leading_sentinel: bool) -> String {
        let mut out = String::from("[");
        for (m, row) in rows.iter().enumerate() {
            if m > 0 {
                out.push_str(", ");
            }
            out.push('[');
            if leading_sentinel {
                out.push_str("9, ");
            }
            let entries: Vec<String> = row.iter().map(|p| p.to_string()).collect();
            out.push_str(&entries.join(", "));
            out.push(']');
        }
        out.push(']');
        out
    }

    fn two_period_grid() -> [[u8; 24]; 12] {
        let mut grid = [[0u8; 24]; 12];
        for row in &mut grid {
            for h in 14..19 {
                row[h] = 1;
            }
        }
        grid
    }

    #[test]
    fn parses_24_entry_rows() {
        let wd = encode_rows(&two_period_grid(), false);
        let we = encode_rows(&[[0u8; 24]; 12], false);
        let sched = TouSchedule::parse(&wd, &we).expect("schedule should decode");
        assert_eq!(sched.period_at(0, DayType::Weekday, 15), 1);
        assert_eq!(sched.period_at(0, DayType::Weekday, 3), 0);
        assert_eq!(sched.period_at(0, DayType::Weekend, 15), 0);
    }

    #[test]
    fn parses_25_entry_rows_dropping_sentinel() {
        let grid = two_period_grid();
        let wd = encode_rows(&grid, true);
        let we = encode_rows(&grid, true);
        let sched = TouSchedule::parse(&wd, &we).expect("sentinel rows should decode");
        // Sentinel value 9 must not survive as hour 0.
        assert_eq!(sched.period_at(0, DayType::Weekday, 0), 0);
        assert_eq!(sched.period_at(0, DayType::Weekday, 14), 1);
    }

    #[test]
    fn tolerates_long_integer_suffix() {
        let wd = encode_rows(&[[0u8; 24]; 12], false).replace('0', "0L");
        let we = encode_rows(&[[0u8; 24]; 12], false);
        assert!(TouSchedule::parse(&wd, &we).is_some());
    }

    #[test]
    fn rejects_wrong_row_length() {
        // 23 entries per row.
        let mut out = String::from("[");
        for m in 0..12 {
            if m > 0 {
                out.push_str(", ");
            }
            out.push('[');
            out.push_str(&vec!["0"; 23].join(", "));
            out.push(']');
        }
        out.push(']');
        let we = encode_rows(&[[0u8; 24]; 12], false);
        assert!(TouSchedule::parse(&out, &we).is_none());
    }

    #[test]
    fn rejects_wrong_month_count() {
        let wd = "[[0, 0, 0]]";
        let we = encode_rows(&[[0u8; 24]; 12], false);
        assert!(TouSchedule::parse(wd, we.as_str()).is_none());
    }

    #[test]
    fn round_trips_both_encodings() {
        let grid = two_period_grid();
        let from_plain =
            TouSchedule::parse(&encode_rows(&grid, false), &encode_rows(&grid, false))
                .expect("plain form");
        let from_sentinel =
            TouSchedule::parse(&encode_rows(&grid, true), &encode_rows(&grid, true))
                .expect("sentinel form");
        assert_eq!(from_plain, from_sentinel);

        // Re-encode and decode again: the grid survives unchanged.
        let reencoded = from_plain.encode(DayType::Weekday);
        let again = TouSchedule::parse(&reencoded, &reencoded).expect("re-encoded form");
        assert_eq!(again, from_plain);
    }

    #[test]
    fn uniform_schedule_is_neither_seasonal_nor_tou() {
        let sched = TouSchedule::uniform(0);
        assert!(!sched.is_seasonal());
        assert!(!sched.is_time_of_use());
    }

    #[test]
    fn month_variation_sets_seasonal_only() {
        let mut weekday = [[0u8; 24]; 12];
        weekday[5] = [1; 24]; // June uses period 1 all day
        let sched = TouSchedule::from_grids(weekday, [[0u8; 24]; 12]);
        assert!(sched.is_seasonal());
        // Every month is internally uniform, so no TOU.
        assert!(!sched.is_time_of_use());
    }

    #[test]
    fn hour_variation_sets_tou() {
        let sched = TouSchedule::from_grids(two_period_grid(), [[0u8; 24]; 12]);
        assert!(sched.is_time_of_use());
        // All months share the same row: not seasonal.
        assert!(!sched.is_seasonal());
    }

    #[test]
    fn weekend_only_variation_counts() {
        let mut weekend = [[0u8; 24]; 12];
        weekend[0][0] = 2;
        let sched = TouSchedule::from_grids([[0u8; 24]; 12], weekend);
        assert!(sched.is_seasonal());
        assert!(sched.is_time_of_use());
        assert_eq!(sched.max_period(), 2);
    }
}

//! Half-open stay ranges.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::BookingError;

/// A half-open date range `[check_in, check_out)`.
///
/// The checkout day is not occupied, so a stay ending on a given day and
/// another starting that same day can share a room (same-day turnover).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StayRange {
    check_in: NaiveDate,
    check_out: NaiveDate,
}

impl StayRange {
    /// Build a range, rejecting empty or inverted ranges.
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Result<Self, BookingError> {
        if check_in >= check_out {
            return Err(BookingError::Validation(format!(
                "check-out {check_out} must be after check-in {check_in}"
            )));
        }
        Ok(Self {
            check_in,
            check_out,
        })
    }

    /// Rebuild from storage, where the schema enforces the invariant.
    pub(crate) fn from_storage(check_in: NaiveDate, check_out: NaiveDate) -> Self {
        debug_assert!(check_in < check_out);
        Self {
            check_in,
            check_out,
        }
    }

    pub fn check_in(&self) -> NaiveDate {
        self.check_in
    }

    pub fn check_out(&self) -> NaiveDate {
        self.check_out
    }

    /// Number of nights covered by the stay.
    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }

    /// Whether `date` falls inside the range.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.check_in <= date && date < self.check_out
    }

    /// Half-open overlap: `[a, b)` and `[c, d)` overlap iff `a < d && c < b`.
    ///
    /// Adjacent ranges, where one stay checks out on the other's check-in
    /// day, do not overlap.
    pub fn overlaps(&self, other: &StayRange) -> bool {
        self.check_in < other.check_out && other.check_in < self.check_out
    }
}

impl fmt::Display for StayRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.check_in, self.check_out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn range(a: NaiveDate, b: NaiveDate) -> StayRange {
        StayRange::new(a, b).unwrap()
    }

    #[test]
    fn test_rejects_empty_and_inverted() {
        let day = date(2024, 3, 15);
        assert!(StayRange::new(day, day).is_err());
        assert!(StayRange::new(date(2024, 3, 17), date(2024, 3, 15)).is_err());
    }

    #[test]
    fn test_overlap() {
        let a = range(date(2024, 3, 15), date(2024, 3, 17));
        let b = range(date(2024, 3, 16), date(2024, 3, 18));
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));

        let inner = range(date(2024, 3, 15), date(2024, 3, 20));
        let nested = range(date(2024, 3, 16), date(2024, 3, 17));
        assert!(inner.overlaps(&nested));
    }

    #[test]
    fn test_adjacent_ranges_do_not_overlap() {
        // Same-day turnover: one guest leaves the morning another arrives.
        let first = range(date(2024, 3, 15), date(2024, 3, 17));
        let second = range(date(2024, 3, 17), date(2024, 3, 19));
        assert!(!first.overlaps(&second));
        assert!(!second.overlaps(&first));
    }

    #[test]
    fn test_disjoint_ranges_do_not_overlap() {
        let a = range(date(2024, 3, 1), date(2024, 3, 5));
        let b = range(date(2024, 3, 10), date(2024, 3, 12));
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn test_contains_excludes_checkout_day() {
        let stay = range(date(2024, 3, 15), date(2024, 3, 17));
        assert!(stay.contains(date(2024, 3, 15)));
        assert!(stay.contains(date(2024, 3, 16)));
        assert!(!stay.contains(date(2024, 3, 17)));
    }

    #[test]
    fn test_nights() {
        let stay = range(date(2024, 3, 15), date(2024, 3, 18));
        assert_eq!(stay.nights(), 3);
    }
}

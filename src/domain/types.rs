//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - held in a session while the dashboard runs
//! - exported to JSON/CSV
//! - reloaded later for comparisons

use std::collections::BTreeSet;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Rental durations (days) the dashboard knows about.
pub const RENTAL_DAYS: [u32; 9] = [1, 2, 3, 4, 5, 6, 7, 14, 21];

/// ACRISS category codes observed in the benchmark feeds.
pub const ACRISS_CODES: [&str; 8] = [
    "MBMR", "EDMR", "CDMR", "IDMD", "CCAR", "PDMD", "JVMD", "SVMD",
];

/// Default rental duration selected at session start.
pub const DEFAULT_DAYS: u32 = 7;

/// Default ACRISS code selected at session start.
pub const DEFAULT_ACRISS: &str = "MBMR";

/// Minimum observed price for one (competitor, duration, date, category)
/// tuple. The only artifact that outlives an upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub competitor: String,
    pub days: u32,
    pub date: NaiveDate,
    pub acriss: String,
    pub price: f64,
}

/// Dashboard filter state: which durations and category codes to show.
///
/// Both selectors multi-select, so matching is membership, not equality.
/// An empty set would show nothing, which is never useful; the constructors
/// keep at least one value selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub days: BTreeSet<u32>,
    pub acriss: BTreeSet<String>,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            days: BTreeSet::from([DEFAULT_DAYS]),
            acriss: BTreeSet::from([DEFAULT_ACRISS.to_string()]),
        }
    }
}

impl Selection {
    pub fn new(days: &[u32], acriss: &[String]) -> Self {
        let mut sel = Self {
            days: days.iter().copied().collect(),
            acriss: acriss.iter().cloned().collect(),
        };
        if sel.days.is_empty() {
            sel.days.insert(DEFAULT_DAYS);
        }
        if sel.acriss.is_empty() {
            sel.acriss.insert(DEFAULT_ACRISS.to_string());
        }
        sel
    }

    /// Membership filter: `days ∈ selected AND acriss ∈ selected`.
    pub fn matches(&self, point: &PricePoint) -> bool {
        self.days.contains(&point.days) && self.acriss.contains(&point.acriss)
    }

    /// Toggle one duration, refusing to empty the set.
    pub fn toggle_day(&mut self, day: u32) {
        if self.days.contains(&day) {
            if self.days.len() > 1 {
                self.days.remove(&day);
            }
        } else {
            self.days.insert(day);
        }
    }

    /// Toggle one ACRISS code, refusing to empty the set.
    pub fn toggle_acriss(&mut self, code: &str) {
        if self.acriss.contains(code) {
            if self.acriss.len() > 1 {
                self.acriss.remove(code);
            }
        } else {
            self.acriss.insert(code.to_string());
        }
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// File to load (required for `normalize`, optional preload for the TUI).
    pub file: Option<PathBuf>,
    pub selection: Selection,
    /// Apply the selection filter to `normalize` output (TUI always filters
    /// at render time instead).
    pub apply_filter: bool,
    pub export_json: Option<PathBuf>,
    pub export_csv: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(days: u32, acriss: &str) -> PricePoint {
        PricePoint {
            competitor: "Hertz".to_string(),
            days,
            date: NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
            acriss: acriss.to_string(),
            price: 42.0,
        }
    }

    #[test]
    fn selection_is_membership_based() {
        let sel = Selection::new(&[7, 14], &["MBMR".to_string(), "CCAR".to_string()]);
        assert!(sel.matches(&point(7, "MBMR")));
        assert!(sel.matches(&point(14, "CCAR")));
        assert!(!sel.matches(&point(7, "EDMR")));
        assert!(!sel.matches(&point(3, "MBMR")));
    }

    #[test]
    fn selection_defaults() {
        let sel = Selection::default();
        assert!(sel.matches(&point(7, "MBMR")));
        assert!(!sel.matches(&point(1, "MBMR")));
    }

    #[test]
    fn toggle_never_empties() {
        let mut sel = Selection::default();
        sel.toggle_day(7);
        assert!(sel.days.contains(&7));
        sel.toggle_day(14);
        sel.toggle_day(7);
        assert_eq!(sel.days, BTreeSet::from([14]));
        sel.toggle_acriss("MBMR");
        assert!(sel.acriss.contains("MBMR"));
    }

    #[test]
    fn empty_selection_falls_back_to_defaults() {
        let sel = Selection::new(&[], &[]);
        assert!(sel.days.contains(&DEFAULT_DAYS));
        assert!(sel.acriss.contains(DEFAULT_ACRISS));
    }
}

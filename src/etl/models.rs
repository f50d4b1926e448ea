use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::db::CommitSummary;

/// A calendar month; always stored as the first day of that month
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CalendarMonth {
    year: i32,
    month: u32,
}

impl CalendarMonth {
    /// Returns `None` when `month` is outside 1..=12
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        // Validated in `new`
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }
}

impl From<NaiveDate> for CalendarMonth {
    fn from(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for CalendarMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// A leaf location derived from the category/label columns of the TRX sheet
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Location {
    pub code: String,
    pub name: String,
}

/// One extracted cell before its label is resolved against the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawObservation {
    pub location_label: String,
    pub month: CalendarMonth,
    pub value: i64,
}

/// A resolved TRX or NPP row, ready for validation and persistence
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricRecord {
    pub month: CalendarMonth,
    pub location_code: String,
    pub value: i64,
}

/// The two metrics carried by the workbook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    /// Monthly transaction count; must strictly increase per location
    Trx,
    /// Monthly customer count; must not decrease per location
    Npp,
}

impl MetricKind {
    pub fn label(&self) -> &'static str {
        match self {
            MetricKind::Trx => "TRX",
            MetricKind::Npp => "NPP",
        }
    }

    /// Table (and value column) the metric is persisted in
    pub fn table(&self) -> &'static str {
        match self {
            MetricKind::Trx => "trx",
            MetricKind::Npp => "npp",
        }
    }

    /// Whether `current` may follow `previous` in a location's monthly series
    pub fn accepts(&self, previous: i64, current: i64) -> bool {
        match self {
            MetricKind::Trx => current > previous,
            MetricKind::Npp => current >= previous,
        }
    }

    /// Operator quoted in rejection messages
    pub fn violation_operator(&self) -> &'static str {
        match self {
            MetricKind::Trx => "<=",
            MetricKind::Npp => "<",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of one ETL run, returned to the caller and never persisted
#[derive(Debug, Clone, Default, Serialize)]
pub struct EtlRunResult {
    pub success: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// Row counts from the commit; absent when nothing was committed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<CommitSummary>,
}

impl EtlRunResult {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calendar_month_rejects_invalid_month() {
        assert!(CalendarMonth::new(2024, 0).is_none());
        assert!(CalendarMonth::new(2024, 13).is_none());
        assert!(CalendarMonth::new(2024, 12).is_some());
    }

    #[test]
    fn test_calendar_month_first_day() {
        let month = CalendarMonth::new(2024, 3).unwrap();
        assert_eq!(month.first_day(), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(month.to_string(), "2024-03");
    }

    #[test]
    fn test_calendar_month_from_date_truncates_day() {
        let month = CalendarMonth::from(NaiveDate::from_ymd_opt(2023, 11, 27).unwrap());
        assert_eq!(month, CalendarMonth::new(2023, 11).unwrap());
    }

    #[test]
    fn test_calendar_month_ordering() {
        let dec = CalendarMonth::new(2023, 12).unwrap();
        let jan = CalendarMonth::new(2024, 1).unwrap();
        assert!(dec < jan);
    }

    #[test]
    fn test_metric_rules() {
        assert!(!MetricKind::Trx.accepts(100, 100));
        assert!(MetricKind::Trx.accepts(100, 101));
        assert!(MetricKind::Npp.accepts(50, 50));
        assert!(!MetricKind::Npp.accepts(50, 49));
    }
}

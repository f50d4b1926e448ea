/// Value extraction from the month grid
///
/// # Expected Sheet Structure:
/// ```text
/// Row 2:    headers; column C onward are month headers ("1/24", "Feb-24", ...)
/// Row 4+:   column B = location label, column C onward = monthly values
/// "JUMLAH": total row in column B; extraction stops there
/// ```
use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::etl::grid::CellGrid;
use crate::etl::models::{CalendarMonth, RawObservation};
use crate::etl::month_header::MonthHeaderParser;

/// Value used when a cell has no parseable number left after cleaning
pub const FALLBACK_COUNT: i64 = 0;

/// Fixed offsets of the supported sheet layout (1-based)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetLayout {
    pub header_row: usize,
    pub first_data_row: usize,
    pub first_data_col: usize,
    /// Column A: category markers ("a. Region")
    pub category_col: usize,
    /// Column B: leaf location labels
    pub label_col: usize,
    /// Label of the total row that ends the data block
    pub sentinel: String,
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            header_row: 2,
            first_data_row: 4,
            first_data_col: 3,
            category_col: 1,
            label_col: 2,
            sentinel: "JUMLAH".to_string(),
        }
    }
}

/// Walk the data region and emit one observation per non-empty value cell
pub fn extract_observations<G: CellGrid + ?Sized>(
    grid: &G,
    layout: &SheetLayout,
    parser: &MonthHeaderParser,
) -> Vec<RawObservation> {
    let last_row = grid.last_row();
    let last_col = grid.last_col();

    // Column -> month, only for columns with a header
    let mut months: BTreeMap<usize, CalendarMonth> = BTreeMap::new();
    for col in layout.first_data_col..=last_col {
        let header = grid.text(layout.header_row, col);
        if !header.is_empty() {
            months.insert(col, parser.parse(&header));
        }
    }
    debug!("Mapped {} month columns", months.len());

    let mut observations = Vec::new();
    for row in layout.first_data_row..=last_row {
        let label = grid.text(row, layout.label_col);
        if label.is_empty() {
            continue;
        }
        if label.eq_ignore_ascii_case(&layout.sentinel) {
            debug!("Reached {} row at row {}", layout.sentinel, row);
            break;
        }

        for (&col, &month) in &months {
            let text = grid.text(row, col);
            if text.is_empty() {
                continue;
            }
            observations.push(RawObservation {
                location_label: label.clone(),
                month,
                value: parse_count(&text),
            });
        }
    }

    info!("Extracted {} observations", observations.len());
    observations
}

/// Permissive integer parse for value cells.
///
/// Every character except ASCII digits and '-' is discarded first, so thousand
/// separators, decimal marks, currency symbols and stray text disappear
/// silently. A single leading or trailing '-' marks a negative value. When
/// nothing parseable remains the result is [`FALLBACK_COUNT`].
pub fn parse_count(text: &str) -> i64 {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '-')
        .collect();

    match parse_signed(&cleaned) {
        Some(value) => value,
        None => {
            debug!("Unparseable count '{}', using {}", text, FALLBACK_COUNT);
            FALLBACK_COUNT
        }
    }
}

fn parse_signed(cleaned: &str) -> Option<i64> {
    let (negative, digits) = if let Some(rest) = cleaned.strip_prefix('-') {
        (true, rest)
    } else if let Some(rest) = cleaned.strip_suffix('-') {
        (true, rest)
    } else {
        (false, cleaned)
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let value: i64 = digits.parse().ok()?;
    Some(if negative { -value } else { value })
}

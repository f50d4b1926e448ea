/// Worksheet access as a 2-D grid of text cells
///
/// Every pipeline stage reads cells through [`CellGrid`], so nothing outside this
/// module knows about calamine's `Data` variants. Rows and columns are 1-based,
/// matching the A1 layout the sheets are described in (row 2 = month headers,
/// column B = location labels, ...).
use calamine::{Data, Range};

pub trait CellGrid {
    /// Last used (row, column), 1-based; `None` for an empty sheet
    fn extent(&self) -> Option<(usize, usize)>;

    /// Trimmed text of a cell; empty when the cell is blank or outside the grid
    fn text(&self, row: usize, col: usize) -> String;

    fn last_row(&self) -> usize {
        self.extent().map_or(0, |(row, _)| row)
    }

    fn last_col(&self) -> usize {
        self.extent().map_or(0, |(_, col)| col)
    }
}

impl CellGrid for Range<Data> {
    fn extent(&self) -> Option<(usize, usize)> {
        // calamine positions are absolute and 0-based, even when the used range
        // does not start at A1
        self.end()
            .map(|(row, col)| (row as usize + 1, col as usize + 1))
    }

    fn text(&self, row: usize, col: usize) -> String {
        if row == 0 || col == 0 {
            return String::new();
        }
        let (Ok(row), Ok(col)) = (u32::try_from(row - 1), u32::try_from(col - 1)) else {
            return String::new();
        };
        self.get_value((row, col))
            .map(cell_text)
            .unwrap_or_default()
    }
}

/// Render a calamine cell the way it reads on screen
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => {
            if f.is_finite() && f.fract() == 0.0 {
                format!("{f:.0}")
            } else {
                f.to_string()
            }
        }
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
        // Month granularity is all the headers carry
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|dt| dt.format("%m/%Y").to_string())
            .unwrap_or_default(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.trim().to_string(),
        Data::Error(e) => e.to_string(),
        Data::Empty => String::new(),
    }
}

/// In-memory grid of text rows
///
/// Used for sheets assembled in code (and throughout the unit tests).
#[derive(Debug, Clone, Default)]
pub struct TextGrid {
    rows: Vec<Vec<String>>,
}

impl TextGrid {
    /// Build from rows starting at row 1, column A
    pub fn from_rows<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        }
    }
}

impl CellGrid for TextGrid {
    fn extent(&self) -> Option<(usize, usize)> {
        let width = self.rows.iter().map(Vec::len).max().unwrap_or(0);
        if self.rows.is_empty() || width == 0 {
            None
        } else {
            Some((self.rows.len(), width))
        }
    }

    fn text(&self, row: usize, col: usize) -> String {
        if row == 0 || col == 0 {
            return String::new();
        }
        self.rows
            .get(row - 1)
            .and_then(|cells| cells.get(col - 1))
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    }
}

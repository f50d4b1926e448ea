/// Location registry and the category-column scan that derives location codes
///
/// # Expected Sheet Structure (TRX sheet, columns A-B):
/// ```text
/// Row 4:  "a. Region Name" |                 <- category marker, prefix "a"
/// Row 5:                   | "1. Branch One" <- a1
/// Row 6:                   | "2. Branch Two" <- a2
/// Row 7:  "b. Other"       |                 <- prefix "b", counter reset
/// Row 8:                   | "Branch Three"  <- b1
/// ```
/// Codes are positional: they stay stable only while the sheet keeps the same
/// row order and category boundaries between imports.
use std::collections::{BTreeMap, HashMap};

use tracing::{debug, info};

use crate::etl::grid::CellGrid;
use crate::etl::models::Location;
use crate::etl::resolver::clean_label;
use crate::etl::value_extractor::SheetLayout;

/// Known locations keyed by code, with a case-insensitive name index
#[derive(Debug, Clone, Default)]
pub struct LocationRegistry {
    by_code: BTreeMap<String, Location>,
    // lowercase name -> code of the first location registered under that name
    by_name: HashMap<String, String>,
}

impl LocationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a location unless its code is already taken.
    ///
    /// An existing code is never overwritten, even when the name differs.
    /// Returns `true` when the location was added.
    pub fn insert(&mut self, location: Location) -> bool {
        if self.by_code.contains_key(&location.code) {
            return false;
        }
        self.by_name
            .entry(location.name.to_lowercase())
            .or_insert_with(|| location.code.clone());
        self.by_code.insert(location.code.clone(), location);
        true
    }

    pub fn get(&self, code: &str) -> Option<&Location> {
        self.by_code.get(code)
    }

    /// Code of the location whose name matches, ignoring case
    pub fn code_for_name(&self, name: &str) -> Option<&str> {
        self.by_name.get(&name.to_lowercase()).map(String::as_str)
    }

    /// Display name for a code, falling back to the code itself
    pub fn name_or_code<'a>(&'a self, code: &'a str) -> &'a str {
        self.get(code).map_or(code, |l| l.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}

impl FromIterator<Location> for LocationRegistry {
    fn from_iter<I: IntoIterator<Item = Location>>(iter: I) -> Self {
        let mut registry = Self::new();
        for location in iter {
            registry.insert(location);
        }
        registry
    }
}

/// Fold state threaded through the category/label rows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationScan {
    pub prefix: Option<String>,
    pub counter: u32,
}

impl LocationScan {
    /// Advance over one row given its column A and column B text.
    ///
    /// Returns the next state and, for a leaf row under an active category,
    /// the synthesized `(code, raw_label)`.
    pub fn step(self, category: &str, label: &str) -> (Self, Option<(String, String)>) {
        if !category.is_empty() && category.contains('.') {
            let prefix = category
                .split('.')
                .next()
                .unwrap_or_default()
                .trim()
                .to_string();
            let next = Self {
                prefix: Some(prefix),
                counter: 0,
            };
            return (next, None);
        }

        match self.prefix {
            Some(prefix) if !prefix.is_empty() && !label.is_empty() => {
                let counter = self.counter + 1;
                let code = format!("{prefix}{counter}");
                (
                    Self {
                        prefix: Some(prefix),
                        counter,
                    },
                    Some((code, label.to_string())),
                )
            }
            prefix => (
                Self {
                    prefix,
                    counter: self.counter,
                },
                None,
            ),
        }
    }
}

/// Scan the category/label columns and register every new leaf location.
///
/// The scan runs to the sheet's last row; unlike value extraction it has no
/// total-row stop, so a labelled total row under a category is a leaf too.
/// Idempotent: codes already in the registry are left untouched. Returns only
/// the locations this call created, in sheet order, for the caller to persist
/// as one batch.
pub fn import_locations<G: CellGrid + ?Sized>(
    grid: &G,
    layout: &SheetLayout,
    registry: &mut LocationRegistry,
) -> Vec<Location> {
    let last_row = grid.last_row();
    let mut created = Vec::new();
    let mut scan = LocationScan::default();

    for row in layout.first_data_row..=last_row {
        let category = grid.text(row, layout.category_col);
        let label = grid.text(row, layout.label_col);

        let (next, leaf) = scan.step(&category, &label);
        scan = next;

        if let Some((code, raw_label)) = leaf {
            let location = Location {
                code,
                name: clean_label(&raw_label),
            };
            if registry.insert(location.clone()) {
                debug!(
                    "New location {} '{}' at row {}",
                    location.code, location.name, row
                );
                created.push(location);
            }
        }
    }

    info!(
        "Location scan complete: {} new, {} total",
        created.len(),
        registry.len()
    );
    created
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::etl::grid::TextGrid;

    /// Sheet with three header rows before the taxonomy starts at row 4
    fn taxonomy_grid(rows: &[(&str, &str)]) -> TextGrid {
        let mut all = vec![
            vec!["Tabel 16".to_string()],
            vec!["".to_string(), "Lokasi".to_string(), "1/24".to_string()],
            vec![],
        ];
        all.extend(
            rows.iter()
                .map(|(a, b)| vec![a.to_string(), b.to_string()]),
        );
        TextGrid::from_rows(all)
    }

    fn codes(locations: &[Location]) -> Vec<(&str, &str)> {
        locations
            .iter()
            .map(|l| (l.code.as_str(), l.name.as_str()))
            .collect()
    }

    #[test]
    fn test_prefix_and_counter_codes() {
        let grid = taxonomy_grid(&[
            ("a.", ""),
            ("", "Region One"),
            ("", "Region Two"),
            ("b.", ""),
            ("", "Region Three"),
        ]);
        let mut registry = LocationRegistry::new();

        let created = import_locations(&grid, &SheetLayout::default(), &mut registry);

        assert_eq!(
            codes(&created),
            vec![("a1", "Region One"), ("a2", "Region Two"), ("b1", "Region Three")]
        );
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_second_import_creates_nothing() {
        let grid = taxonomy_grid(&[("a.", ""), ("", "Region One"), ("", "Region Two")]);
        let mut registry = LocationRegistry::new();

        let first = import_locations(&grid, &SheetLayout::default(), &mut registry);
        let second = import_locations(&grid, &SheetLayout::default(), &mut registry);

        assert_eq!(first.len(), 2);
        assert!(second.is_empty());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_existing_code_is_never_renamed() {
        let mut registry: LocationRegistry = vec![Location {
            code: "a1".to_string(),
            name: "Old Name".to_string(),
        }]
        .into_iter()
        .collect();
        let grid = taxonomy_grid(&[("a.", ""), ("", "New Name")]);

        let created = import_locations(&grid, &SheetLayout::default(), &mut registry);

        assert!(created.is_empty());
        assert_eq!(registry.get("a1").unwrap().name, "Old Name");
    }

    #[test]
    fn test_category_marker_text_and_label_cleaning() {
        let grid = taxonomy_grid(&[
            ("a. Wilayah Barat", ""),
            ("", "1. Cabang Utama"),
            ("", "2.  Cabang Kota "),
        ]);
        let mut registry = LocationRegistry::new();

        let created = import_locations(&grid, &SheetLayout::default(), &mut registry);

        assert_eq!(
            codes(&created),
            vec![("a1", "Cabang Utama"), ("a2", "Cabang Kota")]
        );
    }

    #[test]
    fn test_rows_before_first_category_are_ignored() {
        let grid = taxonomy_grid(&[
            ("", "Orphan"),
            ("Catatan", "No dot in column A"),
            ("c.", ""),
            ("", ""),
            ("", "Leaf"),
        ]);
        let mut registry = LocationRegistry::new();

        let created = import_locations(&grid, &SheetLayout::default(), &mut registry);

        // "Catatan" has no '.', so it is not a category and the row's label has no prefix
        assert_eq!(codes(&created), vec![("c1", "Leaf")]);
    }

    #[test]
    fn test_scan_continues_past_total_row() {
        let grid = taxonomy_grid(&[
            ("a.", ""),
            ("", "Region One"),
            ("", "JUMLAH"),
            ("b.", ""),
            ("", "Region Below Total"),
        ]);
        let mut registry = LocationRegistry::new();

        let created = import_locations(&grid, &SheetLayout::default(), &mut registry);

        assert_eq!(
            codes(&created),
            vec![("a1", "Region One"), ("a2", "JUMLAH"), ("b1", "Region Below Total")]
        );
    }

    #[test]
    fn test_scan_step_fold() {
        let (state, leaf) = LocationScan::default().step("", "Orphan");
        assert_eq!(leaf, None);
        assert_eq!(state, LocationScan::default());

        let (state, leaf) = state.step("d. Timur", "");
        assert_eq!(leaf, None);
        assert_eq!(state.prefix.as_deref(), Some("d"));

        let (state, leaf) = state.step("", "Kantor");
        assert_eq!(leaf, Some(("d1".to_string(), "Kantor".to_string())));
        assert_eq!(state.counter, 1);
    }

    #[test]
    fn test_name_lookup_is_case_insensitive() {
        let registry: LocationRegistry = vec![Location {
            code: "a1".to_string(),
            name: "Region One".to_string(),
        }]
        .into_iter()
        .collect();

        assert_eq!(registry.code_for_name("REGION ONE"), Some("a1"));
        assert_eq!(registry.code_for_name("region two"), None);
        assert_eq!(registry.name_or_code("a1"), "Region One");
        assert_eq!(registry.name_or_code("zz"), "zz");
    }
}

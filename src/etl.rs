// TRX/NPP workbook ETL pipeline
//
// A workbook holds two sheets with the same "location + month grid" layout:
// - the TRX sheet ("16"): location taxonomy in columns A-B plus monthly transaction counts
// - the NPP sheet ("18"): monthly customer counts for the same locations
//
// Stages (leaves first): grid -> month_header -> location_registry / value_extractor
// -> resolver -> series_validator. Orchestration and persistence live in
// services::etl_service and db.

pub mod grid;
pub mod location_registry;
pub mod models;
pub mod month_header;
pub mod resolver;
pub mod series_validator;
pub mod value_extractor;

pub use grid::{CellGrid, TextGrid};
pub use location_registry::{import_locations, LocationRegistry, LocationScan};
pub use models::{CalendarMonth, EtlRunResult, Location, MetricKind, MetricRecord, RawObservation};
pub use month_header::MonthHeaderParser;
pub use resolver::{clean_label, resolve_location};
pub use series_validator::{validate_series, SeriesValidation};
pub use value_extractor::{extract_observations, parse_count, SheetLayout};

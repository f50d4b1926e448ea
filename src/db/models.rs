use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;

use crate::etl::{Location, MetricRecord};

/// Everything one ETL run writes, committed as a single transaction
#[derive(Debug, Clone, Default)]
pub struct ImportBatch {
    pub new_locations: Vec<Location>,
    pub trx: Vec<MetricRecord>,
    pub npp: Vec<MetricRecord>,
}

impl ImportBatch {
    pub fn is_empty(&self) -> bool {
        self.new_locations.is_empty() && self.trx.is_empty() && self.npp.is_empty()
    }
}

/// Row counts reported by a commit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CommitSummary {
    pub locations_inserted: usize,
    pub trx_inserted: usize,
    pub npp_inserted: usize,
    /// Staged TRX rows whose (location, month) already had a stored row
    pub trx_duplicates: usize,
    /// Staged NPP rows whose (location, month) already had a stored row
    pub npp_duplicates: usize,
}

// Read model over the ticket_size view
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct TicketSizeRow {
    pub month: NaiveDate,
    pub trx: i64,
    pub npp: i64,
    /// trx / npp; absent when npp is zero
    pub ticket_size: Option<f64>,
}

use std::sync::Arc;

use serde::Serialize;

use crate::db::{DbError, EtlStore, TicketSizeRow};
use crate::etl::Location;

/// Ticket size series for one location
#[derive(Debug, Clone, Serialize)]
pub struct TicketSizeReport {
    pub location: Location,
    pub months: Vec<TicketSizeRow>,
}

/// Read side: the location list and the ticket size view
#[derive(Clone)]
pub struct ReportService {
    store: Arc<dyn EtlStore>,
}

impl ReportService {
    pub fn new(store: Arc<dyn EtlStore>) -> Self {
        Self { store }
    }

    pub async fn list_locations(&self) -> Result<Vec<Location>, DbError> {
        self.store.load_locations().await
    }

    /// `None` when the location code is unknown
    pub async fn ticket_size(&self, code: &str) -> Result<Option<TicketSizeReport>, DbError> {
        let Some(location) = self.store.find_location(code).await? else {
            return Ok(None);
        };

        let months = self.store.ticket_size(&location.code).await?;
        Ok(Some(TicketSizeReport { location, months }))
    }
}

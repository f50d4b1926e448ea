use sqlx::PgPool;
use tracing::{debug, instrument};

use crate::db::{DbError, TicketSizeRow};

/// Reads the `ticket_size` view (TRX / NPP per location and month)
#[derive(Clone)]
pub struct TicketSizeRepository {
    pool: PgPool,
}

impl TicketSizeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self), fields(code = %location_code))]
    pub async fn find_by_location(
        &self,
        location_code: &str,
    ) -> Result<Vec<TicketSizeRow>, DbError> {
        let rows = sqlx::query_as::<_, TicketSizeRow>(
            r#"
            SELECT month, trx, npp, ticket_size
            FROM ticket_size
            WHERE location_code = $1
            ORDER BY month ASC
            "#,
        )
        .bind(location_code)
        .fetch_all(&self.pool)
        .await?;

        debug!("Found {} ticket size rows", rows.len());
        Ok(rows)
    }
}

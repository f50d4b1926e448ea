use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, info, instrument};

use crate::db::DbError;
use crate::etl::Location;

#[derive(Clone)]
pub struct LocationRepository {
    pool: PgPool,
}

impl LocationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All locations ordered by code
    #[instrument(skip(self))]
    pub async fn find_all(&self) -> Result<Vec<Location>, DbError> {
        let locations = sqlx::query_as::<_, Location>(
            r#"
            SELECT code, name
            FROM locations
            ORDER BY code ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!("Found {} locations", locations.len());
        Ok(locations)
    }

    #[instrument(skip(self), fields(code = %code))]
    pub async fn find_by_code(&self, code: &str) -> Result<Option<Location>, DbError> {
        let location = sqlx::query_as::<_, Location>(
            r#"
            SELECT code, name
            FROM locations
            WHERE code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(location)
    }

    /// Insert locations whose code is not stored yet.
    ///
    /// Existing codes keep their stored name. Returns the number of rows inserted.
    #[instrument(skip(self, tx, locations), fields(count = locations.len()))]
    pub async fn insert_missing_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        locations: &[Location],
    ) -> Result<usize, DbError> {
        if locations.is_empty() {
            return Ok(0);
        }

        let codes: Vec<String> = locations.iter().map(|l| l.code.clone()).collect();
        let names: Vec<String> = locations.iter().map(|l| l.name.clone()).collect();

        let result = sqlx::query(
            r#"
            INSERT INTO locations (code, name)
            SELECT * FROM UNNEST($1::text[], $2::text[])
            ON CONFLICT (code) DO NOTHING
            "#,
        )
        .bind(&codes)
        .bind(&names)
        .execute(&mut **tx)
        .await?;

        let inserted = result.rows_affected() as usize;
        info!(
            "Inserted {} new locations, {} already present",
            inserted,
            locations.len() - inserted
        );
        Ok(inserted)
    }
}

use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, info, instrument};

use crate::db::DbError;
use crate::etl::{MetricKind, MetricRecord};

/// Column-wise copy of a record slice, bound as Postgres arrays
struct MetricColumns {
    months: Vec<NaiveDate>,
    codes: Vec<String>,
    values: Vec<i64>,
}

impl MetricColumns {
    fn from_records(records: &[MetricRecord]) -> Self {
        Self {
            months: records.iter().map(|r| r.month.first_day()).collect(),
            codes: records.iter().map(|r| r.location_code.clone()).collect(),
            values: records.iter().map(|r| r.value).collect(),
        }
    }
}

/// TRX and NPP rows; both tables share one shape, keyed by `MetricKind`
#[derive(Clone)]
pub struct MetricRepository {
    pool: PgPool,
}

impl MetricRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self))]
    pub async fn count(&self, kind: MetricKind) -> Result<usize, DbError> {
        let sql = format!("SELECT COUNT(*) FROM {}", kind.table());
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(count as usize)
    }

    /// Count staged records whose (location, month) already has a stored row
    #[instrument(skip(self, tx, records), fields(kind = %kind, count = records.len()))]
    pub async fn count_existing_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        kind: MetricKind,
        records: &[MetricRecord],
    ) -> Result<usize, DbError> {
        if records.is_empty() {
            return Ok(0);
        }

        let columns = MetricColumns::from_records(records);
        let sql = format!(
            r#"
            SELECT COUNT(*)
            FROM UNNEST($1::date[], $2::text[]) AS staged(month, location_code)
            WHERE EXISTS (
                SELECT 1 FROM {table} t
                WHERE t.month = staged.month AND t.location_code = staged.location_code
            )
            "#,
            table = kind.table()
        );

        let existing: i64 = sqlx::query_scalar(&sql)
            .bind(&columns.months)
            .bind(&columns.codes)
            .fetch_one(&mut **tx)
            .await?;

        debug!("{} staged {} rows already stored", existing, kind);
        Ok(existing as usize)
    }

    /// Append records to the metric's table inside the run transaction
    #[instrument(skip(self, tx, records), fields(kind = %kind, count = records.len()))]
    pub async fn insert_records_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        kind: MetricKind,
        records: &[MetricRecord],
    ) -> Result<usize, DbError> {
        if records.is_empty() {
            debug!("No {} records to insert", kind);
            return Ok(0);
        }

        let columns = MetricColumns::from_records(records);
        let sql = format!(
            r#"
            INSERT INTO {table} (month, location_code, {table})
            SELECT * FROM UNNEST($1::date[], $2::text[], $3::bigint[])
            "#,
            table = kind.table()
        );

        let result = sqlx::query(&sql)
            .bind(&columns.months)
            .bind(&columns.codes)
            .bind(&columns.values)
            .execute(&mut **tx)
            .await?;

        let inserted = result.rows_affected() as usize;
        info!("Inserted {} {} rows", inserted, kind);
        Ok(inserted)
    }
}

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, info, instrument};

use crate::db::{
    CommitSummary, DbError, ImportBatch, LocationRepository, MetricRepository, TicketSizeRepository,
    TicketSizeRow,
};
use crate::etl::{Location, MetricKind};

/// Storage used by the ETL service and the report endpoints
#[async_trait]
pub trait EtlStore: Send + Sync {
    /// Every stored location, ordered by code
    async fn load_locations(&self) -> Result<Vec<Location>, DbError>;

    async fn find_location(&self, code: &str) -> Result<Option<Location>, DbError>;

    /// Write a run's staged rows atomically; nothing is kept on error
    async fn commit(&self, batch: &ImportBatch) -> Result<CommitSummary, DbError>;

    /// Ticket size per month for one location, ordered by month
    async fn ticket_size(&self, location_code: &str) -> Result<Vec<TicketSizeRow>, DbError>;
}

/// Postgres-backed store
#[derive(Clone)]
pub struct PgEtlStore {
    pool: PgPool,
    location_repo: LocationRepository,
    metric_repo: MetricRepository,
    ticket_size_repo: TicketSizeRepository,
}

impl PgEtlStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            location_repo: LocationRepository::new(pool.clone()),
            metric_repo: MetricRepository::new(pool.clone()),
            ticket_size_repo: TicketSizeRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn metric_repo(&self) -> &MetricRepository {
        &self.metric_repo
    }
}

#[async_trait]
impl EtlStore for PgEtlStore {
    async fn load_locations(&self) -> Result<Vec<Location>, DbError> {
        self.location_repo.find_all().await
    }

    async fn find_location(&self, code: &str) -> Result<Option<Location>, DbError> {
        self.location_repo.find_by_code(code).await
    }

    #[instrument(skip(self, batch), fields(
        locations = batch.new_locations.len(),
        trx = batch.trx.len(),
        npp = batch.npp.len()
    ))]
    async fn commit(&self, batch: &ImportBatch) -> Result<CommitSummary, DbError> {
        if batch.is_empty() {
            debug!("Empty batch, nothing to commit");
            return Ok(CommitSummary::default());
        }

        debug!("Beginning ETL commit transaction");
        let mut tx = self.pool.begin().await?;

        let locations_inserted = self
            .location_repo
            .insert_missing_tx(&mut tx, &batch.new_locations)
            .await?;

        // Duplicates are counted before the inserts so the run's own rows are not included
        let trx_duplicates = self
            .metric_repo
            .count_existing_tx(&mut tx, MetricKind::Trx, &batch.trx)
            .await?;
        let npp_duplicates = self
            .metric_repo
            .count_existing_tx(&mut tx, MetricKind::Npp, &batch.npp)
            .await?;

        let trx_inserted = self
            .metric_repo
            .insert_records_tx(&mut tx, MetricKind::Trx, &batch.trx)
            .await?;
        let npp_inserted = self
            .metric_repo
            .insert_records_tx(&mut tx, MetricKind::Npp, &batch.npp)
            .await?;

        tx.commit().await?;

        let summary = CommitSummary {
            locations_inserted,
            trx_inserted,
            npp_inserted,
            trx_duplicates,
            npp_duplicates,
        };
        info!("ETL commit complete: {:?}", summary);
        Ok(summary)
    }

    async fn ticket_size(&self, location_code: &str) -> Result<Vec<TicketSizeRow>, DbError> {
        self.ticket_size_repo.find_by_location(location_code).await
    }
}

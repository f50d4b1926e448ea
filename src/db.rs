pub mod error;
pub mod etl_store;
pub mod location_repository;
pub mod metric_repository;
pub mod models;
pub mod ticket_size_repository;

pub use error::DbError;
pub use etl_store::{EtlStore, PgEtlStore};
pub use location_repository::LocationRepository;
pub use metric_repository::MetricRepository;
pub use models::*;
pub use ticket_size_repository::TicketSizeRepository;

pub mod etl_service;
pub mod report_service;

pub use etl_service::{EtlError, EtlService, EtlSettings, StagedImport};
pub use report_service::{ReportService, TicketSizeReport};

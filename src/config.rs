use std::env;

use crate::etl::SheetLayout;
use crate::services::EtlSettings;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub trx_sheet_name: String,
    pub npp_sheet_name: String,
    /// Largest accepted workbook upload, in bytes
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Config {
            database_url: env::var("DATABASE_URL")?,
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            trx_sheet_name: env::var("TRX_SHEET_NAME").unwrap_or_else(|_| "16".to_string()),
            npp_sheet_name: env::var("NPP_SHEET_NAME").unwrap_or_else(|_| "18".to_string()),
            max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                .unwrap_or_else(|_| "20971520".to_string())
                .parse()
                .unwrap_or(20 * 1024 * 1024),
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn etl_settings(&self) -> EtlSettings {
        EtlSettings {
            trx_sheet: self.trx_sheet_name.clone(),
            npp_sheet: self.npp_sheet_name.clone(),
            layout: SheetLayout::default(),
        }
    }
}

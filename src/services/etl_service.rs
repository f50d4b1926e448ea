use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use calamine::{open_workbook_auto, Data, Range, Reader, Sheets};
use chrono::NaiveDate;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

use crate::db::{DbError, EtlStore, ImportBatch};
use crate::etl::{
    clean_label, extract_observations, import_locations, resolve_location, validate_series,
    CellGrid, EtlRunResult, LocationRegistry, MetricKind, MetricRecord, MonthHeaderParser,
    SheetLayout,
};

/// Fatal ETL failures; expected conditions become warnings in `EtlRunResult`
#[derive(Debug, thiserror::Error)]
pub enum EtlError {
    #[error("Failed to open workbook: {0}")]
    Workbook(String),

    #[error("Store error: {0}")]
    Store(#[from] DbError),

    #[error("ETL task failed: {0}")]
    Task(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Which sheets to read and how they are laid out
#[derive(Debug, Clone)]
pub struct EtlSettings {
    /// Sheet holding the location taxonomy and TRX values
    pub trx_sheet: String,
    /// Sheet holding NPP values
    pub npp_sheet: String,
    pub layout: SheetLayout,
}

impl Default for EtlSettings {
    fn default() -> Self {
        Self {
            trx_sheet: "16".to_string(),
            npp_sheet: "18".to_string(),
            layout: SheetLayout::default(),
        }
    }
}

/// Rows and warnings produced from one workbook, not yet committed
#[derive(Debug, Clone, Default)]
pub struct StagedImport {
    pub batch: ImportBatch,
    pub warnings: Vec<String>,
}

/// Runs the TRX/NPP workbook ETL against a store
#[derive(Clone)]
pub struct EtlService {
    store: Arc<dyn EtlStore>,
    settings: EtlSettings,
    today: Option<NaiveDate>,
    // One run at a time per process
    run_lock: Arc<Mutex<()>>,
}

impl EtlService {
    pub fn new(store: Arc<dyn EtlStore>, settings: EtlSettings) -> Self {
        Self {
            store,
            settings,
            today: None,
            run_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Pin the date used for the unparseable-header fallback
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// Run the full ETL for a workbook on disk
    ///
    /// 1. Fails with an error entry (no store access) when the file is missing
    /// 2. Loads the location registry from the store
    /// 3. Reads the TRX sheet (locations, then values) and the NPP sheet
    /// 4. Commits new locations plus valid TRX/NPP rows in one transaction
    ///
    /// Registry load and commit failures are returned as `Err`.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn run(&self, path: &Path) -> Result<EtlRunResult, EtlError> {
        let _guard = self.run_lock.lock().await;
        let start_time = Instant::now();
        let mut result = EtlRunResult::default();

        if !path.exists() {
            error!("Input workbook not found: {}", path.display());
            result.errors.push(format!("File not found: {}", path.display()));
            return Ok(result);
        }

        let staged = self.stage(path).await?;
        result.warnings.extend(staged.warnings);

        let summary = self.store.commit(&staged.batch).await.map_err(|e| {
            error!("ETL commit failed, nothing was written: {}", e);
            EtlError::Store(e)
        })?;

        for (kind, duplicates) in [
            (MetricKind::Trx, summary.trx_duplicates),
            (MetricKind::Npp, summary.npp_duplicates),
        ] {
            if duplicates > 0 {
                let message = format!(
                    "{duplicates} {kind} rows repeat an existing (location, month) entry"
                );
                warn!("{}", message);
                result.warnings.push(message);
            }
        }

        result.success = true;
        result.summary = Some(summary);

        info!(
            "✓ ETL run complete ({:.1}s): {} locations, {} TRX, {} NPP rows, {} warnings",
            start_time.elapsed().as_secs_f64(),
            summary.locations_inserted,
            summary.trx_inserted,
            summary.npp_inserted,
            result.warnings.len()
        );
        Ok(result)
    }

    /// Run the ETL for an uploaded workbook body
    ///
    /// calamine needs a file path, so the bytes go to a temp file that is
    /// removed once the run finishes.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn run_bytes(&self, bytes: &[u8]) -> Result<EtlRunResult, EtlError> {
        let mut temp_file = tempfile::Builder::new()
            .prefix("etl-upload-")
            .suffix(".xlsx")
            .tempfile()?;
        temp_file.write_all(bytes)?;
        temp_file.flush()?;

        debug!("Wrote upload to {}", temp_file.path().display());
        self.run(temp_file.path()).await
    }

    /// Read and validate a workbook without writing anything
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn stage(&self, path: &Path) -> Result<StagedImport, EtlError> {
        let locations = self.store.load_locations().await?;
        let registry: LocationRegistry = locations.into_iter().collect();
        debug!("Loaded {} known locations", registry.len());

        let parser = match self.today {
            Some(today) => MonthHeaderParser::new(today),
            None => MonthHeaderParser::from_clock(),
        };
        let settings = self.settings.clone();
        let path: PathBuf = path.to_path_buf();

        // calamine is synchronous
        tokio::task::spawn_blocking(move || {
            let mut registry = registry;
            stage_workbook(&path, &settings, &parser, &mut registry)
        })
        .await
        .map_err(|e| EtlError::Task(e.to_string()))?
    }
}

/// Read both sheets of a workbook into a staged batch.
///
/// The workbook is opened once and closed when this returns. A missing or
/// unreadable sheet is a warning and only skips that sheet.
pub fn stage_workbook(
    path: &Path,
    settings: &EtlSettings,
    parser: &MonthHeaderParser,
    registry: &mut LocationRegistry,
) -> Result<StagedImport, EtlError> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| EtlError::Workbook(e.to_string()))?;
    let sheet_names = workbook.sheet_names();
    debug!("Workbook has sheets: {:?}", sheet_names);

    let mut staged = StagedImport::default();

    // 1. Locations and TRX from the TRX sheet
    match read_sheet(&mut workbook, &sheet_names, &settings.trx_sheet, MetricKind::Trx) {
        Ok(range) => {
            staged.batch.new_locations = import_locations(&range, &settings.layout, registry);
            staged.batch.trx = stage_metric(
                &range,
                MetricKind::Trx,
                &settings.layout,
                parser,
                registry,
                &mut staged.warnings,
            );
        }
        Err(message) => {
            warn!("{}", message);
            staged.warnings.push(message);
        }
    }

    // 2. NPP, resolved against the registry as extended above
    match read_sheet(&mut workbook, &sheet_names, &settings.npp_sheet, MetricKind::Npp) {
        Ok(range) => {
            staged.batch.npp = stage_metric(
                &range,
                MetricKind::Npp,
                &settings.layout,
                parser,
                registry,
                &mut staged.warnings,
            );
        }
        Err(message) => {
            warn!("{}", message);
            staged.warnings.push(message);
        }
    }

    info!(
        "Staged {} new locations, {} TRX and {} NPP rows with {} warnings",
        staged.batch.new_locations.len(),
        staged.batch.trx.len(),
        staged.batch.npp.len(),
        staged.warnings.len()
    );
    Ok(staged)
}

/// Find a sheet by trimmed name; the error is the warning to report
fn read_sheet(
    workbook: &mut Sheets<BufReader<File>>,
    sheet_names: &[String],
    wanted: &str,
    kind: MetricKind,
) -> Result<Range<Data>, String> {
    let Some(name) = sheet_names.iter().find(|name| name.trim() == wanted) else {
        return Err(format!("Sheet '{wanted}' for {kind} not found."));
    };

    workbook
        .worksheet_range(name)
        .map_err(|e| format!("Sheet '{wanted}' for {kind} could not be read: {e}"))
}

/// Extract, resolve and validate one metric sheet
///
/// Unresolved labels and validation rejections are appended to `warnings`.
pub fn stage_metric<G: CellGrid + ?Sized>(
    grid: &G,
    kind: MetricKind,
    layout: &SheetLayout,
    parser: &MonthHeaderParser,
    registry: &LocationRegistry,
    warnings: &mut Vec<String>,
) -> Vec<MetricRecord> {
    let observations = extract_observations(grid, layout, parser);

    let mut records = Vec::with_capacity(observations.len());
    for observation in observations {
        let label = clean_label(&observation.location_label);
        match resolve_location(registry, &label) {
            Some(code) => records.push(MetricRecord {
                month: observation.month,
                location_code: code.to_string(),
                value: observation.value,
            }),
            None => {
                let message = format!(
                    "Unknown location '{}' in {}; skipping.",
                    observation.location_label, kind
                );
                warn!("{}", message);
                warnings.push(message);
            }
        }
    }

    let validation = validate_series(records, kind, registry);
    warnings.extend(validation.rejections);
    validation.valid
}

/// Per-location monotonicity check for TRX and NPP series
///
/// Records are grouped by location (display name from the registry, or the raw
/// code when the registry has no entry), ordered by month, and walked with a
/// `previous` record:
/// - TRX: rejected when `current <= previous` (strictly increasing)
/// - NPP: rejected when `current < previous` (non-decreasing)
///
/// A rejected record still becomes `previous`, so one bad month is compared
/// against its neighbours instead of dragging a stale baseline forward.
use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::etl::location_registry::LocationRegistry;
use crate::etl::models::{MetricKind, MetricRecord};

#[derive(Debug, Clone, Default)]
pub struct SeriesValidation {
    /// Accepted records, month-ordered within each location group
    pub valid: Vec<MetricRecord>,
    /// One message per rejected record
    pub rejections: Vec<String>,
}

pub fn validate_series(
    records: Vec<MetricRecord>,
    kind: MetricKind,
    registry: &LocationRegistry,
) -> SeriesValidation {
    let total = records.len();

    // Group order is deterministic (by key); only the month order inside a group matters
    let mut groups: BTreeMap<String, Vec<MetricRecord>> = BTreeMap::new();
    for record in records {
        let key = registry.name_or_code(&record.location_code).to_string();
        groups.entry(key).or_default().push(record);
    }

    let mut result = SeriesValidation::default();

    for (location_name, mut group) in groups {
        // Stable sort: same-month records keep their sheet order
        group.sort_by_key(|r| r.month);

        let mut previous: Option<i64> = None;
        for record in group {
            let current = record.value;
            let baseline = previous.replace(current);

            match baseline {
                Some(prev) if !kind.accepts(prev, current) => {
                    let message = format!(
                        "{} validation failed for {} at {}: {} {} {}",
                        kind,
                        location_name,
                        record.month,
                        current,
                        kind.violation_operator(),
                        prev
                    );
                    warn!("{}", message);
                    result.rejections.push(message);
                }
                _ => result.valid.push(record),
            }
        }
    }

    debug!(
        "{} validation: {} of {} records kept, {} rejected",
        kind,
        result.valid.len(),
        total,
        result.rejections.len()
    );
    result
}

//! Once-per-day write gate for the `REDDIT_TRENDS` table.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{info, warn};
use trends_core::{CoreError, SnapshotRecord, SnapshotStore, TrendCounts};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    Written { rows: usize },
    Skipped { existing_rows: i64 },
}

/// One record per counted keyword, all sharing `snapshot_time` and `date`.
pub fn build_records(
    date: NaiveDate,
    counts: &TrendCounts,
    snapshot_time: DateTime<Utc>,
) -> Vec<SnapshotRecord> {
    let mut records: Vec<SnapshotRecord> = counts
        .iter()
        .map(|(keyword, count)| SnapshotRecord {
            trend_id: Uuid::new_v4(),
            snapshot_time,
            snapshot_date: date,
            keyword: keyword.clone(),
            mention_count: i64::try_from(*count).unwrap_or(i64::MAX),
        })
        .collect();
    records.sort_by(|a, b| a.keyword.cmp(&b.keyword));
    records
}

/// Writes the day's counts unless any row for `date` already exists.
///
/// The existence check and the insert are separate statements; two runs
/// racing on the same date can both pass the check.
pub async fn persist_snapshot(
    store: &dyn SnapshotStore,
    date: NaiveDate,
    counts: &TrendCounts,
    now: DateTime<Utc>,
) -> Result<PersistOutcome, CoreError> {
    let existing_rows = store.count_for_date(date).await?;
    if existing_rows > 0 {
        warn!(
            "Data for {} already exists ({} rows), skipping insert",
            date, existing_rows
        );
        return Ok(PersistOutcome::Skipped { existing_rows });
    }

    let records = build_records(date, counts, now);
    if records.is_empty() {
        info!("No keyword mentions for {}, nothing to insert", date);
        return Ok(PersistOutcome::Written { rows: 0 });
    }

    store.insert_snapshot(&records).await?;
    info!("Inserted {} trend rows for {}", records.len(), date);
    Ok(PersistOutcome::Written {
        rows: records.len(),
    })
}

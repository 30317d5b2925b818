//! Run orchestration: load -> read -> reconcile -> write -> record

use std::path::PathBuf;

use log::{debug, error, info, warn};

use super::reconciler::{Decision, reconcile};
use super::writer::{WriteOutcome, apply_updates, plan_writes};
use super::{SheetLayout, SheetStore, mapping, misses, range};
use crate::error::SyncError;

/// Inputs for one run
#[derive(Debug, Clone)]
pub struct RunParams {
    /// First row, 1-based inclusive
    pub start_row: u32,
    /// Last row, 1-based inclusive
    pub end_row: u32,
    pub mapping_file: PathBuf,
    pub misses_file: PathBuf,
    /// Compute and report writes without sending them or touching the miss log
    pub dry_run: bool,
}

/// Why a run stopped before reconciling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// Mapping was missing, unreadable or empty; nothing was read or written
    EmptyMapping,
    /// The range read failed or returned no rows; nothing was written
    NoRows,
}

impl std::fmt::Display for AbortReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyMapping => write!(f, "No URL mapping available"),
            Self::NoRows => write!(f, "No data found in specified range"),
        }
    }
}

#[derive(Debug)]
pub struct RunSummary {
    pub rows: usize,
    pub updates: usize,
    pub skipped_existing: usize,
    pub skipped_empty: usize,
    pub missing: usize,
    pub write: Result<WriteOutcome, SyncError>,
    pub misses_file: Option<PathBuf>,
    pub misses_error: Option<String>,
}

#[derive(Debug)]
pub enum RunOutcome {
    Aborted(AbortReason),
    Completed(RunSummary),
}

impl RunOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Aborted(_) => 1,
            Self::Completed(summary) => match &summary.write {
                Ok(_) => 0,
                Err(e) => e.exit_code(),
            },
        }
    }
}

/// Execute one reconciliation run against `store`
///
/// The batch write is the only mutation of the sheet and happens after every
/// decision is made. Misses are recorded whether or not the write succeeded;
/// a dry run writes neither the sheet nor the miss log.
pub async fn run(store: &dyn SheetStore, layout: &SheetLayout, params: &RunParams) -> RunOutcome {
    info!(
        "Starting sheet update for rows {} to {}",
        params.start_row, params.end_row
    );

    let mapping = mapping::load(&params.mapping_file);
    if mapping.is_empty() {
        error!("No URL mapping available. Cannot proceed.");
        return RunOutcome::Aborted(AbortReason::EmptyMapping);
    }

    let data = range::read_range(store, layout, params.start_row, params.end_row).await;
    if data.is_empty() {
        error!("No data found in specified range");
        return RunOutcome::Aborted(AbortReason::NoRows);
    }

    let start_row = params.start_row;
    let result = reconcile(&data.keys, &data.existing, &mapping);
    for (offset, decision) in result.decisions.iter().enumerate() {
        let row = start_row as usize + offset;
        let key = &data.keys[offset];
        match decision {
            Decision::SkipEmptyKey => debug!("Row {}: {}", row, decision.label()),
            Decision::SkipHasValue => info!("Row {}: Skipping {} - already has URL", row, key),
            Decision::Update(_) => info!("Row {}: {} -> URL found", row, key),
            Decision::Miss => warn!("Row {}: {} -> URL not found in mapping", row, key),
        }
    }

    let write = if params.dry_run {
        let planned = plan_writes(layout, start_row, &result.updates);
        info!("Dry run: {} cells would be updated", planned.len());
        Ok(WriteOutcome::Planned(planned))
    } else {
        apply_updates(store, layout, start_row, &result.updates).await
    };

    let (misses_file, misses_error) = if params.dry_run {
        info!("Dry run: leaving {} untouched", params.misses_file.display());
        (None, None)
    } else {
        match misses::save_misses(&params.misses_file, &result.misses) {
            Ok(path) => (path, None),
            Err(e) => {
                error!("Failed to save missing keys: {:#}", e);
                (None, Some(format!("{:#}", e)))
            }
        }
    };

    let summary = RunSummary {
        rows: result.rows(),
        updates: result.updates.len(),
        skipped_existing: result.skipped_existing,
        skipped_empty: result.skipped_empty,
        missing: result.misses.len(),
        write,
        misses_file,
        misses_error,
    };

    info!(
        "Sheet update completed: rows={} updated={} skipped_existing={} skipped_empty={} missing={}",
        summary.rows,
        summary.updates,
        summary.skipped_existing,
        summary.skipped_empty,
        summary.missing
    );

    RunOutcome::Completed(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::misses::misses_path;
    use crate::reconcile::store::memory::MemoryStore;
    use std::path::Path;

    fn layout() -> SheetLayout {
        SheetLayout::new("Sheet1", "J").unwrap()
    }

    fn params(dir: &Path, start_row: u32, end_row: u32) -> RunParams {
        RunParams {
            start_row,
            end_row,
            mapping_file: dir.join("mapping.json"),
            misses_file: misses_path(&dir.join("out")),
            dry_run: false,
        }
    }

    fn write_mapping(dir: &Path, json: &str) {
        std::fs::write(dir.join("mapping.json"), json).unwrap();
    }

    fn read_misses(path: &Path) -> Vec<String> {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    fn seeded_store() -> MemoryStore {
        let store = MemoryStore::new();
        store.set("J", 5, "t1");
        store.set("J", 6, "t2");
        store.set("L", 6, "http://x");
        store.set("J", 7, "t3");
        store.set("J", 8, "t4");
        store.set("K", 9, "no key here");
        store
    }

    #[tokio::test]
    async fn test_full_run() {
        let dir = tempfile::tempdir().unwrap();
        write_mapping(dir.path(), r#"{"t1": "http://a", "t3": "http://c"}"#);
        let store = seeded_store();
        let params = params(dir.path(), 5, 9);

        let outcome = run(&store, &layout(), &params).await;

        let RunOutcome::Completed(summary) = &outcome else {
            panic!("run aborted: {outcome:?}");
        };
        assert_eq!(summary.rows, 5);
        assert_eq!(summary.updates, 2);
        assert_eq!(summary.skipped_existing, 1);
        assert_eq!(summary.skipped_empty, 1);
        assert_eq!(summary.missing, 1);
        assert!(matches!(summary.write, Ok(WriteOutcome::Applied(2))));
        assert_eq!(outcome.exit_code(), 0);

        assert_eq!(store.get("L", 5).as_deref(), Some("http://a"));
        assert_eq!(store.get("L", 6).as_deref(), Some("http://x"));
        assert_eq!(store.get("L", 7).as_deref(), Some("http://c"));
        assert_eq!(store.get("L", 8), None);
        assert_eq!(store.batches().len(), 1);

        assert_eq!(read_misses(&params.misses_file), vec!["t4".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_mapping_aborts_before_read() {
        let dir = tempfile::tempdir().unwrap();
        write_mapping(dir.path(), "{}");
        let store = seeded_store();
        let params = params(dir.path(), 5, 9);

        let outcome = run(&store, &layout(), &params).await;

        assert!(matches!(
            outcome,
            RunOutcome::Aborted(AbortReason::EmptyMapping)
        ));
        assert_eq!(outcome.exit_code(), 1);
        assert!(store.reads().is_empty());
        assert!(store.batches().is_empty());
        assert!(!params.misses_file.exists());
        assert!(!dir.path().join("out").exists());
    }

    #[tokio::test]
    async fn test_missing_mapping_file_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store();

        let outcome = run(&store, &layout(), &params(dir.path(), 5, 9)).await;

        assert!(matches!(
            outcome,
            RunOutcome::Aborted(AbortReason::EmptyMapping)
        ));
        assert!(store.reads().is_empty());
    }

    #[tokio::test]
    async fn test_failed_read_aborts_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        write_mapping(dir.path(), r#"{"t1": "http://a"}"#);
        let store = MemoryStore::failing_reads();
        let params = params(dir.path(), 5, 9);

        let outcome = run(&store, &layout(), &params).await;

        assert!(matches!(outcome, RunOutcome::Aborted(AbortReason::NoRows)));
        assert!(store.batches().is_empty());
        assert!(!params.misses_file.exists());
    }

    #[tokio::test]
    async fn test_empty_range_aborts() {
        let dir = tempfile::tempdir().unwrap();
        write_mapping(dir.path(), r#"{"t1": "http://a"}"#);
        let store = MemoryStore::new();

        let outcome = run(&store, &layout(), &params(dir.path(), 100, 120)).await;

        assert!(matches!(outcome, RunOutcome::Aborted(AbortReason::NoRows)));
        assert_eq!(store.reads(), vec!["Sheet1!J100:L120".to_string()]);
        assert!(store.batches().is_empty());
    }

    #[tokio::test]
    async fn test_write_failure_still_records_misses() {
        let dir = tempfile::tempdir().unwrap();
        write_mapping(dir.path(), r#"{"t1": "http://a"}"#);
        let store = MemoryStore::failing_writes();
        store.set("J", 1, "t1");
        store.set("J", 2, "t2");
        let params = params(dir.path(), 1, 2);

        let outcome = run(&store, &layout(), &params).await;

        let RunOutcome::Completed(summary) = &outcome else {
            panic!("run aborted: {outcome:?}");
        };
        assert!(summary.write.is_err());
        assert!(matches!(summary.write, Err(SyncError::RemoteWrite { cells: 1, .. })));
        assert_eq!(outcome.exit_code(), 2);
        assert_eq!(read_misses(&params.misses_file), vec!["t2".to_string()]);
    }

    #[tokio::test]
    async fn test_second_run_has_nothing_to_write() {
        let dir = tempfile::tempdir().unwrap();
        write_mapping(dir.path(), r#"{"t1": "http://a", "t3": "http://c"}"#);
        let store = seeded_store();
        let params = params(dir.path(), 5, 9);

        run(&store, &layout(), &params).await;
        let outcome = run(&store, &layout(), &params).await;

        let RunOutcome::Completed(summary) = &outcome else {
            panic!("run aborted: {outcome:?}");
        };
        assert_eq!(summary.updates, 0);
        assert_eq!(summary.skipped_existing, 3);
        assert!(matches!(summary.write, Ok(WriteOutcome::NothingToWrite)));
        assert_eq!(store.batches().len(), 1);
    }

    #[tokio::test]
    async fn test_dry_run_plans_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        write_mapping(dir.path(), r#"{"t1": "http://a"}"#);
        let store = seeded_store();
        let mut params = params(dir.path(), 5, 9);
        params.dry_run = true;

        let outcome = run(&store, &layout(), &params).await;

        let RunOutcome::Completed(summary) = &outcome else {
            panic!("run aborted: {outcome:?}");
        };
        match &summary.write {
            Ok(WriteOutcome::Planned(writes)) => {
                assert_eq!(writes.len(), 1);
                assert_eq!(writes[0].range, "Sheet1!L5");
                assert_eq!(writes[0].value, "http://a");
            }
            other => panic!("unexpected write outcome: {other:?}"),
        }
        assert!(store.batches().is_empty());
        assert_eq!(store.get("L", 5), None);
        assert_eq!(summary.missing, 2);
        assert_eq!(summary.misses_file, None);
        assert!(!params.misses_file.exists());
    }

    #[tokio::test]
    async fn test_dry_run_keeps_previous_miss_log() {
        let dir = tempfile::tempdir().unwrap();
        write_mapping(dir.path(), r#"{"t1": "http://a"}"#);
        let store = seeded_store();
        let mut params = params(dir.path(), 5, 9);

        run(&store, &layout(), &params).await;
        let before = read_misses(&params.misses_file);
        assert_eq!(before, vec!["t3".to_string(), "t4".to_string()]);

        // Cells were filled by the real run; the preview sees a different miss set
        write_mapping(dir.path(), r#"{"t1": "http://a", "t3": "http://c"}"#);
        params.dry_run = true;
        let outcome = run(&store, &layout(), &params).await;

        let RunOutcome::Completed(summary) = &outcome else {
            panic!("run aborted: {outcome:?}");
        };
        assert_eq!(summary.missing, 1);
        assert_eq!(read_misses(&params.misses_file), before);
    }
}

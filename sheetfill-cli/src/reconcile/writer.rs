//! Batched write of resolved URLs to the value column

use log::{error, info};

use super::SheetLayout;
use super::store::{CellWrite, SheetStore};
use crate::error::SyncError;

/// Result of applying an update batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// No updates were pending; no request was sent
    NothingToWrite,
    /// Batch accepted; cell count as reported by the store
    Applied(usize),
    /// Dry run; the planned writes were not sent
    Planned(Vec<CellWrite>),
}

impl WriteOutcome {
    pub fn cells(&self) -> usize {
        match self {
            Self::NothingToWrite => 0,
            Self::Applied(n) => *n,
            Self::Planned(writes) => writes.len(),
        }
    }
}

/// Translate (offset, url) pairs to absolute cells of the value column
pub fn plan_writes(layout: &SheetLayout, start_row: u32, updates: &[(usize, String)]) -> Vec<CellWrite> {
    updates
        .iter()
        .map(|(offset, url)| CellWrite {
            range: layout.value_cell(start_row + *offset as u32),
            value: url.clone(),
        })
        .collect()
}

/// Send every update in a single batch; all-or-nothing from the caller's view
pub async fn apply_updates(
    store: &dyn SheetStore,
    layout: &SheetLayout,
    start_row: u32,
    updates: &[(usize, String)],
) -> Result<WriteOutcome, SyncError> {
    if updates.is_empty() {
        info!("No URLs to update");
        return Ok(WriteOutcome::NothingToWrite);
    }

    let writes = plan_writes(layout, start_row, updates);
    match store.batch_write(&writes).await {
        Ok(updated) => {
            info!(
                "Successfully updated {} cells in column {}",
                updated,
                layout.value_column()
            );
            Ok(WriteOutcome::Applied(updated))
        }
        Err(e) => {
            let err = SyncError::RemoteWrite {
                cells: writes.len(),
                message: format!("{:#}", e),
            };
            error!("{}", err);
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::store::memory::MemoryStore;

    fn layout() -> SheetLayout {
        SheetLayout::new("Sheet1", "J").unwrap()
    }

    #[test]
    fn test_plan_uses_absolute_rows() {
        let updates = vec![(0, "http://a".to_string()), (2, "http://c".to_string())];
        let writes = plan_writes(&layout(), 1005, &updates);

        assert_eq!(
            writes,
            vec![
                CellWrite {
                    range: "Sheet1!L1005".into(),
                    value: "http://a".into()
                },
                CellWrite {
                    range: "Sheet1!L1007".into(),
                    value: "http://c".into()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_updates_send_nothing() {
        let store = MemoryStore::new();
        let outcome = apply_updates(&store, &layout(), 1, &[]).await.unwrap();

        assert_eq!(outcome, WriteOutcome::NothingToWrite);
        assert!(store.batches().is_empty());
    }

    #[tokio::test]
    async fn test_single_batch_for_all_updates() {
        let store = MemoryStore::new();
        let updates = vec![(0, "http://a".to_string()), (3, "http://d".to_string())];

        let outcome = apply_updates(&store, &layout(), 10, &updates).await.unwrap();

        assert_eq!(outcome, WriteOutcome::Applied(2));
        assert_eq!(store.batches().len(), 1);
        assert_eq!(store.get("L", 10).as_deref(), Some("http://a"));
        assert_eq!(store.get("L", 13).as_deref(), Some("http://d"));
        assert_eq!(store.get("L", 11), None);
    }

    #[tokio::test]
    async fn test_failure_is_distinct_from_nothing_to_write() {
        let store = MemoryStore::failing_writes();
        let updates = vec![(0, "http://a".to_string())];

        let err = apply_updates(&store, &layout(), 1, &updates).await.unwrap_err();

        match err {
            SyncError::RemoteWrite { cells, message } => {
                assert_eq!(cells, 1);
                assert!(message.contains("permission"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

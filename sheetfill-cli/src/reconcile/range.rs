//! Read (key, existing value) pairs from the sheet

use log::{error, info};

use super::SheetLayout;
use super::store::SheetStore;
use crate::error::SyncError;

/// Parallel key / existing-value columns for a row range
///
/// `keys.len() == existing.len()` always holds; index `i` is row `start_row + i`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeData {
    pub keys: Vec<String>,
    pub existing: Vec<String>,
}

impl RangeData {
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Build from raw rows of the three-column window; short rows read as ""
    pub fn from_rows(rows: Vec<Vec<String>>) -> Self {
        let mut data = Self {
            keys: Vec::with_capacity(rows.len()),
            existing: Vec::with_capacity(rows.len()),
        };

        for mut row in rows {
            // Column two is unrelated data and ignored
            let existing = if row.len() > 2 { row.swap_remove(2) } else { String::new() };
            let key = if !row.is_empty() { row.swap_remove(0) } else { String::new() };
            data.keys.push(key);
            data.existing.push(existing);
        }

        data
    }
}

/// Read rows `start_row..=end_row` (1-based) of the key/value window
pub async fn try_read_range(
    store: &dyn SheetStore,
    layout: &SheetLayout,
    start_row: u32,
    end_row: u32,
) -> Result<RangeData, SyncError> {
    if start_row == 0 || start_row > end_row {
        return Err(SyncError::configuration(format!(
            "Invalid row range {}..{}",
            start_row, end_row
        )));
    }

    let range = layout.window(start_row, end_row);
    let rows = store
        .read_values(&range)
        .await
        .map_err(|e| SyncError::RemoteRead {
            range: range.clone(),
            message: format!("{:#}", e),
        })?;

    let data = RangeData::from_rows(rows);
    info!("Read {} rows from range {}", data.len(), range);
    Ok(data)
}

/// Like [`try_read_range`] but degrades any failure to an empty result
pub async fn read_range(
    store: &dyn SheetStore,
    layout: &SheetLayout,
    start_row: u32,
    end_row: u32,
) -> RangeData {
    match try_read_range(store, layout, start_row, end_row).await {
        Ok(data) => data,
        Err(e) => {
            error!("{}", e);
            RangeData::default()
        }
    }
}

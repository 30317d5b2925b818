//! Tabular store abstraction used by the reader and writer

use anyhow::Result;
use async_trait::async_trait;

/// One single-cell write in a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellWrite {
    /// A1 reference, e.g. `Sheet1!L12`
    pub range: String,
    pub value: String,
}

/// Remote spreadsheet the pipeline reads from and writes to
#[async_trait]
pub trait SheetStore: Send + Sync {
    /// Values of an A1 range, row-major
    ///
    /// Trailing empty cells and rows may be omitted, as the Sheets API does.
    async fn read_values(&self, range: &str) -> Result<Vec<Vec<String>>>;

    /// Apply all writes in one call, returning the number of cells updated
    async fn batch_write(&self, writes: &[CellWrite]) -> Result<usize>;
}

//! Sheet reconciliation
//!
//! Fills blank cells of a value column from a key -> URL mapping. The stages
//! are independent functions composed by [`pipeline::run`]:
//!
//! - [`mapping`] loads the key -> URL table
//! - [`range`] reads the key and current value for each row
//! - [`reconciler`] decides what to do with each row (pure)
//! - [`writer`] applies all fills in one batch
//! - [`misses`] records keys with no mapping entry

pub mod mapping;
pub mod misses;
pub mod pipeline;
pub mod range;
pub mod reconciler;
pub mod store;
pub mod writer;

pub use store::{CellWrite, SheetStore};
pub use writer::WriteOutcome;

use anyhow::{Context, Result};

use crate::api::a1;

/// Where the key and value columns live
///
/// The window is three adjacent columns: key, an unrelated column, value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetLayout {
    sheet_name: String,
    key_column: String,
    value_column: String,
}

impl SheetLayout {
    /// Distance from the key column to the value column
    pub const VALUE_OFFSET: u32 = 2;

    pub fn new(sheet_name: impl Into<String>, key_column: &str) -> Result<Self> {
        let key_index = a1::column_index(key_column)
            .with_context(|| format!("Invalid key column: {}", key_column))?;

        Ok(Self {
            sheet_name: sheet_name.into(),
            key_column: a1::column_label(key_index),
            value_column: a1::offset_column(key_column, Self::VALUE_OFFSET)?,
        })
    }

    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    pub fn value_column(&self) -> &str {
        &self.value_column
    }

    /// Three-column window for rows `start_row..=end_row`
    pub fn window(&self, start_row: u32, end_row: u32) -> String {
        a1::range(
            &self.sheet_name,
            &self.key_column,
            start_row,
            &self.value_column,
            end_row,
        )
    }

    /// Value cell of an absolute row
    pub fn value_cell(&self, row: u32) -> String {
        a1::cell(&self.sheet_name, &self.value_column, row)
    }
}

//! Per-row fill decisions
//!
//! Pure functions of (keys, existing values, mapping): no network, no files.
//! Only blank cells are ever filled; a cell that already holds a value is
//! skipped even when the mapping has a different URL for its key.

use super::mapping::MappingTable;

/// Outcome for a single row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Key cell is blank
    SkipEmptyKey,
    /// Target cell already has a value
    SkipHasValue,
    /// Fill the target cell with this URL
    Update(String),
    /// Key has no mapping entry
    Miss,
}

impl Decision {
    pub fn label(&self) -> &'static str {
        match self {
            Self::SkipEmptyKey => "skip_empty_key",
            Self::SkipHasValue => "skip_has_value",
            Self::Update(_) => "update",
            Self::Miss => "miss",
        }
    }
}

/// Decide one row
///
/// Blankness is judged after trimming; the mapping lookup uses the key as read.
pub fn decide(key: &str, existing: &str, mapping: &MappingTable) -> Decision {
    if key.trim().is_empty() {
        return Decision::SkipEmptyKey;
    }
    if !existing.trim().is_empty() {
        return Decision::SkipHasValue;
    }
    match mapping.get(key) {
        Some(url) => Decision::Update(url.to_string()),
        None => Decision::Miss,
    }
}

/// Aggregated decisions for a range
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// One per input row, in row order
    pub decisions: Vec<Decision>,
    /// (offset within the range, url)
    pub updates: Vec<(usize, String)>,
    /// Unresolved keys in row order, duplicates kept
    pub misses: Vec<String>,
    pub skipped_empty: usize,
    pub skipped_existing: usize,
}

impl Reconciliation {
    pub fn rows(&self) -> usize {
        self.updates.len() + self.misses.len() + self.skipped_empty + self.skipped_existing
    }
}

/// Decide every row; `existing` entries past its end count as blank
pub fn reconcile(keys: &[String], existing: &[String], mapping: &MappingTable) -> Reconciliation {
    let mut result = Reconciliation::default();

    for (offset, key) in keys.iter().enumerate() {
        let current = existing.get(offset).map(String::as_str).unwrap_or("");
        let decision = decide(key, current, mapping);
        match &decision {
            Decision::SkipEmptyKey => result.skipped_empty += 1,
            Decision::SkipHasValue => result.skipped_existing += 1,
            Decision::Update(url) => result.updates.push((offset, url.clone())),
            Decision::Miss => result.misses.push(key.clone()),
        }
        result.decisions.push(decision);
    }

    result
}

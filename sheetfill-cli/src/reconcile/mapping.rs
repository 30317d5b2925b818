//! Key to URL mapping loader

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use log::{error, info};

/// Immutable key -> URL snapshot, loaded once per run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingTable {
    entries: HashMap<String, String>,
}

impl MappingTable {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<HashMap<String, String>> for MappingTable {
    fn from(entries: HashMap<String, String>) -> Self {
        Self { entries }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MappingTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Read a flat JSON object of string -> string
pub fn try_load(path: &Path) -> Result<MappingTable> {
    if !path.exists() {
        anyhow::bail!("Mapping file not found: {}", path.display());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read mapping file: {}", path.display()))?;
    let entries: HashMap<String, String> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse mapping file: {}", path.display()))?;

    Ok(MappingTable::from(entries))
}

/// Load the mapping, or an empty table if it can't be read
///
/// Never fails; callers must check `is_empty()` before going further.
pub fn load(path: &Path) -> MappingTable {
    match try_load(path) {
        Ok(mapping) => {
            info!("Loaded {} URL mappings from {}", mapping.len(), path.display());
            mapping
        }
        Err(e) => {
            error!("{:#}", e);
            MappingTable::default()
        }
    }
}

//! Persist keys that had no mapping entry

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;

/// File name of the miss log inside the output directory
pub const MISSES_FILE: &str = "missing_text_ids.json";

pub fn misses_path(output_dir: &Path) -> PathBuf {
    output_dir.join(MISSES_FILE)
}

/// Replace the miss log at `path` with `misses`
///
/// Nothing is touched when `misses` is empty. The file is written to a
/// temporary sibling and renamed over the old one, so readers never see a
/// partial list. Returns the path written, if any.
pub fn save_misses(path: &Path, misses: &[String]) -> Result<Option<PathBuf>> {
    if misses.is_empty() {
        info!("No missing keys to save");
        return Ok(None);
    }

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

    let json = serde_json::to_string_pretty(misses).context("Failed to serialize missing keys")?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    tmp.write_all(json.as_bytes())
        .context("Failed to write missing keys")?;
    tmp.persist(path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;

    info!(
        "Missing keys saved to {} ({} entries)",
        path.display(),
        misses.len()
    );
    Ok(Some(path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_misses_touch_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = misses_path(&dir.path().join("out"));

        assert_eq!(save_misses(&path, &[]).unwrap(), None);
        assert!(!path.exists());
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_writes_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = misses_path(&dir.path().join("out"));

        let written = save_misses(&path, &strings(&["t4", "t9"])).unwrap();

        assert_eq!(written.as_deref(), Some(path.as_path()));
        let saved: Vec<String> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved, strings(&["t4", "t9"]));
    }

    #[test]
    fn test_overwrites_previous_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = misses_path(dir.path());

        save_misses(&path, &strings(&["old1", "old2", "old3"])).unwrap();
        save_misses(&path, &strings(&["new"])).unwrap();

        let saved: Vec<String> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved, strings(&["new"]));
    }

    #[test]
    fn test_empty_run_keeps_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = misses_path(dir.path());

        save_misses(&path, &strings(&["kept"])).unwrap();
        save_misses(&path, &[]).unwrap();

        let saved: Vec<String> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved, strings(&["kept"]));
    }
}

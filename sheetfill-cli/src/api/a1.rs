//! A1 notation helpers for Sheets API ranges

use anyhow::{Result, bail};

/// Sheets grids stop at column ZZZ
pub const MAX_COLUMNS: u32 = 18_278;

/// Convert a column label ("A", "J", "AA") to its 0-based index
pub fn column_index(label: &str) -> Result<u32> {
    let label = label.trim();
    if label.is_empty() {
        bail!("Column label is empty");
    }

    let mut index: u32 = 0;
    for c in label.chars() {
        if !c.is_ascii_alphabetic() {
            bail!("Invalid column label: {}", label);
        }
        let digit = (c.to_ascii_uppercase() as u32) - ('A' as u32) + 1;
        index = index
            .checked_mul(26)
            .and_then(|i| i.checked_add(digit))
            .filter(|i| *i <= MAX_COLUMNS)
            .ok_or_else(|| anyhow::anyhow!("Column beyond ZZZ: {}", label))?;
    }

    Ok(index - 1)
}

/// Convert a 0-based column index to its label
pub fn column_label(index: u32) -> String {
    let mut n = index + 1;
    let mut label = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        label.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    label.iter().rev().collect()
}

/// Label of the column `offset` places to the right of `label`
pub fn offset_column(label: &str, offset: u32) -> Result<String> {
    let index = column_index(label)?
        .checked_add(offset)
        .filter(|i| *i < MAX_COLUMNS)
        .ok_or_else(|| anyhow::anyhow!("Column {} plus {} is beyond ZZZ", label.trim(), offset))?;
    Ok(column_label(index))
}

/// Quote a tab name for use in a range when it isn't a plain identifier
///
/// Embedded single quotes are doubled.
pub fn quote_sheet_name(name: &str) -> String {
    let plain = !name.is_empty()
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.chars().next().is_some_and(|c| c.is_ascii_digit());

    if plain {
        name.to_string()
    } else {
        format!("'{}'", name.replace('\'', "''"))
    }
}

/// `Tab!J5:L9`
pub fn range(sheet: &str, first_col: &str, first_row: u32, last_col: &str, last_row: u32) -> String {
    format!(
        "{}!{}{}:{}{}",
        quote_sheet_name(sheet),
        first_col,
        first_row,
        last_col,
        last_row
    )
}

/// `Tab!L7`
pub fn cell(sheet: &str, col: &str, row: u32) -> String {
    format!("{}!{}{}", quote_sheet_name(sheet), col, row)
}

//! Zone name normalization

use crate::error::{Error, Result};

/// Remove trailing dots and spaces from a zone name
pub fn clean_zone(zone: &str) -> String {
    zone.trim_end_matches(['.', ' ']).to_string()
}

/// Clean a zone name and reject it if nothing is left
pub fn require_zone(zone: &str) -> Result<String> {
    let cleaned = clean_zone(zone);
    if cleaned.is_empty() {
        return Err(Error::validation(format!("zone name '{}' is empty", zone)));
    }
    Ok(cleaned)
}

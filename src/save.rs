//! Ledger persistence: the ascendancy ledger is one small JSON document,
//! loaded at startup and rewritten whenever the ledger reports dirty.

use anyhow::{Context, Result};
use runecove_hunt::AscendancyLedger;
use std::fs;
use std::path::Path;

/// Load the ledger from disk. A missing file is a fresh server, not an
/// error.
pub fn load_ledger(path: &Path) -> Result<AscendancyLedger> {
    match fs::read_to_string(path) {
        Ok(contents) => serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse ledger at {}", path.display())),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(AscendancyLedger::new()),
        Err(err) => {
            Err(err).with_context(|| format!("Failed to read ledger at {}", path.display()))
        }
    }
}

/// Write the ledger atomically: serialize to a sibling temp file, then
/// rename over the target.
pub fn save_ledger(path: &Path, ledger: &AscendancyLedger) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(ledger).context("Failed to serialize ledger")?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).with_context(|| format!("Failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("Failed to move ledger into place at {}", path.display()))?;
    Ok(())
}

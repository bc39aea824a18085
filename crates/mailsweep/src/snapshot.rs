//! Mailbox snapshot files.
//!
//! A snapshot is a JSON array of threads, each with labels, an importance
//! flag, and messages carrying a timestamp and starred/trashed flags. The
//! `run` command loads one, purges it in memory, and writes it back with
//! the trashed state applied. This is the seam where a real mail backend
//! would be wired instead; snapshot mode lets retention rules be exercised
//! against an exported mailbox before pointing them at a live one.

use std::path::Path;

use anyhow::{Context, Result};
use mailsweep_core::StoredThread;

/// Loads a snapshot from disk.
pub fn load(path: &Path) -> Result<Vec<StoredThread>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading mailbox snapshot {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("parsing mailbox snapshot {}", path.display()))
}

/// Writes a snapshot back to disk.
pub fn save(path: &Path, threads: &[StoredThread]) -> Result<()> {
    let json = serde_json::to_string_pretty(threads)?;
    std::fs::write(path, json)
        .with_context(|| format!("writing mailbox snapshot {}", path.display()))?;
    Ok(())
}

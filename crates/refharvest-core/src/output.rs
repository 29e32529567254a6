use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::models::Snapshot;
use crate::report::render_report;

/// Write the snapshot as pretty-printed JSON, creating parent directories.
pub fn write_snapshot(path: &Path, snapshot: &Snapshot) -> Result<()> {
    ensure_parent(path)?;
    let json = serde_json::to_string_pretty(snapshot)?;
    fs::write(path, json)?;
    tracing::info!(path = %path.display(), items = snapshot.items.len(), "snapshot written");
    Ok(())
}

/// Render and write the Markdown summary, creating parent directories.
pub fn write_summary(path: &Path, snapshot: &Snapshot) -> Result<()> {
    ensure_parent(path)?;
    fs::write(path, render_report(snapshot))?;
    tracing::info!(path = %path.display(), "summary written");
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

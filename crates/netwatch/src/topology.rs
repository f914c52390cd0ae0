//! Topology file persistence.
//!
//! The whole topology (devices, links, events) is one JSON document that
//! seeds a `MemoryStore` on startup and is rewritten from its snapshot
//! after every command that changes it.

use std::path::Path;

use tracing::debug;

use netwatch_core::{MemoryStore, TopologySnapshot};

use crate::error::CliError;

/// Load a topology file. A missing file is an error unless `allow_missing`.
pub fn load(path: &Path, allow_missing: bool) -> Result<MemoryStore, CliError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            if allow_missing {
                debug!(path = %path.display(), "topology file missing, starting empty");
                return Ok(MemoryStore::new());
            }
            return Err(CliError::NoTopology {
                path: path.display().to_string(),
            });
        }
        Err(e) => return Err(e.into()),
    };

    let snapshot: TopologySnapshot =
        serde_json::from_str(&text).map_err(|source| CliError::BadTopology {
            path: path.display().to_string(),
            source,
        })?;
    debug!(
        path = %path.display(),
        devices = snapshot.devices.len(),
        links = snapshot.links.len(),
        events = snapshot.events.len(),
        "topology loaded"
    );
    Ok(MemoryStore::from_snapshot(snapshot))
}

/// Write the store's committed state back to `path`.
///
/// Writes to a sibling temp file first so a crash never leaves a
/// truncated topology behind.
pub fn save(path: &Path, store: &MemoryStore) -> Result<(), CliError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(&store.snapshot())?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, path)?;
    debug!(path = %path.display(), version = store.version(), "topology saved");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use netwatch_core::Device;

    use super::*;

    #[test]
    fn missing_file_is_an_error_unless_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        assert!(matches!(load(&path, false), Err(CliError::NoTopology { .. })));
        assert_eq!(load(&path, true).unwrap().device_count(), 0);
    }

    #[test]
    fn save_then_load_keeps_devices() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("lab.json");
        let store = MemoryStore::from_snapshot(TopologySnapshot {
            devices: vec![Device::new(
                "core",
                "Core",
                Some("10.0.0.1".parse().unwrap()),
            )],
            ..TopologySnapshot::default()
        });
        save(&path, &store).unwrap();

        let reloaded = load(&path, false).unwrap();
        assert_eq!(reloaded.snapshot(), store.snapshot());
    }

    #[test]
    fn malformed_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = load(&path, false).err().unwrap();
        assert!(err.to_string().contains("bad.json"));
    }
}

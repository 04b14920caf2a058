//! On-disk format of the library index.
//!
//! ```json
//! { "version": 1, "cycle": 12, "entries": [ { ...MediaEntry... } ] }
//! ```
//!
//! Records are decoded one at a time so a single damaged entry costs only
//! that entry. Writes go to a temp file in the same directory and are renamed
//! over the target.

use posterwall_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use super::entry::MediaEntry;

pub const INDEX_VERSION: u32 = 1;

#[derive(Serialize)]
struct PersistedIndexRef<'a> {
    version: u32,
    cycle: u64,
    entries: Vec<&'a MediaEntry>,
}

#[derive(Deserialize)]
struct RawIndex {
    version: u32,
    #[serde(default)]
    cycle: u64,
    #[serde(default)]
    entries: Vec<serde_json::Value>,
}

/// A decoded index file.
#[derive(Debug, Default)]
pub struct LoadedIndex {
    pub cycle: u64,
    pub entries: Vec<MediaEntry>,
    /// Records that could not be decoded.
    pub dropped: usize,
}

/// Read an index file. A missing file is an empty index.
///
/// A file that is not an index document at all is `IndexCorruption`;
/// individual bad records are logged and skipped.
pub fn load(path: &Path) -> Result<LoadedIndex> {
    if !path.exists() {
        return Ok(LoadedIndex::default());
    }

    let content = std::fs::read_to_string(path)?;
    let raw: RawIndex = serde_json::from_str(&content)
        .map_err(|e| Error::index_corruption(format!("{}: {e}", path.display())))?;

    if raw.version != INDEX_VERSION {
        return Err(Error::index_corruption(format!(
            "{}: unsupported index version {}",
            path.display(),
            raw.version
        )));
    }

    let mut loaded = LoadedIndex {
        cycle: raw.cycle,
        ..LoadedIndex::default()
    };
    for (i, record) in raw.entries.into_iter().enumerate() {
        match serde_json::from_value::<MediaEntry>(record) {
            Ok(entry) => loaded.entries.push(entry),
            Err(e) => {
                let err = Error::index_corruption(format!("record {i}: {e}"));
                tracing::warn!(path = %path.display(), "Dropping index record: {}", err);
                loaded.dropped += 1;
            }
        }
    }

    Ok(loaded)
}

/// Atomically write an index file.
pub fn save<'a>(
    path: &Path,
    cycle: u64,
    entries: impl IntoIterator<Item = &'a MediaEntry>,
) -> Result<()> {
    let doc = PersistedIndexRef {
        version: INDEX_VERSION,
        cycle,
        entries: entries.into_iter().collect(),
    };
    let json = serde_json::to_vec_pretty(&doc)?;

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(&json)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

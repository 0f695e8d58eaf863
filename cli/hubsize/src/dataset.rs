//! Dataset files: expected entities in, size snapshot in and out.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::Context;
use hubsize_reconcile::SizeMap;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::CliError;

const ENTITIES: &str = "Expected entities file";
const SNAPSHOT: &str = "Size snapshot";

/// One record of the expected entities file. Other fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExpectedEntity {
    pub id: String,
}

/// Load the expected entities. A missing file is an error.
pub fn load_expected(path: &Path) -> Result<Vec<ExpectedEntity>, CliError> {
    let Some(entities) = read_json::<Vec<ExpectedEntity>>(path, ENTITIES)? else {
        return Err(CliError::MissingInput {
            what: ENTITIES,
            path: path.to_path_buf(),
        });
    };

    info!(path = %path.display(), count = entities.len(), "Loaded expected entities");
    Ok(entities)
}

/// Load the prior size snapshot. A missing file reads as empty.
pub fn load_snapshot(path: &Path) -> Result<SizeMap, CliError> {
    let snapshot = read_json::<SizeMap>(path, SNAPSHOT)?.unwrap_or_default();
    debug!(path = %path.display(), count = snapshot.len(), "Loaded size snapshot");
    Ok(snapshot)
}

/// Replace the snapshot at `path` with `sizes`.
///
/// Written to a temporary file in the same directory and renamed over the
/// target, so readers see either the old file or the complete new one.
pub fn write_snapshot(path: &Path, sizes: &SizeMap) -> anyhow::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {:?}", dir))?;

    let mut contents = serde_json::to_string_pretty(sizes)?;
    contents.push('\n');

    let mut file = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {:?}", dir))?;
    file.write_all(contents.as_bytes())?;
    file.as_file().sync_all()?;
    file.persist(path)
        .with_context(|| format!("Failed to write size snapshot to {:?}", path))?;

    info!(path = %path.display(), entries = sizes.len(), "Wrote size snapshot");
    Ok(())
}

/// Read and parse a JSON file. `Ok(None)` when the file does not exist.
fn read_json<T: DeserializeOwned>(path: &Path, what: &'static str) -> Result<Option<T>, CliError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(anyhow::Error::new(e)
                .context(format!("Failed to read {} at {:?}", what, path))
                .into())
        }
    };

    serde_json::from_str(&contents)
        .map(Some)
        .map_err(|e| CliError::CorruptInput {
            what,
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

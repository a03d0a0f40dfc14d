use std::fs;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use snafu::ResultExt;
use vast_core::errors::{Error, FilesystemSnafu};

/// Serializes `value` as JSON and atomically replaces `path`: write to a
/// sibling temp file, then rename into place, so a crash mid-write
/// leaves either the old file or the new one, never a truncated one.
/// Mirrors the wal-rotation-then-swap idiom the teacher uses for its own
/// durable writes.
pub fn atomic_write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context(FilesystemSnafu { path: parent.to_path_buf() })?;
    }
    let tmp = path.with_extension("tmp");
    let bytes = serde_json::to_vec(value).map_err(|source| Error::Serialization { source })?;
    fs::write(&tmp, &bytes).context(FilesystemSnafu { path: tmp.clone() })?;
    fs::rename(&tmp, path).context(FilesystemSnafu { path: path.to_path_buf() })?;
    Ok(())
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, Error> {
    let bytes = fs::read(path).context(FilesystemSnafu { path: path.to_path_buf() })?;
    serde_json::from_slice(&bytes).map_err(|source| Error::Serialization { source })
}

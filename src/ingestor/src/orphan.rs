use std::fs;
use std::path::Path;

use snafu::ResultExt;
use uuid::Uuid;
use vast_core::errors::{Error, FilesystemSnafu};
use vast_segment::Segment;

/// Lists the segments left behind in `dir` by a previous run, identified
/// by their uuid filename. Returned oldest-first (uuidv7 sorts
/// chronologically), mirroring the order they were originally handed to
/// the receiver in.
pub fn scan(dir: &Path) -> Result<Vec<Uuid>, Error> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut found = Vec::new();
    for entry in fs::read_dir(dir).context(FilesystemSnafu { path: dir.to_path_buf() })? {
        let entry = entry.context(FilesystemSnafu { path: dir.to_path_buf() })?;
        if let Some(uuid) = entry.file_name().to_str().and_then(|name| Uuid::parse_str(name).ok())
        {
            found.push(uuid);
        }
    }
    found.sort();
    Ok(found)
}

pub fn load(dir: &Path, uuid: Uuid) -> Result<Segment, Error> {
    let path = dir.join(uuid.to_string());
    let bytes = fs::read(&path).context(FilesystemSnafu { path: path.clone() })?;
    Segment::from_bytes(&bytes)
}

pub fn write(dir: &Path, segment: &Segment) -> Result<(), Error> {
    fs::create_dir_all(dir).context(FilesystemSnafu { path: dir.to_path_buf() })?;
    let path = dir.join(segment.uuid.to_string());
    let bytes = segment.to_bytes()?;
    fs::write(&path, bytes).context(FilesystemSnafu { path })
}

pub fn remove(dir: &Path, uuid: Uuid) -> Result<(), Error> {
    let path = dir.join(uuid.to_string());
    if path.exists() {
        fs::remove_file(&path).context(FilesystemSnafu { path })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vast_value::{Tag, Type};

    fn segment() -> Segment {
        Segment {
            uuid: Uuid::now_v7(),
            first_event_time: 1,
            last_event_time: 2,
            schema: Type::anonymous_record(vec![("a".to_string(), Type::Leaf(Tag::Int64))]),
            chunks: Vec::new(),
        }
    }

    #[test]
    fn write_scan_load_remove_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let seg = segment();
        write(dir.path(), &seg).unwrap();

        let found = scan(dir.path()).unwrap();
        assert_eq!(found, vec![seg.uuid]);

        let loaded = load(dir.path(), seg.uuid).unwrap();
        assert_eq!(loaded.uuid, seg.uuid);

        remove(dir.path(), seg.uuid).unwrap();
        assert!(scan(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn scan_of_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        assert!(scan(&missing).unwrap().is_empty());
    }
}

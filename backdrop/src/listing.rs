use walkdir::WalkDir;

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// One source entry and the output file it maps to. Both share the same file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageEntry {
    pub file_name: OsString,
    pub source: PathBuf,
    pub dest: PathBuf,
}

impl ImageEntry {
    pub fn new(file_name: OsString, image_dir: &Path, out_dir: &Path) -> Self {
        Self {
            source: image_dir.join(&file_name),
            dest: out_dir.join(&file_name),
            file_name,
        }
    }
}

/// List the direct children of `image_dir`, files and directories alike, in whatever
/// order the filesystem hands them out.
pub fn list_entries(image_dir: &Path, out_dir: &Path) -> Result<Vec<ImageEntry>> {
    let list_err = |source: io::Error| Error::ListDir {
        path: image_dir.to_path_buf(),
        source,
    };

    let mut entries = Vec::new();

    for entry in WalkDir::new(image_dir).min_depth(0).max_depth(1) {
        let entry = entry.map_err(|e| list_err(e.into()))?;

        if entry.depth() == 0 {
            if !entry.file_type().is_dir() {
                return Err(list_err(io::Error::other("not a directory")));
            }
            continue;
        }

        entries.push(ImageEntry::new(
            entry.file_name().to_os_string(),
            image_dir,
            out_dir,
        ));
    }

    log::debug!("Found {} entries in {}", entries.len(), image_dir.display());

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    use std::collections::BTreeSet;
    use std::fs;

    #[test]
    fn pairs_each_entry_with_same_named_output() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("in");
        let output = tmp.path().join("out");
        fs::create_dir(&input).unwrap();
        fs::write(input.join("a.png"), b"").unwrap();
        fs::write(input.join("b.jpg"), b"").unwrap();
        fs::create_dir(input.join("nested")).unwrap();
        fs::write(input.join("nested").join("deep.png"), b"").unwrap();

        let entries = list_entries(&input, &output).unwrap();
        let names: BTreeSet<_> = entries
            .iter()
            .map(|e| e.file_name.to_string_lossy().into_owned())
            .collect();

        // depth 1 only; the subdirectory is listed but not descended into
        assert_eq!(
            names,
            BTreeSet::from(["a.png".into(), "b.jpg".into(), "nested".into()])
        );

        for entry in &entries {
            assert_eq!(entry.source, input.join(&entry.file_name));
            assert_eq!(entry.dest, output.join(&entry.file_name));
        }
    }

    #[test]
    fn empty_directory_lists_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let entries = list_entries(tmp.path(), &tmp.path().join("out")).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = list_entries(&tmp.path().join("missing"), tmp.path()).unwrap_err();
        assert!(matches!(err, Error::ListDir { .. }));
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn file_instead_of_directory_is_an_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("a.png");
        fs::write(&file, b"").unwrap();

        let err = list_entries(&file, tmp.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}

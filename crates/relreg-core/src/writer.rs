use std::path::{Path, PathBuf};

use relreg_registry::canonical::is_safe_segment;
use relreg_utils::fs::{recreate_dir, write_atomic};
use serde::Serialize;
use tracing::{debug, trace};

use crate::{error::BuildError, BuildResult};

/// Writes JSON documents below the output root.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    root: PathBuf,
}

impl OutputWriter {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: root.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Deletes any previous output and creates an empty output root.
    ///
    /// Must finish before anything is written.
    pub fn prepare(&self) -> BuildResult<()> {
        debug!(output = %self.root.display(), "recreating output directory");
        recreate_dir(&self.root).map_err(|err| {
            BuildError::OutputRoot {
                path: self.root.clone(),
                source: err,
            }
        })
    }

    /// Absolute path of a relative output path.
    ///
    /// # Errors
    ///
    /// [`BuildError::UnsafePath`] if any `/` separated segment is empty, `.`
    /// or `..`.
    pub fn resolve(&self, relative: &str) -> BuildResult<PathBuf> {
        if !relative.split('/').all(is_safe_segment) {
            return Err(BuildError::UnsafePath(relative.to_string()));
        }
        Ok(self.root.join(relative))
    }

    /// Serializes `value` as compact JSON and writes it to `relative`, creating
    /// parent directories. The file appears under its final name only once it
    /// is complete.
    pub fn write_json<T>(&self, relative: &str, value: &T) -> BuildResult<PathBuf>
    where
        T: Serialize + ?Sized,
    {
        let path = self.resolve(relative)?;
        let bytes = serde_json::to_vec(value).map_err(|err| {
            BuildError::Serialize {
                path: relative.to_string(),
                source: err,
            }
        })?;

        write_atomic(&path, &bytes).map_err(|err| {
            BuildError::Write {
                path: path.clone(),
                source: err,
            }
        })?;

        trace!(path = relative, bytes = bytes.len(), "wrote document");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::BTreeMap, fs};

    use serde_json::json;
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_write_json_is_compact_and_creates_dirs() {
        let dir = tempdir().unwrap();
        let writer = OutputWriter::new(dir.path().join("dist"));
        writer.prepare().unwrap();

        let path = writer
            .write_json("packages/npm/react/latest.json", &json!({"a": [1, 2]}))
            .unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), r#"{"a":[1,2]}"#);

        let leftovers: Vec<_> = fs::read_dir(dir.path().join("dist/packages/npm/react"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn test_prepare_discards_previous_output() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("dist");
        fs::create_dir_all(out.join("stale")).unwrap();
        fs::write(out.join("stale/old.json"), "{}").unwrap();

        let writer = OutputWriter::new(&out);
        writer.prepare().unwrap();
        assert!(out.is_dir());
        assert_eq!(fs::read_dir(&out).unwrap().count(), 0);
    }

    #[test]
    fn test_prepare_fails_when_root_is_a_file() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();

        let writer = OutputWriter::new(blocker.join("dist"));
        assert!(matches!(
            writer.prepare(),
            Err(BuildError::OutputRoot { .. })
        ));
    }

    #[test]
    fn test_rejects_unsafe_paths() {
        let dir = tempdir().unwrap();
        let writer = OutputWriter::new(dir.path());
        for relative in ["../escape.json", "apps//latest.json", "apps/./x.json", ""] {
            assert!(matches!(
                writer.write_json(relative, &json!({})),
                Err(BuildError::UnsafePath(_))
            ));
        }
    }

    #[test]
    fn test_map_keys_are_sorted() {
        let dir = tempdir().unwrap();
        let writer = OutputWriter::new(dir.path());
        let mut summary = BTreeMap::new();
        summary.insert("npm:zod", 1);
        summary.insert("npm:axios", 2);

        let path = writer.write_json("packages.json", &summary).unwrap();
        assert_eq!(
            fs::read_to_string(path).unwrap(),
            r#"{"npm:axios":2,"npm:zod":1}"#
        );
    }
}

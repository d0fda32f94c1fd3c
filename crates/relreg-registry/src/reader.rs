//! Access to the source dataset.
//!
//! [`SourceTree`] knows the on-disk layout of the dataset and reads entity
//! documents from it:
//!
//! ```text
//! <root>/packages/<registry>/<name>/<version>.json
//! <root>/sdks/<sdk-id>/latest.json
//! <root>/apps/<app-id>/<version>.json
//! <root>/aws-lambda-layers/<layer-id>/latest.json
//! <root>/misc/marketing-slugs.json
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
};

use relreg_utils::fs::{list_dir, DirEntryInfo};
use serde_json::{Map, Value};
use tracing::{debug, trace, warn};

use crate::{
    canonical::CanonicalId,
    error::{ErrorContext, RegistryError, Result},
    package::PackageRecord,
    versions::list_versions,
    DEFAULT_NAMESPACE_MARKER, JSON_EXTENSION, LATEST,
};

/// Read-only view of the source dataset rooted at a directory.
#[derive(Debug, Clone)]
pub struct SourceTree {
    root: PathBuf,
    namespace_marker: String,
}

impl SourceTree {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: root.into(),
            namespace_marker: DEFAULT_NAMESPACE_MARKER.to_string(),
        }
    }

    /// Overrides the name of the file that marks a namespace directory.
    pub fn with_namespace_marker<S: Into<String>>(mut self, marker: S) -> Self {
        self.namespace_marker = marker.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn namespace_marker(&self) -> &str {
        &self.namespace_marker
    }

    pub fn packages_dir(&self) -> PathBuf {
        self.root.join("packages")
    }

    pub fn sdks_dir(&self) -> PathBuf {
        self.root.join("sdks")
    }

    pub fn apps_dir(&self) -> PathBuf {
        self.root.join("apps")
    }

    pub fn layers_dir(&self) -> PathBuf {
        self.root.join("aws-lambda-layers")
    }

    pub fn marketing_slugs_file(&self) -> PathBuf {
        self.root.join("misc").join("marketing-slugs.json")
    }

    /// Directory holding the version documents of a package.
    pub fn package_dir(&self, id: &CanonicalId) -> PathBuf {
        self.packages_dir().join(id.relative_dir())
    }

    /// Path of one version document of a package.
    pub fn package_document(&self, id: &CanonicalId, version: &str) -> PathBuf {
        self.package_dir(id).join(format!("{version}{JSON_EXTENSION}"))
    }

    /// Reads a JSON document that must be an object.
    ///
    /// # Errors
    ///
    /// * [`RegistryError::EntityNotFound`] if the file does not exist
    /// * [`RegistryError::EntityRead`] if it cannot be read
    /// * [`RegistryError::EntityParse`] if it is not a JSON object
    pub fn read_document(&self, path: &Path) -> Result<Map<String, Value>> {
        let bytes =
            fs::read(path).map_err(|err| RegistryError::from_read(path.to_path_buf(), err))?;
        serde_json::from_slice(&bytes).map_err(|err| {
            RegistryError::EntityParse {
                path: path.to_path_buf(),
                source: err,
            }
        })
    }

    /// Loads one version of a package, `latest` included.
    ///
    /// A `latest` document without a `version` takes the highest listed
    /// version of the package, if there is one.
    pub fn load_package(&self, id: &CanonicalId, version: &str) -> Result<PackageRecord> {
        let path = self.package_document(id, version);
        trace!(canonical = %id, version, "loading package document");
        let document = self.read_document(&path)?;
        let mut record = PackageRecord::from_document(document, id, version);

        if record.version.is_empty() && version == LATEST {
            match self.package_versions(id) {
                Ok(versions) => {
                    if let Some(highest) = versions.last() {
                        record.version = highest.clone();
                    }
                }
                Err(err) => debug!(canonical = %id, "cannot list versions: {err}"),
            }
        }

        Ok(record)
    }

    /// Sorted version labels of a package, `latest` excluded.
    pub fn package_versions(&self, id: &CanonicalId) -> Result<Vec<String>> {
        list_versions(&self.package_dir(id))
    }

    /// Reads `<dir>/<version>.json` of an entity verbatim.
    pub fn load_raw(&self, dir: &Path, version: &str) -> Result<Map<String, Value>> {
        self.read_document(&dir.join(format!("{version}{JSON_EXTENSION}")))
    }

    /// Lists the entries of a domain directory such as `sdks/` or `apps/`.
    ///
    /// Symlinks are followed, so a link to a directory is reported as a directory.
    ///
    /// # Errors
    ///
    /// [`RegistryError::DirectoryUnreadable`] when the directory cannot be listed.
    pub fn entity_dirs(&self, dir: &Path) -> Result<Vec<DirEntryInfo>> {
        list_dir(dir).map_err(|err| {
            RegistryError::DirectoryUnreadable {
                path: dir.to_path_buf(),
                source: err,
            }
        })
    }

    /// Enumerates the canonical ids of every package.
    ///
    /// Each directory below `packages/<registry>/` is a package, unless it
    /// contains the namespace marker. A namespace is expanded exactly one level:
    /// its child directories become `registry:namespace/child` and the namespace
    /// itself is never returned.
    ///
    /// # Errors
    ///
    /// Only an unreadable `packages/` directory is an error. Registry, package
    /// or namespace directories that cannot be inspected, and directory names
    /// that do not form a valid canonical id, are returned in
    /// [`Discovery::skipped`].
    pub fn discover_packages(&self) -> Result<Discovery> {
        let packages_dir = self.packages_dir();
        let registries = self.entity_dirs(&packages_dir)?;

        let mut discovery = Discovery::default();
        for registry in registries.iter().filter(|e| e.is_dir()) {
            let items = match self.entity_dirs(&registry.path) {
                Ok(items) => items,
                Err(err) => {
                    discovery.skip(registry.name.clone(), err);
                    continue;
                }
            };

            for item in items.iter().filter(|e| e.is_dir()) {
                let raw = format!("{}:{}", registry.name, item.name);
                let is_namespace = match self.is_namespace(&item.path) {
                    Ok(flag) => flag,
                    Err(err) => {
                        discovery.skip(raw, err);
                        continue;
                    }
                };

                if !is_namespace {
                    discovery.push(&raw);
                    continue;
                }

                let children = match self.entity_dirs(&item.path) {
                    Ok(children) => children,
                    Err(err) => {
                        discovery.skip(raw, err);
                        continue;
                    }
                };

                for child in children
                    .iter()
                    .filter(|e| e.is_dir() && e.name != self.namespace_marker)
                {
                    discovery.push(&format!("{raw}/{}", child.name));
                }
            }
        }

        debug!(
            count = discovery.ids.len(),
            skipped = discovery.skipped.len(),
            "discovered packages"
        );
        Ok(discovery)
    }

    fn is_namespace(&self, dir: &Path) -> Result<bool> {
        let marker = dir.join(&self.namespace_marker);
        match fs::metadata(&marker) {
            Ok(_) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => {
                Err(err).with_context(|| format!("checking namespace marker {}", marker.display()))
            }
        }
    }
}

/// Packages found below `packages/`.
#[derive(Debug, Default)]
pub struct Discovery {
    pub ids: Vec<CanonicalId>,
    /// Directories that could not be turned into a package, with the reason.
    pub skipped: Vec<(String, RegistryError)>,
}

impl Discovery {
    fn push(&mut self, raw: &str) {
        match CanonicalId::parse(raw) {
            Ok(id) => self.ids.push(id),
            Err(err) => self.skip(raw.to_string(), err),
        }
    }

    fn skip(&mut self, id: String, err: RegistryError) {
        warn!(id = %id, "skipping package directory: {err}");
        self.skipped.push((id, err));
    }
}

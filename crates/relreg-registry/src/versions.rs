//! Version listing and ordering.
//!
//! Labels are compared as semantic versions. Labels with only one or two
//! numeric components (`2`, `1.4`) are padded with `.0` before parsing. Labels
//! that still do not parse order before every semantic version and
//! lexicographically among themselves. Labels with equal precedence (for
//! example differing only in build metadata) are ordered by their text, so the
//! order is total and stable across runs.

use std::{cmp::Ordering, path::Path};

use relreg_utils::fs::list_dir;
use semver::Version;
use tracing::trace;

use crate::{
    error::{RegistryError, Result},
    JSON_EXTENSION, LATEST,
};

/// Parses a version label, accepting the `MAJOR` and `MAJOR.MINOR` shorthands.
pub fn parse_version(label: &str) -> Option<Version> {
    if let Ok(version) = Version::parse(label) {
        return Some(version);
    }

    let split = label.find(['-', '+']).unwrap_or(label.len());
    let (core, rest) = label.split_at(split);
    let parts: Vec<&str> = core.split('.').collect();
    if parts.len() > 2
        || parts
            .iter()
            .any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()))
    {
        return None;
    }

    let padding = ".0".repeat(3 - parts.len());
    Version::parse(&format!("{core}{padding}{rest}")).ok()
}

/// Total order over version labels.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    match (parse_version(a), parse_version(b)) {
        (Some(va), Some(vb)) => va.cmp_precedence(&vb).then_with(|| a.cmp(b)),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Sorts labels ascending by [`compare_versions`].
pub fn sort_versions(versions: &mut [String]) {
    versions.sort_by(|a, b| compare_versions(a, b));
}

/// Lists the version labels of the entity stored in `dir`.
///
/// Only regular files directly inside `dir` with the `.json` extension count;
/// `latest.json` is excluded. An existing directory without versions yields an
/// empty list.
///
/// # Errors
///
/// [`RegistryError::DirectoryUnreadable`] when `dir` cannot be listed.
pub fn list_versions(dir: &Path) -> Result<Vec<String>> {
    let entries = list_dir(dir).map_err(|err| {
        RegistryError::DirectoryUnreadable {
            path: dir.to_path_buf(),
            source: err,
        }
    })?;

    let mut versions: Vec<String> = entries
        .into_iter()
        .filter(|entry| entry.is_file())
        .filter_map(|entry| {
            entry
                .name
                .strip_suffix(JSON_EXTENSION)
                .filter(|label| !label.is_empty() && *label != LATEST)
                .map(str::to_string)
        })
        .collect();

    sort_versions(&mut versions);
    trace!(dir = %dir.display(), count = versions.len(), "listed versions");
    Ok(versions)
}

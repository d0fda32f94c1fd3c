//! Canonical package identifiers.
//!
//! A canonical id is `registry:path`. Only the first colon separates the
//! registry; any further colon inside the path is a registry specific
//! separator and is treated like `/`.

use std::{fmt, path::PathBuf, str::FromStr};

use crate::error::{RegistryError, Result};

/// Parsed `registry:path` identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalId {
    raw: String,
    registry: String,
    path: String,
}

impl CanonicalId {
    /// Parses a canonical id.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::MalformedCanonical`] when the separator is
    /// missing, either side is empty, or the path contains empty, `.` or `..`
    /// segments.
    pub fn parse(canonical: &str) -> Result<Self> {
        let malformed = |reason| {
            RegistryError::MalformedCanonical {
                canonical: canonical.to_string(),
                reason,
            }
        };

        let (registry, rest) = canonical
            .split_once(':')
            .ok_or_else(|| malformed("missing ':' separator"))?;

        if !is_safe_segment(registry) || registry.contains(['/', '\\']) {
            return Err(malformed("invalid registry name"));
        }
        if rest.is_empty() {
            return Err(malformed("empty package path"));
        }

        let path = rest.replace(':', "/");
        if !path.split('/').all(is_safe_segment) {
            return Err(malformed("invalid path segment"));
        }

        Ok(Self {
            raw: canonical.to_string(),
            registry: registry.to_string(),
            path,
        })
    }

    /// Registry part, e.g. `npm`.
    pub fn registry(&self) -> &str {
        &self.registry
    }

    /// Path part with registry separators normalized to `/`, e.g. `@sentry/react`.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The id exactly as it was given.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Path segments below the registry.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.path.split('/')
    }

    /// Directory of this package relative to a `packages/` tree.
    pub fn relative_dir(&self) -> PathBuf {
        let mut dir = PathBuf::from(&self.registry);
        dir.extend(self.segments());
        dir
    }

    /// `registry/path`, the form used for output paths and URLs.
    pub fn url_path(&self) -> String {
        format!("{}/{}", self.registry, self.path)
    }
}

/// Returns `true` for a single path component that stays inside its parent.
pub fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty() && segment != "." && segment != ".." && !segment.contains('\\')
}

impl FromStr for CanonicalId {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for CanonicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn test_parse_simple() {
        let id = CanonicalId::parse("npm:react").unwrap();
        assert_eq!(id.registry(), "npm");
        assert_eq!(id.path(), "react");
        assert_eq!(id.relative_dir(), Path::new("npm/react"));
        assert_eq!(id.to_string(), "npm:react");
    }

    #[test]
    fn test_parse_scoped() {
        let id: CanonicalId = "npm:@sentry/react".parse().unwrap();
        assert_eq!(id.registry(), "npm");
        assert_eq!(id.segments().collect::<Vec<_>>(), vec!["@sentry", "react"]);
        assert_eq!(id.relative_dir(), Path::new("npm/@sentry/react"));
        assert_eq!(id.url_path(), "npm/@sentry/react");
    }

    #[test]
    fn test_extra_colons_become_separators() {
        let id = CanonicalId::parse("maven:io.sentry:sentry").unwrap();
        assert_eq!(id.registry(), "maven");
        assert_eq!(id.path(), "io.sentry/sentry");
        assert_eq!(id.relative_dir(), Path::new("maven/io.sentry/sentry"));
        assert_eq!(id.as_str(), "maven:io.sentry:sentry");
    }

    #[test]
    fn test_relative_dir_round_trips() {
        for raw in ["npm:react", "npm:@scope/a", "pypi:sentry-sdk", "github:getsentry/relay"] {
            let id = CanonicalId::parse(raw).unwrap();
            let mut components = id
                .relative_dir()
                .iter()
                .map(|c| c.to_string_lossy().into_owned())
                .collect::<Vec<_>>();
            let registry = components.remove(0);
            assert_eq!(format!("{}:{}", registry, components.join("/")), raw);
        }
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for raw in [
            "react",
            ":react",
            "npm:",
            "npm:a//b",
            "npm:../etc",
            "npm:a/./b",
            "np/m:react",
            "npm:a\\b",
        ] {
            assert!(
                matches!(
                    CanonicalId::parse(raw),
                    Err(RegistryError::MalformedCanonical { .. })
                ),
                "{raw} should be rejected"
            );
        }
    }
}

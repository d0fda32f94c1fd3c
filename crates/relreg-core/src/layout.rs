//! Layout of the generated output tree.
//!
//! ```text
//! packages.json                          { canonical: PackageRecord }
//! packages/<registry>/<name>/latest.json
//! packages/<registry>/<name>/versions.json
//! packages/<registry>/<name>/<version>.json
//! sdks.json, sdks/<sdk-id>/{latest,versions,<version>}.json
//! apps.json, apps/<app-id>/{latest,<version>}.json
//! aws-lambda-layers.json                 { canonical: layer }
//! marketing-slugs.json                   { "slugs": [...] }
//! marketing-slugs/<slug>.json            { definition, target }
//! ```
//!
//! The build writes these paths and the server resolves request paths to
//! them, so both go through the helpers here.

use relreg_events::Domain;
use relreg_registry::{CanonicalId, JSON_EXTENSION};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use relreg_registry::LATEST;

/// File stem of the versions listing of an entity.
pub const VERSIONS: &str = "versions";

/// Path of a domain's summary file, e.g. `packages.json`.
pub fn summary_path(domain: Domain) -> String {
    format!("{}{JSON_EXTENSION}", domain.as_str())
}

/// Directory of a package's documents.
pub fn package_dir(id: &CanonicalId) -> String {
    format!("{}/{}", Domain::Packages.as_str(), id.url_path())
}

/// `packages/<registry>/<path>/<label>.json`.
pub fn package_document(id: &CanonicalId, label: &str) -> String {
    format!("{}/{label}{JSON_EXTENSION}", package_dir(id))
}

/// `<domain>/<id>/<label>.json` for domains keyed by a plain id.
pub fn entity_document(domain: Domain, id: &str, label: &str) -> String {
    format!("{}/{id}/{label}{JSON_EXTENSION}", domain.as_str())
}

/// `marketing-slugs/<slug>.json`.
pub fn slug_document(slug: &str) -> String {
    format!("{}/{slug}{JSON_EXTENSION}", Domain::MarketingSlugs.as_str())
}

/// Body of `versions.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionsDocument<T> {
    pub latest: Option<T>,
    pub versions: Vec<String>,
}

/// Body of `marketing-slugs.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlugIndex {
    pub slugs: Vec<String>,
}

/// Body of `marketing-slugs/<slug>.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlugDocument {
    pub definition: Map<String, Value>,
    pub target: Value,
}

impl SlugDocument {
    /// `target` is copied out of the definition; it is `null` when missing.
    pub fn new(definition: Map<String, Value>) -> Self {
        let target = definition.get("target").cloned().unwrap_or(Value::Null);
        Self {
            definition,
            target,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_paths() {
        let id = CanonicalId::parse("npm:@sentry/react").unwrap();
        assert_eq!(summary_path(Domain::AwsLambdaLayers), "aws-lambda-layers.json");
        assert_eq!(
            package_document(&id, LATEST),
            "packages/npm/@sentry/react/latest.json"
        );
        assert_eq!(
            package_document(&id, VERSIONS),
            "packages/npm/@sentry/react/versions.json"
        );
        assert_eq!(
            entity_document(Domain::Sdks, "sentry.python", "1.0.0"),
            "sdks/sentry.python/1.0.0.json"
        );
        assert_eq!(slug_document("react"), "marketing-slugs/react.json");
    }

    #[test]
    fn test_slug_document() {
        let definition = match json!({"target": "npm:react"}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        assert_eq!(
            serde_json::to_string(&SlugDocument::new(definition)).unwrap(),
            r#"{"definition":{"target":"npm:react"},"target":"npm:react"}"#
        );

        let doc = SlugDocument::new(Map::new());
        assert_eq!(doc.target, Value::Null);
    }

    #[test]
    fn test_versions_document_without_latest() {
        let doc: VersionsDocument<Value> = VersionsDocument {
            latest: None,
            versions: vec!["1.0.0".to_string()],
        };
        assert_eq!(
            serde_json::to_string(&doc).unwrap(),
            r#"{"latest":null,"versions":["1.0.0"]}"#
        );
    }
}

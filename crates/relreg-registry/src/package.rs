//! Package records extracted from version documents.
//!
//! Source documents are loosely typed. Every known field is extracted
//! defensively: a missing, empty or wrong-typed value is treated as absent and
//! never fails the whole document.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::canonical::CanonicalId;

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) if !s.is_empty() => Some(s),
        _ => None,
    })
}

fn lenient_required_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_string(deserializer).map(Option::unwrap_or_default)
}

fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => {
            items
                .into_iter()
                .filter_map(|item| {
                    match item {
                        Value::String(s) => Some(s),
                        _ => None,
                    }
                })
                .collect()
        }
        _ => Vec::new(),
    })
}

fn object_map<'de, D>(deserializer: D) -> Result<Option<Map<String, Value>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Object(map) if !map.is_empty() => Some(map),
        _ => None,
    })
}

/// Normalized view of one package version.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct PackageRecord {
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "lenient_required_string")]
    pub canonical: String,

    #[serde(
        default,
        deserialize_with = "lenient_required_string",
        skip_serializing_if = "String::is_empty"
    )]
    pub version: String,

    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub package_url: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub repo_url: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub main_docs_url: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub api_docs_url: Option<String>,

    #[serde(
        default,
        deserialize_with = "string_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub categories: Vec<String>,

    #[serde(
        default,
        deserialize_with = "object_map",
        skip_serializing_if = "Option::is_none"
    )]
    pub features: Option<Map<String, Value>>,

    /// Set on records published under `sdks/`.
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub sdk_id: Option<String>,
}

impl PackageRecord {
    /// Extracts a record from a parsed document.
    ///
    /// `requested` and `label` describe where the document was found. They fill
    /// `canonical` and `version` when the document does not carry them.
    pub fn from_document(document: Map<String, Value>, requested: &CanonicalId, label: &str) -> Self {
        // Every field is lenient, so deserializing an object cannot fail.
        let mut record: PackageRecord =
            serde_json::from_value(Value::Object(document)).unwrap_or_default();
        record.fill_missing(requested, label);
        record
    }

    pub(crate) fn fill_missing(&mut self, requested: &CanonicalId, label: &str) {
        if self.canonical.is_empty() {
            self.canonical = requested.as_str().to_string();
        }
        if self.version.is_empty() && label != crate::LATEST {
            self.version = label.to_string();
        }
    }

    /// Returns a copy tagged with the id of the SDK that points at this package.
    pub fn tagged_for_sdk(&self, sdk_id: &str) -> Self {
        Self {
            sdk_id: Some(sdk_id.to_string()),
            ..self.clone()
        }
    }
}

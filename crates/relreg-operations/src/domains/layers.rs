use std::collections::BTreeMap;

use relreg_core::{
    layout::{summary_path, LATEST},
    BuildResult,
};
use relreg_events::{BuildEvent, Domain};
use serde_json::{Map, Value};
use tracing::warn;

use crate::{context::BuildContext, types::DomainReport};

const DOMAIN: Domain = Domain::AwsLambdaLayers;

/// Generates `aws-lambda-layers.json`, keyed by each layer's own `canonical`.
///
/// Layers have no per-entity documents.
pub fn generate(ctx: &BuildContext) -> BuildResult<DomainReport> {
    let entries = ctx.source().entity_dirs(&ctx.source().layers_dir())?;
    let entries: Vec<_> = entries.into_iter().filter(|e| e.is_dir()).collect();
    ctx.emit(BuildEvent::DomainDiscovered {
        domain: DOMAIN,
        total: entries.len(),
    });

    let loaded: Vec<Option<(String, Map<String, Value>)>> = ctx.map_entities(&entries, |entry| {
        let document = match ctx.source().load_raw(&entry.path, LATEST) {
            Ok(document) => document,
            Err(err) => {
                ctx.skip(DOMAIN, &entry.name, err);
                return None;
            }
        };

        match document.get("canonical") {
            Some(Value::String(canonical)) if !canonical.is_empty() => {
                Some((canonical.clone(), document))
            }
            _ => {
                ctx.skip(DOMAIN, &entry.name, "layer document has no canonical");
                None
            }
        }
    });

    let mut report = DomainReport::new(DOMAIN);
    let mut summary: BTreeMap<String, Map<String, Value>> = BTreeMap::new();
    for (entry, layer) in entries.iter().zip(loaded) {
        let Some((canonical, document)) = layer else {
            report.skipped += 1;
            continue;
        };
        if summary.contains_key(&canonical) {
            warn!(
                layer = %entry.name,
                canonical = %canonical,
                "duplicate layer canonical, keeping the last one"
            );
        }
        summary.insert(canonical, document);
    }

    ctx.writer().write_json(&summary_path(DOMAIN), &summary)?;
    report.written = summary.len();
    for canonical in summary.keys() {
        ctx.written(DOMAIN, canonical);
    }

    Ok(report)
}

use std::collections::BTreeMap;

use relreg_core::{
    layout::{entity_document, summary_path, LATEST},
    BuildResult,
};
use relreg_events::{BuildEvent, Domain};
use relreg_registry::list_versions;
use relreg_utils::fs::DirEntryInfo;
use serde_json::{Map, Value};
use tracing::{trace, warn};

use crate::{
    context::BuildContext,
    types::{DomainReport, EntityOutcome},
};

const DOMAIN: Domain = Domain::Apps;

/// Generates `apps.json` and the documents of every app.
///
/// App documents are passed through unchanged.
pub fn generate(ctx: &BuildContext) -> BuildResult<DomainReport> {
    let entries: Vec<DirEntryInfo> = ctx
        .source()
        .entity_dirs(&ctx.source().apps_dir())?
        .into_iter()
        .filter(|entry| {
            if !entry.is_dir() {
                trace!(name = %entry.name, "ignoring non-directory in apps");
            }
            entry.is_dir()
        })
        .collect();
    ctx.emit(BuildEvent::DomainDiscovered {
        domain: DOMAIN,
        total: entries.len(),
    });

    let loaded: Vec<Option<(DirEntryInfo, Map<String, Value>)>> =
        ctx.map_entities(&entries, |entry| {
            match ctx.source().load_raw(&entry.path, LATEST) {
                Ok(document) => Some((entry.clone(), document)),
                Err(err) => {
                    ctx.skip(DOMAIN, &entry.name, err);
                    None
                }
            }
        });
    let load_failures = loaded.iter().filter(|app| app.is_none()).count();
    let apps: Vec<(DirEntryInfo, Map<String, Value>)> = loaded.into_iter().flatten().collect();

    let summary: BTreeMap<&str, &Map<String, Value>> = apps
        .iter()
        .map(|(entry, document)| (entry.name.as_str(), document))
        .collect();
    ctx.writer().write_json(&summary_path(DOMAIN), &summary)?;

    let outcomes = ctx.map_entities(&apps, |(entry, latest)| {
        match write_app(ctx, entry, latest) {
            Ok(()) => {
                ctx.written(DOMAIN, &entry.name);
                EntityOutcome::Written
            }
            Err(err) => {
                ctx.skip(DOMAIN, &entry.name, err);
                EntityOutcome::Skipped
            }
        }
    });

    let mut report = DomainReport::new(DOMAIN).tally(outcomes);
    report.skipped += load_failures;
    Ok(report)
}

fn write_app(
    ctx: &BuildContext,
    entry: &DirEntryInfo,
    latest: &Map<String, Value>,
) -> BuildResult<()> {
    let app_id = entry.name.as_str();
    ctx.writer()
        .write_json(&entity_document(DOMAIN, app_id, LATEST), latest)?;

    for version in list_versions(&entry.path)? {
        let document = match ctx.source().load_raw(&entry.path, &version) {
            Ok(document) => document,
            Err(err) => {
                warn!(app = app_id, version = %version, "skipping version: {err}");
                continue;
            }
        };

        if let Err(err) = ctx
            .writer()
            .write_json(&entity_document(DOMAIN, app_id, &version), &document)
        {
            warn!(app = app_id, version = %version, "skipping version: {err}");
        }
    }

    Ok(())
}

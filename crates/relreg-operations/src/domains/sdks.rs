use std::collections::BTreeMap;

use relreg_core::{
    layout::{entity_document, summary_path, LATEST},
    BuildResult,
};
use relreg_events::{BuildEvent, Domain};
use relreg_registry::{CanonicalId, PackageRecord};
use relreg_utils::fs::DirEntryInfo;
use serde_json::Value;

use super::write_version_tree;
use crate::{
    context::BuildContext,
    types::{DomainReport, EntityOutcome},
};

const DOMAIN: Domain = Domain::Sdks;

/// An SDK resolved through its pointer document.
struct ResolvedSdk {
    sdk_id: String,
    canonical: CanonicalId,
    record: PackageRecord,
}

/// Generates `sdks.json` and the documents of every SDK.
///
/// Each SDK directory holds a `latest.json` pointer whose `canonical` names the
/// package the SDK is published as. Symlinked SDK directories are followed.
pub fn generate(ctx: &BuildContext) -> BuildResult<DomainReport> {
    let entries = ctx.source().entity_dirs(&ctx.source().sdks_dir())?;
    ctx.emit(BuildEvent::DomainDiscovered {
        domain: DOMAIN,
        total: entries.len(),
    });

    let resolved: Vec<Option<ResolvedSdk>> = ctx.map_entities(&entries, |entry| {
        match resolve(ctx, entry) {
            Ok(sdk) => Some(sdk),
            Err(reason) => {
                ctx.skip(DOMAIN, &entry.name, reason);
                None
            }
        }
    });
    let resolve_failures = resolved.iter().filter(|sdk| sdk.is_none()).count();
    let sdks: Vec<ResolvedSdk> = resolved.into_iter().flatten().collect();

    let summary: BTreeMap<&str, &PackageRecord> = sdks
        .iter()
        .map(|sdk| (sdk.sdk_id.as_str(), &sdk.record))
        .collect();
    ctx.writer().write_json(&summary_path(DOMAIN), &summary)?;

    let outcomes = ctx.map_entities(&sdks, |sdk| {
        let result = write_version_tree(
            ctx,
            DOMAIN,
            &sdk.canonical,
            &sdk.record,
            Some(sdk.sdk_id.as_str()),
            |label| entity_document(DOMAIN, &sdk.sdk_id, label),
        );
        match result {
            Ok(()) => {
                ctx.written(DOMAIN, &sdk.sdk_id);
                EntityOutcome::Written
            }
            Err(err) => {
                ctx.skip(DOMAIN, &sdk.sdk_id, err);
                EntityOutcome::Skipped
            }
        }
    });

    let mut report = DomainReport::new(DOMAIN).tally(outcomes);
    report.skipped += resolve_failures;
    Ok(report)
}

fn resolve(ctx: &BuildContext, entry: &DirEntryInfo) -> Result<ResolvedSdk, String> {
    if !entry.is_dir() {
        return Err("not a directory".to_string());
    }

    let pointer = ctx
        .source()
        .load_raw(&entry.path, LATEST)
        .map_err(|err| err.to_string())?;

    let canonical = match pointer.get("canonical") {
        Some(Value::String(canonical)) => canonical,
        _ => return Err("pointer document has no canonical".to_string()),
    };
    let canonical = CanonicalId::parse(canonical).map_err(|err| err.to_string())?;

    let latest = ctx
        .load_package(&canonical, LATEST)
        .map_err(|err| format!("{canonical}: {err}"))?;

    Ok(ResolvedSdk {
        record: latest.tagged_for_sdk(&entry.name),
        sdk_id: entry.name.clone(),
        canonical,
    })
}

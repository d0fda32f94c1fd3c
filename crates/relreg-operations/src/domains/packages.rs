use std::{collections::BTreeMap, sync::Arc};

use relreg_core::{
    layout::{package_document, summary_path, LATEST},
    BuildResult,
};
use relreg_events::{BuildEvent, Domain};
use relreg_registry::{CanonicalId, PackageRecord};
use tracing::debug;

use super::write_version_tree;
use crate::{
    context::BuildContext,
    types::{DomainReport, EntityOutcome},
};

const DOMAIN: Domain = Domain::Packages;

/// Generates `packages.json` and the documents of every package.
pub fn generate(ctx: &BuildContext) -> BuildResult<DomainReport> {
    let discovery = ctx.source().discover_packages()?;
    ctx.emit(BuildEvent::DomainDiscovered {
        domain: DOMAIN,
        total: discovery.ids.len() + discovery.skipped.len(),
    });
    for (id, err) in &discovery.skipped {
        ctx.skip(DOMAIN, id, err);
    }
    let ids = discovery.ids;

    let loaded: Vec<Option<(CanonicalId, Arc<PackageRecord>)>> = ctx.map_entities(&ids, |id| {
        match ctx.load_package(id, LATEST) {
            Ok(record) => Some((id.clone(), record)),
            Err(err) => {
                ctx.skip(DOMAIN, id.as_str(), &err);
                None
            }
        }
    });
    let load_failures = loaded.iter().filter(|entry| entry.is_none()).count();
    let packages: Vec<(CanonicalId, Arc<PackageRecord>)> = loaded.into_iter().flatten().collect();

    let summary: BTreeMap<&str, &PackageRecord> = packages
        .iter()
        .map(|(id, record)| (id.as_str(), record.as_ref()))
        .collect();
    ctx.writer().write_json(&summary_path(DOMAIN), &summary)?;
    debug!(count = summary.len(), "wrote package summary");

    let outcomes = ctx.map_entities(&packages, |(id, latest)| {
        match write_version_tree(ctx, DOMAIN, id, latest, None, |label| {
            package_document(id, label)
        }) {
            Ok(()) => {
                ctx.written(DOMAIN, id.as_str());
                EntityOutcome::Written
            }
            Err(err) => {
                ctx.skip(DOMAIN, id.as_str(), &err);
                EntityOutcome::Skipped
            }
        }
    });

    let mut report = DomainReport::new(DOMAIN).tally(outcomes);
    report.skipped += load_failures + discovery.skipped.len();
    Ok(report)
}

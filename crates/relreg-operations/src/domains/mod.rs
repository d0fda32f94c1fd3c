//! The five domain aggregators.
//!
//! Each aggregator reads its part of the source tree, writes its summary file
//! and then the per-entity documents. An error returned from an aggregator is
//! domain-level and fails the build; entity-level errors are reported through
//! [`BuildContext::skip`] and counted.

pub mod apps;
pub mod layers;
pub mod marketing;
pub mod packages;
pub mod sdks;

use relreg_core::{
    layout::{VersionsDocument, LATEST, VERSIONS},
    BuildResult,
};
use relreg_events::Domain;
use relreg_registry::{CanonicalId, PackageRecord};
use tracing::warn;

use crate::{context::BuildContext, types::DomainReport};

/// Runs the aggregator of `domain`.
pub fn generate(ctx: &BuildContext, domain: Domain) -> BuildResult<DomainReport> {
    match domain {
        Domain::Packages => packages::generate(ctx),
        Domain::Sdks => sdks::generate(ctx),
        Domain::Apps => apps::generate(ctx),
        Domain::AwsLambdaLayers => layers::generate(ctx),
        Domain::MarketingSlugs => marketing::generate(ctx),
    }
}

/// Writes `latest.json`, `versions.json` and one file per version of a package.
///
/// `path_for` maps a label to an output path. `sdk_id` tags every written
/// record. Failing to write `latest.json` or `versions.json`, or to list the
/// versions, is an error for the entity; a single version that cannot be read
/// or written is only logged.
pub(crate) fn write_version_tree<P>(
    ctx: &BuildContext,
    domain: Domain,
    id: &CanonicalId,
    latest: &PackageRecord,
    sdk_id: Option<&str>,
    path_for: P,
) -> BuildResult<()>
where
    P: Fn(&str) -> String,
{
    let tag = |record: &PackageRecord| {
        match sdk_id {
            Some(sdk_id) => record.tagged_for_sdk(sdk_id),
            None => record.clone(),
        }
    };

    let latest = tag(latest);
    ctx.writer().write_json(&path_for(LATEST), &latest)?;

    let versions = ctx.source().package_versions(id)?;
    for version in &versions {
        let record = match ctx.load_package(id, version) {
            Ok(record) => tag(&record),
            Err(err) => {
                warn!(
                    domain = %domain,
                    canonical = %id,
                    version = %version,
                    "skipping version: {err}"
                );
                continue;
            }
        };

        if let Err(err) = ctx.writer().write_json(&path_for(version), &record) {
            warn!(
                domain = %domain,
                canonical = %id,
                version = %version,
                "skipping version: {err}"
            );
        }
    }

    let listing = VersionsDocument {
        latest: Some(latest),
        versions,
    };
    ctx.writer().write_json(&path_for(VERSIONS), &listing)?;

    Ok(())
}

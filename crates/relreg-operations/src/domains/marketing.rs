use relreg_core::{
    layout::{slug_document, summary_path, SlugDocument, SlugIndex},
    BuildResult,
};
use relreg_events::{BuildEvent, Domain};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::{
    context::BuildContext,
    types::{DomainReport, EntityOutcome},
};

const DOMAIN: Domain = Domain::MarketingSlugs;

/// Keys of the slug file that hold metadata rather than slugs.
pub const RESERVED_SLUG_KEYS: &[&str] = &["createdAt"];

/// Generates `marketing-slugs.json` and one document per slug.
///
/// Only entries whose value is an object are slugs. Reserved keys and any
/// other non-object entries are metadata and appear nowhere in the output.
/// An empty key has no file name and is dropped.
pub fn generate(ctx: &BuildContext) -> BuildResult<DomainReport> {
    let document = ctx
        .source()
        .read_document(&ctx.source().marketing_slugs_file())?;

    let slugs = collect_slugs(document);
    ctx.emit(BuildEvent::DomainDiscovered {
        domain: DOMAIN,
        total: slugs.len(),
    });

    let index = SlugIndex {
        slugs: slugs.iter().map(|(slug, _)| slug.clone()).collect(),
    };
    ctx.writer().write_json(&summary_path(DOMAIN), &index)?;

    let outcomes = ctx.map_entities(&slugs, |(slug, definition)| {
        let body = SlugDocument::new(definition.clone());
        match ctx.writer().write_json(&slug_document(slug), &body) {
            Ok(_) => {
                ctx.written(DOMAIN, slug);
                EntityOutcome::Written
            }
            Err(err) => {
                ctx.skip(DOMAIN, slug, err);
                EntityOutcome::Skipped
            }
        }
    });

    Ok(DomainReport::new(DOMAIN).tally(outcomes))
}

/// Slug definitions sorted by slug name.
fn collect_slugs(document: Map<String, Value>) -> Vec<(String, Map<String, Value>)> {
    let mut slugs: Vec<(String, Map<String, Value>)> = document
        .into_iter()
        .filter_map(|(key, value)| {
            if RESERVED_SLUG_KEYS.contains(&key.as_str()) {
                debug!(key = %key, "ignoring reserved slug key");
                return None;
            }
            if key.is_empty() {
                warn!("ignoring slug with an empty name");
                return None;
            }
            match value {
                Value::Object(definition) => Some((key, definition)),
                _ => {
                    debug!(key = %key, "ignoring non-object slug entry");
                    None
                }
            }
        })
        .collect();
    slugs.sort_by(|a, b| a.0.cmp(&b.0));
    slugs
}

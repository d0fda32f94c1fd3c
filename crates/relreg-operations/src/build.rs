use std::time::Instant;

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use relreg_core::BuildResult;
use relreg_events::{BuildEvent, Domain, EventSinkHandle};
use tracing::{debug, error, info};

use crate::{
    context::{BuildContext, BuildOptions},
    domains,
    types::{BuildReport, DomainReport},
};

/// Runs a full build with `options`, reporting progress to `events`.
pub fn build(options: BuildOptions, events: EventSinkHandle) -> BuildResult<BuildReport> {
    let ctx = match BuildContext::new(options, events.clone()) {
        Ok(ctx) => ctx,
        Err(err) => {
            events.emit(BuildEvent::BuildFailed {
                error: err.to_string(),
            });
            return Err(err);
        }
    };
    run(&ctx)
}

/// Recreates the output directory, then runs every domain aggregator.
///
/// In parallel mode the domains run concurrently. Every domain runs to
/// completion even when another one fails; the first failure in
/// [`Domain::ALL`] order is returned and output already written by the other
/// domains stays on disk.
pub fn run(ctx: &BuildContext) -> BuildResult<BuildReport> {
    let start = Instant::now();
    let options = ctx.options();
    info!(
        root = %options.root.display(),
        output = %options.output.display(),
        "Starting registry build"
    );

    if let Err(err) = ctx.writer().prepare() {
        ctx.emit(BuildEvent::BuildFailed {
            error: err.to_string(),
        });
        return Err(err);
    }

    ctx.emit(BuildEvent::BuildStarted {
        parallel: options.parallel,
        max_workers: options.max_workers,
    });

    let results: Vec<BuildResult<DomainReport>> = match ctx.pool() {
        Some(pool) => {
            pool.install(|| {
                Domain::ALL
                    .par_iter()
                    .map(|domain| run_domain(ctx, *domain))
                    .collect()
            })
        }
        None => {
            Domain::ALL
                .iter()
                .map(|domain| run_domain(ctx, *domain))
                .collect()
        }
    };

    let mut domains = Vec::with_capacity(results.len());
    for result in results {
        match result {
            Ok(report) => domains.push(report),
            Err(err) => {
                ctx.emit(BuildEvent::BuildFailed {
                    error: err.to_string(),
                });
                return Err(err);
            }
        }
    }

    let report = BuildReport {
        duration: start.elapsed(),
        domains,
    };
    ctx.emit(BuildEvent::BuildComplete {
        duration: report.duration,
    });
    debug!(cached_packages = ctx.cache().len(), "build finished");

    Ok(report)
}

fn run_domain(ctx: &BuildContext, domain: Domain) -> BuildResult<DomainReport> {
    info!("Generating {}...", domain.label());
    ctx.emit(BuildEvent::DomainStarted {
        domain,
    });

    match domains::generate(ctx, domain) {
        Ok(report) => {
            debug!(
                domain = %domain,
                written = report.written,
                skipped = report.skipped,
                "domain complete"
            );
            ctx.emit(BuildEvent::DomainComplete {
                domain,
                written: report.written,
                skipped: report.skipped,
            });
            Ok(report)
        }
        Err(err) => {
            error!(domain = %domain, "{err}");
            ctx.emit(BuildEvent::DomainFailed {
                domain,
                error: err.to_string(),
            });
            Err(err.in_domain(domain))
        }
    }
}

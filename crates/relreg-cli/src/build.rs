use std::sync::Arc;

use relreg_core::BuildResult;
use relreg_events::{ChannelSink, EventSinkHandle, NullSink};
use relreg_operations::{BuildOptions, BuildReport};
use tracing::{info, warn};

use crate::{
    progress::{self, spawn_event_handler},
    utils::progress_enabled,
};

/// Runs one build with the progress display attached and logs its summary.
pub fn run_build(options: BuildOptions) -> BuildResult<BuildReport> {
    let (events, progress_guard): (EventSinkHandle, _) = if progress_enabled() {
        let (sink, receiver) = ChannelSink::new();
        (Arc::new(sink), Some(spawn_event_handler(receiver)))
    } else {
        (Arc::new(NullSink), None)
    };

    // The sink is dropped with the build context, which closes the channel.
    let result = relreg_operations::build(options, events);
    if let Some(guard) = progress_guard {
        guard.finish();
    }
    progress::stop();

    let report = result?;
    info!("{}", report.summary());
    let skipped = report.total_skipped();
    if skipped > 0 {
        warn!("Skipped {skipped} entities, see the warnings above");
    }

    Ok(report)
}

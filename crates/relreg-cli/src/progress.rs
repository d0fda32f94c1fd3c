use std::{
    collections::HashMap,
    sync::{mpsc::Receiver, Arc, LazyLock},
    thread::JoinHandle,
    time::Duration,
};

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use nu_ansi_term::Color::Cyan;
use relreg_events::{BuildEvent, Domain};

use crate::utils::{progress_enabled, Colored};

static MULTI: LazyLock<Arc<MultiProgress>> = LazyLock::new(|| Arc::new(MultiProgress::new()));

/// Pause progress display, run the closure, then resume.
pub fn suspend<F: FnOnce()>(f: F) {
    MULTI.suspend(f);
}

/// Stop and clear all progress bars.
pub fn stop() {
    MULTI.clear().ok();
}

/// Owns the background thread started by [`spawn_event_handler`].
pub struct ProgressGuard {
    handle: Option<JoinHandle<()>>,
}

impl ProgressGuard {
    /// Waits for the handler thread to drain the remaining events.
    ///
    /// Every sender of the channel must be dropped first, otherwise this
    /// blocks forever.
    pub fn finish(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.join().ok();
        }
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.cyan} {msg}").unwrap()
}

fn count_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.cyan} {msg}  {pos}/{len}").unwrap()
}

fn domain_message(domain: Domain) -> String {
    format!("Generating {}", Colored(Cyan, domain.label()))
}

fn create_domain_spinner(domain: Domain) -> ProgressBar {
    let pb = if progress_enabled() {
        MULTI.add(ProgressBar::new_spinner())
    } else {
        MULTI.add(ProgressBar::hidden())
    };
    pb.set_style(spinner_style());
    pb.set_message(domain_message(domain));
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Spawns a thread that renders one spinner per domain from build events.
///
/// A spinner turns into a counter once its domain reports how many entities
/// it found, and is cleared when the domain completes or fails.
pub fn spawn_event_handler(receiver: Receiver<BuildEvent>) -> ProgressGuard {
    let handle = std::thread::spawn(move || {
        let mut jobs: HashMap<Domain, ProgressBar> = HashMap::new();

        while let Ok(event) = receiver.recv() {
            match event {
                BuildEvent::DomainStarted {
                    domain,
                } => {
                    jobs.insert(domain, create_domain_spinner(domain));
                }
                BuildEvent::DomainDiscovered {
                    domain,
                    total,
                } => {
                    if let Some(pb) = jobs.get(&domain) {
                        pb.set_style(count_style());
                        pb.set_length(total as u64);
                    }
                }
                BuildEvent::EntityWritten {
                    domain, ..
                }
                | BuildEvent::EntitySkipped {
                    domain, ..
                } => {
                    if let Some(pb) = jobs.get(&domain) {
                        pb.inc(1);
                    }
                }
                BuildEvent::DomainComplete {
                    domain, ..
                }
                | BuildEvent::DomainFailed {
                    domain, ..
                } => {
                    if let Some(pb) = jobs.remove(&domain) {
                        pb.finish_and_clear();
                    }
                }
                BuildEvent::BuildComplete {
                    ..
                }
                | BuildEvent::BuildFailed {
                    ..
                } => {
                    for (_, pb) in jobs.drain() {
                        pb.finish_and_clear();
                    }
                }
                BuildEvent::BuildStarted {
                    ..
                } => {}
            }
        }
    });

    ProgressGuard {
        handle: Some(handle),
    }
}

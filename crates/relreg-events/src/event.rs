use std::{fmt, time::Duration};

/// The five independent data domains of a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Domain {
    Packages,
    Sdks,
    Apps,
    AwsLambdaLayers,
    MarketingSlugs,
}

impl Domain {
    /// All domains, in the order their errors are reported.
    pub const ALL: [Domain; 5] = [
        Domain::Packages,
        Domain::Sdks,
        Domain::Apps,
        Domain::AwsLambdaLayers,
        Domain::MarketingSlugs,
    ];

    /// Directory and summary-file stem used for this domain in the output tree.
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Packages => "packages",
            Domain::Sdks => "sdks",
            Domain::Apps => "apps",
            Domain::AwsLambdaLayers => "aws-lambda-layers",
            Domain::MarketingSlugs => "marketing-slugs",
        }
    }

    /// Human readable plural used in progress output and summaries.
    pub fn label(&self) -> &'static str {
        match self {
            Domain::Packages => "packages",
            Domain::Sdks => "SDKs",
            Domain::Apps => "apps",
            Domain::AwsLambdaLayers => "lambda layers",
            Domain::MarketingSlugs => "marketing slugs",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// All event types emitted during a build.
#[derive(Debug, Clone)]
pub enum BuildEvent {
    /// The output directory was recreated and aggregators are about to run.
    BuildStarted { parallel: bool, max_workers: usize },
    /// An aggregator started.
    DomainStarted { domain: Domain },
    /// Entities discovered for a domain, before per-entity work starts.
    DomainDiscovered { domain: Domain, total: usize },
    /// One entity finished with all of its documents written.
    EntityWritten { domain: Domain, id: String },
    /// One entity was skipped; the build continues.
    EntitySkipped {
        domain: Domain,
        id: String,
        reason: String,
    },
    /// An aggregator finished.
    DomainComplete {
        domain: Domain,
        written: usize,
        skipped: usize,
    },
    /// An aggregator hit a domain-level error.
    DomainFailed { domain: Domain, error: String },
    /// All aggregators finished without a domain-level error.
    BuildComplete { duration: Duration },
    /// The build terminated with an error.
    BuildFailed { error: String },
}

impl BuildEvent {
    /// Domain the event belongs to, if any.
    pub fn domain(&self) -> Option<Domain> {
        match self {
            BuildEvent::DomainStarted { domain }
            | BuildEvent::DomainDiscovered { domain, .. }
            | BuildEvent::EntityWritten { domain, .. }
            | BuildEvent::EntitySkipped { domain, .. }
            | BuildEvent::DomainComplete { domain, .. }
            | BuildEvent::DomainFailed { domain, .. } => Some(*domain),
            BuildEvent::BuildStarted { .. }
            | BuildEvent::BuildComplete { .. }
            | BuildEvent::BuildFailed { .. } => None,
        }
    }

    /// Returns `true` for events that end the build.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BuildEvent::BuildComplete { .. } | BuildEvent::BuildFailed { .. }
        )
    }
}

use std::time::Duration;

use relreg_events::Domain;

/// Result of one domain aggregator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainReport {
    pub domain: Domain,
    /// Entities whose documents were written: packages, SDKs and apps with
    /// detail documents, layers in the summary, slugs with a detail file.
    pub written: usize,
    /// Entities skipped because of an entity-level error.
    pub skipped: usize,
}

impl DomainReport {
    pub fn new(domain: Domain) -> Self {
        Self {
            domain,
            written: 0,
            skipped: 0,
        }
    }
}

/// Report returned after a successful build.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub duration: Duration,
    /// One entry per domain, in [`Domain::ALL`] order.
    pub domains: Vec<DomainReport>,
}

impl BuildReport {
    pub fn domain(&self, domain: Domain) -> Option<&DomainReport> {
        self.domains.iter().find(|r| r.domain == domain)
    }

    pub fn written(&self, domain: Domain) -> usize {
        self.domain(domain).map_or(0, |r| r.written)
    }

    pub fn total_skipped(&self) -> usize {
        self.domains.iter().map(|r| r.skipped).sum()
    }

    /// One-line summary such as
    /// `Generated 3 packages, 1 SDKs, 2 apps, 0 lambda layers, 4 marketing slugs in 1.2s`.
    pub fn summary(&self) -> String {
        let counts = Domain::ALL
            .iter()
            .map(|domain| format!("{} {}", self.written(*domain), domain.label()))
            .collect::<Vec<_>>()
            .join(", ");
        format!("Generated {counts} in {:.2?}", self.duration)
    }
}

/// Outcome of processing one entity inside a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityOutcome {
    Written,
    Skipped,
}

impl DomainReport {
    /// Adds entity outcomes to the counts.
    pub fn tally<I>(mut self, outcomes: I) -> Self
    where
        I: IntoIterator<Item = EntityOutcome>,
    {
        for outcome in outcomes {
            match outcome {
                EntityOutcome::Written => self.written += 1,
                EntityOutcome::Skipped => self.skipped += 1,
            }
        }
        self
    }
}

use std::{fmt::Display, path::PathBuf, sync::Arc};

use rayon::{
    iter::{IntoParallelRefIterator, ParallelIterator},
    ThreadPool, ThreadPoolBuilder,
};
use relreg_config::{
    config::{Config, DEFAULT_MAX_WORKERS},
    error::ConfigError,
};
use relreg_core::{error::BuildError, BuildResult, OutputWriter};
use relreg_events::{BuildEvent, Domain, EventSinkHandle};
use relreg_registry::{
    CanonicalId, PackageRecord, SourceTree, DEFAULT_NAMESPACE_MARKER,
};
use tracing::warn;

use crate::cache::PackageCache;

/// Settings of one build. Fixed once the build starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    pub root: PathBuf,
    pub output: PathBuf,
    pub parallel: bool,
    pub max_workers: usize,
    pub namespace_marker: String,
}

impl BuildOptions {
    pub fn new<R: Into<PathBuf>, O: Into<PathBuf>>(root: R, output: O) -> Self {
        Self {
            root: root.into(),
            output: output.into(),
            parallel: true,
            max_workers: DEFAULT_MAX_WORKERS,
            namespace_marker: DEFAULT_NAMESPACE_MARKER.to_string(),
        }
    }

    /// Options from a resolved configuration.
    pub fn from_config(config: &Config) -> BuildResult<Self> {
        Ok(Self {
            root: config.get_root_path()?,
            output: config.get_output_path()?,
            parallel: config.parallel(),
            max_workers: config.max_workers(),
            namespace_marker: config.namespace_marker().to_string(),
        })
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    pub fn namespace_marker<S: Into<String>>(mut self, marker: S) -> Self {
        self.namespace_marker = marker.into();
        self
    }

    fn validate(&self) -> BuildResult<()> {
        if self.max_workers == 0 {
            return Err(ConfigError::InvalidWorkerCount(self.max_workers).into());
        }
        Ok(())
    }
}

/// Everything a build needs, shared by all domain aggregators.
///
/// In parallel mode the context owns a worker pool of `max_workers` threads
/// that runs the domains and their entities.
pub struct BuildContext {
    options: BuildOptions,
    source: SourceTree,
    writer: OutputWriter,
    events: EventSinkHandle,
    cache: PackageCache,
    pool: Option<ThreadPool>,
}

impl BuildContext {
    pub fn new(options: BuildOptions, events: EventSinkHandle) -> BuildResult<Self> {
        options.validate()?;

        let pool = if options.parallel {
            let pool = ThreadPoolBuilder::new()
                .num_threads(options.max_workers)
                .thread_name(|i| format!("relreg-worker-{i}"))
                .build()
                .map_err(|err| BuildError::WorkerPool(err.to_string()))?;
            Some(pool)
        } else {
            None
        };

        Ok(Self {
            source: SourceTree::new(&options.root)
                .with_namespace_marker(options.namespace_marker.clone()),
            writer: OutputWriter::new(&options.output),
            options,
            events,
            cache: PackageCache::new(),
            pool,
        })
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    pub fn source(&self) -> &SourceTree {
        &self.source
    }

    pub fn writer(&self) -> &OutputWriter {
        &self.writer
    }

    pub fn cache(&self) -> &PackageCache {
        &self.cache
    }

    pub(crate) fn pool(&self) -> Option<&ThreadPool> {
        self.pool.as_ref()
    }

    pub fn emit(&self, event: BuildEvent) {
        self.events.emit(event);
    }

    /// Loads a package version through the build cache.
    pub fn load_package(
        &self,
        id: &CanonicalId,
        version: &str,
    ) -> relreg_registry::Result<Arc<PackageRecord>> {
        self.cache
            .get_or_load(id, version, || self.source.load_package(id, version))
    }

    /// Applies `f` to every item, on the worker pool when the build is parallel.
    /// Results keep the order of `items`.
    pub fn map_entities<T, R, F>(&self, items: &[T], f: F) -> Vec<R>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> R + Sync + Send,
    {
        match &self.pool {
            Some(pool) => pool.install(|| items.par_iter().map(f).collect()),
            None => items.iter().map(f).collect(),
        }
    }

    /// Records an entity-level failure. The build goes on.
    pub fn skip(&self, domain: Domain, id: &str, reason: impl Display) {
        let reason = reason.to_string();
        warn!(domain = %domain, id, "skipping: {reason}");
        self.emit(BuildEvent::EntitySkipped {
            domain,
            id: id.to_string(),
            reason,
        });
    }

    pub(crate) fn written(&self, domain: Domain, id: &str) {
        self.emit(BuildEvent::EntityWritten {
            domain,
            id: id.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use relreg_events::{CollectorSink, NullSink};
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_options_builder() {
        let options = BuildOptions::new("/src", "/dist")
            .parallel(false)
            .max_workers(2)
            .namespace_marker(".ns");
        assert!(!options.parallel);
        assert_eq!(options.max_workers, 2);
        assert_eq!(options.namespace_marker, ".ns");
    }

    #[test]
    fn test_zero_workers_rejected() {
        let options = BuildOptions::new("/src", "/dist").max_workers(0);
        let result = BuildContext::new(options, Arc::new(NullSink));
        assert!(matches!(
            result,
            Err(BuildError::Config(ConfigError::InvalidWorkerCount(0)))
        ));
    }

    #[test]
    fn test_map_entities_keeps_order() {
        for parallel in [true, false] {
            let options = BuildOptions::new("/src", "/dist").parallel(parallel);
            let ctx = BuildContext::new(options, Arc::new(NullSink)).unwrap();
            assert_eq!(ctx.pool().is_some(), parallel);

            let items: Vec<usize> = (0..100).collect();
            let doubled = ctx.map_entities(&items, |n| n * 2);
            assert_eq!(doubled, items.iter().map(|n| n * 2).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_load_package_uses_cache() {
        let dir = tempdir().unwrap();
        let pkg = dir.path().join("packages/npm/react");
        std::fs::create_dir_all(&pkg).unwrap();
        std::fs::write(pkg.join("latest.json"), r#"{"version":"1.0.0"}"#).unwrap();

        let options = BuildOptions::new(dir.path(), dir.path().join("dist"));
        let ctx = BuildContext::new(options, Arc::new(NullSink)).unwrap();
        let id = CanonicalId::parse("npm:react").unwrap();

        let first = ctx.load_package(&id, "latest").unwrap();
        std::fs::remove_file(pkg.join("latest.json")).unwrap();
        let second = ctx.load_package(&id, "latest").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_skip_emits_event() {
        let collector = Arc::new(CollectorSink::default());
        let options = BuildOptions::new("/src", "/dist").parallel(false);
        let ctx = BuildContext::new(options, collector.clone()).unwrap();

        ctx.skip(Domain::Apps, "dashboard", "latest.json missing");
        let events = collector.events();
        assert!(matches!(
            &events[0],
            BuildEvent::EntitySkipped { domain: Domain::Apps, id, .. } if id == "dashboard"
        ));
    }
}

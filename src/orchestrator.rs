//! Fan-out/fan-in assembly of the daily snapshot.
//!
//! Each module runs on its own worker thread; a failure, timeout or
//! panic in one module never prevents the others from contributing.
//! The snapshot always contains every module's full key set, degraded
//! to today's cached values or blank defaults where necessary.

use std::collections::BTreeMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::datetime::{now_canonical, today_string};
use crate::error::CacheError;
use crate::lkg_cache::LkgCache;
use crate::module::{CachePolicy, DigestModule, ModuleOutput};
use crate::retry::{try_with_retry, RetryError};
use crate::timing::{timed_with_status, ModuleStatus, TimingRegistry};

/// The assembled digest for one day. Field keys are the union of every
/// module's `field_keys()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestSnapshot {
    pub date: String,
    pub generated_at: String,
    pub fields: BTreeMap<String, String>,
}

impl DigestSnapshot {
    #[must_use]
    fn new(fields: BTreeMap<String, String>) -> Self {
        Self {
            date: today_string(),
            generated_at: now_canonical().to_rfc3339(),
            fields,
        }
    }
}

/// Coordinates one run's module executions against the shared cache and
/// timing registry.
pub struct Orchestrator<'a> {
    cache: &'a LkgCache,
    registry: &'a TimingRegistry,
}

impl<'a> Orchestrator<'a> {
    #[must_use]
    pub fn new(cache: &'a LkgCache, registry: &'a TimingRegistry) -> Self {
        Self { cache, registry }
    }

    /// Drop cached entries for every primary-cache module so their next
    /// execution recomputes instead of reusing today's pick (`--force`).
    pub fn clear_primary_cache(
        &self,
        modules: &[Box<dyn DigestModule>],
    ) -> Result<(), CacheError> {
        let names: Vec<&str> = modules
            .iter()
            .filter(|m| m.cache_policy() == CachePolicy::Primary)
            .map(|m| m.name())
            .collect();
        if names.is_empty() {
            return Ok(());
        }
        info!(modules = ?names, "clearing primary cache entries");
        self.cache.clear(&names)
    }

    /// Run every module concurrently and merge their outputs into one
    /// snapshot. Never fails: degraded modules contribute cached or
    /// blank values, and their condition is captured in the registry.
    #[must_use]
    pub fn assemble(&self, modules: &[Box<dyn DigestModule>]) -> DigestSnapshot {
        let outputs: Mutex<Vec<ModuleOutput>> = Mutex::new(Vec::with_capacity(modules.len()));

        std::thread::scope(|s| {
            for module in modules {
                let outputs = &outputs;
                s.spawn(move || {
                    let output = self.execute(module.as_ref());
                    if let Ok(mut outputs) = outputs.lock() {
                        outputs.push(output);
                    }
                });
            }
        });

        let mut fields = BTreeMap::new();
        for output in outputs.into_inner().unwrap_or_default() {
            fields.extend(output.fields().clone());
        }
        info!(fields = fields.len(), "snapshot assembled");
        DigestSnapshot::new(fields)
    }

    /// Run one module under the timing clock. Always yields a full key
    /// set: a hard failure degrades to the cached-or-blank fallback
    /// after its error is recorded.
    fn execute(&self, module: &dyn DigestModule) -> ModuleOutput {
        let result = timed_with_status(
            self.registry,
            module.name(),
            |output: &ModuleOutput| {
                if output.warnings().is_empty() {
                    ModuleStatus::Success
                } else {
                    ModuleStatus::Warning
                }
            },
            || self.execute_inner(module),
        );

        match result {
            Ok(output) => output,
            Err(err) => {
                warn!(module = module.name(), error = %err, "module failed, using fallback");
                self.cached_or_blank(module)
            }
        }
    }

    fn execute_inner(&self, module: &dyn DigestModule) -> Result<ModuleOutput, crate::error::FetchError> {
        let name = module.name();

        if module.cache_policy() == CachePolicy::Primary {
            if let Some(hit) = self.load_cached(module) {
                debug!(module = name, "primary cache hit, skipping fetch");
                return Ok(ModuleOutput::from(hit));
            }
        }

        match try_with_retry(&module.retry_policy(), || module.fetch()) {
            Ok(output) => {
                if !output.is_empty() {
                    self.save_cached(name, &output);
                    return Ok(output);
                }
                // Legitimately empty fetch: anything cached earlier today
                // is richer than blanks.
                if module.cache_policy() == CachePolicy::Fallback {
                    if let Some(hit) = self.load_cached(module) {
                        debug!(module = name, "empty fetch, serving today's cached data");
                        return Ok(ModuleOutput::from(hit));
                    }
                }
                Ok(output)
            }
            Err(RetryError::Exhausted { attempts, last }) => {
                if let Some(hit) = self.load_cached(module) {
                    return Ok(ModuleOutput::from(hit)
                        .with_warning(format!("serving cached data after {attempts} attempts: {last}")));
                }
                Ok(module
                    .empty()
                    .with_warning(format!("no data after {attempts} attempts: {last}")))
            }
            Err(RetryError::Fatal(err)) => Err(err),
        }
    }

    /// Today's cached map for all of the module's keys, or `None`. Cache
    /// trouble is logged and treated as a miss: the store must never
    /// take a module down with it.
    fn load_cached(&self, module: &dyn DigestModule) -> Option<BTreeMap<String, String>> {
        match self.cache.load(module.name(), module.field_keys()) {
            Ok(hit) => hit,
            Err(e) => {
                warn!(module = module.name(), error = %e, "LKG load failed");
                None
            }
        }
    }

    fn save_cached(&self, name: &str, output: &ModuleOutput) {
        if let Err(e) = self.cache.save(name, &output.non_empty_fields()) {
            warn!(module = name, error = %e, "LKG save failed");
        }
    }

    fn cached_or_blank(&self, module: &dyn DigestModule) -> ModuleOutput {
        match self.load_cached(module) {
            Some(hit) => ModuleOutput::from(hit),
            None => module.empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::retry::RetryPolicy;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    struct Scripted {
        name: &'static str,
        keys: &'static [&'static str],
        policy: CachePolicy,
        calls: Arc<AtomicU32>,
        behavior: Behavior,
    }

    enum Behavior {
        Value(&'static str),
        Empty,
        Transient,
        Fatal,
    }

    impl Scripted {
        fn new(name: &'static str, policy: CachePolicy, behavior: Behavior) -> Self {
            Self {
                name,
                keys: &["value"],
                policy,
                calls: Arc::new(AtomicU32::new(0)),
                behavior,
            }
        }
    }

    impl DigestModule for Scripted {
        fn name(&self) -> &'static str {
            self.name
        }

        fn field_keys(&self) -> &'static [&'static str] {
            self.keys
        }

        fn cache_policy(&self) -> CachePolicy {
            self.policy
        }

        fn retry_policy(&self) -> RetryPolicy {
            RetryPolicy::new(2, Duration::from_millis(1))
        }

        fn fetch(&self) -> Result<ModuleOutput, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behavior {
                Behavior::Value(v) => Ok(ModuleOutput::new().with_field("value", v)),
                Behavior::Empty => Ok(ModuleOutput::new().with_field("value", "")),
                Behavior::Transient => Err(FetchError::network("down")),
                Behavior::Fatal => Err(FetchError::parse("bad payload")),
            }
        }
    }

    fn harness() -> (tempfile::TempDir, LkgCache, TimingRegistry) {
        let td = tempfile::TempDir::new().unwrap();
        let cache = LkgCache::open(&td.path().join("lkg.redb")).unwrap();
        (td, cache, TimingRegistry::new())
    }

    fn boxed(modules: Vec<Scripted>) -> Vec<Box<dyn DigestModule>> {
        modules
            .into_iter()
            .map(|m| Box::new(m) as Box<dyn DigestModule>)
            .collect()
    }

    #[test]
    fn successful_fetch_lands_in_snapshot_and_cache() {
        let (_td, cache, registry) = harness();
        let orch = Orchestrator::new(&cache, &registry);

        let modules = boxed(vec![Scripted::new(
            "weather",
            CachePolicy::Fallback,
            Behavior::Value("sunny"),
        )]);
        let snapshot = orch.assemble(&modules);

        assert_eq!(snapshot.fields.get("value").unwrap(), "sunny");
        assert_eq!(registry.results()[0].status, ModuleStatus::Success);
        assert!(cache.load("weather", &["value"]).unwrap().is_some());
    }

    #[test]
    fn one_failure_does_not_sink_the_others() {
        let (_td, cache, registry) = harness();
        let orch = Orchestrator::new(&cache, &registry);

        let good = Scripted::new("weather", CachePolicy::Fallback, Behavior::Value("sunny"));
        let bad = Scripted::new("roads", CachePolicy::Fallback, Behavior::Fatal);
        let snapshot = orch.assemble(&boxed(vec![good, bad]));

        // The failed module still contributes its blank key.
        assert_eq!(snapshot.fields.len(), 1);
        assert!(snapshot.fields.contains_key("value"));

        let results = registry.results();
        let roads = results.iter().find(|r| r.name == "roads").unwrap();
        assert_eq!(roads.status, ModuleStatus::Error);
        let weather = results.iter().find(|r| r.name == "weather").unwrap();
        assert_eq!(weather.status, ModuleStatus::Success);
    }

    #[test]
    fn exhausted_retries_fall_back_to_todays_cache_with_warning() {
        let (_td, cache, registry) = harness();
        cache
            .save(
                "roads",
                &[("value".to_string(), "open".to_string())].into_iter().collect(),
            )
            .unwrap();

        let orch = Orchestrator::new(&cache, &registry);
        let module = Scripted::new("roads", CachePolicy::Fallback, Behavior::Transient);
        let snapshot = orch.assemble(&boxed(vec![module]));

        assert_eq!(snapshot.fields.get("value").unwrap(), "open");
        assert_eq!(registry.results()[0].status, ModuleStatus::Warning);
    }

    #[test]
    fn exhausted_retries_without_cache_degrade_to_blanks() {
        let (_td, cache, registry) = harness();
        let orch = Orchestrator::new(&cache, &registry);

        let module = Scripted::new("trails", CachePolicy::Fallback, Behavior::Transient);
        let snapshot = orch.assemble(&boxed(vec![module]));

        assert_eq!(snapshot.fields.get("value").unwrap(), "");
        assert_eq!(registry.results()[0].status, ModuleStatus::Warning);
    }

    #[test]
    fn primary_cache_hit_skips_the_fetch() {
        let (_td, cache, registry) = harness();
        cache
            .save(
                "peak",
                &[("value".to_string(), "Reynolds".to_string())].into_iter().collect(),
            )
            .unwrap();

        let orch = Orchestrator::new(&cache, &registry);
        let module = Scripted::new("peak", CachePolicy::Primary, Behavior::Value("Wilbur"));
        let modules = boxed(vec![module]);
        let snapshot = orch.assemble(&modules);

        assert_eq!(snapshot.fields.get("value").unwrap(), "Reynolds");
        assert_eq!(registry.results()[0].status, ModuleStatus::Success);
    }

    #[test]
    fn force_clear_makes_primary_modules_recompute() {
        let (_td, cache, registry) = harness();
        cache
            .save(
                "peak",
                &[("value".to_string(), "Reynolds".to_string())].into_iter().collect(),
            )
            .unwrap();

        let orch = Orchestrator::new(&cache, &registry);
        let modules = boxed(vec![Scripted::new(
            "peak",
            CachePolicy::Primary,
            Behavior::Value("Wilbur"),
        )]);
        orch.clear_primary_cache(&modules).unwrap();
        let snapshot = orch.assemble(&modules);

        assert_eq!(snapshot.fields.get("value").unwrap(), "Wilbur");
    }

    #[test]
    fn empty_fallback_fetch_prefers_todays_cached_data() {
        let (_td, cache, registry) = harness();
        cache
            .save(
                "events",
                &[("value".to_string(), "concert".to_string())].into_iter().collect(),
            )
            .unwrap();

        let orch = Orchestrator::new(&cache, &registry);
        let module = Scripted::new("events", CachePolicy::Fallback, Behavior::Empty);
        let snapshot = orch.assemble(&boxed(vec![module]));

        assert_eq!(snapshot.fields.get("value").unwrap(), "concert");
        // An empty fetch is not degraded, so no warning.
        assert_eq!(registry.results()[0].status, ModuleStatus::Success);
    }

    #[test]
    fn fatal_error_still_serves_cached_fields() {
        let (_td, cache, registry) = harness();
        cache
            .save(
                "notices",
                &[("value".to_string(), "trail closed".to_string())].into_iter().collect(),
            )
            .unwrap();

        let orch = Orchestrator::new(&cache, &registry);
        let module = Scripted::new("notices", CachePolicy::Fallback, Behavior::Fatal);
        let snapshot = orch.assemble(&boxed(vec![module]));

        assert_eq!(snapshot.fields.get("value").unwrap(), "trail closed");
        assert_eq!(registry.results()[0].status, ModuleStatus::Error);
    }

    #[test]
    fn fetch_runs_exactly_once_per_module_on_success() {
        let (_td, cache, registry) = harness();
        let orch = Orchestrator::new(&cache, &registry);

        let module = Scripted::new("weather", CachePolicy::Fallback, Behavior::Value("sunny"));
        let calls = Arc::clone(&module.calls);
        let _ = orch.assemble(&boxed(vec![module]));

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}

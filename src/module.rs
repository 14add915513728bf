//! The contract every data-source integration satisfies.
//!
//! A module is a named unit of work the orchestrator invokes once per
//! run. Its output is a fixed set of string fields, so "nothing to
//! report" (fields present but empty) is distinguishable from a fetch
//! that failed outright (an `Err`).

use std::collections::BTreeMap;

use crate::error::FetchError;
use crate::retry::RetryPolicy;

/// How the orchestrator uses the LKG cache for a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Output is a pure function of today's date (e.g. "today's featured
    /// peak"): the cache is checked first and a hit skips the fetch
    /// entirely for the rest of the day.
    Primary,
    /// Output changes through the day: always fetch fresh, fall back to
    /// today's cached value only when the fetch fails or comes back empty.
    Fallback,
}

/// Structured result of one module fetch.
///
/// Field values are the formatted strings that land in the snapshot.
/// Warnings record degraded-but-usable outcomes (e.g. retries exhausted
/// on a secondary feed) and downgrade the run to `partial` without
/// counting as a module failure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleOutput {
    fields: BTreeMap<String, String>,
    warnings: Vec<String>,
}

impl ModuleOutput {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), value.into());
    }

    #[must_use]
    pub fn with_warning(mut self, message: impl Into<String>) -> Self {
        self.warnings.push(message.into());
        self
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    #[must_use]
    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// True when every field is absent or blank, the "nothing usable"
    /// signal that triggers the fallback-cache lookup.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.values().all(|v| v.is_empty())
    }

    /// Fields with non-empty values, the subset worth caching.
    #[must_use]
    pub fn non_empty_fields(&self) -> BTreeMap<String, String> {
        self.fields
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl From<BTreeMap<String, String>> for ModuleOutput {
    fn from(fields: BTreeMap<String, String>) -> Self {
        Self {
            fields,
            warnings: Vec::new(),
        }
    }
}

/// One independent data-source integration.
///
/// Contract obligations beyond the signatures:
/// - `fetch` must not error for expected absence of data; return an
///   output with empty fields instead.
/// - `fetch` must bound its own I/O with internal timeouts; the
///   orchestrator never force-kills a stuck worker.
/// - re-running `fetch` must be safe; any side effects are the module's
///   own responsibility.
pub trait DigestModule: Send + Sync {
    /// Stable key used for the LKG cache, timing registry and snapshot.
    fn name(&self) -> &'static str;

    /// The full set of snapshot fields this module produces.
    fn field_keys(&self) -> &'static [&'static str];

    fn cache_policy(&self) -> CachePolicy {
        CachePolicy::Fallback
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default()
    }

    fn fetch(&self) -> Result<ModuleOutput, FetchError>;

    /// Degraded default used when both the fetch and the LKG fallback
    /// come up empty. All keys present, all values blank.
    fn empty(&self) -> ModuleOutput {
        let mut out = ModuleOutput::new();
        for key in self.field_keys() {
            out.set(*key, "");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed;

    impl DigestModule for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn field_keys(&self) -> &'static [&'static str] {
            &["a", "b"]
        }

        fn fetch(&self) -> Result<ModuleOutput, FetchError> {
            Ok(ModuleOutput::new().with_field("a", "1"))
        }
    }

    #[test]
    fn empty_default_covers_all_keys_with_blanks() {
        let out = Fixed.empty();
        assert_eq!(out.fields().len(), 2);
        assert!(out.is_empty());
    }

    #[test]
    fn empty_detection_ignores_blank_values() {
        let out = ModuleOutput::new().with_field("a", "").with_field("b", "x");
        assert!(!out.is_empty());
        assert_eq!(out.non_empty_fields().len(), 1);
    }

    #[test]
    fn warnings_do_not_affect_emptiness() {
        let out = ModuleOutput::new()
            .with_field("a", "")
            .with_warning("feed degraded");
        assert!(out.is_empty());
        assert_eq!(out.warnings().len(), 1);
    }
}

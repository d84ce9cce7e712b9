//! Index construction from a backend registry.
//!
//! # Responsibilities
//! - Enumerate registered backends in registry order
//! - Apply special-case renames before lookup
//! - Skip excluded backends
//! - Compile every URL base and fail the whole build on the first problem
//!
//! # Design Decisions
//! - Fail fast: a partial index would silently misroute requests
//! - No deduplication or reordering of patterns

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use crate::config::IndexConfig;
use crate::index::{BackendId, IndexError, IndexResult, PatternIndex, PatternIndexEntry, UrlPattern};
use crate::observability::metrics;
use crate::registry::builtin::{DEFAULT_ALIASES, DEFAULT_EXCLUSIONS};
use crate::registry::BackendRegistry;

/// Backends deliberately kept out of the index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    backends: BTreeSet<BackendId>,
}

impl ExclusionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The exclusions for the builtin service table.
    pub fn defaults() -> Self {
        DEFAULT_EXCLUSIONS.iter().copied().collect()
    }

    pub fn insert(&mut self, backend: impl Into<BackendId>) -> bool {
        self.backends.insert(backend.into())
    }

    pub fn contains(&self, backend: &str) -> bool {
        self.backends.contains(backend)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BackendId> {
        self.backends.iter()
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

impl<S: Into<BackendId>> FromIterator<S> for ExclusionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            backends: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Builds a [`PatternIndex`] from a [`BackendRegistry`].
#[derive(Debug, Clone, Default)]
pub struct IndexBuilder {
    exclusions: ExclusionSet,
    aliases: BTreeMap<BackendId, BackendId>,
}

impl IndexBuilder {
    /// A builder with no exclusions and no renames.
    pub fn new() -> Self {
        Self::default()
    }

    /// The builder used for the builtin service table.
    pub fn with_defaults() -> Self {
        Self {
            exclusions: ExclusionSet::defaults(),
            aliases: DEFAULT_ALIASES
                .iter()
                .map(|(from, to)| (BackendId::from(*from), BackendId::from(*to)))
                .collect(),
        }
    }

    /// Builder settings from the `[index]` configuration section.
    pub fn from_config(config: &IndexConfig) -> Self {
        let mut builder = Self::with_defaults();
        if !config.default_exclusions {
            builder.exclusions = ExclusionSet::new();
        }
        for backend in &config.exclusions {
            builder = builder.exclude(backend.as_str());
        }
        for (from, to) in &config.aliases {
            builder = builder.alias(from.as_str(), to.as_str());
        }
        builder
    }

    pub fn exclude(mut self, backend: impl Into<BackendId>) -> Self {
        self.exclusions.insert(backend);
        self
    }

    /// Rename `from` to `to` before looking up URL definitions.
    pub fn alias(mut self, from: impl Into<BackendId>, to: impl Into<BackendId>) -> Self {
        self.aliases.insert(from.into(), to.into());
        self
    }

    pub fn exclusions(&self) -> &ExclusionSet {
        &self.exclusions
    }

    /// Resolve a listed backend name through the rename table.
    fn canonical(&self, listed: BackendId) -> BackendId {
        match self.aliases.get(&listed) {
            Some(renamed) => renamed.clone(),
            None => listed,
        }
    }

    fn is_excluded(&self, listed: &BackendId, canonical: &BackendId) -> bool {
        self.exclusions.contains(listed.as_str()) || self.exclusions.contains(canonical.as_str())
    }

    /// Whether a backend listed as `backend` would be left out of the index,
    /// either by name or after renaming.
    pub fn excludes(&self, backend: &str) -> bool {
        let listed = BackendId::new(backend);
        let canonical = self.canonical(listed.clone());
        self.is_excluded(&listed, &canonical)
    }

    /// Build the index. Any missing definition or invalid pattern fails the
    /// whole build.
    pub fn build(&self, registry: &dyn BackendRegistry) -> IndexResult<PatternIndex> {
        let start = Instant::now();
        let mut entries = Vec::new();
        let mut skipped = 0usize;
        let mut backends = 0usize;

        for listed in registry.list_of_backends() {
            let backend = self.canonical(listed.clone());
            if self.is_excluded(&listed, &backend) {
                tracing::trace!(backend = %backend, "Backend excluded from index");
                skipped += 1;
                continue;
            }

            let definitions =
                registry
                    .url_definitions(&backend)
                    .ok_or_else(|| IndexError::Configuration {
                        backend: backend.clone(),
                        reason: "no URL definitions registered".to_string(),
                    })?;

            if definitions.url_bases.is_empty() {
                return Err(IndexError::Configuration {
                    backend,
                    reason: "URL definitions declare no url_bases".to_string(),
                });
            }

            for raw in definitions.url_bases {
                if raw.trim().is_empty() {
                    return Err(IndexError::Configuration {
                        backend,
                        reason: "URL definitions contain a blank pattern".to_string(),
                    });
                }
                let pattern = UrlPattern::compile(raw.as_str()).map_err(|source| {
                    IndexError::PatternCompile {
                        backend: backend.clone(),
                        pattern: raw.clone(),
                        source,
                    }
                })?;
                entries.push(PatternIndexEntry::new(backend.clone(), pattern));
            }
            backends += 1;
        }

        let index = PatternIndex::new(entries);
        metrics::record_index_build(index.len(), start);
        tracing::info!(
            entries = index.len(),
            backends,
            skipped,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Pattern index built"
        );
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{TableRegistry, UrlDefinitions};

    fn registry(table: &[(&str, &[&str])]) -> TableRegistry {
        let mut registry = TableRegistry::new();
        for (name, bases) in table {
            registry.register(*name, UrlDefinitions::new(bases.iter().copied()));
        }
        registry
    }

    #[test]
    fn test_build_keeps_registry_order() {
        let registry = registry(&[
            ("beta", &[r"https://beta\..*"]),
            ("alpha", &[r"https://alpha\..*", r"https://a\..*"]),
        ]);
        let index = IndexBuilder::new().build(&registry).unwrap();

        let pairs: Vec<(&str, &str)> = index
            .iter()
            .map(|e| (e.backend.as_str(), e.pattern.source()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("beta", r"https://beta\..*"),
                ("alpha", r"https://alpha\..*"),
                ("alpha", r"https://a\..*"),
            ]
        );
    }

    #[test]
    fn test_excluded_backend_is_skipped_before_lookup() {
        let mut registry = registry(&[("alpha", &[r"https://alpha\..*"])]);
        // Listed without definitions; would fail if it were looked up
        registry.list("core");

        let index = IndexBuilder::new().exclude("core").build(&registry).unwrap();
        assert_eq!(index.len(), 1);
        assert!(!index.contains_backend("core"));
    }

    #[test]
    fn test_missing_definitions_fail_the_build() {
        let mut registry = registry(&[("alpha", &[r"https://alpha\..*"])]);
        registry.list("ghost");

        let err = IndexBuilder::new().build(&registry).unwrap_err();
        match err {
            IndexError::Configuration { backend, .. } => assert_eq!(backend, "ghost"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_or_blank_definitions_are_malformed() {
        let empty = registry(&[("alpha", &[])]);
        assert!(matches!(
            IndexBuilder::new().build(&empty),
            Err(IndexError::Configuration { .. })
        ));

        let blank = registry(&[("alpha", &["  "])]);
        assert!(matches!(
            IndexBuilder::new().build(&blank),
            Err(IndexError::Configuration { .. })
        ));
    }

    #[test]
    fn test_invalid_pattern_reports_backend_and_pattern() {
        let registry = registry(&[
            ("alpha", &[r"https://alpha\..*"]),
            ("beta", &[r"https://beta\.(["]),
        ]);

        let err = IndexBuilder::new().build(&registry).unwrap_err();
        match err {
            IndexError::PatternCompile { backend, pattern, .. } => {
                assert_eq!(backend, "beta");
                assert_eq!(pattern, r"https://beta\.([");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unbalanced_group_fails_build() {
        let registry = registry(&[("alpha", &[r"https://a\.x)|(https://b\.x"])]);
        match IndexBuilder::new().build(&registry) {
            Err(IndexError::PatternCompile { backend, pattern, .. }) => {
                assert_eq!(backend, "alpha");
                assert_eq!(pattern, r"https://a\.x)|(https://b\.x");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_excludes_checks_renamed_name() {
        let builder = IndexBuilder::new()
            .alias("legacy", "retired")
            .exclude("retired");
        assert!(builder.excludes("legacy"));
        assert!(builder.excludes("retired"));
        assert!(!builder.excludes("alpha"));
    }

    #[test]
    fn test_alias_is_applied_before_lookup() {
        let mut registry = TableRegistry::new();
        registry
            .list("emulator_api")
            .define("emulator_api.internal", UrlDefinitions::new([r"https?://emulatorapi\.amazonaws\.com"]));

        let index = IndexBuilder::new()
            .alias("emulator_api", "emulator_api.internal")
            .build(&registry)
            .unwrap();
        assert_eq!(index.entries()[0].backend, "emulator_api.internal");
    }

    #[test]
    fn test_exclusion_matches_renamed_backend() {
        let mut registry = TableRegistry::new();
        registry.list("legacy").list("alpha");
        registry.define("alpha", UrlDefinitions::new([r"https://alpha\..*"]));

        let index = IndexBuilder::new()
            .alias("legacy", "retired")
            .exclude("retired")
            .build(&registry)
            .unwrap();
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_builtin_table_builds_with_defaults() {
        let index = IndexBuilder::with_defaults()
            .build(&TableRegistry::builtin())
            .unwrap();

        for excluded in DEFAULT_EXCLUSIONS {
            assert!(!index.contains_backend(excluded), "{excluded} leaked into index");
        }
        assert!(index.contains_backend("rds"));
        assert!(index.contains_backend("es"));
        assert!(index.contains_backend("emulator_api.internal"));
    }

    #[test]
    fn test_from_config_extends_defaults() {
        let config = IndexConfig {
            exclusions: vec!["kinesis".to_string()],
            ..IndexConfig::default()
        };
        let builder = IndexBuilder::from_config(&config);
        assert!(builder.exclusions().contains("kinesis"));
        assert!(builder.exclusions().contains("neptune"));

        let bare = IndexBuilder::from_config(&IndexConfig {
            default_exclusions: false,
            ..IndexConfig::default()
        });
        assert!(bare.exclusions().is_empty());
    }
}

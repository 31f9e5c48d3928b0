//! State shared by every translation stage of one run.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::MigrateConfig;
use crate::diagnostics::{Category, Recorder};
use crate::identity::ResourceIdentity;
use crate::resolve::Resolver;
use crate::rules::{Findings, Mapped};
use crate::source::SourceCache;
use crate::target::{TargetBuilder, TargetKey, TargetResource};

/// The source cache is read-only for the whole run. Target resources and
/// diagnostics only grow.
pub struct Context<'a> {
    pub source: &'a SourceCache,
    pub config: &'a MigrateConfig,
    pub target: TargetBuilder,
    pub diagnostics: Recorder,
    /// Option resources some other resource pulled in by reference.
    attached: BTreeSet<ResourceIdentity>,
    /// Source resource each route-like target was built from.
    origins: BTreeMap<TargetKey, ResourceIdentity>,
}

/// What one run produced.
#[derive(Debug, Clone, Default)]
pub struct Translation {
    pub target: TargetBuilder,
    pub diagnostics: Recorder,
}

impl<'a> Context<'a> {
    pub fn new(source: &'a SourceCache, config: &'a MigrateConfig) -> Self {
        Self::with_diagnostics(source, config, Recorder::new())
    }

    /// Start from diagnostics a front end already recorded.
    pub fn with_diagnostics(source: &'a SourceCache, config: &'a MigrateConfig, diagnostics: Recorder) -> Self {
        Self {
            source,
            config,
            target: TargetBuilder::new(),
            diagnostics,
            attached: BTreeSet::new(),
            origins: BTreeMap::new(),
        }
    }

    pub fn resolver(&self) -> Resolver<'a> {
        Resolver::new(self.source)
    }

    pub fn record(&mut self, category: Category, source: &ResourceIdentity, message: impl Into<String>) {
        self.diagnostics.record(category, source, message);
    }

    pub fn unsupported(&mut self, source: &ResourceIdentity, message: impl Into<String>) {
        self.record(Category::Unsupported, source, message);
    }

    pub fn unknown_reference(&mut self, source: &ResourceIdentity, message: impl Into<String>) {
        self.record(Category::UnknownReference, source, message);
    }

    pub fn ignored(&mut self, source: &ResourceIdentity, message: impl Into<String>) {
        self.record(Category::Ignored, source, message);
    }

    pub fn update_required(&mut self, source: &ResourceIdentity, message: impl Into<String>) {
        self.record(Category::UpdateRequired, source, message);
    }

    pub fn correction(&mut self, source: &ResourceIdentity, message: impl Into<String>) {
        self.record(Category::ValidationCorrection, source, message);
    }

    pub fn no_references(&mut self, source: &ResourceIdentity, message: impl Into<String>) {
        self.record(Category::NoReferences, source, message);
    }

    /// Record a rule's findings against `source` and return its value.
    pub fn absorb<T>(&mut self, source: &ResourceIdentity, mapped: Mapped<T>) -> T {
        self.report(source, mapped.findings);
        mapped.value
    }

    pub fn report(&mut self, source: &ResourceIdentity, findings: Findings) {
        for finding in findings {
            self.diagnostics.record(finding.category, source, finding.message);
        }
    }

    pub fn mark_attached(&mut self, identity: ResourceIdentity) {
        self.attached.insert(identity);
    }

    pub fn is_attached(&self, identity: &ResourceIdentity) -> bool {
        self.attached.contains(identity)
    }

    pub fn upsert(&mut self, resource: impl Into<TargetResource>) {
        self.target.upsert(resource);
    }

    /// Upsert and remember which source resource the target came from.
    pub fn upsert_from(&mut self, origin: &ResourceIdentity, resource: impl Into<TargetResource>) {
        let resource = resource.into();
        self.origins.insert(resource.key(), origin.clone());
        self.target.upsert(resource);
    }

    pub fn origin_of(&self, key: &TargetKey) -> Option<&ResourceIdentity> {
        self.origins.get(key)
    }

    pub fn finish(self) -> Translation {
        Translation {
            target: self.target,
            diagnostics: self.diagnostics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Context;
    use crate::config::MigrateConfig;
    use crate::diagnostics::Category;
    use crate::identity::{ResourceIdentity, SourceKind};
    use crate::rules::{Findings, Mapped};
    use crate::source::SourceCache;
    use crate::target::{HttpRouteSpec, Object, TargetKey, TargetKind};

    #[test]
    fn absorb_binds_findings_to_the_source() {
        let cache = SourceCache::new();
        let config = MigrateConfig::default();
        let mut ctx = Context::new(&cache, &config);
        let vs = ResourceIdentity::new(SourceKind::VirtualService, "default", "shop");

        let mut findings = Findings::new();
        findings.unsupported("faults is not supported");
        let value = ctx.absorb(&vs, Mapped::new(3, findings));

        let out = ctx.finish();
        assert_eq!(value, 3);
        let entries = out.diagnostics.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].category, Category::Unsupported);
        assert_eq!(entries[0].source, vs);
    }

    #[test]
    fn upsert_from_remembers_the_origin() {
        let cache = SourceCache::new();
        let config = MigrateConfig::default();
        let mut ctx = Context::new(&cache, &config);
        let vs = ResourceIdentity::new(SourceKind::VirtualService, "default", "shop");

        ctx.upsert_from(&vs, Object::new("default", "shop", HttpRouteSpec::default()));
        let key = TargetKey::new(TargetKind::HttpRoute, "default", "shop");
        assert_eq!(ctx.origin_of(&key), Some(&vs));
        assert!(ctx.target.contains(&key));
        assert_eq!(ctx.origin_of(&TargetKey::new(TargetKind::HttpRoute, "default", "other")), None);
    }
}

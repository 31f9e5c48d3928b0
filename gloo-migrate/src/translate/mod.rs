//! Orchestrator: visits the source cache in dependency order.
//!
//! Stages run in a fixed order so that anything a later stage looks up has
//! already been produced:
//!
//! 1. [`upstream`]: Backends and BackendConfigPolicies.
//! 2. [`settings`]: GatewayExtensions for the global auth, rate limit and
//!    processing servers.
//! 3. [`gateway`]: Gateways, listeners or ListenerSets, listener policies,
//!    and TCPRoutes for [`tcp`] hosts.
//! 4. [`virtual_service`] and [`route_table`]: HTTPRoutes and the policies
//!    attached to them.
//! 5. [`options`]: option resources that attach by target reference alone.
//! 6. [`validation`]: splits of routes, rules and ListenerSets that exceed
//!    the CRD validation limits.

pub mod gateway;
pub mod options;
pub mod route;
pub mod route_table;
pub mod settings;
pub mod tcp;
pub mod upstream;
pub mod validation;
pub mod virtual_service;

use tracing::{debug, info};

use crate::config::MigrateConfig;
use crate::context::{Context, Translation};
use crate::diagnostics::Recorder;
use crate::identity::{ResourceIdentity, SourceKind};
use crate::source::{Resource, SourceCache};

/// Translate a fully loaded source cache.
pub fn translate(source: &SourceCache, config: &MigrateConfig) -> Translation {
    translate_with(source, config, Recorder::new())
}

/// Translate, continuing a ledger a front end has already written to.
pub fn translate_with(source: &SourceCache, config: &MigrateConfig, diagnostics: Recorder) -> Translation {
    info!(resources = source.len(), "translating source resources");
    let mut ctx = Context::with_diagnostics(source, config, diagnostics);

    upstream::translate_upstreams(&mut ctx);
    debug!(produced = ctx.target.len(), "upstream stage done");

    settings::translate_settings(&mut ctx);
    debug!(produced = ctx.target.len(), "settings stage done");

    let attachments = gateway::translate_gateways(&mut ctx);
    debug!(
        produced = ctx.target.len(),
        virtual_services = attachments.len(),
        "gateway stage done"
    );

    virtual_service::translate_virtual_services(&mut ctx, &attachments);
    route_table::translate_route_tables(&mut ctx);
    debug!(produced = ctx.target.len(), "route stage done");

    options::translate_detached_options(&mut ctx);

    validation::correct(&mut ctx);
    debug!(produced = ctx.target.len(), "validation corrections done");

    let out = ctx.finish();
    info!(
        produced = out.target.len(),
        diagnostics = out.diagnostics.len(),
        "translation finished"
    );
    out
}

pub(crate) fn identity_of<S>(kind: SourceKind, resource: &Resource<S>) -> ResourceIdentity {
    ResourceIdentity::new(kind, resource.namespace(), resource.name())
}

#[cfg(test)]
pub(crate) mod testing {
    use serde_json::Value;

    use crate::source::{SourceCache, SourceResource};

    /// Build a cache from full `kind`/`metadata`/`spec` documents.
    pub fn cache(documents: Vec<Value>) -> SourceCache {
        documents
            .into_iter()
            .map(|doc| {
                let kind = doc["kind"].as_str().expect("document kind").to_string();
                SourceResource::from_document(&kind, doc)
                    .expect("document decodes")
                    .expect("known kind")
            })
            .collect()
    }
}

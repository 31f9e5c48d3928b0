//! Gloo Edge to Gateway API migration.
//!
//! The engine reads Gloo Edge resources (Gateway, VirtualService,
//! RouteTable, Upstream and the option resources) and produces Gateway API
//! and kgateway resources. Anything that cannot be carried over exactly is
//! recorded as a diagnostic against the source resource it came from; a
//! run never fails because of a translation gap.
//!
//! # Front ends
//!
//! - [`loader`] reads YAML or JSON documents into a [`source::SourceCache`].
//! - [`decompile`] rebuilds the same source documents from a decoded proxy
//!   configuration dump (see the `envoy-dump-core` crate).
//!
//! Both feed [`translate::translate_with`], so everything downstream of the
//! source cache is shared.
//!
//! # Pipeline
//!
//! - [`resolve`] looks up cross-references and classifies cluster names
//! - [`rules`] holds the field mapping for every policy domain
//! - [`translate`] visits the source cache in dependency order
//! - [`target`] collects and renders the output resources
//! - [`diagnostics`] is the append-only ledger
//!
//! # Reporting
//!
//! - [`summary`] counts what was read, produced and recorded
//! - [`report`] renders the ledger as coloured text or JSON
//!
//! # Examples
//!
//! ```ignore
//! use gloo_migrate::config::MigrateConfig;
//! use gloo_migrate::loader::load_paths;
//! use gloo_migrate::translate::translate;
//!
//! let source = load_paths(&["gloo/".into()])?;
//! let out = translate(&source, &MigrateConfig::default());
//! println!("{}", gloo_migrate::target::render::render_yaml(&out.target)?);
//! ```

pub mod config;
pub mod context;
pub mod decompile;
pub mod diagnostics;
pub mod identity;
pub mod loader;
pub mod report;
pub mod resolve;
pub mod rules;
pub mod source;
pub mod summary;
pub mod target;
pub mod translate;

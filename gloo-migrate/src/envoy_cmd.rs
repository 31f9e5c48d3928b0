//! `envoy`: a proxy configuration dump in, Gateway API resources out.
//!
//! The dump is decoded, rebuilt into source documents and then handed to the
//! same translator `convert` uses. Findings from the rebuild step come first
//! in the report.

use anyhow::{Context, Result};
use envoy_dump_core::decode_file;
use gloo_migrate::decompile::decompile;
use gloo_migrate::translate::translate_with;
use tracing::info;

use crate::cli::EnvoyArgs;
use crate::path_guard::ensure_output_outside_inputs;
use crate::{finish, read_config, Finish};

pub fn run_envoy(args: EnvoyArgs) -> Result<()> {
    if let Some(output) = &args.output {
        ensure_output_outside_inputs(output, std::slice::from_ref(&args.input))?;
    }

    let mut config = read_config(args.config.as_deref())?;
    config.gateway_class_name = config.decompile.gateway_class_name.clone();

    let snapshot = decode_file(&args.input)
        .with_context(|| format!("failed to decode configuration dump {}", args.input.display()))?;
    let read = snapshot.listeners.len() + snapshot.route_configs.len() + snapshot.clusters.len();

    let (source, diagnostics) = decompile(&snapshot, &config);
    info!(
        resources = source.len(),
        findings = diagnostics.len(),
        "rebuilt source documents from dump"
    );
    let translation = translate_with(&source, &config, diagnostics);

    finish(
        &translation,
        Finish {
            output: args.output.as_ref(),
            report: args.report,
            strict: args.strict,
            read,
        },
    )
}

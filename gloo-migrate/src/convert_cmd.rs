//! `convert`: structured resource documents in, Gateway API resources out.

use anyhow::{Context, Result};
use gloo_migrate::loader::load_paths;
use gloo_migrate::translate::translate;
use tracing::info;

use crate::cli::ConvertArgs;
use crate::path_guard::ensure_output_outside_inputs;
use crate::{finish, read_config, Finish};

pub fn run_convert(args: ConvertArgs) -> Result<()> {
    if let Some(output) = &args.output {
        ensure_output_outside_inputs(output, &args.input)?;
    }

    let mut config = read_config(args.config.as_deref())?;
    if args.use_listener_sets {
        config.use_listener_sets = true;
    }
    if let Some(class) = &args.gateway_class {
        config.gateway_class_name = class.clone();
    }

    let source = load_paths(&args.input).context("failed to load source documents")?;
    info!(resources = source.len(), "source cache ready");
    let translation = translate(&source, &config);

    finish(
        &translation,
        Finish {
            output: args.output.as_ref(),
            report: args.report,
            strict: args.strict,
            read: source.len(),
        },
    )
}

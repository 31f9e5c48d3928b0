use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use gloo_migrate::config::{load_config, MigrateConfig};
use gloo_migrate::context::Translation;
use gloo_migrate::report::{render_json, render_text};
use gloo_migrate::summary::summarize;
use gloo_migrate::target::render::render_yaml;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, ReportFormat};

mod cli;
mod convert_cmd;
mod envoy_cmd;
mod path_guard;

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Convert(args) => {
            init_tracing(args.verbose);
            convert_cmd::run_convert(args)
        }
        Command::Envoy(args) => {
            init_tracing(args.verbose);
            envoy_cmd::run_envoy(args)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn read_config(path: Option<&Path>) -> Result<MigrateConfig> {
    match path {
        Some(path) => Ok(load_config(path)?),
        None => Ok(MigrateConfig::default()),
    }
}

/// Output options shared by both subcommands.
struct Finish<'a> {
    output: Option<&'a PathBuf>,
    report: ReportFormat,
    strict: bool,
    read: usize,
}

/// Write the YAML, print the report, then apply `--strict`.
fn finish(translation: &Translation, opts: Finish<'_>) -> Result<()> {
    let yaml = render_yaml(&translation.target).context("failed to render output YAML")?;
    match opts.output {
        Some(path) => fs::write(path, &yaml)
            .with_context(|| format!("failed to write output file {}", path.display()))?,
        None => print!("{yaml}"),
    }

    let summary = summarize(opts.read, translation);
    let report = match opts.report {
        ReportFormat::Text => render_text(&translation.diagnostics, summary),
        ReportFormat::Json => render_json(&translation.diagnostics, summary)?,
    };
    eprintln!("{report}");

    if opts.strict && summary.blocking() > 0 {
        bail!(
            "strict mode failed: {} unsupported and {} unknown reference findings",
            summary.diagnostics.unsupported,
            summary.diagnostics.unknown_reference
        );
    }
    Ok(())
}

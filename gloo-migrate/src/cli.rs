use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "gloo-migrate",
    version,
    about = "Migrate Gloo Edge resources to Gateway API and kgateway"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Translate Gloo Edge resource documents (YAML or JSON).
    Convert(ConvertArgs),
    /// Rebuild resources from a proxy configuration dump, then translate them.
    Envoy(EnvoyArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ReportFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
pub struct ConvertArgs {
    /// Files or directories to read. Directories are walked for .yaml, .yml and .json.
    #[arg(short, long, required = true, num_args = 1..)]
    pub input: Vec<PathBuf>,
    /// Write the YAML output here instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Settings file replacing the built-in defaults.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Put virtual service listeners in ListenerSets.
    #[arg(long)]
    pub use_listener_sets: bool,
    /// gatewayClassName for every generated Gateway.
    #[arg(long)]
    pub gateway_class: Option<String>,
    /// Diagnostics report format (written to stderr).
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub report: ReportFormat,
    /// Debug logging.
    #[arg(short, long)]
    pub verbose: bool,
    /// Fail when any finding is unsupported or an unknown reference.
    #[arg(long)]
    pub strict: bool,
}

#[derive(Parser, Debug)]
pub struct EnvoyArgs {
    /// Configuration dump (JSON) taken from the proxy admin endpoint.
    #[arg(short, long)]
    pub input: PathBuf,
    /// Write the YAML output here instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Settings file replacing the built-in defaults.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Diagnostics report format (written to stderr).
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub report: ReportFormat,
    /// Debug logging.
    #[arg(short, long)]
    pub verbose: bool,
    /// Fail when any finding is unsupported or an unknown reference.
    #[arg(long)]
    pub strict: bool,
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};

    use super::{Cli, Command};

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn convert_accepts_several_inputs() {
        let cli = Cli::parse_from(["gloo-migrate", "convert", "--input", "a.yaml", "b/", "--strict"]);
        match cli.command {
            Command::Convert(args) => {
                assert_eq!(args.input.len(), 2);
                assert!(args.strict);
                assert!(!args.use_listener_sets);
            }
            Command::Envoy(_) => panic!("expected convert"),
        }
    }
}

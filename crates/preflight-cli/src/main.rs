// crates/preflight-cli/src/main.rs
// ============================================================================
// Module: API Server Preflight CLI Entry Point
// Description: Command dispatcher for startup option checks.
// Purpose: Let operators and deploy tooling check options before a rollout.
// Dependencies: clap, preflight-config, preflight-core, serde_json, thiserror,
//               tracing, tracing-subscriber
// ============================================================================

//! ## Overview
//! `apiserver-preflight check` loads a preflight file, applies feature gate
//! overrides from the command line, and prints every problem the validator
//! finds. The exit code is success only when the options are valid.
//! `apiserver-preflight features` lists the known feature gates.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use preflight_config::PreflightConfig;
use preflight_core::ErrorList;
use preflight_core::Feature;
use preflight_core::FeatureGate;
use preflight_core::FeatureGates;
use preflight_core::RegistrySet;
use thiserror::Error;
use tracing::debug;
use tracing_subscriber::EnvFilter;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable holding the log filter directive.
const LOG_ENV: &str = "APISERVER_PREFLIGHT_LOG";
/// Log filter used when [`LOG_ENV`] is unset or invalid.
const DEFAULT_LOG_FILTER: &str = "warn";

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(
    name = "apiserver-preflight",
    disable_help_subcommand = true,
    disable_version_flag = true
)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate API server options and report every problem.
    Check(CheckCommand),
    /// List known feature gates with their stage and state.
    Features(FeaturesCommand),
}

/// Arguments for `check`.
#[derive(Args, Debug)]
struct CheckCommand {
    /// Preflight file (defaults to `APISERVER_PREFLIGHT_CONFIG`, then
    /// `apiserver-preflight.toml`).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Feature gate overrides, e.g. `TokenRequest=true,ExternalKeyService=false`.
    #[arg(long, value_name = "SPEC")]
    feature_gates: Option<String>,
    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

/// Arguments for `features`.
#[derive(Args, Debug)]
struct FeaturesCommand {
    /// Preflight file whose gate overrides are shown as the effective state.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Report formats for `check`.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// One line per problem.
    Text,
    /// JSON array of problems.
    Json,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a message.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    init_tracing()?;

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&format!("apiserver-preflight {version}"))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::Check(command) => command_check(&command),
        Commands::Features(command) => command_features(&command),
    }
}

/// Installs the stderr log subscriber.
fn init_tracing() -> CliResult<()> {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|err| CliError::new(format!("failed to initialize logging: {err}")))
}

/// Prints the top-level help text.
fn show_help() -> CliResult<()> {
    let mut command = Cli::command();
    command.print_help().map_err(|err| CliError::new(output_error("stdout", &err)))?;
    write_stdout_line("").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(())
}

// ============================================================================
// SECTION: Check Command
// ============================================================================

/// Executes the check command.
fn command_check(command: &CheckCommand) -> CliResult<ExitCode> {
    let mut config = load_config(command.config.as_deref())?;
    if let Some(spec) = &command.feature_gates {
        config
            .feature_gates
            .apply_spec(spec)
            .map_err(|err| CliError::new(format!("invalid --feature-gates: {err}")))?;
    }
    debug!(
        gates = %gate_summary(&config.feature_gates),
        "loaded preflight configuration"
    );
    let errs = config
        .validate(&RegistrySet::builtin())
        .map_err(|err| CliError::new(format!("preflight check could not run: {err}")))?;

    let report = match command.format {
        OutputFormat::Text => render_text(&errs),
        OutputFormat::Json => render_json(&errs)?,
    };
    write_stdout_line(&report).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(if errs.is_empty() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Loads the preflight file.
fn load_config(path: Option<&Path>) -> CliResult<PreflightConfig> {
    PreflightConfig::load(path)
        .map_err(|err| CliError::new(format!("failed to load preflight config: {err}")))
}

/// Renders findings one per line, followed by a summary line.
fn render_text(errs: &ErrorList) -> String {
    if errs.is_empty() {
        return "preflight check passed: configuration is valid".to_string();
    }
    let mut output = String::new();
    for error in errs {
        output.push_str(&error.to_string());
        output.push('\n');
    }
    let noun = if errs.len() == 1 { "problem" } else { "problems" };
    output.push_str(&format!("preflight check failed: {} {noun} found", errs.len()));
    output
}

/// Renders findings as a pretty-printed JSON array.
fn render_json(errs: &ErrorList) -> CliResult<String> {
    serde_json::to_string_pretty(errs)
        .map_err(|err| CliError::new(format!("failed to render report: {err}")))
}

/// Summarizes gate states for logging.
fn gate_summary(gates: &FeatureGates) -> String {
    gates
        .iter()
        .map(|(feature, enabled)| format!("{feature}={enabled}"))
        .collect::<Vec<_>>()
        .join(",")
}

// ============================================================================
// SECTION: Features Command
// ============================================================================

/// Executes the features command.
fn command_features(command: &FeaturesCommand) -> CliResult<ExitCode> {
    let gates = match command.config.as_deref() {
        Some(path) => load_config(Some(path))?.feature_gates,
        None => FeatureGates::new(),
    };
    for line in feature_lines(&gates) {
        write_stdout_line(&line).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Formats one line per known feature.
fn feature_lines(gates: &FeatureGates) -> Vec<String> {
    Feature::ALL
        .into_iter()
        .map(|feature| {
            let effective = gates
                .state(feature)
                .map_or_else(|| "unset".to_string(), |enabled| enabled.to_string());
            format!(
                "{feature}\tstage={}\tdefault={}\tenabled={effective}",
                feature.stage().as_str(),
                feature.default_enabled()
            )
        })
        .collect()
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}

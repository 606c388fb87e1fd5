//! Binary entry point for the mystbuild CLI.
//!
//! ## Usage
//!
//! ```bash
//! # Build outdated documents under the current directory
//! mystbuild build
//!
//! # Rebuild everything into a custom output directory
//! mystbuild build --source-dir docs --out-dir site/myst --force
//!
//! # List what a build would write
//! mystbuild outdated --source-dir docs
//!
//! # Print one document's mdast
//! mystbuild transform docs/index.json
//! ```

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};

use mystbuild::builder::{build, transform_file};
use mystbuild::config::{CliOverrides, ResolvedConfig};
use mystbuild::discovery::outdated_documents;
use mystbuild::engine::RuleSet;
use mystbuild::error::{BuildError, OutputErrorCode};
use mystbuild::output::{
    emit_response, ErrorResponse, OutdatedResponse, StatsInfo, TransformResponse, SCHEMA_VERSION,
};

// ============================================================================
// CLI Structure
// ============================================================================

/// Convert parsed document trees into MyST page envelopes.
///
/// All output is JSON.
#[derive(Parser, Debug)]
#[command(name = "mystbuild", version, about = "Build MyST mdast from document trees")]
struct Cli {
    /// Log level for tracing output.
    #[arg(long, global = true, value_enum, default_value = "warn")]
    log_level: LogLevel,

    /// Format of the log lines written to stderr.
    #[arg(long, global = true, value_enum, default_value = "text")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

/// Log line format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Directory arguments shared by `build` and `outdated`.
#[derive(Args, Debug)]
struct DirArgs {
    /// Directory containing `<docname>.json` source trees (default: current directory).
    #[arg(long)]
    source_dir: Option<PathBuf>,

    /// Output directory (default: `_build/myst` in the source directory).
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Treat every document as outdated.
    #[arg(long)]
    force: bool,
}

impl DirArgs {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            source_dir: self.source_dir.clone(),
            out_dir: self.out_dir.clone(),
            force: self.force,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write envelopes for outdated documents and the reference manifest.
    Build {
        #[command(flatten)]
        dirs: DirArgs,
    },
    /// List outdated documents without writing anything.
    Outdated {
        #[command(flatten)]
        dirs: DirArgs,
    },
    /// Transform a single source tree file and print its mdast.
    Transform {
        /// Path to a `<docname>.json` source tree.
        file: PathBuf,
    },
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.log_level, cli.log_format);

    match execute(cli) {
        Ok(code) => code,
        Err(err) => {
            let error_code = OutputErrorCode::from(&err);
            let response = ErrorResponse::from_error(&err);

            // Errors go to stdout as JSON like every other response.
            let _ = emit_response(&response, &mut io::stdout());
            let _ = io::stdout().flush();

            ExitCode::from(error_code.code())
        }
    }
}

/// Initialize tracing subscriber.
fn init_tracing(level: LogLevel, format: LogFormat) {
    use tracing_subscriber::fmt::format::FmtSpan;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(io::stderr);
    match format {
        LogFormat::Text => subscriber.init(),
        LogFormat::Json => subscriber.json().init(),
    }
}

/// Execute the CLI command.
fn execute(cli: Cli) -> Result<ExitCode, BuildError> {
    let rules = RuleSet::standard();
    match cli.command {
        Command::Build { dirs } => execute_build(&dirs, &rules),
        Command::Outdated { dirs } => execute_outdated(&dirs),
        Command::Transform { file } => execute_transform(&file, &rules),
    }
}

fn emit<T: serde::Serialize>(response: &T) -> Result<(), BuildError> {
    emit_response(response, &mut io::stdout()).map_err(|e| BuildError::internal(e.to_string()))?;
    let _ = io::stdout().flush();
    Ok(())
}

// ============================================================================
// Command Executors
// ============================================================================

/// Execute build command.
///
/// Exits with the transform-failed code when any document failed, after
/// reporting every document.
fn execute_build(dirs: &DirArgs, rules: &RuleSet) -> Result<ExitCode, BuildError> {
    let config = ResolvedConfig::resolve(&dirs.overrides())?;
    let response = build(&config, rules)?;
    emit(&response)?;
    if response.failed() > 0 {
        return Ok(ExitCode::from(OutputErrorCode::TransformFailed.code()));
    }
    Ok(ExitCode::SUCCESS)
}

/// Execute outdated command.
fn execute_outdated(dirs: &DirArgs) -> Result<ExitCode, BuildError> {
    let config = ResolvedConfig::resolve(&dirs.overrides())?;
    let plan = outdated_documents(&config)?;
    emit(&OutdatedResponse::new(&config, &plan))?;
    Ok(ExitCode::SUCCESS)
}

/// Execute transform command.
fn execute_transform(file: &Path, rules: &RuleSet) -> Result<ExitCode, BuildError> {
    let transformed = transform_file(file, rules)?;
    let response = TransformResponse {
        status: "ok".to_string(),
        schema_version: SCHEMA_VERSION.to_string(),
        docname: transformed.docname,
        stats: StatsInfo::from(&transformed.transformation.stats),
        mdast: transformed.transformation.root,
    };
    emit(&response)?;
    Ok(ExitCode::SUCCESS)
}

// plancheck - compare strategic planning documents against a reference catalog

mod compare;
mod exit_codes;
mod inspect;
mod settings;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use plancheck_core::Subject;
use tracing_subscriber::{fmt, EnvFilter};

use exit_codes::{io_exit_code, recon_exit_code, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "plancheck")]
#[command(about = "Compare the objectives and actions of a planning document against a reference catalog")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare a submitted document's tables with the reference catalog
    #[command(after_help = "\
Examples:
  plancheck compare PEI_2024.docx --reference PEI_Estandar.xlsx
  plancheck compare PEI_2024.docx --reference PEI_Estandar.xlsx --subject action
  plancheck compare PEI_2024.docx --config pei.toml --output result.xlsx
  plancheck compare objetivos.csv --subject objective --json")]
    Compare {
        /// Submitted document (.docx, .csv, .tsv, .xlsx)
        document: PathBuf,

        /// Reference catalog workbook (defaults to [reference].file in the config)
        #[arg(long, short = 'r')]
        reference: Option<PathBuf>,

        /// Compare only this subject (default: every subject found in the document)
        #[arg(long, short = 's')]
        subject: Option<SubjectArg>,

        /// Config file (default: <config dir>/plancheck/config.toml when present)
        #[arg(long, short = 'c', env = "PLANCHECK_CONFIG")]
        config: Option<PathBuf>,

        /// Override [matching].threshold
        #[arg(long)]
        threshold: Option<f32>,

        /// Write the report to a file (.xlsx, .csv or .json)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Print the reports as JSON to stdout
        #[arg(long)]
        json: bool,

        /// Exit non-zero when any submitted element has no match
        #[arg(long)]
        fail_on_no_match: bool,
    },

    /// Show detected headers and column mappings for a document's tables
    #[command(after_help = "\
Examples:
  plancheck inspect PEI_2024.docx
  plancheck inspect PEI_2024.docx --subject objective --json")]
    Inspect {
        /// Document to inspect (.docx, .csv, .tsv, .xlsx)
        document: PathBuf,

        /// Inspect only this subject's table
        #[arg(long, short = 's')]
        subject: Option<SubjectArg>,

        /// Config file (header settings and aliases)
        #[arg(long, short = 'c', env = "PLANCHECK_CONFIG")]
        config: Option<PathBuf>,

        /// Output JSON instead of a text listing
        #[arg(long)]
        json: bool,
    },

    /// Config file utilities
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Parse and validate a config file without running a comparison
    #[command(after_help = "\
Examples:
  plancheck config validate pei.toml
  plancheck config validate")]
    Validate {
        /// Config file (default: <config dir>/plancheck/config.toml)
        path: Option<PathBuf>,
    },

    /// Print where the default config file is looked up
    Path,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub(crate) enum SubjectArg {
    /// Strategic objectives (OEI)
    #[value(alias = "oei")]
    Objective,
    /// Strategic actions (AEI)
    #[value(alias = "aei")]
    Action,
}

impl From<SubjectArg> for Subject {
    fn from(arg: SubjectArg) -> Self {
        match arg {
            SubjectArg::Objective => Subject::Objective,
            SubjectArg::Action => Subject::Action,
        }
    }
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (",
        env!("PLANCHECK_COMMIT"),
        ")",
        "\ntarget:  ",
        env!("PLANCHECK_TARGET"),
    )
}

/// Logs go to stderr so `--json` output on stdout stays clean.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Compare {
            document,
            reference,
            subject,
            config,
            threshold,
            output,
            json,
            fail_on_no_match,
        } => compare::cmd_compare(compare::CompareArgs {
            document,
            reference,
            subject: subject.map(Subject::from),
            config,
            threshold,
            output,
            json,
            fail_on_no_match,
        }),
        Commands::Inspect { document, subject, config, json } => {
            inspect::cmd_inspect(document, subject.map(Subject::from), config, json)
        }
        Commands::Config { command } => match command {
            ConfigCommands::Validate { path } => settings::cmd_config_validate(path),
            ConfigCommands::Path => settings::cmd_config_path(),
        },
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            eprintln!("error: {}", e.message);
            if let Some(hint) = e.hint {
                eprintln!("hint: {hint}");
            }
            ExitCode::from(e.code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<plancheck_recon::ReconError> for CliError {
    fn from(err: plancheck_recon::ReconError) -> Self {
        use plancheck_recon::ReconError;

        let hint = match &err {
            ReconError::SchemaDetection { .. } => {
                Some("run `plancheck inspect` on the document to see the candidate header rows")
            }
            ReconError::RequiredFieldMissing { .. } => {
                Some("map the column's header text to name_text under [aliases] in the config")
            }
            ReconError::Embedding(plancheck_recon::EmbeddingError::Timeout { .. }) => {
                Some("raise [embedding].timeout_secs or check that the endpoint is reachable")
            }
            _ => None,
        };
        Self { code: recon_exit_code(&err), message: err.to_string(), hint: hint.map(str::to_string) }
    }
}

impl From<plancheck_io::IoError> for CliError {
    fn from(err: plancheck_io::IoError) -> Self {
        use plancheck_io::IoError;

        let hint = match &err {
            IoError::Unsupported { extension, .. } if extension == "pdf" => {
                Some("convert the PDF to .docx first".to_string())
            }
            IoError::SheetMissing { .. } => {
                Some("set [reference].objective_sheet / action_sheet in the config".to_string())
            }
            _ => None,
        };
        Self { code: io_exit_code(&err), message: err.to_string(), hint }
    }
}

//! Nudge CLI - Command-line interface for the nudge engine
//!
//! Commands:
//! - score: Score pre-assembled inputs
//! - assess: Derive inputs from a payment request and score it
//! - patterns: Review an account's latest transaction for harmful patterns
//! - summary: Build the spending summary for an account
//! - doctor: Diagnose configuration and environment

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use nudge_engine::behavior::{
    FallbackWriter, InterventionPlanner, InterventionWriter, TransactionReview,
};
use nudge_engine::{
    spending_summary, EngineConfig, NudgeError, PaymentRequest, RiskAnalyzer, ScoringInput,
    SpendingSummary, Transaction, UserProfile, ENGINE_VERSION, PRODUCER_NAME,
};

/// Nudge - Impulse risk scoring for payments
#[derive(Parser)]
#[command(name = "nudge")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Score payments for impulse risk and review spending behavior", long_about = None)]
struct Cli {
    /// Engine configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct IoArgs {
    /// Input file path (use - for stdin)
    #[arg(short, long, default_value = "-")]
    input: PathBuf,

    /// Output file path (use - for stdout)
    #[arg(short, long, default_value = "-")]
    output: PathBuf,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a ScoringInput document
    Score {
        #[command(flatten)]
        io: IoArgs,
    },

    /// Assess a PaymentRequest document
    Assess {
        #[command(flatten)]
        io: IoArgs,

        /// Evaluation time (RFC 3339), defaults to now
        #[arg(long)]
        now: Option<String>,
    },

    /// Review the latest transaction of an account for harmful patterns
    Patterns {
        #[command(flatten)]
        io: IoArgs,

        /// Evaluation time (RFC 3339), defaults to now
        #[arg(long)]
        now: Option<String>,

        /// Seed for the intervention gate (reproducible output)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Build the spending summary for an account
    Summary {
        #[command(flatten)]
        io: IoArgs,

        /// Evaluation time (RFC 3339), defaults to now
        #[arg(long)]
        now: Option<String>,
    },

    /// Diagnose configuration and environment
    Doctor {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// A profile together with its transaction history
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountInput {
    profile: UserProfile,
    #[serde(default)]
    history: Vec<Transaction>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PatternsReport {
    transaction: Transaction,
    review: TransactionReview,
    profile: UserProfile,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SummaryReport {
    #[serde(flatten)]
    summary: SpendingSummary,
    insight: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string()));
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .compact()
        .init();
}

fn run(cli: Cli) -> Result<(), NudgeCliError> {
    match cli.command {
        Commands::Score { io } => {
            let input: ScoringInput = serde_json::from_str(&read_input(&io.input)?)?;
            let analyzer = RiskAnalyzer::new(load_config(cli.config.as_deref())?);
            let result = analyzer.score(&input);
            write_output(&io, &result)
        }

        Commands::Assess { io, now } => {
            let now = parse_now(now.as_deref())?;
            let analyzer = RiskAnalyzer::new(load_config(cli.config.as_deref())?);
            let request = PaymentRequest::from_json(&read_input(&io.input)?)?;
            let assessment = analyzer.assess_payment(&request, now)?;
            write_output(&io, &assessment)
        }

        Commands::Patterns { io, now, seed } => {
            cmd_patterns(&io, now.as_deref(), seed, cli.config.as_deref())
        }

        Commands::Summary { io, now } => {
            let now = parse_now(now.as_deref())?;
            let config = load_config(cli.config.as_deref())?;
            let account: AccountInput = serde_json::from_str(&read_input(&io.input)?)?;
            let summary = spending_summary(&account.profile, &account.history, now, &config);
            let insight = FallbackWriter.behavior_insight(&summary);
            write_output(&io, &SummaryReport { summary, insight })
        }

        Commands::Doctor { json } => cmd_doctor(cli.config.as_deref(), json),
    }
}

fn cmd_patterns(
    io: &IoArgs,
    now: Option<&str>,
    seed: Option<u64>,
    config_path: Option<&Path>,
) -> Result<(), NudgeCliError> {
    let now = parse_now(now)?;
    let config = load_config(config_path)?;
    let AccountInput {
        mut profile,
        history,
    } = serde_json::from_str(&read_input(&io.input)?)?;

    let latest = history
        .iter()
        .max_by_key(|tx| tx.timestamp)
        .cloned()
        .ok_or(NudgeCliError::NoTransactions)?;

    let mut planner = match seed {
        Some(seed) => InterventionPlanner::seeded(seed, &config),
        None => InterventionPlanner::from_entropy(&config),
    };
    let review = planner.review_transaction(&mut profile, &history, &latest, now, &config);

    info!(
        patterns = review.patterns.len(),
        interventions = review.interventions.len(),
        risk_score = review.account_risk.score,
        "reviewed latest transaction"
    );

    let report = PatternsReport {
        transaction: latest,
        review,
        profile,
    };
    write_output(io, &report)
}

fn cmd_doctor(config_path: Option<&Path>, json: bool) -> Result<(), NudgeCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "engine_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Nudge engine version {}", ENGINE_VERSION),
    });

    // Check configuration file if provided
    match config_path {
        Some(path) if !path.exists() => checks.push(DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Error,
            message: format!("Config file {} does not exist", path.display()),
        }),
        Some(path) => match load_config(Some(path)) {
            Ok(config) => checks.push(DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Ok,
                message: format!(
                    "Config valid (low-control window {}:00-{}:00, UTC offset {} min)",
                    config.low_control_window.start_hour,
                    config.low_control_window.end_hour,
                    config.utc_offset_minutes
                ),
            }),
            Err(e) => checks.push(DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Error,
                message: CliError::from(e).message,
            }),
        },
        None => checks.push(DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Warning,
            message: "No config file given, using defaults".to_string(),
        }),
    }

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (pass --input <file>)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (ready for --input -)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: ENGINE_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Nudge Doctor Report");
        println!("===================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report.checks.iter().any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(NudgeCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig, NudgeCliError> {
    match path {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            Ok(EngineConfig::from_json(&fs::read_to_string(path)?)?)
        }
        None => Ok(EngineConfig::default()),
    }
}

fn parse_now(now: Option<&str>) -> Result<DateTime<Utc>, NudgeCliError> {
    match now {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| NudgeCliError::InvalidTime(format!("{}: {}", raw, e))),
        None => Ok(Utc::now()),
    }
}

fn read_input(input: &Path) -> Result<String, NudgeCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn write_output<T: Serialize>(io: &IoArgs, value: &T) -> Result<(), NudgeCliError> {
    let output_data = if io.pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };

    if io.output.to_string_lossy() == "-" {
        println!("{}", output_data);
    } else {
        fs::write(&io.output, format!("{}\n", output_data))?;
    }
    Ok(())
}

// Error types

#[derive(Debug)]
enum NudgeCliError {
    Io(io::Error),
    Engine(NudgeError),
    Json(serde_json::Error),
    InvalidTime(String),
    NoTransactions,
    DoctorFailed,
}

impl From<io::Error> for NudgeCliError {
    fn from(e: io::Error) -> Self {
        NudgeCliError::Io(e)
    }
}

impl From<NudgeError> for NudgeCliError {
    fn from(e: NudgeError) -> Self {
        NudgeCliError::Engine(e)
    }
}

impl From<serde_json::Error> for NudgeCliError {
    fn from(e: serde_json::Error) -> Self {
        NudgeCliError::Json(e)
    }
}

#[derive(Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<NudgeCliError> for CliError {
    fn from(e: NudgeCliError) -> Self {
        match e {
            NudgeCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            NudgeCliError::Engine(e) => {
                let (code, hint) = match &e {
                    NudgeError::ParseError(_) | NudgeError::JsonError(_) => {
                        ("PARSE_ERROR", "Check the input document fields")
                    }
                    NudgeError::UnknownCategory(_) => (
                        "UNKNOWN_CATEGORY",
                        "Use one of FOOD, ENTERTAINMENT, SHOPPING, BILLS, TRANSPORT, GAMBLING, LUXURY",
                    ),
                    NudgeError::InvalidAmount(_) => {
                        ("INVALID_AMOUNT", "Amounts must be finite and non-negative")
                    }
                    NudgeError::InvalidConfig(_) => {
                        ("INVALID_CONFIG", "Run 'nudge doctor --config <file>' for details")
                    }
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            NudgeCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            NudgeCliError::InvalidTime(msg) => CliError {
                code: "INVALID_TIME".to_string(),
                message: msg,
                hint: Some("Use RFC 3339, e.g. 2024-03-10T23:30:00Z".to_string()),
            },
            NudgeCliError::NoTransactions => CliError {
                code: "NO_TRANSACTIONS".to_string(),
                message: "History contains no transactions".to_string(),
                hint: Some("Include at least one transaction in history".to_string()),
            },
            NudgeCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}

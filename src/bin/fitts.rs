//! Fitts CLI - Command-line interface for the Fitts engine
//!
//! Commands:
//! - analyze: Compute Fitts' Law metrics for an exported session
//! - simulate: Run a session with synthetic pointer input and export it
//! - config: Print the default configuration or validate a config file
//! - doctor: Diagnose the installation

use clap::{Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::TAU;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use fitts_engine::analysis::{AnalysisResult, PerformanceAnalyzer};
use fitts_engine::geometry::{distance, shannon};
use fitts_engine::{
    ExperimentConfig, ExportDocument, FittsError, ManualClock, Session, ENGINE_VERSION,
    PRODUCER_NAME,
};

/// Fitts - Trial sequencing and analysis for pointing experiments
#[derive(Parser)]
#[command(name = "fitts")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Run and analyse ISO 9241-9 pointing experiments", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute throughput, regression and histogram for an export
    Analyze {
        /// Export file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Only analyse this data set
        #[arg(long)]
        set: Option<u32>,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    /// Drive a session with synthetic pointer input and write the export
    Simulate {
        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Experiment configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Participant identifier written to the export
        #[arg(long, default_value = "simulated")]
        participant: String,

        /// Device label written to the export
        #[arg(long, default_value = "synthetic")]
        device: String,

        /// Random seed
        #[arg(long, default_value = "1")]
        seed: u64,

        /// Aim scatter as a fraction of the target radius (above 1 produces misses)
        #[arg(long, default_value = "0.9")]
        jitter: f64,

        /// Give up after this many presses
        #[arg(long, default_value = "100000")]
        max_presses: usize,
    },

    /// Print the default configuration or validate a config file
    Config {
        /// Config file to validate
        #[arg(long)]
        validate: Option<PathBuf>,
    },

    /// Diagnose the installation
    Doctor {
        /// Check an experiment config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human readable summary
    Text,
    /// JSON array of analysis results
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), FittsCliError> {
    match cli.command {
        Commands::Analyze { input, set, format } => cmd_analyze(&input, set, format),

        Commands::Simulate {
            output,
            config,
            participant,
            device,
            seed,
            jitter,
            max_presses,
        } => cmd_simulate(
            &output,
            config.as_deref(),
            &participant,
            &device,
            seed,
            jitter,
            max_presses,
        ),

        Commands::Config { validate } => cmd_config(validate.as_deref()),

        Commands::Doctor { config, json } => cmd_doctor(config.as_deref(), json),
    }
}

fn read_input(input: &Path) -> Result<String, FittsCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn write_output(output: &Path, data: &str) -> Result<(), FittsCliError> {
    if output.to_string_lossy() == "-" {
        println!("{data}");
    } else {
        fs::write(output, data)?;
    }
    Ok(())
}

fn cmd_analyze(input: &Path, set: Option<u32>, format: OutputFormat) -> Result<(), FittsCliError> {
    let document = ExportDocument::from_json(&read_input(input)?)?;

    let results: Vec<AnalysisResult> = match set {
        Some(id) => {
            let exported = document.data_set(id).ok_or(FittsCliError::SetNotFound(id))?;
            vec![PerformanceAnalyzer::analyze(id, &exported.to_data_set())]
        }
        None => document
            .data
            .iter()
            .map(|exported| PerformanceAnalyzer::analyze(exported.id, &exported.to_data_set()))
            .collect(),
    };
    info!(
        participant = %document.id,
        data_sets = results.len(),
        "analysed export"
    );

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(&results)?),
        OutputFormat::JsonPretty => println!("{}", serde_json::to_string_pretty(&results)?),
        OutputFormat::Text => print_summary(&document, &results),
    }
    Ok(())
}

fn print_summary(document: &ExportDocument, results: &[AnalysisResult]) {
    println!("Fitts Analysis Report");
    println!("=====================");
    println!("Participant: {}", document.id);
    println!("Device:      {}", document.device);

    for result in results {
        println!("\nData set {} ({})", result.data_set_id, result.colour);
        match result.mean_throughput() {
            Some(tp) => println!("  Mean throughput: {tp:.2} bits/s"),
            None => println!("  Mean throughput: n/a"),
        }
        match &result.regression {
            Some(r) => println!("  Regression:      MT = {:.1} + {:.1} * IDe ms", r.a, r.b),
            None => println!("  Regression:      n/a"),
        }

        println!("  Conditions:");
        for group in &result.groups {
            let ide = group
                .ide
                .map(|v| format!("{v:.2}"))
                .unwrap_or_else(|| "n/a".to_string());
            let tp = group
                .mean_throughput
                .map(|v| format!("{v:.2}"))
                .unwrap_or_else(|| "n/a".to_string());
            println!(
                "    D={:<6} W={:<6} n={:<4} MT={:>7.1} ms  IDe={:<5} TP={}",
                group.condition.distance,
                group.condition.width,
                group.count,
                group.mean_time,
                ide,
                tp
            );
        }
    }
}

fn cmd_simulate(
    output: &Path,
    config: Option<&Path>,
    participant: &str,
    device: &str,
    seed: u64,
    jitter: f64,
    max_presses: usize,
) -> Result<(), FittsCliError> {
    let config = match config {
        Some(path) => ExperimentConfig::load(path)?,
        None => ExperimentConfig::default(),
    };

    let clock = ManualClock::new(0);
    let mut session = Session::with_clock(config, Box::new(clock.clone()))?;
    let mut rng = StdRng::seed_from_u64(seed);
    let mut presses = 0;

    while !session.state().is_terminal() {
        if presses >= max_presses {
            return Err(FittsCliError::SimulationStalled(presses));
        }

        // manual progression: move on once every target of the ring was acquired
        let engine = session.engine();
        if !session.config().iso.randomize && engine.current_count() >= engine.iso_positions().len()
        {
            session.advance_battery()?;
            continue;
        }

        let Some(target) = session.engine().target().copied() else {
            warn!("no live target, stopping simulation");
            break;
        };

        let angle = rng.random_range(0.0..TAU);
        let reach = jitter * target.radius() * rng.random::<f64>().sqrt();
        let aim = (target.x + reach * angle.cos(), target.y + reach * angle.sin());

        let from = *session.pointer();
        let movement_time =
            120.0 + 150.0 * shannon(distance(&from, &aim), target.w) + rng.random_range(-40.0..40.0);
        let steps = 8;
        let step_ms = (movement_time.max(steps as f64) / steps as f64).round() as i64;
        for i in 1..=steps {
            let f = i as f64 / steps as f64;
            clock.advance(step_ms);
            session.on_pointer_move(from.x + (aim.0 - from.x) * f, from.y + (aim.1 - from.y) * f);
        }

        let events = session.on_pointer_down(aim.0, aim.1, &[])?;
        debug!(?events, "press");
        presses += 1;
    }

    let store = session.store();
    let ids = store.ids();
    let records: usize = store.iter().map(|(_, set)| set.records.len()).sum();
    info!(presses, records, "simulation finished");

    let document = session.serialize(&ids, participant, device)?;
    write_output(output, &document.to_json()?)
}

fn cmd_config(validate: Option<&Path>) -> Result<(), FittsCliError> {
    match validate {
        Some(path) => {
            let config = ExperimentConfig::load(path)?;
            let tests = config.battery().len();
            println!(
                "{} is valid ({} targets per ring, {} battery entries)",
                path.display(),
                config.iso.num,
                tests
            );
        }
        None => println!("{}", ExperimentConfig::default().to_json()?),
    }
    Ok(())
}

fn cmd_doctor(config_path: Option<&Path>, json: bool) -> Result<(), FittsCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "engine_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Fitts engine version {ENGINE_VERSION}"),
    });

    let config = ExperimentConfig::default();
    checks.push(match config.validate() {
        Ok(()) => DoctorCheck {
            name: "default_config".to_string(),
            status: CheckStatus::Ok,
            message: format!(
                "Default battery has {} entries on a {}x{} viewport",
                config.battery().len(),
                config.viewport.width,
                config.viewport.height
            ),
        },
        Err(e) => DoctorCheck {
            name: "default_config".to_string(),
            status: CheckStatus::Error,
            message: e.to_string(),
        },
    });

    if let Some(path) = config_path {
        checks.push(config_check(path));
    }

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (analyze --input - ready)".to_string(),
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
        println!("Fitts Doctor Report");
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

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(FittsCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn config_check(path: &Path) -> DoctorCheck {
    if !path.exists() {
        return DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Warning,
            message: format!("{} does not exist, defaults will be used", path.display()),
        };
    }
    match ExperimentConfig::load(path) {
        Ok(config) => DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Ok,
            message: format!(
                "Config valid ({} targets per ring, {} battery entries)",
                config.iso.num,
                config.battery().len()
            ),
        },
        Err(e) => DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Error,
            message: e.to_string(),
        },
    }
}

// Error types

#[derive(Debug)]
enum FittsCliError {
    Io(io::Error),
    Engine(FittsError),
    Json(serde_json::Error),
    SetNotFound(u32),
    SimulationStalled(usize),
    DoctorFailed,
}

impl From<io::Error> for FittsCliError {
    fn from(e: io::Error) -> Self {
        FittsCliError::Io(e)
    }
}

impl From<FittsError> for FittsCliError {
    fn from(e: FittsError) -> Self {
        FittsCliError::Engine(e)
    }
}

impl From<serde_json::Error> for FittsCliError {
    fn from(e: serde_json::Error) -> Self {
        FittsCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<FittsCliError> for CliError {
    fn from(e: FittsCliError) -> Self {
        match e {
            FittsCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            FittsCliError::Engine(e @ FittsError::InvalidConfig(_)) => CliError {
                code: "CONFIG_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'fitts config' to see a valid configuration".to_string()),
            },
            FittsCliError::Engine(e) => CliError {
                code: "ENGINE_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            FittsCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            FittsCliError::SetNotFound(id) => CliError {
                code: "SET_NOT_FOUND".to_string(),
                message: format!("Data set {id} is not in the export"),
                hint: Some("Omit --set to analyse every data set".to_string()),
            },
            FittsCliError::SimulationStalled(presses) => CliError {
                code: "SIMULATION_STALLED".to_string(),
                message: format!("Battery not finished after {presses} presses"),
                hint: Some("Lower --jitter or raise --max-presses".to_string()),
            },
            FittsCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_check_statuses() {
        let missing = std::env::temp_dir().join("fitts-doctor-missing-config.json");
        let _ = fs::remove_file(&missing);
        assert!(matches!(config_check(&missing).status, CheckStatus::Warning));

        let dir = std::env::temp_dir();
        let valid = dir.join(format!("fitts-doctor-valid-{}.json", std::process::id()));
        fs::write(&valid, "{}").unwrap();
        assert!(matches!(config_check(&valid).status, CheckStatus::Ok));

        let invalid = dir.join(format!("fitts-doctor-invalid-{}.json", std::process::id()));
        fs::write(&invalid, r#"{"iso": {"num": 0}}"#).unwrap();
        assert!(matches!(config_check(&invalid).status, CheckStatus::Error));

        fs::remove_file(valid).unwrap();
        fs::remove_file(invalid).unwrap();
    }
}

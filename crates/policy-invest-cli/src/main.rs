mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::analysis::AnalyzeArgs;
use commands::loans::ScheduleArgs;
use commands::returns::IrrArgs;
use commands::scenarios::{ScenariosArgs, SensitivityArgs};

/// Policy-loan investment viability analysis
#[derive(Parser)]
#[command(
    name = "pia",
    version,
    about = "Policy-loan investment viability analysis",
    long_about = "A CLI for evaluating capital projects financed partly by a concessional \
                  policy loan. Projects cash flows, amortizes both loans through grace and \
                  repayment, and reports NPV, IRR, payback, DSCR, scenario and sensitivity \
                  results and a scale-tiered grade."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log level used when RUST_LOG is unset (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full investment analysis (NPV, IRR, payback, DSCR, ROI)
    Analyze(AnalyzeArgs),
    /// Analyse and grade the investment against its scale tier
    Grade(AnalyzeArgs),
    /// Compare pessimistic, neutral and optimistic scenarios
    Scenarios(ScenariosArgs),
    /// One-way sweep or two-way grid over key assumptions
    Sensitivity(SensitivityArgs),
    /// Build a grace + equal-principal loan schedule
    Schedule(ScheduleArgs),
    /// Solve IRR (and optionally NPV and payback) for a cash-flow series
    Irr(IrrArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing(level: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("policy_invest_core={level},pia={level}").into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);
    tracing::debug!(output = ?cli.output, "dispatching command");

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Analyze(args) => commands::analysis::run_analyze(args),
        Commands::Grade(args) => commands::analysis::run_grade(args),
        Commands::Scenarios(args) => commands::scenarios::run_scenarios(args),
        Commands::Sensitivity(args) => commands::scenarios::run_sensitivity(args),
        Commands::Schedule(args) => commands::loans::run_schedule(args),
        Commands::Irr(args) => commands::returns::run_irr(args),
        Commands::Version => {
            println!("pia {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}

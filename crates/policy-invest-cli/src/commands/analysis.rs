use clap::{Args, ValueEnum};
use serde_json::Value;

use policy_invest_core::analysis::analyze_investment;
use policy_invest_core::grading::analyze_and_grade;
use policy_invest_core::input::{InvestmentInput, LoanTerms, RevenueBase, ScenarioKind};

use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ScenarioArg {
    Pessimistic,
    Neutral,
    Optimistic,
}

impl From<ScenarioArg> for ScenarioKind {
    fn from(arg: ScenarioArg) -> Self {
        match arg {
            ScenarioArg::Pessimistic => ScenarioKind::Pessimistic,
            ScenarioArg::Neutral => ScenarioKind::Neutral,
            ScenarioArg::Optimistic => ScenarioKind::Optimistic,
        }
    }
}

/// Investment assumptions, from a file, stdin, or flags
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Path to a JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Total capital outlay at year 0
    #[arg(long)]
    pub initial_investment: Option<f64>,

    /// Year-1 revenue
    #[arg(long)]
    pub revenue: Option<f64>,

    /// Operating profit as a percent of revenue
    #[arg(long, allow_hyphen_values = true)]
    pub profit_rate: Option<f64>,

    /// Corporate tax rate in percent
    #[arg(long, default_value_t = 0.0)]
    pub tax_rate: f64,

    /// Discount rate in percent
    #[arg(long)]
    pub discount_rate: Option<f64>,

    /// Analysis horizon in years
    #[arg(long)]
    pub horizon: Option<u32>,

    /// Annual revenue growth in percent
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub growth_rate: f64,

    /// Policy loan as amount:rate:grace:repayment (e.g. "1000000000:2:2:5")
    #[arg(long)]
    pub policy_loan: Option<String>,

    /// Other debt as amount:rate:grace:repayment
    #[arg(long)]
    pub other_debt: Option<String>,

    /// Scenario to apply
    #[arg(long, value_enum, default_value = "neutral")]
    pub scenario: ScenarioArg,
}

pub fn parse_loan(spec: &str) -> Result<LoanTerms, Box<dyn std::error::Error>> {
    let parts: Vec<&str> = spec.split(':').collect();
    if parts.len() != 4 {
        return Err(format!(
            "Loan must be amount:rate:grace:repayment, got '{}'",
            spec
        )
        .into());
    }
    Ok(LoanTerms::new(
        parts[0].parse()?,
        parts[1].parse()?,
        parts[2].parse()?,
        parts[3].parse()?,
    ))
}

/// Resolve the investment record: `--input`, then piped stdin, then flags.
pub fn load_investment(args: &AnalyzeArgs) -> Result<InvestmentInput, Box<dyn std::error::Error>> {
    if let Some(ref path) = args.input {
        return input::file::read_input(path);
    }
    if let Some(data) = input::stdin::read_stdin()? {
        return Ok(serde_json::from_value(data)?);
    }

    let initial_investment = args
        .initial_investment
        .ok_or("--initial-investment is required (or provide --input)")?;
    let revenue = args
        .revenue
        .ok_or("--revenue is required (or provide --input)")?;
    let operating_profit_rate = args
        .profit_rate
        .ok_or("--profit-rate is required (or provide --input)")?;
    let discount_rate = args
        .discount_rate
        .ok_or("--discount-rate is required (or provide --input)")?;
    let horizon_years = args
        .horizon
        .ok_or("--horizon is required (or provide --input)")?;

    Ok(InvestmentInput {
        initial_investment,
        policy_loan: args
            .policy_loan
            .as_deref()
            .map(parse_loan)
            .transpose()?
            .unwrap_or_default(),
        other_debt: args
            .other_debt
            .as_deref()
            .map(parse_loan)
            .transpose()?
            .unwrap_or_default(),
        revenue: RevenueBase::Flat(revenue),
        operating_profit_rate,
        tax_rate: args.tax_rate,
        discount_rate,
        horizon_years,
        growth_rate: args.growth_rate,
        scenario: args.scenario.into(),
        ..Default::default()
    })
}

pub fn run_analyze(args: AnalyzeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let investment = load_investment(&args)?;
    let result = analyze_investment(&investment)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_grade(args: AnalyzeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let investment = load_investment(&args)?;
    let result = analyze_and_grade(&investment)?;
    Ok(serde_json::to_value(result)?)
}

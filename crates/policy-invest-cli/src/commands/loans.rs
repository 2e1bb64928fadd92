use clap::Args;
use serde_json::Value;

use policy_invest_core::input::LoanTerms;
use policy_invest_core::loans::amortization::{build_loan_schedule, LoanScheduleInput};

use crate::input;

/// Arguments for a single loan schedule
#[derive(Args)]
pub struct ScheduleArgs {
    /// Path to a JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Amount borrowed
    #[arg(long)]
    pub amount: Option<f64>,

    /// Annual interest rate in percent
    #[arg(long, default_value_t = 0.0)]
    pub rate: f64,

    /// Interest-only years
    #[arg(long, default_value_t = 0)]
    pub grace: u32,

    /// Years of equal principal repayment
    #[arg(long, default_value_t = 1)]
    pub repayment: u32,

    /// Years to schedule (defaults to grace + repayment)
    #[arg(long)]
    pub horizon: Option<u32>,
}

pub fn run_schedule(args: ScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let schedule_input: LoanScheduleInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let amount = args
            .amount
            .ok_or("--amount is required (or provide --input)")?;
        LoanScheduleInput {
            loan: LoanTerms::new(amount, args.rate, args.grace, args.repayment),
            horizon_years: args
                .horizon
                .unwrap_or(args.grace.saturating_add(args.repayment.max(1))),
        }
    };

    let result = build_loan_schedule(&schedule_input)?;
    Ok(serde_json::to_value(result)?)
}

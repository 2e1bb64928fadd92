use clap::{Args, ValueEnum};
use serde_json::Value;

use policy_invest_core::scenarios::scenario::{ScenarioComparisonInput, ScenarioWeights};
use policy_invest_core::scenarios::sensitivity::{
    default_perturbations, SensitivityAxis, SensitivityMetric, SensitivityParameter,
    SensitivityRequest, TwoWaySensitivityInput,
};
use policy_invest_core::scenarios::{
    compare_scenarios, run_sensitivity as sweep, two_way_sensitivity,
};

use super::analysis::{load_investment, AnalyzeArgs};

/// Arguments for a three-way scenario comparison
#[derive(Args)]
pub struct ScenariosArgs {
    #[command(flatten)]
    pub investment: AnalyzeArgs,

    /// Probabilities for pessimistic,neutral,optimistic (e.g. "0.2,0.6,0.2")
    #[arg(long, value_delimiter = ',')]
    pub weights: Option<Vec<f64>>,

    /// Revenue shift magnitude in percent replacing the presets
    #[arg(long)]
    pub adjustment: Option<f64>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ParameterArg {
    Revenue,
    ProfitRate,
    DiscountRate,
    GrowthRate,
}

impl From<ParameterArg> for SensitivityParameter {
    fn from(arg: ParameterArg) -> Self {
        match arg {
            ParameterArg::Revenue => SensitivityParameter::Revenue,
            ParameterArg::ProfitRate => SensitivityParameter::ProfitRate,
            ParameterArg::DiscountRate => SensitivityParameter::DiscountRate,
            ParameterArg::GrowthRate => SensitivityParameter::GrowthRate,
        }
    }
}

/// Arguments for sensitivity analysis
#[derive(Args)]
pub struct SensitivityArgs {
    #[command(flatten)]
    pub investment: AnalyzeArgs,

    /// Parameter for a one-way sweep
    #[arg(long, value_enum, default_value = "revenue")]
    pub parameter: ParameterArg,

    /// Relative perturbations in percent (comma-separated)
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub perturbations: Option<Vec<f64>>,

    /// First grid axis as parameter:min:max:step (e.g. "discount_rate:6:10:1");
    /// together with --var2 this runs a two-way grid instead of a sweep
    #[arg(long)]
    pub var1: Option<String>,

    /// Second grid axis as parameter:min:max:step
    #[arg(long)]
    pub var2: Option<String>,

    /// Report IRR instead of NPV in a two-way grid
    #[arg(long)]
    pub irr: bool,
}

fn parse_axis(spec: &str) -> Result<SensitivityAxis, Box<dyn std::error::Error>> {
    let parts: Vec<&str> = spec.split(':').collect();
    if parts.len() != 4 {
        return Err(format!(
            "Sensitivity axis must be parameter:min:max:step, got '{}'",
            spec
        )
        .into());
    }
    let parameter: SensitivityParameter =
        serde_json::from_value(Value::String(parts[0].replace('-', "_")))
            .map_err(|_| {
                format!(
                    "Unknown parameter '{}'. Available: revenue, profit_rate, discount_rate, growth_rate",
                    parts[0]
                )
            })?;
    Ok(SensitivityAxis {
        parameter,
        min: parts[1].parse()?,
        max: parts[2].parse()?,
        step: parts[3].parse()?,
    })
}

pub fn run_scenarios(args: ScenariosArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut investment = load_investment(&args.investment)?;
    if args.adjustment.is_some() {
        investment.scenario_adjustment = args.adjustment;
    }
    let weights = match args.weights.as_deref() {
        None => ScenarioWeights::default(),
        Some([pessimistic, neutral, optimistic]) => ScenarioWeights {
            pessimistic: *pessimistic,
            neutral: *neutral,
            optimistic: *optimistic,
        },
        Some(_) => return Err("--weights takes exactly three values".into()),
    };

    let result = compare_scenarios(&ScenarioComparisonInput {
        investment,
        weights,
    })?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_sensitivity(args: SensitivityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let investment = load_investment(&args.investment)?;

    match (args.var1.as_deref(), args.var2.as_deref()) {
        (Some(v1), Some(v2)) => {
            let result = two_way_sensitivity(&TwoWaySensitivityInput {
                investment,
                variable_1: parse_axis(v1)?,
                variable_2: parse_axis(v2)?,
                metric: if args.irr {
                    SensitivityMetric::Irr
                } else {
                    SensitivityMetric::Npv
                },
            })?;
            Ok(serde_json::to_value(result)?)
        }
        (None, None) => {
            let result = sweep(&SensitivityRequest {
                investment,
                parameter: args.parameter.into(),
                perturbations: args.perturbations.unwrap_or_else(default_perturbations),
            })?;
            Ok(serde_json::to_value(result)?)
        }
        _ => Err("--var1 and --var2 must be given together".into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_axis() {
        let axis = parse_axis("discount-rate:6:10:1").unwrap();
        assert_eq!(axis.parameter, SensitivityParameter::DiscountRate);
        assert_eq!(axis.max, 10.0);
        assert!(parse_axis("wacc:1:2:1").is_err());
        assert!(parse_axis("revenue:1:2").is_err());
    }
}

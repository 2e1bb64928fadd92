use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::PolicyInvestError;
use crate::types::{Money, Percent};
use crate::PolicyInvestResult;

/// Longest analysis horizon the engine will project.
pub const MAX_HORIZON_YEARS: u32 = 100;

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// Terms of a single loan (policy loan or other debt).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    /// Amount borrowed
    #[serde(default)]
    pub amount: Money,
    /// Annual interest rate in percent
    #[serde(default)]
    pub annual_rate: Percent,
    /// Interest-only years before principal repayment starts
    #[serde(default)]
    pub grace_years: u32,
    /// Years over which principal is repaid in equal installments
    #[serde(default)]
    pub repayment_years: u32,
}

impl LoanTerms {
    pub fn new(
        amount: Money,
        annual_rate: Percent,
        grace_years: u32,
        repayment_years: u32,
    ) -> Self {
        Self {
            amount,
            annual_rate,
            grace_years,
            repayment_years,
        }
    }

    /// A loan with nothing drawn.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.amount > 0.0
    }
}

/// Base revenue: a flat starting value grown by the growth rate, or an
/// explicit per-year forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RevenueBase {
    Flat(Money),
    PerYear(Vec<Money>),
}

impl Default for RevenueBase {
    fn default() -> Self {
        RevenueBase::Flat(0.0)
    }
}

/// Scenario selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    Pessimistic,
    #[default]
    Neutral,
    Optimistic,
}

impl ScenarioKind {
    pub const ALL: [ScenarioKind; 3] = [
        ScenarioKind::Pessimistic,
        ScenarioKind::Neutral,
        ScenarioKind::Optimistic,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ScenarioKind::Pessimistic => "pessimistic",
            ScenarioKind::Neutral => "neutral",
            ScenarioKind::Optimistic => "optimistic",
        }
    }
}

/// Full input record for one investment analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvestmentInput {
    /// Label only; carried into the assumptions block of the output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    /// Total capital outlay at year 0
    pub initial_investment: Money,
    /// Concessional policy loan
    #[serde(default)]
    pub policy_loan: LoanTerms,
    /// Conventional debt
    #[serde(default)]
    pub other_debt: LoanTerms,
    /// Year-1 revenue, or an explicit per-year forecast
    pub revenue: RevenueBase,
    /// Target operating profit as a percent of revenue
    pub operating_profit_rate: Percent,
    /// Corporate tax rate in percent
    #[serde(default)]
    pub tax_rate: Percent,
    /// Discount rate in percent
    pub discount_rate: Percent,
    /// Number of projected years
    pub horizon_years: u32,
    /// Compound annual revenue growth in percent
    #[serde(default)]
    pub growth_rate: Percent,
    /// Early-year penetration boost in percent (years 1-3, front-loaded)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub penetration_rate: Option<Percent>,
    /// Annual customer retention in percent, applied after year 3
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retention_rate: Option<Percent>,
    #[serde(default)]
    pub scenario: ScenarioKind,
    /// Replaces the preset revenue shift magnitude of the selected scenario
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario_adjustment: Option<Percent>,
    /// Straight-line depreciation life of the initial investment (0 = none)
    #[serde(default)]
    pub depreciation_years: u32,
    /// Working capital held, as a percent of revenue
    #[serde(default)]
    pub working_capital_rate: Percent,
    /// Salvage value recovered in the final year, as a percent of the outlay
    #[serde(default)]
    pub residual_value_rate: Percent,
}

impl InvestmentInput {
    /// First-year base revenue regardless of how revenue was supplied.
    pub fn base_revenue(&self) -> Money {
        match &self.revenue {
            RevenueBase::Flat(v) => *v,
            RevenueBase::PerYear(v) => v.first().copied().unwrap_or(0.0),
        }
    }
}

// ---------------------------------------------------------------------------
// Sanitisation
// ---------------------------------------------------------------------------

/// Reject non-finite values and clamp out-of-range ones.
///
/// Pathological but finite inputs never fail: negative amounts and rates are
/// clamped into range and a warning is recorded for each adjustment, so that
/// exploratory what-if runs still produce a usable result.
pub fn sanitize_input(
    input: &InvestmentInput,
) -> PolicyInvestResult<(InvestmentInput, Vec<String>)> {
    ensure_finite(input)?;

    let mut warnings = Vec::new();
    let mut out = input.clone();

    out.initial_investment = clamp_field(
        "initial_investment",
        input.initial_investment,
        0.0,
        f64::MAX,
        &mut warnings,
    );
    out.policy_loan = sanitize_loan("policy_loan", &input.policy_loan, &mut warnings);
    out.other_debt = sanitize_loan("other_debt", &input.other_debt, &mut warnings);

    out.revenue = match &input.revenue {
        RevenueBase::Flat(v) => {
            RevenueBase::Flat(clamp_field("revenue", *v, 0.0, f64::MAX, &mut warnings))
        }
        RevenueBase::PerYear(values) if values.is_empty() => {
            warnings.push("revenue: empty per-year forecast treated as zero revenue".into());
            RevenueBase::Flat(0.0)
        }
        RevenueBase::PerYear(values) => RevenueBase::PerYear(
            values
                .iter()
                .enumerate()
                .map(|(i, v)| {
                    clamp_field(&format!("revenue[{i}]"), *v, 0.0, f64::MAX, &mut warnings)
                })
                .collect(),
        ),
    };

    out.operating_profit_rate = clamp_field(
        "operating_profit_rate",
        input.operating_profit_rate,
        0.0,
        100.0,
        &mut warnings,
    );
    out.tax_rate = clamp_field("tax_rate", input.tax_rate, 0.0, 100.0, &mut warnings);
    out.discount_rate =
        clamp_field("discount_rate", input.discount_rate, 0.0, 100.0, &mut warnings);
    out.growth_rate = clamp_field("growth_rate", input.growth_rate, -100.0, 100.0, &mut warnings);
    out.penetration_rate = input
        .penetration_rate
        .map(|p| clamp_field("penetration_rate", p, 0.0, 100.0, &mut warnings));
    out.retention_rate = input
        .retention_rate
        .map(|r| clamp_field("retention_rate", r, 0.0, 100.0, &mut warnings));
    out.scenario_adjustment = input
        .scenario_adjustment
        .map(|a| clamp_field("scenario_adjustment", a, 0.0, 100.0, &mut warnings));
    out.working_capital_rate = clamp_field(
        "working_capital_rate",
        input.working_capital_rate,
        0.0,
        100.0,
        &mut warnings,
    );
    out.residual_value_rate = clamp_field(
        "residual_value_rate",
        input.residual_value_rate,
        0.0,
        100.0,
        &mut warnings,
    );

    if input.horizon_years == 0 {
        warn!(field = "horizon_years", "horizon of 0 years raised to 1");
        warnings.push("horizon_years: 0 raised to 1".into());
        out.horizon_years = 1;
    } else if input.horizon_years > MAX_HORIZON_YEARS {
        warn!(field = "horizon_years", value = input.horizon_years, "horizon capped");
        warnings.push(format!(
            "horizon_years: {} capped at {MAX_HORIZON_YEARS}",
            input.horizon_years
        ));
        out.horizon_years = MAX_HORIZON_YEARS;
    }

    Ok((out, warnings))
}

fn sanitize_loan(name: &str, loan: &LoanTerms, warnings: &mut Vec<String>) -> LoanTerms {
    LoanTerms {
        amount: clamp_field(&format!("{name}.amount"), loan.amount, 0.0, f64::MAX, warnings),
        annual_rate: clamp_field(
            &format!("{name}.annual_rate"),
            loan.annual_rate,
            0.0,
            100.0,
            warnings,
        ),
        grace_years: loan.grace_years,
        repayment_years: loan.repayment_years,
    }
}

fn clamp_field(field: &str, value: f64, min: f64, max: f64, warnings: &mut Vec<String>) -> f64 {
    let clamped = value.clamp(min, max);
    if clamped != value {
        warn!(field, value, clamped, "input clamped into range");
        warnings.push(format!("{field}: {value} clamped to {clamped}"));
    }
    clamped
}

fn ensure_finite(input: &InvestmentInput) -> PolicyInvestResult<()> {
    let mut scalars = vec![
        ("initial_investment", input.initial_investment),
        ("policy_loan.amount", input.policy_loan.amount),
        ("policy_loan.annual_rate", input.policy_loan.annual_rate),
        ("other_debt.amount", input.other_debt.amount),
        ("other_debt.annual_rate", input.other_debt.annual_rate),
        ("operating_profit_rate", input.operating_profit_rate),
        ("tax_rate", input.tax_rate),
        ("discount_rate", input.discount_rate),
        ("growth_rate", input.growth_rate),
        ("working_capital_rate", input.working_capital_rate),
        ("residual_value_rate", input.residual_value_rate),
    ];
    if let Some(p) = input.penetration_rate {
        scalars.push(("penetration_rate", p));
    }
    if let Some(r) = input.retention_rate {
        scalars.push(("retention_rate", r));
    }
    if let Some(a) = input.scenario_adjustment {
        scalars.push(("scenario_adjustment", a));
    }
    match &input.revenue {
        RevenueBase::Flat(v) => scalars.push(("revenue", *v)),
        RevenueBase::PerYear(values) => {
            if values.iter().any(|v| !v.is_finite()) {
                return Err(PolicyInvestError::InvalidInput {
                    field: "revenue".into(),
                    reason: "Per-year revenue must be finite".into(),
                });
            }
        }
    }

    for (field, value) in scalars {
        if !value.is_finite() {
            return Err(PolicyInvestError::InvalidInput {
                field: field.into(),
                reason: format!("Value must be finite (got {value})"),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_input() -> InvestmentInput {
        InvestmentInput {
            initial_investment: 1_000_000_000.0,
            revenue: RevenueBase::Flat(500_000_000.0),
            operating_profit_rate: 40.0,
            discount_rate: 10.0,
            horizon_years: 3,
            ..Default::default()
        }
    }

    #[test]
    fn test_clean_input_untouched() {
        let input = base_input();
        let (out, warnings) = sanitize_input(&input).unwrap();
        assert_eq!(out, input);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_negative_values_clamped() {
        let mut input = base_input();
        input.discount_rate = -5.0;
        input.policy_loan = LoanTerms::new(-10.0, 150.0, 1, 2);
        let (out, warnings) = sanitize_input(&input).unwrap();
        assert_eq!(out.discount_rate, 0.0);
        assert_eq!(out.policy_loan.amount, 0.0);
        assert_eq!(out.policy_loan.annual_rate, 100.0);
        assert_eq!(warnings.len(), 3);
    }

    #[test]
    fn test_zero_horizon_raised() {
        let mut input = base_input();
        input.horizon_years = 0;
        let (out, warnings) = sanitize_input(&input).unwrap();
        assert_eq!(out.horizon_years, 1);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_nan_rejected() {
        let mut input = base_input();
        input.tax_rate = f64::NAN;
        let err = sanitize_input(&input).unwrap_err();
        assert!(matches!(
            err,
            PolicyInvestError::InvalidInput { ref field, .. } if field == "tax_rate"
        ));
    }

    #[test]
    fn test_negative_profit_rate_clamped_to_zero() {
        let mut input = base_input();
        input.operating_profit_rate = -80.0;
        let (out, warnings) = sanitize_input(&input).unwrap();
        assert_eq!(out.operating_profit_rate, 0.0);
        assert_eq!(warnings, vec!["operating_profit_rate: -80 clamped to 0".to_string()]);
    }

    #[test]
    fn test_revenue_deserialises_from_scalar_or_sequence() {
        let flat: RevenueBase = serde_json::from_str("1000.0").unwrap();
        assert_eq!(flat, RevenueBase::Flat(1000.0));
        let seq: RevenueBase = serde_json::from_str("[1.0, 2.0]").unwrap();
        assert_eq!(seq, RevenueBase::PerYear(vec![1.0, 2.0]));
    }

    #[test]
    fn test_scenario_snake_case() {
        let kind: ScenarioKind = serde_json::from_str("\"pessimistic\"").unwrap();
        assert_eq!(kind, ScenarioKind::Pessimistic);
    }
}

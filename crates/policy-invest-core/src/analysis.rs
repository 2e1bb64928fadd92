//! Engine entry point: runs the full pipeline from a raw input record to an
//! [`InvestmentResult`].

use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use crate::coverage::dscr::{analyze_dscr, DscrYear};
use crate::input::{sanitize_input, InvestmentInput};
use crate::loans::amortization::LoanSchedule;
use crate::loans::financing::build_financing;
use crate::projection::cash_flow::{project_cash_flows, CashFlowYear, ProjectionParams};
use crate::returns::irr::{practical_irr, solve_irr, SolverState};
use crate::returns::metrics::{return_metrics, MetricInputs};
use crate::returns::payback::{discounted_payback, or_unrecovered, simple_payback};
use crate::scenarios::adjustment::{apply_scenario, AppliedScenario};
use crate::time_value::npv;
use crate::types::*;
use crate::PolicyInvestResult;

/// Everything computed for one investment under one scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentResult {
    pub npv: Money,
    /// IRR in percent, clamped to [-95, 500]; 0 when undetermined
    pub irr: Percent,
    /// IRR in percent, clamped to the practical band [-50, 80]
    pub irr_display: Percent,
    pub irr_converged: bool,
    pub irr_solver_state: SolverState,
    /// Years to recover the outlay from net cash flow; -1 if never
    pub simple_payback_years: Years,
    /// Years to recover the outlay from discounted cash flow; -1 if never
    pub discounted_payback_years: Years,
    pub break_even_year: Option<u32>,
    pub dscr: Vec<DscrYear>,
    pub min_dscr: Option<f64>,
    pub average_dscr: Option<f64>,
    pub roi: Percent,
    pub profitability_index: f64,
    pub average_roi: Percent,
    pub cumulative_roi: Percent,
    pub risk_adjusted_return: Percent,
    pub economic_value_added: Money,
    pub cash_flows: Vec<CashFlowYear>,
    /// Net cash flows with the year-0 outlay at index 0
    pub net_cash_flows: Vec<Money>,
    pub policy_loan_schedule: LoanSchedule,
    pub other_debt_schedule: LoanSchedule,
    pub scenario: AppliedScenario,
}

/// Run the analysis and wrap the result in the standard output envelope.
pub fn analyze_investment(
    input: &InvestmentInput,
) -> PolicyInvestResult<ComputationOutput<InvestmentResult>> {
    let start = Instant::now();
    let (result, warnings) = run_pipeline(input)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Policy-Loan Investment DCF Analysis (NPV, IRR, Payback, DSCR)",
        &serde_json::json!({
            "project_name": input.project_name,
            "scenario": result.scenario.kind,
            "horizon_years": result.cash_flows.len(),
            "discount_rate_pct": input.discount_rate,
            "tax_rate_pct": input.tax_rate,
            "cash_flow_convention": "year-end, outlay at year 0",
            "loan_amortization": "grace then equal principal",
        }),
        warnings,
        elapsed,
        result,
    ))
}

/// Run the pipeline without the envelope.
///
/// Only a non-finite input value is an error. Every other degenerate case
/// (no sign change, unrecovered outlay, no debt service) becomes a sentinel
/// and a warning.
pub fn run_pipeline(
    input: &InvestmentInput,
) -> PolicyInvestResult<(InvestmentResult, Vec<String>)> {
    // ── Inputs ──
    let (clean, mut warnings) = sanitize_input(input)?;
    let (adjusted, scenario, scenario_warnings) = apply_scenario(&clean);
    warnings.extend(scenario_warnings);

    // ── Financing and projection ──
    let horizon = adjusted.horizon_years;
    let debt = build_financing(&adjusted.policy_loan, &adjusted.other_debt, horizon);
    let params = ProjectionParams::from_input(&adjusted);
    let projection = project_cash_flows(&params, &debt);
    warnings.extend(projection.warnings.iter().cloned());
    debug!(horizon, scenario = scenario.kind.label(), "projection built");

    // ── Discounting ──
    let npv_value = match npv(params.discount_rate, &projection.cash_flows) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "NPV undetermined, reporting 0");
            warnings.push(format!("NPV undetermined ({e}); reported as 0"));
            0.0
        }
    };

    let (irr_rate, irr_converged, irr_solver_state) = match solve_irr(&projection.cash_flows) {
        Ok(solution) => (solution.rate, true, solution.state),
        Err(e) => {
            warn!(error = %e, "IRR undetermined, reporting 0");
            warnings.push(format!("IRR undetermined ({e}); reported as 0"));
            (0.0, false, SolverState::Failed)
        }
    };
    let irr = to_pct(irr_rate);
    let irr_display = to_pct(practical_irr(irr_rate));
    debug!(npv = npv_value, irr, irr_converged, "discounted metrics");

    // ── Payback ──
    let simple = simple_payback(adjusted.initial_investment, &projection.net_cash_flows());
    let discounted = discounted_payback(adjusted.initial_investment, &projection.present_values());
    if simple.is_none() {
        warnings.push("Investment is not recovered within the horizon".into());
    }

    // ── Coverage ──
    let coverage = analyze_dscr(&projection.years, &debt);
    if !coverage.years_below_one.is_empty() {
        warn!(years = ?coverage.years_below_one, "debt service not covered");
        warnings.push(format!(
            "Operating profit does not cover debt service in years {:?}",
            coverage.years_below_one
        ));
    }

    // ── Secondary metrics ──
    let metrics = return_metrics(
        &projection.years,
        MetricInputs {
            initial_investment: adjusted.initial_investment,
            npv: npv_value,
            irr,
            irr_converged,
            discount_rate: adjusted.discount_rate,
        },
    );

    let result = InvestmentResult {
        npv: npv_value,
        irr,
        irr_display,
        irr_converged,
        irr_solver_state,
        simple_payback_years: or_unrecovered(simple),
        discounted_payback_years: or_unrecovered(discounted),
        break_even_year: metrics.break_even_year,
        dscr: coverage.years,
        min_dscr: coverage.min_dscr,
        average_dscr: coverage.average_dscr,
        roi: metrics.roi,
        profitability_index: metrics.profitability_index,
        average_roi: metrics.average_roi,
        cumulative_roi: metrics.cumulative_roi,
        risk_adjusted_return: metrics.risk_adjusted_return,
        economic_value_added: metrics.economic_value_added,
        net_cash_flows: projection.cash_flows,
        cash_flows: projection.years,
        policy_loan_schedule: debt.policy_loan,
        other_debt_schedule: debt.other_debt,
        scenario,
    };

    Ok((result, warnings))
}

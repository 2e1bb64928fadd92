use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::revenue::RevenueDrivers;
use crate::input::InvestmentInput;
use crate::loans::financing::{DebtSchedules, YearDebtService};
use crate::time_value::discount_factor;
use crate::types::*;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Projection assumptions with every rate converted to a decimal.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionParams {
    pub initial_investment: Money,
    pub revenue: RevenueDrivers,
    pub operating_profit_rate: Rate,
    pub tax_rate: Rate,
    pub discount_rate: Rate,
    pub horizon_years: u32,
    pub depreciation_years: u32,
    pub working_capital_rate: Rate,
    pub residual_value_rate: Rate,
}

impl ProjectionParams {
    /// Build from an already sanitised input record.
    pub fn from_input(input: &InvestmentInput) -> Self {
        Self {
            initial_investment: input.initial_investment,
            revenue: RevenueDrivers {
                base: input.revenue.clone(),
                growth: pct(input.growth_rate),
                penetration: input.penetration_rate.map(pct),
                retention: input.retention_rate.map(pct),
            },
            operating_profit_rate: pct(input.operating_profit_rate),
            tax_rate: pct(input.tax_rate),
            discount_rate: pct(input.discount_rate),
            horizon_years: input.horizon_years,
            depreciation_years: input.depreciation_years,
            working_capital_rate: pct(input.working_capital_rate),
            residual_value_rate: pct(input.residual_value_rate),
        }
    }

    fn depreciation(&self, year: u32) -> Money {
        if self.depreciation_years > 0 && year <= self.depreciation_years {
            self.initial_investment / self.depreciation_years as f64
        } else {
            0.0
        }
    }
}

/// One projected year of the cash-flow statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowYear {
    pub year: u32,
    pub revenue: Money,
    pub operating_profit: Money,
    pub depreciation: Money,
    pub taxable_income: Money,
    pub tax: Money,
    pub net_income: Money,
    pub working_capital_change: Money,
    pub policy_loan_principal: Money,
    pub policy_loan_interest: Money,
    pub other_debt_principal: Money,
    pub other_debt_interest: Money,
    pub total_principal: Money,
    pub total_interest: Money,
    /// Net income plus depreciation, less the working-capital build
    pub free_cash_flow: Money,
    /// Residual value plus released working capital (final year only)
    pub terminal_recovery: Money,
    pub net_cash_flow: Money,
    /// Running total including the year-0 outlay
    pub cumulative_cash_flow: Money,
    pub discount_factor: f64,
    pub present_value: Money,
    /// Running total of present values including the year-0 outlay
    pub cumulative_present_value: Money,
    /// Realised operating profit / revenue, in percent
    pub operating_profit_rate: Percent,
    /// (operating profit - tax) / initial investment, in percent
    pub return_on_invested_capital: Percent,
}

/// The full projection over the horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowProjection {
    pub years: Vec<CashFlowYear>,
    /// Net cash flows indexed by year, with the outlay at index 0
    pub cash_flows: Vec<Money>,
    pub warnings: Vec<String>,
}

impl CashFlowProjection {
    pub fn present_values(&self) -> Vec<Money> {
        self.years.iter().map(|y| y.present_value).collect()
    }

    pub fn net_cash_flows(&self) -> Vec<Money> {
        self.years.iter().map(|y| y.net_cash_flow).collect()
    }
}

/// Immutable per-year drivers consumed by the fold.
#[derive(Debug, Clone, Copy)]
struct YearDrivers {
    year: u32,
    revenue: Money,
    debt: YearDebtService,
    is_final: bool,
}

/// Values carried from one year into the next.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Carry {
    cumulative_cash_flow: Money,
    cumulative_present_value: Money,
    working_capital: Money,
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

/// Project the yearly statement from revenue down to net cash flow.
///
/// Each year is a pure step from the previous [`Carry`] to the next one, so
/// repeated runs (scenarios, sweeps) never share accumulated state.
pub fn project_cash_flows(params: &ProjectionParams, debt: &DebtSchedules) -> CashFlowProjection {
    let horizon = params.horizon_years.max(1);
    let drivers: Vec<YearDrivers> = params
        .revenue
        .path(horizon)
        .into_iter()
        .zip(1..=horizon)
        .map(|(revenue, year)| YearDrivers {
            year,
            revenue,
            debt: debt.service(year),
            is_final: year == horizon,
        })
        .collect();

    let opening = Carry {
        cumulative_cash_flow: -params.initial_investment,
        cumulative_present_value: -params.initial_investment,
        working_capital: 0.0,
    };

    let (_, years, warnings) = drivers.iter().fold(
        (opening, Vec::with_capacity(drivers.len()), Vec::new()),
        |(carry, mut years, mut warnings), d| {
            let (row, next) = project_year(params, &carry, d, &mut warnings);
            years.push(row);
            (next, years, warnings)
        },
    );

    let cash_flows: Vec<Money> = std::iter::once(-params.initial_investment)
        .chain(years.iter().map(|y: &CashFlowYear| y.net_cash_flow))
        .collect();

    debug!(
        horizon,
        total_net_cash_flow = cash_flows.iter().skip(1).sum::<f64>(),
        "cash-flow projection complete"
    );

    CashFlowProjection {
        years,
        cash_flows,
        warnings,
    }
}

fn project_year(
    params: &ProjectionParams,
    carry: &Carry,
    d: &YearDrivers,
    warnings: &mut Vec<String>,
) -> (CashFlowYear, Carry) {
    let revenue = d.revenue;
    let operating_profit = revenue * params.operating_profit_rate;
    let depreciation = params.depreciation(d.year);
    let total_interest = d.debt.total_interest();
    let total_principal = d.debt.total_principal();

    let taxable_income = operating_profit - depreciation - total_interest;
    let tax = (taxable_income * params.tax_rate).max(0.0);
    let net_income = taxable_income - tax;

    let working_capital = revenue * params.working_capital_rate;
    let working_capital_change = working_capital - carry.working_capital;

    let free_cash_flow = net_income + depreciation - working_capital_change;

    let terminal_recovery = if d.is_final {
        params.initial_investment * params.residual_value_rate + working_capital
    } else {
        0.0
    };

    let net_cash_flow = free_cash_flow - total_principal - total_interest + terminal_recovery;
    let factor = discount_factor(params.discount_rate, d.year);
    let present_value = net_cash_flow * factor;

    let operating_profit_rate = if revenue != 0.0 {
        to_pct(operating_profit / revenue)
    } else {
        0.0
    };
    let return_on_invested_capital = if params.initial_investment > 0.0 {
        to_pct((operating_profit - tax) / params.initial_investment)
    } else {
        0.0
    };

    let mut row = CashFlowYear {
        year: d.year,
        revenue,
        operating_profit,
        depreciation,
        taxable_income,
        tax,
        net_income,
        working_capital_change,
        policy_loan_principal: d.debt.policy_principal,
        policy_loan_interest: d.debt.policy_interest,
        other_debt_principal: d.debt.other_principal,
        other_debt_interest: d.debt.other_interest,
        total_principal,
        total_interest,
        free_cash_flow,
        terminal_recovery,
        net_cash_flow,
        cumulative_cash_flow: 0.0,
        discount_factor: factor,
        present_value,
        cumulative_present_value: 0.0,
        operating_profit_rate,
        return_on_invested_capital,
    };
    coerce_non_finite(&mut row, warnings);

    row.cumulative_cash_flow = carry.cumulative_cash_flow + row.net_cash_flow;
    row.cumulative_present_value = carry.cumulative_present_value + row.present_value;

    let next = Carry {
        cumulative_cash_flow: row.cumulative_cash_flow,
        cumulative_present_value: row.cumulative_present_value,
        working_capital: if working_capital.is_finite() {
            working_capital
        } else {
            0.0
        },
    };
    (row, next)
}

/// Replace any non-finite field with zero, logging each replacement.
fn coerce_non_finite(row: &mut CashFlowYear, warnings: &mut Vec<String>) {
    let year = row.year;
    let fields: [(&'static str, &mut f64); 20] = [
        ("revenue", &mut row.revenue),
        ("operating_profit", &mut row.operating_profit),
        ("depreciation", &mut row.depreciation),
        ("taxable_income", &mut row.taxable_income),
        ("tax", &mut row.tax),
        ("net_income", &mut row.net_income),
        ("working_capital_change", &mut row.working_capital_change),
        ("policy_loan_principal", &mut row.policy_loan_principal),
        ("policy_loan_interest", &mut row.policy_loan_interest),
        ("other_debt_principal", &mut row.other_debt_principal),
        ("other_debt_interest", &mut row.other_debt_interest),
        ("total_principal", &mut row.total_principal),
        ("total_interest", &mut row.total_interest),
        ("free_cash_flow", &mut row.free_cash_flow),
        ("terminal_recovery", &mut row.terminal_recovery),
        ("net_cash_flow", &mut row.net_cash_flow),
        ("discount_factor", &mut row.discount_factor),
        ("present_value", &mut row.present_value),
        ("operating_profit_rate", &mut row.operating_profit_rate),
        ("return_on_invested_capital", &mut row.return_on_invested_capital),
    ];

    for (field, value) in fields {
        let (coerced, replaced) = finite_or_zero(*value);
        if replaced {
            warn!(year, field, "non-finite value coerced to 0");
            warnings.push(format!("Year {year}: non-finite {field} coerced to 0"));
            *value = coerced;
        }
    }
}

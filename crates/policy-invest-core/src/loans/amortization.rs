use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::input::LoanTerms;
use crate::types::*;
use crate::PolicyInvestResult;

/// Where a loan sits in its life cycle in a given year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanPhase {
    /// Interest only, no principal
    Grace,
    /// Equal principal installments plus interest on the declining balance
    Repayment,
    /// Fully repaid (or never drawn); nothing due
    PostRepayment,
}

/// A single year in a loan schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanPeriod {
    pub year: u32,
    pub phase: LoanPhase,
    pub principal: Money,
    pub interest: Money,
    pub remaining_balance: Money,
}

impl LoanPeriod {
    fn settled(year: u32) -> Self {
        Self {
            year,
            phase: LoanPhase::PostRepayment,
            principal: 0.0,
            interest: 0.0,
            remaining_balance: 0.0,
        }
    }

    /// Principal plus interest due this year.
    pub fn debt_service(&self) -> Money {
        self.principal + self.interest
    }
}

/// Year-by-year schedule for one loan over the analysis horizon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanSchedule {
    pub periods: Vec<LoanPeriod>,
    pub total_principal: Money,
    pub total_interest: Money,
}

impl LoanSchedule {
    /// Period for a 1-indexed year, if inside the horizon.
    pub fn period(&self, year: u32) -> Option<&LoanPeriod> {
        year.checked_sub(1).and_then(|idx| self.periods.get(idx as usize))
    }

    pub fn principal(&self, year: u32) -> Money {
        self.period(year).map_or(0.0, |p| p.principal)
    }

    pub fn interest(&self, year: u32) -> Money {
        self.period(year).map_or(0.0, |p| p.interest)
    }

    pub fn phase(&self, year: u32) -> LoanPhase {
        self.period(year).map_or(LoanPhase::PostRepayment, |p| p.phase)
    }
}

/// Input for a standalone schedule request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanScheduleInput {
    pub loan: LoanTerms,
    pub horizon_years: u32,
}

/// Build the schedule for one loan over `horizon` years.
///
/// Installments are whole currency units: every installment but the last is
/// the floor of `amount / repayment_years` and the last one clears whatever
/// remains, so principal sums to the amount and the balance lands on zero.
/// A repayment period of 0 repays the whole amount in the first year after
/// grace. A zero amount yields an all-zero schedule.
pub fn build_schedule(terms: &LoanTerms, horizon: u32) -> LoanSchedule {
    let amount = terms.amount.max(0.0);
    let rate = pct(terms.annual_rate.max(0.0));
    let grace = terms.grace_years;
    let tenor = terms.repayment_years.max(1);
    let repaid_by = grace.saturating_add(tenor);

    let exact_installment = amount / tenor as f64;
    let installment = if exact_installment >= 1.0 {
        exact_installment.floor()
    } else {
        exact_installment
    };

    let periods: Vec<LoanPeriod> = (1..=horizon)
        .map(|year| {
            if amount <= 0.0 || year > repaid_by {
                return LoanPeriod::settled(year);
            }
            if year <= grace {
                return LoanPeriod {
                    year,
                    phase: LoanPhase::Grace,
                    principal: 0.0,
                    interest: amount * rate,
                    remaining_balance: amount,
                };
            }

            let installment_no = year - grace;
            let balance_before = (amount - installment * (installment_no - 1) as f64).max(0.0);
            let principal = if installment_no == tenor {
                balance_before
            } else {
                installment.min(balance_before)
            };

            LoanPeriod {
                year,
                phase: LoanPhase::Repayment,
                principal,
                interest: balance_before * rate,
                remaining_balance: (balance_before - principal).max(0.0),
            }
        })
        .collect();

    let total_principal = periods.iter().map(|p| p.principal).sum();
    let total_interest = periods.iter().map(|p| p.interest).sum();

    LoanSchedule {
        periods,
        total_principal,
        total_interest,
    }
}

/// Build a schedule wrapped in the standard output envelope.
pub fn build_loan_schedule(
    input: &LoanScheduleInput,
) -> PolicyInvestResult<ComputationOutput<LoanSchedule>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let horizon = input.horizon_years.max(1);
    if input.horizon_years == 0 {
        warnings.push("horizon_years of 0 raised to 1".into());
    }
    if input.loan.amount < 0.0 || input.loan.annual_rate < 0.0 {
        warnings.push("Negative amount or rate clamped to 0".into());
    }
    let repaid_by = input
        .loan
        .grace_years
        .saturating_add(input.loan.repayment_years.max(1));
    if input.loan.amount > 0.0 && repaid_by > horizon {
        warnings.push(format!(
            "Loan is not fully repaid within the {horizon}-year horizon (repaid in year {repaid_by})"
        ));
    }

    let schedule = build_schedule(&input.loan, horizon);

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Grace + Equal-Principal Amortization Schedule",
        &serde_json::json!({
            "amount": input.loan.amount,
            "annual_rate_pct": input.loan.annual_rate,
            "grace_years": input.loan.grace_years,
            "repayment_years": input.loan.repayment_years,
            "horizon_years": horizon,
        }),
        warnings,
        elapsed,
        schedule,
    ))
}

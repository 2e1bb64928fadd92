use serde::{Deserialize, Serialize};

use crate::loans::amortization::LoanPhase;
use crate::loans::financing::DebtSchedules;
use crate::projection::cash_flow::CashFlowYear;
use crate::types::{round2, Money};

/// Coverage for a single year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DscrYear {
    pub year: u32,
    pub operating_profit: Money,
    pub policy_loan_service: Money,
    pub other_debt_service: Money,
    pub total_debt_service: Money,
    /// Operating profit / total debt service, 2 dp. 0 means nothing was due.
    pub dscr: f64,
    pub phase: LoanPhase,
    pub policy_loan_phase: LoanPhase,
    pub other_debt_phase: LoanPhase,
}

impl DscrYear {
    pub fn has_debt_service(&self) -> bool {
        self.total_debt_service > 0.0
    }
}

/// Year-by-year coverage plus summary statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DscrAnalysis {
    pub years: Vec<DscrYear>,
    /// Lowest DSCR among years with debt service due
    pub min_dscr: Option<f64>,
    /// Mean DSCR among years with debt service due
    pub average_dscr: Option<f64>,
    /// Years where debt service was due and not covered
    pub years_below_one: Vec<u32>,
}

impl DscrAnalysis {
    pub fn dscr_values(&self) -> Vec<f64> {
        self.years.iter().map(|y| y.dscr).collect()
    }
}

/// Phase of the financing as a whole: repaying if either loan is repaying,
/// otherwise in grace if either loan is in grace, otherwise settled.
pub fn combined_phase(policy: LoanPhase, other: LoanPhase) -> LoanPhase {
    match (policy, other) {
        (LoanPhase::Repayment, _) | (_, LoanPhase::Repayment) => LoanPhase::Repayment,
        (LoanPhase::Grace, _) | (_, LoanPhase::Grace) => LoanPhase::Grace,
        _ => LoanPhase::PostRepayment,
    }
}

/// Divide each year's operating profit by the combined service of both loans.
pub fn analyze_dscr(years: &[CashFlowYear], debt: &DebtSchedules) -> DscrAnalysis {
    let rows: Vec<DscrYear> = years
        .iter()
        .map(|cf| {
            let service = debt.service(cf.year);
            let policy_loan_service = service.policy_principal + service.policy_interest;
            let other_debt_service = service.other_principal + service.other_interest;
            let total_debt_service = service.total();
            let (policy_loan_phase, other_debt_phase) = debt.phases(cf.year);

            let dscr = if total_debt_service > 0.0 {
                round2(cf.operating_profit / total_debt_service)
            } else {
                0.0
            };

            DscrYear {
                year: cf.year,
                operating_profit: cf.operating_profit,
                policy_loan_service,
                other_debt_service,
                total_debt_service,
                dscr,
                phase: combined_phase(policy_loan_phase, other_debt_phase),
                policy_loan_phase,
                other_debt_phase,
            }
        })
        .collect();

    let serviced: Vec<&DscrYear> = rows.iter().filter(|r| r.has_debt_service()).collect();
    let min_dscr = serviced
        .iter()
        .map(|r| r.dscr)
        .min_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let average_dscr = if serviced.is_empty() {
        None
    } else {
        Some(round2(
            serviced.iter().map(|r| r.dscr).sum::<f64>() / serviced.len() as f64,
        ))
    };
    let years_below_one = serviced
        .iter()
        .filter(|r| r.dscr < 1.0)
        .map(|r| r.year)
        .collect();

    DscrAnalysis {
        years: rows,
        min_dscr,
        average_dscr,
        years_below_one,
    }
}

use serde::{Deserialize, Serialize};

use super::amortization::{build_schedule, LoanPhase, LoanSchedule};
use crate::input::LoanTerms;
use crate::types::Money;

/// Schedules for the two loans that fund the investment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtSchedules {
    pub policy_loan: LoanSchedule,
    pub other_debt: LoanSchedule,
}

/// Debt service for one year, itemised by loan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearDebtService {
    pub policy_principal: Money,
    pub policy_interest: Money,
    pub other_principal: Money,
    pub other_interest: Money,
}

impl YearDebtService {
    pub fn total_principal(&self) -> Money {
        self.policy_principal + self.other_principal
    }

    pub fn total_interest(&self) -> Money {
        self.policy_interest + self.other_interest
    }

    pub fn total(&self) -> Money {
        self.total_principal() + self.total_interest()
    }
}

impl DebtSchedules {
    pub fn service(&self, year: u32) -> YearDebtService {
        YearDebtService {
            policy_principal: self.policy_loan.principal(year),
            policy_interest: self.policy_loan.interest(year),
            other_principal: self.other_debt.principal(year),
            other_interest: self.other_debt.interest(year),
        }
    }

    pub fn phases(&self, year: u32) -> (LoanPhase, LoanPhase) {
        (self.policy_loan.phase(year), self.other_debt.phase(year))
    }

    pub fn total_interest(&self) -> Money {
        self.policy_loan.total_interest + self.other_debt.total_interest
    }
}

/// Run the single amortization scheduler once per loan.
pub fn build_financing(
    policy_loan: &LoanTerms,
    other_debt: &LoanTerms,
    horizon: u32,
) -> DebtSchedules {
    DebtSchedules {
        policy_loan: build_schedule(policy_loan, horizon),
        other_debt: build_schedule(other_debt, horizon),
    }
}

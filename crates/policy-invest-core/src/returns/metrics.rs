use serde::{Deserialize, Serialize};

use crate::projection::cash_flow::CashFlowYear;
use crate::types::*;

/// Secondary return metrics derived from a finished projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnMetrics {
    /// (total net cash flow - outlay) / outlay, in percent
    pub roi: Percent,
    /// PV of inflows / outlay
    pub profitability_index: f64,
    /// Cumulative ROI spread evenly over the horizon, in percent
    pub average_roi: Percent,
    /// Total net income / outlay, in percent
    pub cumulative_roi: Percent,
    /// IRR less the discount rate, in percentage points; 0 when the IRR is
    /// undetermined
    pub risk_adjusted_return: Percent,
    /// Sum over the horizon of after-tax operating profit less a capital
    /// charge of outlay x discount rate
    pub economic_value_added: Money,
    /// First year in which cumulative cash flow (outlay included) is >= 0
    pub break_even_year: Option<u32>,
}

/// Inputs the metrics need besides the projection rows.
#[derive(Debug, Clone, Copy)]
pub struct MetricInputs {
    pub initial_investment: Money,
    pub npv: Money,
    pub irr: Percent,
    pub irr_converged: bool,
    pub discount_rate: Percent,
}

pub fn return_metrics(years: &[CashFlowYear], inputs: MetricInputs) -> ReturnMetrics {
    let outlay = inputs.initial_investment;
    let total_net_cash: Money = years.iter().map(|y| y.net_cash_flow).sum();
    let total_net_income: Money = years.iter().map(|y| y.net_income).sum();

    let (roi, profitability_index, cumulative_roi) = if outlay > 0.0 {
        (
            to_pct((total_net_cash - outlay) / outlay),
            (inputs.npv + outlay) / outlay,
            to_pct(total_net_income / outlay),
        )
    } else {
        (0.0, 0.0, 0.0)
    };

    let average_roi = if years.is_empty() {
        0.0
    } else {
        cumulative_roi / years.len() as f64
    };

    let capital_charge = outlay * pct(inputs.discount_rate);
    let economic_value_added = years
        .iter()
        .map(|y| (y.operating_profit - y.tax) - capital_charge)
        .sum();

    let break_even_year = years
        .iter()
        .find(|y| y.cumulative_cash_flow >= 0.0)
        .map(|y| y.year);

    let risk_adjusted_return = if inputs.irr_converged {
        inputs.irr - inputs.discount_rate
    } else {
        0.0
    };

    ReturnMetrics {
        roi,
        profitability_index,
        average_roi,
        cumulative_roi,
        risk_adjusted_return,
        economic_value_added,
        break_even_year,
    }
}

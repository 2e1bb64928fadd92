use crate::error::PolicyInvestError;
use crate::types::{Money, Rate};
use crate::PolicyInvestResult;

/// Discount factor 1 / (1 + rate)^t. Period 0 is never discounted.
pub fn discount_factor(rate: Rate, period: u32) -> f64 {
    if period == 0 {
        return 1.0;
    }
    1.0 / (1.0 + rate).powi(period as i32)
}

/// Net Present Value of a series of cash flows, where index 0 is the
/// undiscounted initial outlay.
///
/// An empty series is worth zero. All-positive or all-negative series are
/// valid and simply produce a positive or negative value.
pub fn npv(rate: Rate, cash_flows: &[Money]) -> PolicyInvestResult<Money> {
    if rate <= -1.0 {
        return Err(PolicyInvestError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    let value = npv_at_rate(rate, cash_flows);
    if !value.is_finite() {
        return Err(PolicyInvestError::NonFinite {
            context: format!("NPV at rate {rate}"),
        });
    }
    Ok(value)
}

/// Unchecked NPV primitive shared with the IRR solver.
///
/// Uses an iteratively compounded discount factor; the caller is responsible
/// for keeping `rate > -1` and for checking the result is finite.
pub fn npv_at_rate(rate: Rate, cash_flows: &[Money]) -> Money {
    let one_plus_r = 1.0 + rate;
    let mut discount = 1.0;
    let mut result = 0.0;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount *= one_plus_r;
        }
        result += cf / discount;
    }
    result
}

/// First derivative of NPV with respect to the rate.
pub fn npv_derivative(rate: Rate, cash_flows: &[Money]) -> f64 {
    let one_plus_r = 1.0 + rate;
    let mut discount = 1.0;
    let mut result = 0.0;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount *= one_plus_r;
            result -= t as f64 * cf / (discount * one_plus_r);
        }
    }
    result
}

/// Present value of each cash flow in the series.
pub fn present_values(rate: Rate, cash_flows: &[Money]) -> Vec<Money> {
    cash_flows
        .iter()
        .enumerate()
        .map(|(t, cf)| cf * discount_factor(rate, t as u32))
        .collect()
}

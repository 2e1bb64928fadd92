use crate::types::{Money, Years};

/// Reported when the outlay is never recovered inside the horizon.
pub const UNRECOVERED: Years = -1.0;

/// Years until undiscounted net cash flow repays the initial investment.
///
/// `net_cash_flows[0]` is year 1; the outlay itself is passed separately.
pub fn simple_payback(initial_investment: Money, net_cash_flows: &[Money]) -> Option<Years> {
    payback_period(initial_investment, net_cash_flows)
}

/// Same walk as [`simple_payback`] but over present values.
pub fn discounted_payback(initial_investment: Money, present_values: &[Money]) -> Option<Years> {
    payback_period(initial_investment, present_values)
}

/// Flatten an optional payback into the `-1` sentinel used on result records.
pub fn or_unrecovered(payback: Option<Years>) -> Years {
    payback.unwrap_or(UNRECOVERED)
}

/// Walk the running total until it first reaches the outlay and interpolate
/// linearly inside the crossing year. Recovery in year 1 reports exactly 1.
fn payback_period(initial_investment: Money, flows: &[Money]) -> Option<Years> {
    if initial_investment <= 0.0 || !initial_investment.is_finite() {
        return None;
    }

    flows
        .iter()
        .zip(1u32..)
        .scan(0.0, |cumulative, (cf, year)| {
            let prior = *cumulative;
            *cumulative += cf;
            Some((year, prior, *cumulative, *cf))
        })
        .find(|(_, _, cumulative, _)| *cumulative >= initial_investment)
        .map(|(year, prior, _, cf)| {
            if year == 1 {
                1.0
            } else {
                (year - 1) as f64 + (initial_investment - prior) / cf
            }
        })
}

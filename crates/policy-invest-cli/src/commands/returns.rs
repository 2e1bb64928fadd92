use clap::Args;
use serde::Serialize;
use serde_json::Value;

use policy_invest_core::returns::irr::{practical_irr, solve_irr, IrrSolution};
use policy_invest_core::returns::payback::{discounted_payback, or_unrecovered, simple_payback};
use policy_invest_core::time_value::{npv, present_values};
use policy_invest_core::types::{pct, to_pct, Money, Percent, Years};

/// Arguments for a raw cash-flow series
#[derive(Args)]
pub struct IrrArgs {
    /// Cash flows starting with the year-0 outlay (comma-separated, e.g. "-1000,400,400,400")
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true, required = true)]
    pub cash_flows: Vec<f64>,

    /// Discount rate in percent; adds NPV and discounted payback
    #[arg(long)]
    pub discount_rate: Option<f64>,
}

#[derive(Debug, Serialize)]
struct CashFlowSummary {
    irr: Percent,
    irr_display: Percent,
    solver: Option<IrrSolution>,
    npv: Option<Money>,
    simple_payback_years: Years,
    discounted_payback_years: Option<Years>,
    warnings: Vec<String>,
}

pub fn run_irr(args: IrrArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let cfs = &args.cash_flows;
    let mut warnings = Vec::new();

    let solver = match solve_irr(cfs) {
        Ok(s) => Some(s),
        Err(e) => {
            warnings.push(format!("IRR undetermined ({e}); reported as 0"));
            None
        }
    };
    let rate = solver.as_ref().map_or(0.0, |s| s.rate);

    let outlay = cfs.first().map_or(0.0, |cf| -cf);
    let inflows = cfs.get(1..).unwrap_or_default();

    let (npv_value, discounted) = match args.discount_rate {
        Some(d) => {
            let pvs = present_values(pct(d), cfs);
            (
                Some(npv(pct(d), cfs)?),
                Some(or_unrecovered(discounted_payback(
                    outlay,
                    pvs.get(1..).unwrap_or_default(),
                ))),
            )
        }
        None => (None, None),
    };

    let summary = CashFlowSummary {
        irr: to_pct(rate),
        irr_display: to_pct(practical_irr(rate)),
        solver,
        npv: npv_value,
        simple_payback_years: or_unrecovered(simple_payback(outlay, inflows)),
        discounted_payback_years: discounted,
        warnings,
    };
    Ok(serde_json::json!({ "result": summary }))
}

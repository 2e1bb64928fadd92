use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::analysis::{run_pipeline, InvestmentResult};
use crate::error::PolicyInvestError;
use crate::input::{InvestmentInput, ScenarioKind};
use crate::types::*;
use crate::PolicyInvestResult;

/// Probability assigned to each preset scenario
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioWeights {
    pub pessimistic: f64,
    pub neutral: f64,
    pub optimistic: f64,
}

impl Default for ScenarioWeights {
    fn default() -> Self {
        Self {
            pessimistic: 0.25,
            neutral: 0.50,
            optimistic: 0.25,
        }
    }
}

impl ScenarioWeights {
    pub fn weight(&self, kind: ScenarioKind) -> f64 {
        match kind {
            ScenarioKind::Pessimistic => self.pessimistic,
            ScenarioKind::Neutral => self.neutral,
            ScenarioKind::Optimistic => self.optimistic,
        }
    }
}

/// Input for a three-way scenario comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioComparisonInput {
    pub investment: InvestmentInput,
    #[serde(default)]
    pub weights: ScenarioWeights,
}

/// One preset's outcome alongside its distance from the neutral case
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioCase {
    pub kind: ScenarioKind,
    pub probability: f64,
    pub npv: Money,
    pub irr: Percent,
    pub simple_payback_years: Years,
    pub min_dscr: Option<f64>,
    pub npv_deviation: Money,
    /// NPV deviation relative to |neutral NPV|, in percent
    pub npv_deviation_pct: Percent,
    pub irr_deviation: Percent,
    pub result: InvestmentResult,
}

/// Output of a scenario comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioComparison {
    pub cases: Vec<ScenarioCase>,
    pub probability_weighted_npv: Money,
    pub probability_weighted_irr: Percent,
    /// Optimistic NPV less pessimistic NPV
    pub npv_range: Money,
}

/// Run the pessimistic, neutral and optimistic presets side by side.
///
/// The three runs are independent and execute in parallel; cases come back
/// in preset order. Probabilities must sum to 1 within 0.001.
pub fn compare_scenarios(
    input: &ScenarioComparisonInput,
) -> PolicyInvestResult<ComputationOutput<ScenarioComparison>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    let weights = input.weights;

    for kind in ScenarioKind::ALL {
        let w = weights.weight(kind);
        if !(0.0..=1.0).contains(&w) {
            return Err(PolicyInvestError::InvalidInput {
                field: format!("weights.{}", kind.label()),
                reason: "Probability must be between 0 and 1".into(),
            });
        }
    }
    let total: f64 = ScenarioKind::ALL.iter().map(|k| weights.weight(*k)).sum();
    if (total - 1.0).abs() > 0.001 {
        return Err(PolicyInvestError::InvalidInput {
            field: "weights".into(),
            reason: format!("Probabilities must sum to 1.0 (got {total})"),
        });
    }

    let runs: Vec<(ScenarioKind, InvestmentResult, Vec<String>)> = ScenarioKind::ALL
        .par_iter()
        .map(|kind| {
            let scenario_input = InvestmentInput {
                scenario: *kind,
                ..input.investment.clone()
            };
            run_pipeline(&scenario_input).map(|(result, w)| (*kind, result, w))
        })
        .collect::<PolicyInvestResult<Vec<_>>>()?;

    let (base_npv, base_irr) = runs
        .iter()
        .find(|(kind, _, _)| *kind == ScenarioKind::Neutral)
        .map(|(_, r, _)| (r.npv, r.irr))
        .unwrap_or((0.0, 0.0));

    let mut cases = Vec::with_capacity(runs.len());
    for (kind, result, run_warnings) in runs {
        warnings.extend(
            run_warnings
                .into_iter()
                .map(|w| format!("[{}] {w}", kind.label())),
        );
        let npv_deviation = result.npv - base_npv;
        let npv_deviation_pct = if base_npv == 0.0 {
            0.0
        } else {
            to_pct(npv_deviation / base_npv.abs())
        };
        cases.push(ScenarioCase {
            kind,
            probability: weights.weight(kind),
            npv: result.npv,
            irr: result.irr,
            simple_payback_years: result.simple_payback_years,
            min_dscr: result.min_dscr,
            npv_deviation,
            npv_deviation_pct,
            irr_deviation: result.irr - base_irr,
            result,
        });
    }
    if base_npv == 0.0 {
        warnings.push("Neutral NPV is zero; npv_deviation_pct reported as 0".into());
    }

    let probability_weighted_npv = cases.iter().map(|c| c.probability * c.npv).sum();
    let probability_weighted_irr = cases.iter().map(|c| c.probability * c.irr).sum();
    let npv_of = |kind: ScenarioKind| {
        cases
            .iter()
            .find(|c| c.kind == kind)
            .map_or(0.0, |c| c.npv)
    };
    let npv_range = npv_of(ScenarioKind::Optimistic) - npv_of(ScenarioKind::Pessimistic);
    debug!(probability_weighted_npv, npv_range, "scenario comparison complete");

    let output = ScenarioComparison {
        cases,
        probability_weighted_npv,
        probability_weighted_irr,
        npv_range,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Pessimistic/Neutral/Optimistic Scenario Comparison",
        &serde_json::json!({
            "weights": weights,
            "scenario_adjustment_pct": input.investment.scenario_adjustment,
            "presets": {
                "pessimistic": {"revenue_pct": -20.0, "cost_pct": 10.0},
                "optimistic": {"revenue_pct": 25.0, "cost_pct": -10.0},
            },
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::RevenueBase;

    fn input() -> ScenarioComparisonInput {
        ScenarioComparisonInput {
            investment: InvestmentInput {
                initial_investment: 1000.0,
                revenue: RevenueBase::Flat(600.0),
                operating_profit_rate: 50.0,
                discount_rate: 10.0,
                horizon_years: 5,
                ..Default::default()
            },
            weights: ScenarioWeights::default(),
        }
    }

    #[test]
    fn test_cases_in_preset_order_and_ranked() {
        let out = compare_scenarios(&input()).unwrap().result;
        let kinds: Vec<ScenarioKind> = out.cases.iter().map(|c| c.kind).collect();
        assert_eq!(kinds, ScenarioKind::ALL.to_vec());
        assert!(out.cases[0].npv <= out.cases[1].npv);
        assert!(out.cases[1].npv <= out.cases[2].npv);
        assert_eq!(out.cases[1].npv_deviation, 0.0);
        assert!(out.npv_range > 0.0);
    }

    #[test]
    fn test_probability_weighted_npv() {
        let out = compare_scenarios(&input()).unwrap().result;
        let expected =
            0.25 * out.cases[0].npv + 0.5 * out.cases[1].npv + 0.25 * out.cases[2].npv;
        assert!((out.probability_weighted_npv - expected).abs() < 1e-6);
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let mut bad = input();
        bad.weights.neutral = 0.6;
        let err = compare_scenarios(&bad).unwrap_err();
        assert!(matches!(err, PolicyInvestError::InvalidInput { .. }));
    }
}

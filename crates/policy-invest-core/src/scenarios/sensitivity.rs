use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use crate::analysis::run_pipeline;
use crate::error::PolicyInvestError;
use crate::input::{InvestmentInput, RevenueBase};
use crate::types::*;
use crate::PolicyInvestResult;

/// Upper bound on points per sweep axis.
const MAX_SWEEP_POINTS: usize = 201;

/// Assumption a sweep perturbs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensitivityParameter {
    Revenue,
    ProfitRate,
    DiscountRate,
    GrowthRate,
}

impl SensitivityParameter {
    pub fn label(&self) -> &'static str {
        match self {
            SensitivityParameter::Revenue => "revenue",
            SensitivityParameter::ProfitRate => "operating_profit_rate",
            SensitivityParameter::DiscountRate => "discount_rate",
            SensitivityParameter::GrowthRate => "growth_rate",
        }
    }

    /// Current value of this parameter in `input` (first-year revenue for
    /// revenue, percent for rates).
    pub fn value_in(&self, input: &InvestmentInput) -> f64 {
        match self {
            SensitivityParameter::Revenue => input.base_revenue(),
            SensitivityParameter::ProfitRate => input.operating_profit_rate,
            SensitivityParameter::DiscountRate => input.discount_rate,
            SensitivityParameter::GrowthRate => input.growth_rate,
        }
    }

    /// Copy of `input` with this parameter set to `value`. A per-year revenue
    /// forecast is rescaled so that its first year equals `value`.
    pub fn with_value(&self, input: &InvestmentInput, value: f64) -> InvestmentInput {
        let mut out = input.clone();
        match self {
            SensitivityParameter::Revenue => {
                out.revenue = match &input.revenue {
                    RevenueBase::PerYear(values) if input.base_revenue() != 0.0 => {
                        let scale = value / input.base_revenue();
                        RevenueBase::PerYear(values.iter().map(|v| v * scale).collect())
                    }
                    _ => RevenueBase::Flat(value),
                };
            }
            SensitivityParameter::ProfitRate => out.operating_profit_rate = value,
            SensitivityParameter::DiscountRate => out.discount_rate = value,
            SensitivityParameter::GrowthRate => out.growth_rate = value,
        }
        out
    }
}

/// Output metric read from each run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensitivityMetric {
    #[default]
    Npv,
    Irr,
}

pub fn default_perturbations() -> Vec<Percent> {
    vec![-15.0, -10.0, -5.0, 0.0, 5.0, 10.0, 15.0]
}

// ---------------------------------------------------------------------------
// One-way sweep
// ---------------------------------------------------------------------------

/// Input for a one-way sensitivity sweep
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityRequest {
    pub investment: InvestmentInput,
    pub parameter: SensitivityParameter,
    /// Relative perturbations in percent (10 = parameter x 1.1)
    #[serde(default = "default_perturbations")]
    pub perturbations: Vec<Percent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityPoint {
    pub perturbation: Percent,
    pub parameter_value: f64,
    pub npv: Money,
    pub irr: Percent,
    /// NPV change against the unperturbed run, relative to |base NPV|, in percent
    pub npv_change_pct: Percent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityOutput {
    pub parameter: SensitivityParameter,
    pub base_value: f64,
    pub base_npv: Money,
    pub base_irr: Percent,
    /// One point per perturbation, in request order
    pub points: Vec<SensitivityPoint>,
}

/// Rerun the full pipeline once per perturbation of a single parameter.
pub fn run_sensitivity(
    request: &SensitivityRequest,
) -> PolicyInvestResult<ComputationOutput<SensitivityOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if request.perturbations.is_empty() {
        return Err(PolicyInvestError::InsufficientData(
            "At least one perturbation required".into(),
        ));
    }
    if let Some(bad) = request.perturbations.iter().find(|p| !p.is_finite()) {
        return Err(PolicyInvestError::InvalidInput {
            field: "perturbations".into(),
            reason: format!("Perturbation must be finite (got {bad})"),
        });
    }

    let parameter = request.parameter;
    let base_value = parameter.value_in(&request.investment);
    if base_value == 0.0 {
        warn!(parameter = parameter.label(), "base value is 0; perturbations have no effect");
        warnings.push(format!(
            "{} is 0; relative perturbations leave it unchanged",
            parameter.label()
        ));
    }

    let (base, _) = run_pipeline(&request.investment)?;

    let runs: Vec<(Percent, f64, Money, Percent)> = request
        .perturbations
        .par_iter()
        .map(|delta| {
            let value = base_value * (1.0 + pct(*delta));
            let input = parameter.with_value(&request.investment, value);
            run_pipeline(&input).map(|(r, _)| (*delta, value, r.npv, r.irr))
        })
        .collect::<PolicyInvestResult<Vec<_>>>()?;

    let points = runs
        .into_iter()
        .map(|(perturbation, parameter_value, npv, irr)| SensitivityPoint {
            perturbation,
            parameter_value,
            npv,
            irr,
            npv_change_pct: if base.npv == 0.0 {
                0.0
            } else {
                to_pct((npv - base.npv) / base.npv.abs())
            },
        })
        .collect::<Vec<_>>();
    debug!(parameter = parameter.label(), points = points.len(), "sensitivity sweep complete");

    let output = SensitivityOutput {
        parameter,
        base_value,
        base_npv: base.npv,
        base_irr: base.irr,
        points,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "One-Way Sensitivity Sweep (full pipeline per point)",
        &serde_json::json!({
            "parameter": parameter.label(),
            "perturbations_pct": request.perturbations,
            "perturbation_mode": "relative",
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Two-way grid
// ---------------------------------------------------------------------------

/// One axis of a two-way grid, in the parameter's own unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityAxis {
    pub parameter: SensitivityParameter,
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwoWaySensitivityInput {
    pub investment: InvestmentInput,
    pub variable_1: SensitivityAxis,
    pub variable_2: SensitivityAxis,
    #[serde(default)]
    pub metric: SensitivityMetric,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwoWaySensitivityOutput {
    pub variable_1: SensitivityParameter,
    pub variable_2: SensitivityParameter,
    pub variable_1_values: Vec<f64>,
    pub variable_2_values: Vec<f64>,
    pub metric: SensitivityMetric,
    /// matrix[i][j] = metric at variable_1_values[i], variable_2_values[j]
    pub matrix: Vec<Vec<f64>>,
    /// Metric at the grid point closest to the unperturbed input
    pub base_case_value: f64,
    pub base_case_position: (usize, usize),
}

fn sweep_values(axis: &SensitivityAxis) -> PolicyInvestResult<Vec<f64>> {
    let field = format!("variable:{}", axis.parameter.label());
    if !(axis.min.is_finite() && axis.max.is_finite() && axis.step.is_finite()) {
        return Err(PolicyInvestError::InvalidInput {
            field,
            reason: "Bounds and step must be finite".into(),
        });
    }
    if axis.step <= 0.0 {
        return Err(PolicyInvestError::InvalidInput {
            field,
            reason: "Step must be positive".into(),
        });
    }
    if axis.min > axis.max {
        return Err(PolicyInvestError::InvalidInput {
            field,
            reason: "Min must be <= max".into(),
        });
    }

    // Bound the point count in f64, before casting to usize
    let span = (axis.max - axis.min) / axis.step;
    if span + 1.0 > MAX_SWEEP_POINTS as f64 {
        return Err(PolicyInvestError::InvalidInput {
            field,
            reason: format!("Sweep exceeds {MAX_SWEEP_POINTS} points"),
        });
    }
    let steps = (span + 1e-9).floor() as usize;

    let mut values: Vec<f64> = (0..=steps)
        .map(|i| axis.min + axis.step * i as f64)
        .collect();
    // Include max when the step doesn't land on it
    if let Some(&last) = values.last() {
        if axis.max - last > axis.step * 1e-9 {
            values.push(axis.max);
        }
    }
    Ok(values)
}

fn closest_index(values: &[f64], target: f64) -> usize {
    values
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            (*a - target)
                .abs()
                .partial_cmp(&(*b - target).abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Evaluate NPV (or IRR) over a grid of two parameters.
///
/// Rows are evaluated in parallel. A point whose run fails is recorded as 0
/// with a warning.
pub fn two_way_sensitivity(
    input: &TwoWaySensitivityInput,
) -> PolicyInvestResult<ComputationOutput<TwoWaySensitivityOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.variable_1.parameter == input.variable_2.parameter {
        return Err(PolicyInvestError::InvalidInput {
            field: "variable_2".into(),
            reason: "Grid axes must sweep different parameters".into(),
        });
    }

    let v1_values = sweep_values(&input.variable_1)?;
    let v2_values = sweep_values(&input.variable_2)?;
    let (p1, p2) = (input.variable_1.parameter, input.variable_2.parameter);

    let evaluated: Vec<Vec<PolicyInvestResult<f64>>> = v1_values
        .par_iter()
        .map(|v1| {
            let row_input = p1.with_value(&input.investment, *v1);
            v2_values
                .iter()
                .map(|v2| {
                    let point = p2.with_value(&row_input, *v2);
                    run_pipeline(&point).map(|(r, _)| match input.metric {
                        SensitivityMetric::Npv => r.npv,
                        SensitivityMetric::Irr => r.irr,
                    })
                })
                .collect()
        })
        .collect();

    let mut matrix = Vec::with_capacity(v1_values.len());
    for (v1, row) in v1_values.iter().zip(evaluated) {
        let mut values = Vec::with_capacity(row.len());
        for (v2, cell) in v2_values.iter().zip(row) {
            match cell {
                Ok(val) => values.push(val),
                Err(e) => {
                    warnings.push(format!("Evaluation failed at ({v1}, {v2}): {e}"));
                    values.push(0.0);
                }
            }
        }
        matrix.push(values);
    }

    let base_row = closest_index(&v1_values, p1.value_in(&input.investment));
    let base_col = closest_index(&v2_values, p2.value_in(&input.investment));
    let base_case_value = matrix
        .get(base_row)
        .and_then(|row| row.get(base_col))
        .copied()
        .unwrap_or(0.0);

    let output = TwoWaySensitivityOutput {
        variable_1: p1,
        variable_2: p2,
        variable_1_values: v1_values,
        variable_2_values: v2_values,
        metric: input.metric,
        matrix,
        base_case_value,
        base_case_position: (base_row, base_col),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "2-Way Sensitivity Grid (full pipeline per cell)",
        &serde_json::json!({
            "variable_1": p1.label(),
            "variable_2": p2.label(),
            "metric": input.metric,
        }),
        warnings,
        elapsed,
        output,
    ))
}

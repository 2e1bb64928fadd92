use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use super::tiers::{ScaleTier, TierProfile};
use crate::analysis::{run_pipeline, InvestmentResult};
use crate::input::InvestmentInput;
use crate::returns::payback::UNRECOVERED;
use crate::types::*;
use crate::PolicyInvestResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GradeLetter {
    A,
    B,
    C,
    D,
    F,
}

/// Points earned per factor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubScores {
    pub npv: f64,
    pub irr: f64,
    pub dscr: f64,
    pub payback: f64,
}

impl SubScores {
    pub fn total(&self) -> f64 {
        self.npv + self.irr + self.dscr + self.payback
    }
}

/// A tier requirement the project does not meet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "criterion", rename_all = "snake_case")]
pub enum FailedCriterion {
    IrrBelowMinimum { irr: Percent, minimum: Percent },
    DscrBelowMinimum { dscr: f64, minimum: f64 },
    PaybackBeyondMaximum { payback: Option<Years>, maximum: Years },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentGrade {
    pub letter: GradeLetter,
    pub raw_score: f64,
    /// raw_score x (1 - risk premium), rounded
    pub adjusted_score: f64,
    pub sub_scores: SubScores,
    pub tier: ScaleTier,
    /// Risk premium applied, in percent
    pub risk_premium: Percent,
    pub failed_criteria: Vec<FailedCriterion>,
}

/// Analysis and grade together, as returned by [`analyze_and_grade`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradedInvestment {
    pub analysis: InvestmentResult,
    pub grade: InvestmentGrade,
}

// ---------------------------------------------------------------------------
// Grading
// ---------------------------------------------------------------------------

/// Score an analysed investment against the table for its scale tier.
///
/// `initial_investment` selects the tier; `discount_rate` (percent) is the
/// hurdle the IRR is measured against.
pub fn grade_investment(
    result: &InvestmentResult,
    initial_investment: Money,
    discount_rate: Percent,
) -> InvestmentGrade {
    let tier = ScaleTier::classify(initial_investment);
    let profile = tier.profile();

    let coverage = result.average_dscr;
    let payback = Some(result.simple_payback_years).filter(|p| *p != UNRECOVERED);

    let sub_scores = SubScores {
        npv: profile.weights.npv * npv_fraction(result.npv, profile),
        irr: if result.irr_converged {
            profile.weights.irr * irr_fraction(result.irr - discount_rate)
        } else {
            0.0
        },
        dscr: profile.weights.dscr * dscr_fraction(coverage, profile.min_dscr),
        payback: profile.weights.payback * payback_fraction(payback, profile.max_payback),
    };

    let raw_score = sub_scores.total();
    let adjusted_score = (raw_score * (1.0 - profile.risk_premium)).round();
    let letter = letter_for(adjusted_score, profile);
    let failed_criteria = failed_criteria(result, coverage, payback, profile);

    debug!(?tier, raw_score, adjusted_score, ?letter, "investment graded");

    InvestmentGrade {
        letter,
        raw_score,
        adjusted_score,
        sub_scores,
        tier,
        risk_premium: to_pct(profile.risk_premium),
        failed_criteria,
    }
}

/// Run the analysis and grade the result.
pub fn analyze_and_grade(
    input: &InvestmentInput,
) -> PolicyInvestResult<ComputationOutput<GradedInvestment>> {
    let start = Instant::now();
    let (analysis, warnings) = run_pipeline(input)?;
    // The grade uses the sanitised outlay and rate, as the analysis did.
    let outlay = input.initial_investment.max(0.0);
    let discount_rate = input.discount_rate.clamp(0.0, 100.0);
    let grade = grade_investment(&analysis, outlay, discount_rate);
    let tier = grade.tier;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Scale-Tiered Investment Scorecard (NPV, IRR spread, DSCR, payback)",
        &serde_json::json!({
            "tier": tier,
            "initial_investment": outlay,
            "discount_rate_pct": discount_rate,
            "dscr_basis": "average over debt-service years",
            "payback_basis": "simple payback",
        }),
        warnings,
        elapsed,
        GradedInvestment { analysis, grade },
    ))
}

// ── Factor tables ──

fn npv_fraction(npv: Money, profile: &TierProfile) -> f64 {
    let [low, mid, high] = profile.npv_bands;
    match npv {
        x if x < 0.0 => 0.0,
        x if x < low => 0.4,
        x if x < mid => 0.6,
        x if x < high => 0.8,
        _ => 1.0,
    }
}

/// IRR spread over the discount rate, in percentage points.
fn irr_fraction(spread: Percent) -> f64 {
    match spread {
        x if x >= 10.0 => 1.0,
        x if x >= 5.0 => 0.8,
        x if x >= 2.0 => 0.6,
        x if x >= 0.0 => 0.4,
        _ => 0.0,
    }
}

/// No debt service at all earns full coverage points.
fn dscr_fraction(dscr: Option<f64>, minimum: f64) -> f64 {
    match dscr {
        None => 1.0,
        Some(x) if x >= minimum + 0.5 => 1.0,
        Some(x) if x >= minimum + 0.2 => 0.8,
        Some(x) if x >= minimum => 0.6,
        Some(x) if x >= 1.0 => 0.3,
        Some(_) => 0.0,
    }
}

fn payback_fraction(payback: Option<Years>, maximum: Years) -> f64 {
    match payback {
        None => 0.0,
        Some(x) if x <= maximum - 3.0 => 1.0,
        Some(x) if x <= maximum - 1.0 => 0.8,
        Some(x) if x <= maximum => 0.6,
        Some(x) if x <= maximum + 2.0 => 0.3,
        Some(_) => 0.0,
    }
}

fn letter_for(score: f64, profile: &TierProfile) -> GradeLetter {
    let t = profile.grade_thresholds;
    match score {
        s if s >= t.a => GradeLetter::A,
        s if s >= t.b => GradeLetter::B,
        s if s >= t.c => GradeLetter::C,
        s if s >= t.d => GradeLetter::D,
        _ => GradeLetter::F,
    }
}

fn failed_criteria(
    result: &InvestmentResult,
    coverage: Option<f64>,
    payback: Option<Years>,
    profile: &TierProfile,
) -> Vec<FailedCriterion> {
    let mut failed = Vec::new();
    if !result.irr_converged || result.irr < profile.min_irr {
        failed.push(FailedCriterion::IrrBelowMinimum {
            irr: result.irr,
            minimum: profile.min_irr,
        });
    }
    if let Some(dscr) = coverage.filter(|d| *d < profile.min_dscr) {
        failed.push(FailedCriterion::DscrBelowMinimum {
            dscr,
            minimum: profile.min_dscr,
        });
    }
    if payback.map_or(true, |p| p > profile.max_payback) {
        failed.push(FailedCriterion::PaybackBeyondMaximum {
            payback,
            maximum: profile.max_payback,
        });
    }
    failed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factor_tables() {
        let micro = ScaleTier::Micro.profile();
        assert_eq!(npv_fraction(-1.0, micro), 0.0);
        assert_eq!(npv_fraction(0.0, micro), 0.4);
        assert_eq!(npv_fraction(60_000_000.0, micro), 1.0);
        assert_eq!(irr_fraction(12.0), 1.0);
        assert_eq!(irr_fraction(-0.1), 0.0);
        assert_eq!(dscr_fraction(None, 1.2), 1.0);
        assert_eq!(dscr_fraction(Some(1.25), 1.2), 0.6);
        assert_eq!(dscr_fraction(Some(0.9), 1.2), 0.0);
        assert_eq!(payback_fraction(None, 7.0), 0.0);
        assert_eq!(payback_fraction(Some(3.5), 7.0), 1.0);
        assert_eq!(payback_fraction(Some(8.5), 7.0), 0.3);
    }

    #[test]
    fn test_letter_thresholds_scale_with_tier() {
        assert_eq!(letter_for(81.0, ScaleTier::Micro.profile()), GradeLetter::A);
        assert_eq!(letter_for(81.0, ScaleTier::Mega.profile()), GradeLetter::B);
        assert_eq!(letter_for(10.0, ScaleTier::Mega.profile()), GradeLetter::F);
    }

    #[test]
    fn test_failed_criterion_serialises_tagged() {
        let c = FailedCriterion::DscrBelowMinimum {
            dscr: 1.0,
            minimum: 1.2,
        };
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["criterion"], "dscr_below_minimum");
    }
}

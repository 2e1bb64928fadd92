use approx::assert_abs_diff_eq;
use policy_invest_core::analysis::run_pipeline;
use policy_invest_core::grading::grade::{FailedCriterion, GradeLetter};
use policy_invest_core::grading::{analyze_and_grade, grade_investment, ScaleTier};
use policy_invest_core::input::{InvestmentInput, LoanTerms, RevenueBase};
use pretty_assertions::assert_eq;

fn levered_project() -> InvestmentInput {
    InvestmentInput {
        initial_investment: 2_000_000_000.0,
        policy_loan: LoanTerms::new(1_000_000_000.0, 2.0, 2, 5),
        other_debt: LoanTerms::new(500_000_000.0, 6.0, 0, 5),
        revenue: RevenueBase::Flat(1_200_000_000.0),
        operating_profit_rate: 40.0,
        tax_rate: 20.0,
        discount_rate: 8.0,
        horizon_years: 10,
        growth_rate: 5.0,
        depreciation_years: 10,
        working_capital_rate: 5.0,
        residual_value_rate: 10.0,
        ..Default::default()
    }
}

// ===========================================================================
// Scorecard
// ===========================================================================

#[test]
fn test_medium_tier_scorecard() {
    let input = levered_project();
    let (result, _) = run_pipeline(&input).unwrap();
    let grade = grade_investment(&result, input.initial_investment, input.discount_rate);

    assert_eq!(grade.tier, ScaleTier::Medium);
    // NPV 109M below the first 1B band: 0.4 x 30
    assert_abs_diff_eq!(grade.sub_scores.npv, 12.0, epsilon = 1e-9);
    // IRR spread 0.88pp: 0.4 x 30
    assert_abs_diff_eq!(grade.sub_scores.irr, 12.0, epsilon = 1e-9);
    // Average DSCR 2.56 well above 1.25
    assert_abs_diff_eq!(grade.sub_scores.dscr, 20.0, epsilon = 1e-9);
    // Payback 7.90 beyond the 7.5 maximum: 0.3 x 20
    assert_abs_diff_eq!(grade.sub_scores.payback, 6.0, epsilon = 1e-9);
    assert_abs_diff_eq!(grade.raw_score, 50.0, epsilon = 1e-9);
    // round(50 x 0.95)
    assert_eq!(grade.adjusted_score, 48.0);
    assert_eq!(grade.risk_premium, 5.0);
    assert_eq!(grade.letter, GradeLetter::D);
    assert_eq!(grade.failed_criteria.len(), 2);
    assert!(matches!(
        grade.failed_criteria[0],
        FailedCriterion::IrrBelowMinimum { minimum, .. } if minimum == 10.0
    ));
    assert!(matches!(
        grade.failed_criteria[1],
        FailedCriterion::PaybackBeyondMaximum { maximum, .. } if maximum == 7.5
    ));
}

#[test]
fn test_same_result_grades_lower_at_larger_scale() {
    let input = levered_project();
    let (result, _) = run_pipeline(&input).unwrap();
    let small = grade_investment(&result, 500_000_000.0, input.discount_rate);
    let mega = grade_investment(&result, 200_000_000_000.0, input.discount_rate);
    assert_eq!(small.tier, ScaleTier::Small);
    assert_eq!(mega.tier, ScaleTier::Mega);
    assert!(small.adjusted_score > mega.adjusted_score);
    assert!(small.letter <= mega.letter);
}

#[test]
fn test_unrecovered_undetermined_project_fails() {
    let input = InvestmentInput {
        initial_investment: 50_000_000.0,
        revenue: RevenueBase::Flat(10_000_000.0),
        operating_profit_rate: 0.0,
        discount_rate: 10.0,
        horizon_years: 5,
        ..Default::default()
    };
    let (result, _) = run_pipeline(&input).unwrap();
    let grade = grade_investment(&result, input.initial_investment, input.discount_rate);

    assert_eq!(grade.tier, ScaleTier::Micro);
    assert_eq!(grade.sub_scores.npv, 0.0);
    assert_eq!(grade.sub_scores.irr, 0.0);
    assert_eq!(grade.sub_scores.payback, 0.0);
    // No debt: coverage points are full
    assert_eq!(grade.sub_scores.dscr, 20.0);
    assert_eq!(grade.letter, GradeLetter::F);
    assert_eq!(grade.failed_criteria.len(), 2);
}

#[test]
fn test_grading_is_pure() {
    let input = levered_project();
    let (result, _) = run_pipeline(&input).unwrap();
    let a = grade_investment(&result, input.initial_investment, input.discount_rate);
    let b = grade_investment(&result, input.initial_investment, input.discount_rate);
    assert_eq!(a, b);
}

#[test]
fn test_analyze_and_grade_envelope() {
    let out = analyze_and_grade(&levered_project()).unwrap();
    assert_eq!(out.result.grade.letter, GradeLetter::D);
    assert_eq!(out.assumptions["tier"], "medium");
}

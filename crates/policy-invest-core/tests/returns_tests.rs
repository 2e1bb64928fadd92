use approx::{assert_abs_diff_eq, assert_relative_eq};
use policy_invest_core::returns::irr::{
    practical_irr, solve_irr, solve_irr_with, IrrSolverConfig, SolverState,
};
use policy_invest_core::returns::payback::{
    discounted_payback, or_unrecovered, simple_payback, UNRECOVERED,
};
use policy_invest_core::time_value::{npv, npv_at_rate, present_values};
use policy_invest_core::PolicyInvestError;

// ===========================================================================
// NPV
// ===========================================================================

#[test]
fn test_npv_reference_vector() {
    let cfs = [-1_000_000_000.0, 200_000_000.0, 200_000_000.0, 200_000_000.0];
    let value = npv(0.10, &cfs).unwrap();
    assert_abs_diff_eq!(value, -502_629_601.8, epsilon = 1.0);
}

#[test]
fn test_npv_year_zero_not_discounted() {
    assert_eq!(npv(0.5, &[-100.0]).unwrap(), -100.0);
    assert_eq!(npv(0.1, &[]).unwrap(), 0.0);
}

#[test]
fn test_npv_same_sign_vectors_are_finite() {
    assert!(npv(0.1, &[100.0, 100.0, 100.0]).unwrap() > 0.0);
    assert!(npv(0.1, &[-100.0, -100.0]).unwrap() < 0.0);
}

#[test]
fn test_npv_rejects_rate_at_minus_one() {
    let err = npv(-1.0, &[-100.0, 50.0]).unwrap_err();
    assert!(matches!(err, PolicyInvestError::InvalidInput { .. }));
}

#[test]
fn test_present_values_sum_to_npv() {
    let cfs = [-500.0, 120.0, 180.0, 260.0];
    let total: f64 = present_values(0.07, &cfs).iter().sum();
    assert_relative_eq!(total, npv(0.07, &cfs).unwrap(), max_relative = 1e-12);
}

// ===========================================================================
// IRR
// ===========================================================================

#[test]
fn test_irr_golden_values() {
    let three_year = solve_irr(&[-1000.0, 400.0, 400.0, 400.0]).unwrap();
    assert_abs_diff_eq!(three_year.rate, 0.09701, epsilon = 1e-4);

    let five_year = solve_irr(&[-1e9, 3e8, 3e8, 3e8, 3e8, 3e8]).unwrap();
    assert_abs_diff_eq!(five_year.rate, 0.15238, epsilon = 1e-4);

    let reference = solve_irr(&[-1e9, 2e8, 2e8, 2e8]).unwrap();
    assert_abs_diff_eq!(reference.rate, -0.21763, epsilon = 1e-4);
}

#[test]
fn test_npv_at_irr_is_zero() {
    let vectors: Vec<Vec<f64>> = vec![
        vec![-1e9, 3e8, 3e8, 3e8, 3e8, 3e8],
        vec![-2e9, 2.24e8, 3.05e8, 1.3e8, 1.6e8, 1.9e8, 3.2e8, 3.5e8, 5.8e8, 6e8, 9.2e8],
        vec![-5e8, 1e8, 4e8, 2e8],
        vec![-1000.0, 50.0, 50.0, 50.0, 1050.0],
    ];
    for cfs in &vectors {
        let sol = solve_irr(cfs).unwrap();
        assert_eq!(sol.state, SolverState::Converged);
        let residual = npv_at_rate(sol.rate, cfs);
        assert!(residual.abs() < 1e5, "residual {residual} for {cfs:?}");
    }
}

#[test]
fn test_irr_undetermined_cases() {
    assert!(matches!(
        solve_irr(&[100.0]),
        Err(PolicyInvestError::InsufficientData(_))
    ));
    assert!(matches!(
        solve_irr(&[-100.0, -5.0]),
        Err(PolicyInvestError::NoSignChange)
    ));
    assert!(matches!(
        solve_irr(&[-100.0, f64::NAN]),
        Err(PolicyInvestError::NonFinite { .. })
    ));
}

#[test]
fn test_irr_bracket_expands_upward() {
    // IRR of 1500% lies above the default 1000% upper bound
    let config = IrrSolverConfig {
        report_cap: 20.0,
        ..IrrSolverConfig::default()
    };
    let sol = solve_irr_with(&[-100.0, 1600.0], &config).unwrap();
    assert!(sol.bracket_expansions >= 1);
    assert_abs_diff_eq!(sol.rate, 15.0, epsilon = 1e-4);
}

#[test]
fn test_irr_reported_clamp_and_display_band() {
    let sol = solve_irr(&[-100.0, 1600.0]).unwrap();
    assert_eq!(sol.rate, 5.0);
    assert_eq!(practical_irr(sol.rate), 0.80);
    assert_eq!(practical_irr(-0.9), -0.50);
    assert_eq!(practical_irr(0.12), 0.12);
}

// ===========================================================================
// Payback
// ===========================================================================

#[test]
fn test_payback_first_year_exact() {
    assert_eq!(simple_payback(100.0, &[250.0, 10.0]), Some(1.0));
}

#[test]
fn test_payback_unrecovered_sentinel() {
    let p = simple_payback(1000.0, &[100.0, 100.0]);
    assert_eq!(p, None);
    assert_eq!(or_unrecovered(p), UNRECOVERED);
    assert_eq!(or_unrecovered(simple_payback(0.0, &[100.0])), -1.0);
}

#[test]
fn test_discounted_payback_not_before_simple() {
    let outlay = 1000.0;
    let flows = [300.0, 300.0, 300.0, 300.0, 300.0, 300.0];
    let pvs: Vec<f64> = present_values(0.08, &[0.0, 300.0, 300.0, 300.0, 300.0, 300.0, 300.0])
        .into_iter()
        .skip(1)
        .collect();
    let simple = simple_payback(outlay, &flows).unwrap();
    let discounted = discounted_payback(outlay, &pvs).unwrap();
    assert_abs_diff_eq!(simple, 3.0 + 100.0 / 300.0, epsilon = 1e-9);
    assert!(discounted >= simple);
}

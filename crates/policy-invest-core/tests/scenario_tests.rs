use approx::assert_abs_diff_eq;
use policy_invest_core::analysis::run_pipeline;
use policy_invest_core::input::{InvestmentInput, LoanTerms, RevenueBase, ScenarioKind};
use policy_invest_core::scenarios::adjustment::{shift_input, ScenarioPreset};
use policy_invest_core::scenarios::scenario::{ScenarioComparisonInput, ScenarioWeights};
use policy_invest_core::scenarios::sensitivity::{
    default_perturbations, SensitivityAxis, SensitivityMetric, SensitivityParameter,
    SensitivityRequest, TwoWaySensitivityInput,
};
use policy_invest_core::scenarios::{compare_scenarios, run_sensitivity, two_way_sensitivity};
use pretty_assertions::assert_eq;

fn project() -> InvestmentInput {
    InvestmentInput {
        initial_investment: 3_000_000_000.0,
        policy_loan: LoanTerms::new(1_500_000_000.0, 1.5, 1, 10),
        revenue: RevenueBase::Flat(1_000_000_000.0),
        operating_profit_rate: 30.0,
        tax_rate: 22.0,
        discount_rate: 7.0,
        horizon_years: 12,
        growth_rate: 3.0,
        penetration_rate: Some(15.0),
        retention_rate: Some(98.0),
        depreciation_years: 12,
        ..Default::default()
    }
}

// ===========================================================================
// Scenario comparison
// ===========================================================================

#[test]
fn test_scenario_npv_ordering() {
    let out = compare_scenarios(&ScenarioComparisonInput {
        investment: project(),
        weights: ScenarioWeights::default(),
    })
    .unwrap();
    let npvs: Vec<f64> = out.result.cases.iter().map(|c| c.npv).collect();
    assert!(npvs[0] <= npvs[1], "pessimistic above neutral: {npvs:?}");
    assert!(npvs[1] <= npvs[2], "neutral above optimistic: {npvs:?}");
}

#[test]
fn test_scenario_ordering_holds_for_negative_margin() {
    let out = compare_scenarios(&ScenarioComparisonInput {
        investment: InvestmentInput {
            operating_profit_rate: -80.0,
            ..project()
        },
        weights: ScenarioWeights::default(),
    })
    .unwrap();
    assert!(out.warnings.iter().any(|w| w.contains("operating_profit_rate")));

    let cases = &out.result.cases;
    assert_eq!(cases[1].result.scenario.base_profit_rate, 0.0);
    assert!(cases[0].npv <= cases[1].npv, "pessimistic above neutral");
    assert!(cases[1].npv <= cases[2].npv, "neutral above optimistic");
}

#[test]
fn test_scenario_cases_match_single_runs() {
    let out = compare_scenarios(&ScenarioComparisonInput {
        investment: project(),
        weights: ScenarioWeights::default(),
    })
    .unwrap()
    .result;

    for case in &out.cases {
        let single = InvestmentInput {
            scenario: case.kind,
            ..project()
        };
        let (result, _) = run_pipeline(&single).unwrap();
        assert_eq!(case.npv, result.npv);
        assert_eq!(case.result, result);
    }
}

#[test]
fn test_custom_weights() {
    let out = compare_scenarios(&ScenarioComparisonInput {
        investment: project(),
        weights: ScenarioWeights {
            pessimistic: 0.0,
            neutral: 0.0,
            optimistic: 1.0,
        },
    })
    .unwrap()
    .result;
    assert_eq!(out.probability_weighted_npv, out.cases[2].npv);
}

#[test]
fn test_override_ordering_holds() {
    let mut investment = project();
    investment.scenario_adjustment = Some(5.0);
    let out = compare_scenarios(&ScenarioComparisonInput {
        investment,
        weights: ScenarioWeights::default(),
    })
    .unwrap()
    .result;
    assert!(out.cases[0].npv <= out.cases[1].npv);
    assert!(out.cases[1].npv <= out.cases[2].npv);
    assert_abs_diff_eq!(out.cases[0].result.scenario.revenue_shift, -5.0, epsilon = 1e-9);
    assert_abs_diff_eq!(out.cases[2].result.scenario.cost_shift, -2.0, epsilon = 1e-9);
}

#[test]
fn test_per_year_revenue_shifted() {
    let input = InvestmentInput {
        revenue: RevenueBase::PerYear(vec![100.0, 200.0]),
        ..project()
    };
    let shifted = shift_input(&input, &ScenarioPreset::for_kind(ScenarioKind::Optimistic));
    assert_eq!(shifted.revenue, RevenueBase::PerYear(vec![125.0, 250.0]));
}

// ===========================================================================
// Sensitivity
// ===========================================================================

#[test]
fn test_profit_rate_sweep() {
    let out = run_sensitivity(&SensitivityRequest {
        investment: project(),
        parameter: SensitivityParameter::ProfitRate,
        perturbations: default_perturbations(),
    })
    .unwrap()
    .result;

    assert_eq!(out.base_value, 30.0);
    let values: Vec<f64> = out.points.iter().map(|p| p.parameter_value).collect();
    assert_abs_diff_eq!(values[0], 25.5, epsilon = 1e-9);
    assert_abs_diff_eq!(values[6], 34.5, epsilon = 1e-9);
    assert!(out.points.windows(2).all(|w| w[0].npv < w[1].npv));
    assert!(out.points.windows(2).all(|w| w[0].irr <= w[1].irr));
}

#[test]
fn test_sensitivity_request_defaults_perturbations() {
    let json = serde_json::json!({
        "investment": project(),
        "parameter": "discount_rate",
    });
    let request: SensitivityRequest = serde_json::from_value(json).unwrap();
    assert_eq!(request.perturbations, default_perturbations());
}

#[test]
fn test_two_way_irr_grid_ignores_discount_axis() {
    let out = two_way_sensitivity(&TwoWaySensitivityInput {
        investment: project(),
        variable_1: SensitivityAxis {
            parameter: SensitivityParameter::DiscountRate,
            min: 5.0,
            max: 9.0,
            step: 2.0,
        },
        variable_2: SensitivityAxis {
            parameter: SensitivityParameter::Revenue,
            min: 800_000_000.0,
            max: 1_200_000_000.0,
            step: 200_000_000.0,
        },
        metric: SensitivityMetric::Irr,
    })
    .unwrap()
    .result;

    for col in 0..out.variable_2_values.len() {
        assert_abs_diff_eq!(out.matrix[0][col], out.matrix[2][col], epsilon = 1e-6);
    }
    assert_eq!(out.base_case_position, (1, 1));
}

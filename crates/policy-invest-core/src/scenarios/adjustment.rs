use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::input::{InvestmentInput, RevenueBase, ScenarioKind};
use crate::types::*;

/// Revenue and cost shifts for one scenario, as decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioPreset {
    pub kind: ScenarioKind,
    /// Multiplicative revenue shift (-0.20 = revenue x 0.8)
    pub revenue_shift: Rate,
    /// Multiplicative cost shift (+0.10 = cost x 1.1)
    pub cost_shift: Rate,
}

impl ScenarioPreset {
    pub fn for_kind(kind: ScenarioKind) -> Self {
        let (revenue_shift, cost_shift) = match kind {
            ScenarioKind::Pessimistic => (-0.20, 0.10),
            ScenarioKind::Neutral => (0.0, 0.0),
            ScenarioKind::Optimistic => (0.25, -0.10),
        };
        Self {
            kind,
            revenue_shift,
            cost_shift,
        }
    }

    /// Replace the revenue magnitude, keeping the direction of both shifts and
    /// the preset ratio of cost shift to revenue shift. Neutral has no
    /// direction and is returned unchanged.
    pub fn with_override(self, magnitude: Rate) -> Self {
        if self.revenue_shift == 0.0 {
            return self;
        }
        let ratio = self.cost_shift / self.revenue_shift;
        let revenue_shift = magnitude.abs() * self.revenue_shift.signum();
        Self {
            kind: self.kind,
            revenue_shift,
            cost_shift: revenue_shift * ratio,
        }
    }

    /// Operating profit rate once costs (revenue x (1 - p)) are shifted.
    pub fn adjusted_profit_rate(&self, profit_rate: Rate) -> Rate {
        (1.0 - (1.0 - profit_rate) * (1.0 + self.cost_shift)).max(-1.0)
    }
}

/// The shifts actually applied to an analysis, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AppliedScenario {
    pub kind: ScenarioKind,
    pub revenue_shift: Percent,
    pub cost_shift: Percent,
    pub base_profit_rate: Percent,
    pub adjusted_profit_rate: Percent,
}

/// Resolve the selected scenario (with any override) and apply it to a
/// sanitised input. Returns the shifted input, the record of what was
/// applied, and any warnings.
pub fn apply_scenario(input: &InvestmentInput) -> (InvestmentInput, AppliedScenario, Vec<String>) {
    let mut warnings = Vec::new();
    let mut preset = ScenarioPreset::for_kind(input.scenario);

    if let Some(adj) = input.scenario_adjustment {
        if input.scenario == ScenarioKind::Neutral {
            warn!(adjustment = adj, "scenario adjustment ignored for neutral scenario");
            warnings.push(format!(
                "scenario_adjustment {adj}% ignored: neutral scenario applies no shift"
            ));
        } else {
            preset = preset.with_override(pct(adj));
        }
    }

    let shifted = shift_input(input, &preset);
    let applied = AppliedScenario {
        kind: preset.kind,
        revenue_shift: to_pct(preset.revenue_shift),
        cost_shift: to_pct(preset.cost_shift),
        base_profit_rate: input.operating_profit_rate,
        adjusted_profit_rate: shifted.operating_profit_rate,
    };
    debug!(
        scenario = preset.kind.label(),
        revenue_shift = applied.revenue_shift,
        adjusted_profit_rate = applied.adjusted_profit_rate,
        "scenario applied"
    );
    (shifted, applied, warnings)
}

/// Apply a preset to an input without consulting its own scenario fields.
pub fn shift_input(input: &InvestmentInput, preset: &ScenarioPreset) -> InvestmentInput {
    let factor = 1.0 + preset.revenue_shift;
    let revenue = match &input.revenue {
        RevenueBase::Flat(v) => RevenueBase::Flat(v * factor),
        RevenueBase::PerYear(values) => {
            RevenueBase::PerYear(values.iter().map(|v| v * factor).collect())
        }
    };
    let profit_rate = to_pct(preset.adjusted_profit_rate(pct(input.operating_profit_rate)));

    InvestmentInput {
        revenue,
        operating_profit_rate: profit_rate,
        scenario: preset.kind,
        ..input.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn input(kind: ScenarioKind, adjustment: Option<Percent>) -> InvestmentInput {
        InvestmentInput {
            initial_investment: 1000.0,
            revenue: RevenueBase::Flat(500.0),
            operating_profit_rate: 40.0,
            discount_rate: 10.0,
            horizon_years: 3,
            scenario: kind,
            scenario_adjustment: adjustment,
            ..Default::default()
        }
    }

    #[test]
    fn test_neutral_is_identity() {
        let base = input(ScenarioKind::Neutral, None);
        let (shifted, applied, warnings) = apply_scenario(&base);
        assert_eq!(shifted.revenue, RevenueBase::Flat(500.0));
        assert_abs_diff_eq!(shifted.operating_profit_rate, 40.0, epsilon = 1e-12);
        assert_eq!(applied.revenue_shift, 0.0);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_pessimistic_preset() {
        let (shifted, applied, _) = apply_scenario(&input(ScenarioKind::Pessimistic, None));
        assert_eq!(shifted.revenue, RevenueBase::Flat(400.0));
        // cost 60% x 1.1 = 66%
        assert_abs_diff_eq!(shifted.operating_profit_rate, 34.0, epsilon = 1e-9);
        assert_abs_diff_eq!(applied.cost_shift, 10.0, epsilon = 1e-12);
    }

    #[test]
    fn test_optimistic_preset() {
        let (shifted, _, _) = apply_scenario(&input(ScenarioKind::Optimistic, None));
        assert_eq!(shifted.revenue, RevenueBase::Flat(625.0));
        // cost 60% x 0.9 = 54%
        assert_abs_diff_eq!(shifted.operating_profit_rate, 46.0, epsilon = 1e-9);
    }

    #[test]
    fn test_override_keeps_direction_and_ratio() {
        let (shifted, applied, _) = apply_scenario(&input(ScenarioKind::Pessimistic, Some(30.0)));
        assert_abs_diff_eq!(applied.revenue_shift, -30.0, epsilon = 1e-9);
        assert_abs_diff_eq!(applied.cost_shift, 15.0, epsilon = 1e-9);
        assert_eq!(shifted.revenue, RevenueBase::Flat(350.0));

        let (_, applied, _) = apply_scenario(&input(ScenarioKind::Optimistic, Some(10.0)));
        assert_abs_diff_eq!(applied.revenue_shift, 10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(applied.cost_shift, -4.0, epsilon = 1e-9);
    }

    #[test]
    fn test_override_on_neutral_warns() {
        let (shifted, _, warnings) = apply_scenario(&input(ScenarioKind::Neutral, Some(20.0)));
        assert_eq!(shifted.revenue, RevenueBase::Flat(500.0));
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_profit_rate_floor() {
        let preset = ScenarioPreset::for_kind(ScenarioKind::Pessimistic).with_override(5.0);
        assert_eq!(preset.adjusted_profit_rate(-0.9), -1.0);
    }
}

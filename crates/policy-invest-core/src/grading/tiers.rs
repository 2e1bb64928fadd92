//! Scale tiers and their scoring tables.
//!
//! Larger deals carry a higher risk premium, stricter coverage and payback
//! requirements, and need a higher score for the same letter.

use serde::{Deserialize, Serialize};

use crate::types::{Money, Percent, Rate, Years};

/// Investment scale classification by initial outlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleTier {
    /// Below 100M
    Micro,
    /// 100M to below 1B
    Small,
    /// 1B to below 10B
    Medium,
    /// 10B to below 100B
    Large,
    /// 100B and above
    Mega,
}

/// Points available per factor; the four add up to 100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorWeights {
    pub npv: f64,
    pub irr: f64,
    pub dscr: f64,
    pub payback: f64,
}

impl FactorWeights {
    pub fn total(&self) -> f64 {
        self.npv + self.irr + self.dscr + self.payback
    }
}

/// Minimum adjusted score for each letter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradeThresholds {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierProfile {
    pub tier: ScaleTier,
    pub weights: FactorWeights,
    pub min_irr: Percent,
    pub min_dscr: f64,
    pub max_payback: Years,
    pub risk_premium: Rate,
    /// NPV thresholds for 60%, 80% and 100% of the NPV points
    pub npv_bands: [Money; 3],
    pub grade_thresholds: GradeThresholds,
}

const MICRO: TierProfile = TierProfile {
    tier: ScaleTier::Micro,
    weights: FactorWeights { npv: 25.0, irr: 30.0, dscr: 20.0, payback: 25.0 },
    min_irr: 8.0,
    min_dscr: 1.2,
    max_payback: 7.0,
    risk_premium: 0.0,
    npv_bands: [10_000_000.0, 30_000_000.0, 50_000_000.0],
    grade_thresholds: GradeThresholds { a: 80.0, b: 65.0, c: 50.0, d: 35.0 },
};

const SMALL: TierProfile = TierProfile {
    tier: ScaleTier::Small,
    weights: FactorWeights { npv: 25.0, irr: 30.0, dscr: 20.0, payback: 25.0 },
    min_irr: 8.0,
    min_dscr: 1.2,
    max_payback: 7.0,
    risk_premium: 0.02,
    npv_bands: [100_000_000.0, 300_000_000.0, 500_000_000.0],
    grade_thresholds: GradeThresholds { a: 80.0, b: 65.0, c: 50.0, d: 35.0 },
};

const MEDIUM: TierProfile = TierProfile {
    tier: ScaleTier::Medium,
    weights: FactorWeights { npv: 30.0, irr: 30.0, dscr: 20.0, payback: 20.0 },
    min_irr: 10.0,
    min_dscr: 1.25,
    max_payback: 7.5,
    risk_premium: 0.05,
    npv_bands: [1_000_000_000.0, 3_000_000_000.0, 5_000_000_000.0],
    grade_thresholds: GradeThresholds { a: 82.0, b: 68.0, c: 52.0, d: 38.0 },
};

const LARGE: TierProfile = TierProfile {
    tier: ScaleTier::Large,
    weights: FactorWeights { npv: 30.0, irr: 25.0, dscr: 25.0, payback: 20.0 },
    min_irr: 12.0,
    min_dscr: 1.3,
    max_payback: 8.0,
    risk_premium: 0.08,
    npv_bands: [10_000_000_000.0, 30_000_000_000.0, 50_000_000_000.0],
    grade_thresholds: GradeThresholds { a: 85.0, b: 70.0, c: 55.0, d: 40.0 },
};

const MEGA: TierProfile = TierProfile {
    tier: ScaleTier::Mega,
    weights: FactorWeights { npv: 35.0, irr: 25.0, dscr: 25.0, payback: 15.0 },
    min_irr: 12.0,
    min_dscr: 1.4,
    max_payback: 8.0,
    risk_premium: 0.12,
    npv_bands: [100_000_000_000.0, 300_000_000_000.0, 500_000_000_000.0],
    grade_thresholds: GradeThresholds { a: 88.0, b: 75.0, c: 60.0, d: 45.0 },
};

impl ScaleTier {
    pub const ALL: [ScaleTier; 5] = [
        ScaleTier::Micro,
        ScaleTier::Small,
        ScaleTier::Medium,
        ScaleTier::Large,
        ScaleTier::Mega,
    ];

    pub fn classify(initial_investment: Money) -> Self {
        match initial_investment {
            x if x < 100_000_000.0 => ScaleTier::Micro,
            x if x < 1_000_000_000.0 => ScaleTier::Small,
            x if x < 10_000_000_000.0 => ScaleTier::Medium,
            x if x < 100_000_000_000.0 => ScaleTier::Large,
            _ => ScaleTier::Mega,
        }
    }

    pub fn profile(&self) -> &'static TierProfile {
        match self {
            ScaleTier::Micro => &MICRO,
            ScaleTier::Small => &SMALL,
            ScaleTier::Medium => &MEDIUM,
            ScaleTier::Large => &LARGE,
            ScaleTier::Mega => &MEGA,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_boundaries() {
        assert_eq!(ScaleTier::classify(99_999_999.0), ScaleTier::Micro);
        assert_eq!(ScaleTier::classify(100_000_000.0), ScaleTier::Small);
        assert_eq!(ScaleTier::classify(1_000_000_000.0), ScaleTier::Medium);
        assert_eq!(ScaleTier::classify(10_000_000_000.0), ScaleTier::Large);
        assert_eq!(ScaleTier::classify(100_000_000_000.0), ScaleTier::Mega);
    }

    #[test]
    fn test_profiles_consistent() {
        for tier in ScaleTier::ALL {
            let p = tier.profile();
            assert_eq!(p.tier, tier);
            assert!((p.weights.total() - 100.0).abs() < 1e-9);
            assert!(p.npv_bands.windows(2).all(|w| w[0] < w[1]));
            let g = p.grade_thresholds;
            assert!(g.a > g.b && g.b > g.c && g.c > g.d);
        }
    }

    #[test]
    fn test_larger_tiers_are_stricter() {
        for pair in ScaleTier::ALL.windows(2) {
            let (lo, hi) = (pair[0].profile(), pair[1].profile());
            assert!(hi.risk_premium >= lo.risk_premium);
            assert!(hi.min_dscr >= lo.min_dscr);
            assert!(hi.grade_thresholds.a >= lo.grade_thresholds.a);
        }
    }
}

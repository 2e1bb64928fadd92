//! Revenue path: compound growth with an optional early penetration boost
//! and an optional late retention decay.

use crate::input::RevenueBase;
use crate::types::{Money, Rate};

/// Years that receive the penetration boost.
pub const PENETRATION_YEARS: u32 = 3;

/// Revenue assumptions, with every rate already converted to a decimal.
#[derive(Debug, Clone, PartialEq)]
pub struct RevenueDrivers {
    pub base: RevenueBase,
    pub growth: Rate,
    pub penetration: Option<Rate>,
    pub retention: Option<Rate>,
}

impl RevenueDrivers {
    /// Revenue for every year of the horizon, in order.
    pub fn path(&self, horizon: u32) -> Vec<Money> {
        (1..=horizon).map(|year| self.revenue(year)).collect()
    }

    pub fn revenue(&self, year: u32) -> Money {
        grown_base(&self.base, self.growth, year)
            * penetration_multiplier(self.penetration, year)
            * retention_multiplier(self.retention, year)
    }
}

/// Base revenue before the penetration and retention multipliers.
///
/// An explicit forecast is used as given; past its end the last value keeps
/// growing at the growth rate.
fn grown_base(base: &RevenueBase, growth: Rate, year: u32) -> Money {
    match base {
        RevenueBase::Flat(v) => v * (1.0 + growth).powi(year as i32 - 1),
        RevenueBase::PerYear(values) => match values.get(year.saturating_sub(1) as usize) {
            Some(v) => *v,
            None => {
                let last = values.last().copied().unwrap_or(0.0);
                let beyond = year as i32 - values.len() as i32;
                last * (1.0 + growth).powi(beyond)
            }
        },
    }
}

/// Front-loaded boost: full in year 1, two thirds in year 2, one third in year 3.
pub fn penetration_multiplier(penetration: Option<Rate>, year: u32) -> f64 {
    match penetration {
        Some(p) if (1..=PENETRATION_YEARS).contains(&year) => {
            let weight = (PENETRATION_YEARS + 1 - year) as f64 / PENETRATION_YEARS as f64;
            1.0 + p * weight
        }
        _ => 1.0,
    }
}

/// Compounding retention decay for every year after the penetration window.
pub fn retention_multiplier(retention: Option<Rate>, year: u32) -> f64 {
    match retention {
        Some(r) if year > PENETRATION_YEARS => r.powi((year - PENETRATION_YEARS) as i32),
        _ => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn flat(base: Money, growth: Rate) -> RevenueDrivers {
        RevenueDrivers {
            base: RevenueBase::Flat(base),
            growth,
            penetration: None,
            retention: None,
        }
    }

    #[test]
    fn test_compound_growth() {
        let path = flat(100.0, 0.10).path(3);
        assert_abs_diff_eq!(path[0], 100.0);
        assert_abs_diff_eq!(path[1], 110.0, epsilon = 1e-9);
        assert_abs_diff_eq!(path[2], 121.0, epsilon = 1e-9);
    }

    #[test]
    fn test_penetration_front_loaded() {
        assert_abs_diff_eq!(penetration_multiplier(Some(0.30), 1), 1.30, epsilon = 1e-12);
        assert_abs_diff_eq!(penetration_multiplier(Some(0.30), 2), 1.20, epsilon = 1e-12);
        assert_abs_diff_eq!(penetration_multiplier(Some(0.30), 3), 1.10, epsilon = 1e-12);
        assert_eq!(penetration_multiplier(Some(0.30), 4), 1.0);
        assert_eq!(penetration_multiplier(None, 1), 1.0);
    }

    #[test]
    fn test_retention_after_year_three() {
        assert_eq!(retention_multiplier(Some(0.9), 3), 1.0);
        assert_abs_diff_eq!(retention_multiplier(Some(0.9), 4), 0.9, epsilon = 1e-12);
        assert_abs_diff_eq!(retention_multiplier(Some(0.9), 6), 0.729, epsilon = 1e-12);
    }

    #[test]
    fn test_per_year_forecast_extended_by_growth() {
        let drivers = RevenueDrivers {
            base: RevenueBase::PerYear(vec![50.0, 80.0]),
            growth: 0.5,
            penetration: None,
            retention: None,
        };
        let path = drivers.path(4);
        assert_eq!(path[0], 50.0);
        assert_eq!(path[1], 80.0);
        assert_abs_diff_eq!(path[2], 120.0, epsilon = 1e-9);
        assert_abs_diff_eq!(path[3], 180.0, epsilon = 1e-9);
    }
}

pub mod grade;
pub mod tiers;

pub use grade::{analyze_and_grade, grade_investment, GradedInvestment, InvestmentGrade};
pub use tiers::ScaleTier;

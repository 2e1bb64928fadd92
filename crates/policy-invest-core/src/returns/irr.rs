//! Internal Rate of Return via bracketed bisection with an optional
//! Newton-Raphson polish.
//!
//! The solver is a small state machine:
//!
//! ```text
//! Searching -> ExpandingBracket* -> Bisecting -> Refining -> Converged
//!          \______________________________________________-> Failed
//! ```
//!
//! Bisection always produces the answer; Newton-Raphson is only allowed to
//! move it when the refined root stays finite and close to the bisection seed.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::PolicyInvestError;
use crate::time_value::{npv_at_rate, npv_derivative};
use crate::types::{Money, Rate};
use crate::PolicyInvestResult;

/// Tunables for the IRR search. All rates are decimals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrrSolverConfig {
    /// Initial lower bracket (-99.9%)
    pub lower_bound: Rate,
    /// Initial upper bracket (1000%)
    pub upper_bound: Rate,
    pub max_expansions: u32,
    pub max_bisections: u32,
    /// Stop when |NPV| or the half-width of the bracket falls below this
    pub tolerance: f64,
    /// Newton refinement only runs when the bisection root is within +/- this
    pub refine_window: Rate,
    pub max_newton_iterations: u32,
    /// Largest move Newton may make away from the bisection root
    pub max_refine_shift: Rate,
    pub report_floor: Rate,
    pub report_cap: Rate,
}

impl Default for IrrSolverConfig {
    fn default() -> Self {
        Self {
            lower_bound: -0.999,
            upper_bound: 10.0,
            max_expansions: 50,
            max_bisections: 1000,
            tolerance: 1e-6,
            refine_window: 5.0,
            max_newton_iterations: 50,
            max_refine_shift: 1.0,
            report_floor: -0.95,
            report_cap: 5.0,
        }
    }
}

/// Narrow band used when an IRR is shown to a person.
pub const DISPLAY_IRR_FLOOR: Rate = -0.50;
pub const DISPLAY_IRR_CAP: Rate = 0.80;

/// Solver states, exposed so callers can see where a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverState {
    Searching,
    ExpandingBracket,
    Bisecting,
    Refining,
    Converged,
    Failed,
}

/// Outcome of a successful solve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrrSolution {
    /// IRR as a decimal, clamped to the reporting band
    pub rate: Rate,
    pub state: SolverState,
    pub bracket_expansions: u32,
    pub bisection_iterations: u32,
    /// Whether the Newton-Raphson polish replaced the bisection root
    pub refined: bool,
}

enum Step {
    Searching,
    ExpandingBracket { lower: Rate, upper: Rate },
    Bisecting { lower: Rate, upper: Rate },
    Refining { seed: Rate },
    Converged { rate: Rate },
    Failed(PolicyInvestError),
}

impl Step {
    fn state(&self) -> SolverState {
        match self {
            Step::Searching => SolverState::Searching,
            Step::ExpandingBracket { .. } => SolverState::ExpandingBracket,
            Step::Bisecting { .. } => SolverState::Bisecting,
            Step::Refining { .. } => SolverState::Refining,
            Step::Converged { .. } => SolverState::Converged,
            Step::Failed(_) => SolverState::Failed,
        }
    }
}

#[derive(Default)]
struct Trace {
    expansions: u32,
    bisections: u32,
    refined: bool,
}

/// Solve for IRR with the default configuration.
pub fn solve_irr(cash_flows: &[Money]) -> PolicyInvestResult<IrrSolution> {
    solve_irr_with(cash_flows, &IrrSolverConfig::default())
}

/// Solve for the rate at which the NPV of `cash_flows` is zero.
///
/// Fails with `InsufficientData`, `NonFinite` or `NoSignChange` when the
/// series cannot have an IRR, and with `BracketNotFound` when no sign change
/// turns up within the expansion budget.
pub fn solve_irr_with(
    cash_flows: &[Money],
    config: &IrrSolverConfig,
) -> PolicyInvestResult<IrrSolution> {
    let mut trace = Trace::default();
    let mut step = Step::Searching;

    loop {
        debug!(state = ?step.state(), "irr solver step");
        step = match step {
            Step::Searching => search(cash_flows, config),
            Step::ExpandingBracket { lower, upper } => {
                expand(cash_flows, config, lower, upper, &mut trace)
            }
            Step::Bisecting { lower, upper } => {
                bisect(cash_flows, config, lower, upper, &mut trace)
            }
            Step::Refining { seed } => refine(cash_flows, config, seed, &mut trace),
            Step::Converged { rate } => {
                let rate = rate.clamp(config.report_floor, config.report_cap);
                return Ok(IrrSolution {
                    rate,
                    state: SolverState::Converged,
                    bracket_expansions: trace.expansions,
                    bisection_iterations: trace.bisections,
                    refined: trace.refined,
                });
            }
            Step::Failed(e) => {
                debug!(error = %e, "irr solver failed");
                return Err(e);
            }
        };
    }
}

/// IRR as a decimal, or the 0 sentinel when it cannot be determined.
pub fn irr_or_zero(cash_flows: &[Money]) -> Rate {
    solve_irr(cash_flows).map(|s| s.rate).unwrap_or(0.0)
}

/// Re-clamp an IRR into the practical display band.
pub fn practical_irr(rate: Rate) -> Rate {
    rate.clamp(DISPLAY_IRR_FLOOR, DISPLAY_IRR_CAP)
}

fn search(cash_flows: &[Money], config: &IrrSolverConfig) -> Step {
    if cash_flows.len() < 2 {
        return Step::Failed(PolicyInvestError::InsufficientData(
            "IRR requires at least 2 cash flows".into(),
        ));
    }
    if cash_flows.iter().any(|cf| !cf.is_finite()) {
        return Step::Failed(PolicyInvestError::NonFinite {
            context: "IRR cash flows".into(),
        });
    }
    let has_positive = cash_flows.iter().any(|cf| *cf > 0.0);
    let has_negative = cash_flows.iter().any(|cf| *cf < 0.0);
    if !(has_positive && has_negative) {
        return Step::Failed(PolicyInvestError::NoSignChange);
    }

    classify_bracket(cash_flows, config.lower_bound, config.upper_bound)
}

fn classify_bracket(cash_flows: &[Money], lower: Rate, upper: Rate) -> Step {
    let f_lower = npv_at_rate(lower, cash_flows);
    let f_upper = npv_at_rate(upper, cash_flows);

    if !f_lower.is_finite() || !f_upper.is_finite() {
        return Step::Failed(PolicyInvestError::NonFinite {
            context: format!("NPV at IRR bracket [{lower}, {upper}]"),
        });
    }
    if f_lower == 0.0 {
        return Step::Refining { seed: lower };
    }
    if f_upper == 0.0 {
        return Step::Refining { seed: upper };
    }
    if f_lower.signum() != f_upper.signum() {
        Step::Bisecting { lower, upper }
    } else {
        Step::ExpandingBracket { lower, upper }
    }
}

fn expand(
    cash_flows: &[Money],
    config: &IrrSolverConfig,
    lower: Rate,
    upper: Rate,
    trace: &mut Trace,
) -> Step {
    if trace.expansions >= config.max_expansions {
        return Step::Failed(PolicyInvestError::BracketNotFound {
            attempts: trace.expansions,
        });
    }
    trace.expansions += 1;

    // Both ends positive: the root lies above the bracket. Both negative:
    // it lies below, so halve the distance between the lower bound and -100%.
    let f_upper = npv_at_rate(upper, cash_flows);
    let (lower, upper) = if f_upper > 0.0 {
        (lower, upper * 2.0)
    } else {
        (-1.0 + (lower + 1.0) / 2.0, upper)
    };

    classify_bracket(cash_flows, lower, upper)
}

fn bisect(
    cash_flows: &[Money],
    config: &IrrSolverConfig,
    mut lower: Rate,
    mut upper: Rate,
    trace: &mut Trace,
) -> Step {
    let mut f_lower = npv_at_rate(lower, cash_flows);
    let mut mid = (lower + upper) / 2.0;

    for _ in 0..config.max_bisections {
        mid = (lower + upper) / 2.0;
        let f_mid = npv_at_rate(mid, cash_flows);
        trace.bisections += 1;

        if !f_mid.is_finite() {
            return Step::Failed(PolicyInvestError::NonFinite {
                context: format!("NPV at bisection midpoint {mid}"),
            });
        }
        if f_mid.abs() < config.tolerance || (upper - lower) / 2.0 < config.tolerance {
            return Step::Refining { seed: mid };
        }

        // With the usual outlay-then-inflows shape NPV falls as the rate
        // rises, so a positive NPV means the root is above `mid`.
        if f_mid.signum() == f_lower.signum() {
            lower = mid;
            f_lower = f_mid;
        } else {
            upper = mid;
        }
    }

    warn!(
        iterations = config.max_bisections,
        "bisection hit its iteration cap; using last midpoint"
    );
    Step::Refining { seed: mid }
}

fn refine(cash_flows: &[Money], config: &IrrSolverConfig, seed: Rate, trace: &mut Trace) -> Step {
    if seed.abs() > config.refine_window {
        return Step::Converged { rate: seed };
    }

    let seed_npv = npv_at_rate(seed, cash_flows).abs();
    let mut rate = seed;

    for _ in 0..config.max_newton_iterations {
        let f = npv_at_rate(rate, cash_flows);
        let df = npv_derivative(rate, cash_flows);
        if !f.is_finite() || !df.is_finite() || df == 0.0 {
            break;
        }
        let next = rate - f / df;
        if !next.is_finite() || next <= -1.0 {
            break;
        }
        let step = (next - rate).abs();
        rate = next;
        if step < 1e-12 {
            break;
        }
    }

    let refined_npv = npv_at_rate(rate, cash_flows);
    let accepted = refined_npv.is_finite()
        && refined_npv.abs() <= seed_npv
        && (rate - seed).abs() < config.max_refine_shift;

    if accepted {
        trace.refined = rate != seed;
        Step::Converged { rate }
    } else {
        debug!(seed, rejected = rate, "newton refinement rejected; keeping bisection root");
        Step::Converged { rate: seed }
    }
}

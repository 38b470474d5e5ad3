//! Internal rate of return by Newton-Raphson.
//!
//! The outlay sits at t = 0 and cash flow `k` (zero-based) at t = k + 1:
//!
//! NPV(g)  = -I + Σ CFₖ / (1+g)^(k+1)
//! NPV'(g) =    - Σ (k+1)·CFₖ / (1+g)^(k+2)
//!
//! Failure to converge is a value, not an error: callers render it as "N/A".

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Rate};

pub const IRR_TOLERANCE: Decimal = dec!(0.0000001);
pub const MAX_IRR_ITERATIONS: u32 = 1000;
pub const INITIAL_IRR_GUESS: Rate = dec!(0.10);

/// Why Newton-Raphson gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NonConvergence {
    /// No positive cash flow can ever recover the outlay
    NoSignChange,
    /// |NPV'(g)| fell below the tolerance
    FlatDerivative,
    /// Step never fell below the tolerance within the iteration budget
    IterationLimit,
    /// The iterate reached -100% or below, where discounting is undefined
    RateOutOfDomain,
    /// Discount factors left the representable range
    NumericOverflow,
}

/// Result of an IRR solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IrrOutcome {
    Converged { rate: Rate, iterations: u32 },
    DidNotConverge { reason: NonConvergence, iterations: u32 },
}

impl IrrOutcome {
    pub fn rate(&self) -> Option<Rate> {
        match self {
            IrrOutcome::Converged { rate, .. } => Some(*rate),
            IrrOutcome::DidNotConverge { .. } => None,
        }
    }

    pub fn is_converged(&self) -> bool {
        matches!(self, IrrOutcome::Converged { .. })
    }

    pub fn iterations(&self) -> u32 {
        match self {
            IrrOutcome::Converged { iterations, .. }
            | IrrOutcome::DidNotConverge { iterations, .. } => *iterations,
        }
    }
}

/// Solve IRR from the standard 10% starting guess.
pub fn solve_irr(initial_investment: Money, cash_flows: &[Money]) -> IrrOutcome {
    newton_irr(initial_investment, cash_flows, INITIAL_IRR_GUESS)
}

/// Newton-Raphson on NPV(g) starting from `guess`.
///
/// Converges when |Δg| < 1e-7. Stops with `FlatDerivative` when
/// |NPV'(g)| < 1e-7 and with `IterationLimit` after 1000 steps.
///
/// This departs from plain Newton in one place: an iterate at or below -100%
/// stops the solve with `RateOutOfDomain`. Plain Newton would carry on, as
/// integer powers of a non-positive (1+g) are still defined.
pub fn newton_irr(initial_investment: Money, cash_flows: &[Money], guess: Rate) -> IrrOutcome {
    let has_inflow = cash_flows.iter().any(|cf| *cf > Decimal::ZERO);
    let has_outflow =
        initial_investment > Decimal::ZERO || cash_flows.iter().any(|cf| *cf < Decimal::ZERO);
    if !has_inflow || !has_outflow {
        return IrrOutcome::DidNotConverge {
            reason: NonConvergence::NoSignChange,
            iterations: 0,
        };
    }

    let mut rate = guess;

    for iteration in 0..MAX_IRR_ITERATIONS {
        let (npv, derivative) = match npv_and_derivative(initial_investment, cash_flows, rate) {
            Ok(values) => values,
            Err(reason) => {
                log::debug!("IRR stopped at iteration {iteration}: {reason:?} (rate {rate})");
                return IrrOutcome::DidNotConverge {
                    reason,
                    iterations: iteration,
                };
            }
        };

        if derivative.abs() < IRR_TOLERANCE {
            return IrrOutcome::DidNotConverge {
                reason: NonConvergence::FlatDerivative,
                iterations: iteration,
            };
        }

        let next = match npv.checked_div(derivative) {
            Some(step) => rate - step,
            None => {
                return IrrOutcome::DidNotConverge {
                    reason: NonConvergence::NumericOverflow,
                    iterations: iteration,
                }
            }
        };

        if (next - rate).abs() < IRR_TOLERANCE {
            log::debug!("IRR converged to {next} after {} iterations", iteration + 1);
            return IrrOutcome::Converged {
                rate: next,
                iterations: iteration + 1,
            };
        }

        rate = next;
    }

    IrrOutcome::DidNotConverge {
        reason: NonConvergence::IterationLimit,
        iterations: MAX_IRR_ITERATIONS,
    }
}

/// NPV(g) and NPV'(g) in one pass over the cash flows.
fn npv_and_derivative(
    initial_investment: Money,
    cash_flows: &[Money],
    rate: Rate,
) -> Result<(Decimal, Decimal), NonConvergence> {
    let one_plus_g = Decimal::ONE + rate;
    if one_plus_g <= Decimal::ZERO {
        return Err(NonConvergence::RateOutOfDomain);
    }

    let mut npv = -initial_investment;
    let mut derivative = Decimal::ZERO;
    // (1+g)^(k+1) for the flow at index k
    let mut growth = one_plus_g;

    for (k, cf) in cash_flows.iter().enumerate() {
        let exponent = Decimal::from(k as u64 + 1);
        let next_growth = growth
            .checked_mul(one_plus_g)
            .ok_or(NonConvergence::NumericOverflow)?;

        npv = cf
            .checked_div(growth)
            .and_then(|present| npv.checked_add(present))
            .ok_or(NonConvergence::NumericOverflow)?;
        derivative = exponent
            .checked_mul(*cf)
            .and_then(|weighted| weighted.checked_div(next_growth))
            .and_then(|term| derivative.checked_sub(term))
            .ok_or(NonConvergence::NumericOverflow)?;

        growth = next_growth;
    }

    Ok((npv, derivative))
}

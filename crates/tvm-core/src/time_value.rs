use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::TvmError;
use crate::types::{Money, Rate};
use crate::TvmResult;

/// Percent to decimal rate (5 -> 0.05).
pub fn percent_to_rate(percent: Decimal) -> Rate {
    percent / dec!(100)
}

/// Decimal rate to percent (0.05 -> 5).
pub fn rate_to_percent(rate: Rate) -> Decimal {
    rate * dec!(100)
}

/// Compute (1 + r)^n via iterative multiplication (avoids Decimal::powd drift).
///
/// Fails instead of panicking when the factor leaves the Decimal range.
pub fn compound(rate: Rate, n: u32) -> TvmResult<Decimal> {
    let factor = Decimal::ONE + rate;
    let mut result = Decimal::ONE;
    for _ in 0..n {
        result = result
            .checked_mul(factor)
            .ok_or_else(|| TvmError::NumericOverflow {
                context: format!("compounding (1 + {rate})^{n}"),
            })?;
    }
    Ok(result)
}

/// `numerator / denominator` without panicking.
///
/// A zero denominator (including one that underflowed to zero) is
/// `DivisionByZero`; a quotient beyond the Decimal range is `NumericOverflow`.
pub fn checked_div(numerator: Decimal, denominator: Decimal, context: &str) -> TvmResult<Decimal> {
    if denominator.is_zero() {
        return Err(TvmError::DivisionByZero {
            context: context.to_string(),
        });
    }
    numerator
        .checked_div(denominator)
        .ok_or_else(|| TvmError::NumericOverflow {
            context: context.to_string(),
        })
}

/// `a * b`, reporting overflow instead of panicking.
pub fn checked_mul(a: Decimal, b: Decimal, context: &str) -> TvmResult<Decimal> {
    a.checked_mul(b).ok_or_else(|| TvmError::NumericOverflow {
        context: context.to_string(),
    })
}

/// `a + b`, reporting overflow instead of panicking.
pub fn checked_add(a: Decimal, b: Decimal, context: &str) -> TvmResult<Decimal> {
    a.checked_add(b).ok_or_else(|| TvmError::NumericOverflow {
        context: context.to_string(),
    })
}

/// 1 / (1 + r)^n.
pub fn discount_factor(rate: Rate, n: u32) -> TvmResult<Decimal> {
    let growth = compound(rate, n)?;
    checked_div(Decimal::ONE, growth, &format!("discount factor at period {n}"))
}

/// Real rate from a nominal rate via the Fisher relation: (1 + n) / (1 + i) - 1.
pub fn fisher_real_rate(nominal: Rate, inflation: Rate) -> TvmResult<Rate> {
    let denominator = Decimal::ONE + inflation;
    if denominator <= Decimal::ZERO {
        return Err(TvmError::InvalidInput {
            field: "inflation_rate".into(),
            reason: "Inflation must be greater than -100%".into(),
        });
    }
    Ok((Decimal::ONE + nominal) / denominator - Decimal::ONE)
}

/// Flat tax on the gain component of a terminal value.
///
/// `terminal - (terminal - basis) * tax`; a loss attracts no tax.
pub fn after_tax_value(terminal: Money, basis: Money, tax_rate: Rate) -> Money {
    let gain = (terminal - basis).max(Decimal::ZERO);
    terminal - gain * tax_rate
}

/// Deflate a nominal amount received after `years` years to today's money.
pub fn inflation_adjusted(amount: Money, inflation: Rate, years: u32) -> TvmResult<Money> {
    let deflator = compound(inflation, years)?;
    checked_div(amount, deflator, "inflation deflator")
}

/// Net Present Value of a series of cash flows, the first at t = 0.
pub fn npv(rate: Rate, cash_flows: &[Money]) -> TvmResult<Money> {
    if rate <= dec!(-1) {
        return Err(TvmError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    let mut result = Decimal::ZERO;
    let one_plus_r = Decimal::ONE + rate;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = discount
                .checked_mul(one_plus_r)
                .ok_or_else(|| TvmError::NumericOverflow {
                    context: format!("NPV discount factor at period {t}"),
                })?;
        }
        let present = checked_div(*cf, discount, &format!("NPV at period {t}"))?;
        result = checked_add(result, present, "NPV sum")?;
    }

    Ok(result)
}

/// n-th root of a positive value, used for geometric-average rates.
pub fn nth_root(value: Decimal, n: u32) -> TvmResult<Decimal> {
    if n == 0 {
        return Err(TvmError::InvalidInput {
            field: "n".into(),
            reason: "Root degree must be > 0".into(),
        });
    }
    if value < Decimal::ZERO {
        return Err(TvmError::FinancialImpossibility(
            "Cannot take a real root of a negative value".into(),
        ));
    }
    if value.is_zero() {
        return Ok(Decimal::ZERO);
    }
    let exponent = Decimal::ONE / Decimal::from(n);
    value
        .checked_powd(exponent)
        .ok_or_else(|| TvmError::NumericOverflow {
            context: format!("{value}^(1/{n})"),
        })
}

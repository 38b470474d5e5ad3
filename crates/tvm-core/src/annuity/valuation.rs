//! Present and future value of level-payment annuities.
//!
//! Ordinary annuities pay at the end of each period, annuities due at the
//! start. With an inflation input the whole calculation runs on the real
//! per-period rate, so inflation changes accumulation and not just the
//! displayed figure.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::{TvmError, ValidationErrors};
use crate::time_value::{self, checked_add, checked_div, checked_mul, percent_to_rate};
use crate::types::{
    with_metadata, CompoundingFrequency, ComputationOutput, Money, PeriodRate, Rate,
    YearlyProjectionPoint,
};
use crate::TvmResult;

/// Longest annuity accepted; the balance schedule walks every period.
pub const MAX_ANNUITY_PERIODS: u32 = 100_000;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Payment timing within each period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnuityKind {
    /// Payment at the end of each period
    #[default]
    Ordinary,
    /// Payment at the start of each period
    Due,
}

/// Input parameters for annuity valuation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnuityInput {
    /// Level payment per period
    pub payment: Money,
    /// Total number of payment periods
    pub periods: u32,
    /// Nominal annual rate in percent
    pub annual_rate_percent: Decimal,
    /// Payments (and compounding) per year
    #[serde(default)]
    pub frequency: CompoundingFrequency,
    #[serde(default)]
    pub kind: AnnuityKind,
    /// Annual inflation in percent; switches the valuation to the real rate
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub inflation_percent: Option<Decimal>,
    /// Flat tax on the gain in the future value, in percent
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tax_percent: Option<Decimal>,
}

/// Output of annuity valuation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnuityOutput {
    pub present_value: Money,
    pub future_value: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after_tax_future_value: Option<Money>,
    pub total_payments: Money,
    /// future_value - total_payments
    pub total_interest: Money,
    /// Per-period decimal rate actually used (real when inflation was given)
    pub period_rate: Rate,
    pub real_rate_applied: bool,
    /// True when payment or periods were not positive; all values are zero
    pub insufficient_input: bool,
    /// Running balance sampled once per year, plus the final period
    pub schedule: Vec<YearlyProjectionPoint>,
}

impl AnnuityOutput {
    fn insufficient(period_rate: Rate, real_rate_applied: bool) -> Self {
        AnnuityOutput {
            present_value: Decimal::ZERO,
            future_value: Decimal::ZERO,
            after_tax_future_value: None,
            total_payments: Decimal::ZERO,
            total_interest: Decimal::ZERO,
            period_rate,
            real_rate_applied,
            insufficient_input: true,
            schedule: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Value a level-payment annuity: PV, FV, optional after-tax FV and a
/// year-by-year balance schedule.
pub fn value_annuity(input: &AnnuityInput) -> TvmResult<ComputationOutput<AnnuityOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(input)?;

    let nominal = PeriodRate::new(input.annual_rate_percent, input.frequency);
    let (period_rate, real_rate_applied) = match input.inflation_percent {
        Some(inflation) => {
            let inflation_per_period = PeriodRate::new(inflation, input.frequency).per_period();
            (
                time_value::fisher_real_rate(nominal.per_period(), inflation_per_period)?,
                true,
            )
        }
        None => (nominal.per_period(), false),
    };

    let output = if input.payment <= Decimal::ZERO || input.periods == 0 {
        warnings.push("Payment and periods must both be positive; nothing to value".into());
        AnnuityOutput::insufficient(period_rate, real_rate_applied)
    } else {
        if real_rate_applied && period_rate < Decimal::ZERO {
            warnings.push("Inflation exceeds the nominal rate; real rate is negative".into());
        }
        build_output(input, period_rate, real_rate_applied)?
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Annuity Valuation (closed-form PV/FV with balance schedule)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// Present value of `n` level payments at per-period rate `r`.
pub fn present_value(payment: Money, rate: Rate, n: u32, kind: AnnuityKind) -> TvmResult<Money> {
    if rate.is_zero() {
        return checked_mul(payment, Decimal::from(n), "annuity present value");
    }
    let growth = time_value::compound(rate, n)?;
    let discount = checked_div(Decimal::ONE, growth, "annuity discount factor")?;
    let factor = checked_div(Decimal::ONE - discount, rate, "annuity present value factor")?;
    let ordinary = checked_mul(payment, factor, "annuity present value")?;
    apply_timing(ordinary, rate, kind)
}

/// Future value of `n` level payments at per-period rate `r`.
pub fn future_value(payment: Money, rate: Rate, n: u32, kind: AnnuityKind) -> TvmResult<Money> {
    if rate.is_zero() {
        return checked_mul(payment, Decimal::from(n), "annuity future value");
    }
    let growth = time_value::compound(rate, n)?;
    let factor = checked_div(growth - Decimal::ONE, rate, "annuity future value factor")?;
    let ordinary = checked_mul(payment, factor, "annuity future value")?;
    apply_timing(ordinary, rate, kind)
}

fn apply_timing(ordinary: Money, rate: Rate, kind: AnnuityKind) -> TvmResult<Money> {
    match kind {
        AnnuityKind::Ordinary => Ok(ordinary),
        AnnuityKind::Due => checked_mul(ordinary, Decimal::ONE + rate, "annuity due timing"),
    }
}

// ---------------------------------------------------------------------------
// Internals
// ---------------------------------------------------------------------------

fn build_output(
    input: &AnnuityInput,
    rate: Rate,
    real_rate_applied: bool,
) -> TvmResult<AnnuityOutput> {
    let present_value = present_value(input.payment, rate, input.periods, input.kind)?;
    let future_value = future_value(input.payment, rate, input.periods, input.kind)?;
    let total_payments = checked_mul(input.payment, Decimal::from(input.periods), "total payments")?;
    let schedule = build_schedule(input, rate)?;

    // Growth below total payments (negative real rate) yields a tax credit
    let after_tax_future_value = input.tax_percent.map(|tax| {
        future_value - (future_value - total_payments) * percent_to_rate(tax)
    });

    log::debug!(
        "annuity {:?}: {} periods at {} per period, {} schedule points",
        input.kind,
        input.periods,
        rate,
        schedule.len()
    );

    Ok(AnnuityOutput {
        present_value,
        future_value,
        after_tax_future_value,
        total_payments,
        total_interest: future_value - total_payments,
        period_rate: rate,
        real_rate_applied,
        insufficient_input: false,
        schedule,
    })
}

/// Walk the balance period by period and keep one point per year.
fn build_schedule(input: &AnnuityInput, rate: Rate) -> TvmResult<Vec<YearlyProjectionPoint>> {
    let per_year = input.frequency.periods_per_year();
    let growth = Decimal::ONE + rate;
    let mut points = Vec::with_capacity((input.periods / per_year + 1) as usize);
    let mut balance = Decimal::ZERO;
    let mut interest_since_sample = Decimal::ZERO;
    let mut cumulative_interest = Decimal::ZERO;

    for period in 1..=input.periods {
        let before = balance;
        let context = format!("annuity balance at period {period}");
        balance = match input.kind {
            AnnuityKind::Ordinary => {
                checked_add(checked_mul(before, growth, &context)?, input.payment, &context)?
            }
            AnnuityKind::Due => {
                checked_mul(checked_add(before, input.payment, &context)?, growth, &context)?
            }
        };

        let interest = balance - before - input.payment;
        interest_since_sample += interest;
        cumulative_interest += interest;

        if period % per_year == 0 || period == input.periods {
            points.push(YearlyProjectionPoint {
                year: period.div_ceil(per_year),
                period,
                ending_balance: balance,
                cumulative_contribution: input.payment * Decimal::from(period),
                interest_earned: interest_since_sample,
                cumulative_interest,
            });
            interest_since_sample = Decimal::ZERO;
        }
    }

    Ok(points)
}

fn validate_input(input: &AnnuityInput) -> TvmResult<()> {
    let mut errors = ValidationErrors::new();

    errors.check(
        input.periods > MAX_ANNUITY_PERIODS,
        "periods",
        &format!("Periods must not exceed {MAX_ANNUITY_PERIODS}"),
    );
    errors.check(
        input.annual_rate_percent <= dec!(-100),
        "annual_rate_percent",
        "Rate must be greater than -100%",
    );
    if let Some(inflation) = input.inflation_percent {
        errors.check(
            inflation <= dec!(-100),
            "inflation_percent",
            "Inflation must be greater than -100%",
        );
    }
    if let Some(tax) = input.tax_percent {
        errors.check(
            tax < Decimal::ZERO || tax > dec!(100),
            "tax_percent",
            "Tax rate must be between 0% and 100%",
        );
    }

    errors.into_result()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

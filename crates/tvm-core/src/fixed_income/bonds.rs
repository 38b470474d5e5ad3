//! Fixed-coupon bond analytics.
//!
//! Builds the coupon schedule from face, coupon and tenor, discounts it at the
//! caller's rate, and derives price, yields and risk metrics. Settlement is
//! assumed to fall on a coupon date, so there is no accrued interest.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::{TvmError, ValidationErrors};
use crate::fixed_income::duration::{self, BondRiskMetrics};
use crate::time_value::{self, percent_to_rate, rate_to_percent};
use crate::types::{
    with_metadata, CompoundingFrequency, ComputationOutput, Money, PeriodRate, Rate, Years,
};
use crate::TvmResult;

/// Most coupon periods a bond may have; the schedule holds one row per period.
pub const MAX_COUPON_PERIODS: u32 = 100_000;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Call feature of a callable bond.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallSpec {
    /// Price the issuer pays on call
    pub call_price: Money,
    /// Years from today until the first call date
    pub years_to_call: Years,
}

/// Input parameters for bond analytics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BondInput {
    /// Par / face value (typically 1000)
    pub face_value: Money,
    /// Annual coupon rate in percent (5 = 5%)
    pub coupon_rate_percent: Decimal,
    /// Coupons per year
    #[serde(default = "default_coupon_frequency")]
    pub frequency: CompoundingFrequency,
    pub years_to_maturity: Years,
    /// Annual discount rate (required yield) in percent
    pub discount_rate_percent: Decimal,
    /// Observed market price
    pub market_price: Money,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub call: Option<CallSpec>,
}

fn default_coupon_frequency() -> CompoundingFrequency {
    CompoundingFrequency::SemiAnnually
}

/// What a scheduled payment consists of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CashflowKind {
    Coupon,
    CouponAndPrincipal,
}

/// A single bond cashflow entry (coupon, principal, or both).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BondCashflow {
    pub period: u32,
    pub time_years: Years,
    pub payment: Money,
    pub present_value: Money,
    pub kind: CashflowKind,
}

/// Where the market price sits relative to face value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceClassification {
    Premium,
    Par,
    Discount,
}

/// Output of bond analytics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BondOutput {
    /// Present value of all cash flows at the discount rate
    pub price: Money,
    /// Annual coupon / market price, in percent
    pub current_yield_percent: Decimal,
    pub macaulay_duration: Decimal,
    pub modified_duration: Decimal,
    pub convexity: Decimal,
    pub dv01: Money,
    pub price_change_up_100bp_percent: Decimal,
    pub price_change_down_100bp_percent: Decimal,
    /// Closed-form yield-to-maturity estimate from the market price, in percent
    pub approximate_ytm_percent: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yield_to_call_percent: Option<Decimal>,
    /// Always true when a yield to call is reported: it is not an IRR solve
    pub yield_to_call_is_approximate: bool,
    pub price_classification: PriceClassification,
    /// price - market_price; positive means the market price is below model value
    pub value_gap: Money,
    pub coupon_payment: Money,
    pub annual_coupon: Money,
    pub total_coupon_income: Money,
    pub num_periods: u32,
    pub cash_flows: Vec<BondCashflow>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Price a fixed-coupon bond and derive yields, duration and convexity.
pub fn analyze_bond(input: &BondInput) -> TvmResult<ComputationOutput<BondOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let num_periods = validate_input(input)?;

    let freq = Decimal::from(input.frequency.periods_per_year());
    let coupon_rate = percent_to_rate(input.coupon_rate_percent);
    let coupon_payment = input.face_value * coupon_rate / freq;
    let annual_coupon = input.face_value * coupon_rate;
    let period_rate = PeriodRate::new(input.discount_rate_percent, input.frequency).per_period();

    let cash_flows = build_cashflow_schedule(
        input.face_value,
        coupon_payment,
        period_rate,
        num_periods,
        freq,
    )?;

    let price: Money = cash_flows
        .iter()
        .try_fold(Decimal::ZERO, |total, cf| {
            time_value::checked_add(total, cf.present_value, "bond price")
        })?;
    let BondRiskMetrics {
        macaulay_duration,
        modified_duration,
        convexity,
        dv01,
        price_change_up_100bp_percent,
        price_change_down_100bp_percent,
    } = duration::risk_metrics(&cash_flows, period_rate, price)?;

    let current_yield_percent = rate_to_percent(annual_coupon / input.market_price);

    let approximate_ytm_percent = rate_to_percent(approximate_ytm(
        annual_coupon,
        input.face_value,
        input.market_price,
        input.years_to_maturity,
    ));

    let yield_to_call_percent = input.call.as_ref().map(|call| {
        rate_to_percent(approximate_ytc(
            call.call_price,
            input.market_price,
            coupon_rate,
            call.years_to_call,
        ))
    });
    if yield_to_call_percent.is_some() {
        warnings.push("Yield to call is a closed-form approximation, not an IRR solve".into());
    }

    let price_classification = if input.market_price > input.face_value {
        PriceClassification::Premium
    } else if input.market_price < input.face_value {
        PriceClassification::Discount
    } else {
        PriceClassification::Par
    };

    log::debug!(
        "bond: {} periods at {} per period, price {}, duration {}",
        num_periods,
        period_rate,
        price,
        macaulay_duration
    );

    let output = BondOutput {
        price,
        current_yield_percent,
        macaulay_duration,
        modified_duration,
        convexity,
        dv01,
        price_change_up_100bp_percent,
        price_change_down_100bp_percent,
        approximate_ytm_percent,
        yield_to_call_percent,
        yield_to_call_is_approximate: yield_to_call_percent.is_some(),
        price_classification,
        value_gap: price - input.market_price,
        coupon_payment,
        annual_coupon,
        total_coupon_income: annual_coupon * input.years_to_maturity,
        num_periods,
        cash_flows,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Bond Analytics (discounted cash flows, Macaulay duration and convexity)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// Yield-to-call approximation:
/// ((call_price - market_price) / market_price + coupon_rate) / years_to_call.
///
/// Deliberately not solved as an IRR on the truncated call schedule.
pub fn approximate_ytc(
    call_price: Money,
    market_price: Money,
    coupon_rate: Rate,
    years_to_call: Years,
) -> Rate {
    ((call_price - market_price) / market_price + coupon_rate) / years_to_call
}

/// Textbook YTM approximation: (C + (F - P) / N) / ((F + P) / 2).
pub fn approximate_ytm(
    annual_coupon: Money,
    face_value: Money,
    market_price: Money,
    years: Years,
) -> Rate {
    (annual_coupon + (face_value - market_price) / years) / ((face_value + market_price) / dec!(2))
}

// ---------------------------------------------------------------------------
// Cashflow schedule
// ---------------------------------------------------------------------------

/// One entry per coupon period; redemption rides on the final coupon.
fn build_cashflow_schedule(
    face_value: Money,
    coupon_payment: Money,
    period_rate: Rate,
    num_periods: u32,
    freq: Decimal,
) -> TvmResult<Vec<BondCashflow>> {
    let one_plus_i = Decimal::ONE + period_rate;
    let mut growth = Decimal::ONE;
    let mut cashflows = Vec::with_capacity(num_periods as usize);

    for t in 1..=num_periods {
        growth = growth
            .checked_mul(one_plus_i)
            .ok_or_else(|| TvmError::NumericOverflow {
                context: format!("bond discount factor at period {t}"),
            })?;
        let (payment, kind) = if t == num_periods {
            (coupon_payment + face_value, CashflowKind::CouponAndPrincipal)
        } else {
            (coupon_payment, CashflowKind::Coupon)
        };
        cashflows.push(BondCashflow {
            period: t,
            time_years: Decimal::from(t) / freq,
            payment,
            present_value: time_value::checked_div(
                payment,
                growth,
                &format!("bond present value at period {t}"),
            )?,
            kind,
        });
    }

    Ok(cashflows)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Check inputs and return the number of coupon periods.
fn validate_input(input: &BondInput) -> TvmResult<u32> {
    let mut errors = ValidationErrors::new();

    errors.check(
        input.face_value <= Decimal::ZERO,
        "face_value",
        "Face value must be positive",
    );
    errors.check(
        input.coupon_rate_percent < Decimal::ZERO,
        "coupon_rate_percent",
        "Coupon rate cannot be negative",
    );
    errors.check(
        input.discount_rate_percent <= dec!(-100),
        "discount_rate_percent",
        "Discount rate must be greater than -100%",
    );
    errors.check(
        input.market_price <= Decimal::ZERO,
        "market_price",
        "Market price must be positive",
    );

    let periods = input
        .years_to_maturity
        .checked_mul(Decimal::from(input.frequency.periods_per_year()));
    let num_periods = match periods {
        _ if input.years_to_maturity <= Decimal::ZERO => {
            errors.add("years_to_maturity", "Years to maturity must be positive");
            0
        }
        Some(p) if !p.fract().is_zero() => {
            errors.add(
                "years_to_maturity",
                format!(
                    "Years to maturity must cover a whole number of {} coupon periods",
                    input.frequency
                ),
            );
            0
        }
        _ => match periods
            .and_then(|p| p.to_u32())
            .filter(|n| *n <= MAX_COUPON_PERIODS)
        {
            Some(n) => n,
            None => {
                errors.add(
                    "years_to_maturity",
                    format!("Bond must have at most {MAX_COUPON_PERIODS} coupon periods"),
                );
                0
            }
        },
    };

    if let Some(call) = &input.call {
        errors.check(
            call.call_price <= Decimal::ZERO,
            "call.call_price",
            "Call price must be positive",
        );
        errors.check(
            call.years_to_call <= Decimal::ZERO || call.years_to_call > input.years_to_maturity,
            "call.years_to_call",
            "Call date must fall after today and no later than maturity",
        );
    }

    errors.into_result()?;
    Ok(num_periods)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

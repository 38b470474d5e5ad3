use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::cash_flow::irr::{self, IrrOutcome};
use crate::error::{TvmError, ValidationErrors};
use crate::time_value::{self, checked_add, checked_div, checked_mul, percent_to_rate, rate_to_percent};
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::TvmResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Input for the cash-flow return solver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashFlowReturnInput {
    /// Outlay at t = 0, as a positive amount
    pub initial_investment: Money,
    /// Signed cash flow for periods 1..=n
    pub cash_flows: Vec<Money>,
    /// Rate for NPV and for financing negative flows in MIRR, in percent
    pub discount_rate_percent: Decimal,
    /// Rate positive flows are reinvested at in MIRR; defaults to the discount rate
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub reinvestment_rate_percent: Option<Decimal>,
    /// Terminal (sale or salvage) value received with the last cash flow
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub final_value: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub inflation_percent: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tax_percent: Option<Decimal>,
}

/// Output of the cash-flow return solver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashFlowReturnOutput {
    pub irr: IrrOutcome,
    /// IRR in percent; `None` when the solve did not converge
    pub irr_percent: Option<Decimal>,
    pub mirr_percent: Decimal,
    pub npv: Money,
    /// Fractional periods until the outlay is recovered; saturates at n
    pub payback_period: Decimal,
    pub recovered: bool,
    pub discounted_payback_period: Decimal,
    pub discounted_recovered: bool,
    pub total_profit: Money,
    /// (NPV + I) / I
    pub profitability_index: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inflation_adjusted_irr_percent: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after_tax_irr_percent: Option<Decimal>,
    /// Period 0 (the outlay) through period n
    pub series: Vec<CashFlowPoint>,
}

/// One period of the cumulative cash-flow series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowPoint {
    pub period: u32,
    pub cash_flow: Money,
    pub discounted_cash_flow: Money,
    pub cumulative: Money,
    pub cumulative_discounted: Money,
}

/// Payback walk result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payback {
    pub periods: Decimal,
    pub recovered: bool,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Solve IRR and derive MIRR, NPV, payback and profit for an investment.
pub fn solve_returns(input: &CashFlowReturnInput) -> TvmResult<ComputationOutput<CashFlowReturnOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(input)?;

    let flows = effective_cash_flows(input)?;
    let discount_rate = percent_to_rate(input.discount_rate_percent);
    let reinvestment_rate = input
        .reinvestment_rate_percent
        .map(percent_to_rate)
        .unwrap_or(discount_rate);

    let irr = irr::solve_irr(input.initial_investment, &flows);
    let irr_rate = irr.rate();
    if let IrrOutcome::DidNotConverge { reason, iterations } = irr {
        log::warn!("IRR did not converge after {iterations} iterations: {reason:?}");
        warnings.push(format!("IRR is undefined for these cash flows ({reason:?})"));
    }

    let npv = npv_at(input.initial_investment, &flows, discount_rate)?;
    let mirr = mirr(
        input.initial_investment,
        &flows,
        discount_rate,
        reinvestment_rate,
    )?;
    let payback = payback_period(input.initial_investment, &flows)?;
    let discounted = discounted_flows(&flows, discount_rate)?;
    let discounted_payback = payback_period(input.initial_investment, &discounted)?;

    if !payback.recovered {
        warnings.push("Investment is not recovered within the cash-flow horizon".into());
    }

    let inflation_adjusted_irr_percent = match (irr_rate, input.inflation_percent) {
        (Some(rate), Some(inflation)) => Some(rate_to_percent(time_value::fisher_real_rate(
            rate,
            percent_to_rate(inflation),
        )?)),
        _ => None,
    };
    let after_tax_irr_percent = match (irr_rate, input.tax_percent) {
        (Some(rate), Some(tax)) => {
            Some(rate_to_percent(rate * (Decimal::ONE - percent_to_rate(tax))))
        }
        _ => None,
    };

    let total_profit = flows
        .iter()
        .try_fold(-input.initial_investment, |sum, cf| checked_add(sum, *cf, "total profit"))?;
    let profitability_index = checked_div(
        checked_add(npv, input.initial_investment, "profitability index")?,
        input.initial_investment,
        "profitability index",
    )?;
    let series = build_series(input.initial_investment, &flows, &discounted)?;

    let output = CashFlowReturnOutput {
        irr,
        irr_percent: irr_rate.map(rate_to_percent),
        mirr_percent: rate_to_percent(mirr),
        npv,
        payback_period: payback.periods,
        recovered: payback.recovered,
        discounted_payback_period: discounted_payback.periods,
        discounted_recovered: discounted_payback.recovered,
        total_profit,
        profitability_index,
        inflation_adjusted_irr_percent,
        after_tax_irr_percent,
        series,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Cash-Flow Returns (Newton-Raphson IRR, MIRR, NPV, payback)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// NPV with the outlay at t = 0 and flow `k` at t = k + 1.
pub fn npv_at(initial_investment: Money, cash_flows: &[Money], rate: Rate) -> TvmResult<Money> {
    let mut series = Vec::with_capacity(cash_flows.len() + 1);
    series.push(-initial_investment);
    series.extend_from_slice(cash_flows);
    time_value::npv(rate, &series)
}

/// Modified IRR.
///
/// Positive flows compound to period n at the reinvestment rate, negative
/// flows (and the outlay) discount to today at the discount rate, then
/// MIRR = |FV⁺ / PV⁻|^(1/n) - 1 with n the number of cash flows.
pub fn mirr(
    initial_investment: Money,
    cash_flows: &[Money],
    discount_rate: Rate,
    reinvestment_rate: Rate,
) -> TvmResult<Rate> {
    let n = cash_flows.len() as u32;
    let mut fv_positive = Decimal::ZERO;
    let mut pv_negative = initial_investment;

    for (k, cf) in cash_flows.iter().enumerate() {
        let k = k as u32;
        if *cf > Decimal::ZERO {
            let grown = checked_mul(
                *cf,
                time_value::compound(reinvestment_rate, n - k - 1)?,
                "MIRR reinvested flow",
            )?;
            fv_positive = checked_add(fv_positive, grown, "MIRR terminal value")?;
        } else if *cf < Decimal::ZERO {
            let discounted = checked_mul(
                cf.abs(),
                time_value::discount_factor(discount_rate, k + 1)?,
                "MIRR financed flow",
            )?;
            pv_negative = checked_add(pv_negative, discounted, "MIRR financing cost")?;
        }
    }

    if pv_negative.is_zero() {
        return Ok(Decimal::ZERO);
    }

    let ratio = checked_div(fv_positive, pv_negative, "MIRR ratio")?.abs();
    Ok(time_value::nth_root(ratio, n)? - Decimal::ONE)
}

/// Periods until cumulative flows recover the outlay, interpolated within
/// the period where the remaining balance crosses zero. Never recovered
/// saturates at the series length.
pub fn payback_period(initial_investment: Money, cash_flows: &[Money]) -> TvmResult<Payback> {
    let mut remaining = initial_investment;

    for (k, cf) in cash_flows.iter().enumerate() {
        if *cf > Decimal::ZERO && remaining <= *cf {
            let fraction = remaining.max(Decimal::ZERO) / *cf;
            return Ok(Payback {
                periods: Decimal::from(k as u64) + fraction,
                recovered: true,
            });
        }
        remaining = checked_add(remaining, -*cf, "payback balance")?;
    }

    Ok(Payback {
        periods: Decimal::from(cash_flows.len() as u64),
        recovered: false,
    })
}

// ---------------------------------------------------------------------------
// Internals
// ---------------------------------------------------------------------------

/// Cash flows with the optional final value folded into the last period.
fn effective_cash_flows(input: &CashFlowReturnInput) -> TvmResult<Vec<Money>> {
    let mut flows = input.cash_flows.clone();
    if let (Some(terminal), Some(last)) = (input.final_value, flows.last_mut()) {
        *last = checked_add(*last, terminal, "final value")?;
    }
    Ok(flows)
}

fn discounted_flows(cash_flows: &[Money], rate: Rate) -> TvmResult<Vec<Money>> {
    cash_flows
        .iter()
        .enumerate()
        .map(|(k, cf)| {
            let factor = time_value::discount_factor(rate, k as u32 + 1)?;
            checked_mul(*cf, factor, "discounted cash flow")
        })
        .collect()
}

fn build_series(
    initial_investment: Money,
    cash_flows: &[Money],
    discounted: &[Money],
) -> TvmResult<Vec<CashFlowPoint>> {
    let mut cumulative = -initial_investment;
    let mut cumulative_discounted = -initial_investment;
    let mut series = Vec::with_capacity(cash_flows.len() + 1);
    series.push(CashFlowPoint {
        period: 0,
        cash_flow: -initial_investment,
        discounted_cash_flow: -initial_investment,
        cumulative,
        cumulative_discounted,
    });

    for (k, (cf, dcf)) in cash_flows.iter().zip(discounted).enumerate() {
        cumulative = checked_add(cumulative, *cf, "cumulative cash flow")?;
        cumulative_discounted =
            checked_add(cumulative_discounted, *dcf, "cumulative discounted cash flow")?;
        series.push(CashFlowPoint {
            period: k as u32 + 1,
            cash_flow: *cf,
            discounted_cash_flow: *dcf,
            cumulative,
            cumulative_discounted,
        });
    }

    Ok(series)
}

fn validate_input(input: &CashFlowReturnInput) -> TvmResult<()> {
    if input.cash_flows.is_empty() {
        return Err(TvmError::InsufficientData(
            "At least one cash flow is required".into(),
        ));
    }

    let mut errors = ValidationErrors::new();

    errors.check(
        input.initial_investment <= Decimal::ZERO,
        "initial_investment",
        "Initial investment must be positive",
    );
    errors.check(
        input.discount_rate_percent <= dec!(-100),
        "discount_rate_percent",
        "Discount rate must be greater than -100%",
    );
    if let Some(reinvestment) = input.reinvestment_rate_percent {
        errors.check(
            reinvestment <= dec!(-100),
            "reinvestment_rate_percent",
            "Reinvestment rate must be greater than -100%",
        );
    }
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

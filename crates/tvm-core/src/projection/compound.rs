//! Compound-interest balance projection with periodic contributions.
//!
//! Each year the balance compounds `n` times at `r/n`, then the year's
//! contributions are added. Contributions therefore earn nothing in the year
//! they are made. Inflation and tax adjustments only touch the terminal value.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::ValidationErrors;
use crate::time_value::{self, checked_add, checked_mul, percent_to_rate, rate_to_percent};
use crate::types::{
    with_metadata, CompoundingFrequency, ComputationOutput, Money, PeriodRate,
    YearlyProjectionPoint,
};
use crate::TvmResult;

/// Longest projection accepted, in years.
pub const MAX_PROJECTION_YEARS: u32 = 1000;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Input parameters for a compound-interest projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionInput {
    /// Starting balance
    pub principal: Money,
    /// Amount contributed each contribution period
    pub periodic_contribution: Money,
    /// Nominal annual rate in percent (7 = 7%)
    pub annual_rate_percent: Decimal,
    /// How often interest compounds
    #[serde(default)]
    pub compounding: CompoundingFrequency,
    /// Number of years to project
    pub years: u32,
    /// Contributions made per year (12 = monthly deposits)
    #[serde(default = "default_contributions_per_year")]
    pub contributions_per_year: u32,
    /// Annual escalation of the contribution in percent
    #[serde(default)]
    pub contribution_growth_percent: Decimal,
    /// Inflation used to express the final balance in today's money
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub inflation_percent: Option<Decimal>,
    /// Flat tax applied to the gain in the final balance
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tax_percent: Option<Decimal>,
}

fn default_contributions_per_year() -> u32 {
    12
}

/// Output of a compound-interest projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionOutput {
    /// One point per projected year
    pub yearly: Vec<YearlyProjectionPoint>,
    pub final_balance: Money,
    pub total_contributions: Money,
    pub total_interest: Money,
    /// (1 + r/n)^n - 1, in percent
    pub effective_annual_rate_percent: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inflation_adjusted_final_balance: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after_tax_final_balance: Option<Money>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Project a balance year by year under compound interest and contributions.
pub fn project(input: &ProjectionInput) -> TvmResult<ComputationOutput<ProjectionOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(input)?;

    let rate = PeriodRate::new(input.annual_rate_percent, input.compounding);
    let n = rate.periods_per_year();
    let annual_growth = time_value::compound(rate.per_period(), n)?;
    let contribution_growth = percent_to_rate(input.contribution_growth_percent);

    if input.annual_rate_percent < Decimal::ZERO {
        warnings.push("Negative rate: balance shrinks before contributions are added".into());
    }

    let mut yearly = Vec::with_capacity(input.years as usize);
    let mut balance = input.principal;
    let mut year_contribution = checked_mul(
        input.periodic_contribution,
        Decimal::from(input.contributions_per_year),
        "annual contribution",
    )?;
    let contribution_escalator = Decimal::ONE + contribution_growth;
    let mut total_contributions = Decimal::ZERO;
    let mut total_interest = Decimal::ZERO;

    for year in 1..=input.years {
        let grown = balance
            .checked_mul(annual_growth)
            .ok_or_else(|| overflow_at(year))?;
        let interest = grown - balance;
        balance = grown
            .checked_add(year_contribution)
            .ok_or_else(|| overflow_at(year))?;

        total_contributions = total_contributions
            .checked_add(year_contribution)
            .ok_or_else(|| overflow_at(year))?;
        total_interest = total_interest
            .checked_add(interest)
            .ok_or_else(|| overflow_at(year))?;

        yearly.push(YearlyProjectionPoint {
            year,
            period: year * n,
            ending_balance: balance,
            cumulative_contribution: total_contributions,
            interest_earned: interest,
            cumulative_interest: total_interest,
        });

        year_contribution = year_contribution
            .checked_mul(contribution_escalator)
            .ok_or_else(|| overflow_at(year))?;
    }

    let final_balance = balance;

    let inflation_adjusted_final_balance = match input.inflation_percent {
        Some(inflation) => Some(time_value::inflation_adjusted(
            final_balance,
            percent_to_rate(inflation),
            input.years,
        )?),
        None => None,
    };

    let after_tax_final_balance = match input.tax_percent {
        Some(tax) => {
            let basis = checked_add(input.principal, total_contributions, "cost basis")?;
            Some(time_value::after_tax_value(final_balance, basis, percent_to_rate(tax)))
        }
        None => None,
    };

    log::debug!(
        "projected {} years at {}% ({}): final balance {}",
        input.years,
        input.annual_rate_percent,
        input.compounding,
        final_balance
    );

    let output = ProjectionOutput {
        yearly,
        final_balance,
        total_contributions,
        total_interest,
        effective_annual_rate_percent: rate_to_percent(annual_growth - Decimal::ONE),
        inflation_adjusted_final_balance,
        after_tax_final_balance,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Compound Interest Projection ((1 + r/n)^n growth, year-end contributions)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_input(input: &ProjectionInput) -> TvmResult<()> {
    let mut errors = ValidationErrors::new();

    errors.check(input.years == 0, "years", "Years must be greater than zero");
    errors.check(
        input.years > MAX_PROJECTION_YEARS,
        "years",
        &format!("Years must not exceed {MAX_PROJECTION_YEARS}"),
    );
    errors.check(
        input.annual_rate_percent <= dec!(-100),
        "annual_rate_percent",
        "Rate must be greater than -100%",
    );
    errors.check(
        input.principal < Decimal::ZERO,
        "principal",
        "Principal cannot be negative",
    );
    errors.check(
        input.periodic_contribution < Decimal::ZERO,
        "periodic_contribution",
        "Contribution cannot be negative",
    );
    errors.check(
        input.contributions_per_year == 0 && !input.periodic_contribution.is_zero(),
        "contributions_per_year",
        "Contributions per year must be > 0 when a contribution is given",
    );
    errors.check(
        input.contribution_growth_percent <= dec!(-100),
        "contribution_growth_percent",
        "Contribution growth must be greater than -100%",
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

fn overflow_at(year: u32) -> crate::TvmError {
    crate::TvmError::NumericOverflow {
        context: format!("projected balance in year {year}"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TvmError;
    use rust_decimal_macros::dec;

    fn base_input() -> ProjectionInput {
        ProjectionInput {
            principal: dec!(10000),
            periodic_contribution: dec!(100),
            annual_rate_percent: dec!(6),
            compounding: CompoundingFrequency::Monthly,
            years: 10,
            contributions_per_year: 12,
            contribution_growth_percent: Decimal::ZERO,
            inflation_percent: None,
            tax_percent: None,
        }
    }

    #[test]
    fn test_one_point_per_year() {
        let result = project(&base_input()).unwrap();
        let yearly = &result.result.yearly;
        assert_eq!(yearly.len(), 10);
        assert_eq!(yearly[0].year, 1);
        assert_eq!(yearly[9].year, 10);
        assert_eq!(yearly[9].period, 120);
    }

    #[test]
    fn test_zero_rate_is_linear() {
        let mut input = base_input();
        input.annual_rate_percent = Decimal::ZERO;
        input.contributions_per_year = 1;
        input.periodic_contribution = dec!(500);
        let result = project(&input).unwrap();

        // P + contribution × years
        assert_eq!(result.result.final_balance, dec!(15000));
        assert_eq!(result.result.total_interest, Decimal::ZERO);
    }

    #[test]
    fn test_principal_only_matches_closed_form() {
        let mut input = base_input();
        input.periodic_contribution = Decimal::ZERO;
        input.compounding = CompoundingFrequency::Annually;
        input.annual_rate_percent = dec!(10);
        input.years = 2;
        let result = project(&input).unwrap();
        assert_eq!(result.result.final_balance, dec!(12100));
    }

    #[test]
    fn test_contribution_lands_after_compounding() {
        let input = ProjectionInput {
            principal: Decimal::ZERO,
            periodic_contribution: dec!(1000),
            annual_rate_percent: dec!(10),
            compounding: CompoundingFrequency::Annually,
            years: 2,
            contributions_per_year: 1,
            contribution_growth_percent: Decimal::ZERO,
            inflation_percent: None,
            tax_percent: None,
        };
        let result = project(&input).unwrap();
        let yearly = &result.result.yearly;

        // Year 1: nothing to compound, then +1000
        assert_eq!(yearly[0].ending_balance, dec!(1000));
        assert_eq!(yearly[0].interest_earned, Decimal::ZERO);
        // Year 2: 1000 × 1.1 + 1000
        assert_eq!(yearly[1].ending_balance, dec!(2100));
        assert_eq!(yearly[1].interest_earned, dec!(100));
    }

    #[test]
    fn test_recurrence_holds_every_year() {
        let result = project(&base_input()).unwrap();
        let yearly = &result.result.yearly;
        let mut previous = dec!(10000);
        for point in yearly {
            let expected = previous + point.interest_earned + dec!(1200);
            assert!(
                (point.ending_balance - expected).abs() < dec!(0.000001),
                "Year {} breaks the recurrence",
                point.year
            );
            previous = point.ending_balance;
        }
    }

    #[test]
    fn test_totals_reconcile() {
        let result = project(&base_input()).unwrap();
        let out = &result.result;
        let reconciled = dec!(10000) + out.total_contributions + out.total_interest;
        assert!((out.final_balance - reconciled).abs() < dec!(0.000001));
        assert_eq!(out.total_contributions, dec!(12000));
    }

    #[test]
    fn test_contribution_growth_escalates() {
        let mut input = base_input();
        input.annual_rate_percent = Decimal::ZERO;
        input.principal = Decimal::ZERO;
        input.contributions_per_year = 1;
        input.periodic_contribution = dec!(1000);
        input.contribution_growth_percent = dec!(10);
        input.years = 3;
        let result = project(&input).unwrap();
        // 1000 + 1100 + 1210
        assert_eq!(result.result.final_balance, dec!(3310));
    }

    #[test]
    fn test_effective_annual_rate_monthly() {
        let result = project(&base_input()).unwrap();
        // (1.005)^12 - 1 ≈ 6.1678%
        let ear = result.result.effective_annual_rate_percent;
        assert!((ear - dec!(6.1678)).abs() < dec!(0.0001));
    }

    #[test]
    fn test_terminal_adjustments_do_not_change_series() {
        let plain = project(&base_input()).unwrap();
        let mut input = base_input();
        input.inflation_percent = Some(dec!(3));
        input.tax_percent = Some(dec!(15));
        let adjusted = project(&input).unwrap();

        assert_eq!(plain.result.yearly, adjusted.result.yearly);
        let real = adjusted.result.inflation_adjusted_final_balance.unwrap();
        let after_tax = adjusted.result.after_tax_final_balance.unwrap();
        assert!(real < adjusted.result.final_balance);
        assert!(after_tax < adjusted.result.final_balance);

        let gain = adjusted.result.final_balance - dec!(10000) - dec!(12000);
        let expected = adjusted.result.final_balance - gain * dec!(0.15);
        assert_eq!(after_tax, expected);
    }

    #[test]
    fn test_negative_rate_warns() {
        let mut input = base_input();
        input.annual_rate_percent = dec!(-2);
        let result = project(&input).unwrap();
        assert!(!result.warnings.is_empty());
        assert!(result.result.total_interest < Decimal::ZERO);
    }

    #[test]
    fn test_validation_collects_all_fields() {
        let mut input = base_input();
        input.years = 0;
        input.annual_rate_percent = dec!(-100);
        input.principal = dec!(-1);
        match project(&input) {
            Err(TvmError::Validation(errors)) => {
                assert!(errors.contains("years"));
                assert!(errors.contains("annual_rate_percent"));
                assert!(errors.contains("principal"));
            }
            other => panic!("Expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_runaway_contribution_growth_is_overflow_not_panic() {
        let mut input = base_input();
        input.periodic_contribution = dec!(100);
        input.contributions_per_year = 1;
        input.annual_rate_percent = Decimal::ZERO;
        input.contribution_growth_percent = dec!(100);
        input.years = 120;
        match project(&input) {
            Err(TvmError::NumericOverflow { context }) => assert!(context.contains("year")),
            other => panic!("Expected overflow, got {other:?}"),
        }
    }

    #[test]
    fn test_years_are_capped() {
        let mut input = base_input();
        input.years = u32::MAX;
        match project(&input) {
            Err(TvmError::Validation(errors)) => assert!(errors.contains("years")),
            other => panic!("Expected validation error, got {other:?}"),
        }

        input.years = MAX_PROJECTION_YEARS;
        input.annual_rate_percent = Decimal::ZERO;
        let result = project(&input).unwrap();
        assert_eq!(result.result.yearly.len(), MAX_PROJECTION_YEARS as usize);
    }

    #[test]
    fn test_validation_tax_range() {
        let mut input = base_input();
        input.tax_percent = Some(dec!(120));
        assert!(project(&input).is_err());
    }
}

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::{TvmError, ValidationErrors};
use crate::projection::compound::MAX_PROJECTION_YEARS;
use crate::time_value::{self, checked_add, percent_to_rate};
use crate::types::{with_metadata, CompoundingFrequency, ComputationOutput, Money, PeriodRate};
use crate::TvmResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Input parameters for a workplace retirement-savings projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetirementSavingsInput {
    pub current_age: u32,
    pub retirement_age: u32,
    pub current_balance: Money,
    pub annual_salary: Money,
    /// Employee contribution as a percent of salary
    pub contribution_percent: Decimal,
    #[serde(default)]
    pub salary_growth_percent: Decimal,
    pub annual_return_percent: Decimal,
    #[serde(default)]
    pub compounding: CompoundingFrequency,
    /// Share of employee contributions the employer matches (50 = 50 cents per dollar)
    #[serde(default)]
    pub employer_match_percent: Decimal,
    /// Employer matches contributions up to this percent of salary
    #[serde(default)]
    pub employer_match_limit_percent: Decimal,
    /// Flat extra contribution once the saver reaches `catch_up_age`
    #[serde(default)]
    pub catch_up_contribution: Money,
    #[serde(default = "default_catch_up_age")]
    pub catch_up_age: u32,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub inflation_percent: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tax_percent: Option<Decimal>,
    /// Withdrawal rate used to turn the final balance into an income estimate
    #[serde(default = "default_withdrawal_rate_percent")]
    pub withdrawal_rate_percent: Decimal,
}

fn default_catch_up_age() -> u32 {
    50
}

fn default_withdrawal_rate_percent() -> Decimal {
    dec!(4)
}

/// Top-level output from `project_retirement`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetirementSavingsOutput {
    pub years_to_retirement: u32,
    pub final_balance: Money,
    pub total_employee_contributions: Money,
    pub total_employer_contributions: Money,
    pub total_catch_up_contributions: Money,
    pub total_contributions: Money,
    pub total_interest: Money,
    pub final_salary: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inflation_adjusted_final_balance: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after_tax_final_balance: Option<Money>,
    /// Lowest of the nominal, after-tax and inflation-adjusted final balances
    /// × withdrawal rate
    pub estimated_annual_income: Money,
    pub year_by_year: Vec<RetirementYear>,
}

/// A single year in the retirement-savings projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetirementYear {
    pub year: u32,
    pub age_at_year_end: u32,
    pub salary: Money,
    pub employee_contribution: Money,
    pub employer_contribution: Money,
    pub catch_up_contribution: Money,
    pub interest_earned: Money,
    pub cumulative_contributions: Money,
    pub ending_balance: Money,
}

// ---------------------------------------------------------------------------
// Core function
// ---------------------------------------------------------------------------

/// Project a retirement account from today until retirement age.
///
/// Same recurrence as the compound projector: the balance compounds for the
/// year, then employee, employer and catch-up contributions are added.
/// Salary grows after each year's contributions are taken.
pub fn project_retirement(
    input: &RetirementSavingsInput,
) -> TvmResult<ComputationOutput<RetirementSavingsOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(input)?;

    let years_to_retirement = input.retirement_age - input.current_age;
    let rate = PeriodRate::new(input.annual_return_percent, input.compounding);
    let annual_growth = time_value::compound(rate.per_period(), rate.periods_per_year())?;
    let contribution_rate = percent_to_rate(input.contribution_percent);
    let match_rate = percent_to_rate(input.employer_match_percent);
    let match_limit = percent_to_rate(input.employer_match_limit_percent);
    let salary_growth = Decimal::ONE + percent_to_rate(input.salary_growth_percent);

    if input.contribution_percent < input.employer_match_limit_percent
        && !input.employer_match_percent.is_zero()
    {
        warnings.push(format!(
            "Contribution of {}% is below the {}% match limit; part of the employer match is unused",
            input.contribution_percent, input.employer_match_limit_percent
        ));
    }

    let mut year_by_year: Vec<RetirementYear> = Vec::with_capacity(years_to_retirement as usize);
    let mut balance = input.current_balance;
    let mut salary = input.annual_salary;
    let mut total_employee = Decimal::ZERO;
    let mut total_employer = Decimal::ZERO;
    let mut total_catch_up = Decimal::ZERO;
    let mut total_interest = Decimal::ZERO;

    for yr in 0..years_to_retirement {
        let age_at_year_end = input.current_age + yr + 1;
        let overflow = || TvmError::NumericOverflow {
            context: format!("retirement balance at age {age_at_year_end}"),
        };

        // Contribution shares are capped at 100%, so only the match can exceed salary
        let employee = salary * contribution_rate;
        let employer = employee
            .min(salary * match_limit)
            .checked_mul(match_rate)
            .ok_or_else(overflow)?;
        let catch_up = if age_at_year_end >= input.catch_up_age {
            input.catch_up_contribution
        } else {
            Decimal::ZERO
        };

        let grown = balance.checked_mul(annual_growth).ok_or_else(overflow)?;
        let interest = grown - balance;
        balance = [employee, employer, catch_up]
            .into_iter()
            .try_fold(grown, |sum, part| sum.checked_add(part))
            .ok_or_else(overflow)?;

        total_employee = total_employee.checked_add(employee).ok_or_else(overflow)?;
        total_employer = total_employer.checked_add(employer).ok_or_else(overflow)?;
        total_catch_up = total_catch_up.checked_add(catch_up).ok_or_else(overflow)?;
        total_interest = total_interest.checked_add(interest).ok_or_else(overflow)?;
        let cumulative_contributions = [total_employer, total_catch_up]
            .into_iter()
            .try_fold(total_employee, |sum, part| sum.checked_add(part))
            .ok_or_else(overflow)?;

        year_by_year.push(RetirementYear {
            year: yr + 1,
            age_at_year_end,
            salary,
            employee_contribution: employee,
            employer_contribution: employer,
            catch_up_contribution: catch_up,
            interest_earned: interest,
            cumulative_contributions,
            ending_balance: balance,
        });

        salary = salary.checked_mul(salary_growth).ok_or_else(overflow)?;
    }

    let total_contributions = year_by_year
        .last()
        .map(|y| y.cumulative_contributions)
        .unwrap_or(Decimal::ZERO);
    let final_salary = year_by_year.last().map(|y| y.salary).unwrap_or(input.annual_salary);

    let inflation_adjusted_final_balance = match input.inflation_percent {
        Some(inflation) => Some(time_value::inflation_adjusted(
            balance,
            percent_to_rate(inflation),
            years_to_retirement,
        )?),
        None => None,
    };

    let after_tax_final_balance = match input.tax_percent {
        Some(tax) => {
            let basis = checked_add(input.current_balance, total_contributions, "cost basis")?;
            Some(time_value::after_tax_value(balance, basis, percent_to_rate(tax)))
        }
        None => None,
    };

    // Income estimate uses the most conservative balance available.
    let income_base = after_tax_final_balance
        .into_iter()
        .chain(inflation_adjusted_final_balance)
        .fold(balance, |lowest, candidate| lowest.min(candidate));
    let estimated_annual_income = income_base * percent_to_rate(input.withdrawal_rate_percent);

    log::debug!(
        "retirement projection: {} years, final balance {}, employer share {}",
        years_to_retirement,
        balance,
        total_employer
    );

    let output = RetirementSavingsOutput {
        years_to_retirement,
        final_balance: balance,
        total_employee_contributions: total_employee,
        total_employer_contributions: total_employer,
        total_catch_up_contributions: total_catch_up,
        total_contributions,
        total_interest,
        final_salary,
        inflation_adjusted_final_balance,
        after_tax_final_balance,
        estimated_annual_income,
        year_by_year,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Retirement Savings Projection (salary-linked contributions, employer match, catch-up)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_input(input: &RetirementSavingsInput) -> TvmResult<()> {
    let mut errors = ValidationErrors::new();
    let share_of_salary = |p: Decimal| p < Decimal::ZERO || p > dec!(100);

    errors.check(
        input.retirement_age <= input.current_age,
        "retirement_age",
        "Retirement age must be greater than current age",
    );
    errors.check(
        input.retirement_age.saturating_sub(input.current_age) > MAX_PROJECTION_YEARS,
        "retirement_age",
        &format!("Retirement must be at most {MAX_PROJECTION_YEARS} years away"),
    );
    errors.check(
        input.current_balance < Decimal::ZERO,
        "current_balance",
        "Current balance cannot be negative",
    );
    errors.check(
        input.annual_salary < Decimal::ZERO,
        "annual_salary",
        "Salary cannot be negative",
    );
    errors.check(
        share_of_salary(input.contribution_percent),
        "contribution_percent",
        "Contribution must be between 0% and 100% of salary",
    );
    errors.check(
        share_of_salary(input.employer_match_limit_percent),
        "employer_match_limit_percent",
        "Match limit must be between 0% and 100% of salary",
    );
    errors.check(
        input.employer_match_percent < Decimal::ZERO,
        "employer_match_percent",
        "Employer match cannot be negative",
    );
    errors.check(
        input.catch_up_contribution < Decimal::ZERO,
        "catch_up_contribution",
        "Catch-up contribution cannot be negative",
    );
    errors.check(
        input.annual_return_percent <= dec!(-100),
        "annual_return_percent",
        "Return must be greater than -100%",
    );
    errors.check(
        input.salary_growth_percent <= dec!(-100),
        "salary_growth_percent",
        "Salary growth must be greater than -100%",
    );
    errors.check(
        share_of_salary(input.withdrawal_rate_percent),
        "withdrawal_rate_percent",
        "Withdrawal rate must be between 0% and 100%",
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
            share_of_salary(tax),
            "tax_percent",
            "Tax rate must be between 0% and 100%",
        );
    }

    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn default_input() -> RetirementSavingsInput {
        RetirementSavingsInput {
            current_age: 30,
            retirement_age: 65,
            current_balance: dec!(25000),
            annual_salary: dec!(60000),
            contribution_percent: dec!(6),
            salary_growth_percent: dec!(3),
            annual_return_percent: dec!(7),
            compounding: CompoundingFrequency::Annually,
            employer_match_percent: dec!(50),
            employer_match_limit_percent: dec!(6),
            catch_up_contribution: dec!(7500),
            catch_up_age: 50,
            inflation_percent: None,
            tax_percent: None,
            withdrawal_rate_percent: dec!(4),
        }
    }

    #[test]
    fn test_one_row_per_year_to_retirement() {
        let result = project_retirement(&default_input()).unwrap();
        let out = &result.result;
        assert_eq!(out.years_to_retirement, 35);
        assert_eq!(out.year_by_year.len(), 35);
        assert_eq!(out.year_by_year[0].age_at_year_end, 31);
        assert_eq!(out.year_by_year[34].age_at_year_end, 65);
    }

    #[test]
    fn test_first_year_contributions() {
        let result = project_retirement(&default_input()).unwrap();
        let first = &result.result.year_by_year[0];
        // 6% of 60,000
        assert_eq!(first.employee_contribution, dec!(3600));
        // 50% match on contributions up to 6% of salary
        assert_eq!(first.employer_contribution, dec!(1800));
        assert_eq!(first.catch_up_contribution, Decimal::ZERO);
        // 25,000 × 1.07 = 26,750 + 3,600 + 1,800
        assert_eq!(first.ending_balance, dec!(32150));
    }

    #[test]
    fn test_employer_match_capped_by_limit() {
        let mut input = default_input();
        input.contribution_percent = dec!(10);
        input.employer_match_percent = dec!(100);
        input.employer_match_limit_percent = dec!(4);
        let result = project_retirement(&input).unwrap();
        let first = &result.result.year_by_year[0];
        assert_eq!(first.employee_contribution, dec!(6000));
        // Match only applies to 4% of 60,000
        assert_eq!(first.employer_contribution, dec!(2400));
    }

    #[test]
    fn test_catch_up_starts_at_threshold_age() {
        let result = project_retirement(&default_input()).unwrap();
        for row in &result.result.year_by_year {
            if row.age_at_year_end >= 50 {
                assert_eq!(row.catch_up_contribution, dec!(7500));
            } else {
                assert_eq!(row.catch_up_contribution, Decimal::ZERO);
            }
        }
        // Ages 50..=65 -> 16 catch-up years
        assert_eq!(
            result.result.total_catch_up_contributions,
            dec!(7500) * dec!(16)
        );
    }

    #[test]
    fn test_salary_grows_each_year() {
        let result = project_retirement(&default_input()).unwrap();
        let rows = &result.result.year_by_year;
        assert_eq!(rows[0].salary, dec!(60000));
        assert_eq!(rows[1].salary, dec!(61800));
        assert!(rows[34].salary > rows[33].salary);
        assert_eq!(result.result.final_salary, rows[34].salary);
    }

    #[test]
    fn test_totals_reconcile() {
        let result = project_retirement(&default_input()).unwrap();
        let out = &result.result;
        let reconciled = dec!(25000) + out.total_contributions + out.total_interest;
        assert!((out.final_balance - reconciled).abs() < dec!(0.0001));
        assert_eq!(
            out.total_contributions,
            out.total_employee_contributions
                + out.total_employer_contributions
                + out.total_catch_up_contributions
        );
    }

    #[test]
    fn test_income_estimate_uses_withdrawal_rate() {
        let result = project_retirement(&default_input()).unwrap();
        let out = &result.result;
        assert_eq!(out.estimated_annual_income, out.final_balance * dec!(0.04));
    }

    #[test]
    fn test_inflation_and_tax_only_touch_terminal_value() {
        let plain = project_retirement(&default_input()).unwrap();
        let mut input = default_input();
        input.inflation_percent = Some(dec!(2.5));
        input.tax_percent = Some(dec!(20));
        let adjusted = project_retirement(&input).unwrap();

        assert_eq!(plain.result.year_by_year, adjusted.result.year_by_year);
        let real = adjusted.result.inflation_adjusted_final_balance.unwrap();
        let after_tax = adjusted.result.after_tax_final_balance.unwrap();
        assert!(real < after_tax, "35 years of 2.5% inflation outweighs 20% gain tax");
        assert_eq!(
            adjusted.result.estimated_annual_income,
            real * dec!(0.04)
        );
    }

    #[test]
    fn test_unused_match_warns() {
        let mut input = default_input();
        input.contribution_percent = dec!(3);
        let result = project_retirement(&input).unwrap();
        assert!(result.warnings.iter().any(|w| w.contains("match")));
    }

    #[test]
    fn test_validation_retirement_not_after_current() {
        let mut input = default_input();
        input.retirement_age = 30;
        match project_retirement(&input) {
            Err(TvmError::Validation(errors)) => assert!(errors.contains("retirement_age")),
            other => panic!("Expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_income_estimate_uses_after_tax_when_lowest() {
        let mut input = default_input();
        input.tax_percent = Some(dec!(20));
        let out = project_retirement(&input).unwrap().result;
        let after_tax = out.after_tax_final_balance.unwrap();
        assert!(after_tax < out.final_balance);
        assert_eq!(out.estimated_annual_income, after_tax * dec!(0.04));
    }

    #[test]
    fn test_runaway_salary_growth_is_overflow_not_panic() {
        let mut input = default_input();
        input.current_age = 20;
        input.retirement_age = 119;
        input.salary_growth_percent = dec!(100);
        match project_retirement(&input) {
            Err(TvmError::NumericOverflow { context }) => assert!(context.contains("age")),
            other => panic!("Expected overflow, got {other:?}"),
        }
    }

    #[test]
    fn test_horizon_is_capped() {
        let mut input = default_input();
        input.current_age = 0;
        input.retirement_age = u32::MAX;
        match project_retirement(&input) {
            Err(TvmError::Validation(errors)) => assert!(errors.contains("retirement_age")),
            other => panic!("Expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_validation_contribution_over_salary() {
        let mut input = default_input();
        input.contribution_percent = dec!(150);
        input.annual_salary = dec!(-1);
        match project_retirement(&input) {
            Err(TvmError::Validation(errors)) => {
                assert!(errors.contains("contribution_percent"));
                assert!(errors.contains("annual_salary"));
            }
            other => panic!("Expected validation error, got {other:?}"),
        }
    }
}

use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use tvm_core::projection::compound::{self, ProjectionInput};
use tvm_core::projection::retirement::{self, RetirementSavingsInput};
use tvm_core::CompoundingFrequency;

use super::{resolve_input, CommandResult};

/// Arguments for a compound-interest projection
#[derive(Args)]
pub struct ProjectArgs {
    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Starting balance
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Amount added each contribution period
    #[arg(long, default_value = "0")]
    pub contribution: Decimal,

    /// Annual interest rate in percent (e.g. 5 for 5%)
    #[arg(long, allow_hyphen_values = true)]
    pub rate: Option<Decimal>,

    /// Number of years to project
    #[arg(long)]
    pub years: Option<u32>,

    /// Compounding frequency (name or periods per year)
    #[arg(long, default_value = "monthly")]
    pub compounding: CompoundingFrequency,

    /// Contributions made per year
    #[arg(long, default_value_t = 12)]
    pub contributions_per_year: u32,

    /// Annual growth of the contribution in percent
    #[arg(long, default_value = "0")]
    pub contribution_growth: Decimal,

    /// Inflation in percent, for the real final balance
    #[arg(long)]
    pub inflation: Option<Decimal>,

    /// Tax on gains in percent, for the after-tax final balance
    #[arg(long)]
    pub tax: Option<Decimal>,
}

pub fn run_project(args: ProjectArgs) -> CommandResult {
    let projection_input: ProjectionInput = resolve_input(args.input.as_deref(), || {
        Ok(ProjectionInput {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            periodic_contribution: args.contribution,
            annual_rate_percent: args.rate.ok_or("--rate is required (or provide --input)")?,
            compounding: args.compounding,
            years: args.years.ok_or("--years is required (or provide --input)")?,
            contributions_per_year: args.contributions_per_year,
            contribution_growth_percent: args.contribution_growth,
            inflation_percent: args.inflation,
            tax_percent: args.tax,
        })
    })?;

    let result = compound::project(&projection_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for a retirement savings projection
#[derive(Args)]
pub struct RetirementArgs {
    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[arg(long)]
    pub current_age: Option<u32>,

    #[arg(long)]
    pub retirement_age: Option<u32>,

    /// Savings already accumulated
    #[arg(long, default_value = "0")]
    pub balance: Decimal,

    /// Current annual salary
    #[arg(long)]
    pub salary: Option<Decimal>,

    /// Employee contribution in percent of salary
    #[arg(long)]
    pub contribution: Option<Decimal>,

    /// Annual salary growth in percent
    #[arg(long, default_value = "0")]
    pub salary_growth: Decimal,

    /// Annual investment return in percent
    #[arg(long, allow_hyphen_values = true)]
    pub rate: Option<Decimal>,

    #[arg(long, default_value = "monthly")]
    pub compounding: CompoundingFrequency,

    /// Employer match in percent of employee contributions
    #[arg(long, default_value = "0")]
    pub employer_match: Decimal,

    /// Salary share the employer matches up to, in percent
    #[arg(long, default_value = "0")]
    pub match_limit: Decimal,

    /// Extra yearly contribution once catch-up age is reached
    #[arg(long, default_value = "0")]
    pub catch_up: Decimal,

    #[arg(long, default_value_t = 50)]
    pub catch_up_age: u32,

    #[arg(long)]
    pub inflation: Option<Decimal>,

    #[arg(long)]
    pub tax: Option<Decimal>,

    /// Sustainable withdrawal rate in percent
    #[arg(long)]
    pub withdrawal_rate: Option<Decimal>,
}

pub fn run_retirement(args: RetirementArgs) -> CommandResult {
    let retirement_input: RetirementSavingsInput = resolve_input(args.input.as_deref(), || {
        Ok(RetirementSavingsInput {
            current_age: args
                .current_age
                .ok_or("--current-age is required (or provide --input)")?,
            retirement_age: args
                .retirement_age
                .ok_or("--retirement-age is required (or provide --input)")?,
            current_balance: args.balance,
            annual_salary: args.salary.ok_or("--salary is required (or provide --input)")?,
            contribution_percent: args
                .contribution
                .ok_or("--contribution is required (or provide --input)")?,
            salary_growth_percent: args.salary_growth,
            annual_return_percent: args.rate.ok_or("--rate is required (or provide --input)")?,
            compounding: args.compounding,
            employer_match_percent: args.employer_match,
            employer_match_limit_percent: args.match_limit,
            catch_up_contribution: args.catch_up,
            catch_up_age: args.catch_up_age,
            inflation_percent: args.inflation,
            tax_percent: args.tax,
            withdrawal_rate_percent: args.withdrawal_rate.unwrap_or(dec!(4)),
        })
    })?;

    let result = retirement::project_retirement(&retirement_input)?;
    Ok(serde_json::to_value(result)?)
}

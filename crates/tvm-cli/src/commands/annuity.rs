use clap::Args;
use rust_decimal::Decimal;

use tvm_core::annuity::valuation::{self, AnnuityInput, AnnuityKind};
use tvm_core::CompoundingFrequency;

use super::{resolve_input, CommandResult};

/// Arguments for annuity valuation
#[derive(Args)]
pub struct AnnuityArgs {
    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Level payment per period
    #[arg(long)]
    pub payment: Option<Decimal>,

    /// Number of payments
    #[arg(long)]
    pub periods: Option<u32>,

    /// Annual rate in percent
    #[arg(long, allow_hyphen_values = true)]
    pub rate: Option<Decimal>,

    /// Payments (and compounding periods) per year
    #[arg(long, default_value = "monthly")]
    pub frequency: CompoundingFrequency,

    /// Payments fall at the start of each period (annuity due)
    #[arg(long)]
    pub due: bool,

    /// Annual inflation in percent; values at the real rate
    #[arg(long)]
    pub inflation: Option<Decimal>,

    /// Tax on growth in percent
    #[arg(long)]
    pub tax: Option<Decimal>,
}

pub fn run_annuity(args: AnnuityArgs) -> CommandResult {
    let annuity_input: AnnuityInput = resolve_input(args.input.as_deref(), || {
        Ok(AnnuityInput {
            payment: args.payment.ok_or("--payment is required (or provide --input)")?,
            periods: args.periods.ok_or("--periods is required (or provide --input)")?,
            annual_rate_percent: args.rate.ok_or("--rate is required (or provide --input)")?,
            frequency: args.frequency,
            kind: if args.due {
                AnnuityKind::Due
            } else {
                AnnuityKind::Ordinary
            },
            inflation_percent: args.inflation,
            tax_percent: args.tax,
        })
    })?;

    let result = valuation::value_annuity(&annuity_input)?;
    Ok(serde_json::to_value(result)?)
}

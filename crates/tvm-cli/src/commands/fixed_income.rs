use clap::Args;
use rust_decimal::Decimal;

use tvm_core::fixed_income::bonds::{self, BondInput, CallSpec};
use tvm_core::CompoundingFrequency;

use super::{resolve_input, CommandResult};

/// Arguments for bond analytics
#[derive(Args)]
pub struct BondArgs {
    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[arg(long, default_value = "1000")]
    pub face_value: Decimal,

    /// Annual coupon rate in percent
    #[arg(long)]
    pub coupon_rate: Option<Decimal>,

    /// Coupon payments per year
    #[arg(long, default_value = "semi_annually")]
    pub frequency: CompoundingFrequency,

    #[arg(long)]
    pub years: Option<Decimal>,

    /// Annual discount rate in percent
    #[arg(long, allow_hyphen_values = true)]
    pub discount_rate: Option<Decimal>,

    /// Quoted market price; defaults to face value
    #[arg(long)]
    pub market_price: Option<Decimal>,

    /// Call price, enables the yield-to-call estimate
    #[arg(long, requires = "years_to_call")]
    pub call_price: Option<Decimal>,

    #[arg(long, requires = "call_price")]
    pub years_to_call: Option<Decimal>,
}

pub fn run_bond(args: BondArgs) -> CommandResult {
    let bond_input: BondInput = resolve_input(args.input.as_deref(), || {
        let call = match (args.call_price, args.years_to_call) {
            (Some(call_price), Some(years_to_call)) => Some(CallSpec {
                call_price,
                years_to_call,
            }),
            _ => None,
        };
        Ok(BondInput {
            face_value: args.face_value,
            coupon_rate_percent: args
                .coupon_rate
                .ok_or("--coupon-rate is required (or provide --input)")?,
            frequency: args.frequency,
            years_to_maturity: args.years.ok_or("--years is required (or provide --input)")?,
            discount_rate_percent: args
                .discount_rate
                .ok_or("--discount-rate is required (or provide --input)")?,
            market_price: args.market_price.unwrap_or(args.face_value),
            call,
        })
    })?;

    let result = bonds::analyze_bond(&bond_input)?;
    Ok(serde_json::to_value(result)?)
}

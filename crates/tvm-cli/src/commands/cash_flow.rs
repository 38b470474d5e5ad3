use clap::Args;
use rust_decimal::Decimal;

use tvm_core::cash_flow::solver::{self, CashFlowReturnInput};

use super::{resolve_input, CommandResult};

/// Arguments for the cash-flow return solver
#[derive(Args)]
pub struct ReturnsArgs {
    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Upfront outlay as a positive amount
    #[arg(long)]
    pub investment: Option<Decimal>,

    /// Cash flows for periods 1..n (comma-separated, e.g. "300,400,-50,600")
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub cash_flows: Option<Vec<Decimal>>,

    /// Discount rate in percent for NPV and MIRR financing
    #[arg(long, allow_hyphen_values = true)]
    pub discount_rate: Option<Decimal>,

    /// MIRR reinvestment rate in percent; defaults to the discount rate
    #[arg(long, allow_hyphen_values = true)]
    pub reinvestment_rate: Option<Decimal>,

    /// Sale or salvage value received with the last cash flow
    #[arg(long)]
    pub final_value: Option<Decimal>,

    #[arg(long)]
    pub inflation: Option<Decimal>,

    #[arg(long)]
    pub tax: Option<Decimal>,
}

pub fn run_returns(args: ReturnsArgs) -> CommandResult {
    let returns_input: CashFlowReturnInput = resolve_input(args.input.as_deref(), || {
        Ok(CashFlowReturnInput {
            initial_investment: args
                .investment
                .ok_or("--investment is required (or provide --input)")?,
            cash_flows: args
                .cash_flows
                .clone()
                .ok_or("--cash-flows is required (or provide --input)")?,
            discount_rate_percent: args
                .discount_rate
                .ok_or("--discount-rate is required (or provide --input)")?,
            reinvestment_rate_percent: args.reinvestment_rate,
            final_value: args.final_value,
            inflation_percent: args.inflation,
            tax_percent: args.tax,
        })
    })?;

    let result = solver::solve_returns(&returns_input)?;
    Ok(serde_json::to_value(result)?)
}

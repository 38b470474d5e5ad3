mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::annuity::AnnuityArgs;
use commands::cash_flow::ReturnsArgs;
use commands::fixed_income::BondArgs;
use commands::projection::{ProjectArgs, RetirementArgs};

/// Time-value-of-money calculators
#[derive(Parser)]
#[command(
    name = "tvm",
    version,
    about = "Time-value-of-money calculators",
    long_about = "A CLI for compound growth, retirement savings, annuities, bond analytics \
                  and investment returns (IRR, MIRR, NPV, payback), computed with decimal \
                  precision. Set RUST_LOG=debug for solver diagnostics."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Project a balance with compound interest and regular contributions
    Project(ProjectArgs),
    /// Project retirement savings with employer match and catch-up contributions
    Retirement(RetirementArgs),
    /// Present and future value of an ordinary annuity or annuity due
    Annuity(AnnuityArgs),
    /// Bond price, yields, duration and convexity
    Bond(BondArgs),
    /// IRR, MIRR, NPV and payback for an investment's cash flows
    Returns(ReturnsArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result: commands::CommandResult = match cli.command {
        Commands::Project(args) => commands::projection::run_project(args),
        Commands::Retirement(args) => commands::projection::run_retirement(args),
        Commands::Annuity(args) => commands::annuity::run_annuity(args),
        Commands::Bond(args) => commands::fixed_income::run_bond(args),
        Commands::Returns(args) => commands::cash_flow::run_returns(args),
        Commands::Version => {
            println!("tvm {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            log::debug!("command failed: {e:?}");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}

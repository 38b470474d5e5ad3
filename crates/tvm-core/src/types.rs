use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::TvmError;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%). Calculator inputs and outputs
/// named `*_percent` are the only place percentages appear.
pub type Rate = Decimal;

/// Year fractions or counts
pub type Years = Decimal;

/// How many times per year interest compounds or payments fall due.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "FrequencyRepr")]
pub enum CompoundingFrequency {
    Annually,
    SemiAnnually,
    Quarterly,
    #[default]
    Monthly,
    BiWeekly,
    Weekly,
    Daily,
}

impl CompoundingFrequency {
    pub const ALL: [CompoundingFrequency; 7] = [
        CompoundingFrequency::Annually,
        CompoundingFrequency::SemiAnnually,
        CompoundingFrequency::Quarterly,
        CompoundingFrequency::Monthly,
        CompoundingFrequency::BiWeekly,
        CompoundingFrequency::Weekly,
        CompoundingFrequency::Daily,
    ];

    pub fn periods_per_year(self) -> u32 {
        match self {
            CompoundingFrequency::Annually => 1,
            CompoundingFrequency::SemiAnnually => 2,
            CompoundingFrequency::Quarterly => 4,
            CompoundingFrequency::Monthly => 12,
            CompoundingFrequency::BiWeekly => 26,
            CompoundingFrequency::Weekly => 52,
            CompoundingFrequency::Daily => 365,
        }
    }

    pub fn from_periods(periods: u32) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.periods_per_year() == periods)
    }

    pub fn name(self) -> &'static str {
        match self {
            CompoundingFrequency::Annually => "annually",
            CompoundingFrequency::SemiAnnually => "semi_annually",
            CompoundingFrequency::Quarterly => "quarterly",
            CompoundingFrequency::Monthly => "monthly",
            CompoundingFrequency::BiWeekly => "bi_weekly",
            CompoundingFrequency::Weekly => "weekly",
            CompoundingFrequency::Daily => "daily",
        }
    }
}

impl fmt::Display for CompoundingFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CompoundingFrequency {
    type Err = TvmError;

    /// Accepts a name (`monthly`, `semi-annually`, `semi_annually`) or a
    /// per-year count (`12`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        if let Ok(periods) = normalized.parse::<u32>() {
            return Self::from_periods(periods).ok_or_else(|| unsupported_frequency(s));
        }
        let found = match normalized.as_str() {
            "annually" | "annual" | "yearly" => CompoundingFrequency::Annually,
            "semi_annually" | "semiannually" | "semi_annual" => CompoundingFrequency::SemiAnnually,
            "quarterly" => CompoundingFrequency::Quarterly,
            "monthly" => CompoundingFrequency::Monthly,
            "bi_weekly" | "biweekly" | "fortnightly" => CompoundingFrequency::BiWeekly,
            "weekly" => CompoundingFrequency::Weekly,
            "daily" => CompoundingFrequency::Daily,
            _ => return Err(unsupported_frequency(s)),
        };
        Ok(found)
    }
}

fn unsupported_frequency(raw: &str) -> TvmError {
    TvmError::InvalidInput {
        field: "frequency".into(),
        reason: format!("'{raw}' is not one of 1, 2, 4, 12, 26, 52, 365 or a named period"),
    }
}

/// Wire form of a frequency: either its name or its per-year count.
#[derive(Deserialize)]
#[serde(untagged)]
enum FrequencyRepr {
    Count(u32),
    Name(String),
}

impl TryFrom<FrequencyRepr> for CompoundingFrequency {
    type Error = TvmError;

    fn try_from(repr: FrequencyRepr) -> Result<Self, Self::Error> {
        match repr {
            FrequencyRepr::Count(n) => {
                Self::from_periods(n).ok_or_else(|| unsupported_frequency(&n.to_string()))
            }
            FrequencyRepr::Name(name) => name.parse(),
        }
    }
}

/// An annual nominal rate in percent together with its compounding frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodRate {
    pub annual_percent: Decimal,
    pub frequency: CompoundingFrequency,
}

impl PeriodRate {
    pub fn new(annual_percent: Decimal, frequency: CompoundingFrequency) -> Self {
        Self {
            annual_percent,
            frequency,
        }
    }

    pub fn periods_per_year(&self) -> u32 {
        self.frequency.periods_per_year()
    }

    /// Annual rate as a decimal (5% -> 0.05).
    pub fn annual_rate(&self) -> Rate {
        self.annual_percent / dec!(100)
    }

    /// Per-period decimal rate = rate / (100 × frequency).
    pub fn per_period(&self) -> Rate {
        self.annual_percent / (dec!(100) * Decimal::from(self.periods_per_year()))
    }
}

/// One sampled point of a balance projection.
///
/// `interest_earned` covers the interval since the previous point only;
/// `cumulative_interest` runs from the start of the projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyProjectionPoint {
    pub year: u32,
    pub period: u32,
    pub ending_balance: Money,
    pub cumulative_contribution: Money,
    pub interest_earned: Money,
    pub cumulative_interest: Money,
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::TvmError;
use crate::fixed_income::bonds::BondCashflow;
use crate::time_value::{checked_add, checked_div, checked_mul};
use crate::types::{Money, Rate};
use crate::TvmResult;

/// Duration and convexity of a priced cash-flow schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BondRiskMetrics {
    /// Weighted-average time of cash flows (in years)
    pub macaulay_duration: Decimal,
    /// Macaulay duration / (1 + i), i the per-period discount rate
    pub modified_duration: Decimal,
    /// Σ t² × PV(CF) / (price × (1 + i)²), t in years
    pub convexity: Decimal,
    /// Dollar value of one basis point (modified_duration * price * 0.0001)
    pub dv01: Money,
    /// Estimated % price change for +100 bp using duration + convexity
    pub price_change_up_100bp_percent: Decimal,
    /// Estimated % price change for -100 bp using duration + convexity
    pub price_change_down_100bp_percent: Decimal,
}

/// Compute duration, convexity and shift estimates from a schedule whose
/// present values were discounted at `period_rate`.
///
/// `price` must be the sum of the schedule's present values.
pub fn risk_metrics(
    schedule: &[BondCashflow],
    period_rate: Rate,
    price: Money,
) -> TvmResult<BondRiskMetrics> {
    if price.is_zero() {
        return Err(TvmError::DivisionByZero {
            context: "duration: bond price is zero".to_string(),
        });
    }

    let one_plus_i = Decimal::ONE + period_rate;
    let mut time_weighted = Decimal::ZERO;
    let mut time_squared_weighted = Decimal::ZERO;

    for cf in schedule {
        let weighted = checked_mul(cf.time_years, cf.present_value, "duration weight")?;
        time_weighted = checked_add(time_weighted, weighted, "duration weight")?;
        let squared = checked_mul(cf.time_years, weighted, "convexity weight")?;
        time_squared_weighted = checked_add(time_squared_weighted, squared, "convexity weight")?;
    }

    let macaulay_duration = checked_div(time_weighted, price, "Macaulay duration")?;
    let modified_duration = checked_div(macaulay_duration, one_plus_i, "modified duration")?;
    let growth_squared = checked_mul(one_plus_i, one_plus_i, "convexity")?;
    let convexity_base = checked_mul(price, growth_squared, "convexity")?;
    let convexity = checked_div(time_squared_weighted, convexity_base, "convexity")?;

    let dv01 = checked_mul(modified_duration, price * dec!(0.0001), "DV01")?;
    let delta_y = dec!(0.01);
    let curvature = dec!(0.5) * convexity * delta_y * delta_y;
    let price_change_up_100bp_percent = (-modified_duration * delta_y + curvature) * dec!(100);
    let price_change_down_100bp_percent = (modified_duration * delta_y + curvature) * dec!(100);

    Ok(BondRiskMetrics {
        macaulay_duration,
        modified_duration,
        convexity,
        dv01,
        price_change_up_100bp_percent,
        price_change_down_100bp_percent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed_income::bonds::CashflowKind;

    fn flow(period: u32, time_years: Decimal, payment: Money, present_value: Money) -> BondCashflow {
        BondCashflow {
            period,
            time_years,
            payment,
            present_value,
            kind: CashflowKind::Coupon,
        }
    }

    #[test]
    fn test_single_flow_duration_is_its_time() {
        let schedule = vec![flow(3, dec!(3), dec!(1331), dec!(1000))];
        let metrics = risk_metrics(&schedule, dec!(0.10), dec!(1000)).unwrap();
        assert_eq!(metrics.macaulay_duration, dec!(3));
        // 3 / 1.1
        assert!((metrics.modified_duration - dec!(2.7272727)).abs() < dec!(0.000001));
        // 9 / 1.21
        assert!((metrics.convexity - dec!(7.4380165)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_up_move_loses_less_than_down_move_gains() {
        let schedule = vec![
            flow(1, dec!(1), dec!(100), dec!(90.909)),
            flow(2, dec!(2), dec!(1100), dec!(909.091)),
        ];
        let metrics = risk_metrics(&schedule, dec!(0.10), dec!(1000)).unwrap();
        assert!(metrics.price_change_up_100bp_percent < Decimal::ZERO);
        assert!(metrics.price_change_down_100bp_percent > Decimal::ZERO);
        assert!(
            metrics.price_change_down_100bp_percent > metrics.price_change_up_100bp_percent.abs()
        );
    }

    #[test]
    fn test_zero_price_is_an_error() {
        let err = risk_metrics(&[], dec!(0.05), Decimal::ZERO).unwrap_err();
        assert!(matches!(err, TvmError::DivisionByZero { .. }));
    }
}

use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tvm_core::fixed_income::bonds::{self, BondInput, CallSpec, CashflowKind, PriceClassification};
use tvm_core::{CompoundingFrequency, TvmError};

fn ten_year_five_percent(discount_rate_percent: Decimal) -> BondInput {
    BondInput {
        face_value: dec!(1000),
        coupon_rate_percent: dec!(5),
        frequency: CompoundingFrequency::SemiAnnually,
        years_to_maturity: dec!(10),
        discount_rate_percent,
        market_price: dec!(1000),
        call: None,
    }
}

fn assert_close(actual: Decimal, expected: Decimal, tolerance: Decimal) {
    assert!(
        (actual - expected).abs() < tolerance,
        "expected {expected}, got {actual}"
    );
}

// ===========================================================================
// Pricing
// ===========================================================================

#[test]
fn test_par_bond_prices_at_face() {
    let out = bonds::analyze_bond(&ten_year_five_percent(dec!(5)))
        .unwrap()
        .result;
    assert_close(out.price, dec!(1000), dec!(0.00000001));
    assert_eq!(out.num_periods, 20);
    assert_eq!(out.coupon_payment, dec!(25));
    assert_eq!(out.price_classification, PriceClassification::Par);
}

#[test]
fn test_discount_rate_above_coupon_prices_below_face() {
    let out = bonds::analyze_bond(&ten_year_five_percent(dec!(6)))
        .unwrap()
        .result;
    assert_close(out.price, dec!(925.6126257), dec!(0.000001));
    assert_close(out.value_gap, dec!(-74.3873743), dec!(0.000001));
}

#[test]
fn test_schedule_redeems_on_final_flow_only() {
    let out = bonds::analyze_bond(&ten_year_five_percent(dec!(6)))
        .unwrap()
        .result;
    let kinds: Vec<CashflowKind> = out.cash_flows.iter().map(|cf| cf.kind).collect();
    let mut expected = vec![CashflowKind::Coupon; 19];
    expected.push(CashflowKind::CouponAndPrincipal);
    assert_eq!(kinds, expected);
    assert_eq!(out.cash_flows[19].payment, dec!(1025));
}

// ===========================================================================
// Duration and convexity
// ===========================================================================

#[test]
fn test_duration_bounded_by_maturity() {
    for rate in [dec!(1), dec!(5), dec!(12)] {
        let out = bonds::analyze_bond(&ten_year_five_percent(rate))
            .unwrap()
            .result;
        assert!(out.macaulay_duration > Decimal::ZERO);
        assert!(out.macaulay_duration < dec!(10));
        assert!(out.modified_duration < out.macaulay_duration);
        assert!(out.convexity > Decimal::ZERO);
    }
}

#[test]
fn test_zero_coupon_duration_equals_maturity() {
    let input = BondInput {
        coupon_rate_percent: Decimal::ZERO,
        frequency: CompoundingFrequency::Annually,
        years_to_maturity: dec!(5),
        market_price: dec!(780),
        ..ten_year_five_percent(dec!(5))
    };
    let out = bonds::analyze_bond(&input).unwrap().result;
    assert_close(out.price, dec!(783.5261665), dec!(0.000001));
    assert_close(out.macaulay_duration, dec!(5), dec!(0.0000000001));
    assert_eq!(out.current_yield_percent, Decimal::ZERO);
}

#[test]
fn test_higher_rates_shorten_duration() {
    let low = bonds::analyze_bond(&ten_year_five_percent(dec!(2)))
        .unwrap()
        .result;
    let high = bonds::analyze_bond(&ten_year_five_percent(dec!(9)))
        .unwrap()
        .result;
    assert!(high.macaulay_duration < low.macaulay_duration);
}

// ===========================================================================
// Yields
// ===========================================================================

#[test]
fn test_current_and_approximate_yields() {
    let input = BondInput {
        market_price: dec!(925.61),
        ..ten_year_five_percent(dec!(6))
    };
    let out = bonds::analyze_bond(&input).unwrap().result;
    // 50 / 925.61
    assert_close(out.current_yield_percent, dec!(5.4018), dec!(0.0001));
    // (50 + 74.39 / 10) / 962.805
    assert_close(out.approximate_ytm_percent, dec!(5.9657), dec!(0.0001));
    assert_eq!(out.price_classification, PriceClassification::Discount);
    assert!(out.yield_to_call_percent.is_none());
}

#[test]
fn test_yield_to_call_is_flagged_approximate() {
    let input = BondInput {
        market_price: dec!(950),
        call: Some(CallSpec {
            call_price: dec!(1050),
            years_to_call: dec!(5),
        }),
        ..ten_year_five_percent(dec!(5))
    };
    let result = bonds::analyze_bond(&input).unwrap();
    let out = result.result;
    // (100/950 + 0.05) / 5
    assert_close(out.yield_to_call_percent.unwrap(), dec!(3.1052632), dec!(0.000001));
    assert!(out.yield_to_call_is_approximate);
    assert!(!result.warnings.is_empty());
}

// ===========================================================================
// Validation
// ===========================================================================

#[test]
fn test_fractional_period_count_rejected() {
    let input = BondInput {
        years_to_maturity: dec!(2.25),
        ..ten_year_five_percent(dec!(5))
    };
    match bonds::analyze_bond(&input) {
        Err(TvmError::Validation(errors)) => assert!(errors.contains("years_to_maturity")),
        other => panic!("Expected validation error, got {other:?}"),
    }
}

#[test]
fn test_call_after_maturity_rejected() {
    let input = BondInput {
        call: Some(CallSpec {
            call_price: dec!(1020),
            years_to_call: dec!(12),
        }),
        ..ten_year_five_percent(dec!(5))
    };
    assert!(matches!(
        bonds::analyze_bond(&input),
        Err(TvmError::Validation(_))
    ));
}

#[test]
fn test_bond_input_from_json() {
    let input: BondInput = serde_json::from_str(
        r#"{"face_value": "1000", "coupon_rate_percent": "4",
            "years_to_maturity": "3", "discount_rate_percent": "4",
            "market_price": "990"}"#,
    )
    .unwrap();
    assert_eq!(input.frequency, CompoundingFrequency::SemiAnnually);
    let out = bonds::analyze_bond(&input).unwrap().result;
    assert_close(out.price, dec!(1000), dec!(0.00000001));
}

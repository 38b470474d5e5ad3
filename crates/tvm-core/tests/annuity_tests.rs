use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tvm_core::annuity::valuation::{self, AnnuityInput, AnnuityKind};
use tvm_core::{time_value, CompoundingFrequency, TvmError};

fn monthly_input(kind: AnnuityKind) -> AnnuityInput {
    AnnuityInput {
        payment: dec!(100),
        periods: 12,
        annual_rate_percent: dec!(12),
        frequency: CompoundingFrequency::Monthly,
        kind,
        inflation_percent: None,
        tax_percent: None,
    }
}

fn assert_close(actual: Decimal, expected: Decimal, tolerance: Decimal) {
    assert!(
        (actual - expected).abs() < tolerance,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn test_ordinary_annuity_reference_values() {
    // 1% per month for 12 months
    let out = valuation::value_annuity(&monthly_input(AnnuityKind::Ordinary))
        .unwrap()
        .result;
    assert_close(out.present_value, dec!(1125.5077473), dec!(0.000001));
    assert_close(out.future_value, dec!(1268.2503013), dec!(0.000001));
    assert_eq!(out.total_payments, dec!(1200));
    assert_eq!(out.period_rate, dec!(0.01));
}

#[test]
fn test_due_is_ordinary_times_one_plus_rate() {
    let ordinary = valuation::value_annuity(&monthly_input(AnnuityKind::Ordinary))
        .unwrap()
        .result;
    let due = valuation::value_annuity(&monthly_input(AnnuityKind::Due))
        .unwrap()
        .result;
    assert_close(due.present_value, ordinary.present_value * dec!(1.01), dec!(0.0000001));
    assert_close(due.future_value, ordinary.future_value * dec!(1.01), dec!(0.0000001));
}

#[test]
fn test_future_value_is_compounded_present_value() {
    for kind in [AnnuityKind::Ordinary, AnnuityKind::Due] {
        for (rate, periods) in [(dec!(0.005), 360u32), (dec!(0.08), 10), (dec!(-0.01), 24)] {
            let pv = valuation::present_value(dec!(250), rate, periods, kind).unwrap();
            let fv = valuation::future_value(dec!(250), rate, periods, kind).unwrap();
            let growth = time_value::compound(rate, periods).unwrap();
            assert_close(fv, pv * growth, dec!(0.00001));
        }
    }
}

#[test]
fn test_zero_rate_annuity() {
    let mut input = monthly_input(AnnuityKind::Due);
    input.annual_rate_percent = Decimal::ZERO;
    let out = valuation::value_annuity(&input).unwrap().result;
    assert_eq!(out.present_value, dec!(1200));
    assert_eq!(out.future_value, dec!(1200));
    assert_eq!(out.total_interest, Decimal::ZERO);
}

#[test]
fn test_schedule_samples_years_and_final_period() {
    let mut input = monthly_input(AnnuityKind::Ordinary);
    input.periods = 30;
    let out = valuation::value_annuity(&input).unwrap().result;
    let periods: Vec<u32> = out.schedule.iter().map(|p| p.period).collect();
    let years: Vec<u32> = out.schedule.iter().map(|p| p.year).collect();
    assert_eq!(periods, vec![12, 24, 30]);
    assert_eq!(years, vec![1, 2, 3]);
    let last = out.schedule.last().unwrap();
    assert_close(last.ending_balance, out.future_value, dec!(0.000001));
}

#[test]
fn test_inflation_switches_to_real_rate() {
    let mut input = monthly_input(AnnuityKind::Ordinary);
    input.inflation_percent = Some(dec!(3));
    let out = valuation::value_annuity(&input).unwrap().result;
    assert!(out.real_rate_applied);
    // (1.01 / 1.0025) - 1
    assert_close(out.period_rate, dec!(0.0074812968), dec!(0.0000001));
}

#[test]
fn test_after_tax_only_taxes_growth() {
    let mut input = monthly_input(AnnuityKind::Ordinary);
    input.tax_percent = Some(dec!(25));
    let out = valuation::value_annuity(&input).unwrap().result;
    let after_tax = out.after_tax_future_value.unwrap();
    assert_close(
        after_tax,
        out.future_value - (out.future_value - dec!(1200)) * dec!(0.25),
        dec!(0.0000001),
    );
}

#[test]
fn test_missing_payment_is_insufficient_not_error() {
    let mut input = monthly_input(AnnuityKind::Ordinary);
    input.payment = Decimal::ZERO;
    let result = valuation::value_annuity(&input).unwrap();
    assert!(result.result.insufficient_input);
    assert_eq!(result.result.present_value, Decimal::ZERO);
    assert!(result.result.schedule.is_empty());
    assert_eq!(result.warnings.len(), 1);
}

#[test]
fn test_tax_outside_range_is_rejected() {
    let mut input = monthly_input(AnnuityKind::Ordinary);
    input.tax_percent = Some(dec!(120));
    match valuation::value_annuity(&input) {
        Err(TvmError::Validation(errors)) => assert!(errors.contains("tax_percent")),
        other => panic!("Expected validation error, got {other:?}"),
    }
}

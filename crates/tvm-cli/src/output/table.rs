use colored::Colorize;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::str::FromStr;
use tabled::{builder::Builder, Table};

/// Decimal places shown in tables. JSON and CSV keep full precision.
const DISPLAY_DP: u32 = 4;

/// Format output as tables using the tabled crate.
///
/// Scalar result fields go into one Field/Value table; each array of
/// objects in the result (yearly points, schedules, cash flows) gets its
/// own table underneath.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result_table(result, map);
            } else {
                print_flat_object(map);
            }
        }
        Value::Array(arr) => {
            print_array_table(arr);
        }
        _ => {
            println!("{}", value);
        }
    }
}

fn print_result_table(result: &Value, envelope: &Map<String, Value>) {
    if let Value::Object(res_map) = result {
        print_flat_object(res_map);

        for (key, val) in res_map {
            if let Value::Array(rows) = val {
                if rows.iter().any(Value::is_object) {
                    println!("\n{}", key.bold());
                    print_array_table(rows);
                }
            }
        }
    } else {
        print_flat_object(envelope);
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\n{}", "Warnings:".yellow());
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_flat_object(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        if is_row_array(val) {
            continue;
        }
        builder.push_record([key.as_str(), &format_value(val)]);
    }
    let table = Table::from(builder);
    println!("{}", table);
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        let table = Table::from(builder);
        println!("{}", table);
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

fn is_row_array(value: &Value) -> bool {
    matches!(value, Value::Array(rows) if rows.iter().any(Value::is_object))
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => round_for_display(s),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "N/A".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| format!("{k}: {}", format_value(v)))
            .collect::<Vec<_>>()
            .join(", "),
    }
}

/// Decimals arrive as strings; shorten them for the terminal.
fn round_for_display(raw: &str) -> String {
    match Decimal::from_str(raw) {
        Ok(d) => d.round_dp(DISPLAY_DP).normalize().to_string(),
        Err(_) => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decimal_strings_are_rounded() {
        assert_eq!(format_value(&json!("1268.2503013196972")), "1268.2503");
        assert_eq!(format_value(&json!("1000.000000")), "1000");
        assert_eq!(format_value(&json!("semi_annually")), "semi_annually");
    }

    #[test]
    fn test_undefined_values_render_as_na() {
        assert_eq!(format_value(&Value::Null), "N/A");
    }

    #[test]
    fn test_tagged_enums_render_inline() {
        let irr = json!({"status": "did_not_converge", "reason": "no_sign_change", "iterations": 0});
        let shown = format_value(&irr);
        assert!(shown.contains("status: did_not_converge"));
    }

    #[test]
    fn test_row_arrays_detected() {
        assert!(is_row_array(&json!([{"period": 1}])));
        assert!(!is_row_array(&json!(["a", "b"])));
        assert!(!is_row_array(&json!("x")));
    }
}

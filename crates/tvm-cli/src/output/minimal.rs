use serde_json::Value;

/// Headline field per calculator, first match wins.
const HEADLINE_KEYS: [&str; 4] = ["final_balance", "present_value", "price", "irr_percent"];

/// Print only the headline answer, for shell pipelines.
///
/// An undefined headline (IRR that did not converge) prints `N/A`.
/// Results without a known headline fall back to their first field.
pub fn print_minimal(value: &Value) {
    println!("{}", headline(value));
}

fn headline(value: &Value) -> String {
    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let Value::Object(map) = result else {
        return format_minimal(result);
    };

    if let Some(found) = HEADLINE_KEYS.iter().find_map(|key| map.get(*key)) {
        return format_minimal(found);
    }

    match map.iter().next() {
        Some((key, val)) => format!("{}: {}", key, format_minimal(val)),
        None => String::new(),
    }
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "N/A".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

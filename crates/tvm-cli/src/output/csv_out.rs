use serde_json::{Map, Value};
use std::io;

/// Write output as CSV to stdout.
///
/// Scalar result fields come first as `field,value` records. Each array
/// of objects in the result follows as its own header row plus data rows,
/// so the writer runs in flexible mode.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(stdout.lock());

    if let Err(e) = write_value(&mut wtr, value) {
        eprintln!("CSV write error: {}", e);
    }
    let _ = wtr.flush();
}

fn write_value<W: io::Write>(wtr: &mut csv::Writer<W>, value: &Value) -> csv::Result<()> {
    match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Object(result)) => write_object(wtr, result),
            _ => write_object(wtr, map),
        },
        Value::Array(arr) => write_array(wtr, arr),
        _ => wtr.write_record([&format_csv_value(value)]),
    }
}

fn write_object<W: io::Write>(wtr: &mut csv::Writer<W>, map: &Map<String, Value>) -> csv::Result<()> {
    wtr.write_record(["field", "value"])?;
    let mut row_arrays = Vec::new();
    for (key, val) in map {
        match val {
            Value::Array(rows) if rows.iter().any(Value::is_object) => row_arrays.push(rows),
            _ => wtr.write_record([key.as_str(), &format_csv_value(val)])?,
        }
    }
    for rows in row_arrays {
        write_array(wtr, rows)?;
    }
    Ok(())
}

fn write_array<W: io::Write>(wtr: &mut csv::Writer<W>, arr: &[Value]) -> csv::Result<()> {
    let Some(Value::Object(first)) = arr.first() else {
        for item in arr {
            wtr.write_record([&format_csv_value(item)])?;
        }
        return Ok(());
    };

    let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
    wtr.write_record(&headers)?;

    for item in arr {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                .collect();
            wtr.write_record(&row)?;
        }
    }
    Ok(())
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

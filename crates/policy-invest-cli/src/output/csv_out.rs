use serde_json::Value;
use std::io;

/// Result fields holding the main per-row series, in priority order.
const SERIES_KEYS: [&str; 5] = ["cash_flows", "periods", "points", "cases", "matrix"];

/// Write output as CSV to stdout.
///
/// A result carrying a per-row series (cash flows, schedule periods, sweep
/// points, scenario cases) is written as that series; anything else becomes
/// field/value pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match result {
        Value::Object(map) => {
            let series = SERIES_KEYS
                .iter()
                .find_map(|k| map.get(*k).and_then(Value::as_array));
            match series {
                Some(rows) => write_array_csv(&mut wtr, rows),
                None => {
                    let _ = wtr.write_record(["field", "value"]);
                    for (key, val) in map {
                        let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
                    }
                }
            }
        }
        Value::Array(arr) => write_array_csv(&mut wtr, arr),
        _ => {
            let _ = wtr.write_record([&format_csv_value(result)]);
        }
    }

    let _ = wtr.flush();
}

fn write_array_csv<W: io::Write>(wtr: &mut csv::Writer<W>, arr: &[Value]) {
    match arr.first() {
        None => {}
        Some(Value::Object(first)) => {
            let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
            let _ = wtr.write_record(&headers);

            for item in arr {
                if let Value::Object(map) = item {
                    let row: Vec<String> = headers
                        .iter()
                        .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                        .collect();
                    let _ = wtr.write_record(&row);
                }
            }
        }
        // Two-way grid: each row is itself an array
        Some(Value::Array(_)) => {
            for item in arr {
                if let Value::Array(cells) = item {
                    let row: Vec<String> = cells.iter().map(format_csv_value).collect();
                    let _ = wtr.write_record(&row);
                }
            }
        }
        Some(_) => {
            for item in arr {
                let _ = wtr.write_record([&format_csv_value(item)]);
            }
        }
    }
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_written_as_rows() {
        let rows = serde_json::json!([
            {"year": 1, "net_cash_flow": 200.0},
            {"year": 2, "net_cash_flow": 210.5}
        ]);
        let mut wtr = csv::Writer::from_writer(Vec::new());
        write_array_csv(&mut wtr, rows.as_array().unwrap());
        let text = String::from_utf8(wtr.into_inner().unwrap()).unwrap();
        assert_eq!(text, "net_cash_flow,year\n200.0,1\n210.5,2\n");
    }
}

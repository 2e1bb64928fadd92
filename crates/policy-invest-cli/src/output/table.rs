use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

/// Format output as tables: scalar fields first, then one table per series
/// (cash flows, DSCR rows, schedule periods, sweep points, scenario cases).
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result_table(result, map);
            } else {
                print_object(None, map);
            }
        }
        Value::Array(arr) => print_array_table(None, arr),
        _ => println!("{}", value),
    }
}

fn print_result_table(result: &Value, envelope: &Map<String, Value>) {
    match result {
        Value::Object(res_map) => print_object(None, res_map),
        other => println!("{}", format_value(other)),
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
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

/// Scalars and small objects go in a Field/Value table; arrays of objects
/// and nested records are printed after it under their own heading.
fn print_object(title: Option<&str>, map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    let mut series: Vec<(String, &Vec<Value>)> = Vec::new();
    let mut records: Vec<(String, &Map<String, Value>)> = Vec::new();

    for (key, val) in map {
        let name = qualified(title, key);
        match val {
            Value::Array(arr) if arr.first().is_some_and(Value::is_object) => {
                series.push((name, arr));
            }
            Value::Object(inner) if inner.values().any(is_nested) => {
                records.push((name, inner));
            }
            _ => builder.push_record([key.as_str(), &format_value(val)]),
        }
    }

    if let Some(t) = title {
        println!("\n{}", t);
    }
    println!("{}", Table::from(builder));

    for (name, inner) in records {
        print_object(Some(&name), inner);
    }
    for (name, arr) in series {
        print_array_table(Some(&name), arr);
    }
}

fn is_nested(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

fn qualified(prefix: Option<&str>, key: &str) -> String {
    match prefix {
        Some(p) => format!("{}.{}", p, key),
        None => key.to_string(),
    }
}

fn print_array_table(title: Option<&str>, arr: &[Value]) {
    if let Some(t) = title {
        println!("\n{}", t);
    }
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first
            .iter()
            .filter(|(_, v)| !is_nested(v))
            .map(|(k, _)| k.clone())
            .collect();
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

        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => format!("{:.2}", f),
            _ => n.to_string(),
        },
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(&serde_json::json!(1.23456)), "1.23");
        assert_eq!(format_value(&serde_json::json!(null)), "-");
        assert_eq!(format_value(&serde_json::json!([1, 2])), "1, 2");
    }
}

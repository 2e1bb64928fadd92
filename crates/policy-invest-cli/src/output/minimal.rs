use serde_json::Value;

/// Headline value per command, tried in order.
const HEADLINE_POINTERS: [&str; 8] = [
    "/grade/letter",
    "/probability_weighted_npv",
    "/base_case_value",
    "/base_npv",
    "/npv",
    "/irr",
    "/total_interest",
    "/rate",
];

/// Print just the headline value of the output, falling back to the first
/// field of the result object.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    for pointer in HEADLINE_POINTERS {
        if let Some(val) = result_obj.pointer(pointer) {
            if !val.is_null() {
                println!("{}", format_minimal(val));
                return;
            }
        }
    }

    if let Value::Object(map) = result_obj {
        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    println!("{}", format_minimal(result_obj));
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => format!("{:.2}", f),
            _ => n.to_string(),
        },
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

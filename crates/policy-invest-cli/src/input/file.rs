use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

/// Read a JSON or YAML file (by extension) and deserialise into a typed struct.
pub fn read_input<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;

    let value: T = if is_yaml(&canonical) {
        serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?
    } else {
        serde_json::from_str(&contents)
            .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?
    };
    Ok(value)
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

/// Resolve and validate the path, preventing directory traversal.
fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let canonical = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    if !canonical.exists() {
        return Err(format!("File not found: {}", canonical.display()).into());
    }

    if !canonical.is_file() {
        return Err(format!("Not a file: {}", canonical.display()).into());
    }

    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use policy_invest_core::input::InvestmentInput;

    #[test]
    fn test_yaml_and_json_inputs_agree() {
        let dir = std::env::temp_dir();
        let yaml_path = dir.join("pia_input_test.yaml");
        let json_path = dir.join("pia_input_test.json");
        fs::write(
            &yaml_path,
            "initial_investment: 1000\nrevenue: 500\noperating_profit_rate: 40\ndiscount_rate: 10\nhorizon_years: 3\n",
        )
        .unwrap();
        fs::write(
            &json_path,
            r#"{"initial_investment":1000,"revenue":500,"operating_profit_rate":40,"discount_rate":10,"horizon_years":3}"#,
        )
        .unwrap();

        let from_yaml: InvestmentInput = read_input(yaml_path.to_str().unwrap()).unwrap();
        let from_json: InvestmentInput = read_input(json_path.to_str().unwrap()).unwrap();
        assert_eq!(from_yaml, from_json);
    }

    #[test]
    fn test_missing_file() {
        let err = read_input::<InvestmentInput>("/nonexistent/pia.json").unwrap_err();
        assert!(err.to_string().starts_with("File not found"));
    }
}

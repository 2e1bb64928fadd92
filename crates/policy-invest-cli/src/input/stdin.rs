use serde_json::Value;
use std::io::{self, Read};

/// Read piped input from stdin as JSON, or as YAML when it is not JSON.
/// Returns None if stdin is a TTY (interactive) or empty.
pub fn read_stdin() -> Result<Option<Value>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    parse_piped(&buffer)
}

fn parse_piped(buffer: &str) -> Result<Option<Value>, Box<dyn std::error::Error>> {
    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    match serde_json::from_str(trimmed) {
        Ok(value) => Ok(Some(value)),
        Err(json_err) => serde_yaml::from_str::<Value>(trimmed)
            .map(Some)
            .map_err(|_| format!("stdin is neither JSON nor YAML: {}", json_err).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_piped() {
        assert_eq!(parse_piped("  \n").unwrap(), None);
        let json = parse_piped(r#"{"horizon_years": 3}"#).unwrap().unwrap();
        let yaml = parse_piped("horizon_years: 3\n").unwrap().unwrap();
        assert_eq!(json, yaml);
    }
}

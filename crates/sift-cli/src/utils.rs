use std::{
    fmt::Display,
    io::Read,
    sync::{LazyLock, RwLock},
};

use nu_ansi_term::Color;
use sift_filter::FilterInput;

use crate::error::CliResult;

pub static COLOR: LazyLock<RwLock<bool>> = LazyLock::new(|| RwLock::new(true));

pub fn set_color(enabled: bool) {
    let mut color = COLOR.write().unwrap_or_else(|poisoned| poisoned.into_inner());
    *color = enabled;
}

pub struct Colored<T: Display>(pub Color, pub T);

impl<T: Display> Display for Colored<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let color = COLOR.read().map(|c| *c).unwrap_or(true);
        if color {
            write!(f, "{}", self.0.prefix())?;
            self.1.fmt(f)?;
            write!(f, "{}", self.0.suffix())
        } else {
            self.1.fmt(f)
        }
    }
}

/// Reads request input from the argument, or from stdin when it is `-`.
pub fn read_input(raw: &str, json: bool) -> CliResult<FilterInput> {
    let raw = if raw == "-" {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        raw.to_string()
    };
    parse_input(raw.trim(), json)
}

pub fn parse_input(raw: &str, json: bool) -> CliResult<FilterInput> {
    if json {
        let value: serde_json::Value = serde_json::from_str(raw)?;
        Ok(FilterInput::from_json(value)?)
    } else {
        Ok(FilterInput::from_query_str(raw))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::CliError;

    #[test]
    fn test_parse_query_string_input() {
        let input = parse_input("name=Alice&status=", false).unwrap();
        assert_eq!(input.get("name"), Some(&json!("Alice")));
        assert_eq!(input.len(), 1);
    }

    #[test]
    fn test_parse_json_input() {
        let input = parse_input(r#"{"customer_id": 5}"#, true).unwrap();
        assert_eq!(input.get("customer_id"), Some(&json!(5)));
    }

    #[test]
    fn test_parse_invalid_json() {
        assert!(matches!(
            parse_input("{nope", true),
            Err(CliError::Json(_))
        ));
    }

    #[test]
    fn test_colored_plain() {
        set_color(false);
        assert_eq!(Colored(Color::Red, "x").to_string(), "x");
        set_color(true);
    }
}

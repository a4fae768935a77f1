//! Line-oriented input and output of `taskrail submit`.
//!
//! One JSON object per input line; blank lines and `#` comments are skipped.
//! One JSON report per processed line goes to stdout.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SubmitLine {
    #[serde(rename = "type")]
    pub task_type: String,
    #[serde(default)]
    pub data: JsonValue,
    #[serde(default)]
    pub metadata: JsonValue,
}

pub fn parse_line(line: &str) -> Result<Option<SubmitLine>, serde_json::Error> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    serde_json::from_str(trimmed).map(Some)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LineReport {
    Submitted { line: usize, id: String },
    Unconfirmed { line: usize },
    Invalid { line: usize, violations: Vec<String> },
    Skipped { line: usize },
    Malformed { line: usize, error: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blank_and_comment_lines_are_skipped() {
        assert_eq!(parse_line("   ").unwrap(), None);
        assert_eq!(parse_line("# seed data").unwrap(), None);
    }

    #[test]
    fn payloads_default_to_null() {
        let line = parse_line(r#" {"type": "Echo"} "#).unwrap().unwrap();
        assert_eq!(line.task_type, "Echo");
        assert!(line.data.is_null());
        assert!(line.metadata.is_null());
    }

    #[test]
    fn missing_type_is_an_error() {
        assert!(parse_line(r#"{"data": {}}"#).is_err());
    }

    #[test]
    fn reports_are_tagged_by_status() {
        let report = LineReport::Invalid {
            line: 3,
            violations: vec!["nameParam required".into()],
        };
        assert_eq!(
            serde_json::to_value(report).unwrap(),
            json!({"status": "invalid", "line": 3, "violations": ["nameParam required"]})
        );
    }
}

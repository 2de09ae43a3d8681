#![forbid(unsafe_code)]

//! Optional JSON auto-reformatting.
//!
//! `jq`-less people pipe compact JSON at their pager all the time. When the
//! whole stream parses as a single JSON document, we can pretty-print it
//! before highlighting kicks in.

use std::sync::Arc;

use tracing::debug;

use crate::line::Line;

/// Pretty-print the input if it is one JSON document, or `None` to leave it
/// alone.
#[must_use]
pub fn reformat_json(lines: &[Arc<Line>]) -> Option<Vec<String>> {
    if lines.is_empty() {
        return None;
    }

    let joined: String = lines
        .iter()
        .map(|line| line.raw())
        .collect::<Vec<&str>>()
        .join("\n");

    let trimmed = joined.trim_start();
    if !trimmed.starts_with('{') && !trimmed.starts_with('[') {
        // Not even trying to be JSON
        return None;
    }

    let value: serde_json::Value = match serde_json::from_str(&joined) {
        Ok(value) => value,
        Err(error) => {
            debug!("Input is not JSON, leaving it alone: {error}");
            return None;
        }
    };

    let pretty = match serde_json::to_string_pretty(&value) {
        Ok(pretty) => pretty,
        Err(error) => {
            debug!("Pretty-printing JSON failed: {error}");
            return None;
        }
    };

    Some(pretty.lines().map(String::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines_of(text: &str) -> Vec<Arc<Line>> {
        text.lines().map(|line| Arc::new(Line::new(line))).collect()
    }

    #[test]
    fn compact_object_gets_expanded() {
        let result = reformat_json(&lines_of("{\"a\":1,\"b\":[2,3]}")).unwrap();
        assert!(result.len() > 1);
        assert_eq!(result[0], "{");
        assert_eq!(result.last().unwrap(), "}");
    }

    #[test]
    fn arrays_work_too() {
        let result = reformat_json(&lines_of("[1,2,3]")).unwrap();
        assert_eq!(result[0], "[");
    }

    #[test]
    fn multi_line_json_works() {
        let result = reformat_json(&lines_of("{\"a\":\n1}"));
        assert!(result.is_some());
    }

    #[test]
    fn non_json_is_left_alone() {
        assert!(reformat_json(&lines_of("hello world")).is_none());
        assert!(reformat_json(&lines_of("{not json}")).is_none());
        assert!(reformat_json(&lines_of("")).is_none());
    }

    #[test]
    fn trailing_garbage_is_not_json() {
        assert!(reformat_json(&lines_of("{\"a\":1} extra")).is_none());
    }
}

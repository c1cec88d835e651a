//! Record line formats
//!
//! Turns one `(tag, time, record)` into one line of chunk payload.

use std::fmt::Write as _;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

/// Key read by the `single_value` format
const MESSAGE_KEY: &str = "message";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LineFormat {
    /// `time<TAB>tag<TAB>json`
    #[default]
    OutFile,
    /// `json`
    Json,
    /// `key:value<TAB>key:value`
    Ltsv,
    /// value of the `message` key
    SingleValue,
}

impl FromStr for LineFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "out_file" => Ok(Self::OutFile),
            "json" => Ok(Self::Json),
            "ltsv" => Ok(Self::Ltsv),
            "single_value" => Ok(Self::SingleValue),
            other => anyhow::bail!(
                "unknown format '{}'. Supported: out_file, json, ltsv, single_value",
                other
            ),
        }
    }
}

impl LineFormat {
    /// Format one record, newline included
    pub fn format(&self, tag: &str, time: &DateTime<Utc>, record: &Map<String, Value>) -> String {
        let mut line = match self {
            Self::OutFile => format!(
                "{}\t{}\t{}",
                time.to_rfc3339_opts(SecondsFormat::Secs, false),
                tag,
                Value::Object(record.clone())
            ),
            Self::Json => Value::Object(record.clone()).to_string(),
            Self::Ltsv => {
                let mut out = String::new();
                for (i, (key, value)) in record.iter().enumerate() {
                    if i > 0 {
                        out.push('\t');
                    }
                    let _ = write!(out, "{}:{}", key, plain(value));
                }
                out
            }
            Self::SingleValue => record.get(MESSAGE_KEY).map(plain).unwrap_or_default(),
        };
        line.push('\n');
        line
    }
}

fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2016, 1, 1, 12, 0, 0).unwrap()
    }

    fn record(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_out_file_format() {
        let line = LineFormat::OutFile.format("test", &time(), &record(json!({"a": 1})));
        assert_eq!(line, "2016-01-01T12:00:00+00:00\ttest\t{\"a\":1}\n");
    }

    #[test]
    fn test_json_format() {
        let line = LineFormat::Json.format("test", &time(), &record(json!({"a": 2})));
        assert_eq!(line, "{\"a\":2}\n");
    }

    #[test]
    fn test_ltsv_format() {
        let line = LineFormat::Ltsv.format("test", &time(), &record(json!({"a": 1, "b": "x"})));
        assert_eq!(line, "a:1\tb:x\n");
    }

    #[test]
    fn test_single_value_format() {
        let line = LineFormat::SingleValue.format(
            "test",
            &time(),
            &record(json!({"message": "hello", "a": 1})),
        );
        assert_eq!(line, "hello\n");

        let line = LineFormat::SingleValue.format("test", &time(), &record(json!({"a": 1})));
        assert_eq!(line, "\n");
    }

    #[test]
    fn test_parse_format() {
        assert_eq!("out_file".parse::<LineFormat>().unwrap(), LineFormat::OutFile);
        assert_eq!("ltsv".parse::<LineFormat>().unwrap(), LineFormat::Ltsv);
        assert!("csv".parse::<LineFormat>().is_err());
    }
}

//! JSON writer for test outcome records.
//!
//! Status labels are lowercase; durations are whole milliseconds.

use std::io::Write;

use serde::Serialize;

use super::{Report, TestRecord, TestStatus};

#[derive(Serialize)]
struct JsonReport<'a> {
    passed: usize,
    failed: usize,
    skipped: usize,
    tests: Vec<JsonTest<'a>>,
}

#[derive(Serialize)]
struct JsonTest<'a> {
    name: &'a str,
    status: &'static str,
    duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
}

impl<'a> From<&'a Report> for JsonReport<'a> {
    fn from(report: &'a Report) -> Self {
        Self {
            passed: report.passed(),
            failed: report.failed(),
            skipped: report.skipped(),
            tests: report.records().iter().map(JsonTest::from).collect(),
        }
    }
}

impl<'a> From<&'a TestRecord> for JsonTest<'a> {
    fn from(record: &'a TestRecord) -> Self {
        let status = record.status();
        Self {
            name: record.full_name(),
            status: status.label(),
            duration_ms: u64::try_from(record.duration().as_millis()).unwrap_or(u64::MAX),
            reason: status.skip_reason(),
            message: match status {
                TestStatus::Failed { message } => Some(message),
                _ => None,
            },
        }
    }
}

/// Serialize `report` into `writer`.
///
/// # Examples
/// ```rust
/// use std::time::Duration;
/// use bdd_suite_harness::report::{json, Report, TestRecord, TestStatus};
///
/// let mut report = Report::default();
/// report.push(TestRecord::new("scenario - step", TestStatus::Passed, Duration::ZERO));
/// let mut buffer = Vec::new();
/// json::write(&mut buffer, &report).unwrap();
/// let output = String::from_utf8(buffer).unwrap();
/// assert!(output.contains("\"status\":\"passed\""));
/// ```
///
/// # Errors
/// Returns an error when serialization fails or the writer rejects output.
pub fn write<W: Write>(writer: &mut W, report: &Report) -> serde_json::Result<()> {
    serde_json::to_writer(writer, &JsonReport::from(report))
}

/// Render `report` as a JSON string.
///
/// # Errors
/// Returns an error when serialization fails.
pub fn to_string(report: &Report) -> serde_json::Result<String> {
    serde_json::to_string(&JsonReport::from(report))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn skipped_records_carry_reason_only() {
        let mut report = Report::default();
        report.push(TestRecord::new(
            "F - S - Given x",
            TestStatus::Skipped {
                reason: "only".into(),
            },
            Duration::from_millis(3),
        ));
        let Ok(json) = to_string(&report) else {
            panic!("report should serialize");
        };
        let Ok(value) = serde_json::from_str::<serde_json::Value>(&json) else {
            panic!("output should be valid JSON");
        };
        assert_eq!(value["skipped"], 1);
        assert_eq!(value["tests"][0]["reason"], "only");
        assert_eq!(value["tests"][0]["duration_ms"], 3);
        assert!(value["tests"][0].get("message").is_none());
    }
}

//! Response payload returned by the backend and its rendering policy

use crate::dom::escape_html;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Outcome of a single test case
///
/// Only `test`, `result_str` and `instr_count` drive rendering; the processor
/// snapshot fields are kept for callers that want to inspect them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    /// Whether the test passed
    pub test: bool,
    /// Human readable message
    pub result_str: String,
    /// Instructions executed for this test case
    pub instr_count: u64,
    #[serde(default)]
    pub buffer: String,
    #[serde(default)]
    pub pc: u64,
    #[serde(default)]
    pub registers: Vec<i64>,
    #[serde(default)]
    pub labels: HashMap<String, u64>,
}

impl TestResult {
    pub fn new(test: bool, result_str: &str, instr_count: u64) -> Self {
        Self {
            test,
            result_str: result_str.to_string(),
            instr_count,
            buffer: String::new(),
            pc: 0,
            registers: Vec::new(),
            labels: HashMap::new(),
        }
    }

    /// One-line summary, e.g. `✓ ok (3 instruction(s))`
    pub fn summary(&self) -> String {
        let mark = if self.test { '✓' } else { '✗' };
        format!("{} {} ({} instruction(s))", mark, self.result_str, self.instr_count)
    }
}

/// `tests_results` is either structured per-test outcomes or a preformatted string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TestsResults {
    Cases(Vec<TestResult>),
    Text(String),
}

/// How rendered test results should be written into the document
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    Markup(String),
    Text(String),
}

impl TestsResults {
    /// Render according to the display policy: one paragraph per case in
    /// order, or the string verbatim.
    pub fn render(&self) -> Rendered {
        match self {
            TestsResults::Cases(cases) => Rendered::Markup(
                cases
                    .iter()
                    .map(|c| format!("<p>{}</p>", escape_html(&c.summary())))
                    .collect(),
            ),
            TestsResults::Text(text) => Rendered::Text(text.clone()),
        }
    }

    pub fn passed(&self) -> Option<usize> {
        match self {
            TestsResults::Cases(cases) => Some(cases.iter().filter(|c| c.test).count()),
            TestsResults::Text(_) => None,
        }
    }
}

/// JSON body returned by the submission endpoint
///
/// The three fields are independent: a field that is absent leaves its region
/// untouched, `null` clears it, and a field of the wrong shape is skipped
/// without affecting the others.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResponsePayload {
    pub code_content: Option<String>,
    pub end_state: Option<String>,
    pub tests_results: Option<TestsResults>,
}

impl ResponsePayload {
    /// Parse a raw response body. Anything other than a JSON object is a
    /// payload error; missing or malformed fields are not.
    pub fn parse(raw: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(raw)?;
        let mut fields = match value {
            serde_json::Value::Object(fields) => fields,
            other => {
                return Err(Error::Payload(format!("expected a JSON object, got {}", kind(&other))))
            }
        };
        Ok(Self {
            code_content: fields.remove("code_content").and_then(|v| text_field("code_content", v)),
            end_state: fields.remove("end_state").and_then(|v| text_field("end_state", v)),
            tests_results: fields.remove("tests_results").and_then(results_field),
        })
    }
}

/// Text regions accept strings and scalars; `null` clears the region.
fn text_field(name: &str, value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => Some(String::new()),
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        other => {
            log::warn!("ignoring {}: expected a string, got {}", name, kind(&other));
            None
        }
    }
}

fn results_field(value: serde_json::Value) -> Option<TestsResults> {
    match value {
        serde_json::Value::Array(_) => match serde_json::from_value(value) {
            Ok(cases) => Some(TestsResults::Cases(cases)),
            Err(e) => {
                log::warn!("ignoring tests_results: {}", e);
                None
            }
        },
        other => text_field("tests_results", other).map(TestsResults::Text),
    }
}

fn kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passing_case_renders_check_paragraph() {
        let res = TestsResults::Cases(vec![TestResult::new(true, "ok", 3)]);
        assert_eq!(res.render(), Rendered::Markup("<p>✓ ok (3 instruction(s))</p>".into()));
    }

    #[test]
    fn cases_render_in_order_without_separator() {
        let res = TestsResults::Cases(vec![
            TestResult::new(true, "first", 1),
            TestResult::new(false, "mismatch", 5),
        ]);
        assert_eq!(
            res.render(),
            Rendered::Markup(
                "<p>✓ first (1 instruction(s))</p><p>✗ mismatch (5 instruction(s))</p>".into()
            )
        );
        assert_eq!(res.passed(), Some(1));
    }

    #[test]
    fn empty_case_list_renders_nothing() {
        assert_eq!(TestsResults::Cases(vec![]).render(), Rendered::Markup(String::new()));
    }

    #[test]
    fn string_results_are_verbatim() {
        let p = ResponsePayload::parse(r#"{"tests_results": "2/2 passed"}"#).unwrap();
        assert_eq!(p.tests_results.unwrap().render(), Rendered::Text("2/2 passed".into()));
        assert!(p.code_content.is_none());
    }

    #[test]
    fn backend_snapshot_fields_are_accepted() {
        let raw = r#"{
            "code_content": "movi r1, 3",
            "end_state": "",
            "tests_results": [{
                "buffer": "", "instr_count": 4, "labels": {"loop": 2}, "pc": 3,
                "registers": [0, 3, 0, 0, 0, 0, 0, 0], "test": true, "result_str": "r1 = 3"
            }]
        }"#;
        let p = ResponsePayload::parse(raw).unwrap();
        match p.tests_results.unwrap() {
            TestsResults::Cases(cases) => {
                assert_eq!(cases[0].registers[1], 3);
                assert_eq!(cases[0].labels["loop"], 2);
                assert_eq!(cases[0].summary(), "✓ r1 = 3 (4 instruction(s))");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn non_object_bodies_are_payload_errors() {
        assert!(matches!(ResponsePayload::parse("<html>500</html>"), Err(Error::Payload(_))));
        assert!(matches!(ResponsePayload::parse("[1, 2]"), Err(Error::Payload(_))));
    }

    #[test]
    fn malformed_results_do_not_hide_other_fields() {
        let p = ResponsePayload::parse(
            r#"{"code_content": "halt", "end_state": "pc=1", "tests_results": [{"test": true, "result_str": "ok"}]}"#,
        )
        .unwrap();
        assert_eq!(p.code_content.as_deref(), Some("halt"));
        assert_eq!(p.end_state.as_deref(), Some("pc=1"));
        assert!(p.tests_results.is_none());
    }

    #[test]
    fn wrongly_shaped_text_field_is_skipped() {
        let p = ResponsePayload::parse(r#"{"code_content": {"lines": 2}, "end_state": 7}"#).unwrap();
        assert!(p.code_content.is_none());
        assert_eq!(p.end_state.as_deref(), Some("7"));
    }

    #[test]
    fn null_fields_clear_their_region() {
        let p = ResponsePayload::parse(r#"{"code_content": null, "tests_results": null}"#).unwrap();
        assert_eq!(p.code_content.as_deref(), Some(""));
        assert!(p.end_state.is_none());
        assert_eq!(p.tests_results.unwrap().render(), Rendered::Text(String::new()));
    }
}

//! Upload normalization: arbitrary uploaded JSON -> paired-dialogue examples.
//!
//! Records are accepted either bare or wrapped under `data`. Each record may
//! carry two transcripts, `input` (dialogue A) and `input_2` (dialogue B), as
//! arrays of loosely shaped messages. Field lookup order is fixed by the
//! tables below; anything that does not fit is skipped rather than rejected.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::schema::Task;

const PAYLOAD_FIELD: &str = "data";
const DIALOGUE_A_FIELD: &str = "input";
const DIALOGUE_B_FIELD: &str = "input_2";

const ROLE_FIELD: &str = "role";
const NAME_FIELD: &str = "name";
/// Roles with this prefix are tool calls; the tool `name` is the speaker.
const FUNCTION_ROLE_PREFIX: &str = "function_";

/// Message text is the first of these that is non-empty after trimming.
const TEXT_FIELDS: [&str; 3] = ["data", "content", "text"];

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Turn {
    pub speaker: String,
    pub text: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Example {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialogue_a: Option<Vec<Turn>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialogue_b: Option<Vec<Turn>>,
}

/// Outcome of parsing one uploaded file.
#[derive(Clone, Debug, PartialEq)]
pub enum Parsed {
    Content(Value),
    Malformed,
}

impl Parsed {
    /// Stored form of the file content; a literal `null` counts as nothing.
    pub fn into_content(self) -> Option<Value> {
        match self {
            Parsed::Content(Value::Null) | Parsed::Malformed => None,
            Parsed::Content(v) => Some(v),
        }
    }

    pub fn examples(&self) -> Vec<Example> {
        match self {
            Parsed::Content(v) => normalize(v),
            Parsed::Malformed => Vec::new(),
        }
    }
}

pub fn parse_upload(bytes: &[u8]) -> Parsed {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(v) => Parsed::Content(v),
        Err(e) => {
            debug!(error = %e, "upload is not valid JSON");
            Parsed::Malformed
        }
    }
}

pub fn normalize(value: &Value) -> Vec<Example> {
    let records: Vec<&Value> = match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };
    records.into_iter().filter_map(normalize_record).collect()
}

/// All examples of a task, file by file in upload order.
pub fn examples_for_task(task: &Task) -> Vec<Example> {
    task.files
        .iter()
        .filter_map(|f| f.content.as_ref())
        .flat_map(normalize)
        .collect()
}

/// What an annotator sees for an uploaded file before opening the task.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileSummary {
    pub id: Uuid,
    pub name: String,
    pub size: u64,
    pub parsed: bool,
    pub examples: usize,
}

impl FileSummary {
    pub fn of_task(task: &Task) -> Vec<FileSummary> {
        task.files
            .iter()
            .map(|f| FileSummary {
                id: f.id,
                name: f.name.clone(),
                size: f.size,
                parsed: f.content.is_some(),
                examples: f.content.as_ref().map(|c| normalize(c).len()).unwrap_or(0),
            })
            .collect()
    }
}

fn normalize_record(item: &Value) -> Option<Example> {
    let payload = match item.get(PAYLOAD_FIELD) {
        Some(inner) if !inner.is_null() => inner,
        _ => item,
    };
    let example = Example {
        dialogue_a: dialogue(payload.get(DIALOGUE_A_FIELD)),
        dialogue_b: dialogue(payload.get(DIALOGUE_B_FIELD)),
    };
    (example.dialogue_a.is_some() || example.dialogue_b.is_some()).then_some(example)
}

fn dialogue(messages: Option<&Value>) -> Option<Vec<Turn>> {
    let turns: Vec<Turn> = messages?.as_array()?.iter().filter_map(turn).collect();
    (!turns.is_empty()).then_some(turns)
}

fn turn(message: &Value) -> Option<Turn> {
    let text = message_text(message)?;
    Some(Turn {
        speaker: resolve_speaker(message),
        text,
    })
}

pub(crate) fn resolve_speaker(message: &Value) -> String {
    let role = message.get(ROLE_FIELD).and_then(Value::as_str);
    let name = message.get(NAME_FIELD).and_then(Value::as_str);

    let preferred = match (role, name) {
        (Some(r), Some(n)) if r.starts_with(FUNCTION_ROLE_PREFIX) && !n.is_empty() => n,
        _ => role.or(name).unwrap_or(""),
    };
    // keep only the last segment of dotted names
    let unqualified = preferred.rsplit('.').next().unwrap_or(preferred);
    unqualified.trim().to_string()
}

fn message_text(message: &Value) -> Option<String> {
    TEXT_FIELDS
        .iter()
        .filter_map(|field| message.get(*field))
        .filter_map(coerce_text)
        .map(|s| s.trim().to_string())
        .find(|s| !s.is_empty())
}

fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn turn(speaker: &str, text: &str) -> Turn {
        Turn { speaker: speaker.into(), text: text.into() }
    }

    #[test]
    fn test_single_object_same_as_one_element_array() {
        let record = json!({"input": [{"role": "user", "content": "hi"}]});
        let wrapped = json!([record.clone()]);
        assert_eq!(normalize(&record), normalize(&wrapped));
        assert_eq!(normalize(&record).len(), 1);
    }

    #[test]
    fn test_null_yields_nothing() {
        assert!(normalize(&Value::Null).is_empty());
    }

    #[test]
    fn test_payload_under_data() {
        let v = json!([
            {"data": {"input": [{"role": "user", "content": "q"}], "input_2": [{"role": "assistant", "text": "a"}]}},
            {"input": [{"role": "user", "content": "bare"}]}
        ]);
        let out = normalize(&v);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].dialogue_a, Some(vec![turn("user", "q")]));
        assert_eq!(out[0].dialogue_b, Some(vec![turn("assistant", "a")]));
        assert_eq!(out[1].dialogue_a, Some(vec![turn("user", "bare")]));
        assert_eq!(out[1].dialogue_b, None);
    }

    #[test]
    fn test_whitespace_only_dialogue_is_absent() {
        let v = json!({
            "input": [{"role": "user", "content": "   "}, {"role": "bot", "text": "\n"}],
            "input_2": [{"role": "user", "content": "kept"}]
        });
        let out = normalize(&v);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].dialogue_a, None);
        assert_eq!(out[0].dialogue_b, Some(vec![turn("user", "kept")]));
    }

    #[test]
    fn test_record_without_dialogues_dropped() {
        let v = json!([
            {"input": [{"role": "user", "content": ""}]},
            {"other": 1},
            {"input": "not an array"},
            {"input": [{"role": "user", "content": "x"}]}
        ]);
        let out = normalize(&v);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].dialogue_a, Some(vec![turn("user", "x")]));
    }

    #[test]
    fn test_speaker_resolution() {
        assert_eq!(
            resolve_speaker(&json!({"role": "function_lookup", "name": "get_weather"})),
            "get_weather"
        );
        assert_eq!(resolve_speaker(&json!({"role": "user"})), "user");
        assert_eq!(resolve_speaker(&json!({"role": "a.b.c"})), "c");
        assert_eq!(resolve_speaker(&json!({"role": "function_x", "name": ""})), "function_x");
        assert_eq!(resolve_speaker(&json!({"name": "tools.search"})), "search");
        assert_eq!(resolve_speaker(&json!({"role": 7})), "");
        assert_eq!(resolve_speaker(&json!({})), "");
    }

    #[test]
    fn test_text_priority_and_coercion() {
        let v = json!({"input": [
            {"role": "a", "data": "from data", "content": "from content"},
            {"role": "b", "data": null, "content": "  from content  "},
            {"role": "c", "data": "   ", "text": "from text"},
            {"role": "d", "content": 42},
            {"role": "e", "content": true}
        ]});
        let turns = normalize(&v)[0].dialogue_a.clone().unwrap();
        let texts: Vec<&str> = turns.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["from data", "from content", "from text", "42", "true"]);
    }

    #[test]
    fn test_order_preserved_without_dedup() {
        let rec = json!({"input": [{"role": "u", "content": "same"}]});
        let v = json!([rec.clone(), rec.clone(), {"input": [{"role": "u", "content": "last"}]}]);
        let out = normalize(&v);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0], out[1]);
        assert_eq!(out[2].dialogue_a.as_ref().unwrap()[0].text, "last");
    }

    #[test]
    fn test_odd_values_do_not_panic() {
        let values = [
            json!(1),
            json!("text"),
            json!(true),
            json!([null, 1, "x", [], {}]),
            json!({"data": 5}),
            json!({"data": {"input": [null, 1, "s", {"content": {"nested": true}}]}}),
        ];
        for v in &values {
            let _ = normalize(v);
        }
        let nested = normalize(&values[5]);
        assert_eq!(nested[0].dialogue_a.as_ref().unwrap()[0].text, r#"{"nested":true}"#);
    }

    #[test]
    fn test_parse_upload_tags_malformed() {
        assert_eq!(parse_upload(b"{broken"), Parsed::Malformed);
        assert!(parse_upload(b"{broken").examples().is_empty());
        assert_eq!(parse_upload(b"null").into_content(), None);
        assert!(matches!(parse_upload(b"[]"), Parsed::Content(_)));
    }

    #[test]
    fn test_example_wire_format() {
        let ex = Example { dialogue_a: Some(vec![turn("user", "hi")]), dialogue_b: None };
        assert_eq!(
            serde_json::to_value(&ex).unwrap(),
            json!({"dialogueA": [{"speaker": "user", "text": "hi"}]})
        );
    }
}

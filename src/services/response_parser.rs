//! Best-effort recovery of a JSON array of question records from raw model
//! output that may be wrapped in prose or markdown fences, or cut off mid-way.
//!
//! Tiers are tried in order and the first success wins:
//! 1. the whole response is a JSON array;
//! 2. the slice from the first `[` to the last `]` is a JSON array;
//! 3. repair: from the first `[`, drop trailing whitespace and one trailing
//!    comma, then close a single unterminated object with `}]`. If that still
//!    does not parse, the unterminated trailing object is dropped instead by
//!    cutting after the last `}` and closing the array.
//!
//! Nothing beyond closing (or dropping) one trailing object is attempted.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseTier {
    Direct,
    Sliced,
    Repaired,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecoveredRecords {
    pub tier: ParseTier,
    pub records: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecoveryError {
    #[error("Response is empty")]
    EmptyResponse,

    #[error("Response contains no JSON array")]
    NoArray,

    #[error("Could not repair truncated JSON array: {0}")]
    Unrepairable(String),
}

pub fn parse_records(raw: &str) -> Result<RecoveredRecords, RecoveryError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(RecoveryError::EmptyResponse);
    }

    if let Some(records) = parse_array(trimmed) {
        return Ok(RecoveredRecords {
            tier: ParseTier::Direct,
            records,
        });
    }

    let Some(first) = trimmed.find('[') else {
        return Err(RecoveryError::NoArray);
    };

    if let Some(last) = trimmed.rfind(']') {
        if first < last {
            if let Some(records) = parse_array(&trimmed[first..=last]) {
                return Ok(RecoveredRecords {
                    tier: ParseTier::Sliced,
                    records,
                });
            }
        }
    }

    repair_truncated(&trimmed[first..]).map(|records| RecoveredRecords {
        tier: ParseTier::Repaired,
        records,
    })
}

/// Never fails: unrecoverable output yields no records.
pub fn recover_records(raw: &str) -> Vec<Value> {
    parse_records(raw).map(|r| r.records).unwrap_or_default()
}

fn parse_array(candidate: &str) -> Option<Vec<Value>> {
    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Array(items)) => Some(items),
        _ => None,
    }
}

fn repair_truncated(from_bracket: &str) -> Result<Vec<Value>, RecoveryError> {
    let mut candidate = from_bracket.trim_end();
    if let Some(stripped) = candidate.strip_suffix(',') {
        candidate = stripped.trim_end();
    }

    let closed = format!("{}}}]", candidate);
    let close_error = match serde_json::from_str::<Value>(&closed) {
        Ok(Value::Array(items)) => return Ok(items),
        Ok(_) => "repaired text is not an array".to_string(),
        Err(e) => e.to_string(),
    };

    if let Some(last_brace) = candidate.rfind('}') {
        let cut = format!("{}]", &candidate[..=last_brace]);
        if let Some(items) = parse_array(&cut) {
            return Ok(items);
        }
    }

    Err(RecoveryError::Unrepairable(close_error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const CLEAN: &str = r#"[
        {"question": "What do plants release?", "options": ["Oxygen", "Helium"], "correct_answer": "Oxygen", "explanation": "Photosynthesis releases O2."},
        {"question": "Where does it happen?", "options": ["Chloroplast", "Nucleus"], "correct_answer": "Chloroplast", "explanation": "In chloroplasts."}
    ]"#;

    #[test]
    fn clean_array_parses_directly() {
        let recovered = parse_records(CLEAN).expect("clean array should parse");

        assert_eq!(recovered.tier, ParseTier::Direct);
        assert_eq!(recovered.records.len(), 2);
    }

    #[test]
    fn prose_and_fences_are_sliced_away() {
        let noisy = format!(
            "Sure! Here is your quiz:\n```json\n{}\n```\nGood luck with your studies!",
            CLEAN
        );

        let clean = parse_records(CLEAN).expect("clean array should parse");
        let recovered = parse_records(&noisy).expect("noisy array should parse");

        assert_eq!(recovered.tier, ParseTier::Sliced);
        assert_eq!(recovered.records, clean.records);
    }

    #[test]
    fn wrapped_object_falls_back_to_inner_array() {
        let wrapped = r#"{"questions": [{"question": "Q", "options": ["a", "b"], "correct_answer": "a"}]}"#;

        let recovered = parse_records(wrapped).expect("inner array should parse");

        assert_eq!(recovered.tier, ParseTier::Sliced);
        assert_eq!(recovered.records[0]["question"], json!("Q"));
    }

    #[test]
    fn unterminated_last_object_is_closed() {
        let truncated = r#"[{"question": "Q1", "options": ["a", "b"], "correct_answer": "a"},
            {"question": "Q2", "options": ["c", "d"], "correct_answer": "d""#;

        let recovered = parse_records(truncated).expect("truncated array should be repaired");

        assert_eq!(recovered.tier, ParseTier::Repaired);
        assert_eq!(recovered.records.len(), 2);
        assert_eq!(recovered.records[1]["correct_answer"], json!("d"));
    }

    #[test]
    fn truncation_mid_value_keeps_complete_leading_records() {
        let truncated = r#"Here you go: [{"question": "Q1", "options": ["a", "b"], "correct_answer": "a", "explanation": "E1"},
            {"question": "Q2", "options": ["c", "d"], "correct_answer": "d", "explanation": "Because the pro"#;

        let recovered = parse_records(truncated).expect("leading record should survive");

        assert_eq!(recovered.tier, ParseTier::Repaired);
        assert_eq!(recovered.records.len(), 1);
        assert_eq!(recovered.records[0]["question"], json!("Q1"));
    }

    #[test]
    fn truncation_after_closed_options_array_keeps_leading_records() {
        let truncated = r#"[{"question": "Q1", "options": ["a", "b"], "correct_answer": "a"},
            {"question": "Q2", "options": ["c", "d"], "corr"#;

        let records = recover_records(truncated);

        assert_eq!(records.len(), 1);
    }

    #[test]
    fn trailing_comma_after_complete_object_is_dropped() {
        let truncated = r#"[{"question": "Q1", "options": ["a", "b"], "correct_answer": "a"},   "#;

        let records = recover_records(truncated);

        assert_eq!(records.len(), 1);
    }

    #[test]
    fn text_without_brackets_is_a_typed_failure_and_empty_recovery() {
        let prose = "I'm sorry, I cannot create a quiz about that topic.";

        assert_eq!(parse_records(prose), Err(RecoveryError::NoArray));
        assert!(recover_records(prose).is_empty());
    }

    #[test]
    fn blank_response_is_reported_as_empty() {
        assert_eq!(parse_records("  \n "), Err(RecoveryError::EmptyResponse));
    }

    #[test]
    fn hopeless_text_after_bracket_is_unrepairable() {
        let garbage = "[ this is not json at all";

        assert!(matches!(
            parse_records(garbage),
            Err(RecoveryError::Unrepairable(_))
        ));
        assert!(recover_records(garbage).is_empty());
    }

    #[test]
    fn empty_array_is_a_successful_parse_with_no_records() {
        let recovered = parse_records("[]").expect("empty array is valid");

        assert_eq!(recovered.tier, ParseTier::Direct);
        assert!(recovered.records.is_empty());
    }
}

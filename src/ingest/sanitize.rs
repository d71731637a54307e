//! Converts loosely typed feed records into [`Prompt`]s.
//!
//! The feed is edited by hand upstream, so individual records routinely
//! have missing fields, numbers encoded as strings, or nulls in odd places.
//! A bad record is dropped on its own; only an unusable envelope or a feed
//! with nothing valid left fails the whole batch.

use crate::error::NormalizeError;
use crate::models::{Prompt, PromptCollection};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Validates one record. Returns `None` when the record must be dropped.
pub fn sanitize(record: &Value) -> Option<Prompt> {
    let fields = record.as_object()?;

    let title = required_text(fields, "title")?;
    let prompt = required_text(fields, "prompt")?;
    let url_title = required_text(fields, "urlTitle")?;
    let id = fields.get("id").and_then(coerce_number)?;

    Some(Prompt {
        title,
        description: optional_text(fields, "description"),
        prompt,
        image: optional_text(fields, "image"),
        categories: fields.get("categories").and_then(string_list),
        how_to_use: optional_text(fields, "howToUse"),
        url_title,
        id,
        copied_count: fields.get("copiedCount").and_then(coerce_number),
        created_date: optional_text(fields, "createdDate"),
    })
}

/// Validates the envelope and sanitizes every record, keeping feed order.
pub fn normalize(parsed: &Value) -> Result<PromptCollection, NormalizeError> {
    let records = parsed
        .as_object()
        .and_then(|envelope| envelope.get("prompts"))
        .and_then(Value::as_array)
        .ok_or(NormalizeError::InvalidEnvelope)?;

    let prompts: Vec<Prompt> = records.iter().filter_map(sanitize).collect();
    let skipped = records.len() - prompts.len();

    if prompts.is_empty() {
        warn!(total = records.len(), "No valid prompts after sanitization");
        return Err(NormalizeError::NoValidRecords { total: records.len() });
    }

    if skipped > 0 {
        warn!(skipped, total = records.len(), "Skipped invalid prompt records");
    }
    debug!(count = prompts.len(), skipped, "Normalized prompt feed");

    Ok(PromptCollection { prompts })
}

fn required_text(fields: &Map<String, Value>, key: &str) -> Option<String> {
    let trimmed = fields.get(key)?.as_str()?.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}

fn optional_text(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields.get(key).and_then(Value::as_str).map(str::to_string)
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    let items = value.as_array()?;
    Some(items.iter().filter_map(Value::as_str).map(str::to_string).collect())
}

/// Accepts a JSON number or a string holding one. Anything non-finite is `None`.
fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            s.parse::<f64>().ok()?
        }
        _ => return None,
    };
    number.is_finite().then_some(number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal() -> Value {
        json!({ "title": "T", "prompt": "P", "urlTitle": "t", "id": 1 })
    }

    #[test]
    fn accepts_minimal_record() {
        let prompt = sanitize(&minimal()).unwrap();
        assert_eq!(prompt, Prompt::new("T", "P", "t", 1.0));
    }

    #[test]
    fn rejects_missing_or_blank_required_fields() {
        for key in ["title", "prompt", "urlTitle"] {
            let mut missing = minimal();
            missing.as_object_mut().unwrap().remove(key);
            assert!(sanitize(&missing).is_none(), "missing {}", key);

            let mut blank = minimal();
            blank[key] = json!("   ");
            assert!(sanitize(&blank).is_none(), "blank {}", key);

            let mut wrong_type = minimal();
            wrong_type[key] = json!(42);
            assert!(sanitize(&wrong_type).is_none(), "non-string {}", key);
        }
    }

    #[test]
    fn rejects_non_objects() {
        assert!(sanitize(&Value::Null).is_none());
        assert!(sanitize(&json!("title")).is_none());
        assert!(sanitize(&json!([minimal()])).is_none());
    }

    #[test]
    fn id_coercion() {
        let mut record = minimal();
        record["id"] = json!("7");
        assert_eq!(sanitize(&record).unwrap().id, 7.0);

        record["id"] = json!(" 12.5 ");
        assert_eq!(sanitize(&record).unwrap().id, 12.5);

        for bad in [json!("abc"), json!(""), json!("NaN"), json!("inf"), json!(null), json!(true)] {
            record["id"] = bad.clone();
            assert!(sanitize(&record).is_none(), "id {:?}", bad);
        }

        record.as_object_mut().unwrap().remove("id");
        assert!(sanitize(&record).is_none());
    }

    #[test]
    fn copied_count_degrades_to_absent() {
        let mut record = minimal();
        record["copiedCount"] = json!("15");
        assert_eq!(sanitize(&record).unwrap().copied_count, Some(15.0));

        record["copiedCount"] = json!("lots");
        let prompt = sanitize(&record).unwrap();
        assert_eq!(prompt.copied_count, None);

        record["copiedCount"] = json!({ "n": 1 });
        assert_eq!(sanitize(&record).unwrap().copied_count, None);
    }

    #[test]
    fn out_of_range_literals_are_not_finite() {
        let record: Value = serde_json::from_str(
            r#"{"title":"T","prompt":"P","urlTitle":"t","id":4,"copiedCount":1e400}"#,
        )
        .unwrap();
        let prompt = sanitize(&record).unwrap();
        assert_eq!(prompt.id, 4.0);
        assert_eq!(prompt.copied_count, None);

        let record: Value =
            serde_json::from_str(r#"{"title":"T","prompt":"P","urlTitle":"t","id":1e400}"#)
                .unwrap();
        assert!(sanitize(&record).is_none());
    }

    #[test]
    fn optional_fields_must_already_be_strings() {
        let mut record = minimal();
        record["description"] = json!("D");
        record["image"] = json!(3);
        record["howToUse"] = json!(["a", "b"]);
        record["createdDate"] = json!("2024-01-01");

        let prompt = sanitize(&record).unwrap();
        assert_eq!(prompt.description.as_deref(), Some("D"));
        assert_eq!(prompt.image, None);
        assert_eq!(prompt.how_to_use, None);
        assert_eq!(prompt.created_date.as_deref(), Some("2024-01-01"));
    }

    #[test]
    fn categories_keep_only_strings() {
        let mut record = minimal();
        record["categories"] = json!(["art", 1, null, "photo"]);
        assert_eq!(
            sanitize(&record).unwrap().categories,
            Some(vec!["art".to_string(), "photo".to_string()])
        );

        record["categories"] = json!("art");
        assert_eq!(sanitize(&record).unwrap().categories, None);
    }

    #[test]
    fn required_fields_are_trimmed() {
        let record = json!({ "title": "  T ", "prompt": "P\n", "urlTitle": " t", "id": 1 });
        let prompt = sanitize(&record).unwrap();
        assert_eq!(
            (prompt.title.as_str(), prompt.prompt.as_str(), prompt.url_title.as_str()),
            ("T", "P", "t")
        );
    }

    #[test]
    fn normalize_drops_invalid_records_in_order() {
        let feed = json!({ "prompts": [
            { "title": "A", "prompt": "a", "urlTitle": "a", "id": 1 },
            { "title": "", "prompt": "x", "urlTitle": "x", "id": 2 },
            "junk",
            { "title": "B", "prompt": "b", "urlTitle": "b", "id": "3" },
        ]});
        let collection = normalize(&feed).unwrap();
        let slugs: Vec<&str> = collection.prompts.iter().map(|p| p.url_title.as_str()).collect();
        assert_eq!(slugs, ["a", "b"]);
    }

    #[test]
    fn normalize_rejects_bad_envelopes() {
        for bad in [json!(null), json!([]), json!({ "items": [] }), json!({ "prompts": {} })] {
            assert_eq!(normalize(&bad), Err(NormalizeError::InvalidEnvelope), "{:?}", bad);
        }
    }

    #[test]
    fn normalize_fails_when_nothing_survives() {
        assert_eq!(
            normalize(&json!({ "prompts": [] })),
            Err(NormalizeError::NoValidRecords { total: 0 })
        );
        assert_eq!(
            normalize(&json!({ "prompts": [{ "title": "only" }] })),
            Err(NormalizeError::NoValidRecords { total: 1 })
        );
    }

    #[test]
    fn normalize_round_trips_its_own_output() {
        let feed = json!({ "prompts": [
            { "title": "A", "prompt": "a", "urlTitle": "a", "id": 1, "copiedCount": "4",
              "categories": ["x"], "description": "d", "howToUse": "1\n2" },
            { "title": "B", "prompt": "b", "urlTitle": "b", "id": 2.5 },
        ]});
        let first = normalize(&feed).unwrap();
        let again = normalize(&serde_json::to_value(&first).unwrap()).unwrap();
        assert_eq!(first, again);
    }
}

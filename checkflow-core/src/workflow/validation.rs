//! Input validation for request content and review remarks

use crate::error::WorkflowError;
use serde_json::Value;

/// Trim `value`, then require it non-empty and at most `max` characters
pub fn required_text(field: &str, value: &str, max: usize) -> Result<String, WorkflowError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(WorkflowError::validation(format!("{} is required", field)));
    }
    if value.chars().count() > max {
        return Err(WorkflowError::validation(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(value.to_string())
}

/// Payloads are opaque but must be a JSON object; null becomes `{}`
pub fn payload(value: Value) -> Result<Value, WorkflowError> {
    match value {
        Value::Null => Ok(Value::Object(Default::default())),
        Value::Object(_) => Ok(value),
        _ => Err(WorkflowError::validation("payload must be a JSON object")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_required_text_trims() {
        assert_eq!(required_text("title", "  Reset  ", 10).unwrap(), "Reset");
        assert!(matches!(
            required_text("remarks", "   ", 10),
            Err(WorkflowError::Validation(_))
        ));
    }

    #[test]
    fn test_required_text_length_counts_characters() {
        assert!(required_text("title", "ééééé", 5).is_ok());
        let err = required_text("title", "abcdef", 5).unwrap_err();
        assert_eq!(err.to_string(), "title must be at most 5 characters");
    }

    #[test]
    fn test_payload_shapes() {
        assert_eq!(payload(Value::Null).unwrap(), json!({}));
        assert_eq!(payload(json!({"a": 1})).unwrap(), json!({"a": 1}));
        assert!(payload(json!([1, 2])).is_err());
        assert!(payload(json!("text")).is_err());
    }
}

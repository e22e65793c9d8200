//! Normalisation of feature-extraction responses
//!
//! Providers disagree on the shape of a single-input response: some return
//! `[v1..vD]`, others wrap it as `[[v1..vD]]` or deeper. The first element is
//! followed until a flat numeric array is reached.

use serde_json::Value;

use super::Embedding;
use crate::error::{Error, Result};

/// Wrapping levels peeled before the response is rejected
pub const MAX_UNWRAP_DEPTH: usize = 4;

/// Flatten a provider response into an embedding of exactly `dimensions` components
pub fn flatten_embedding(response: &Value, dimensions: usize) -> Result<Embedding> {
    let mut current = response;
    let mut depth = 0;

    while let Some(first) = current.as_array().and_then(|a| a.first()) {
        if !first.is_array() {
            break;
        }
        if depth == MAX_UNWRAP_DEPTH {
            return Err(Error::EmbeddingShape(format!(
                "nested deeper than {} levels",
                MAX_UNWRAP_DEPTH
            )));
        }
        current = first;
        depth += 1;
    }

    let items = current.as_array().ok_or_else(|| {
        Error::EmbeddingShape(format!("expected a numeric array, got {}", type_name(current)))
    })?;

    let values = items
        .iter()
        .enumerate()
        .map(|(i, item)| match item.as_f64() {
            Some(v) if v.is_finite() => Ok(v as f32),
            _ => Err(Error::EmbeddingShape(format!(
                "component {} is {}, not a finite number",
                i,
                type_name(item)
            ))),
        })
        .collect::<Result<Vec<f32>>>()?;

    Embedding::new(values, dimensions)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn flat(n: usize) -> Vec<f64> {
        (0..n).map(|i| i as f64 / 100.0).collect()
    }

    #[test]
    fn test_flat_response() {
        let embedding = flatten_embedding(&json!(flat(384)), 384).unwrap();
        assert_eq!(embedding.dimensions(), 384);
        assert_eq!(embedding.as_slice()[1], 0.01);
    }

    #[test]
    fn test_nested_responses() {
        assert_eq!(flatten_embedding(&json!([flat(384)]), 384).unwrap().dimensions(), 384);
        assert_eq!(
            flatten_embedding(&json!([[flat(384)]]), 384).unwrap().dimensions(),
            384
        );
    }

    #[test]
    fn test_rejects_wrong_dimension() {
        let err = flatten_embedding(&json!([flat(768)]), 384).unwrap_err();
        assert!(err.to_string().contains("expected 384, got 768"));
    }

    #[test]
    fn test_rejects_non_numeric() {
        let mut values: Vec<Value> = flat(384).into_iter().map(Value::from).collect();
        values[3] = json!("0.4");
        assert!(matches!(
            flatten_embedding(&Value::Array(values), 384),
            Err(Error::EmbeddingShape(_))
        ));
        assert!(flatten_embedding(&json!({"error": "model loading"}), 384).is_err());
        assert!(flatten_embedding(&json!([]), 384).is_err());
    }

    #[test]
    fn test_unwrap_depth_is_bounded() {
        let mut value = json!(flat(384));
        for _ in 0..=MAX_UNWRAP_DEPTH {
            value = json!([value]);
        }
        assert!(flatten_embedding(&value, 384)
            .unwrap_err()
            .to_string()
            .contains("nested deeper"));
    }
}

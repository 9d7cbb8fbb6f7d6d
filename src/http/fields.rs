//! `?fields=` projection over JSON responses.
//!
//! `fields=id,previousUser.counts` keeps only the listed paths. A path that
//! does not exist in the response is rejected rather than silently dropped.

use serde_json::{Map, Value};

use super::error::ApiError;

/// Project `value` onto the comma separated dotted `fields`.
///
/// `None` or an empty list returns `value` unchanged.
pub fn project(value: Value, fields: Option<&str>) -> Result<Value, ApiError> {
    let paths: Vec<&str> = fields
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if paths.is_empty() {
        return Ok(value);
    }

    let mut out = Map::new();
    for path in paths {
        let mut source = &value;
        for segment in path.split('.') {
            source = source
                .get(segment)
                .ok_or_else(|| ApiError::Unprocessable(format!("unknown field: {}", path)))?;
        }
        insert(&mut out, path, source.clone());
    }
    Ok(Value::Object(out))
}

fn insert(out: &mut Map<String, Value>, path: &str, leaf: Value) {
    let mut segments: Vec<&str> = path.split('.').collect();
    let Some(last) = segments.pop() else {
        return;
    };
    let mut map = out;
    for segment in segments {
        let entry = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        map = match entry {
            Value::Object(inner) => inner,
            _ => return,
        };
    }
    map.insert(last.to_string(), leaf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "id": "g",
            "count": 12,
            "previousUser": {"id": "alice", "counts": 4, "fails": 1}
        })
    }

    #[test]
    fn no_fields_is_identity() {
        assert_eq!(project(sample(), None).unwrap(), sample());
        assert_eq!(project(sample(), Some(" , ")).unwrap(), sample());
    }

    #[test]
    fn keeps_nested_paths() {
        let projected = project(sample(), Some("count,previousUser.counts,previousUser.id")).unwrap();
        assert_eq!(
            projected,
            json!({"count": 12, "previousUser": {"counts": 4, "id": "alice"}})
        );
    }

    #[test]
    fn whole_object_then_leaf() {
        let projected = project(sample(), Some("previousUser,previousUser.fails")).unwrap();
        assert_eq!(projected["previousUser"], sample()["previousUser"]);
    }

    #[test]
    fn unknown_field_is_rejected() {
        let err = project(sample(), Some("id,previousUser.nope")).unwrap_err();
        assert_eq!(err.error_code(), "unprocessable");
        assert!(err.to_string().contains("previousUser.nope"));
    }
}

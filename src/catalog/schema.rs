//! JSON Schema validation for tool inputs.
//!
//! Validates caller-supplied arguments against a tool's declared input
//! schema before the handler runs. Checks, in order:
//!
//! 1. **Required parameters** — every name under `required:` must be present
//!    and non-null.
//! 2. **Unknown parameters** — keys not listed under `properties:` are
//!    rejected.
//! 3. **Type validation with coercion** — values are checked against the
//!    declared JSON Schema type. Safe coercions are applied:
//!    `"123"` → `123` for `integer`/`number`, `"true"` → `true` for
//!    `boolean`.
//! 4. **Enum values** — checked after coercion.
//! 5. **Bounds** — `minimum`/`maximum` and `minLength`/`maxLength` where
//!    declared.
//!
//! Every violation carries the offending field path so callers can pinpoint
//! which field failed and why.

use serde_json::Value;

use crate::error::Violation;

/// Validate `arguments` against `input_schema`.
///
/// Returns the arguments after safe coercions on success, or the full list
/// of violations on failure. A null or empty-object schema disables
/// validation (any object accepted).
pub fn validate_arguments(
    arguments: &Value,
    input_schema: &Value,
) -> std::result::Result<Value, Vec<Violation>> {
    if input_schema.is_null() || input_schema == &Value::Object(serde_json::Map::new()) {
        return Ok(arguments.clone());
    }

    let Some(properties) = input_schema.get("properties").and_then(Value::as_object) else {
        return Ok(arguments.clone());
    };

    let required: Vec<&str> = input_schema
        .get("required")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    // Normalise arguments to an object; null / missing → empty object.
    let arg_map = match arguments {
        Value::Object(m) => m.clone(),
        Value::Null => serde_json::Map::new(),
        _ => {
            return Err(vec![Violation::new("", "Arguments must be a JSON object")]);
        }
    };

    let mut violations = Vec::new();
    let mut coerced_map = serde_json::Map::new();

    // Step 1 – required parameters.
    for name in &required {
        match arg_map.get(*name) {
            None => violations.push(Violation::new(*name, "required parameter is missing")),
            Some(Value::Null) => {
                violations.push(Violation::new(*name, "required parameter must not be null"));
            }
            _ => {}
        }
    }

    // Step 2 – unknown parameters.
    for key in arg_map.keys() {
        if !properties.contains_key(key.as_str()) {
            let known: Vec<&str> = properties.keys().map(String::as_str).collect();
            violations.push(Violation::new(
                key,
                format!("unknown parameter — valid parameters are: {}", known.join(", ")),
            ));
        }
    }

    // Early exit so the report is not cluttered by cascading type errors.
    if !violations.is_empty() {
        return Err(violations);
    }

    // Steps 3-5 – per-property type, enum, and bounds validation.
    for (name, prop_schema) in properties {
        let Some(raw_value) = arg_map.get(name.as_str()) else {
            continue;
        };
        if raw_value.is_null() {
            // Null is acceptable for optional params not in `required`.
            continue;
        }

        let (coerced_value, prop_violations) = validate_property(name, raw_value, prop_schema);
        violations.extend(prop_violations);
        coerced_map.insert(name.clone(), coerced_value);
    }

    if violations.is_empty() {
        Ok(Value::Object(coerced_map))
    } else {
        Err(violations)
    }
}

/// Validate a single property value against its schema.
fn validate_property(name: &str, value: &Value, prop_schema: &Value) -> (Value, Vec<Violation>) {
    let declared_type = prop_schema.get("type").and_then(Value::as_str);
    let mut violations = Vec::new();

    let coerced = if let Some(ty) = declared_type {
        match try_coerce(value, ty) {
            Ok(v) => v,
            Err(msg) => {
                violations.push(Violation::new(name, msg));
                value.clone()
            }
        }
    } else {
        value.clone()
    };

    // Only proceed to enum / bounds checks if the type was valid.
    if violations.is_empty() {
        if let Some(enum_values) = prop_schema.get("enum").and_then(Value::as_array) {
            if !enum_values.contains(&coerced) {
                let options: Vec<String> = enum_values.iter().map(ToString::to_string).collect();
                violations.push(Violation::new(
                    name,
                    format!("must be one of: {}", options.join(", ")),
                ));
            }
        }

        if let Some(num) = coerced.as_f64() {
            if let Some(min) = prop_schema.get("minimum").and_then(Value::as_f64) {
                if num < min {
                    violations.push(Violation::new(name, format!("must be >= {min}")));
                }
            }
            if let Some(max) = prop_schema.get("maximum").and_then(Value::as_f64) {
                if num > max {
                    violations.push(Violation::new(name, format!("must be <= {max}")));
                }
            }
        }

        if let Some(s) = coerced.as_str() {
            let len = s.chars().count() as u64;
            if let Some(min_len) = prop_schema.get("minLength").and_then(Value::as_u64) {
                if len < min_len {
                    violations.push(Violation::new(
                        name,
                        format!("must be at least {min_len} characters long"),
                    ));
                }
            }
            if let Some(max_len) = prop_schema.get("maxLength").and_then(Value::as_u64) {
                if len > max_len {
                    violations.push(Violation::new(
                        name,
                        format!("must be at most {max_len} characters long"),
                    ));
                }
            }
        }
    }

    (coerced, violations)
}

/// Attempt to coerce `value` to the declared JSON Schema `type`.
fn try_coerce(value: &Value, declared_type: &str) -> std::result::Result<Value, String> {
    match declared_type {
        "string" => match value {
            Value::String(_) => Ok(value.clone()),
            _ => Err(format!("expected string, got {}", json_type_name(value))),
        },
        "integer" => coerce_to_integer(value),
        "number" => coerce_to_number(value),
        "boolean" => coerce_to_boolean(value),
        "array" => match value {
            Value::Array(_) => Ok(value.clone()),
            _ => Err(format!("expected array, got {}", json_type_name(value))),
        },
        "object" => match value {
            Value::Object(_) => Ok(value.clone()),
            _ => Err(format!("expected object, got {}", json_type_name(value))),
        },
        _ => Ok(value.clone()), // Unknown type — pass through.
    }
}

fn coerce_to_integer(value: &Value) -> std::result::Result<Value, String> {
    match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => Ok(value.clone()),
        Value::Number(n) => Err(format!("expected integer, got float {n}")),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(|i| Value::Number(i.into()))
            .map_err(|_| format!("expected integer, got string \"{s}\"")),
        _ => Err(format!("expected integer, got {}", json_type_name(value))),
    }
}

fn coerce_to_number(value: &Value) -> std::result::Result<Value, String> {
    match value {
        Value::Number(_) => Ok(value.clone()),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| format!("expected number, got string \"{s}\"")),
        _ => Err(format!("expected number, got {}", json_type_name(value))),
    }
}

fn coerce_to_boolean(value: &Value) -> std::result::Result<Value, String> {
    match value {
        Value::Bool(_) => Ok(value.clone()),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(format!("expected boolean, got string \"{s}\"")),
        },
        _ => Err(format!("expected boolean, got {}", json_type_name(value))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sql_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "sql": { "type": "string" },
                "project_id": { "type": "string" },
                "database": { "type": "string" }
            },
            "required": ["sql", "project_id"]
        })
    }

    #[test]
    fn accepts_valid_arguments() {
        let args = json!({ "sql": "select 1", "project_id": "p-1" });
        let coerced = validate_arguments(&args, &sql_schema()).unwrap();
        assert_eq!(coerced["sql"], "select 1");
    }

    #[test]
    fn missing_required_field_names_the_path() {
        let args = json!({ "sql": "select 1" });
        let violations = validate_arguments(&args, &sql_schema()).unwrap_err();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, "project_id");
        assert!(violations[0].message.contains("required"));
    }

    #[test]
    fn wrong_type_names_the_path() {
        let args = json!({ "sql": 123, "project_id": "p-1" });
        let violations = validate_arguments(&args, &sql_schema()).unwrap_err();
        assert_eq!(violations[0].path, "sql");
        assert!(violations[0].message.contains("expected string"));
    }

    #[test]
    fn unknown_parameter_rejected_with_hint() {
        let args = json!({ "sql": "select 1", "project_id": "p", "limit": 10 });
        let violations = validate_arguments(&args, &sql_schema()).unwrap_err();
        assert_eq!(violations[0].path, "limit");
        assert!(violations[0].message.contains("valid parameters"));
    }

    #[test]
    fn null_required_field_rejected() {
        let args = json!({ "sql": null, "project_id": "p" });
        let violations = validate_arguments(&args, &sql_schema()).unwrap_err();
        assert_eq!(violations[0].path, "sql");
        assert!(violations[0].message.contains("null"));
    }

    #[test]
    fn empty_schema_accepts_anything() {
        assert!(validate_arguments(&json!({"whatever": 1}), &Value::Null).is_ok());
        assert!(validate_arguments(&json!({"whatever": 1}), &json!({})).is_ok());
    }

    #[test]
    fn null_arguments_ok_when_nothing_required() {
        let schema = json!({
            "type": "object",
            "properties": { "name": { "type": "string" } }
        });
        assert!(validate_arguments(&Value::Null, &schema).is_ok());
    }

    #[test]
    fn non_object_arguments_rejected() {
        let violations = validate_arguments(&json!([1, 2]), &sql_schema()).unwrap_err();
        assert_eq!(violations[0].path, "");
    }

    #[test]
    fn integer_coercion_from_string() {
        let schema = json!({
            "type": "object",
            "properties": { "count": { "type": "integer" } }
        });
        let coerced = validate_arguments(&json!({ "count": "42" }), &schema).unwrap();
        assert_eq!(coerced["count"], 42);
    }

    #[test]
    fn boolean_coercion_from_string() {
        let schema = json!({
            "type": "object",
            "properties": { "force": { "type": "boolean" } }
        });
        let coerced = validate_arguments(&json!({ "force": "true" }), &schema).unwrap();
        assert_eq!(coerced["force"], true);
    }

    #[test]
    fn enum_membership_checked() {
        let schema = json!({
            "type": "object",
            "properties": {
                "mode": { "type": "string", "enum": ["read", "write"] }
            }
        });
        let violations = validate_arguments(&json!({ "mode": "admin" }), &schema).unwrap_err();
        assert_eq!(violations[0].path, "mode");
        assert!(violations[0].message.contains("must be one of"));
    }

    #[test]
    fn string_length_bounds_checked() {
        let schema = json!({
            "type": "object",
            "properties": {
                "name": { "type": "string", "minLength": 3, "maxLength": 8 }
            }
        });
        assert!(validate_arguments(&json!({ "name": "ok-name" }), &schema).is_ok());
        let short = validate_arguments(&json!({ "name": "ab" }), &schema).unwrap_err();
        assert!(short[0].message.contains("at least 3"));
    }

    #[test]
    fn numeric_bounds_checked() {
        let schema = json!({
            "type": "object",
            "properties": {
                "limit": { "type": "integer", "minimum": 1, "maximum": 100 }
            }
        });
        let violations = validate_arguments(&json!({ "limit": 500 }), &schema).unwrap_err();
        assert_eq!(violations[0].path, "limit");
        assert!(violations[0].message.contains("<= 100"));
    }
}

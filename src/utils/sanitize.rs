use serde_json::Value;

/// Masks credential-like fields in JSON payloads before they are logged.
pub fn sanitize_json(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut sanitized = serde_json::Map::new();
            for (key, val) in map {
                let sanitized_val = if is_sensitive_field(key) {
                    mask_value(val)
                } else {
                    sanitize_json(val)
                };
                sanitized.insert(key.clone(), sanitized_val);
            }
            Value::Object(sanitized)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sanitize_json).collect()),
        _ => value.clone(),
    }
}

fn is_sensitive_field(key: &str) -> bool {
    matches!(
        key.to_lowercase().as_str(),
        "password" | "secret" | "token" | "api_key" | "authorization" | "database_url"
    )
}

fn mask_value(value: &Value) -> Value {
    match value {
        Value::String(s) if s.chars().count() > 8 => {
            let chars: Vec<char> = s.chars().collect();
            let head: String = chars[..4].iter().collect();
            let tail: String = chars[chars.len() - 4..].iter().collect();
            Value::String(format!("{}****{}", head, tail))
        }
        _ => Value::String("****".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_operation_body_is_untouched() {
        let input = json!({
            "operation_type": "DEPOSIT",
            "amount": "100.00"
        });

        assert_eq!(sanitize_json(&input), input);
    }

    #[test]
    fn test_sanitize_nested_token() {
        let input = json!({
            "auth": {
                "token": "abcdefghijklmnop",
                "name": "ops"
            }
        });

        let sanitized = sanitize_json(&input);
        assert_eq!(sanitized["auth"]["token"], "abcd****mnop");
        assert_eq!(sanitized["auth"]["name"], "ops");
    }

    #[test]
    fn test_short_secret_fully_masked() {
        let sanitized = sanitize_json(&json!({ "password": "hunter2" }));
        assert_eq!(sanitized["password"], "****");
    }
}

//! 响应包装处理
//!
//! 后端成功响应可能是 `{ message, data }` 或 `{ success, data }`，
//! 也可能直接返回数据本身。

use serde_json::Value as JsonValue;

/// 被 `{ success: false }` 拒绝的响应
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub message: Option<String>,
}

/// 拆开响应包装
///
/// - 带 `data` 且带 `message` / `success` 字段：返回 `data`
/// - `success` 为 `false`：返回 [`Rejection`]
/// - 其它情况原样返回
pub fn unwrap_envelope(payload: JsonValue) -> Result<JsonValue, Rejection> {
    let JsonValue::Object(mut map) = payload else {
        return Ok(payload);
    };

    if map.get("success").and_then(JsonValue::as_bool) == Some(false) {
        return Err(Rejection {
            message: extract_message(&JsonValue::Object(map)),
        });
    }

    let wrapped = map.contains_key("data")
        && (map.contains_key("message") || map.contains_key("success"));

    if wrapped {
        Ok(map.remove("data").unwrap_or(JsonValue::Null))
    } else {
        Ok(JsonValue::Object(map))
    }
}

/// 从错误响应中提取提示文案
pub fn extract_message(payload: &JsonValue) -> Option<String> {
    ["message", "error", "detail"]
        .iter()
        .find_map(|key| payload.get(*key).and_then(JsonValue::as_str))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_data_wrapper_is_unwrapped() {
        let body = json!({ "message": "ok", "data": [{ "id": 1 }] });
        assert_eq!(unwrap_envelope(body).unwrap(), json!([{ "id": 1 }]));
    }

    #[test]
    fn test_success_data_wrapper_is_unwrapped() {
        let body = json!({ "success": true, "data": { "id": 9 } });
        assert_eq!(unwrap_envelope(body).unwrap(), json!({ "id": 9 }));
    }

    #[test]
    fn test_plain_payload_passes_through() {
        let body = json!({ "id": 3, "data": "not a wrapper" });
        assert_eq!(unwrap_envelope(body.clone()).unwrap(), body);
        assert_eq!(unwrap_envelope(json!([1, 2])).unwrap(), json!([1, 2]));
    }

    #[test]
    fn test_success_false_is_rejected() {
        let body = json!({ "success": false, "message": "Already enrolled" });
        let rejection = unwrap_envelope(body).unwrap_err();
        assert_eq!(rejection.message.as_deref(), Some("Already enrolled"));
    }
}

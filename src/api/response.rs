use serde::Serialize;
use serde_json::{Map, Value};

/// The structured response envelope every action answers with:
/// `{success, message, ...extra}`. Extra fields sit flattened beside the
/// envelope for frontend compatibility.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ApiResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            extra: Map::new(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            extra: Map::new(),
        }
    }

    /// Attaches an extra field. Values that fail to serialize become null
    /// rather than poisoning the whole response.
    pub fn with(mut self, key: &str, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.extra.insert(key.to_string(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extra_fields_flatten_beside_envelope() {
        let response = ApiResponse::ok("Booking submitted successfully")
            .with("order_id", "ORD-1")
            .with("progress", 40);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "Booking submitted successfully");
        assert_eq!(json["order_id"], "ORD-1");
        assert_eq!(json["progress"], 40);
    }
}

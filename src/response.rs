use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

/// Confirmation body for mutations that do not return an entity.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
    #[schema(value_type = Option<Object>)]
    pub detail: Option<Value>,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>, detail: Value) -> Self {
        Self {
            message: message.into(),
            detail: Some(detail),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub detail: String,
}

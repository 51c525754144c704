//! GraphQL request/response envelope shared by every store call

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::SyncError;

/// Request body: `{"query": "...", "variables": {...}}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphqlRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<Value>,
}

impl GraphqlRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            variables: None,
        }
    }

    /// Values travel as variables and are never spliced into the document.
    pub fn with_variables(query: impl Into<String>, variables: Value) -> Self {
        Self {
            query: query.into(),
            variables: Some(variables),
        }
    }
}

/// Response body: `{"data": ..., "errors": [...], "extensions": {...}}`
#[derive(Debug, Deserialize)]
pub struct GraphqlResponse<T> {
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    #[serde(default, deserialize_with = "deserialize_errors")]
    pub errors: Vec<GraphqlError>,
    #[serde(default)]
    pub extensions: Option<Extensions>,
}

/// Shapes seen in the `errors` field
///
/// Authentication failures carry a bare string rather than a list.
#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorsField {
    List(Vec<GraphqlError>),
    Message(String),
    Other(Value),
}

fn deserialize_errors<'de, D>(deserializer: D) -> Result<Vec<GraphqlError>, D::Error>
where
    D: Deserializer<'de>,
{
    let errors = match Option::<ErrorsField>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(ErrorsField::List(errors)) => errors,
        Some(ErrorsField::Message(message)) => vec![GraphqlError { message }],
        Some(ErrorsField::Other(value)) => vec![GraphqlError {
            message: value.to_string(),
        }],
    };
    Ok(errors)
}

/// Top-level GraphQL error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphqlError {
    pub message: String,
}

/// Mutation-level validation error (`userErrors`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserError {
    #[serde(default)]
    pub field: Option<Vec<String>>,
    pub message: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Extensions {
    #[serde(default)]
    pub cost: Option<QueryCost>,
}

/// Query cost reported by the store's rate limiter
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryCost {
    #[serde(default)]
    pub requested_query_cost: Option<f64>,
    #[serde(default)]
    pub actual_query_cost: Option<f64>,
    #[serde(default)]
    pub throttle_status: Option<ThrottleStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThrottleStatus {
    pub maximum_available: f64,
    pub currently_available: f64,
    pub restore_rate: f64,
}

impl<T: DeserializeOwned> GraphqlResponse<T> {
    /// Decode a raw response body
    pub fn decode(body: &[u8]) -> Result<Self, SyncError> {
        serde_json::from_slice(body).map_err(|e| SyncError::Decode(e.to_string()))
    }

    /// Take `data`, turning GraphQL-level errors into a remote operation error
    pub fn into_data(self) -> Result<T, SyncError> {
        if !self.errors.is_empty() {
            return Err(SyncError::RemoteOperation(join_messages(
                self.errors.iter().map(|e| e.message.as_str()),
            )));
        }

        self.data.ok_or_else(|| {
            SyncError::RemoteOperation("response carried no data".to_string())
        })
    }
}

/// `"a; b; c"` rendering for error messages
pub fn join_messages<'a>(messages: impl Iterator<Item = &'a str>) -> String {
    messages.collect::<Vec<_>>().join("; ")
}

/// Render user errors as `field.path: message`
pub fn describe_user_errors(errors: &[UserError]) -> String {
    let rendered: Vec<String> = errors
        .iter()
        .map(|e| match &e.field {
            Some(path) if !path.is_empty() => format!("{}: {}", path.join("."), e.message),
            _ => e.message.clone(),
        })
        .collect();
    join_messages(rendered.iter().map(String::as_str))
}

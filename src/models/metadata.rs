use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, AppResult, ItemError};

pub const INVALID_INPUT_MESSAGE: &str = "Invalid input, expected an array of URLs.";

pub const NO_TITLE: &str = "No title found";
pub const NO_DESCRIPTION: &str = "No description found";
pub const NO_IMAGE: &str = "No image found";

// ============================================================================
// Request
// ============================================================================

/// One entry of the submitted `urls` array, kept in submission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestedUrl {
    Text(String),
    /// Any non-string JSON value, echoed back unchanged.
    NotAString(Value),
}

impl RequestedUrl {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            RequestedUrl::Text(s) => Some(s),
            RequestedUrl::NotAString(_) => None,
        }
    }

    /// The value echoed back as a failure's `url`.
    pub fn to_value(&self) -> Value {
        match self {
            RequestedUrl::Text(s) => Value::String(s.clone()),
            RequestedUrl::NotAString(v) => v.clone(),
        }
    }
}

impl From<Value> for RequestedUrl {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => RequestedUrl::Text(s),
            other => RequestedUrl::NotAString(other),
        }
    }
}

/// Body of `POST /fetch-metadata`: `{ "urls": [...] }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRequest {
    pub urls: Vec<RequestedUrl>,
}

impl MetadataRequest {
    /// Shape-checks a raw request body. Anything other than a JSON object
    /// whose `urls` member is an array is rejected for the whole batch.
    pub fn from_slice(body: &[u8]) -> AppResult<Self> {
        let invalid = || AppError::Validation(INVALID_INPUT_MESSAGE.into());

        let value: Value = serde_json::from_slice(body).map_err(|_| invalid())?;
        let Value::Object(mut object) = value else {
            return Err(invalid());
        };
        let Some(Value::Array(entries)) = object.remove("urls") else {
            return Err(invalid());
        };

        Ok(MetadataRequest {
            urls: entries.into_iter().map(RequestedUrl::from).collect(),
        })
    }
}

// ============================================================================
// Result
// ============================================================================

/// Scraped display fields for one page. Missing fields carry the fixed
/// placeholder text rather than being omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    pub url: String,
    pub title: String,
    pub description: String,
    pub image: String,
}

/// `url` is whatever was submitted, which need not be a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataFailure {
    pub url: Value,
    pub error: String,
}

/// One entry of the response array; serialized without a tag so the client
/// sees either `{url, title, description, image}` or `{url, error}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataResult {
    Success(PageMetadata),
    Failure(MetadataFailure),
}

impl MetadataResult {
    pub fn failure(url: impl Into<Value>, error: &ItemError) -> Self {
        MetadataResult::Failure(MetadataFailure {
            url: url.into(),
            error: error.to_string(),
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, MetadataResult::Success(_))
    }
}

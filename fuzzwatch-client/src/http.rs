//! reqwest-backed [`Transport`].

use crate::config::ClientConfig;
use async_trait::async_trait;
use fuzzwatch_core::{ApiRequest, ClientError, HttpMethod, Transport};
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: String,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::transport(e.to_string()))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        Self::new(&config.api_base_url, config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<Value, ClientError> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };
        let mut builder = self.client.request(method, self.url(&request.path));
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ClientError::transport(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ClientError::transport(e.to_string()))?;
        debug!(request = %request, status = status.as_u16(), "Response received");
        parse_response(status, &text)
    }
}

/// Map a status and raw body onto the JSON result of a request.
fn parse_response(status: StatusCode, text: &str) -> Result<Value, ClientError> {
    if status == StatusCode::NO_CONTENT {
        return Ok(Value::Null);
    }
    if status.is_success() {
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        return Ok(serde_json::from_str(text)?);
    }
    Err(ClientError::Http {
        status: status.as_u16(),
        message: error_message(status, text),
    })
}

/// Prefer the service's `message` or `error` field, then the raw body, then
/// the status reason.
fn error_message(status: StatusCode, text: &str) -> String {
    if let Ok(body) = serde_json::from_str::<Value>(text) {
        let field = body
            .get("message")
            .or_else(|| body.get("error"))
            .and_then(Value::as_str);
        if let Some(message) = field {
            return message.to_string();
        }
    }
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    status
        .canonical_reason()
        .unwrap_or("Unknown error occurred")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_no_content_is_null() {
        assert_eq!(parse_response(StatusCode::NO_CONTENT, ""), Ok(Value::Null));
    }

    #[test]
    fn test_success_body_decodes() {
        let value = parse_response(StatusCode::OK, r#"{"count": 3}"#).unwrap();
        assert_eq!(value, json!({ "count": 3 }));
    }

    #[test]
    fn test_success_with_bad_json_is_decode_error() {
        let err = parse_response(StatusCode::OK, "<html>").unwrap_err();
        assert!(matches!(err, ClientError::Decode { .. }));
    }

    #[test]
    fn test_error_message_field() {
        let err = parse_response(
            StatusCode::CONFLICT,
            r#"{"message": "Domain already exists"}"#,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ClientError::Http {
                status: 409,
                message: "Domain already exists".to_string(),
            }
        );
    }

    #[test]
    fn test_error_field_and_raw_text_fallbacks() {
        let err = parse_response(StatusCode::BAD_REQUEST, r#"{"error": "bad hours"}"#).unwrap_err();
        assert_eq!(err.to_string(), "HTTP 400: bad hours");

        let err = parse_response(StatusCode::BAD_GATEWAY, "upstream down").unwrap_err();
        assert_eq!(err.to_string(), "HTTP 502: upstream down");

        let err = parse_response(StatusCode::NOT_FOUND, "").unwrap_err();
        assert_eq!(err.to_string(), "HTTP 404: Not Found");
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let transport =
            HttpTransport::new("http://localhost:10001/", Duration::from_secs(1)).unwrap();
        assert_eq!(transport.base_url(), "http://localhost:10001");
        assert_eq!(transport.url("/api/user"), "http://localhost:10001/api/user");
    }
}

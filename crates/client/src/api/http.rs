//! HTTP client plumbing shared by all API wrappers.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ApiConfig;
use crate::repo::RepositoryError;

/// Errors raised by the HTTP layer.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl From<ApiError> for RepositoryError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Http(e) => RepositoryError::Network(e.to_string()),
            ApiError::Api { status: 404, message } => RepositoryError::NotFound(message),
            ApiError::Api { status, message } => RepositoryError::Api { status, message },
            ApiError::Decode(msg) => RepositoryError::Decode(msg),
        }
    }
}

/// Error body returned by the backend on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[allow(dead_code)]
    error: String,
    message: String,
}

/// Authenticated JSON client for the Phone Manager backend.
pub struct ApiClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self
            .http
            .get(self.url(path))
            .header("X-API-Key", &self.api_key)
            .send()
            .await?;
        Self::decode(response).await
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self
            .http
            .post(self.url(path))
            .header("X-API-Key", &self.api_key)
            .json(body)
            .send()
            .await?;
        Self::decode(response).await
    }

    pub async fn post_no_content<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), ApiError> {
        let response = self
            .http
            .post(self.url(path))
            .header("X-API-Key", &self.api_key)
            .json(body)
            .send()
            .await?;
        Self::expect_success(response).await
    }

    pub async fn put_no_content<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), ApiError> {
        let response = self
            .http
            .put(self.url(path))
            .header("X-API-Key", &self.api_key)
            .json(body)
            .send()
            .await?;
        Self::expect_success(response).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let response = self
            .http
            .delete(self.url(path))
            .header("X-API-Key", &self.api_key)
            .send()
            .await?;
        Self::expect_success(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        if status.is_success() {
            response
                .json::<T>()
                .await
                .map_err(|e| ApiError::Decode(e.to_string()))
        } else {
            Err(Self::error_from(status, response).await)
        }
    }

    async fn expect_success(response: reqwest::Response) -> Result<(), ApiError> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::error_from(status, response).await)
        }
    }

    async fn error_from(status: reqwest::StatusCode, response: reqwest::Response) -> ApiError {
        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.message,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string(),
        };
        ApiError::Api {
            status: status.as_u16(),
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_config(base_url: &str) -> ApiConfig {
        ApiConfig {
            base_url: base_url.to_string(),
            api_key: "pm_test_key".to_string(),
            request_timeout_secs: 5,
        }
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let client = ApiClient::new(&api_config("http://localhost:8080/")).unwrap();
        assert_eq!(
            client.url("/api/v1/geofences"),
            "http://localhost:8080/api/v1/geofences"
        );
    }

    #[test]
    fn test_api_error_maps_to_repository_error() {
        let not_found: RepositoryError = ApiError::Api {
            status: 404,
            message: "geofence missing".to_string(),
        }
        .into();
        assert!(matches!(not_found, RepositoryError::NotFound(_)));

        let forbidden: RepositoryError = ApiError::Api {
            status: 403,
            message: "forbidden".to_string(),
        }
        .into();
        assert!(matches!(
            forbidden,
            RepositoryError::Api { status: 403, .. }
        ));

        let decode: RepositoryError = ApiError::Decode("bad json".to_string()).into();
        assert!(matches!(decode, RepositoryError::Decode(_)));
    }

    #[test]
    fn test_error_body_deserialization() {
        let body: ErrorBody = serde_json::from_str(
            r#"{"error": "not_found", "message": "Resource not found"}"#,
        )
        .unwrap();
        assert_eq!(body.message, "Resource not found");
    }
}

use std::future::Future;

use bytes::Bytes;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client as HttpClient, Request};
use serde_json::Value;
use shared::{Endpoint, UPLOAD_FIELD};

use crate::config::ClientConfig;

/// The file part of one upload, detached from the candidate that owns the
/// preview so it can travel into an in-flight request.
#[derive(Debug, Clone)]
pub struct UploadPart {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Bytes,
}

/// Whatever the service answered, before any validation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    /// `None` when the body was empty or not JSON.
    pub body: Option<Value>,
}

impl RawResponse {
    pub fn new(status: u16, body: Option<Value>) -> Self {
        Self { status, body }
    }

    pub fn from_bytes(status: u16, bytes: &[u8]) -> Self {
        let body = if bytes.is_empty() {
            None
        } else {
            serde_json::from_slice(bytes).ok()
        };
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportFailure {
    /// The request went out but nothing usable came back.
    #[error("No response received: {0}")]
    NoResponse(String),
    /// The request could not be built or handed to the network.
    #[error("Request could not be sent: {0}")]
    Construction(String),
}

#[derive(Debug, Clone)]
pub struct InferenceClient {
    http: HttpClient,
    config: ClientConfig,
}

impl InferenceClient {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_http_client(HttpClient::new(), config)
    }

    pub fn with_http_client(http: HttpClient, config: ClientConfig) -> Self {
        Self { http, config }
    }

    pub async fn submit(
        &self,
        part: &UploadPart,
        endpoint: Endpoint,
        auth_header: Option<&str>,
    ) -> Result<RawResponse, TransportFailure> {
        let request = self.build_request(part, endpoint, auth_header)?;
        log::info!(
            "Uploading {:?} ({} bytes) to {} endpoint {}",
            part.file_name,
            part.bytes.len(),
            endpoint,
            request.url()
        );

        let response = with_timeout(self.config.timeout(), self.execute(request)).await?;
        log::debug!("Inference service answered with status {}", response.status);
        Ok(response)
    }

    fn build_request(
        &self,
        part: &UploadPart,
        endpoint: Endpoint,
        auth_header: Option<&str>,
    ) -> Result<Request, TransportFailure> {
        if endpoint.requires_auth() && auth_header.is_none() {
            return Err(TransportFailure::Construction(format!(
                "The {} endpoint needs an authorization header",
                endpoint
            )));
        }

        let url = self
            .config
            .endpoint_url(endpoint)
            .map_err(|e| TransportFailure::Construction(format!("Invalid endpoint URL: {}", e)))?;

        let file = Part::stream_with_length(Body::from(part.bytes.clone()), part.bytes.len() as u64)
            .file_name(part.file_name.clone())
            .mime_str(&part.mime_type)
            .map_err(|e| TransportFailure::Construction(e.to_string()))?;
        let form = Form::new().part(UPLOAD_FIELD, file);

        let mut builder = self.http.post(url).multipart(form);
        if let Some(value) = auth_header {
            let value = HeaderValue::from_str(value).map_err(|e| {
                TransportFailure::Construction(format!("Invalid authorization header: {}", e))
            })?;
            builder = builder.header(AUTHORIZATION, value);
        }

        builder.build().map_err(send_failure)
    }

    async fn execute(&self, request: Request) -> Result<RawResponse, TransportFailure> {
        let response = self.http.execute(request).await.map_err(send_failure)?;
        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportFailure::NoResponse(e.to_string()))?;
        Ok(RawResponse::from_bytes(status, &bytes))
    }
}

// Dropping the inner future on expiry aborts the underlying connection.
async fn with_timeout<F>(
    limit: Option<std::time::Duration>,
    call: F,
) -> Result<RawResponse, TransportFailure>
where
    F: Future<Output = Result<RawResponse, TransportFailure>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
            log::warn!("Inference request timed out after {:?}", limit);
            TransportFailure::NoResponse(format!("timed out after {:?}", limit))
        })?,
        None => call.await,
    }
}

fn send_failure(err: reqwest::Error) -> TransportFailure {
    if err.is_builder() {
        TransportFailure::Construction(err.to_string())
    } else {
        TransportFailure::NoResponse(err.to_string())
    }
}

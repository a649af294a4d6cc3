use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};

use super::wire::{ActionResponse, ImageUpload, RemoteSnapshot, SaveAllPayload};
use crate::config::SheetConfig;

#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    #[error("sheet endpoint is not configured")]
    NotConfigured,
    #[error("sheet request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("sheet responded with status {0}")]
    Status(StatusCode),
    #[error("unexpected sheet response: {0}")]
    MalformedResponse(String),
    #[error("sheet rejected the request: {0}")]
    Rejected(String),
}

/// Remote store holding the four collections and settings as spreadsheet tabs.
#[async_trait]
pub trait SheetGateway: Debug + Send + Sync {
    async fn fetch_snapshot(&self) -> Result<RemoteSnapshot, SheetError>;
    async fn save_all(&self, payload: &SaveAllPayload) -> Result<(), SheetError>;
    /// Stores an image and returns the URL it is served from.
    async fn upload_image(&self, upload: &ImageUpload) -> Result<String, SheetError>;
}

/// Client for a spreadsheet web-app deployment (one URL, GET to read, POST actions).
#[derive(Debug, Clone)]
pub struct HttpSheetGateway {
    client: Client,
    endpoint: String,
}

impl HttpSheetGateway {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, SheetError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// Gateway for the configured endpoint, or an offline stand-in when none is set.
    pub fn from_config(config: &SheetConfig) -> Result<Box<dyn SheetGateway>, SheetError> {
        match &config.endpoint {
            Some(endpoint) => Ok(Box::new(Self::new(endpoint.clone(), config.timeout)?)),
            None => Ok(Box::new(OfflineSheetGateway)),
        }
    }

    /// Actions are posted as `text/plain` JSON, which script deployments accept
    /// without a CORS preflight.
    async fn post_action<B: serde::Serialize + Sync>(
        &self,
        body: &B,
    ) -> Result<ActionResponse, SheetError> {
        let body = serde_json::to_string(body)
            .map_err(|err| SheetError::MalformedResponse(err.to_string()))?;
        let response = self
            .client
            .post(&self.endpoint)
            .header(header::CONTENT_TYPE, "text/plain;charset=utf-8")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(SheetError::Status(status));
        }

        let parsed: ActionResponse = serde_json::from_str(&text).map_err(|_| {
            let preview: String = text.chars().take(100).collect();
            SheetError::MalformedResponse(preview)
        })?;

        if parsed.is_success() {
            Ok(parsed)
        } else {
            Err(SheetError::Rejected(
                parsed
                    .message
                    .unwrap_or_else(|| "server returned error status".to_string()),
            ))
        }
    }
}

#[async_trait]
impl SheetGateway for HttpSheetGateway {
    async fn fetch_snapshot(&self) -> Result<RemoteSnapshot, SheetError> {
        let response = self.client.get(&self.endpoint).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SheetError::Status(status));
        }
        Ok(response.json::<RemoteSnapshot>().await?)
    }

    async fn save_all(&self, payload: &SaveAllPayload) -> Result<(), SheetError> {
        self.post_action(payload).await.map(|_| ())
    }

    async fn upload_image(&self, upload: &ImageUpload) -> Result<String, SheetError> {
        let response = self.post_action(upload).await?;
        response
            .url
            .ok_or_else(|| SheetError::MalformedResponse("upload response missing url".to_string()))
    }
}

/// Used when no endpoint is configured; every call fails so the service stays offline.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineSheetGateway;

#[async_trait]
impl SheetGateway for OfflineSheetGateway {
    async fn fetch_snapshot(&self) -> Result<RemoteSnapshot, SheetError> {
        Err(SheetError::NotConfigured)
    }

    async fn save_all(&self, _payload: &SaveAllPayload) -> Result<(), SheetError> {
        Err(SheetError::NotConfigured)
    }

    async fn upload_image(&self, _upload: &ImageUpload) -> Result<String, SheetError> {
        Err(SheetError::NotConfigured)
    }
}

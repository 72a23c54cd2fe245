//! HTTP transport to the processing service.

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use speckle_pipeline::{ActiveReference, HistoryEntry, PipelineRequest, ProcessingOutcome};
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::service::{HistoryStore, ProcessingService, ReferenceProvider};
use crate::url::{abs_url, cache_bust};
use crate::wire::{HistoryPage, ProcessBody, ProcessReply};

const USER_AGENT: &str = concat!("speckle/", env!("CARGO_PKG_VERSION"));

const CURRENT_PATH: &str = "/reference/current";
const PROCESS_PATH: &str = "/reference/process_active";
const HISTORY_PATH: &str = "/reference/history";

/// Processing service client over HTTP/JSON.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    http: reqwest::Client,
    config: ClientConfig,
}

impl HttpBackend {
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()?;
        Ok(Self { http, config })
    }

    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }
}

/// Turn a non-success status into [`ClientError::Status`].
async fn ensure_success(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    debug!(status = status.as_u16(), url = %response.url(), "response received");
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Status {
        status: status.as_u16(),
        body,
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
}

#[async_trait]
impl ReferenceProvider for HttpBackend {
    async fn active_reference(&self) -> Result<Option<ActiveReference>, ClientError> {
        let url = self.endpoint(CURRENT_PATH);
        debug!(%url, "fetching active reference");
        let response = self.http.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            info!("no active reference");
            return Ok(None);
        }
        let reference: ActiveReference = decode(ensure_success(response).await?).await?;
        debug!(id = %reference.id, filename = %reference.filename, "active reference");
        Ok(Some(reference))
    }
}

#[async_trait]
impl ProcessingService for HttpBackend {
    async fn process(&self, request: &PipelineRequest) -> Result<ProcessingOutcome, ClientError> {
        let url = self.endpoint(PROCESS_PATH);
        debug!(
            %url,
            reference = %request.reference_id,
            steps = request.steps.len(),
            "submitting pipeline"
        );
        let response = self
            .http
            .post(&url)
            .json(&ProcessBody::from(request))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(ClientError::MissingActiveReference);
        }
        let reply: ProcessReply = decode(ensure_success(response).await?).await?;
        let (result, locator) = reply.into_result();

        let processed_image = abs_url(&self.config.base_url, &locator)
            .ok_or_else(|| ClientError::Decode("empty processed image locator".into()))?;
        let processed_image = cache_bust(&processed_image, chrono::Utc::now().timestamp_millis());

        info!(zncc = result.zncc, rssd = result.rssd, "pipeline processed");
        Ok(ProcessingOutcome {
            result,
            processed_image,
        })
    }
}

#[async_trait]
impl HistoryStore for HttpBackend {
    async fn history(&self) -> Result<Vec<HistoryEntry>, ClientError> {
        let url = self.endpoint(HISTORY_PATH);
        debug!(%url, "fetching history");
        let response = self.http.get(&url).send().await?;
        let page: HistoryPage = decode(ensure_success(response).await?).await?;
        debug!(entries = page.items.len(), "history received");
        Ok(page.items)
    }
}

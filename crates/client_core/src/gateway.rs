//! Translation between logical record operations and the REST backend.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use shared::{
    domain::RecordId,
    protocol::{Record, WriteOperation, WritePayload, WriteReceipt},
};
use tracing::{debug, warn};
use url::Url;

use crate::{config::GatewaySettings, error::GatewayError};

const LIST_PATH: &str = "getPromedios";
const INSERT_PATH: &str = "insertPromedios";
const UPDATE_PATH: &str = "updatePromedios";
const DELETE_PATH: &str = "deletePromedios";

#[async_trait]
pub trait RecordGateway: Send + Sync {
    async fn list(&self) -> Result<Vec<Record>, GatewayError>;
    async fn create(&self, record: &Record) -> Result<WriteReceipt, GatewayError>;
    async fn update(&self, record: &Record) -> Result<WriteReceipt, GatewayError>;
    async fn remove(&self, id: RecordId) -> Result<WriteReceipt, GatewayError>;
}

#[async_trait]
impl<G> RecordGateway for std::sync::Arc<G>
where
    G: RecordGateway + ?Sized,
{
    async fn list(&self) -> Result<Vec<Record>, GatewayError> {
        (**self).list().await
    }

    async fn create(&self, record: &Record) -> Result<WriteReceipt, GatewayError> {
        (**self).create(record).await
    }

    async fn update(&self, record: &Record) -> Result<WriteReceipt, GatewayError> {
        (**self).update(record).await
    }

    async fn remove(&self, id: RecordId) -> Result<WriteReceipt, GatewayError> {
        (**self).remove(id).await
    }
}

#[derive(Debug, Clone)]
pub struct HttpRecordGateway {
    http: Client,
    base_url: String,
}

impl HttpRecordGateway {
    pub fn new(base_url: impl AsRef<str>) -> Result<Self, GatewayError> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn from_settings(settings: &GatewaySettings) -> Result<Self, GatewayError> {
        let http = Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .map_err(|source| GatewayError::Transport {
                endpoint: settings.base_url.clone(),
                source,
            })?;
        Self::with_client(http, &settings.base_url)
    }

    pub fn with_client(http: Client, base_url: impl AsRef<str>) -> Result<Self, GatewayError> {
        let base_url = validate_base_url(base_url.as_ref())?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    async fn send_write(
        &self,
        operation: WriteOperation,
        endpoint: String,
        request: RequestBuilder,
    ) -> Result<WriteReceipt, GatewayError> {
        debug!(?operation, %endpoint, "sending write request");
        let response = send(&endpoint, request).await?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|source| GatewayError::Transport {
                endpoint: endpoint.clone(),
                source,
            })?;
        Ok(WriteReceipt {
            operation,
            status,
            payload: WritePayload::from_body(&body),
        })
    }
}

#[async_trait]
impl RecordGateway for HttpRecordGateway {
    async fn list(&self) -> Result<Vec<Record>, GatewayError> {
        let endpoint = self.endpoint(LIST_PATH);
        debug!(%endpoint, "listing records");
        let response = send(&endpoint, self.http.get(&endpoint)).await?;
        let body = response
            .bytes()
            .await
            .map_err(|source| GatewayError::Transport {
                endpoint: endpoint.clone(),
                source,
            })?;
        serde_json::from_slice(&body).map_err(|source| {
            warn!(%endpoint, %source, "record list did not decode");
            GatewayError::Decode { endpoint, source }
        })
    }

    async fn create(&self, record: &Record) -> Result<WriteReceipt, GatewayError> {
        let endpoint = self.endpoint(INSERT_PATH);
        let request = self.http.post(&endpoint).json(record);
        self.send_write(WriteOperation::Create, endpoint, request)
            .await
    }

    async fn update(&self, record: &Record) -> Result<WriteReceipt, GatewayError> {
        if !record.is_persisted() {
            return Err(GatewayError::MissingId);
        }
        let endpoint = self.endpoint(UPDATE_PATH);
        let request = self.http.put(&endpoint).json(record);
        self.send_write(WriteOperation::Update, endpoint, request)
            .await
    }

    async fn remove(&self, id: RecordId) -> Result<WriteReceipt, GatewayError> {
        let endpoint = self.endpoint(&format!("{DELETE_PATH}/{}", id.0));
        let request = self.http.delete(&endpoint);
        self.send_write(WriteOperation::Remove, endpoint, request)
            .await
    }
}

async fn send(endpoint: &str, request: RequestBuilder) -> Result<reqwest::Response, GatewayError> {
    let response = request.send().await.map_err(|source| {
        warn!(%endpoint, %source, "request failed before a response arrived");
        GatewayError::Transport {
            endpoint: endpoint.to_string(),
            source,
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => {
                warn!(%endpoint, %err, "could not read body of rejected request");
                String::new()
            }
        };
        warn!(%endpoint, status = status.as_u16(), "backend rejected request");
        return Err(GatewayError::Status {
            endpoint: endpoint.to_string(),
            status,
            body,
        });
    }

    Ok(response)
}

fn validate_base_url(raw: &str) -> Result<String, GatewayError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed = Url::parse(trimmed).map_err(|err| GatewayError::InvalidBaseUrl {
        url: raw.to_string(),
        reason: err.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(GatewayError::InvalidBaseUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
#[path = "tests/gateway_tests.rs"]
mod tests;

//! REST collaborator: the five collection operations behind one trait, and the reqwest-backed
//! implementation that talks to `<base>/api/<collection>`.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use shared::{
    domain::{Record, RecordId},
    error::{ClientError, NETWORK_FAILURE_MESSAGE},
    protocol::{ItemResponse, ListQuery, ListResponse},
};
use tracing::{debug, warn};
use url::Url;

use crate::auth::AuthProvider;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub type ApiResult<T> = Result<T, ClientError>;

#[async_trait]
pub trait ResourceApi: Send + Sync {
    async fn list(&self, collection: &str, page: u32, limit: u32) -> ApiResult<ListResponse>;
    async fn get(&self, collection: &str, id: RecordId) -> ApiResult<Record>;
    async fn create(&self, collection: &str, body: Map<String, Value>) -> ApiResult<Value>;
    async fn update(
        &self,
        collection: &str,
        id: RecordId,
        body: Map<String, Value>,
    ) -> ApiResult<Value>;
    async fn delete(&self, collection: &str, id: RecordId) -> ApiResult<()>;
}

pub struct HttpResourceApi {
    http: Client,
    base_url: String,
    auth: Arc<dyn AuthProvider>,
}

impl HttpResourceApi {
    pub fn new(
        base_url: &str,
        auth: Arc<dyn AuthProvider>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let parsed = Url::parse(base_url)
            .map_err(|e| anyhow::anyhow!("invalid API base url {base_url:?}: {e}"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            anyhow::bail!("API base url must be http or https, got {base_url:?}");
        }
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
            auth,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/api/{}", self.base_url, collection.trim_matches('/'))
    }

    fn record_url(&self, collection: &str, id: RecordId) -> String {
        format!("{}/{}", self.collection_url(collection), id.0)
    }

    /// Attaches the bearer header, or fails before anything is sent.
    fn authorized(&self, request: RequestBuilder) -> ApiResult<RequestBuilder> {
        let token = self.auth.require_token()?;
        Ok(request.bearer_auth(token))
    }

    async fn send(&self, request: RequestBuilder) -> ApiResult<Response> {
        let request = self.authorized(request)?;
        let response = request.send().await.map_err(|err| {
            warn!(%err, "request did not complete");
            ClientError::transport(format!("{NETWORK_FAILURE_MESSAGE}: {err}"))
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let err = ClientError::server(status.as_u16(), &body);
        warn!(status = status.as_u16(), message = %err.message, "request rejected");
        Err(err)
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
        let bytes = response
            .bytes()
            .await
            .map_err(|err| ClientError::transport(format!("{NETWORK_FAILURE_MESSAGE}: {err}")))?;
        serde_json::from_slice(&bytes).map_err(|err| {
            debug!(%err, "response body has unexpected shape");
            ClientError::format()
        })
    }

    /// Mutation bodies are optional; an empty or non-JSON 2xx body becomes `Value::Null`.
    async fn read_optional_json(response: Response) -> ApiResult<Value> {
        let bytes = response
            .bytes()
            .await
            .map_err(|err| ClientError::transport(format!("{NETWORK_FAILURE_MESSAGE}: {err}")))?;
        Ok(serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }
}

#[async_trait]
impl ResourceApi for HttpResourceApi {
    async fn list(&self, collection: &str, page: u32, limit: u32) -> ApiResult<ListResponse> {
        let request = self
            .http
            .get(self.collection_url(collection))
            .query(&ListQuery { page, limit });
        let response = self.send(request).await?;
        Self::read_json(response).await
    }

    async fn get(&self, collection: &str, id: RecordId) -> ApiResult<Record> {
        let response = self.send(self.http.get(self.record_url(collection, id))).await?;
        let item: ItemResponse = Self::read_json(response).await?;
        Ok(item.into_record())
    }

    async fn create(&self, collection: &str, body: Map<String, Value>) -> ApiResult<Value> {
        let request = self.http.post(self.collection_url(collection)).json(&body);
        let response = self.send(request).await?;
        Self::read_optional_json(response).await
    }

    async fn update(
        &self,
        collection: &str,
        id: RecordId,
        body: Map<String, Value>,
    ) -> ApiResult<Value> {
        let request = self.http.put(self.record_url(collection, id)).json(&body);
        let response = self.send(request).await?;
        Self::read_optional_json(response).await
    }

    async fn delete(&self, collection: &str, id: RecordId) -> ApiResult<()> {
        self.send(self.http.delete(self.record_url(collection, id)))
            .await?;
        Ok(())
    }
}

/// `message` from a successful mutation body, if the server sent one.
pub fn success_message(body: &Value) -> Option<String> {
    body.get("message")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;

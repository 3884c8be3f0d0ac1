//! `reqwest` implementation of [`RecordsApi`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde_json::Value;

use crate::api::{ApiError, ApiResult, RecordsApi};
use crate::domain::{record::RecordFormData, types::RecordId};
use crate::models::{config::ClientConfig, record::RecordPayload};

/// Client for the records API rooted at a fixed base URL.
#[derive(Debug, Clone)]
pub struct HttpRecordsApi {
    http: Client,
    base_url: Url,
    read_timeout: Duration,
    write_timeout: Duration,
}

impl HttpRecordsApi {
    pub fn new(config: &ClientConfig) -> ApiResult<Self> {
        let base_url = Url::parse(&config.api_base_url).map_err(|err| {
            ApiError::Config(format!("invalid api_base_url {}: {err}", config.api_base_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::Config(format!(
                "api_base_url {} cannot hold a path",
                config.api_base_url
            )));
        }

        let http = Client::builder()
            .build()
            .map_err(|err| ApiError::Config(format!("failed to build HTTP client: {err}")))?;

        Ok(Self {
            http,
            base_url,
            read_timeout: config.read_timeout(),
            write_timeout: config.write_timeout(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Appends path segments to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send(&self, request: RequestBuilder, timeout: Duration) -> ApiResult<Response> {
        let response = request
            .timeout(timeout)
            .send()
            .await
            .map_err(|err| ApiError::from_transport(err, timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }

    /// Reads the body as JSON; an empty body reads as `null`.
    async fn read_json(response: Response, timeout: Duration) -> ApiResult<Value> {
        let bytes = response
            .bytes()
            .await
            .map_err(|err| ApiError::from_transport(err, timeout))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }

        serde_json::from_slice(&bytes).map_err(|err| ApiError::Decode(err.to_string()))
    }

    async fn get_json(&self, url: Url) -> ApiResult<Value> {
        let response = self.send(self.http.get(url), self.read_timeout).await?;
        Self::read_json(response, self.read_timeout).await
    }

    async fn write_json(&self, request: RequestBuilder, data: &RecordFormData) -> ApiResult<Value> {
        let payload = RecordPayload::from(data);
        let response = self
            .send(request.json(&payload), self.write_timeout)
            .await?;
        Self::read_json(response, self.write_timeout).await
    }
}

#[async_trait]
impl RecordsApi for HttpRecordsApi {
    async fn fetch_config(&self) -> ApiResult<Value> {
        self.get_json(self.endpoint(&["config"]))
            .await
            .map_err(|err| {
                log::warn!("Failed to fetch form options: {err}");
                err
            })
    }

    async fn fetch_records(&self, skip: usize, limit: usize) -> ApiResult<Value> {
        let mut url = self.endpoint(&["crm", "records"]);
        url.query_pairs_mut()
            .append_pair("skip", &skip.to_string())
            .append_pair("limit", &limit.to_string());

        self.get_json(url).await.map_err(|err| {
            log::warn!("Failed to fetch records: {err}");
            err
        })
    }

    async fn create_record(&self, data: &RecordFormData) -> ApiResult<Value> {
        let request = self.http.post(self.endpoint(&["crm", "records"]));

        self.write_json(request, data).await.map_err(|err| {
            log::warn!("Failed to create record: {err}");
            err
        })
    }

    async fn update_record(&self, id: &RecordId, data: &RecordFormData) -> ApiResult<Value> {
        let request = self.http.put(self.endpoint(&["crm", "records", id.as_str()]));

        self.write_json(request, data).await.map_err(|err| {
            log::warn!("Failed to update record {id}: {err}");
            err
        })
    }

    async fn delete_record(&self, id: &RecordId) -> ApiResult<()> {
        let request = self
            .http
            .delete(self.endpoint(&["crm", "records", id.as_str()]));

        self.send(request, self.write_timeout)
            .await
            .map(|_| ())
            .map_err(|err| {
                log::warn!("Failed to delete record {id}: {err}");
                err
            })
    }
}

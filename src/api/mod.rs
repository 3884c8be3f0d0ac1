//! Remote Data Client: the stateless boundary to the CRM records API.
//!
//! Every operation returns an [`ApiResult`]; nothing here retries or caches.
//! Read operations hand back the raw JSON document so that the normalizer can
//! decide what to make of it.

pub mod errors;
#[cfg(feature = "client")]
pub mod http;
#[cfg(feature = "test-mocks")]
pub mod mock;

pub use errors::{ApiError, ApiResult};

#[cfg(feature = "client")]
use async_trait::async_trait;
#[cfg(feature = "client")]
use serde_json::Value;

#[cfg(feature = "client")]
use crate::domain::{record::RecordFormData, types::RecordId};

#[cfg(feature = "client")]
#[async_trait]
pub trait RecordsApi: Send + Sync {
    /// `GET /config`.
    async fn fetch_config(&self) -> ApiResult<Value>;
    /// `GET /crm/records?skip=..&limit=..`, returning the whole page document.
    async fn fetch_records(&self, skip: usize, limit: usize) -> ApiResult<Value>;
    /// `POST /crm/records`, returning the created record as sent by the API.
    async fn create_record(&self, data: &RecordFormData) -> ApiResult<Value>;
    /// `PUT /crm/records/{id}`, returning the updated record as sent by the API.
    async fn update_record(&self, id: &RecordId, data: &RecordFormData) -> ApiResult<Value>;
    /// `DELETE /crm/records/{id}`.
    async fn delete_record(&self, id: &RecordId) -> ApiResult<()>;
}

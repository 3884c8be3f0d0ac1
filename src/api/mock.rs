//! Mock API implementation for isolating the coordinator in tests.

use async_trait::async_trait;
use mockall::mock;
use serde_json::Value;

use crate::api::{ApiResult, RecordsApi};
use crate::domain::record::RecordFormData;
use crate::domain::types::RecordId;

mock! {
    pub RecordsApi {}

    #[async_trait]
    impl RecordsApi for RecordsApi {
        async fn fetch_config(&self) -> ApiResult<Value>;
        async fn fetch_records(&self, skip: usize, limit: usize) -> ApiResult<Value>;
        async fn create_record(&self, data: &RecordFormData) -> ApiResult<Value>;
        async fn update_record(&self, id: &RecordId, data: &RecordFormData) -> ApiResult<Value>;
        async fn delete_record(&self, id: &RecordId) -> ApiResult<()>;
    }
}

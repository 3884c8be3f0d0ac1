//! Query/Mutation Coordinator.
//!
//! Owns the cached `records` and `config` queries for a session, loads them
//! through the [`RecordsApi`] and the normalizer, and refetches `records`
//! after every successful mutation so the cache always follows the server.

pub mod store;

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures::FutureExt;
use serde_json::Value;
use tokio::sync::watch;

use crate::api::http::HttpRecordsApi;
use crate::api::{ApiResult, RecordsApi};
use crate::domain::form_options::FormOptions;
use crate::domain::record::{Record, RecordFormData};
use crate::domain::types::RecordId;
use crate::forms::record::FormSubmission;
use crate::models::config::ClientConfig;
use crate::query::store::{QueryEntry, QueryKey, QueryStatus, QueryStore};
use crate::services::normalizer::{
    DataSource, FetchIssue, normalize_config, normalize_record, normalize_records,
};
use crate::services::search::filter_records;

/// Delay before the first query retry; doubles on each further attempt.
const RETRY_BACKOFF: Duration = Duration::from_millis(250);

#[derive(Clone, Debug, PartialEq)]
pub struct CoordinatorSettings {
    /// `limit` sent with the single records page request.
    pub page_size: usize,
    /// Extra attempts for retryable read failures.
    pub query_retries: u32,
    /// Serve built-in data instead of entering the error state.
    pub use_fallback_data: bool,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self::from(&ClientConfig::default())
    }
}

impl From<&ClientConfig> for CoordinatorSettings {
    fn from(config: &ClientConfig) -> Self {
        Self {
            page_size: config.page_size,
            query_retries: config.query_retries,
            use_fallback_data: config.use_fallback_data,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MutationKind {
    Create,
    Update,
    Delete,
}

#[derive(Default)]
struct PendingMutations {
    create: AtomicUsize,
    update: AtomicUsize,
    delete: AtomicUsize,
}

impl PendingMutations {
    fn counter(&self, kind: MutationKind) -> &AtomicUsize {
        match kind {
            MutationKind::Create => &self.create,
            MutationKind::Update => &self.update,
            MutationKind::Delete => &self.delete,
        }
    }

    fn begin(&self, kind: MutationKind) -> PendingGuard<'_> {
        let counter = self.counter(kind);
        counter.fetch_add(1, Ordering::SeqCst);
        PendingGuard(counter)
    }

    fn is_pending(&self, kind: MutationKind) -> bool {
        self.counter(kind).load(Ordering::SeqCst) > 0
    }
}

struct PendingGuard<'a>(&'a AtomicUsize);

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Everything the presentation layer reads.
#[derive(Clone, Debug)]
pub struct RecordsView {
    /// Empty until the first load settles.
    pub records: Arc<Vec<Record>>,
    /// `Fallback` while the built-in sample records are shown.
    pub records_source: Option<DataSource>,
    pub is_loading_records: bool,
    pub records_error: Option<FetchIssue>,
    pub form_options: Option<Arc<FormOptions>>,
    /// `Fallback` while the built-in form options are used.
    pub config_source: Option<DataSource>,
    pub is_loading_config: bool,
    pub config_error: Option<FetchIssue>,
    pub is_creating: bool,
    pub is_updating: bool,
    pub is_deleting: bool,
}

impl RecordsView {
    pub fn is_loading(&self) -> bool {
        self.is_loading_records || self.is_loading_config
    }

    pub fn search(&self, query: &str) -> Vec<&Record> {
        filter_records(&self.records, query)
    }
}

pub struct RecordsCoordinator {
    api: Arc<dyn RecordsApi>,
    store: QueryStore,
    settings: CoordinatorSettings,
    pending: PendingMutations,
}

impl RecordsCoordinator {
    pub fn new(api: Arc<dyn RecordsApi>, settings: CoordinatorSettings) -> Self {
        Self {
            api,
            store: QueryStore::new(),
            settings,
            pending: PendingMutations::default(),
        }
    }

    /// Coordinator talking HTTP to the API configured in `config`.
    pub fn connect(config: &ClientConfig) -> ApiResult<Self> {
        let api = HttpRecordsApi::new(config)?;
        log::info!("Using records API at {}", api.base_url());
        Ok(Self::new(Arc::new(api), CoordinatorSettings::from(config)))
    }

    pub fn settings(&self) -> &CoordinatorSettings {
        &self.settings
    }

    pub fn store(&self) -> &QueryStore {
        &self.store
    }

    pub fn subscribe_records(&self) -> watch::Receiver<QueryEntry<Vec<Record>>> {
        self.store.records().subscribe()
    }

    pub fn subscribe_config(&self) -> watch::Receiver<QueryEntry<FormOptions>> {
        self.store.config().subscribe()
    }

    /// Loads both queries concurrently and returns the resulting view.
    pub async fn mount(&self) -> RecordsView {
        futures::join!(self.fetch_records(), self.fetch_config());
        self.view()
    }

    pub async fn fetch_records(&self) -> QueryEntry<Vec<Record>> {
        let api = Arc::clone(&self.api);
        let settings = self.settings.clone();

        self.store
            .records()
            .fetch(move || {
                async move {
                    let fetched = with_retries(QueryKey::Records, settings.query_retries, || {
                        api.fetch_records(0, settings.page_size)
                    })
                    .await;
                    normalize_records(fetched).into_result(settings.use_fallback_data)
                }
                .boxed()
            })
            .await
    }

    pub async fn fetch_config(&self) -> QueryEntry<FormOptions> {
        let api = Arc::clone(&self.api);
        let settings = self.settings.clone();

        self.store
            .config()
            .fetch(move || {
                async move {
                    let fetched = with_retries(QueryKey::Config, settings.query_retries, || {
                        api.fetch_config()
                    })
                    .await;
                    normalize_config(fetched).into_result(settings.use_fallback_data)
                }
                .boxed()
            })
            .await
    }

    /// Creates a record and refetches the list. Returns the created record
    /// when the API echoed one back.
    pub async fn create_record(&self, data: &RecordFormData) -> ApiResult<Option<Record>> {
        let _pending = self.pending.begin(MutationKind::Create);

        let created = self.api.create_record(data).await.map_err(|err| {
            log::error!("Failed to create record: {err}");
            err
        })?;

        self.refresh_records().await;
        Ok(normalize_record(created))
    }

    /// Updates a record and refetches the list.
    pub async fn update_record(
        &self,
        id: &RecordId,
        data: &RecordFormData,
    ) -> ApiResult<Option<Record>> {
        let _pending = self.pending.begin(MutationKind::Update);

        let updated = self.api.update_record(id, data).await.map_err(|err| {
            log::error!("Failed to update record {id}: {err}");
            err
        })?;

        self.refresh_records().await;
        Ok(normalize_record(updated))
    }

    /// Deletes a record and refetches the list.
    pub async fn delete_record(&self, id: &RecordId) -> ApiResult<()> {
        let _pending = self.pending.begin(MutationKind::Delete);

        self.api.delete_record(id).await.map_err(|err| {
            log::error!("Failed to delete record {id}: {err}");
            err
        })?;

        self.refresh_records().await;
        Ok(())
    }

    /// Dispatches a submitted form to create or update.
    pub async fn save(&self, submission: &FormSubmission) -> ApiResult<Option<Record>> {
        match submission {
            FormSubmission::Create(data) => self.create_record(data).await,
            FormSubmission::Update(id, data) => self.update_record(id, data).await,
        }
    }

    pub fn is_pending(&self, kind: MutationKind) -> bool {
        self.pending.is_pending(kind)
    }

    pub fn view(&self) -> RecordsView {
        let records = self.store.records().snapshot();
        let config = self.store.config().snapshot();

        RecordsView {
            records: records.data.clone().unwrap_or_default(),
            records_source: records.source,
            is_loading_records: records.is_loading(),
            records_error: error_of(&records),
            form_options: config.data.clone(),
            config_source: config.source,
            is_loading_config: config.is_loading(),
            config_error: error_of(&config),
            is_creating: self.is_pending(MutationKind::Create),
            is_updating: self.is_pending(MutationKind::Update),
            is_deleting: self.is_pending(MutationKind::Delete),
        }
    }

    async fn refresh_records(&self) {
        self.store.invalidate(QueryKey::Records);
        self.fetch_records().await;
    }
}

/// The failure of an entry in the error state; fallback reasons are not errors.
fn error_of<T>(entry: &QueryEntry<T>) -> Option<FetchIssue> {
    match entry.status {
        QueryStatus::Error => entry.error.clone(),
        _ => None,
    }
}

/// Runs `attempt` once plus up to `retries` more times while it fails with a
/// retryable error.
async fn with_retries<F, Fut>(key: QueryKey, retries: u32, mut attempt: F) -> ApiResult<Value>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ApiResult<Value>>,
{
    let mut backoff = RETRY_BACKOFF;
    let mut remaining = retries;
    loop {
        match attempt().await {
            Err(err) if remaining > 0 && err.is_retryable() => {
                remaining -= 1;
                log::warn!("Retrying {key} query in {}ms: {err}", backoff.as_millis());
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }
            result => return result,
        }
    }
}

#[cfg(all(test, feature = "test-mocks"))]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::api::ApiError;
    use crate::api::mock::MockRecordsApi;

    fn coordinator(api: MockRecordsApi) -> RecordsCoordinator {
        RecordsCoordinator::new(Arc::new(api), CoordinatorSettings::default())
    }

    fn record_id(id: &str) -> RecordId {
        RecordId::new(id).expect("valid record id")
    }

    /// Ensures the single page request uses the configured window.
    #[tokio::test]
    async fn fetches_the_first_page_only() {
        let mut api = MockRecordsApi::new();
        api.expect_fetch_records()
            .withf(|skip, limit| *skip == 0 && *limit == 100)
            .times(1)
            .returning(|_, _| Ok(json!({"total": 1, "records": [{"_id": "1"}]})));

        let entry = coordinator(api).fetch_records().await;

        assert_eq!(entry.data.map(|records| records.len()), Some(1));
    }

    /// Confirms a failed mutation is surfaced and does not touch the cache.
    #[tokio::test]
    async fn failed_create_is_returned_without_refetch() {
        let mut api = MockRecordsApi::new();
        api.expect_create_record().times(1).returning(|_| {
            Err(ApiError::HttpStatus {
                status: 422,
                body: "cnpj required".to_string(),
            })
        });
        api.expect_fetch_records().times(0);

        let coordinator = coordinator(api);
        let result = coordinator.create_record(&RecordFormData::draft()).await;

        assert!(matches!(
            result,
            Err(ApiError::HttpStatus { status: 422, .. })
        ));
        assert!(!coordinator.view().is_creating);
        assert!(coordinator.store().records().snapshot().data.is_none());
    }

    /// Checks that a successful delete invalidates and refetches records.
    #[tokio::test]
    async fn delete_refetches_records() {
        let mut api = MockRecordsApi::new();
        api.expect_delete_record()
            .withf(|id| id.as_str() == "7")
            .times(1)
            .returning(|_| Ok(()));
        api.expect_fetch_records()
            .times(1)
            .returning(|_, _| Ok(json!({"records": []})));

        let coordinator = coordinator(api);
        coordinator
            .delete_record(&record_id("7"))
            .await
            .expect("delete should succeed");

        let entry = coordinator.store().records().snapshot();
        assert!(!entry.stale);
        assert_eq!(entry.data.map(|records| records.len()), Some(0));
    }

    /// Retries only transient read failures.
    #[tokio::test]
    async fn retries_transient_config_failures() {
        let mut api = MockRecordsApi::new();
        let mut calls = 0;
        api.expect_fetch_config().times(2).returning(move || {
            calls += 1;
            if calls == 1 {
                Err(ApiError::Network("connection reset".to_string()))
            } else {
                Ok(json!({"status": ["Ativo"]}))
            }
        });

        let settings = CoordinatorSettings {
            query_retries: 1,
            ..CoordinatorSettings::default()
        };
        let coordinator = RecordsCoordinator::new(Arc::new(api), settings);
        let entry = coordinator.fetch_config().await;

        assert_eq!(entry.source, Some(DataSource::Remote));
        assert_eq!(
            entry.data.map(|options| options.statuses.clone()),
            Some(vec!["Ativo".to_string()])
        );
    }
}

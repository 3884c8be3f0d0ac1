#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use crm_records::api::{ApiError, ApiResult, RecordsApi};
use crm_records::domain::record::RecordFormData;
use crm_records::domain::types::RecordId;
use crm_records::models::record::RecordPayload;

pub fn record_json(id: &str, razao_social: &str) -> Value {
    json!({
        "_id": id,
        "esteira": "Fixa",
        "razao_social": razao_social,
        "cnpj": format!("00.000.000/0001-{id:0>2}"),
        "consultor": "Ana Souza",
        "equipe": "Equipe Alfa",
        "plano": "Plano Básico",
        "valor_do_plano": "99.90",
        "migracao": "SIM",
        "status": "Ativo",
    })
}

pub fn config_json() -> Value {
    json!({
        "consultor": [
            {"name": "Ana Souza", "equipe": "Equipe Alfa"},
            {"name": "Bruno Lima", "equipe": "Equipe Beta"},
        ],
        "plano": [
            {"name": "Plano Básico", "value": 99.9},
            {"name": "Plano Empresarial", "value": "299.90"},
        ],
        "servicos": ["Voz"],
        "pacote_sva": ["Backup"],
        "status": ["Ativo", "Pendente", "Inativo"],
    })
}

/// In-memory stand-in for the records API.
#[derive(Default)]
pub struct FakeApi {
    records: Mutex<Vec<Value>>,
    config: Mutex<Value>,
    read_failures: Mutex<VecDeque<ApiError>>,
    write_failure: Mutex<Option<ApiError>>,
    delay: Mutex<Option<Duration>>,
    next_id: AtomicUsize,
    pub record_fetches: AtomicUsize,
    pub config_fetches: AtomicUsize,
    pub writes: AtomicUsize,
}

impl FakeApi {
    pub fn with_records(records: Vec<Value>) -> Self {
        let api = Self::default();
        api.next_id.store(records.len() + 1, Ordering::SeqCst);
        *api.records.lock().unwrap() = records;
        *api.config.lock().unwrap() = config_json();
        api
    }

    /// Makes the next reads fail, one error per read, in order.
    pub fn fail_reads(&self, errors: impl IntoIterator<Item = ApiError>) {
        self.read_failures.lock().unwrap().extend(errors);
    }

    pub fn fail_writes(&self, error: ApiError) {
        *self.write_failure.lock().unwrap() = Some(error);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn record_fetches(&self) -> usize {
        self.record_fetches.load(Ordering::SeqCst)
    }

    pub fn config_fetches(&self) -> usize {
        self.config_fetches.load(Ordering::SeqCst)
    }

    async fn pause(&self) {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn next_read_failure(&self) -> Option<ApiError> {
        self.read_failures.lock().unwrap().pop_front()
    }

    fn check_write(&self) -> ApiResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        match self.write_failure.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn payload(data: &RecordFormData) -> Value {
        serde_json::to_value(RecordPayload::from(data)).unwrap()
    }

    fn not_found(id: &RecordId) -> ApiError {
        ApiError::HttpStatus {
            status: 404,
            body: format!("record {id} not found"),
        }
    }
}

#[async_trait]
impl RecordsApi for FakeApi {
    async fn fetch_config(&self) -> ApiResult<Value> {
        self.config_fetches.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        match self.next_read_failure() {
            Some(err) => Err(err),
            None => Ok(self.config.lock().unwrap().clone()),
        }
    }

    async fn fetch_records(&self, skip: usize, limit: usize) -> ApiResult<Value> {
        self.record_fetches.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if let Some(err) = self.next_read_failure() {
            return Err(err);
        }
        let records = self.records.lock().unwrap();
        let page: Vec<Value> = records.iter().skip(skip).take(limit).cloned().collect();
        Ok(json!({"total": records.len(), "records": page}))
    }

    async fn create_record(&self, data: &RecordFormData) -> ApiResult<Value> {
        self.pause().await;
        self.check_write()?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut created = Self::payload(data);
        created["_id"] = Value::from(id.to_string());
        self.records.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn update_record(&self, id: &RecordId, data: &RecordFormData) -> ApiResult<Value> {
        self.pause().await;
        self.check_write()?;
        let mut records = self.records.lock().unwrap();
        let slot = records
            .iter_mut()
            .find(|record| record["_id"] == id.as_str())
            .ok_or_else(|| Self::not_found(id))?;
        let mut updated = Self::payload(data);
        updated["_id"] = Value::from(id.as_str());
        *slot = updated.clone();
        Ok(updated)
    }

    async fn delete_record(&self, id: &RecordId) -> ApiResult<()> {
        self.pause().await;
        self.check_write()?;
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|record| record["_id"] != id.as_str());
        if records.len() == before {
            return Err(Self::not_found(id));
        }
        Ok(())
    }
}

/// Canned reply of the loopback server.
#[derive(Clone, Debug)]
pub struct CannedResponse {
    pub status: u16,
    pub body: String,
    pub delay: Duration,
}

impl CannedResponse {
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Clone, Debug)]
pub struct CapturedRequest {
    pub method: String,
    pub target: String,
    pub body: String,
}

impl CapturedRequest {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

struct ServerState {
    responses: Vec<CannedResponse>,
    served: AtomicUsize,
    requests: Mutex<Vec<CapturedRequest>>,
}

/// Loopback axum server answering each request with the next canned
/// response. The last response is repeated once the list runs out.
pub struct TestServer {
    pub base_url: String,
    state: Arc<ServerState>,
}

impl TestServer {
    pub async fn start(responses: Vec<CannedResponse>) -> Self {
        Self::start_at("/", responses).await
    }

    pub async fn start_at(base_path: &str, responses: Vec<CannedResponse>) -> Self {
        let state = Arc::new(ServerState {
            responses,
            served: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        });
        let app = Router::new()
            .fallback(respond)
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}{base_path}"),
            state,
        }
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.state.requests.lock().unwrap().clone()
    }
}

async fn respond(
    State(state): State<Arc<ServerState>>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response {
    let index = state.served.fetch_add(1, Ordering::SeqCst);
    let canned = state
        .responses
        .get(index)
        .or_else(|| state.responses.last())
        .cloned()
        .unwrap_or_else(|| CannedResponse::text(404, ""));

    state.requests.lock().unwrap().push(CapturedRequest {
        method: method.to_string(),
        target: uri
            .path_and_query()
            .map(|target| target.to_string())
            .unwrap_or_else(|| uri.path().to_string()),
        body: String::from_utf8_lossy(&body).into_owned(),
    });

    if !canned.delay.is_zero() {
        tokio::time::sleep(canned.delay).await;
    }

    let status =
        StatusCode::from_u16(canned.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        canned.body,
    )
        .into_response()
}

/// Base URL of a port nobody listens on.
pub async fn unreachable_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

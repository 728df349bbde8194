//! In-memory collaborators shared by the unit tests.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use shared::{
    domain::{Record, RecordId},
    error::ClientError,
    protocol::{ListResponse, PageMeta},
};
use tokio::sync::oneshot;

use crate::{
    api::{ApiResult, ResourceApi},
    confirm::Confirmer,
    notify::{Notification, Notifier},
    table::{TableWidget, TableWidgetFactory},
};

pub fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => Record::new(map),
        other => panic!("record fixture must be an object, got {other}"),
    }
}

/// `count` records for `page`, ids continuing across pages.
pub fn page_rows(page: u32, size: u32, count: u32) -> Vec<Record> {
    (0..count)
        .map(|i| {
            let id = (page - 1) * size + i + 1;
            record(json!({ "id": id, "nama": format!("item-{id}") }))
        })
        .collect()
}

#[derive(Default)]
pub struct ScriptedApi {
    pub pages: Mutex<HashMap<u32, Vec<Record>>>,
    pub last_page: Mutex<i64>,
    gates: Mutex<HashMap<u32, oneshot::Receiver<()>>>,
    pub list_calls: Mutex<Vec<(u32, u32)>>,
    pub created: Mutex<Vec<Map<String, Value>>>,
    pub updated: Mutex<Vec<(RecordId, Map<String, Value>)>>,
    pub deleted: Mutex<Vec<RecordId>>,
    pub list_error: Mutex<Option<ClientError>>,
    page_errors: Mutex<HashMap<u32, ClientError>>,
    pub mutation_error: Mutex<Option<ClientError>>,
    pub mutation_delay: Mutex<Option<Duration>>,
}

impl ScriptedApi {
    /// Collection of `total` rows split into pages of `size`.
    pub fn with_rows(total: u32, size: u32) -> Self {
        let api = Self::default();
        let last_page = total.div_ceil(size).max(1);
        {
            let mut pages = api.pages.lock().unwrap();
            for page in 1..=last_page {
                let count = total.saturating_sub((page - 1) * size).min(size);
                pages.insert(page, page_rows(page, size, count));
            }
        }
        *api.last_page.lock().unwrap() = i64::from(last_page);
        api
    }

    /// The next `list` call for `page` waits until the returned sender fires.
    pub fn gate(&self, page: u32) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(page, rx);
        tx
    }

    pub fn list_call_count(&self) -> usize {
        self.list_calls.lock().unwrap().len()
    }

    pub async fn wait_for_list_calls(&self, n: usize) {
        while self.list_call_count() < n {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    }

    pub fn fail_lists_with(&self, err: Option<ClientError>) {
        *self.list_error.lock().unwrap() = err;
    }

    /// Every `list` call for `page` fails with `err`.
    pub fn fail_page(&self, page: u32, err: ClientError) {
        self.page_errors.lock().unwrap().insert(page, err);
    }

    pub fn fail_mutations_with(&self, err: Option<ClientError>) {
        *self.mutation_error.lock().unwrap() = err;
    }

    async fn mutation_gate(&self) -> ApiResult<()> {
        let delay = *self.mutation_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match self.mutation_error.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ResourceApi for ScriptedApi {
    async fn list(&self, _collection: &str, page: u32, limit: u32) -> ApiResult<ListResponse> {
        self.list_calls.lock().unwrap().push((page, limit));
        let gate = self.gates.lock().unwrap().remove(&page);
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        if let Some(err) = self.list_error.lock().unwrap().clone() {
            return Err(err);
        }
        if let Some(err) = self.page_errors.lock().unwrap().get(&page).cloned() {
            return Err(err);
        }
        let data = self
            .pages
            .lock()
            .unwrap()
            .get(&page)
            .cloned()
            .unwrap_or_default();
        Ok(ListResponse {
            data,
            meta: PageMeta {
                last_page: *self.last_page.lock().unwrap(),
                current_page: Some(i64::from(page)),
                per_page: Some(i64::from(limit)),
                total: None,
            },
        })
    }

    async fn get(&self, _collection: &str, id: RecordId) -> ApiResult<Record> {
        self.pages
            .lock()
            .unwrap()
            .values()
            .flatten()
            .find(|r| r.id() == Some(id))
            .cloned()
            .ok_or_else(|| ClientError::server(404, r#"{"message":"not found"}"#))
    }

    async fn create(&self, _collection: &str, body: Map<String, Value>) -> ApiResult<Value> {
        self.mutation_gate().await?;
        self.created.lock().unwrap().push(body);
        Ok(json!({ "message": "created" }))
    }

    async fn update(
        &self,
        _collection: &str,
        id: RecordId,
        body: Map<String, Value>,
    ) -> ApiResult<Value> {
        self.mutation_gate().await?;
        self.updated.lock().unwrap().push((id, body));
        Ok(Value::Null)
    }

    async fn delete(&self, _collection: &str, id: RecordId) -> ApiResult<()> {
        self.mutation_gate().await?;
        self.deleted.lock().unwrap().push(id);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn all(&self) -> Vec<Notification> {
        self.seen.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<Notification> {
        self.all().into_iter().filter(Notification::is_error).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.seen.lock().unwrap().push(notification);
    }
}

pub struct FixedAnswer {
    pub answer: bool,
    pub asked: Mutex<Vec<String>>,
}

impl FixedAnswer {
    pub fn new(answer: bool) -> Self {
        Self {
            answer,
            asked: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Confirmer for FixedAnswer {
    async fn confirm(&self, message: &str) -> bool {
        self.asked.lock().unwrap().push(message.to_string());
        self.answer
    }
}

/// Widget factory that tracks how many instances are alive at once.
#[derive(Default)]
pub struct CountingWidgets {
    pub live: Arc<AtomicUsize>,
    pub max_live: Arc<AtomicUsize>,
    pub initialized: AtomicUsize,
    pub destroyed: Arc<AtomicUsize>,
    pub fail_destroy: Arc<AtomicBool>,
    pub rows_seen: Mutex<Vec<usize>>,
}

struct CountingWidget {
    live: Arc<AtomicUsize>,
    destroyed: Arc<AtomicUsize>,
    fail_destroy: Arc<AtomicBool>,
}

impl TableWidget for CountingWidget {
    fn destroy(self: Box<Self>) -> anyhow::Result<()> {
        self.live.fetch_sub(1, Ordering::SeqCst);
        self.destroyed.fetch_add(1, Ordering::SeqCst);
        if self.fail_destroy.load(Ordering::SeqCst) {
            anyhow::bail!("widget already detached from its container");
        }
        Ok(())
    }
}

impl TableWidgetFactory for CountingWidgets {
    fn initialize(&self, rows: &[Record]) -> anyhow::Result<Box<dyn TableWidget>> {
        let live = self.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_live.fetch_max(live, Ordering::SeqCst);
        self.initialized.fetch_add(1, Ordering::SeqCst);
        self.rows_seen.lock().unwrap().push(rows.len());
        Ok(Box::new(CountingWidget {
            live: self.live.clone(),
            destroyed: self.destroyed.clone(),
            fail_destroy: self.fail_destroy.clone(),
        }))
    }
}

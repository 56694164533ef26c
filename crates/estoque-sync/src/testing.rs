//! Test support: an in-memory gateway with availability control, failure
//! injection, and inspectable tables.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::Semaphore;

use estoque_store::{LocalStore, StoreConfig};

use crate::error::{GatewayError, GatewayResult};
use crate::gateway::{Collection, Command, Query, RemoteGateway};

/// In-memory stand-in for the hosted data API.
pub(crate) struct MockGateway {
    available: AtomicBool,
    tables: Mutex<HashMap<&'static str, Vec<Value>>>,
    fail_ids: Mutex<HashSet<String>>,
    /// When set, `execute` waits for a permit before proceeding - lets tests
    /// hold a drain mid-flight.
    gate: Mutex<Option<Arc<Semaphore>>>,
}

impl MockGateway {
    pub fn online() -> Arc<Self> {
        Arc::new(MockGateway {
            available: AtomicBool::new(true),
            tables: Mutex::new(HashMap::new()),
            fail_ids: Mutex::new(HashSet::new()),
            gate: Mutex::new(None),
        })
    }

    pub fn offline() -> Arc<Self> {
        let gateway = MockGateway::online();
        gateway.available.store(false, Ordering::SeqCst);
        gateway
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Any command whose row id matches will fail with an API error.
    pub fn fail_id(&self, id: &str) {
        self.fail_ids.lock().unwrap().insert(id.to_string());
    }

    pub fn clear_failures(&self) {
        self.fail_ids.lock().unwrap().clear();
    }

    /// Installs a gate; `execute` blocks until permits are added.
    pub fn hold_executes(&self) -> Arc<Semaphore> {
        let semaphore = Arc::new(Semaphore::new(0));
        *self.gate.lock().unwrap() = Some(semaphore.clone());
        semaphore
    }

    pub fn rows(&self, collection: Collection) -> Vec<Value> {
        self.tables
            .lock()
            .unwrap()
            .get(collection.table())
            .cloned()
            .unwrap_or_default()
    }

    pub fn seed(&self, collection: Collection, rows: Vec<Value>) {
        self.tables.lock().unwrap().insert(collection.table(), rows);
    }

    fn command_id(command: &Command) -> Option<String> {
        match command {
            Command::Insert(row) | Command::Upsert(row) => row_id(row),
            Command::Update { id, .. } | Command::Delete { id } => Some(id.clone()),
        }
    }
}

fn row_id(row: &Value) -> Option<String> {
    match row.get("id") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

#[async_trait]
impl RemoteGateway for MockGateway {
    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn connect(&self) -> GatewayResult<()> {
        self.available.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn disconnect(&self) {
        self.available.store(false, Ordering::SeqCst);
    }

    async fn execute(&self, collection: Collection, command: Command) -> GatewayResult<()> {
        if !self.is_available() {
            return Err(GatewayError::Unavailable);
        }

        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        if let Some(id) = Self::command_id(&command) {
            if self.fail_ids.lock().unwrap().contains(&id) {
                return Err(GatewayError::Api {
                    status: 400,
                    message: format!("injected failure for {id}"),
                });
            }
        }

        let mut tables = self.tables.lock().unwrap();
        let rows = tables.entry(collection.table()).or_default();
        match command {
            Command::Insert(row) => rows.push(row),
            Command::Upsert(row) => {
                let id = row_id(&row);
                match rows.iter_mut().find(|r| row_id(r) == id && id.is_some()) {
                    Some(existing) => *existing = row,
                    None => rows.push(row),
                }
            }
            Command::Update { id, fields } => {
                if let Some(existing) = rows.iter_mut().find(|r| row_id(r).as_deref() == Some(&id)) {
                    if let (Some(target), Some(patch)) = (existing.as_object_mut(), fields.as_object()) {
                        for (key, value) in patch {
                            target.insert(key.clone(), value.clone());
                        }
                    }
                }
            }
            Command::Delete { id } => {
                rows.retain(|r| row_id(r).as_deref() != Some(&id));
            }
        }
        Ok(())
    }

    async fn query(&self, collection: Collection, _query: Query) -> GatewayResult<Vec<Value>> {
        if !self.is_available() {
            return Err(GatewayError::Unavailable);
        }
        Ok(self.rows(collection))
    }

    async fn purge(&self, collection: Collection, _ceiling: DateTime<Utc>) -> GatewayResult<()> {
        if !self.is_available() {
            return Err(GatewayError::Unavailable);
        }
        self.tables.lock().unwrap().remove(collection.table());
        Ok(())
    }
}

/// Fresh in-memory local store.
pub(crate) async fn memory_store() -> Arc<LocalStore> {
    Arc::new(LocalStore::new(StoreConfig::in_memory()).await.unwrap())
}

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::store::{AlertSession, AlertStore, StoreError};
use crate::models::{Alert, NewAlert};

#[derive(Default)]
struct Table {
    rows: Vec<Alert>,
    next_id: i32,
}

#[derive(Default)]
struct Shared {
    table: Mutex<Table>,
    open_sessions: AtomicUsize,
    failing: AtomicBool,
}

/// In-memory store for tests. Tracks how many sessions are open so tests can
/// check that every invocation hands its session back.
#[derive(Clone, Default)]
pub struct MemoryAlertStore {
    shared: Arc<Shared>,
}

impl MemoryAlertStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_sessions(&self) -> usize {
        self.shared.open_sessions.load(Ordering::SeqCst)
    }

    /// Makes every statement fail until switched back off.
    pub fn set_failing(&self, failing: bool) {
        self.shared.failing.store(failing, Ordering::SeqCst);
    }
}

impl AlertStore for MemoryAlertStore {
    type Session = MemoryAlertSession;

    async fn open(&self) -> Result<MemoryAlertSession, StoreError> {
        self.shared.open_sessions.fetch_add(1, Ordering::SeqCst);
        Ok(MemoryAlertSession {
            shared: Arc::clone(&self.shared),
        })
    }
}

pub struct MemoryAlertSession {
    shared: Arc<Shared>,
}

impl MemoryAlertSession {
    fn with_table<T>(&self, f: impl FnOnce(&mut Table) -> T) -> Result<T, StoreError> {
        if self.shared.failing.load(Ordering::SeqCst) {
            return Err(sqlx::Error::PoolClosed.into());
        }
        let mut table = self
            .shared
            .table
            .lock()
            .map_err(|_| sqlx::Error::Protocol("lock poisoned".into()))?;
        Ok(f(&mut table))
    }
}

impl AlertSession for MemoryAlertSession {
    async fn fetch_alert(&mut self, id: i32) -> Result<Option<Alert>, StoreError> {
        self.with_table(|t| t.rows.iter().find(|a| a.id == id).cloned())
    }

    async fn list_alerts(&mut self) -> Result<Vec<Alert>, StoreError> {
        self.with_table(|t| {
            let mut rows = t.rows.clone();
            // Stable, so equal priorities keep insertion order.
            rows.sort_by(|a, b| b.priority.cmp(&a.priority));
            rows
        })
    }

    async fn insert_alert(&mut self, alert: &NewAlert) -> Result<i32, StoreError> {
        self.with_table(|t| {
            t.next_id += 1;
            let id = t.next_id;
            t.rows.push(alert.clone().with_id(id));
            id
        })
    }

    async fn delete_alert(&mut self, id: i32) -> Result<u64, StoreError> {
        self.with_table(|t| {
            let before = t.rows.len();
            t.rows.retain(|a| a.id != id);
            (before - t.rows.len()) as u64
        })
    }

    async fn delete_all_alerts(&mut self) -> Result<u64, StoreError> {
        self.with_table(|t| {
            let removed = t.rows.len() as u64;
            t.rows.clear();
            removed
        })
    }
}

impl Drop for MemoryAlertSession {
    fn drop(&mut self) {
        self.shared.open_sessions.fetch_sub(1, Ordering::SeqCst);
    }
}

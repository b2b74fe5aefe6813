use std::future::Future;

use thiserror::Error;

use crate::models::{Alert, NewAlert};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Source of per-invocation storage sessions.
pub trait AlertStore: Send + Sync + 'static {
    type Session: AlertSession;

    /// Acquire a session. The underlying connection is released when the
    /// session is dropped.
    fn open(&self) -> impl Future<Output = Result<Self::Session, StoreError>> + Send;
}

/// One statement per call, all values passed as bound parameters.
pub trait AlertSession: Send {
    fn fetch_alert(
        &mut self,
        id: i32,
    ) -> impl Future<Output = Result<Option<Alert>, StoreError>> + Send;

    /// All alerts, highest priority first.
    fn list_alerts(&mut self) -> impl Future<Output = Result<Vec<Alert>, StoreError>> + Send;

    /// Returns the id assigned by the database.
    fn insert_alert(
        &mut self,
        alert: &NewAlert,
    ) -> impl Future<Output = Result<i32, StoreError>> + Send;

    /// Returns the number of rows removed, which may be zero.
    fn delete_alert(&mut self, id: i32) -> impl Future<Output = Result<u64, StoreError>> + Send;

    fn delete_all_alerts(&mut self) -> impl Future<Output = Result<u64, StoreError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        let err = StoreError::from(sqlx::Error::RowNotFound);
        assert!(err.to_string().starts_with("database error:"));
    }
}

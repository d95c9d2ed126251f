use std::sync::Arc;

use quorum_model::Table;
use quorum_store::{
    Filter, Item, Key, ScanPage, ScanRequest, Store, StoreError, Update, from_item, to_item,
};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::{CoreError, MetricsHandle, StorageOp};

/// Store handle that turns storage failures into [`CoreError::Storage`] and
/// counts them.
#[derive(Clone)]
pub(crate) struct StoreAccess {
    store: Arc<dyn Store>,
    metrics: MetricsHandle,
}

impl StoreAccess {
    pub(crate) fn new(store: Arc<dyn Store>, metrics: MetricsHandle) -> Self {
        Self { store, metrics }
    }

    pub(crate) fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    pub(crate) fn metrics(&self) -> &MetricsHandle {
        &self.metrics
    }

    pub(crate) fn fail(&self, op: StorageOp, table: &Table, source: StoreError) -> CoreError {
        warn!(%op, %table, error = %source, "storage operation failed");
        self.metrics.record_storage_error(op, table.name().as_ref());
        CoreError::storage(op, table, source)
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        table: &Table,
        key: &Key,
    ) -> Result<Option<T>, CoreError> {
        let item = self
            .store
            .get(table, key)
            .await
            .map_err(|e| self.fail(StorageOp::Get, table, e))?;
        item.map(from_item::<T>)
            .transpose()
            .map_err(|e| self.fail(StorageOp::Get, table, e))
    }

    pub(crate) async fn put<T: Serialize>(&self, table: &Table, record: &T) -> Result<(), CoreError> {
        let item = to_item(record).map_err(|e| self.fail(StorageOp::Put, table, e))?;
        self.store
            .put(table, item)
            .await
            .map_err(|e| self.fail(StorageOp::Put, table, e))?;
        debug!(%table, "put item");
        Ok(())
    }

    pub(crate) async fn delete(&self, table: &Table, key: &Key) -> Result<(), CoreError> {
        self.store
            .delete(table, key)
            .await
            .map_err(|e| self.fail(StorageOp::Delete, table, e))?;
        debug!(%table, "deleted item");
        Ok(())
    }

    /// Conditional update; `Ok(None)` when the condition does not hold.
    pub(crate) async fn try_update(
        &self,
        table: &Table,
        key: &Key,
        update: &Update,
        condition: Option<&Filter>,
    ) -> Result<Option<Item>, CoreError> {
        match self.store.update(table, key, update, condition).await {
            Ok(item) => {
                debug!(%table, "updated item");
                Ok(Some(item))
            }
            Err(StoreError::ConditionFailed) => Ok(None),
            Err(e) => Err(self.fail(StorageOp::Update, table, e)),
        }
    }

    pub(crate) async fn scan(
        &self,
        table: &Table,
        request: &ScanRequest,
    ) -> Result<ScanPage, CoreError> {
        self.store
            .scan(table, request)
            .await
            .map_err(|e| self.fail(StorageOp::Scan, table, e))
    }
}

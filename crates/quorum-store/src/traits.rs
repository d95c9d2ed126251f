use async_trait::async_trait;
use quorum_model::Table;

use crate::{
    error::StoreError,
    filter::Filter,
    item::{Item, Key},
    scan::{ScanPage, ScanRequest},
    update::Update,
};

/// Key-value store holding the labeling tables.
///
/// Keys are derived from each table's key schema ([`Table::key_attributes`]).
/// Single-item operations are atomic; nothing spans more than one item.
#[async_trait]
pub trait Store: Send + Sync {
    /// Get an item by key. Returns `None` if it does not exist.
    async fn get(&self, table: &Table, key: &Key) -> Result<Option<Item>, StoreError>;

    /// Insert or overwrite an item; the key is taken from the item itself.
    async fn put(&self, table: &Table, item: Item) -> Result<(), StoreError>;

    /// Delete an item. Deleting a missing key is not an error.
    async fn delete(&self, table: &Table, key: &Key) -> Result<(), StoreError>;

    /// Apply `update` to the item at `key` if `condition` holds, returning the
    /// item as it is after the update.
    ///
    /// A missing item is created from the key attributes (the condition is
    /// evaluated against that fresh item). Returns
    /// [`StoreError::ConditionFailed`] when the condition does not hold.
    async fn update(
        &self,
        table: &Table,
        key: &Key,
        update: &Update,
        condition: Option<&Filter>,
    ) -> Result<Item, StoreError>;

    /// Scan one page of a table in key order.
    async fn scan(&self, table: &Table, request: &ScanRequest) -> Result<ScanPage, StoreError>;
}

use std::{ops::Bound, path::Path, sync::Arc};

use async_trait::async_trait;
use quorum_model::Table;
use redb::{Database, ReadableTable, TableDefinition};

use crate::{
    Store, StoreError,
    filter::Filter,
    item::{Item, Key},
    memory::DEFAULT_PAGE_CAP,
    scan::{ScanPage, ScanRequest, evaluate_page},
    update::Update,
};

/// All labeling tables share one redb table; keys are `{table}\u{1e}{key}`.
const ITEMS: TableDefinition<&str, &[u8]> = TableDefinition::new("quorum");

const TABLE_SEPARATOR: char = '\u{1e}';

fn backend(e: impl ToString) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn prefix_of(table: &Table) -> String {
    format!("{}{TABLE_SEPARATOR}", table.name())
}

/// Store backed by redb, a pure-Rust embedded key-value database.
///
/// Items are stored as JSON. Each operation runs in its own transaction;
/// conditional updates read and write inside one write transaction, which
/// redb serializes.
#[derive(Clone)]
pub struct RedbStore {
    db: Arc<Database>,
    page_cap: usize,
}

impl RedbStore {
    /// Open or create a database at the given path.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let db = Database::create(path).map_err(backend)?;

        // Make sure the table exists so read transactions can open it.
        let write_txn = db.begin_write().map_err(backend)?;
        {
            let _table = write_txn.open_table(ITEMS).map_err(backend)?;
        }
        write_txn.commit().map_err(backend)?;

        Ok(Self {
            db: Arc::new(db),
            page_cap: DEFAULT_PAGE_CAP,
        })
    }

    pub fn with_page_cap(mut self, page_cap: usize) -> Self {
        self.page_cap = page_cap.max(1);
        self
    }

    fn storage_key(table: &Table, key: &Key) -> Result<String, StoreError> {
        Ok(format!("{}{}", prefix_of(table), key.encode_for(table)?))
    }
}

#[async_trait]
impl Store for RedbStore {
    async fn get(&self, table: &Table, key: &Key) -> Result<Option<Item>, StoreError> {
        let storage_key = Self::storage_key(table, key)?;
        let read_txn = self.db.begin_read().map_err(backend)?;
        let items = read_txn.open_table(ITEMS).map_err(backend)?;

        match items.get(storage_key.as_str()).map_err(backend)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(bytes.value())?)),
            None => Ok(None),
        }
    }

    async fn put(&self, table: &Table, item: Item) -> Result<(), StoreError> {
        let storage_key = Self::storage_key(table, &Key::of(table, &item)?)?;
        let bytes = serde_json::to_vec(&item)?;

        let write_txn = self.db.begin_write().map_err(backend)?;
        {
            let mut items = write_txn.open_table(ITEMS).map_err(backend)?;
            items
                .insert(storage_key.as_str(), bytes.as_slice())
                .map_err(backend)?;
        }
        write_txn.commit().map_err(backend)?;
        Ok(())
    }

    async fn delete(&self, table: &Table, key: &Key) -> Result<(), StoreError> {
        let storage_key = Self::storage_key(table, key)?;

        let write_txn = self.db.begin_write().map_err(backend)?;
        {
            let mut items = write_txn.open_table(ITEMS).map_err(backend)?;
            items.remove(storage_key.as_str()).map_err(backend)?;
        }
        write_txn.commit().map_err(backend)?;
        Ok(())
    }

    async fn update(
        &self,
        table: &Table,
        key: &Key,
        update: &Update,
        condition: Option<&Filter>,
    ) -> Result<Item, StoreError> {
        let storage_key = Self::storage_key(table, key)?;

        let write_txn = self.db.begin_write().map_err(backend)?;
        let item = {
            let mut items = write_txn.open_table(ITEMS).map_err(backend)?;
            let existing = items
                .get(storage_key.as_str())
                .map_err(backend)?
                .map(|bytes| bytes.value().to_vec());

            let mut item: Item = match existing {
                Some(bytes) => serde_json::from_slice(&bytes)?,
                None => key.to_item(),
            };
            if let Some(condition) = condition
                && !condition.matches(&item)
            {
                // Dropping the transaction aborts it.
                return Err(StoreError::ConditionFailed);
            }

            update.apply(&mut item)?;
            if Self::storage_key(table, &Key::of(table, &item)?)? != storage_key {
                return Err(StoreError::InvalidUpdate(
                    "update must not change key attributes".into(),
                ));
            }

            let bytes = serde_json::to_vec(&item)?;
            items
                .insert(storage_key.as_str(), bytes.as_slice())
                .map_err(backend)?;
            item
        };
        write_txn.commit().map_err(backend)?;
        Ok(item)
    }

    async fn scan(&self, table: &Table, request: &ScanRequest) -> Result<ScanPage, StoreError> {
        let prefix = prefix_of(table);
        let start = match &request.cursor {
            Some(cursor) => Bound::Excluded(format!("{prefix}{}", cursor.as_str())),
            None => Bound::Included(prefix.clone()),
        };

        let read_txn = self.db.begin_read().map_err(backend)?;
        let items = read_txn.open_table(ITEMS).map_err(backend)?;
        let range = items
            .range::<&str>((start.as_ref().map(String::as_str), Bound::Unbounded))
            .map_err(backend)?;

        let entries = range
            .map(|entry| {
                let (k, v) = entry.map_err(backend)?;
                Ok::<_, StoreError>((k.value().to_string(), v.value().to_vec()))
            })
            .take_while(|entry| {
                entry
                    .as_ref()
                    .map_or(true, |(k, _)| k.starts_with(prefix.as_str()))
            })
            .map(|entry| -> Result<(String, Item), StoreError> {
                let (k, bytes) = entry?;
                let item: Item = serde_json::from_slice(&bytes)?;
                Ok((k[prefix.len()..].to_string(), item))
            });

        evaluate_page(entries, request, self.page_cap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Pages, to_item};
    use serde_json::json;

    fn open(dir: &tempfile::TempDir) -> RedbStore {
        RedbStore::open(&dir.path().join("quorum.redb")).unwrap()
    }

    #[tokio::test]
    async fn items_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let key = Key::new("developerId", "dev-1");
        {
            let store = open(&dir);
            let item = to_item(&json!({"developerId": "dev-1", "taskCount": 3, "maxClasses": 2}))
                .unwrap();
            store.put(&Table::DeveloperProfile, item).await.unwrap();
        }

        let store = open(&dir);
        let got = store
            .get(&Table::DeveloperProfile, &key)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(got["maxClasses"], json!(2));

        store.delete(&Table::DeveloperProfile, &key).await.unwrap();
        assert!(store.get(&Table::DeveloperProfile, &key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn tables_do_not_leak_into_each_other() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir).with_page_cap(2);

        for id in ["a", "b", "c"] {
            let item = to_item(&json!({"taskId": id, "finished": false})).unwrap();
            store
                .put(&Table::DatasetTasks("d".into()), item)
                .await
                .unwrap();
        }
        let other = to_item(&json!({"datasetId": "d", "finished": false})).unwrap();
        store.put(&Table::Dataset, other).await.unwrap();

        let mut pages = Pages::new(&store, Table::DatasetTasks("d".into()), ScanRequest::new());
        let mut ids = Vec::new();
        while let Some(page) = pages.next_page().await {
            ids.extend(page.unwrap().items.into_iter().map(|i| i["taskId"].clone()));
        }
        assert_eq!(ids, [json!("a"), json!("b"), json!("c")]);
        assert_eq!(pages.pages_fetched(), 2);
    }

    #[tokio::test]
    async fn conditional_update_and_upsert() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir);
        let key = Key::new("datasetId", "d");

        let created = store
            .update(&Table::Dataset, &key, &Update::new().add("progress.current", 1), None)
            .await
            .unwrap();
        assert_eq!(created["progress"]["current"], json!(1));

        let err = store
            .update(
                &Table::Dataset,
                &key,
                &Update::new().set("finished", true),
                Some(&Filter::eq("progress.current", 0)),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ConditionFailed));

        let got = store.get(&Table::Dataset, &key).await.unwrap().unwrap();
        assert!(got.get("finished").is_none());
    }
}

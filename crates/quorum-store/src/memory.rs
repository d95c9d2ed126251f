use std::{
    collections::{BTreeMap, HashMap},
    ops::Bound,
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use async_trait::async_trait;
use quorum_model::Table;
use tracing::trace;

use crate::{
    Store, StoreError,
    filter::Filter,
    item::{Item, Key},
    scan::{ScanPage, ScanRequest, evaluate_page},
    update::Update,
};

/// Items returned per scan call at most.
pub const DEFAULT_PAGE_CAP: usize = 100;

/// In-memory store.
///
/// Tables are created on first write. Every scan call returns at most
/// `page_cap` items, so callers see the same cursor-driven paging they would
/// against a remote store.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryStoreInner>>,
    page_cap: usize,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Table name -> encoded key -> item.
    tables: HashMap<String, BTreeMap<String, Item>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_page_cap(DEFAULT_PAGE_CAP)
    }

    pub fn with_page_cap(page_cap: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(MemoryStoreInner::default())),
            page_cap: page_cap.max(1),
        }
    }

    /// Number of items in a table.
    pub fn len(&self, table: &Table) -> usize {
        self.read()
            .map(|inner| inner.tables.get(table.name().as_ref()).map_or(0, BTreeMap::len))
            .unwrap_or(0)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".into()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, table: &Table, key: &Key) -> Result<Option<Item>, StoreError> {
        let encoded = key.encode_for(table)?;
        let inner = self.read()?;
        Ok(inner
            .tables
            .get(table.name().as_ref())
            .and_then(|rows| rows.get(&encoded))
            .cloned())
    }

    async fn put(&self, table: &Table, item: Item) -> Result<(), StoreError> {
        let encoded = Key::of(table, &item)?.encode_for(table)?;
        let mut inner = self.write()?;
        inner
            .tables
            .entry(table.name().into_owned())
            .or_default()
            .insert(encoded, item);
        Ok(())
    }

    async fn delete(&self, table: &Table, key: &Key) -> Result<(), StoreError> {
        let encoded = key.encode_for(table)?;
        let mut inner = self.write()?;
        if let Some(rows) = inner.tables.get_mut(table.name().as_ref()) {
            rows.remove(&encoded);
        }
        Ok(())
    }

    async fn update(
        &self,
        table: &Table,
        key: &Key,
        update: &Update,
        condition: Option<&Filter>,
    ) -> Result<Item, StoreError> {
        let encoded = key.encode_for(table)?;
        let mut inner = self.write()?;
        let rows = inner.tables.entry(table.name().into_owned()).or_default();

        let mut item = rows.get(&encoded).cloned().unwrap_or_else(|| key.to_item());
        if let Some(condition) = condition
            && !condition.matches(&item)
        {
            trace!(%table, key = %encoded, "update condition failed");
            return Err(StoreError::ConditionFailed);
        }

        update.apply(&mut item)?;
        if Key::of(table, &item)?.encode_for(table)? != encoded {
            return Err(StoreError::InvalidUpdate("update must not change key attributes".into()));
        }

        rows.insert(encoded, item.clone());
        Ok(item)
    }

    async fn scan(&self, table: &Table, request: &ScanRequest) -> Result<ScanPage, StoreError> {
        let inner = self.read()?;
        let Some(rows) = inner.tables.get(table.name().as_ref()) else {
            return Ok(ScanPage::default());
        };

        let lower = match &request.cursor {
            Some(cursor) => Bound::Excluded(cursor.as_str()),
            None => Bound::Unbounded,
        };
        let entries = rows
            .range::<str, _>((lower, Bound::Unbounded))
            .map(|(k, v)| Ok((k.clone(), v.clone())));

        evaluate_page(entries, request, self.page_cap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Pages, to_item};
    use serde_json::{Value, json};

    fn task(id: &str, kind: &str) -> Item {
        to_item(&json!({
            "taskId": id,
            "type": kind,
            "class": {"A": 0},
            "progress": {"current": 0, "total": 1}
        }))
        .unwrap()
    }

    async fn seeded(count: usize, page_cap: usize) -> MemoryStore {
        let store = MemoryStore::with_page_cap(page_cap);
        for i in 0..count {
            let kind = if i % 2 == 0 { "text" } else { "image" };
            store
                .put(&Table::UnfinishedTask, task(&format!("t-{i:02}"), kind))
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn put_get_delete() {
        let store = MemoryStore::new();
        let key = Key::new("taskId", "t-1");

        store.put(&Table::UnfinishedTask, task("t-1", "text")).await.unwrap();
        let got = store.get(&Table::UnfinishedTask, &key).await.unwrap().unwrap();
        assert_eq!(got["type"], json!("text"));
        assert!(store.get(&Table::FinishedTask, &key).await.unwrap().is_none());

        store.delete(&Table::UnfinishedTask, &key).await.unwrap();
        assert!(store.get(&Table::UnfinishedTask, &key).await.unwrap().is_none());
        store.delete(&Table::UnfinishedTask, &key).await.unwrap();
    }

    #[tokio::test]
    async fn put_requires_key_attributes() {
        let store = MemoryStore::new();
        let item = to_item(&json!({"labelerId": "l"})).unwrap();
        let err = store.put(&Table::LabelerTask, item).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidKey(_)));
    }

    #[tokio::test]
    async fn conditional_update_checks_prior_value() {
        let store = MemoryStore::new();
        let key = Key::new("taskId", "t-1");
        store.put(&Table::UnfinishedTask, task("t-1", "text")).await.unwrap();

        let cond = Filter::eq("progress.current", 0);
        let update = Update::new().set("progress.current", 1).add("class.A", 1);
        let after = store
            .update(&Table::UnfinishedTask, &key, &update, Some(&cond))
            .await
            .unwrap();
        assert_eq!(after["progress"]["current"], json!(1));
        assert_eq!(after["class"]["A"], json!(1));

        let err = store
            .update(&Table::UnfinishedTask, &key, &update, Some(&cond))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ConditionFailed));
    }

    #[tokio::test]
    async fn update_upserts_missing_items() {
        let store = MemoryStore::new();
        let table = Table::DatasetTasks("d-1".into());
        let key = Key::new("taskId", "t-9");

        let item = store
            .update(&table, &key, &Update::new().set("finished", true), None)
            .await
            .unwrap();
        assert_eq!(Value::Object(item), json!({"taskId": "t-9", "finished": true}));

        let guarded = store
            .update(
                &Table::Dataset,
                &Key::new("datasetId", "nope"),
                &Update::new().add("progress.current", 1),
                Some(&Filter::exists("progress")),
            )
            .await;
        assert!(matches!(guarded, Err(StoreError::ConditionFailed)));
        assert_eq!(store.len(&Table::Dataset), 0);
    }

    #[tokio::test]
    async fn update_cannot_rewrite_the_key() {
        let store = MemoryStore::new();
        store.put(&Table::UnfinishedTask, task("t-1", "text")).await.unwrap();
        let err = store
            .update(
                &Table::UnfinishedTask,
                &Key::new("taskId", "t-1"),
                &Update::new().set("taskId", "t-2"),
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidUpdate(_)));
    }

    #[tokio::test]
    async fn scan_limit_counts_evaluated_items() {
        let store = seeded(10, 100).await;
        let request = ScanRequest::new()
            .with_filter(Filter::eq("type", "text"))
            .with_limit(4);

        let page = store.scan(&Table::UnfinishedTask, &request).await.unwrap();
        let ids: Vec<_> = page.items.iter().map(|i| i["taskId"].clone()).collect();
        assert_eq!(ids, [json!("t-00"), json!("t-02")]);
        assert!(page.next_cursor.is_some());
    }

    #[tokio::test]
    async fn scan_projection_and_end_of_table() {
        let store = seeded(3, 100).await;
        let request = ScanRequest::new().with_projection(["taskId"]);

        let page = store.scan(&Table::UnfinishedTask, &request).await.unwrap();
        assert_eq!(page.items.len(), 3);
        assert_eq!(Value::Object(page.items[0].clone()), json!({"taskId": "t-00"}));
        assert!(page.next_cursor.is_none());
    }

    #[tokio::test]
    async fn page_cap_bounds_unlimited_scans() {
        let store = seeded(7, 3).await;
        let page = store
            .scan(&Table::UnfinishedTask, &ScanRequest::new())
            .await
            .unwrap();
        assert_eq!(page.items.len(), 3);
        assert!(page.next_cursor.is_some());
    }

    #[tokio::test]
    async fn page_cap_counts_matches_not_rejected_rows() {
        let store = seeded(10, 3).await;
        let request = ScanRequest::new().with_filter(Filter::eq("type", "image"));

        let page = store.scan(&Table::UnfinishedTask, &request).await.unwrap();
        let ids: Vec<_> = page.items.iter().map(|i| i["taskId"].clone()).collect();
        assert_eq!(ids, [json!("t-01"), json!("t-03"), json!("t-05")]);
        assert!(page.next_cursor.is_some());

        let rest = store
            .scan(
                &Table::UnfinishedTask,
                &request.clone().start_after(page.next_cursor.unwrap()),
            )
            .await
            .unwrap();
        assert_eq!(rest.items.len(), 2);
        assert!(rest.next_cursor.is_none());
    }

    #[tokio::test]
    async fn pages_walk_the_whole_table() {
        let store = seeded(7, 3).await;
        let mut pages = Pages::new(&store, Table::UnfinishedTask, ScanRequest::new());

        let mut seen = Vec::new();
        while let Some(page) = pages.next_page().await {
            seen.extend(page.unwrap().items);
        }
        assert_eq!(seen.len(), 7);
        assert_eq!(pages.pages_fetched(), 3);
        assert!(pages.is_exhausted());
        assert!(pages.next_page().await.is_none());
    }

    #[tokio::test]
    async fn pages_resume_from_saved_cursor() {
        let store = seeded(7, 3).await;
        let mut first = Pages::new(&store, Table::UnfinishedTask, ScanRequest::new());
        let head = first.next_page().await.unwrap().unwrap();
        let saved = first.resume_cursor().cloned().unwrap();
        drop(first);

        let mut resumed = Pages::new(
            &store,
            Table::UnfinishedTask,
            ScanRequest::new().start_after(saved),
        );
        let mut rest = Vec::new();
        while let Some(page) = resumed.next_page().await {
            rest.extend(page.unwrap().items);
        }

        assert_eq!(head.items.len() + rest.len(), 7);
        assert_eq!(rest[0]["taskId"], json!("t-03"));
    }
}

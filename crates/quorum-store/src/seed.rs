use std::{fs, path::Path};

use quorum_model::Table;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{Store, StoreError};

/// SeedLoader populates a store from a directory of JSON files.
///
/// ```text
/// seed-dir/
/// ├── unfinished_task.json     → unfinished_task
/// ├── developer_profile.json   → developer_profile
/// ├── dataset.json             → dataset
/// └── dataset_d-1.json         → dataset_d-1
/// ```
///
/// Every file holds a JSON array of items. Files whose name is not a table
/// are skipped.
pub struct SeedLoader;

impl SeedLoader {
    /// Load every `<table>.json` file from `dir`. Returns the number of items
    /// written. A missing directory loads nothing.
    pub async fn load(dir: &Path, store: &dyn Store) -> Result<usize, StoreError> {
        if !dir.is_dir() {
            debug!("SeedLoader: seed dir {:?} does not exist, skipping", dir);
            return Ok(0);
        }

        let mut files = fs::read_dir(dir)
            .map_err(|e| seed_error(dir, e))?
            .map(|entry| entry.map(|e| e.path()).map_err(|e| seed_error(dir, e)))
            .collect::<Result<Vec<_>, _>>()?;
        files.sort();

        let mut count = 0;
        for path in files {
            if !path.is_file() || path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let table: Table = match stem.parse() {
                Ok(table) => table,
                Err(e) => {
                    warn!("SeedLoader: skipping {:?}: {}", path, e);
                    continue;
                }
            };

            count += Self::load_file(&path, &table, store).await?;
        }

        debug!("SeedLoader: loaded {} items from {:?}", count, dir);
        Ok(count)
    }

    async fn load_file(path: &Path, table: &Table, store: &dyn Store) -> Result<usize, StoreError> {
        let raw = fs::read_to_string(path).map_err(|e| seed_error(path, e))?;
        let items: Vec<Value> = serde_json::from_str(&raw).map_err(|e| seed_error(path, e))?;

        let mut count = 0;
        for value in items {
            let Value::Object(item) = value else {
                return Err(seed_error(path, "every entry must be a JSON object"));
            };
            store.put(table, item).await?;
            count += 1;
        }
        debug!("SeedLoader: {} items into '{}'", count, table);
        Ok(count)
    }
}

fn seed_error(path: &Path, reason: impl ToString) -> StoreError {
    StoreError::Seed {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

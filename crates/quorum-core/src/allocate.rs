use quorum_model::{
    AssignedTask, DeveloperId, DeveloperProfile, LabelerId, LabelerTask, Table, Task, TaskType,
};
use quorum_store::{Filter, Key, Pages, ScanRequest, from_item};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::{CoreConfig, CoreError, StorageOp, access::StoreAccess, ration::ration};

/// Hands out batches of unfinished tasks a labeler has not seen yet.
#[derive(Clone)]
pub struct Allocator {
    access: StoreAccess,
    config: CoreConfig,
}

impl Allocator {
    pub(crate) fn new(access: StoreAccess, config: CoreConfig) -> Self {
        Self { access, config }
    }

    /// Allocate up to the developer's `taskCount` tasks to a labeler.
    ///
    /// Fewer tasks come back when the pool runs out. Any storage failure
    /// aborts the whole allocation.
    #[instrument(level = "debug", skip(self), fields(labeler_id = %labeler_id, developer_id = %developer_id))]
    pub async fn allocate(
        &self,
        labeler_id: &LabelerId,
        developer_id: &DeveloperId,
    ) -> Result<Vec<AssignedTask>, CoreError> {
        let profile: DeveloperProfile = self
            .access
            .get(
                &Table::DeveloperProfile,
                &Key::new("developerId", developer_id.as_str()),
            )
            .await?
            .ok_or_else(|| CoreError::NotFound {
                entity: "developer profile",
                id: developer_id.to_string(),
            })?;

        let assigned = self.assigned_task_ids(labeler_id, &profile.kind).await?;
        let tasks = self
            .unfinished_tasks(&profile.kind, &assigned, profile.task_count as usize)
            .await?;

        let allocated: Vec<AssignedTask> = tasks
            .into_iter()
            .map(|task| {
                let class = ration(&task.class, profile.max_classes, self.config.max_occurrences);
                task.assign(class, labeler_id.clone(), developer_id.clone())
            })
            .collect();

        if self.config.record_assignment_on_allocate {
            for task in &allocated {
                self.access
                    .put(&Table::LabelerTask, &LabelerTask::from(task))
                    .await?;
            }
        }

        debug!(count = allocated.len(), wanted = profile.task_count, "allocated tasks");
        self.access.metrics().record_tasks_allocated(allocated.len());
        Ok(allocated)
    }

    /// Ids of tasks of `kind` the labeler already has.
    ///
    /// A single scan call: only what fits in one store page is seen.
    async fn assigned_task_ids(
        &self,
        labeler_id: &LabelerId,
        kind: &TaskType,
    ) -> Result<Vec<String>, CoreError> {
        let request = ScanRequest::new()
            .with_filter(
                Filter::eq("labelerId", labeler_id.as_str()).and(Filter::eq("type", kind.as_str())),
            )
            .with_projection(["taskId"]);

        let page = self.access.scan(&Table::LabelerTask, &request).await?;
        if page.next_cursor.is_some() {
            warn!(
                labeler_id = %labeler_id,
                seen = page.items.len(),
                "assigned task set truncated to one scan page; older assignments may be offered again"
            );
        }

        Ok(page
            .items
            .iter()
            .filter_map(|item| item.get("taskId").and_then(Value::as_str))
            .map(str::to_string)
            .collect())
    }

    async fn unfinished_tasks(
        &self,
        kind: &TaskType,
        exclude: &[String],
        wanted: usize,
    ) -> Result<Vec<Task>, CoreError> {
        if wanted == 0 {
            return Ok(Vec::new());
        }

        let mut filter = Filter::eq("type", kind.as_str());
        if !exclude.is_empty() {
            filter = filter.and(!Filter::is_in("taskId", exclude.iter().map(String::as_str)));
        }
        let request = ScanRequest::new().with_filter(filter).with_limit(wanted);

        let table = Table::UnfinishedTask;
        let mut pages = Pages::new(self.access.store(), table.clone(), request);
        let mut tasks = Vec::with_capacity(wanted);

        while tasks.len() < wanted {
            let Some(page) = pages.next_page().await else {
                break;
            };
            let page = page.map_err(|e| self.access.fail(StorageOp::Scan, &table, e))?;
            debug!(
                page = pages.pages_fetched(),
                items = page.items.len(),
                "scanned unfinished tasks"
            );

            for item in page.items {
                let task: Task =
                    from_item(item).map_err(|e| self.access.fail(StorageOp::Scan, &table, e))?;
                tasks.push(task);
            }
        }

        self.access.metrics().record_allocation_pages(pages.pages_fetched());
        tasks.truncate(wanted);
        Ok(tasks)
    }
}

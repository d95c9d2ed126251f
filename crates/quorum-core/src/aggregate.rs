use std::collections::HashMap;

use quorum_model::{
    AssignedTask, ClassSelection, Dataset, DatasetTask, Job, JobId, LabelerTask, Progress, Table,
    Task, TaskId,
};
use quorum_store::{AttrPath, Filter, Item, Key, Update, from_item};
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use crate::{CoreConfig, CoreError, StorageOp, TaskFailure, access::StoreAccess};

/// What one answer did to its task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Skipped by the labeler; only the attempt was recorded.
    Skipped,
    /// Counters advanced and the task still needs labels.
    Counted { progress: Progress },
    /// This answer completed the task.
    Finished { dataset_finished: bool },
    /// The task was complete before this answer; recorded, not counted.
    AlreadyFinished,
}

impl TaskOutcome {
    /// Metric label of the outcome.
    pub fn label(&self) -> &'static str {
        match self {
            TaskOutcome::Skipped => "skipped",
            TaskOutcome::Counted { .. } => "counted",
            TaskOutcome::Finished { .. } => "finished",
            TaskOutcome::AlreadyFinished => "already_finished",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskReport {
    pub task_id: TaskId,
    pub job_id: JobId,
    pub outcome: TaskOutcome,
}

/// Outcome of every answer of a batch, in submission order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmitReport {
    pub tasks: Vec<TaskReport>,
}

impl SubmitReport {
    pub fn finished(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| matches!(t.outcome, TaskOutcome::Finished { .. }))
            .count()
    }
}

/// Applies answered tasks to job records, task counters and dataset progress.
#[derive(Clone)]
pub struct Aggregator {
    access: StoreAccess,
    config: CoreConfig,
}

impl Aggregator {
    pub(crate) fn new(access: StoreAccess, config: CoreConfig) -> Self {
        Self { access, config }
    }

    /// Aggregate a batch of answers.
    ///
    /// Every answer runs on its own task and all of them run to completion.
    /// If any fails the batch fails with [`CoreError::PartialAggregation`]
    /// listing each failed answer; the effects of the others stay applied.
    #[instrument(level = "debug", skip(self, answers), fields(count = answers.len()))]
    pub async fn submit(&self, answers: Vec<AssignedTask>) -> Result<SubmitReport, CoreError> {
        let owners: Vec<(TaskId, JobId)> = answers
            .iter()
            .map(|a| (a.task_id.clone(), a.job_id.clone()))
            .collect();

        let mut set = JoinSet::new();
        let mut spawned = HashMap::with_capacity(owners.len());
        for (index, answer) in answers.into_iter().enumerate() {
            let this = self.clone();
            let handle = set.spawn(async move { (index, this.aggregate(answer).await) });
            spawned.insert(handle.id(), index);
        }

        let mut outcomes: Vec<Option<TaskOutcome>> = vec![None; owners.len()];
        let mut failures: Vec<(usize, Vec<CoreError>)> = Vec::new();

        while let Some(joined) = set.join_next_with_id().await {
            let (index, result) = match joined {
                Ok((_, done)) => done,
                Err(e) => {
                    let Some(&index) = spawned.get(&e.id()) else {
                        continue;
                    };
                    (index, Err(vec![CoreError::Internal(e.to_string())]))
                }
            };

            match result {
                Ok(outcome) => {
                    self.access.metrics().record_answer(outcome.label());
                    outcomes[index] = Some(outcome);
                }
                Err(errors) => {
                    self.access.metrics().record_answer("failed");
                    failures.push((index, errors));
                }
            }
        }

        if !failures.is_empty() {
            failures.sort_by_key(|(index, _)| *index);
            let succeeded = outcomes.iter().flatten().count();
            let failures: Vec<TaskFailure> = failures
                .into_iter()
                .map(|(index, errors)| {
                    let (task_id, job_id) = owners[index].clone();
                    TaskFailure {
                        task_id,
                        job_id,
                        errors,
                    }
                })
                .collect();
            warn!(failed = failures.len(), succeeded, "submission partially failed");
            return Err(CoreError::PartialAggregation {
                succeeded,
                failures,
            });
        }

        let tasks = owners
            .into_iter()
            .zip(outcomes)
            .filter_map(|((task_id, job_id), outcome)| {
                Some(TaskReport {
                    task_id,
                    job_id,
                    outcome: outcome?,
                })
            })
            .collect();
        Ok(SubmitReport { tasks })
    }

    /// Record the attempt and, unless skipped, count it. Both effects run
    /// concurrently and fail independently.
    async fn aggregate(&self, answer: AssignedTask) -> Result<TaskOutcome, Vec<CoreError>> {
        if answer.task_id.as_str().is_empty() || answer.job_id.as_str().is_empty() {
            return Err(vec![CoreError::InvalidAnswer(
                "taskId and jobId must not be empty".into(),
            )]);
        }

        if answer.skipped {
            return self
                .record(&answer)
                .await
                .map(|()| TaskOutcome::Skipped)
                .map_err(|e| vec![e]);
        }

        match tokio::join!(self.record(&answer), self.count(&answer)) {
            (Ok(()), Ok(outcome)) => Ok(outcome),
            (recorded, counted) => Err(recorded.err().into_iter().chain(counted.err()).collect()),
        }
    }

    async fn record(&self, answer: &AssignedTask) -> Result<(), CoreError> {
        let job = Job::from(answer);
        let assignment = LabelerTask::from(answer);
        tokio::try_join!(
            self.access.put(&Table::Job, &job),
            self.access.put(&Table::LabelerTask, &assignment),
        )?;
        Ok(())
    }

    /// Advance the task's counters with a compare-and-swap, re-reading on
    /// conflict up to `conflict_retries` times.
    async fn count(&self, answer: &AssignedTask) -> Result<TaskOutcome, CoreError> {
        let table = Table::UnfinishedTask;
        let key = Key::new("taskId", answer.task_id.as_str());
        let mut attempts = 0;

        loop {
            attempts += 1;
            let Some(task) = self.access.get::<Task>(&table, &key).await? else {
                return self.finished_elsewhere(&answer.task_id, &key).await;
            };

            let Some((update, condition)) =
                tally(&task, &answer.class, self.config.max_occurrences)
            else {
                // Nothing left to count. A complete task still sitting here
                // missed its migration; finish it again.
                if task.progress.is_complete() {
                    return self.migrate(task).await;
                }
                return Ok(TaskOutcome::Counted {
                    progress: task.progress,
                });
            };

            match self
                .access
                .try_update(&table, &key, &update, Some(&condition))
                .await?
            {
                Some(item) => return self.counted(item).await,
                None if attempts > self.config.conflict_retries => {
                    warn!(task_id = %answer.task_id, attempts, "giving up on contended task");
                    return Err(CoreError::Conflict {
                        task_id: answer.task_id.clone(),
                        attempts,
                    });
                }
                None => {
                    debug!(task_id = %answer.task_id, attempts, "task changed concurrently, re-reading");
                }
            }
        }
    }

    async fn counted(&self, item: Item) -> Result<TaskOutcome, CoreError> {
        let task: Task = from_item(item)
            .map_err(|e| self.access.fail(StorageOp::Update, &Table::UnfinishedTask, e))?;

        if task.progress.is_overshot() {
            warn!(
                task_id = %task.task_id,
                current = task.progress.current,
                total = task.progress.total,
                "task progress past its total"
            );
        }
        if task.progress.is_complete() {
            return self.migrate(task).await;
        }
        Ok(TaskOutcome::Counted {
            progress: task.progress,
        })
    }

    async fn finished_elsewhere(&self, task_id: &TaskId, key: &Key) -> Result<TaskOutcome, CoreError> {
        match self.access.get::<Item>(&Table::FinishedTask, key).await? {
            Some(_) => {
                debug!(%task_id, "answer for a finished task");
                Ok(TaskOutcome::AlreadyFinished)
            }
            None => Err(CoreError::NotFound {
                entity: "task",
                id: task_id.to_string(),
            }),
        }
    }

    /// Re-run the migration of one task.
    ///
    /// A complete task still in the unfinished table is moved; a task already
    /// in the finished table has its dataset counted if that step never
    /// landed. Safe to run any number of times.
    #[instrument(level = "info", skip(self), fields(task_id = %task_id))]
    pub async fn reconcile(&self, task_id: &TaskId) -> Result<TaskOutcome, CoreError> {
        let key = Key::new("taskId", task_id.as_str());
        if let Some(task) = self.access.get::<Task>(&Table::UnfinishedTask, &key).await? {
            if task.progress.is_complete() {
                return self.migrate(task).await;
            }
            return Ok(TaskOutcome::Counted {
                progress: task.progress,
            });
        }

        match self.access.get::<Task>(&Table::FinishedTask, &key).await? {
            Some(task) => self.settle(&task).await,
            None => Err(CoreError::NotFound {
                entity: "task",
                id: task_id.to_string(),
            }),
        }
    }

    /// Move a complete task to the finished table and cascade to its dataset.
    #[instrument(level = "debug", skip(self, task), fields(task_id = %task.task_id, dataset_id = %task.dataset_id))]
    async fn migrate(&self, task: Task) -> Result<TaskOutcome, CoreError> {
        let key = Key::new("taskId", task.task_id.as_str());
        self.access.put(&Table::FinishedTask, &task).await?;
        self.access.delete(&Table::UnfinishedTask, &key).await?;
        self.settle(&task).await
    }

    /// Count a finished task in its dataset exactly once.
    ///
    /// The increment and a `counted.<taskId>` marker land in one conditional
    /// update on the dataset row; the sub-table row is flipped only after it.
    /// A failure at any step leaves a state this can be re-run from.
    async fn settle(&self, task: &Task) -> Result<TaskOutcome, CoreError> {
        let key = Key::new("taskId", task.task_id.as_str());
        let members = Table::DatasetTasks(task.dataset_id.clone());
        let member: Option<DatasetTask> = self.access.get(&members, &key).await?;
        if member.is_some_and(|m| m.finished) {
            debug!("dataset already counted this task");
            return Ok(TaskOutcome::AlreadyFinished);
        }

        let dataset_key = Key::new("datasetId", task.dataset_id.as_str());
        let marker = AttrPath::from_segments(["counted", task.task_id.as_str()]);
        let claim = Update::new()
            .add("progress.current", 1)
            .set(marker.clone(), true);
        let unclaimed = Filter::exists("progress.total").and(!Filter::exists(marker.clone()));

        let Some(item) = self
            .access
            .try_update(&Table::Dataset, &dataset_key, &claim, Some(&unclaimed))
            .await?
        else {
            return self.claimed_elsewhere(task, &dataset_key, &marker).await;
        };
        self.flip_member(&members, &key).await?;
        info!(task_id = %task.task_id, "task finished");
        self.access.metrics().record_task_finished();

        let dataset: Dataset =
            from_item(item).map_err(|e| self.access.fail(StorageOp::Update, &Table::Dataset, e))?;

        if dataset.progress.is_overshot() {
            warn!(
                current = dataset.progress.current,
                total = dataset.progress.total,
                "dataset progress past its total"
            );
        }
        if !dataset.progress.is_complete() {
            return Ok(TaskOutcome::Finished {
                dataset_finished: false,
            });
        }

        self.access
            .try_update(
                &Table::Dataset,
                &dataset_key,
                &Update::new().set("finished", true),
                None,
            )
            .await?;
        info!(dataset_id = %task.dataset_id, "dataset finished");
        self.access.metrics().record_dataset_finished();
        Ok(TaskOutcome::Finished {
            dataset_finished: true,
        })
    }

    /// The dataset claim was refused: the dataset is missing, or this task
    /// is already counted in it.
    async fn claimed_elsewhere(
        &self,
        task: &Task,
        dataset_key: &Key,
        marker: &AttrPath,
    ) -> Result<TaskOutcome, CoreError> {
        let dataset = self.access.get::<Item>(&Table::Dataset, dataset_key).await?;
        let Some(dataset) = dataset.filter(|d| Filter::exists("progress.total").matches(d)) else {
            return Err(CoreError::NotFound {
                entity: "dataset",
                id: task.dataset_id.to_string(),
            });
        };
        if !Filter::exists(marker.clone()).matches(&dataset) {
            warn!(task_id = %task.task_id, "dataset claim refused without a marker");
            return Err(CoreError::Conflict {
                task_id: task.task_id.clone(),
                attempts: 1,
            });
        }

        let members = Table::DatasetTasks(task.dataset_id.clone());
        self.flip_member(&members, &Key::new("taskId", task.task_id.as_str()))
            .await?;
        debug!("dataset already counted this task");
        Ok(TaskOutcome::AlreadyFinished)
    }

    async fn flip_member(&self, members: &Table, key: &Key) -> Result<(), CoreError> {
        self.access
            .try_update(members, key, &Update::new().set("finished", true), None)
            .await?;
        Ok(())
    }
}

/// Build the counter update for an answer and the condition that the task
/// still holds the values it was computed from. `None` when the answer
/// counts nothing.
///
/// Every class present in the answer counts, whatever the labeler picked;
/// counters already at `max_occurrences` stay there.
fn tally(task: &Task, answer: &ClassSelection, max_occurrences: u32) -> Option<(Update, Filter)> {
    let mut update = Update::new();
    let mut conditions = vec![Filter::eq("progress.current", task.progress.current)];
    let mut completed = 0i64;

    for class in answer.names() {
        let Some(count) = task.class.get(class) else {
            warn!(task_id = %task.task_id, class, "answer names a class the task does not have");
            continue;
        };
        if count >= max_occurrences {
            continue;
        }

        let path = AttrPath::from_segments(["class", class]);
        conditions.push(Filter::eq(path.clone(), count));
        update = update.add(path, 1);
        if count + 1 == max_occurrences {
            completed += 1;
        }
    }

    if update.is_empty() {
        return None;
    }
    if completed > 0 {
        update = update.add("progress.current", completed);
    }
    Some((update, Filter::all(conditions)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use quorum_model::ClassCounts;

    fn task(classes: &[(&str, u32)], current: u32) -> Task {
        Task {
            task_id: "t-1".into(),
            kind: "text".into(),
            data: serde_json::Value::Null,
            multiclass: false,
            instructions: String::new(),
            class: classes.iter().map(|(k, v)| (*k, *v)).collect::<ClassCounts>(),
            progress: Progress::new(current, classes.len() as u32),
            dataset_id: "d-1".into(),
        }
    }

    fn answer(classes: &[&str]) -> ClassSelection {
        classes.iter().map(|c| (*c, true)).collect()
    }

    #[test]
    fn tally_counts_known_classes_and_completes_at_target() {
        let t = task(&[("A", 4), ("B", 0), ("C", 5)], 1);
        let (update, condition) = tally(&t, &answer(&["A", "B", "C", "Z"]), 5).unwrap();

        let mut item = quorum_store::to_item(&t).unwrap();
        assert!(condition.matches(&item));
        update.apply(&mut item).unwrap();

        let after: Task = from_item(item).unwrap();
        assert_eq!(after.class.get("A"), Some(5));
        assert_eq!(after.class.get("B"), Some(1));
        assert_eq!(after.class.get("C"), Some(5));
        assert_eq!(after.progress, Progress::new(2, 3));
    }

    #[test]
    fn tally_condition_rejects_changed_counters() {
        let t = task(&[("A", 1), ("B", 0)], 0);
        let (_, condition) = tally(&t, &answer(&["A"]), 5).unwrap();

        let mut moved = t.clone();
        moved.class.insert("A", 2);
        assert!(!condition.matches(&quorum_store::to_item(&moved).unwrap()));
    }

    #[test]
    fn tally_is_empty_when_nothing_counts() {
        let t = task(&[("A", 5)], 1);
        assert!(tally(&t, &answer(&["A", "Z"]), 5).is_none());
        assert!(tally(&t, &ClassSelection::new(), 5).is_none());
    }

    #[test]
    fn unanswered_classes_still_count() {
        let t = task(&[("A", 0), ("B", 0)], 0);
        let shown: ClassSelection = [("A", true), ("B", false)].into_iter().collect();
        let (update, _) = tally(&t, &shown, 5).unwrap();
        assert_eq!(update.actions().len(), 2);
    }
}

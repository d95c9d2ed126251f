use serde::{Deserialize, Serialize};

use crate::{DeveloperId, TaskType};

/// Allocation policy of a developer's labeling campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeveloperProfile {
    pub developer_id: DeveloperId,
    /// Only tasks of this type are handed out.
    #[serde(rename = "type")]
    pub kind: TaskType,
    /// Batch size of one allocation.
    pub task_count: u32,
    /// Upper bound on classes exposed per task.
    pub max_classes: u32,
}

mod ids;
pub use ids::{DatasetId, DeveloperId, JobId, LabelerId, TaskId, TaskType};

mod progress;
pub use progress::Progress;

mod class_map;
pub use class_map::{ClassCounts, ClassSelection};

mod labeling;
pub use labeling::LabelingMethod;

mod table;
pub use table::{Table, TableError};

/// Wall-clock instant in milliseconds since the unix epoch.
///
/// Timestamps are filled in by the labeling client; the service only stores them.
pub type TimestampMs = i64;

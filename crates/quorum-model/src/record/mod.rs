mod task;
pub use task::{AssignedTask, Task};

mod job;
pub use job::{Job, LabelerTask};

mod dataset;
pub use dataset::{Dataset, DatasetTask};

mod developer;
pub use developer::DeveloperProfile;

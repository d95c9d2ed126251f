use std::{borrow::Borrow, fmt};

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            #[inline]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Identifier of a task, unique across the unfinished and finished tables.
    TaskId
);
string_id!(
    /// Identifier of one labeler's attempt at one task.
    JobId
);
string_id!(
    /// Identifier of the human answering tasks.
    LabelerId
);
string_id!(
    /// Identifier of the campaign owner whose profile drives allocation.
    DeveloperId
);
string_id!(
    /// Identifier of the dataset a task belongs to.
    DatasetId
);
string_id!(
    /// Category of task content (e.g. `"text"`).
    TaskType
);

impl JobId {
    /// Generate a fresh job identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_job_ids_are_distinct() {
        let a = JobId::generate();
        let b = JobId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 32);
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = TaskId::from("1413413089602753");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, r#""1413413089602753""#);
    }
}

use serde::{Deserialize, Serialize};

/// How the labeler answers a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LabelingMethod {
    /// Pick one or more classes from the exposed set.
    #[default]
    MultipleChoice,
}

impl LabelingMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            LabelingMethod::MultipleChoice => "multipleChoice",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_name_matches_client() {
        let json = serde_json::to_string(&LabelingMethod::MultipleChoice).unwrap();
        assert_eq!(json, format!("\"{}\"", LabelingMethod::MultipleChoice.as_str()));
    }
}

use serde_json::Value;

use crate::{
    StoreError,
    item::{AttrPath, Item},
};

#[derive(Debug, Clone, PartialEq)]
pub enum UpdateAction {
    /// Overwrite the attribute.
    Set(AttrPath, Value),
    /// Add to a numeric attribute; a missing attribute starts at zero.
    Add(AttrPath, i64),
}

/// Ordered list of attribute updates applied atomically to one item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Update {
    actions: Vec<UpdateAction>,
}

impl Update {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, path: impl Into<AttrPath>, value: impl Into<Value>) -> Self {
        self.actions
            .push(UpdateAction::Set(path.into(), value.into()));
        self
    }

    pub fn add(mut self, path: impl Into<AttrPath>, delta: i64) -> Self {
        self.actions.push(UpdateAction::Add(path.into(), delta));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn actions(&self) -> &[UpdateAction] {
        &self.actions
    }

    /// Apply every action in order. On error the item may be partially
    /// modified, so callers apply to a copy.
    pub fn apply(&self, item: &mut Item) -> Result<(), StoreError> {
        for action in &self.actions {
            match action {
                UpdateAction::Set(path, value) => path.set(item, value.clone())?,
                UpdateAction::Add(path, delta) => {
                    let current = match path.get(item) {
                        None => 0,
                        Some(value) => value.as_i64().ok_or_else(|| {
                            StoreError::InvalidUpdate(format!(
                                "cannot add to non-integer attribute '{path}'"
                            ))
                        })?,
                    };
                    let next = current.checked_add(*delta).ok_or_else(|| {
                        StoreError::InvalidUpdate(format!("overflow adding to '{path}'"))
                    })?;
                    path.set(item, Value::from(next))?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_and_add_nested() {
        let mut item = json!({"progress": {"current": 1, "total": 3}})
            .as_object()
            .cloned()
            .unwrap();

        Update::new()
            .add("progress.current", 1)
            .set("finished", true)
            .add("counter", 2)
            .apply(&mut item)
            .unwrap();

        assert_eq!(item["progress"]["current"], json!(2));
        assert_eq!(item["finished"], json!(true));
        assert_eq!(item["counter"], json!(2));
    }

    #[test]
    fn add_rejects_non_integers() {
        let mut item = json!({"type": "text"}).as_object().cloned().unwrap();
        let err = Update::new().add("type", 1).apply(&mut item).unwrap_err();
        assert!(matches!(err, StoreError::InvalidUpdate(_)));
    }
}

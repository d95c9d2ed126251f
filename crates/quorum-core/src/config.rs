use crate::CoreError;

pub const DEFAULT_MAX_OCCURRENCES: u32 = 5;
pub const DEFAULT_CONFLICT_RETRIES: u32 = 3;

#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Labels wanted per class of a task (default: 5).
    pub max_occurrences: u32,
    /// Re-reads after a concurrent modification before giving up (default: 3).
    pub conflict_retries: u32,
    /// Write the LabelerTask row when a task is handed out instead of when
    /// it is answered.
    pub record_assignment_on_allocate: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            max_occurrences: DEFAULT_MAX_OCCURRENCES,
            conflict_retries: DEFAULT_CONFLICT_RETRIES,
            record_assignment_on_allocate: false,
        }
    }
}

impl CoreConfig {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.max_occurrences == 0 {
            return Err(CoreError::InvalidConfig(
                "max_occurrences must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = CoreConfig::default();
        assert_eq!(cfg.max_occurrences, 5);
        assert_eq!(cfg.conflict_retries, 3);
        assert!(!cfg.record_assignment_on_allocate);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn zero_occurrences_rejected() {
        let cfg = CoreConfig {
            max_occurrences: 0,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(CoreError::InvalidConfig(_))));
    }
}

//! Counts - registry の state ごとの集計

use serde::{Deserialize, Serialize};

use super::TaskState;

/// Number of tasks in each state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryCounts {
    pub pending: usize,
    pub running: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl RegistryCounts {
    pub fn from_states(states: impl IntoIterator<Item = TaskState>) -> Self {
        let mut counts = Self::default();
        for state in states {
            match state {
                TaskState::Pending => counts.pending += 1,
                TaskState::Running => counts.running += 1,
                TaskState::Succeeded => counts.succeeded += 1,
                TaskState::Failed => counts.failed += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.pending + self.running + self.succeeded + self.failed
    }

    /// No task is waiting or running.
    pub fn is_settled(&self) -> bool {
        self.pending == 0 && self.running == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_each_state() {
        let counts = RegistryCounts::from_states([
            TaskState::Pending,
            TaskState::Running,
            TaskState::Running,
            TaskState::Succeeded,
            TaskState::Failed,
        ]);
        assert_eq!(
            counts,
            RegistryCounts {
                pending: 1,
                running: 2,
                succeeded: 1,
                failed: 1,
            }
        );
        assert_eq!(counts.total(), 5);
        assert!(!counts.is_settled());
    }

    #[test]
    fn empty_registry_is_settled() {
        assert!(RegistryCounts::default().is_settled());
    }
}

//! Checklist tracker.
//!
//! Checklists are progress information for technicians, nothing more:
//! toggling an entry never changes an item's stage or history, and an
//! incomplete checklist never blocks a transition.

use atelier_types::workflow::Stage;

/// Completion summary of a stage's checklist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChecklistProgress {
    pub completed: usize,
    pub total: usize,
}

impl ChecklistProgress {
    /// Fraction complete in [0, 1]. A stage without a checklist reports 1.0.
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

/// Set the completion state of one checklist entry, returning the updated
/// stage.
///
/// An unknown entry id leaves the stage unchanged -- the catalog may have
/// been edited since the caller's board was rendered, and checklist state
/// is informational only.
pub fn toggle(stage: &Stage, entry_id: &str, completed: bool) -> Stage {
    let mut updated = stage.clone();
    if let Some(entry) = updated.checklist.iter_mut().find(|e| e.id == entry_id) {
        entry.completed = completed;
    } else {
        tracing::debug!(
            stage = stage.id.as_str(),
            entry = entry_id,
            "checklist toggle for unknown entry ignored"
        );
    }
    updated
}

/// Completion summary of a stage's checklist.
pub fn progress(stage: &Stage) -> ChecklistProgress {
    ChecklistProgress {
        completed: stage.checklist.iter().filter(|e| e.completed).count(),
        total: stage.checklist.len(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Workflow catalog domain types for Atelier.
//!
//! A `WorkflowDefinition` is an ordered list of processing stages (e.g.
//! soak -> rinse -> dry for a cleaning workflow). A sellable service carries
//! a `ServicePipeline`: the ordered chain of workflows an item sold under
//! that service must traverse. Catalog definitions are consumed read-only by
//! the transition engine; administrative edits happen elsewhere.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Terminal status markers
// ---------------------------------------------------------------------------

/// Reserved status marker for an item whose pipeline is exhausted.
///
/// Stored directly in `WorkItem::current_stage_id`, which doubles as the
/// item's status field for legacy compatibility.
pub const STAGE_DONE: &str = "done";

/// Reserved status marker for an item rejected with no prior segment.
pub const STAGE_CANCEL: &str = "cancel";

/// Whether a status string is one of the reserved terminal markers.
pub fn is_terminal_status(status: &str) -> bool {
    status == STAGE_DONE || status == STAGE_CANCEL
}

// ---------------------------------------------------------------------------
// Workflow Definition
// ---------------------------------------------------------------------------

/// A workflow: an ordered sequence of processing stages.
///
/// Stage order is defined by `Stage::order` (unique within one workflow),
/// not by vector position. The stage with the minimum order is the
/// workflow's entry point; the maximum order is its exit point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    /// Catalog-unique workflow identifier (slug, e.g. "wash").
    pub id: String,
    /// Human-readable display label (e.g. "Cleaning Workflow").
    pub name: String,
    /// The stages of this workflow. Order field defines sequence.
    #[serde(default)]
    pub stages: Vec<Stage>,
    /// Personnel roles allowed to move items through this workflow.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assigned_roles: Vec<String>,
}

/// A single processing stage within a workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stage {
    /// Stage identifier, unique within its workflow (e.g. "rinse").
    pub id: String,
    /// Human-readable stage name shown on boards.
    pub name: String,
    /// Position in the workflow sequence. Unique per workflow.
    pub order: u32,
    /// Optional sub-task checklist for technicians.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub checklist: Vec<ChecklistEntry>,
}

/// A sub-task on a stage's checklist.
///
/// Checklist completion is informational only -- it never gates a stage
/// transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecklistEntry {
    /// Entry identifier, unique within its stage.
    pub id: String,
    /// What the technician has to do.
    pub title: String,
    /// Whether the sub-task has been ticked off.
    #[serde(default)]
    pub completed: bool,
    /// Display position within the checklist.
    pub order: u32,
}

// ---------------------------------------------------------------------------
// Service Pipeline
// ---------------------------------------------------------------------------

/// An ordered pointer to one workflow inside a service's pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowSegmentRef {
    /// The workflow this segment refers to (matched against
    /// `WorkflowDefinition::id`, with a label fallback for edited catalogs).
    pub workflow_id: String,
    /// Position of this segment in the pipeline. Unique per pipeline.
    pub order: u32,
}

/// The full chain of workflows an item sold under a service must traverse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicePipeline {
    /// Catalog-unique service identifier (e.g. "full-care").
    pub service_id: String,
    /// Human-readable service name.
    pub name: String,
    /// Ordered workflow segments. Order field defines sequence.
    #[serde(default)]
    pub segments: Vec<WorkflowSegmentRef>,
}

impl WorkflowDefinition {
    /// The stage with the minimum order, if any (the workflow's entry point).
    pub fn entry_stage(&self) -> Option<&Stage> {
        self.stages.iter().min_by_key(|s| s.order)
    }

    /// The stage with the maximum order, if any (the workflow's exit point).
    pub fn exit_stage(&self) -> Option<&Stage> {
        self.stages.iter().max_by_key(|s| s.order)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

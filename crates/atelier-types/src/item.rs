//! Work item and stage history types.
//!
//! A `WorkItem` is the mutable entity the transition engine operates on: one
//! physical item on a customer order, tracked through the stages of its
//! service pipeline. Every stage entry/exit is recorded in an append-only
//! `HistoryEntry` timeline with dwell-duration accounting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::workflow::is_terminal_status;

// ---------------------------------------------------------------------------
// Work Item
// ---------------------------------------------------------------------------

/// One physical item on a customer order, moving through a service pipeline.
///
/// `current_stage_id` doubles as the item's status field: it normally holds
/// a catalog stage id, but the reserved markers `done` / `cancel` (and, for
/// pre-migration data, a legacy English label) can appear in it as well.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkItem {
    /// UUIDv7 item id (time-sortable).
    pub id: Uuid,
    /// The customer order this item belongs to.
    pub order_id: Uuid,
    /// Display name of the physical item (e.g. "suede jacket").
    pub name: String,
    /// The sellable service this item was ordered under; resolves to a
    /// `ServicePipeline` in the catalog.
    pub service_ref: String,
    /// The workflow segment the item is currently inside. Empty only when
    /// the item was terminal on creation (service with no segments).
    pub current_workflow_id: String,
    /// Current stage id, or a terminal marker (`done` / `cancel`).
    pub current_stage_id: String,
    /// Append-only timeline of stage entries.
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    /// When the item was created.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp; used by hosts for optimistic concurrency.
    pub last_updated_at: DateTime<Utc>,
    /// Reason supplied when the item was terminally cancelled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel_reason: Option<String>,
}

impl WorkItem {
    /// Whether the item has reached `done` or `cancel` and can no longer be
    /// transitioned.
    pub fn is_terminal(&self) -> bool {
        is_terminal_status(&self.current_stage_id)
    }

    /// The single open history entry (no `left_at` yet), if any.
    ///
    /// Invariant: at most one entry is open at any time; it corresponds to
    /// `current_stage_id`.
    pub fn open_entry(&self) -> Option<&HistoryEntry> {
        self.history.iter().find(|e| e.left_at.is_none())
    }

    /// Mutable access to the open history entry.
    pub fn open_entry_mut(&mut self) -> Option<&mut HistoryEntry> {
        self.history.iter_mut().find(|e| e.left_at.is_none())
    }
}

// ---------------------------------------------------------------------------
// History Entry
// ---------------------------------------------------------------------------

/// One stage visit in an item's timeline.
///
/// `left_at` and `duration_ms` are absent while the item is still in the
/// stage; both are set together when the item moves on. Durations are
/// clamped to zero under clock skew, never negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Stage id at the time of entry.
    pub stage_id: String,
    /// Stage name, denormalized for display after catalog edits.
    pub stage_name: String,
    /// When the item entered the stage.
    pub entered_at: DateTime<Utc>,
    /// When the item left the stage. Absent while current.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_at: Option<DateTime<Utc>>,
    /// Dwell time in milliseconds. Present iff `left_at` is present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<i64>,
    /// Who performed the move that entered this stage.
    pub performed_by: String,
}

// ---------------------------------------------------------------------------
// Move classification
// ---------------------------------------------------------------------------

/// How a requested stage move is classified by the transition validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveKind {
    /// Ordinary step to a later stage in the current segment.
    Forward,
    /// Step to an earlier stage; requires a caller-supplied reason.
    Backward,
    /// Exhausts the current segment; chains into the next one or finishes.
    CompleteSegment,
    /// Rejection; chains back into the previous segment or cancels.
    Cancel,
    /// Target equals the current stage; nothing happens.
    NoOp,
}

impl MoveKind {
    /// Whether the caller must supply a non-empty reason before the move is
    /// applied (two-phase request -> confirm protocol).
    pub fn requires_reason(self) -> bool {
        matches!(self, MoveKind::Backward | MoveKind::Cancel)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

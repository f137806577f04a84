//! Activity log and engine event types.
//!
//! `ActivityLogEntry` is the host-facing audit record produced by every
//! confirmed move; `ItemEvent` is the unified event type broadcast during
//! item transitions for dashboards and notification senders.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::item::MoveKind;

// ---------------------------------------------------------------------------
// Activity log
// ---------------------------------------------------------------------------

/// Display severity of an activity log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogSeverity {
    Info,
    Warning,
    Danger,
}

/// Host-facing audit/notification record for one engine action.
///
/// Rendering is a host concern; the engine only fills in the fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    /// Machine-readable action slug (e.g. "stage_forward", "item_cancelled").
    pub action: String,
    /// Display name of the item the action applies to.
    pub item_name: String,
    /// Human-readable details (stage names, reasons, warnings).
    pub details_text: String,
    /// How prominently the host should surface this entry.
    pub severity: LogSeverity,
}

impl ActivityLogEntry {
    /// Build an info-severity entry.
    pub fn info(action: &str, item_name: &str, details: impl Into<String>) -> Self {
        Self {
            action: action.to_string(),
            item_name: item_name.to_string(),
            details_text: details.into(),
            severity: LogSeverity::Info,
        }
    }

    /// Build a warning-severity entry.
    pub fn warning(action: &str, item_name: &str, details: impl Into<String>) -> Self {
        Self {
            severity: LogSeverity::Warning,
            ..Self::info(action, item_name, details)
        }
    }

    /// Build a danger-severity entry.
    pub fn danger(action: &str, item_name: &str, details: impl Into<String>) -> Self {
        Self {
            severity: LogSeverity::Danger,
            ..Self::info(action, item_name, details)
        }
    }
}

// ---------------------------------------------------------------------------
// Item events
// ---------------------------------------------------------------------------

/// Events broadcast while items move through their pipelines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ItemEvent {
    /// A new item was seeded into its first workflow/stage.
    ItemSeeded {
        item_id: Uuid,
        order_id: Uuid,
        workflow_id: String,
        stage_id: String,
    },
    /// An item moved between stages within one segment.
    StageChanged {
        item_id: Uuid,
        workflow_id: String,
        from_stage: String,
        to_stage: String,
        kind: MoveKind,
        performed_by: String,
    },
    /// An item finished a segment and chained into the next one.
    SegmentCompleted {
        item_id: Uuid,
        completed_workflow_id: String,
        next_workflow_id: String,
    },
    /// An item exhausted its whole pipeline and is now `done`.
    PipelineCompleted { item_id: Uuid },
    /// A rejection chained the item back into the previous segment.
    ItemReverted {
        item_id: Uuid,
        to_workflow_id: String,
        to_stage: String,
        reason: String,
    },
    /// A rejection with no prior segment terminally cancelled the item.
    ItemCancelled { item_id: Uuid, reason: String },
    /// Catalog data forced a degraded decision (empty segment, unresolved
    /// pipeline); surfaced for operator attention.
    ConfigWarning { item_id: Uuid, detail: String },
}

impl ItemEvent {
    /// The item this event concerns.
    pub fn item_id(&self) -> Uuid {
        match self {
            ItemEvent::ItemSeeded { item_id, .. }
            | ItemEvent::StageChanged { item_id, .. }
            | ItemEvent::SegmentCompleted { item_id, .. }
            | ItemEvent::PipelineCompleted { item_id }
            | ItemEvent::ItemReverted { item_id, .. }
            | ItemEvent::ItemCancelled { item_id, .. }
            | ItemEvent::ConfigWarning { item_id, .. } => *item_id,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_log_builders() {
        let entry = ActivityLogEntry::info("stage_forward", "suede jacket", "Soak -> Rinse");
        assert_eq!(entry.severity, LogSeverity::Info);
        assert_eq!(entry.action, "stage_forward");

        let entry = ActivityLogEntry::warning("config_warning", "suede jacket", "empty segment");
        assert_eq!(entry.severity, LogSeverity::Warning);

        let entry = ActivityLogEntry::danger("item_cancelled", "suede jacket", "torn lining");
        assert_eq!(entry.severity, LogSeverity::Danger);
        assert_eq!(entry.item_name, "suede jacket");
    }

    #[test]
    fn test_log_severity_serde() {
        assert_eq!(
            serde_json::to_string(&LogSeverity::Danger).unwrap(),
            "\"danger\""
        );
        let parsed: LogSeverity = serde_json::from_str("\"warning\"").unwrap();
        assert_eq!(parsed, LogSeverity::Warning);
    }

    #[test]
    fn test_item_event_tagged_serde() {
        let event = ItemEvent::ItemCancelled {
            item_id: Uuid::nil(),
            reason: "color mismatch".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"item_cancelled\""));
        let parsed: ItemEvent = serde_json::from_str(&json).unwrap();
        assert!(matches!(parsed, ItemEvent::ItemCancelled { .. }));
    }

    #[test]
    fn test_item_event_id_accessor() {
        let id = Uuid::now_v7();
        let event = ItemEvent::PipelineCompleted { item_id: id };
        assert_eq!(event.item_id(), id);

        let event = ItemEvent::StageChanged {
            item_id: id,
            workflow_id: "wash".to_string(),
            from_stage: "soak".to_string(),
            to_stage: "rinse".to_string(),
            kind: MoveKind::Forward,
            performed_by: "marie".to_string(),
        };
        assert_eq!(event.item_id(), id);
    }
}

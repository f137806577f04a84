//! Transition validator: classifies a requested stage move and gates the
//! inputs it needs.
//!
//! Classification is pure and side-effect free; the two-phase protocol
//! (request -> confirm-with-reason) is enforced by `validate_reason`, which
//! blocks backward and cancel moves until the caller supplies a non-empty
//! reason.

use std::collections::HashMap;

use atelier_types::item::{MoveKind, WorkItem};
use atelier_types::workflow::{STAGE_CANCEL, STAGE_DONE};
use thiserror::Error;

use super::resolver::{stage_order, SegmentStages};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that block a requested move.
///
/// Both variants are caller-recoverable: a terminal item simply cannot be
/// moved, and a missing reason is fixed by resubmitting with one.
#[derive(Debug, Error)]
pub enum TransitionError {
    /// The item already reached `done` or `cancel`.
    #[error("item '{item}' is in terminal state '{status}' and cannot be moved")]
    ItemTerminal { item: String, status: String },

    /// A backward or cancel move was submitted without a reason.
    #[error("a non-empty reason is required to move item '{item}' backward or cancel it")]
    MissingReason { item: String },
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Outcome of classification-only `request_move`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveDecision {
    pub kind: MoveKind,
    /// Whether `confirm_move` will demand a reason for this move.
    pub requires_reason: bool,
}

/// Classify a requested move of `item` to `target_stage_id` within the
/// given segment.
///
/// The reserved `done` / `cancel` markers short-circuit to segment
/// completion and cancellation. Otherwise the stages' orders decide the
/// direction. An item whose current stage cannot be located in the segment
/// (legacy data predating the catalog schema) moves forward
/// unconditionally -- permissive, with a warning for auditability.
pub fn classify(
    item: &WorkItem,
    target_stage_id: &str,
    segment: &SegmentStages,
    legacy_status_map: &HashMap<String, String>,
) -> MoveKind {
    if target_stage_id == item.current_stage_id {
        return MoveKind::NoOp;
    }
    if target_stage_id == STAGE_DONE {
        return MoveKind::CompleteSegment;
    }
    if target_stage_id == STAGE_CANCEL {
        return MoveKind::Cancel;
    }

    let current = stage_order(segment, &item.current_stage_id, legacy_status_map);
    let target = stage_order(segment, target_stage_id, legacy_status_map);

    match (current, target) {
        (Some(c), Some(t)) => match t.cmp(&c) {
            std::cmp::Ordering::Greater => MoveKind::Forward,
            std::cmp::Ordering::Less => MoveKind::Backward,
            // Orders are unique per workflow, so equality means the same
            // stage under a legacy alias.
            std::cmp::Ordering::Equal => MoveKind::NoOp,
        },
        _ => {
            tracing::warn!(
                item_id = %item.id,
                current_stage = item.current_stage_id.as_str(),
                target_stage = target_stage_id,
                workflow = segment.workflow_id.as_str(),
                "stage not found in segment, treating move as forward"
            );
            MoveKind::Forward
        }
    }
}

/// Classify and report whether a reason will be demanded.
pub fn decide(
    item: &WorkItem,
    target_stage_id: &str,
    segment: &SegmentStages,
    legacy_status_map: &HashMap<String, String>,
) -> MoveDecision {
    let kind = classify(item, target_stage_id, segment, legacy_status_map);
    MoveDecision {
        kind,
        requires_reason: kind.requires_reason(),
    }
}

/// Enforce the reason gate for a classified move.
///
/// Returns the trimmed reason when one is required and present; empty and
/// whitespace-only strings are rejected the same as absence.
pub fn validate_reason(
    item: &WorkItem,
    kind: MoveKind,
    reason: Option<&str>,
) -> Result<Option<String>, TransitionError> {
    if !kind.requires_reason() {
        return Ok(None);
    }

    match reason.map(str::trim) {
        Some(r) if !r.is_empty() => Ok(Some(r.to_string())),
        _ => Err(TransitionError::MissingReason {
            item: item.name.clone(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::resolver::MatchTier;
    use atelier_types::workflow::Stage;
    use chrono::Utc;
    use uuid::Uuid;

    fn segment(stage_ids: &[&str]) -> SegmentStages {
        SegmentStages {
            workflow_id: "wash".to_string(),
            workflow_name: "Cleaning Workflow".to_string(),
            stages: stage_ids
                .iter()
                .enumerate()
                .map(|(i, id)| Stage {
                    id: id.to_string(),
                    name: id.to_string(),
                    order: i as u32,
                    checklist: vec![],
                })
                .collect(),
            tier: MatchTier::ExactId,
        }
    }

    fn item_at(stage: &str) -> WorkItem {
        let now = Utc::now();
        WorkItem {
            id: Uuid::now_v7(),
            order_id: Uuid::now_v7(),
            name: "suede jacket".to_string(),
            service_ref: "full-care".to_string(),
            current_workflow_id: "wash".to_string(),
            current_stage_id: stage.to_string(),
            history: vec![],
            created_at: now,
            last_updated_at: now,
            cancel_reason: None,
        }
    }

    fn no_legacy() -> HashMap<String, String> {
        HashMap::new()
    }

    #[test]
    fn classify_no_op_when_target_is_current() {
        let kind = classify(&item_at("soak"), "soak", &segment(&["soak", "rinse"]), &no_legacy());
        assert_eq!(kind, MoveKind::NoOp);
    }

    #[test]
    fn classify_done_marker_completes_segment() {
        let kind = classify(&item_at("rinse"), "done", &segment(&["soak", "rinse"]), &no_legacy());
        assert_eq!(kind, MoveKind::CompleteSegment);
    }

    #[test]
    fn classify_cancel_marker() {
        let kind = classify(&item_at("soak"), "cancel", &segment(&["soak", "rinse"]), &no_legacy());
        assert_eq!(kind, MoveKind::Cancel);
    }

    #[test]
    fn classify_forward_and_backward_by_order() {
        let seg = segment(&["soak", "rinse", "dry"]);
        assert_eq!(
            classify(&item_at("soak"), "dry", &seg, &no_legacy()),
            MoveKind::Forward
        );
        assert_eq!(
            classify(&item_at("dry"), "soak", &seg, &no_legacy()),
            MoveKind::Backward
        );
    }

    #[test]
    fn classify_unknown_current_stage_is_permissive_forward() {
        // Legacy data: the item's status never belonged to this workflow.
        let seg = segment(&["soak", "rinse"]);
        assert_eq!(
            classify(&item_at("Waiting On Parts"), "soak", &seg, &no_legacy()),
            MoveKind::Forward
        );
    }

    #[test]
    fn classify_unknown_target_stage_is_permissive_forward() {
        let seg = segment(&["soak", "rinse"]);
        assert_eq!(
            classify(&item_at("rinse"), "polish", &seg, &no_legacy()),
            MoveKind::Forward
        );
    }

    #[test]
    fn classify_legacy_label_maps_to_current_stage() {
        let seg = segment(&["soak", "rinse"]);
        let legacy = HashMap::from([("In Queue".to_string(), "soak".to_string())]);
        // Item status is the legacy label; target is a later stage.
        assert_eq!(
            classify(&item_at("In Queue"), "rinse", &seg, &legacy),
            MoveKind::Forward
        );
        // Moving to the stage the label aliases is a no-op, not a jump.
        assert_eq!(
            classify(&item_at("In Queue"), "soak", &seg, &legacy),
            MoveKind::NoOp
        );
    }

    #[test]
    fn decide_reports_reason_requirement() {
        let seg = segment(&["soak", "rinse"]);
        let d = decide(&item_at("rinse"), "soak", &seg, &no_legacy());
        assert_eq!(d.kind, MoveKind::Backward);
        assert!(d.requires_reason);

        let d = decide(&item_at("soak"), "rinse", &seg, &no_legacy());
        assert_eq!(d.kind, MoveKind::Forward);
        assert!(!d.requires_reason);
    }

    #[test]
    fn validate_reason_rejects_empty_and_whitespace() {
        let item = item_at("rinse");
        assert!(validate_reason(&item, MoveKind::Backward, None).is_err());
        assert!(validate_reason(&item, MoveKind::Backward, Some("")).is_err());
        assert!(validate_reason(&item, MoveKind::Cancel, Some("   \t")).is_err());
    }

    #[test]
    fn validate_reason_trims_and_accepts() {
        let item = item_at("rinse");
        let reason = validate_reason(&item, MoveKind::Cancel, Some("  color mismatch ")).unwrap();
        assert_eq!(reason.as_deref(), Some("color mismatch"));
    }

    #[test]
    fn validate_reason_ignored_for_forward_moves() {
        let item = item_at("soak");
        let reason = validate_reason(&item, MoveKind::Forward, None).unwrap();
        assert!(reason.is_none());
    }
}

//! Cross-workflow chaining.
//!
//! When an item completes the last stage of its current workflow segment it
//! advances into the first stage of the next segment; when it is rejected
//! it falls back into the last stage of the previous segment. Either
//! direction terminates the item (`done` / `cancel`) when the pipeline runs
//! out, and a segment that resolves to zero stages still completes the move
//! terminally while surfacing a configuration warning.

use atelier_types::event::ItemEvent;
use atelier_types::item::WorkItem;
use atelier_types::workflow::{STAGE_CANCEL, STAGE_DONE};
use chrono::{DateTime, Utc};

use crate::catalog::CatalogSnapshot;

use super::history;
use super::resolver::{self, ResolvedPipeline};

/// Events and operator warnings produced by one chaining step.
#[derive(Debug, Default)]
pub struct ChainResult {
    pub events: Vec<ItemEvent>,
    /// Configuration problems the move worked around (surfaced to the host
    /// for operator attention, never a hard failure).
    pub warnings: Vec<String>,
}

// ---------------------------------------------------------------------------
// Forward chaining
// ---------------------------------------------------------------------------

/// Advance an item that completed its current segment.
///
/// Enters the next segment's entry stage (minimum order) when one exists;
/// otherwise the item becomes terminally `done`. A next segment resolving
/// to zero stages also terminates the item, with a warning.
pub fn advance_on_complete(
    item: &mut WorkItem,
    pipeline: &ResolvedPipeline,
    snapshot: &CatalogSnapshot,
    actor: &str,
    now: DateTime<Utc>,
) -> ChainResult {
    let mut result = ChainResult::default();

    let idx = pipeline.position_of(&item.current_workflow_id);
    if idx.is_none() {
        result.warnings.push(format!(
            "workflow '{}' is not part of the service pipeline",
            item.current_workflow_id
        ));
    }

    let next = idx.and_then(|i| pipeline.segments.get(i + 1));
    let Some(next_ref) = next else {
        mark_done(item, now);
        result
            .events
            .push(ItemEvent::PipelineCompleted { item_id: item.id });
        tracing::info!(item_id = %item.id, "pipeline exhausted, item done");
        return result;
    };

    let entry = resolver::resolve_segment_for(&next_ref.workflow_id, snapshot)
        .and_then(|seg| seg.stages.into_iter().next());

    match entry {
        Some(entry_stage) => {
            let completed = item.current_workflow_id.clone();
            history::record_transition(item, &entry_stage.id, &entry_stage.name, actor, now);
            item.current_workflow_id = next_ref.workflow_id.clone();

            result.events.push(ItemEvent::SegmentCompleted {
                item_id: item.id,
                completed_workflow_id: completed.clone(),
                next_workflow_id: next_ref.workflow_id.clone(),
            });
            tracing::info!(
                item_id = %item.id,
                from = completed.as_str(),
                to = next_ref.workflow_id.as_str(),
                stage = entry_stage.id.as_str(),
                "item chained into next segment"
            );
        }
        None => {
            let detail = format!(
                "next segment '{}' resolves to zero stages, item marked done",
                next_ref.workflow_id
            );
            tracing::warn!(item_id = %item.id, detail = detail.as_str(), "misconfigured next segment");
            mark_done(item, now);
            result.events.push(ItemEvent::ConfigWarning {
                item_id: item.id,
                detail: detail.clone(),
            });
            result
                .events
                .push(ItemEvent::PipelineCompleted { item_id: item.id });
            result.warnings.push(detail);
        }
    }

    result
}

// ---------------------------------------------------------------------------
// Backward chaining
// ---------------------------------------------------------------------------

/// Revert an item rejected out of its current segment.
///
/// Falls back into the previous segment's exit stage (maximum order) when
/// one exists; otherwise the item becomes terminally `cancel` with the
/// reason stored on it. A reversion does not set `cancel_reason` -- the
/// reason travels on the emitted event and log entry instead.
pub fn revert_on_cancel(
    item: &mut WorkItem,
    pipeline: &ResolvedPipeline,
    snapshot: &CatalogSnapshot,
    actor: &str,
    now: DateTime<Utc>,
    reason: &str,
) -> ChainResult {
    let mut result = ChainResult::default();

    let idx = pipeline.position_of(&item.current_workflow_id);
    if idx.is_none() {
        result.warnings.push(format!(
            "workflow '{}' is not part of the service pipeline",
            item.current_workflow_id
        ));
    }

    let prev = match idx {
        Some(i) if i > 0 => pipeline.segments.get(i - 1),
        _ => None,
    };
    let Some(prev_ref) = prev else {
        mark_cancelled(item, reason, now);
        result.events.push(ItemEvent::ItemCancelled {
            item_id: item.id,
            reason: reason.to_string(),
        });
        tracing::info!(item_id = %item.id, reason, "no previous segment, item cancelled");
        return result;
    };

    let exit = resolver::resolve_segment_for(&prev_ref.workflow_id, snapshot)
        .and_then(|seg| seg.stages.into_iter().next_back());

    match exit {
        Some(exit_stage) => {
            history::record_transition(item, &exit_stage.id, &exit_stage.name, actor, now);
            item.current_workflow_id = prev_ref.workflow_id.clone();

            result.events.push(ItemEvent::ItemReverted {
                item_id: item.id,
                to_workflow_id: prev_ref.workflow_id.clone(),
                to_stage: exit_stage.id.clone(),
                reason: reason.to_string(),
            });
            tracing::info!(
                item_id = %item.id,
                to = prev_ref.workflow_id.as_str(),
                stage = exit_stage.id.as_str(),
                reason,
                "item reverted into previous segment"
            );
        }
        None => {
            let detail = format!(
                "previous segment '{}' resolves to zero stages, item cancelled",
                prev_ref.workflow_id
            );
            tracing::warn!(item_id = %item.id, detail = detail.as_str(), "misconfigured previous segment");
            mark_cancelled(item, reason, now);
            result.events.push(ItemEvent::ConfigWarning {
                item_id: item.id,
                detail: detail.clone(),
            });
            result.events.push(ItemEvent::ItemCancelled {
                item_id: item.id,
                reason: reason.to_string(),
            });
            result.warnings.push(detail);
        }
    }

    result
}

// ---------------------------------------------------------------------------
// Terminal markers
// ---------------------------------------------------------------------------

fn mark_done(item: &mut WorkItem, now: DateTime<Utc>) {
    history::close_open_entry(item, now);
    item.current_stage_id = STAGE_DONE.to_string();
    item.last_updated_at = now;
}

fn mark_cancelled(item: &mut WorkItem, reason: &str, now: DateTime<Utc>) {
    history::close_open_entry(item, now);
    item.current_stage_id = STAGE_CANCEL.to_string();
    item.cancel_reason = Some(reason.to_string());
    item.last_updated_at = now;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

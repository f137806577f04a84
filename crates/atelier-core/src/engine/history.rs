//! History timeline recorder.
//!
//! Every transition closes the item's single open history entry (computing
//! its dwell duration) and appends a fresh open entry for the stage being
//! entered. History is append-only: nothing is ever deleted, and a closed
//! entry is never touched again.

use atelier_types::item::{HistoryEntry, WorkItem};
use chrono::{DateTime, Utc};

/// Close the item's open history entry, if one exists.
///
/// Sets `left_at = now` and the dwell duration in milliseconds. Under clock
/// skew (`now` earlier than `entered_at`) the duration clamps to zero
/// rather than going negative.
pub fn close_open_entry(item: &mut WorkItem, now: DateTime<Utc>) {
    if let Some(entry) = item.open_entry_mut() {
        let duration = now
            .signed_duration_since(entry.entered_at)
            .num_milliseconds()
            .max(0);
        entry.left_at = Some(now);
        entry.duration_ms = Some(duration);
    }
}

/// Record a transition into a new stage.
///
/// Closes the currently open entry (an item with no history yet skips that
/// step), appends a new open entry, and updates the item's current stage
/// and `last_updated_at`.
pub fn record_transition(
    item: &mut WorkItem,
    stage_id: &str,
    stage_name: &str,
    actor: &str,
    now: DateTime<Utc>,
) {
    close_open_entry(item, now);

    item.history.push(HistoryEntry {
        stage_id: stage_id.to_string(),
        stage_name: stage_name.to_string(),
        entered_at: now,
        left_at: None,
        duration_ms: None,
        performed_by: actor.to_string(),
    });
    item.current_stage_id = stage_id.to_string();
    item.last_updated_at = now;

    tracing::debug!(
        item_id = %item.id,
        stage = stage_id,
        actor,
        "recorded stage transition"
    );
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

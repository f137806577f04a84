//! Stage transition engine: the state-machine core of the tracker.
//!
//! - `resolver` -- stage graph resolution with tiered workflow matching
//! - `transition` -- move classification and reason gating
//! - `history` -- append-only stage timeline with dwell durations
//! - `chaining` -- cross-workflow advancement and reversion
//! - `checklist` -- informational sub-task tracking
//!
//! `TransitionEngine` is the facade callers use: `request_move` classifies
//! without mutating, `confirm_move` produces a complete ready-to-persist new
//! item plus an activity log entry and broadcastable events. Every method is
//! a pure function of (item, catalogs, caller input, timestamp); concurrency
//! control is the host's job (at most one writer per item).

pub mod chaining;
pub mod checklist;
pub mod history;
pub mod resolver;
pub mod transition;

use atelier_types::config::EngineConfig;
use atelier_types::event::{ActivityLogEntry, ItemEvent};
use atelier_types::item::{MoveKind, WorkItem};
use atelier_types::workflow::STAGE_DONE;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::catalog::CatalogSnapshot;

pub use transition::{MoveDecision, TransitionError};

// ---------------------------------------------------------------------------
// MoveOutcome
// ---------------------------------------------------------------------------

/// The result of a confirmed move (or a seeding).
///
/// `updated_item` is complete and ready to persist as a single transaction;
/// the engine never applies partial mutations.
#[derive(Debug, Clone)]
pub struct MoveOutcome {
    pub updated_item: WorkItem,
    /// Host-facing audit record for this action.
    pub log: ActivityLogEntry,
    /// Events for dashboards and notification senders.
    pub events: Vec<ItemEvent>,
}

// ---------------------------------------------------------------------------
// TransitionEngine
// ---------------------------------------------------------------------------

/// Facade over the resolver, validator, recorder, and chaining modules.
#[derive(Debug, Clone, Default)]
pub struct TransitionEngine {
    config: EngineConfig,
}

impl TransitionEngine {
    /// Create an engine with the given configuration.
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// The engine's configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Seeding
    // -----------------------------------------------------------------------

    /// Create a work item for a new order line, seeded into the first stage
    /// of the first workflow of its service pipeline.
    ///
    /// A service with zero pipeline segments (or a first segment resolving
    /// to zero stages) produces an item that is terminal on creation.
    pub fn seed_item(
        &self,
        order_id: Uuid,
        name: &str,
        service_ref: &str,
        actor: &str,
        now: DateTime<Utc>,
        snapshot: &CatalogSnapshot,
    ) -> MoveOutcome {
        let pipeline = resolver::resolve_pipeline(service_ref, snapshot);
        let mut item = WorkItem {
            id: Uuid::now_v7(),
            order_id,
            name: name.to_string(),
            service_ref: service_ref.to_string(),
            current_workflow_id: String::new(),
            current_stage_id: STAGE_DONE.to_string(),
            history: vec![],
            created_at: now,
            last_updated_at: now,
            cancel_reason: None,
        };

        let Some(first) = pipeline.segments.first() else {
            tracing::info!(
                item_id = %item.id,
                service = service_ref,
                "service pipeline has no segments, item terminal on creation"
            );
            return MoveOutcome {
                log: ActivityLogEntry::info(
                    "item_seeded",
                    name,
                    "service pipeline has no workflow segments, item created complete",
                ),
                events: vec![ItemEvent::PipelineCompleted { item_id: item.id }],
                updated_item: item,
            };
        };

        let entry = match pipeline.source {
            resolver::PipelineSource::DefaultFallback => resolver::fallback_segment(&self.config)
                .stages
                .into_iter()
                .next(),
            resolver::PipelineSource::Catalog => {
                resolver::resolve_segment_for(&first.workflow_id, snapshot)
                    .and_then(|seg| seg.stages.into_iter().next())
            }
        };

        match entry {
            Some(stage) => {
                item.current_workflow_id = first.workflow_id.clone();
                history::record_transition(&mut item, &stage.id, &stage.name, actor, now);
                tracing::info!(
                    item_id = %item.id,
                    workflow = first.workflow_id.as_str(),
                    stage = stage.id.as_str(),
                    "item seeded"
                );
                MoveOutcome {
                    log: ActivityLogEntry::info(
                        "item_seeded",
                        name,
                        format!("entered '{}' at stage '{}'", first.workflow_id, stage.name),
                    ),
                    events: vec![ItemEvent::ItemSeeded {
                        item_id: item.id,
                        order_id,
                        workflow_id: first.workflow_id.clone(),
                        stage_id: stage.id.clone(),
                    }],
                    updated_item: item,
                }
            }
            None => {
                let detail = format!(
                    "first segment '{}' resolves to zero stages, item created complete",
                    first.workflow_id
                );
                tracing::warn!(item_id = %item.id, detail = detail.as_str(), "misconfigured first segment");
                MoveOutcome {
                    log: ActivityLogEntry::warning("item_seeded", name, detail.clone()),
                    events: vec![
                        ItemEvent::ConfigWarning {
                            item_id: item.id,
                            detail,
                        },
                        ItemEvent::PipelineCompleted { item_id: item.id },
                    ],
                    updated_item: item,
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Two-phase move protocol
    // -----------------------------------------------------------------------

    /// Classify a requested move without mutating anything.
    ///
    /// Callers use the returned decision to prompt for a reason before
    /// calling `confirm_move`.
    pub fn request_move(
        &self,
        item: &WorkItem,
        target_stage_id: &str,
        snapshot: &CatalogSnapshot,
    ) -> Result<MoveDecision, TransitionError> {
        self.ensure_not_terminal(item)?;
        let segment = resolver::resolve_segment(item, snapshot, &self.config);
        Ok(transition::decide(
            item,
            target_stage_id,
            &segment,
            &self.config.legacy_status_map,
        ))
    }

    /// Apply a move, producing the updated item, an activity log entry, and
    /// broadcastable events.
    ///
    /// Backward and cancel moves are refused with `MissingReason` until a
    /// non-empty reason is supplied; nothing is mutated in that case.
    pub fn confirm_move(
        &self,
        item: &WorkItem,
        target_stage_id: &str,
        actor: &str,
        now: DateTime<Utc>,
        reason: Option<&str>,
        snapshot: &CatalogSnapshot,
    ) -> Result<MoveOutcome, TransitionError> {
        self.ensure_not_terminal(item)?;

        let segment = resolver::resolve_segment(item, snapshot, &self.config);
        let kind = transition::classify(
            item,
            target_stage_id,
            &segment,
            &self.config.legacy_status_map,
        );
        let reason = transition::validate_reason(item, kind, reason)?;

        let mut updated = item.clone();
        let outcome = match kind {
            MoveKind::NoOp => MoveOutcome {
                log: ActivityLogEntry::info(
                    "move_discarded",
                    &item.name,
                    format!("already in stage '{}'", item.current_stage_id),
                ),
                events: vec![],
                updated_item: updated,
            },

            MoveKind::Forward | MoveKind::Backward => {
                let from = item.current_stage_id.clone();
                let (stage_id, stage_name) = match resolver::find_stage(&segment, target_stage_id)
                {
                    Some(stage) => (stage.id.clone(), stage.name.clone()),
                    None => {
                        tracing::warn!(
                            item_id = %item.id,
                            stage = target_stage_id,
                            "target stage not in segment, recording id verbatim"
                        );
                        (target_stage_id.to_string(), target_stage_id.to_string())
                    }
                };
                history::record_transition(&mut updated, &stage_id, &stage_name, actor, now);

                let log = match &reason {
                    Some(r) => ActivityLogEntry::warning(
                        "stage_backward",
                        &item.name,
                        format!("'{from}' back to '{stage_id}': {r}"),
                    ),
                    None => ActivityLogEntry::info(
                        "stage_forward",
                        &item.name,
                        format!("'{from}' to '{stage_id}'"),
                    ),
                };
                MoveOutcome {
                    log,
                    events: vec![ItemEvent::StageChanged {
                        item_id: item.id,
                        workflow_id: updated.current_workflow_id.clone(),
                        from_stage: from,
                        to_stage: stage_id,
                        kind,
                        performed_by: actor.to_string(),
                    }],
                    updated_item: updated,
                }
            }

            MoveKind::CompleteSegment => {
                let pipeline = resolver::resolve_pipeline(&item.service_ref, snapshot);
                let chain =
                    chaining::advance_on_complete(&mut updated, &pipeline, snapshot, actor, now);

                let log = if !chain.warnings.is_empty() {
                    ActivityLogEntry::warning(
                        "segment_complete",
                        &item.name,
                        chain.warnings.join("; "),
                    )
                } else if updated.is_terminal() {
                    ActivityLogEntry::info("pipeline_complete", &item.name, "all workflows complete")
                } else {
                    ActivityLogEntry::info(
                        "segment_complete",
                        &item.name,
                        format!(
                            "moved into '{}' at stage '{}'",
                            updated.current_workflow_id, updated.current_stage_id
                        ),
                    )
                };
                MoveOutcome {
                    log,
                    events: chain.events,
                    updated_item: updated,
                }
            }

            MoveKind::Cancel => {
                let pipeline = resolver::resolve_pipeline(&item.service_ref, snapshot);
                let reason_text = reason.unwrap_or_default();
                let chain = chaining::revert_on_cancel(
                    &mut updated,
                    &pipeline,
                    snapshot,
                    actor,
                    now,
                    &reason_text,
                );

                let log = if updated.is_terminal() {
                    ActivityLogEntry::danger(
                        "item_cancelled",
                        &item.name,
                        format!("cancelled: {reason_text}"),
                    )
                } else {
                    ActivityLogEntry::warning(
                        "item_rejected",
                        &item.name,
                        format!(
                            "rejected back to '{}' at stage '{}': {reason_text}",
                            updated.current_workflow_id, updated.current_stage_id
                        ),
                    )
                };
                MoveOutcome {
                    log,
                    events: chain.events,
                    updated_item: updated,
                }
            }
        };

        Ok(outcome)
    }

    fn ensure_not_terminal(&self, item: &WorkItem) -> Result<(), TransitionError> {
        if item.is_terminal() {
            return Err(TransitionError::ItemTerminal {
                item: item.name.clone(),
                status: item.current_stage_id.clone(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

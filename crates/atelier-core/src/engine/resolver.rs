//! Stage graph resolver.
//!
//! Given a work item and a catalog snapshot, produces the ordered stage
//! sequence of the item's current workflow segment and the ordered segment
//! list of its whole service pipeline. Pure: for a given (item, snapshot,
//! config) the result is deterministic and nothing is mutated.
//!
//! Workflow references are matched against the catalog in tiers: exact id
//! first, then case-insensitive label, then substring label. The fuzzy
//! tiers tolerate administratively edited catalogs; which tier matched is
//! carried in the result and logged so false matches stay diagnosable.

use std::collections::{HashMap, HashSet};

use atelier_types::config::EngineConfig;
use atelier_types::item::WorkItem;
use atelier_types::workflow::{Stage, WorkflowDefinition, WorkflowSegmentRef};

use crate::catalog::CatalogSnapshot;

/// Workflow id of the synthetic segment used when a service has no catalog
/// pipeline at all.
pub const FALLBACK_WORKFLOW_ID: &str = "default";

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Which tier of the matching chain resolved a workflow reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTier {
    /// `WorkflowSegmentRef::workflow_id` equals `WorkflowDefinition::id`.
    ExactId,
    /// Case-insensitive match against the workflow display label.
    LabelCaseInsensitive,
    /// Substring match against the workflow display label. Best-effort and
    /// may produce a false match.
    LabelSubstring,
    /// Nothing matched; the configured generic stage set was used.
    Fallback,
}

/// Where a resolved pipeline came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineSource {
    /// The service had a catalog pipeline.
    Catalog,
    /// The service had no catalog entry; a single generic segment stands in.
    DefaultFallback,
}

/// The ordered workflow segments a service's items traverse.
#[derive(Debug, Clone)]
pub struct ResolvedPipeline {
    /// Segments sorted ascending by order.
    pub segments: Vec<WorkflowSegmentRef>,
    pub source: PipelineSource,
}

impl ResolvedPipeline {
    /// Index of a workflow within the pipeline, by exact reference match.
    pub fn position_of(&self, workflow_id: &str) -> Option<usize> {
        self.segments
            .iter()
            .position(|s| s.workflow_id == workflow_id)
    }
}

/// The ordered, deduplicated stage list of one workflow segment.
#[derive(Debug, Clone)]
pub struct SegmentStages {
    /// Catalog id of the matched workflow (or the declared reference when
    /// the generic fallback stood in).
    pub workflow_id: String,
    /// Display label of the matched workflow.
    pub workflow_name: String,
    /// Stages sorted ascending by order, deduplicated by id. The first
    /// element is the segment's entry stage, the last its exit stage.
    pub stages: Vec<Stage>,
    pub tier: MatchTier,
}

// ---------------------------------------------------------------------------
// Pipeline resolution
// ---------------------------------------------------------------------------

/// Resolve the ordered segment list for a service.
///
/// A service with no catalog entry gets a single synthetic segment backed by
/// the configured generic stage set -- an explicit fallback result, never an
/// error. A catalog pipeline with zero segments is returned as-is; callers
/// treat such items as terminal on creation.
pub fn resolve_pipeline(service_ref: &str, snapshot: &CatalogSnapshot) -> ResolvedPipeline {
    match snapshot.pipeline(service_ref) {
        Some(pipeline) => {
            let mut segments = pipeline.segments.clone();
            segments.sort_by_key(|s| s.order);
            ResolvedPipeline {
                segments,
                source: PipelineSource::Catalog,
            }
        }
        None => {
            tracing::warn!(
                service = service_ref,
                "service has no catalog pipeline, using generic fallback segment"
            );
            ResolvedPipeline {
                segments: vec![WorkflowSegmentRef {
                    workflow_id: FALLBACK_WORKFLOW_ID.to_string(),
                    order: 0,
                }],
                source: PipelineSource::DefaultFallback,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Workflow matching
// ---------------------------------------------------------------------------

/// Match a workflow reference against the catalog: exact id, then
/// case-insensitive label, then substring label.
pub fn find_workflow<'a>(
    snapshot: &'a CatalogSnapshot,
    reference: &str,
) -> Option<(&'a WorkflowDefinition, MatchTier)> {
    if let Some(wf) = snapshot.workflow(reference) {
        return Some((wf, MatchTier::ExactId));
    }

    if let Some(wf) = snapshot
        .workflows()
        .iter()
        .find(|wf| wf.name.eq_ignore_ascii_case(reference))
    {
        tracing::warn!(
            reference,
            matched = wf.id.as_str(),
            "workflow matched by case-insensitive label"
        );
        return Some((wf, MatchTier::LabelCaseInsensitive));
    }

    let needle = reference.to_lowercase();
    if let Some(wf) = snapshot.workflows().iter().find(|wf| {
        let label = wf.name.to_lowercase();
        label.contains(&needle) || needle.contains(&label)
    }) {
        tracing::warn!(
            reference,
            matched = wf.id.as_str(),
            "workflow matched by label substring, may be a false match"
        );
        return Some((wf, MatchTier::LabelSubstring));
    }

    None
}

/// Resolve the stage list for a workflow reference via the matching chain.
///
/// Returns `None` when no catalog workflow matches at any tier; callers
/// decide whether that means the generic fallback (current-segment
/// resolution) or a misconfiguration (cross-workflow chaining).
pub fn resolve_segment_for(
    reference: &str,
    snapshot: &CatalogSnapshot,
) -> Option<SegmentStages> {
    let (wf, tier) = find_workflow(snapshot, reference)?;

    let mut stages = wf.stages.clone();
    stages.sort_by_key(|s| s.order);
    let mut seen = HashSet::new();
    stages.retain(|s| seen.insert(s.id.clone()));

    Some(SegmentStages {
        workflow_id: wf.id.clone(),
        workflow_name: wf.name.clone(),
        stages,
        tier,
    })
}

/// The generic stage set from configuration, as a synthetic segment.
pub fn fallback_segment(config: &EngineConfig) -> SegmentStages {
    SegmentStages {
        workflow_id: FALLBACK_WORKFLOW_ID.to_string(),
        workflow_name: "Default".to_string(),
        stages: config
            .fallback_stages
            .iter()
            .enumerate()
            .map(|(i, s)| Stage {
                id: s.id.clone(),
                name: s.name.clone(),
                order: i as u32,
                checklist: vec![],
            })
            .collect(),
        tier: MatchTier::Fallback,
    }
}

/// Resolve the stage list of an item's current workflow segment.
///
/// Falls back to the configured generic stage set when the item's workflow
/// cannot be resolved at any tier, so callers always get a usable segment.
pub fn resolve_segment(
    item: &WorkItem,
    snapshot: &CatalogSnapshot,
    config: &EngineConfig,
) -> SegmentStages {
    match resolve_segment_for(&item.current_workflow_id, snapshot) {
        Some(segment) => segment,
        None => {
            tracing::warn!(
                item_id = %item.id,
                workflow = item.current_workflow_id.as_str(),
                "current workflow not in catalog, using generic fallback stages"
            );
            fallback_segment(config)
        }
    }
}

// ---------------------------------------------------------------------------
// Stage lookup
// ---------------------------------------------------------------------------

/// Find a stage in a segment by exact id.
pub fn find_stage<'a>(segment: &'a SegmentStages, stage_id: &str) -> Option<&'a Stage> {
    segment.stages.iter().find(|s| s.id == stage_id)
}

/// The order of a stage within a segment.
///
/// The legacy status map is consulted only when the id itself is not found,
/// for items whose status predates the catalog schema (e.g. "In Queue").
pub fn stage_order(
    segment: &SegmentStages,
    stage_id: &str,
    legacy_status_map: &HashMap<String, String>,
) -> Option<u32> {
    if let Some(stage) = find_stage(segment, stage_id) {
        return Some(stage.order);
    }

    let mapped = legacy_status_map.get(stage_id)?;
    let stage = find_stage(segment, mapped)?;
    tracing::debug!(
        legacy = stage_id,
        mapped = mapped.as_str(),
        "stage located through legacy status mapping"
    );
    Some(stage.order)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_types::workflow::{ServicePipeline, WorkflowDefinition};
    use chrono::Utc;
    use uuid::Uuid;

    fn stage(id: &str, order: u32) -> Stage {
        Stage {
            id: id.to_string(),
            name: id.to_string(),
            order,
            checklist: vec![],
        }
    }

    fn snapshot() -> CatalogSnapshot {
        CatalogSnapshot::new(
            vec![
                WorkflowDefinition {
                    id: "wash".to_string(),
                    name: "Cleaning Workflow".to_string(),
                    stages: vec![stage("rinse", 1), stage("soak", 0), stage("dry", 2)],
                    assigned_roles: vec![],
                },
                WorkflowDefinition {
                    id: "qc".to_string(),
                    name: "QC Workflow".to_string(),
                    stages: vec![stage("inspect", 0)],
                    assigned_roles: vec![],
                },
            ],
            vec![ServicePipeline {
                service_id: "full-care".to_string(),
                name: "Full Care".to_string(),
                segments: vec![
                    WorkflowSegmentRef {
                        workflow_id: "qc".to_string(),
                        order: 1,
                    },
                    WorkflowSegmentRef {
                        workflow_id: "wash".to_string(),
                        order: 0,
                    },
                ],
            }],
        )
        .unwrap()
    }

    fn item(workflow: &str, stage: &str) -> WorkItem {
        let now = Utc::now();
        WorkItem {
            id: Uuid::now_v7(),
            order_id: Uuid::now_v7(),
            name: "suede jacket".to_string(),
            service_ref: "full-care".to_string(),
            current_workflow_id: workflow.to_string(),
            current_stage_id: stage.to_string(),
            history: vec![],
            created_at: now,
            last_updated_at: now,
            cancel_reason: None,
        }
    }

    #[test]
    fn test_resolve_pipeline_sorts_segments() {
        let pipeline = resolve_pipeline("full-care", &snapshot());
        assert_eq!(pipeline.source, PipelineSource::Catalog);
        assert_eq!(pipeline.segments[0].workflow_id, "wash");
        assert_eq!(pipeline.segments[1].workflow_id, "qc");
    }

    #[test]
    fn test_resolve_pipeline_unknown_service_falls_back() {
        let pipeline = resolve_pipeline("no-such-service", &snapshot());
        assert_eq!(pipeline.source, PipelineSource::DefaultFallback);
        assert_eq!(pipeline.segments.len(), 1);
        assert_eq!(pipeline.segments[0].workflow_id, FALLBACK_WORKFLOW_ID);
    }

    #[test]
    fn test_pipeline_position_of() {
        let pipeline = resolve_pipeline("full-care", &snapshot());
        assert_eq!(pipeline.position_of("wash"), Some(0));
        assert_eq!(pipeline.position_of("qc"), Some(1));
        assert_eq!(pipeline.position_of("repair"), None);
    }

    #[test]
    fn test_find_workflow_exact_id_wins() {
        let snap = snapshot();
        let (wf, tier) = find_workflow(&snap, "wash").unwrap();
        assert_eq!(wf.id, "wash");
        assert_eq!(tier, MatchTier::ExactId);
    }

    #[test]
    fn test_find_workflow_case_insensitive_label() {
        let snap = snapshot();
        let (wf, tier) = find_workflow(&snap, "cleaning workflow").unwrap();
        assert_eq!(wf.id, "wash");
        assert_eq!(tier, MatchTier::LabelCaseInsensitive);
    }

    #[test]
    fn test_find_workflow_label_substring() {
        let snap = snapshot();
        let (wf, tier) = find_workflow(&snap, "Cleaning").unwrap();
        assert_eq!(wf.id, "wash");
        assert_eq!(tier, MatchTier::LabelSubstring);
    }

    #[test]
    fn test_find_workflow_no_match() {
        assert!(find_workflow(&snapshot(), "embroidery").is_none());
    }

    #[test]
    fn test_resolve_segment_sorted_by_order() {
        let seg = resolve_segment(
            &item("wash", "soak"),
            &snapshot(),
            &EngineConfig::default(),
        );
        assert_eq!(seg.tier, MatchTier::ExactId);
        let ids: Vec<&str> = seg.stages.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["soak", "rinse", "dry"]);
    }

    #[test]
    fn test_resolve_segment_unknown_workflow_uses_config_fallback() {
        let config = EngineConfig::default();
        let seg = resolve_segment(&item("embroidery", "in-queue"), &snapshot(), &config);
        assert_eq!(seg.tier, MatchTier::Fallback);
        assert_eq!(seg.workflow_id, FALLBACK_WORKFLOW_ID);
        assert_eq!(seg.stages.len(), config.fallback_stages.len());
        // Fallback stages keep their configured order.
        assert_eq!(seg.stages[0].id, "in-queue");
        assert_eq!(seg.stages[0].order, 0);
    }

    #[test]
    fn test_resolve_segment_for_returns_none_when_unmatched() {
        assert!(resolve_segment_for("embroidery", &snapshot()).is_none());
    }

    #[test]
    fn test_stage_order_direct_and_legacy() {
        let seg = resolve_segment(
            &item("wash", "soak"),
            &snapshot(),
            &EngineConfig::default(),
        );
        let legacy = HashMap::from([("Soaking".to_string(), "soak".to_string())]);

        assert_eq!(stage_order(&seg, "rinse", &legacy), Some(1));
        // Legacy label maps onto the soak stage.
        assert_eq!(stage_order(&seg, "Soaking", &legacy), Some(0));
        assert_eq!(stage_order(&seg, "polish", &legacy), None);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let snap = snapshot();
        let config = EngineConfig::default();
        let it = item("wash", "soak");
        let a = resolve_segment(&it, &snap, &config);
        let b = resolve_segment(&it, &snap, &config);
        assert_eq!(a.workflow_id, b.workflow_id);
        assert_eq!(
            a.stages.iter().map(|s| &s.id).collect::<Vec<_>>(),
            b.stages.iter().map(|s| &s.id).collect::<Vec<_>>()
        );
    }
}

//! Catalog snapshot: validation, lookup, and YAML load/save.
//!
//! The engine never reaches for ambient catalog state -- every resolver call
//! receives a `CatalogSnapshot`, an immutable per-call bundle of workflow
//! definitions and service pipelines. Snapshots are validated on
//! construction, so downstream code can assume unique stage ids and orders.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use atelier_types::workflow::{ServicePipeline, WorkflowDefinition};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can occur while building or loading a catalog snapshot.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// YAML parse failure.
    #[error("parse error: {0}")]
    Parse(String),

    /// Structural validation failure.
    #[error("validation error: {0}")]
    Validation(String),

    /// Filesystem I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Immutable per-call view of the workflow and service catalogs.
///
/// Constructed fresh for each transition computation; the engine must not
/// assume catalog contents are unchanged across separate calls.
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    workflows: Vec<WorkflowDefinition>,
    pipelines: Vec<ServicePipeline>,
    workflow_index: HashMap<String, usize>,
    pipeline_index: HashMap<String, usize>,
}

impl CatalogSnapshot {
    /// Build a validated snapshot from workflow and pipeline lists.
    pub fn new(
        workflows: Vec<WorkflowDefinition>,
        pipelines: Vec<ServicePipeline>,
    ) -> Result<Self, CatalogError> {
        for wf in &workflows {
            validate_workflow(wf)?;
        }
        for pipeline in &pipelines {
            validate_pipeline(pipeline)?;
        }

        let mut workflow_index = HashMap::new();
        for (i, wf) in workflows.iter().enumerate() {
            if workflow_index.insert(wf.id.clone(), i).is_some() {
                return Err(CatalogError::Validation(format!(
                    "duplicate workflow id: '{}'",
                    wf.id
                )));
            }
        }

        let mut pipeline_index = HashMap::new();
        for (i, pipeline) in pipelines.iter().enumerate() {
            if pipeline_index.insert(pipeline.service_id.clone(), i).is_some() {
                return Err(CatalogError::Validation(format!(
                    "duplicate service id: '{}'",
                    pipeline.service_id
                )));
            }
        }

        Ok(Self {
            workflows,
            pipelines,
            workflow_index,
            pipeline_index,
        })
    }

    /// An empty snapshot (no workflows, no pipelines).
    pub fn empty() -> Self {
        Self {
            workflows: Vec::new(),
            pipelines: Vec::new(),
            workflow_index: HashMap::new(),
            pipeline_index: HashMap::new(),
        }
    }

    /// Look up a workflow definition by exact id.
    pub fn workflow(&self, id: &str) -> Option<&WorkflowDefinition> {
        self.workflow_index.get(id).map(|&i| &self.workflows[i])
    }

    /// Look up a service pipeline by exact service id.
    pub fn pipeline(&self, service_id: &str) -> Option<&ServicePipeline> {
        self.pipeline_index
            .get(service_id)
            .map(|&i| &self.pipelines[i])
    }

    /// All workflow definitions in the snapshot.
    pub fn workflows(&self) -> &[WorkflowDefinition] {
        &self.workflows
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate structural constraints on a workflow definition.
///
/// Checks:
/// - Non-empty id and name
/// - Stage ids unique within the workflow
/// - Stage orders unique within the workflow (orders totally order stages)
/// - Checklist entry ids unique within each stage
fn validate_workflow(wf: &WorkflowDefinition) -> Result<(), CatalogError> {
    if wf.id.is_empty() {
        return Err(CatalogError::Validation(
            "workflow id must not be empty".to_string(),
        ));
    }
    if wf.name.is_empty() {
        return Err(CatalogError::Validation(format!(
            "workflow '{}' has an empty name",
            wf.id
        )));
    }

    let mut seen_ids = HashSet::new();
    let mut seen_orders = HashSet::new();
    for stage in &wf.stages {
        if !seen_ids.insert(stage.id.as_str()) {
            return Err(CatalogError::Validation(format!(
                "workflow '{}' has duplicate stage id '{}'",
                wf.id, stage.id
            )));
        }
        if !seen_orders.insert(stage.order) {
            return Err(CatalogError::Validation(format!(
                "workflow '{}' repeats stage order {} (stage '{}')",
                wf.id, stage.order, stage.id
            )));
        }

        let mut seen_entries = HashSet::new();
        for entry in &stage.checklist {
            if !seen_entries.insert(entry.id.as_str()) {
                return Err(CatalogError::Validation(format!(
                    "stage '{}' has duplicate checklist entry '{}'",
                    stage.id, entry.id
                )));
            }
        }
    }

    Ok(())
}

/// Validate structural constraints on a service pipeline.
///
/// Segment orders must be unique; segment workflow references are not
/// resolved here because the catalogs may be edited independently -- the
/// resolver handles missing references with its fallback chain.
fn validate_pipeline(pipeline: &ServicePipeline) -> Result<(), CatalogError> {
    if pipeline.service_id.is_empty() {
        return Err(CatalogError::Validation(
            "service id must not be empty".to_string(),
        ));
    }

    let mut seen_orders = HashSet::new();
    for segment in &pipeline.segments {
        if segment.workflow_id.is_empty() {
            return Err(CatalogError::Validation(format!(
                "service '{}' has a segment with an empty workflow reference",
                pipeline.service_id
            )));
        }
        if !seen_orders.insert(segment.order) {
            return Err(CatalogError::Validation(format!(
                "service '{}' repeats segment order {}",
                pipeline.service_id, segment.order
            )));
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// YAML document
// ---------------------------------------------------------------------------

/// On-disk catalog document shape.
#[derive(Debug, Serialize, Deserialize)]
struct CatalogDocument {
    #[serde(default)]
    workflows: Vec<WorkflowDefinition>,
    #[serde(default)]
    services: Vec<ServicePipeline>,
}

/// Parse a YAML catalog document into a validated snapshot.
pub fn parse_catalog_yaml(yaml: &str) -> Result<CatalogSnapshot, CatalogError> {
    let doc: CatalogDocument =
        serde_yaml_ng::from_str(yaml).map_err(|e| CatalogError::Parse(e.to_string()))?;
    CatalogSnapshot::new(doc.workflows, doc.services)
}

/// Load a catalog snapshot from a YAML file.
pub fn load_catalog_file(path: &Path) -> Result<CatalogSnapshot, CatalogError> {
    let content = std::fs::read_to_string(path)?;
    parse_catalog_yaml(&content)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

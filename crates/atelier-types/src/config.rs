//! Engine configuration types for Atelier.
//!
//! `EngineConfig` controls the fallback behavior of the stage graph
//! resolver: the generic stage set used when a service has no resolvable
//! pipeline, and the legacy status-label mapping consulted for items whose
//! status predates the catalog schema.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Configuration for the transition engine.
///
/// Loaded from the host's config file (TOML). All fields have defaults, so
/// an empty document is a valid configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Generic stage set used when an item's service has no catalog entry
    /// or its workflow cannot be resolved at all. Ordered.
    #[serde(default = "default_fallback_stages")]
    pub fallback_stages: Vec<FallbackStage>,

    /// Legacy status label -> stage id mapping, consulted only when an
    /// item's current status is not found among the resolved stage ids.
    #[serde(default = "default_legacy_status_map")]
    pub legacy_status_map: HashMap<String, String>,
}

fn default_fallback_stages() -> Vec<FallbackStage> {
    vec![
        FallbackStage {
            id: "in-queue".to_string(),
            name: "In Queue".to_string(),
        },
        FallbackStage {
            id: "in-progress".to_string(),
            name: "In Progress".to_string(),
        },
        FallbackStage {
            id: "ready".to_string(),
            name: "Ready".to_string(),
        },
    ]
}

fn default_legacy_status_map() -> HashMap<String, String> {
    HashMap::from([
        ("In Queue".to_string(), "in-queue".to_string()),
        ("In Progress".to_string(), "in-progress".to_string()),
        ("Ready".to_string(), "ready".to_string()),
    ])
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fallback_stages: default_fallback_stages(),
            legacy_status_map: default_legacy_status_map(),
        }
    }
}

/// One stage of the generic fallback stage set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackStage {
    pub id: String,
    pub name: String,
}

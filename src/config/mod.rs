//! Resource configuration loading

use crate::resource::Operation;
use crate::server::routes::RouteConfig;
use anyhow::Result;
use serde::{Deserialize, Serialize};

fn default_count_headers() -> bool {
    true
}

/// Declarative configuration for one resource, loadable from YAML:
///
/// ```yaml
/// operations: "list,one,create"
/// count_metadata: true
/// count_headers: false
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Comma-combined subset of operations to expose; omit for all five
    #[serde(default)]
    pub operations: Option<String>,

    /// Nest result/total counts inside the list envelope's `data`
    #[serde(default)]
    pub count_metadata: bool,

    /// Attach `X-Result-Count` / `X-Total-Count` headers to list responses
    #[serde(default = "default_count_headers")]
    pub count_headers: bool,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            operations: None,
            count_metadata: false,
            count_headers: true,
        }
    }
}

impl ResourceConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// The configured operation subset, parsed; `None` means all five
    pub fn operation_set(&self) -> Result<Option<Vec<Operation>>> {
        self.operations
            .as_deref()
            .map(Operation::parse_list)
            .transpose()
            .map_err(anyhow::Error::from)
    }

    /// A route configuration exposing the configured operation subset.
    /// Middleware rules are code-level concerns and start empty.
    pub fn route_config(&self) -> Result<RouteConfig> {
        let mut config = RouteConfig::new();
        if let Some(operations) = self.operation_set()? {
            config = config.operations(operations);
        }
        Ok(config)
    }
}

// Copyright (c) 2026 kubetables contributors
// SPDX-License-Identifier: BSD-3-Clause

//! Resource discovery.
//!
//! Enumerates every resource kind the cluster advertises (including CRDs)
//! through the Kubernetes discovery API. Runs exactly once, at connector
//! registration; the result is never refreshed.

use kube::Client;
use kube::discovery::{ApiResource, Discovery};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// A discovered cluster resource type. Identifies exactly one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceKind {
    /// API group; empty for the core group.
    pub group: String,
    /// Preferred version of the group (e.g. `v1`).
    pub version: String,
    /// Plural resource name used in list endpoints (e.g. `pods`).
    pub plural: String,
    /// Kind name (e.g. `Pod`).
    pub kind: String,
}

impl ResourceKind {
    /// The `apiVersion` string as it appears on manifests.
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    pub fn to_api_resource(&self) -> ApiResource {
        ApiResource {
            group: self.group.clone(),
            version: self.version.clone(),
            api_version: self.api_version(),
            kind: self.kind.clone(),
            plural: self.plural.clone(),
        }
    }
}

/// Enumerate all resource kinds available on the cluster.
///
/// Uses each group's preferred version. Subresources (`pods/log`,
/// `pods/exec`, ...) are skipped. A failed discovery call is fatal: there is
/// no partial catalog.
pub async fn discover_resource_kinds(client: &Client) -> Result<Vec<ResourceKind>> {
    let discovery = Discovery::new(client.clone())
        .run()
        .await
        .map_err(Error::Discovery)?;

    let mut kinds = Vec::new();
    for group in discovery.groups() {
        for (resource, _capabilities) in group.recommended_resources() {
            if resource.plural.contains('/') {
                continue;
            }

            debug!(
                group = %resource.group,
                version = %resource.version,
                plural = %resource.plural,
                "Discovered resource kind"
            );

            kinds.push(ResourceKind {
                group: resource.group.clone(),
                version: resource.version.clone(),
                plural: resource.plural.clone(),
                kind: resource.kind.clone(),
            });
        }
    }

    info!(kinds = kinds.len(), "Resource discovery complete");
    Ok(kinds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_version_for_core_group_is_bare_version() {
        let kind = ResourceKind {
            group: String::new(),
            version: "v1".to_string(),
            plural: "pods".to_string(),
            kind: "Pod".to_string(),
        };
        assert_eq!(kind.api_version(), "v1");
    }

    #[test]
    fn api_version_for_named_group_is_prefixed() {
        let kind = ResourceKind {
            group: "apps".to_string(),
            version: "v1".to_string(),
            plural: "deployments".to_string(),
            kind: "Deployment".to_string(),
        };
        assert_eq!(kind.api_version(), "apps/v1");
        assert_eq!(kind.to_api_resource().api_version, "apps/v1");
    }
}

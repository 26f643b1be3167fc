// Copyright (c) 2026 kubetables contributors
// SPDX-License-Identifier: BSD-3-Clause

//! Connector configuration.
//!
//! Selects which kubeconfig context the connector talks to. Transport
//! concerns (auth, TLS, timeouts) stay with the kube client stack.

use kube::Client;
use kube::config::{Config, KubeConfigOptions, Kubeconfig};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectorConfig {
    /// Kubeconfig context to use. `None` means the kubeconfig's current
    /// context.
    #[serde(default)]
    pub context: Option<String>,
}

impl ConnectorConfig {
    pub fn with_context(context: impl Into<String>) -> Self {
        Self {
            context: Some(context.into()),
        }
    }

    /// Build a client for the configured context.
    ///
    /// An explicitly requested context must exist in the kubeconfig; this is
    /// validated up front so a typo fails here rather than on the first
    /// query.
    pub async fn client(&self) -> Result<Client> {
        if let Some(context) = &self.context {
            let kubeconfig = Kubeconfig::read()?;
            if !kubeconfig.contexts.iter().any(|c| &c.name == context) {
                return Err(Error::Unsupported(format!(
                    "context '{context}' not found in kubeconfig"
                )));
            }
        }

        let options = KubeConfigOptions {
            context: self.context.clone(),
            ..KubeConfigOptions::default()
        };
        let config = Config::from_kubeconfig(&options).await?;
        Client::try_from(config).map_err(Error::from_kube)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_uses_current_context() {
        let config = ConnectorConfig::default();
        assert!(config.context.is_none());
    }

    #[test]
    fn deserializes_empty_object() {
        let config: ConnectorConfig = serde_json::from_str("{}").unwrap();
        assert!(config.context.is_none());
    }

    #[test]
    fn roundtrips_context() {
        let original = ConnectorConfig::with_context("prod");
        let json = serde_json::to_string(&original).unwrap();
        let parsed: ConnectorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.context.as_deref(), Some("prod"));
    }
}

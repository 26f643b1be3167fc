// Copyright (c) 2026 kubetables contributors
// SPDX-License-Identifier: BSD-3-Clause

//! Wiring into a DataFusion session: the `resources` schema and the
//! `pod_logs` function.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use datafusion::catalog::SchemaProvider;
use datafusion::datasource::TableProvider;
use datafusion::error::{DataFusionError, Result as DFResult};
use datafusion::execution::context::SessionContext;
use tracing::info;

use crate::config::ConnectorConfig;
use crate::error::{Error, Result};
use crate::kubernetes::client::KubeApi;
use crate::tables::resource::{ResourceCatalog, TableName};

use super::logs_function::PodLogsFunction;
use super::provider::ResourceTableProvider;

pub use crate::tables::resource::RESOURCES_SCHEMA;

/// Exposes the discovered catalog to DataFusion. Built once at registration
/// and read-only afterwards; table providers are constructed on demand from
/// the shared catalog.
pub struct KubernetesSchemaProvider {
    catalog: Arc<ResourceCatalog>,
    api: KubeApi,
}

impl KubernetesSchemaProvider {
    pub fn new(catalog: Arc<ResourceCatalog>, api: KubeApi) -> Self {
        Self { catalog, api }
    }

    pub fn catalog(&self) -> &ResourceCatalog {
        &self.catalog
    }
}

impl std::fmt::Debug for KubernetesSchemaProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubernetesSchemaProvider")
            .field("tables", &self.catalog.len())
            .finish()
    }
}

#[async_trait]
impl SchemaProvider for KubernetesSchemaProvider {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn table_names(&self) -> Vec<String> {
        self.catalog.list().map(|name| name.table.clone()).collect()
    }

    async fn table(&self, name: &str) -> DFResult<Option<Arc<dyn TableProvider>>> {
        match self.catalog.lookup(&TableName::resources(name)) {
            Ok(table) => Ok(Some(Arc::new(ResourceTableProvider::new(
                table,
                self.api.clone(),
            )))),
            // Absence is a normal condition for the engine, not a failure.
            Err(Error::TableNotFound(_)) => Ok(None),
            Err(other) => Err(other.into()),
        }
    }

    fn table_exist(&self, name: &str) -> bool {
        self.catalog.lookup(&TableName::resources(name)).is_ok()
    }
}

/// Connect, discover, and register both surfaces on a session: every
/// discovered resource kind under `resources.*`, and the `pod_logs` table
/// function.
///
/// Discovery failure is fatal — the connector does not register partially.
pub async fn register(
    ctx: &SessionContext,
    config: &ConnectorConfig,
) -> Result<Arc<KubernetesSchemaProvider>> {
    let api = KubeApi::connect(config).await?;
    let catalog = Arc::new(ResourceCatalog::discover(&api).await?);
    let provider = Arc::new(KubernetesSchemaProvider::new(catalog, api.clone()));

    let state = ctx.state();
    let default_catalog = state.config_options().catalog.default_catalog.clone();
    ctx.catalog(&default_catalog)
        .ok_or_else(|| {
            Error::Internal(format!("default catalog '{default_catalog}' is not registered"))
        })?
        .register_schema(RESOURCES_SCHEMA, provider.clone())
        .map_err(|e: DataFusionError| Error::Internal(e.to_string()))?;

    ctx.register_udtf("pod_logs", Arc::new(PodLogsFunction::new(api)));

    info!(
        tables = provider.catalog().len(),
        "Kubernetes connector registered"
    );
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kubernetes::discovery::ResourceKind;

    fn provider() -> KubernetesSchemaProvider {
        let catalog = ResourceCatalog::from_kinds(vec![
            ResourceKind {
                group: String::new(),
                version: "v1".to_string(),
                plural: "pods".to_string(),
                kind: "Pod".to_string(),
            },
            ResourceKind {
                group: "apps".to_string(),
                version: "v1".to_string(),
                plural: "deployments".to_string(),
                kind: "Deployment".to_string(),
            },
        ]);
        // A client is only needed once a table is scanned; tests that stop
        // at name resolution can use a stub connection-less provider.
        KubernetesSchemaProvider::new(Arc::new(catalog), stub_api())
    }

    fn stub_api() -> KubeApi {
        use kube::{Client, Config};
        let config = Config::new("http://localhost:8080".parse().unwrap());
        KubeApi::new(Client::try_from(config).expect("stub client"))
    }

    #[tokio::test]
    async fn lists_and_resolves_discovered_tables() {
        let provider = provider();
        let mut names = provider.table_names();
        names.sort();
        assert_eq!(names, vec!["apps.deployments", "pods"]);

        assert!(provider.table_exist("pods"));
        assert!(!provider.table_exist("gadgets"));

        let table = provider.table("pods").await.unwrap();
        assert!(table.is_some());
        let missing = provider.table("gadgets").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn resolved_tables_carry_the_fixed_schema() {
        let provider = provider();
        let table = provider.table("apps.deployments").await.unwrap().unwrap();
        let schema = table.schema();
        assert_eq!(schema.fields().len(), 17);
        assert_eq!(schema.field(0).name(), "kind");
        assert_eq!(schema.field(16).name(), "resource");
    }
}

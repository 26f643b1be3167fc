// Copyright (c) 2026 kubetables contributors
// SPDX-License-Identifier: BSD-3-Clause

//! Table descriptors and the discovered-resource catalog.
//!
//! The catalog is built once at connector registration from the discovery
//! result and is read-only afterwards; request handling code holds it behind
//! an `Arc` and never rebuilds it.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::kubernetes::KubeApi;
use crate::kubernetes::discovery::ResourceKind;
use crate::tables::columns::{ColumnSpec, RESOURCE_COLUMNS};

/// The schema every resource table lives in.
pub const RESOURCES_SCHEMA: &str = "resources";

/// Qualified table name: schema plus table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TableName {
    pub schema: String,
    pub table: String,
}

impl TableName {
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
        }
    }

    /// A table in the `resources` schema.
    pub fn resources(table: impl Into<String>) -> Self {
        Self::new(RESOURCES_SCHEMA, table)
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}

/// Descriptor for one resource table: qualified name, the fixed column set,
/// and the resource kind it was built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceTable {
    name: TableName,
    kind: ResourceKind,
}

impl ResourceTable {
    pub fn from_kind(kind: ResourceKind) -> Self {
        let table = if kind.group.is_empty() {
            kind.plural.clone()
        } else {
            format!("{}.{}", kind.group, kind.plural)
        };
        Self {
            name: TableName::resources(table),
            kind,
        }
    }

    pub fn name(&self) -> &TableName {
        &self.name
    }

    pub fn kind(&self) -> &ResourceKind {
        &self.kind
    }

    /// Column descriptors, in table order. Identical for every resource
    /// table.
    pub fn columns(&self) -> &'static [ColumnSpec] {
        &RESOURCE_COLUMNS
    }
}

/// The immutable name → descriptor map built from discovery.
#[derive(Debug, Default)]
pub struct ResourceCatalog {
    tables: BTreeMap<TableName, Arc<ResourceTable>>,
}

impl ResourceCatalog {
    /// Run discovery once and build the catalog. Fatal on discovery
    /// failure; the connector cannot start without a catalog.
    pub async fn discover(api: &KubeApi) -> Result<Self> {
        let kinds = api.discover_resource_kinds().await?;
        Ok(Self::from_kinds(kinds))
    }

    /// Build the catalog from already-discovered kinds.
    ///
    /// Two kinds mapping to the same qualified name would shadow each other;
    /// the first discovered wins and the loser is dropped with a warning so
    /// the collision is visible rather than silent.
    pub fn from_kinds(kinds: Vec<ResourceKind>) -> Self {
        let mut tables: BTreeMap<TableName, Arc<ResourceTable>> = BTreeMap::new();

        for kind in kinds {
            let table = ResourceTable::from_kind(kind);
            if let Some(existing) = tables.get(table.name()) {
                warn!(
                    table = %table.name(),
                    kept = %existing.kind().api_version(),
                    dropped = %table.kind().api_version(),
                    "Duplicate qualified table name; keeping the first discovered kind"
                );
                continue;
            }
            tables.insert(table.name().clone(), Arc::new(table));
        }

        info!(tables = tables.len(), "Resource catalog built");
        Self { tables }
    }

    pub fn lookup(&self, name: &TableName) -> Result<Arc<ResourceTable>> {
        self.tables
            .get(name)
            .cloned()
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }

    /// All qualified names, in a stable (sorted) order.
    pub fn list(&self) -> impl Iterator<Item = &TableName> {
        self.tables.keys()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(group: &str, plural: &str, kind_name: &str) -> ResourceKind {
        ResourceKind {
            group: group.to_string(),
            version: "v1".to_string(),
            plural: plural.to_string(),
            kind: kind_name.to_string(),
        }
    }

    #[test]
    fn core_kinds_use_bare_plural_names() {
        let table = ResourceTable::from_kind(kind("", "pods", "Pod"));
        assert_eq!(table.name().to_string(), "resources.pods");
    }

    #[test]
    fn grouped_kinds_use_group_prefixed_names() {
        let table = ResourceTable::from_kind(kind("apps", "deployments", "Deployment"));
        assert_eq!(table.name().to_string(), "resources.apps.deployments");
    }

    #[test]
    fn every_table_has_the_fixed_column_set() {
        let table = ResourceTable::from_kind(kind("batch", "jobs", "Job"));
        assert_eq!(table.columns().len(), 17);
        assert_eq!(table.columns()[0].name, "kind");
        assert_eq!(table.columns()[16].name, "resource");
    }

    #[test]
    fn lookup_resolves_every_discovered_kind() {
        let catalog = ResourceCatalog::from_kinds(vec![
            kind("", "pods", "Pod"),
            kind("apps", "deployments", "Deployment"),
        ]);

        for name in catalog.list().cloned().collect::<Vec<_>>() {
            let table = catalog.lookup(&name).unwrap();
            let names: Vec<&str> = table.columns().iter().map(|c| c.name).collect();
            assert_eq!(names.len(), 17);
            assert_eq!(*table.name(), name);
        }
    }

    #[test]
    fn lookup_of_unknown_name_is_table_not_found() {
        let catalog = ResourceCatalog::from_kinds(vec![kind("", "pods", "Pod")]);
        let missing = TableName::resources("gadgets");
        assert!(matches!(
            catalog.lookup(&missing),
            Err(Error::TableNotFound(name)) if name == "resources.gadgets"
        ));
    }

    #[test]
    fn duplicate_names_keep_first() {
        let catalog = ResourceCatalog::from_kinds(vec![
            kind("metrics.example.com", "gadgets", "Gadget"),
            kind("metrics.example.com", "gadgets", "GadgetClone"),
        ]);
        assert_eq!(catalog.len(), 1);
        let table = catalog
            .lookup(&TableName::resources("metrics.example.com.gadgets"))
            .unwrap();
        assert_eq!(table.kind().kind, "Gadget");
    }

    #[test]
    fn list_order_is_stable() {
        let catalog = ResourceCatalog::from_kinds(vec![
            kind("", "services", "Service"),
            kind("", "pods", "Pod"),
        ]);
        let first: Vec<String> = catalog.list().map(ToString::to_string).collect();
        let second: Vec<String> = catalog.list().map(ToString::to_string).collect();
        assert_eq!(first, second);
    }
}

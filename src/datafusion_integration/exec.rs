// Copyright (c) 2026 kubetables contributors
// SPDX-License-Identifier: BSD-3-Clause

//! ExecutionPlan for resource table scans.
//!
//! A resource table is never partitioned: one split, one partition, one list
//! call. Fetching is lazy — the API is not touched until the engine polls
//! the partition stream.
//!
//! LIMIT pushdown at the plan level stays disabled: DataFusion's
//! `with_fetch()` receives `skip + fetch` combined when an OFFSET is
//! present, so the scan-time limit already carried by the handle is the only
//! native cap, and it is an over-approximation the engine re-enforces.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use async_stream::try_stream;
use datafusion::arrow::datatypes::SchemaRef;
use datafusion::error::{DataFusionError, Result};
use datafusion::execution::{SendableRecordBatchStream, TaskContext};
use datafusion::physical_expr::{EquivalenceProperties, Partitioning};
use datafusion::physical_plan::execution_plan::{Boundedness, EmissionType};
use datafusion::physical_plan::stream::RecordBatchStreamAdapter;
use datafusion::physical_plan::{DisplayAs, DisplayFormatType, ExecutionPlan, PlanProperties};
use tracing::debug;

use crate::kubernetes::client::KubeApi;
use crate::tables::columns::{ColumnSpec, ColumnType};
use crate::tables::handle::Split;
use crate::tables::pushdown::Predicate;
use crate::tables::resource::ResourceTable;

use super::convert::rows_to_batch;

pub struct ResourceExec {
    table: Arc<ResourceTable>,
    split: Split,
    /// Requested columns, in output order.
    columns: Vec<ColumnSpec>,
    schema: SchemaRef,
    api: KubeApi,
    plan_properties: PlanProperties,
}

impl ResourceExec {
    pub fn new(
        table: Arc<ResourceTable>,
        split: Split,
        columns: Vec<ColumnSpec>,
        schema: SchemaRef,
        api: KubeApi,
    ) -> Self {
        let plan_properties = PlanProperties::new(
            EquivalenceProperties::new(schema.clone()),
            Partitioning::UnknownPartitioning(1),
            EmissionType::Incremental,
            Boundedness::Bounded,
        );
        Self {
            table,
            split,
            columns,
            schema,
            api,
            plan_properties,
        }
    }
}

impl fmt::Debug for ResourceExec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceExec")
            .field("table", &self.table.name().to_string())
            .finish()
    }
}

impl DisplayAs for ResourceExec {
    fn fmt_as(&self, t: DisplayFormatType, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match t {
            DisplayFormatType::Default
            | DisplayFormatType::Verbose
            | DisplayFormatType::TreeRender => {
                write!(f, "KubeResourceExec: table={}", self.table.name())?;
                match &self.split {
                    Split::Resource(split) => {
                        if let Some(namespace) = split.handle.predicate.single_namespace() {
                            write!(f, ", namespace={namespace}")?;
                        }
                        if let Some(limit) = split.handle.limit {
                            write!(f, ", limit={limit}")?;
                        }
                    }
                    Split::Logs(_) => {}
                }
                Ok(())
            }
        }
    }
}

impl ExecutionPlan for ResourceExec {
    fn name(&self) -> &str {
        "KubeResourceExec"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    fn properties(&self) -> &PlanProperties {
        &self.plan_properties
    }

    fn children(&self) -> Vec<&Arc<dyn ExecutionPlan>> {
        vec![]
    }

    fn with_new_children(
        self: Arc<Self>,
        children: Vec<Arc<dyn ExecutionPlan>>,
    ) -> Result<Arc<dyn ExecutionPlan>> {
        if children.is_empty() {
            Ok(self)
        } else {
            Err(DataFusionError::Internal(
                "ResourceExec has no children".to_string(),
            ))
        }
    }

    fn supports_limit_pushdown(&self) -> bool {
        false
    }

    fn fetch(&self) -> Option<usize> {
        match &self.split {
            Split::Resource(split) => split.handle.limit.map(|limit| limit as usize),
            Split::Logs(_) => None,
        }
    }

    fn execute(
        &self,
        partition: usize,
        _context: Arc<TaskContext>,
    ) -> Result<SendableRecordBatchStream> {
        if partition != 0 {
            return Err(DataFusionError::Internal(format!(
                "ResourceExec has a single partition, got {partition}"
            )));
        }

        let handle = match &self.split {
            Split::Resource(split) => split.handle.clone(),
            Split::Logs(split) => {
                return Err(DataFusionError::Internal(format!(
                    "resource scan handed a log split for pod {}",
                    split.pod
                )));
            }
        };

        let table = self.table.clone();
        let columns = self.columns.clone();
        let types: Vec<ColumnType> = columns.iter().map(|c| c.ty).collect();
        let api = self.api.clone();
        let schema = self.schema.clone();

        let stream = try_stream! {
            // An unsatisfiable pushed predicate means no rows can match;
            // skip the network call entirely.
            if handle.predicate == Predicate::None {
                debug!(table = %table.name(), "Unsatisfiable predicate, returning no rows");
                return;
            }

            let namespace = handle.predicate.single_namespace();
            let objects = api
                .list_objects(table.kind(), namespace, handle.limit)
                .await?;

            debug!(
                table = %table.name(),
                namespace = ?namespace,
                limit = ?handle.limit,
                rows = objects.len(),
                "Fetched resources"
            );

            let rows: Vec<Vec<_>> = objects
                .iter()
                .map(|object| {
                    columns
                        .iter()
                        .map(|column| column.extract(table.kind(), object))
                        .collect()
                })
                .collect();

            let batch = rows_to_batch(schema.clone(), &types, &rows)?;
            yield batch;
        };

        Ok(Box::pin(RecordBatchStreamAdapter::new(
            self.schema.clone(),
            stream,
        )))
    }
}

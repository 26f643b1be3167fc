// Copyright (c) 2026 kubetables contributors
// SPDX-License-Identifier: BSD-3-Clause

//! ExecutionPlan for the log surface: one partition per split.
//!
//! Each split is an independent (pod, container) log fetch; DataFusion may
//! run them concurrently on separate workers. A partition runs a two-state
//! machine, Start → Finished: on first poll it fetches and parses the whole
//! log into exactly one batch, then the stream completes.

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
use futures::stream;
use tracing::debug;

use crate::error::Error;
use crate::kubernetes::client::KubeApi;
use crate::kubernetes::logs::parse_log;
use crate::tables::columns::ColumnType;
use crate::tables::handle::{LogSplit, Split};
use crate::tables::types::ColumnValue;

use super::convert::{arrow_schema, rows_to_batch};
use super::logs_function::LOG_COLUMNS;

pub struct PodLogsExec {
    api: KubeApi,
    splits: Vec<Split>,
    /// Indices into [`LOG_COLUMNS`], in output order.
    projection: Vec<usize>,
    types: Vec<ColumnType>,
    schema: SchemaRef,
    plan_properties: PlanProperties,
}

impl PodLogsExec {
    pub fn try_new(api: KubeApi, splits: Vec<Split>, projection: Vec<usize>) -> Result<Self> {
        let columns = projection
            .iter()
            .map(|&i| {
                LOG_COLUMNS.get(i).copied().ok_or_else(|| {
                    DataFusionError::Internal(format!("projection index {i} out of range"))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let types: Vec<ColumnType> = columns.iter().map(|(_, ty)| *ty).collect();
        let schema = arrow_schema(columns.iter().copied());

        let plan_properties = PlanProperties::new(
            EquivalenceProperties::new(schema.clone()),
            Partitioning::UnknownPartitioning(splits.len().max(1)),
            EmissionType::Incremental,
            Boundedness::Bounded,
        );

        Ok(Self {
            api,
            splits,
            projection,
            types,
            schema,
            plan_properties,
        })
    }
}

impl fmt::Debug for PodLogsExec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PodLogsExec")
            .field("splits", &self.splits.len())
            .finish()
    }
}

impl DisplayAs for PodLogsExec {
    fn fmt_as(&self, t: DisplayFormatType, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match t {
            DisplayFormatType::Default
            | DisplayFormatType::Verbose
            | DisplayFormatType::TreeRender => {
                write!(f, "PodLogsExec: splits={}", self.splits.len())
            }
        }
    }
}

impl ExecutionPlan for PodLogsExec {
    fn name(&self) -> &str {
        "PodLogsExec"
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
                "PodLogsExec has no children".to_string(),
            ))
        }
    }

    fn execute(
        &self,
        partition: usize,
        _context: Arc<TaskContext>,
    ) -> Result<SendableRecordBatchStream> {
        // A selector can legitimately resolve to zero splits (e.g. a scaled
        // down deployment); the plan still has one empty partition.
        if self.splits.is_empty() {
            return Ok(Box::pin(RecordBatchStreamAdapter::new(
                self.schema.clone(),
                stream::empty(),
            )));
        }

        let split = match self.splits.get(partition) {
            Some(Split::Logs(split)) => split.clone(),
            Some(Split::Resource(split)) => {
                return Err(DataFusionError::Internal(format!(
                    "log scan handed a resource split for table {}",
                    split.handle.table
                )));
            }
            None => {
                return Err(DataFusionError::Internal(format!(
                    "partition {partition} out of range ({} splits)",
                    self.splits.len()
                )));
            }
        };

        let api = self.api.clone();
        let projection = self.projection.clone();
        let types = self.types.clone();
        let schema = self.schema.clone();

        let stream = try_stream! {
            let batch = fetch_split(&api, &split, &projection, &types, schema.clone()).await?;
            yield batch;
        };

        Ok(Box::pin(RecordBatchStreamAdapter::new(
            self.schema.clone(),
            stream,
        )))
    }
}

/// The whole life of one split: fetch the container log, parse every line,
/// emit one batch.
async fn fetch_split(
    api: &KubeApi,
    split: &LogSplit,
    projection: &[usize],
    types: &[ColumnType],
    schema: SchemaRef,
) -> Result<datafusion::arrow::array::RecordBatch> {
    let raw = api
        .pod_log(
            &split.namespace,
            &split.pod,
            split.container.as_deref(),
            split.limit,
        )
        .await?;
    let lines = parse_log(&raw)?;

    debug!(
        namespace = %split.namespace,
        pod = %split.pod,
        container = ?split.container,
        lines = lines.len(),
        "Fetched container log"
    );

    let mut rows = Vec::with_capacity(lines.len());
    for line in lines {
        let nanos = line.timestamp.timestamp_nanos_opt().ok_or_else(|| {
            Error::Internal(format!("log timestamp out of range: {}", line.timestamp))
        })?;
        let full = [
            ColumnValue::Text(split.pod.clone()),
            match &split.container {
                Some(container) => ColumnValue::Text(container.clone()),
                None => ColumnValue::Null,
            },
            ColumnValue::TimestampTz(nanos),
            ColumnValue::Text(line.message),
        ];
        rows.push(projection.iter().map(|&i| full[i].clone()).collect());
    }

    rows_to_batch(schema, types, &rows)
}

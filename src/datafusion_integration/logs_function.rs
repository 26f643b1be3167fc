// Copyright (c) 2026 kubetables contributors
// SPDX-License-Identifier: BSD-3-Clause

//! The `pod_logs` table function.
//!
//! `pod_logs(namespace, selector [, container [, limit]])` — selector is a
//! bare pod name or `kind/name` for deployment, statefulset, or replicaset.
//! Analysis validates the arguments and produces a [`LogTableHandle`]; split
//! fan-out happens at scan time against the live cluster.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use datafusion::arrow::datatypes::SchemaRef;
use datafusion::catalog::{Session, TableFunctionImpl};
use datafusion::common::ScalarValue;
use datafusion::datasource::{TableProvider, TableType};
use datafusion::error::{DataFusionError, Result};
use datafusion::logical_expr::Expr;
use datafusion::physical_plan::ExecutionPlan;

use crate::error::Error;
use crate::kubernetes::client::KubeApi;
use crate::kubernetes::logs::{self, Selector};
use crate::tables::columns::ColumnType;
use crate::tables::handle::{LogTableHandle, TableHandle};
use crate::tables::pushdown::{self, LimitApplication};

use super::convert::arrow_schema;
use super::logs_exec::PodLogsExec;

/// Output schema of the log surface, in fixed order.
pub const LOG_COLUMNS: [(&str, ColumnType); 4] = [
    ("pod", ColumnType::Text),
    ("container", ColumnType::Text),
    ("timestamp", ColumnType::TimestampTz),
    ("log", ColumnType::Text),
];

pub fn log_schema() -> SchemaRef {
    arrow_schema(LOG_COLUMNS)
}

#[derive(Debug)]
pub struct PodLogsFunction {
    api: KubeApi,
}

impl PodLogsFunction {
    pub fn new(api: KubeApi) -> Self {
        Self { api }
    }
}

impl TableFunctionImpl for PodLogsFunction {
    fn call(&self, args: &[Expr]) -> Result<Arc<dyn TableProvider>> {
        let handle = handle_from_args(args)?;
        Ok(Arc::new(PodLogsTableProvider {
            api: self.api.clone(),
            handle,
            schema: log_schema(),
        }))
    }
}

/// Validate the function arguments into a handle. Also rejects malformed
/// selectors here, at analysis time, rather than on first execution.
fn handle_from_args(args: &[Expr]) -> Result<LogTableHandle, Error> {
    if args.len() < 2 || args.len() > 4 {
        return Err(Error::Unsupported(
            "pod_logs takes NAMESPACE, SELECTOR, and optional CONTAINER and LIMIT arguments"
                .to_string(),
        ));
    }

    let namespace = required_utf8(&args[0], "NAMESPACE")?;
    let selector = required_utf8(&args[1], "SELECTOR")?;
    let container = match args.get(2) {
        Some(expr) => optional_utf8(expr, "CONTAINER")?,
        None => None,
    };
    let tail = match args.get(3) {
        Some(expr) => optional_limit(expr)?,
        None => None,
    };

    Selector::parse(&selector)?;

    Ok(LogTableHandle::new(namespace, selector, container, tail))
}

fn required_utf8(expr: &Expr, name: &str) -> Result<String, Error> {
    match optional_utf8(expr, name)? {
        Some(value) => Ok(value),
        None => Err(Error::Unsupported(format!(
            "pod_logs argument {name} is required"
        ))),
    }
}

fn optional_utf8(expr: &Expr, name: &str) -> Result<Option<String>, Error> {
    match expr {
        Expr::Literal(ScalarValue::Utf8(value), _) => Ok(value.clone()),
        Expr::Literal(ScalarValue::Null, _) => Ok(None),
        _ => Err(Error::Unsupported(format!(
            "pod_logs argument {name} must be a string literal"
        ))),
    }
}

fn optional_limit(expr: &Expr) -> Result<Option<u32>, Error> {
    let value = match expr {
        Expr::Literal(ScalarValue::Int64(value), _) => value.map(i128::from),
        Expr::Literal(ScalarValue::Int32(value), _) => value.map(i128::from),
        Expr::Literal(ScalarValue::UInt64(value), _) => value.map(i128::from),
        Expr::Literal(ScalarValue::Null, _) => None,
        _ => {
            return Err(Error::Unsupported(
                "pod_logs argument LIMIT must be an integer literal".to_string(),
            ));
        }
    };
    match value {
        None => Ok(None),
        Some(v) if v < 0 => Err(Error::Unsupported(
            "pod_logs argument LIMIT must not be negative".to_string(),
        )),
        // Clamp to the representable list-API maximum.
        Some(v) => Ok(Some(u32::try_from(v).unwrap_or(u32::MAX))),
    }
}

struct PodLogsTableProvider {
    api: KubeApi,
    handle: LogTableHandle,
    schema: SchemaRef,
}

impl std::fmt::Debug for PodLogsTableProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PodLogsTableProvider")
            .field("namespace", &self.handle.namespace)
            .field("selector", &self.handle.selector)
            .finish()
    }
}

#[async_trait]
impl TableProvider for PodLogsTableProvider {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    fn table_type(&self) -> TableType {
        TableType::Base
    }

    async fn scan(
        &self,
        _state: &dyn Session,
        projection: Option<&Vec<usize>>,
        _filters: &[Expr],
        limit: Option<usize>,
    ) -> Result<Arc<dyn ExecutionPlan>> {
        let mut handle = self.handle.clone();

        if let Some(limit) = limit {
            match pushdown::apply_limit(&TableHandle::Logs(handle.clone()), limit as u64) {
                LimitApplication::NoChange => {}
                LimitApplication::Applied {
                    handle: TableHandle::Logs(updated),
                    ..
                } => handle = updated,
                LimitApplication::Applied {
                    handle: TableHandle::Resource(_),
                    ..
                } => {
                    return Err(DataFusionError::Internal(
                        "limit application changed the handle surface".to_string(),
                    ));
                }
            }
        }

        // Fan-out: resolve the selector against the live cluster, one split
        // per (pod, container) pair.
        let splits = logs::plan_log_splits(&self.api, &handle).await?;

        let projection: Vec<usize> = match projection {
            Some(indices) => indices.clone(),
            None => (0..LOG_COLUMNS.len()).collect(),
        };

        Ok(Arc::new(PodLogsExec::try_new(
            self.api.clone(),
            splits,
            projection,
        )?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datafusion::logical_expr::lit;

    fn null_utf8() -> Expr {
        Expr::Literal(ScalarValue::Utf8(None), None)
    }

    #[test]
    fn log_schema_has_the_fixed_column_order() {
        let schema = log_schema();
        let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
        assert_eq!(names, vec!["pod", "container", "timestamp", "log"]);
    }

    #[test]
    fn accepts_required_arguments_only() {
        let handle = handle_from_args(&[lit("default"), lit("web-0")]).unwrap();
        assert_eq!(handle.namespace, "default");
        assert_eq!(handle.selector, "web-0");
        assert_eq!(handle.container, None);
        assert_eq!(handle.tail, None);
    }

    #[test]
    fn accepts_all_four_arguments() {
        let handle = handle_from_args(&[
            lit("default"),
            lit("deployment/web"),
            lit("sidecar"),
            lit(100i64),
        ])
        .unwrap();
        assert_eq!(handle.container.as_deref(), Some("sidecar"));
        assert_eq!(handle.tail, Some(100));
    }

    #[test]
    fn null_optional_arguments_are_unset() {
        let handle = handle_from_args(&[
            lit("default"),
            lit("web-0"),
            null_utf8(),
            Expr::Literal(ScalarValue::Int64(None), None),
        ])
        .unwrap();
        assert_eq!(handle.container, None);
        assert_eq!(handle.tail, None);
    }

    #[test]
    fn rejects_missing_or_ill_typed_arguments() {
        assert!(matches!(
            handle_from_args(&[lit("default")]),
            Err(Error::Unsupported(_))
        ));
        assert!(matches!(
            handle_from_args(&[lit(1i64), lit("web-0")]),
            Err(Error::Unsupported(_))
        ));
        assert!(matches!(
            handle_from_args(&[null_utf8(), lit("web-0")]),
            Err(Error::Unsupported(_))
        ));
        assert!(matches!(
            handle_from_args(&[lit("default"), lit("web-0"), lit("app"), lit("ten")]),
            Err(Error::Unsupported(_))
        ));
        assert!(matches!(
            handle_from_args(&[lit("default"), lit("web-0"), lit("app"), lit(-1i64)]),
            Err(Error::Unsupported(_))
        ));
    }

    #[test]
    fn rejects_unknown_selector_kinds_at_analysis_time() {
        assert!(matches!(
            handle_from_args(&[lit("default"), lit("cronjob/cleanup")]),
            Err(Error::Unsupported(_))
        ));
    }

    #[test]
    fn clamps_oversized_limits() {
        let handle = handle_from_args(&[
            lit("default"),
            lit("web-0"),
            null_utf8(),
            lit(i64::MAX),
        ])
        .unwrap();
        assert_eq!(handle.tail, Some(u32::MAX));
    }
}

// Copyright (c) 2026 kubetables contributors
// SPDX-License-Identifier: BSD-3-Clause

//! TableProvider for resource tables.
//!
//! Declares namespace equality as the only exactly-pushed filter, translates
//! the planner's expressions into the connector's predicate model, runs the
//! pushdown engine, and hands the tightened handle to a [`ResourceExec`].

use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use datafusion::arrow::datatypes::SchemaRef;
use datafusion::catalog::Session;
use datafusion::common::ScalarValue;
use datafusion::datasource::{TableProvider, TableType};
use datafusion::error::{DataFusionError, Result};
use datafusion::logical_expr::{Expr, Operator, TableProviderFilterPushDown};
use datafusion::physical_plan::ExecutionPlan;

use crate::kubernetes::client::KubeApi;
use crate::tables::columns::{ColumnSpec, NAMESPACE_COLUMN, RESOURCE_COLUMNS};
use crate::tables::handle::{ResourceSplit, ResourceTableHandle, Split, TableHandle};
use crate::tables::pushdown::{
    self, Domain, LimitApplication, Predicate, PredicateApplication,
};
use crate::tables::resource::ResourceTable;

use super::convert::arrow_schema;
use super::exec::ResourceExec;

pub struct ResourceTableProvider {
    table: Arc<ResourceTable>,
    api: KubeApi,
    schema: SchemaRef,
}

impl ResourceTableProvider {
    pub fn new(table: Arc<ResourceTable>, api: KubeApi) -> Self {
        let schema = arrow_schema(table.columns().iter().map(|c| (c.name, c.ty)));
        Self { table, api, schema }
    }
}

impl std::fmt::Debug for ResourceTableProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceTableProvider")
            .field("table", &self.table.name().to_string())
            .finish()
    }
}

#[async_trait]
impl TableProvider for ResourceTableProvider {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    fn table_type(&self) -> TableType {
        TableType::Base
    }

    fn supports_filters_pushdown(
        &self,
        filters: &[&Expr],
    ) -> Result<Vec<TableProviderFilterPushDown>> {
        // namespace = 'x' selects the namespaced list endpoint and needs no
        // re-check. Everything else is fetched wide and re-filtered by the
        // engine.
        Ok(filters
            .iter()
            .map(|filter| {
                if is_namespace_equality(filter) {
                    TableProviderFilterPushDown::Exact
                } else {
                    TableProviderFilterPushDown::Inexact
                }
            })
            .collect())
    }

    async fn scan(
        &self,
        _state: &dyn Session,
        projection: Option<&Vec<usize>>,
        filters: &[Expr],
        limit: Option<usize>,
    ) -> Result<Arc<dyn ExecutionPlan>> {
        let mut handle = ResourceTableHandle::new(self.table.name().clone());

        let proposed = predicate_from_exprs(filters);
        match pushdown::apply_predicate(&handle, &proposed) {
            PredicateApplication::Applied {
                handle: updated,
                residual: _residual,
            } => handle = updated,
            // Nothing natively applicable; the engine keeps the filters.
            PredicateApplication::NoImprovement => {}
        }

        if let Some(limit) = limit {
            match pushdown::apply_limit(&TableHandle::Resource(handle.clone()), limit as u64) {
                LimitApplication::NoChange => {}
                LimitApplication::Applied {
                    handle: TableHandle::Resource(updated),
                    ..
                } => handle = updated,
                LimitApplication::Applied {
                    handle: TableHandle::Logs(_),
                    ..
                } => {
                    return Err(DataFusionError::Internal(
                        "limit application changed the handle surface".to_string(),
                    ));
                }
            }
        }

        let columns = project_columns(projection)?;
        let schema = arrow_schema(columns.iter().map(|c| (c.name, c.ty)));

        Ok(Arc::new(ResourceExec::new(
            self.table.clone(),
            Split::Resource(ResourceSplit { handle }),
            columns,
            schema,
            self.api.clone(),
        )))
    }
}

fn project_columns(projection: Option<&Vec<usize>>) -> Result<Vec<ColumnSpec>> {
    match projection {
        None => Ok(RESOURCE_COLUMNS.to_vec()),
        Some(indices) => indices
            .iter()
            .map(|&i| {
                RESOURCE_COLUMNS.get(i).copied().ok_or_else(|| {
                    DataFusionError::Internal(format!("projection index {i} out of range"))
                })
            })
            .collect(),
    }
}

/// `namespace = '<literal>'`, the one filter the API applies exactly.
fn is_namespace_equality(expr: &Expr) -> bool {
    if let Expr::BinaryExpr(binary) = expr
        && binary.op == Operator::Eq
        && let Expr::Column(column) = binary.left.as_ref()
        && column.name == NAMESPACE_COLUMN
        && let Expr::Literal(literal, _) = binary.right.as_ref()
        && matches!(literal, ScalarValue::Utf8(Some(_)))
    {
        return true;
    }
    false
}

/// Translate the planner's filter expressions into the connector predicate
/// model. Expressions with no column-domain rendering are skipped — the
/// engine re-applies them anyway.
pub fn predicate_from_exprs(filters: &[Expr]) -> Predicate {
    let mut predicate = Predicate::All;
    for filter in filters {
        if let Some((column, domain)) = extract_domain(filter) {
            let next = Predicate::from_domains(BTreeMap::from([(column, domain)]));
            predicate = predicate.intersect(&next);
        }
    }
    predicate
}

fn extract_domain(expr: &Expr) -> Option<(String, Domain)> {
    match expr {
        // column = 'value'
        Expr::BinaryExpr(binary) if binary.op == Operator::Eq => {
            if let (Expr::Column(column), Expr::Literal(literal, _)) =
                (binary.left.as_ref(), binary.right.as_ref())
                && let ScalarValue::Utf8(Some(value)) = literal
            {
                return Some((column.name.clone(), Domain::single(value.clone())));
            }
            None
        }
        // The planner rewrites IN lists to OR chains; collect them back into
        // one multi-value domain when every leaf hits the same column.
        Expr::BinaryExpr(binary) if binary.op == Operator::Or => {
            let mut column = None;
            let mut values = Vec::new();
            if collect_or_values(expr, &mut column, &mut values) {
                return Some((column?, Domain::multiple(values)));
            }
            None
        }
        // column IN ('a', 'b'), kept for plans that preserve the list form.
        Expr::InList(in_list) if !in_list.negated => {
            let Expr::Column(column) = in_list.expr.as_ref() else {
                return None;
            };
            let values: Vec<String> = in_list
                .list
                .iter()
                .filter_map(|item| {
                    if let Expr::Literal(literal, _) = item
                        && let ScalarValue::Utf8(Some(value)) = literal
                    {
                        Some(value.clone())
                    } else {
                        None
                    }
                })
                .collect();
            if values.len() == in_list.list.len() && !values.is_empty() {
                return Some((column.name.clone(), Domain::multiple(values)));
            }
            None
        }
        _ => None,
    }
}

/// Collect `column = 'value'` leaves from an OR tree. Returns false if any
/// leaf is not an equality on the one shared column.
fn collect_or_values(expr: &Expr, column: &mut Option<String>, values: &mut Vec<String>) -> bool {
    match expr {
        Expr::BinaryExpr(binary) if binary.op == Operator::Or => {
            collect_or_values(&binary.left, column, values)
                && collect_or_values(&binary.right, column, values)
        }
        Expr::BinaryExpr(binary) if binary.op == Operator::Eq => {
            if let (Expr::Column(col), Expr::Literal(literal, _)) =
                (binary.left.as_ref(), binary.right.as_ref())
                && let ScalarValue::Utf8(Some(value)) = literal
            {
                match column {
                    Some(existing) if existing != &col.name => return false,
                    _ => *column = Some(col.name.clone()),
                }
                values.push(value.clone());
                return true;
            }
            false
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datafusion::logical_expr::{BinaryExpr, col, lit};

    #[test]
    fn namespace_equality_is_exact() {
        let expr = col(NAMESPACE_COLUMN).eq(lit("default"));
        assert!(is_namespace_equality(&expr));

        let other = col("name").eq(lit("web-0"));
        assert!(!is_namespace_equality(&other));

        let non_literal = col(NAMESPACE_COLUMN).eq(col("name"));
        assert!(!is_namespace_equality(&non_literal));
    }

    #[test]
    fn single_equality_becomes_a_single_value_domain() {
        let predicate = predicate_from_exprs(&[col(NAMESPACE_COLUMN).eq(lit("default"))]);
        assert_eq!(predicate.single_namespace(), Some("default"));
    }

    #[test]
    fn or_chain_becomes_a_multi_value_domain() {
        let expr = Expr::BinaryExpr(BinaryExpr {
            left: Box::new(col(NAMESPACE_COLUMN).eq(lit("a"))),
            op: Operator::Or,
            right: Box::new(col(NAMESPACE_COLUMN).eq(lit("b"))),
        });
        let predicate = predicate_from_exprs(&[expr]);
        // Multi-value: not scopable to one namespace.
        assert_eq!(predicate.single_namespace(), None);
        assert!(matches!(predicate, Predicate::Domains(_)));
    }

    #[test]
    fn mixed_column_or_chain_is_not_extracted() {
        let expr = Expr::BinaryExpr(BinaryExpr {
            left: Box::new(col(NAMESPACE_COLUMN).eq(lit("a"))),
            op: Operator::Or,
            right: Box::new(col("name").eq(lit("b"))),
        });
        assert_eq!(predicate_from_exprs(&[expr]), Predicate::All);
    }

    #[test]
    fn conjoined_filters_intersect() {
        let filters = vec![
            col(NAMESPACE_COLUMN).eq(lit("default")),
            col("name").eq(lit("web-0")),
        ];
        let predicate = predicate_from_exprs(&filters);
        assert_eq!(predicate.single_namespace(), Some("default"));

        let contradictory = vec![
            col(NAMESPACE_COLUMN).eq(lit("a")),
            col(NAMESPACE_COLUMN).eq(lit("b")),
        ];
        assert_eq!(predicate_from_exprs(&contradictory), Predicate::None);
    }

    #[test]
    fn projection_selects_columns_in_request_order() {
        let columns = project_columns(Some(&vec![4, 0])).unwrap();
        let names: Vec<&str> = columns.iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["namespace", "kind"]);

        assert_eq!(project_columns(None).unwrap().len(), 17);
        assert!(project_columns(Some(&vec![99])).is_err());
    }
}

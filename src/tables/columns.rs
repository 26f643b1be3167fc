// Copyright (c) 2026 kubetables contributors
// SPDX-License-Identifier: BSD-3-Clause

//! The fixed column set attached to every resource table.
//!
//! The registry is data-driven: each column carries a [`ColumnSource`] tag
//! and a [`ColumnType`], and extraction dispatches on the tag. Every table
//! gets the same 17 columns regardless of kind, so any two resource tables
//! are union-compatible.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::kubernetes::discovery::ResourceKind;
use crate::tables::types::{self, ColumnValue};

/// Semantic column type; mapped onto Arrow types at materialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Text,
    Bigint,
    TimestampTz,
    TextList,
    TextMap,
}

/// Where a column's value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColumnSource {
    /// Constant per table: the kind name.
    Kind,
    /// Constant per table: the API group (empty for the core group).
    Group,
    /// Constant per table: the preferred version.
    ApiVersion,
    /// A named field of the object's `metadata` block, converted according
    /// to the column type.
    Metadata(&'static str),
    /// The whole `metadata` block, serialized back to JSON text.
    RawMetadata,
    /// The whole object with the `metadata` key removed, serialized to JSON
    /// text.
    RawResource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub ty: ColumnType,
    pub source: ColumnSource,
}

const fn column(name: &'static str, ty: ColumnType, source: ColumnSource) -> ColumnSpec {
    ColumnSpec { name, ty, source }
}

/// The column set of every resource table, in table order.
pub const RESOURCE_COLUMNS: [ColumnSpec; 17] = [
    column("kind", ColumnType::Text, ColumnSource::Kind),
    column("group", ColumnType::Text, ColumnSource::Group),
    column("apiVersion", ColumnType::Text, ColumnSource::ApiVersion),
    column("name", ColumnType::Text, ColumnSource::Metadata("name")),
    column(
        "namespace",
        ColumnType::Text,
        ColumnSource::Metadata("namespace"),
    ),
    column(
        "labels",
        ColumnType::TextMap,
        ColumnSource::Metadata("labels"),
    ),
    column(
        "annotations",
        ColumnType::TextMap,
        ColumnSource::Metadata("annotations"),
    ),
    column(
        "clusterName",
        ColumnType::Text,
        ColumnSource::Metadata("clusterName"),
    ),
    column(
        "creationTimestamp",
        ColumnType::TimestampTz,
        ColumnSource::Metadata("creationTimestamp"),
    ),
    column(
        "deletionGracePeriodSeconds",
        ColumnType::Bigint,
        ColumnSource::Metadata("deletionGracePeriodSeconds"),
    ),
    column(
        "deletionTimestamp",
        ColumnType::TimestampTz,
        ColumnSource::Metadata("deletionTimestamp"),
    ),
    column(
        "finalizers",
        ColumnType::TextList,
        ColumnSource::Metadata("finalizers"),
    ),
    column(
        "resourceVersion",
        ColumnType::Text,
        ColumnSource::Metadata("resourceVersion"),
    ),
    column(
        "selfLink",
        ColumnType::Text,
        ColumnSource::Metadata("selfLink"),
    ),
    column("uid", ColumnType::Text, ColumnSource::Metadata("uid")),
    column("metadata", ColumnType::Text, ColumnSource::RawMetadata),
    column("resource", ColumnType::Text, ColumnSource::RawResource),
];

/// The name column used for namespace pushdown.
pub const NAMESPACE_COLUMN: &str = "namespace";

impl ColumnSpec {
    /// Resolve this column against a decoded object.
    ///
    /// Never fails: absent fields produce [`ColumnValue::Null`].
    pub fn extract(&self, kind: &ResourceKind, object: &Value) -> ColumnValue {
        match self.source {
            ColumnSource::Kind => ColumnValue::Text(kind.kind.clone()),
            ColumnSource::Group => ColumnValue::Text(kind.group.clone()),
            ColumnSource::ApiVersion => ColumnValue::Text(kind.version.clone()),
            ColumnSource::Metadata(field) => {
                let value = metadata_field(object, field);
                match self.ty {
                    ColumnType::Text => types::text(value),
                    ColumnType::Bigint => types::bigint(value),
                    ColumnType::TimestampTz => types::timestamp_tz(value),
                    ColumnType::TextList => types::text_list(value),
                    ColumnType::TextMap => types::text_map(value),
                }
            }
            ColumnSource::RawMetadata => types::json_text(object.get("metadata")),
            ColumnSource::RawResource => {
                let mut copy = object.clone();
                if let Some(map) = copy.as_object_mut() {
                    map.remove("metadata");
                }
                types::json_text(Some(&copy))
            }
        }
    }
}

/// Look up a field of the object's metadata block. JSON nulls count as
/// absent.
fn metadata_field<'a>(object: &'a Value, field: &str) -> Option<&'a Value> {
    match object.get("metadata")?.get(field) {
        Some(Value::Null) | None => None,
        Some(value) => Some(value),
    }
}

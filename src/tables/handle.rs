// Copyright (c) 2026 kubetables contributors
// SPDX-License-Identifier: BSD-3-Clause

//! Table handles and splits.
//!
//! Both are closed sum types with exactly two variants. Handling sites match
//! both variants explicitly — no wildcard arms — so adding a third surface
//! fails to compile until every site is updated. Handles and splits are
//! immutable: tightening a predicate or limit produces a new value.

use serde::{Deserialize, Serialize};

use crate::tables::pushdown::Predicate;
use crate::tables::resource::TableName;

/// Handle to a resource table scan, accumulating pushed-down state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceTableHandle {
    pub table: TableName,
    /// The predicate already pushed into this handle. Unconstrained by
    /// default.
    pub predicate: Predicate,
    pub limit: Option<u32>,
}

impl ResourceTableHandle {
    pub fn new(table: TableName) -> Self {
        Self {
            table,
            predicate: Predicate::All,
            limit: None,
        }
    }

    pub fn with_predicate(&self, predicate: Predicate) -> Self {
        Self {
            predicate,
            ..self.clone()
        }
    }

    pub fn with_limit(&self, limit: u32) -> Self {
        Self {
            limit: Some(limit),
            ..self.clone()
        }
    }
}

/// Handle to one `pod_logs` invocation: the validated function arguments
/// plus any row limit pushed down later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogTableHandle {
    pub namespace: String,
    pub selector: String,
    /// Optional exact container filter.
    pub container: Option<String>,
    /// The function's `LIMIT` argument: per-container tail lines.
    pub tail: Option<u32>,
    /// Row limit pushed down by the engine.
    pub limit: Option<u32>,
}

impl LogTableHandle {
    pub fn new(
        namespace: impl Into<String>,
        selector: impl Into<String>,
        container: Option<String>,
        tail: Option<u32>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            selector: selector.into(),
            container,
            tail,
            limit: None,
        }
    }

    pub fn with_limit(&self, limit: u32) -> Self {
        Self {
            limit: Some(limit),
            ..self.clone()
        }
    }

    /// The tail-lines bound carried into each split: the smaller of the
    /// function argument and the pushed row limit.
    pub fn effective_limit(&self) -> Option<u32> {
        match (self.tail, self.limit) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        }
    }
}

/// Every table surface this connector exposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableHandle {
    Resource(ResourceTableHandle),
    Logs(LogTableHandle),
}

impl TableHandle {
    pub fn limit(&self) -> Option<u32> {
        match self {
            TableHandle::Resource(handle) => handle.limit,
            TableHandle::Logs(handle) => handle.limit,
        }
    }

    pub fn with_limit(&self, limit: u32) -> Self {
        match self {
            TableHandle::Resource(handle) => TableHandle::Resource(handle.with_limit(limit)),
            TableHandle::Logs(handle) => TableHandle::Logs(handle.with_limit(limit)),
        }
    }
}

/// One table scan; resource tables are not partitioned further.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSplit {
    pub handle: ResourceTableHandle,
}

/// One container's log fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSplit {
    pub namespace: String,
    pub pod: String,
    pub container: Option<String>,
    pub limit: Option<u32>,
}

/// Unit of parallel work handed to the engine; consumed exactly once by one
/// execution partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Split {
    Resource(ResourceSplit),
    Logs(LogSplit),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_update_immutably() {
        let handle = ResourceTableHandle::new(TableName::resources("pods"));
        let limited = handle.with_limit(10);
        assert_eq!(handle.limit, None);
        assert_eq!(limited.limit, Some(10));
        assert_eq!(handle.table, limited.table);
    }

    #[test]
    fn effective_limit_keeps_the_smaller_bound() {
        let handle = LogTableHandle::new("default", "web-0", None, Some(100));
        assert_eq!(handle.effective_limit(), Some(100));
        assert_eq!(handle.with_limit(10).effective_limit(), Some(10));
        assert_eq!(handle.with_limit(500).effective_limit(), Some(100));

        let unbounded = LogTableHandle::new("default", "web-0", None, None);
        assert_eq!(unbounded.effective_limit(), None);
        assert_eq!(unbounded.with_limit(7).effective_limit(), Some(7));
    }

    #[test]
    fn splits_roundtrip_through_serde() {
        let split = Split::Logs(LogSplit {
            namespace: "default".to_string(),
            pod: "web-0".to_string(),
            container: Some("app".to_string()),
            limit: Some(100),
        });
        let json = serde_json::to_string(&split).unwrap();
        let parsed: Split = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, split);
    }
}

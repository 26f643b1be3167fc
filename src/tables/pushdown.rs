// Copyright (c) 2026 kubetables contributors
// SPDX-License-Identifier: BSD-3-Clause

//! Query pushdown: which part of a predicate or limit the Kubernetes API
//! can apply natively.
//!
//! The only natively supported predicate is equality of the `namespace`
//! column to a single value (it selects the namespaced list endpoint).
//! Everything else — other columns, multi-value or range constraints, even
//! on namespace — stays with the engine as a residual filter. Limits are
//! forwarded to the list call but the API is not trusted to honor them
//! exactly; the engine must keep its own cap.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::tables::columns::NAMESPACE_COLUMN;
use crate::tables::handle::{ResourceTableHandle, TableHandle};

/// The set of values a column is allowed to take.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    values: BTreeSet<String>,
}

impl Domain {
    pub fn single(value: impl Into<String>) -> Self {
        Self {
            values: BTreeSet::from([value.into()]),
        }
    }

    pub fn multiple<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn single_value(&self) -> Option<&str> {
        if self.values.len() == 1 {
            self.values.iter().next().map(String::as_str)
        } else {
            None
        }
    }

    fn intersect(&self, other: &Domain) -> Domain {
        Domain {
            values: self.values.intersection(&other.values).cloned().collect(),
        }
    }
}

/// A conjunction of per-column domains.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Predicate {
    /// Unconstrained: every row matches.
    #[default]
    All,
    /// Unsatisfiable: no row matches.
    None,
    Domains(BTreeMap<String, Domain>),
}

impl Predicate {
    /// Build a predicate from per-column domains, normalizing the empty
    /// conjunction to `All` and any empty domain to `None`.
    pub fn from_domains(domains: BTreeMap<String, Domain>) -> Self {
        if domains.is_empty() {
            return Predicate::All;
        }
        if domains.values().any(Domain::is_empty) {
            return Predicate::None;
        }
        Predicate::Domains(domains)
    }

    pub fn single_value(column: impl Into<String>, value: impl Into<String>) -> Self {
        Predicate::Domains(BTreeMap::from([(column.into(), Domain::single(value))]))
    }

    pub fn intersect(&self, other: &Predicate) -> Predicate {
        match (self, other) {
            (Predicate::None, _) | (_, Predicate::None) => Predicate::None,
            (Predicate::All, p) | (p, Predicate::All) => p.clone(),
            (Predicate::Domains(left), Predicate::Domains(right)) => {
                let mut merged = left.clone();
                for (column, domain) in right {
                    merged
                        .entry(column.clone())
                        .and_modify(|existing| *existing = existing.intersect(domain))
                        .or_insert_with(|| domain.clone());
                }
                Predicate::from_domains(merged)
            }
        }
    }

    /// The single namespace value this predicate pins, if any. Multi-value
    /// namespace sets are not scopable and return `None`.
    pub fn single_namespace(&self) -> Option<&str> {
        match self {
            Predicate::All | Predicate::None => None,
            Predicate::Domains(domains) => domains.get(NAMESPACE_COLUMN)?.single_value(),
        }
    }
}

/// Outcome of predicate application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredicateApplication {
    /// The pushed-down predicate did not change; the engine keeps the whole
    /// constraint and must not loop.
    NoImprovement,
    Applied {
        handle: ResourceTableHandle,
        /// The part the engine must still check per row.
        residual: Predicate,
    },
}

/// Intersect the handle's predicate with a newly proposed constraint and
/// split the result into a pushed-down part and a residual.
pub fn apply_predicate(handle: &ResourceTableHandle, new: &Predicate) -> PredicateApplication {
    let intersected = handle.predicate.intersect(new);

    let (pushed, residual) = match intersected {
        // The supported portion of an unsatisfiable predicate is empty:
        // no rows match, nothing is left for the engine to re-check.
        Predicate::None => (Predicate::None, Predicate::All),
        Predicate::All => (Predicate::All, Predicate::All),
        Predicate::Domains(domains) => {
            let mut supported = BTreeMap::new();
            let mut unsupported = BTreeMap::new();
            for (column, domain) in domains {
                if column == NAMESPACE_COLUMN && domain.single_value().is_some() {
                    supported.insert(column, domain);
                } else {
                    unsupported.insert(column, domain);
                }
            }
            (
                Predicate::from_domains(supported),
                Predicate::from_domains(unsupported),
            )
        }
    };

    if pushed == handle.predicate {
        return PredicateApplication::NoImprovement;
    }

    debug!(table = %handle.table, pushed = ?pushed, residual = ?residual, "Predicate pushed down");
    PredicateApplication::Applied {
        handle: handle.with_predicate(pushed),
        residual,
    }
}

/// Outcome of limit application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LimitApplication {
    /// The handle already carries an equal or tighter limit.
    NoChange,
    Applied {
        handle: TableHandle,
        /// Always `false`: the native list API is not trusted to honor the
        /// cap exactly, so the engine must still enforce it.
        limit_guaranteed: bool,
    },
}

/// Install a row limit on a handle, keeping the smaller of the existing and
/// proposed bounds. Values beyond `u32::MAX` are clamped.
pub fn apply_limit(handle: &TableHandle, limit: u64) -> LimitApplication {
    let limit = u32::try_from(limit).unwrap_or(u32::MAX);

    if let Some(current) = handle.limit()
        && current <= limit
    {
        return LimitApplication::NoChange;
    }

    LimitApplication::Applied {
        handle: handle.with_limit(limit),
        limit_guaranteed: false,
    }
}

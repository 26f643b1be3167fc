// Copyright (c) 2026 kubetables contributors
// SPDX-License-Identifier: BSD-3-Clause

//! Pod log retrieval: selector resolution, split fan-out, and line parsing.
//!
//! A selector names either a pod directly or a workload
//! (`deployment/`, `statefulset/`, `replicaset/`) whose pods are found by
//! walking owner references. Each resolved (pod, container) pair becomes one
//! split, fetched independently.

use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset};
use k8s_openapi::api::apps::v1::ReplicaSet;
use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use regex::Regex;
use tracing::debug;

use crate::error::{Error, Result};
use crate::kubernetes::client::KubeApi;
use crate::tables::handle::{LogSplit, LogTableHandle, Split};

/// What a `pod_logs` selector refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Pod(String),
    Deployment(String),
    StatefulSet(String),
    ReplicaSet(String),
}

impl Selector {
    /// Parse a selector string. No `kind/` prefix means a bare pod name;
    /// otherwise the prefix (case-insensitive) picks the workload kind.
    pub fn parse(input: &str) -> Result<Self> {
        let Some((kind, name)) = input.split_once('/') else {
            return Ok(Selector::Pod(input.to_string()));
        };

        match kind.to_ascii_lowercase().as_str() {
            "pod" => Ok(Selector::Pod(name.to_string())),
            "deployment" => Ok(Selector::Deployment(name.to_string())),
            "statefulset" => Ok(Selector::StatefulSet(name.to_string())),
            "replicaset" => Ok(Selector::ReplicaSet(name.to_string())),
            other => Err(Error::Unsupported(format!(
                "unsupported selector kind '{other}'"
            ))),
        }
    }
}

/// Resolve a selector to the live set of pods it names.
pub async fn resolve_pods(api: &KubeApi, namespace: &str, selector: &Selector) -> Result<Vec<Pod>> {
    match selector {
        Selector::Pod(name) => Ok(vec![api.get_pod(namespace, name).await?]),
        Selector::Deployment(name) => {
            let deployment = api.get_deployment(namespace, name).await?;
            let Some(uid) = deployment.metadata.uid else {
                return Ok(Vec::new());
            };
            let replica_sets = api.list_replica_sets(namespace).await?;
            let owned = owned_replica_set_uids(&uid, &replica_sets);
            Ok(pods_owned_by(api.list_pods(namespace).await?, &owned))
        }
        Selector::StatefulSet(name) => {
            let stateful_set = api.get_stateful_set(namespace, name).await?;
            let Some(uid) = stateful_set.metadata.uid else {
                return Ok(Vec::new());
            };
            let owners = HashSet::from([uid]);
            Ok(pods_owned_by(api.list_pods(namespace).await?, &owners))
        }
        Selector::ReplicaSet(name) => {
            let replica_set = api.get_replica_set(namespace, name).await?;
            let Some(uid) = replica_set.metadata.uid else {
                return Ok(Vec::new());
            };
            let owners = HashSet::from([uid]);
            Ok(pods_owned_by(api.list_pods(namespace).await?, &owners))
        }
    }
}

/// Resolve a log handle to its splits: one per (pod, container) pair, minus
/// anything the container filter excludes.
pub async fn plan_log_splits(api: &KubeApi, handle: &LogTableHandle) -> Result<Vec<Split>> {
    let selector = Selector::parse(&handle.selector)?;
    let pods = resolve_pods(api, &handle.namespace, &selector).await?;
    let splits = log_splits(
        &handle.namespace,
        &pods,
        handle.container.as_deref(),
        handle.effective_limit(),
    );

    debug!(
        namespace = %handle.namespace,
        selector = %handle.selector,
        pods = pods.len(),
        splits = splits.len(),
        "Planned log splits"
    );
    Ok(splits)
}

/// One split per container in each pod's spec. A pod without a spec
/// contributes nothing.
pub fn log_splits(
    namespace: &str,
    pods: &[Pod],
    container_filter: Option<&str>,
    limit: Option<u32>,
) -> Vec<Split> {
    let mut splits = Vec::new();
    for pod in pods {
        let Some(pod_name) = pod.metadata.name.as_deref() else {
            continue;
        };
        let containers = pod
            .spec
            .as_ref()
            .map(|spec| spec.containers.as_slice())
            .unwrap_or_default();

        for container in containers {
            if let Some(filter) = container_filter
                && container.name != filter
            {
                continue;
            }
            splits.push(Split::Logs(LogSplit {
                namespace: namespace.to_string(),
                pod: pod_name.to_string(),
                container: Some(container.name.clone()),
                limit,
            }));
        }
    }
    splits
}

/// UIDs of the replica sets a deployment owns.
fn owned_replica_set_uids(deployment_uid: &str, replica_sets: &[ReplicaSet]) -> HashSet<String> {
    let owner = HashSet::from([deployment_uid.to_string()]);
    replica_sets
        .iter()
        .filter(|rs| has_owner(&rs.metadata, &owner))
        .filter_map(|rs| rs.metadata.uid.clone())
        .collect()
}

fn pods_owned_by(pods: Vec<Pod>, owners: &HashSet<String>) -> Vec<Pod> {
    pods.into_iter()
        .filter(|pod| has_owner(&pod.metadata, owners))
        .collect()
}

/// Whether any of the object's owner references points at one of `owners`.
/// Objects without owner references never match.
fn has_owner(metadata: &ObjectMeta, owners: &HashSet<String>) -> bool {
    metadata
        .owner_references
        .as_deref()
        .unwrap_or_default()
        .iter()
        .any(|reference| owners.contains(&reference.uid))
}

/// One parsed log line: the server-side timestamp and the message with ANSI
/// escapes removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub timestamp: DateTime<FixedOffset>,
    pub message: String,
}

static ANSI_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1B\[[;\d]*[ -/]*[@-~]").expect("valid ANSI pattern"));

pub fn strip_ansi(input: &str) -> String {
    ANSI_ESCAPE.replace_all(input, "").into_owned()
}

impl LogLine {
    /// Parse `<RFC 3339 timestamp><space><text>` as produced by the log
    /// endpoint with timestamps enabled. A malformed line is an error, never
    /// a partial row.
    pub fn parse(line: &str) -> Result<Self> {
        let Some((timestamp, message)) = line.split_once(' ') else {
            return Err(Error::Internal(format!(
                "malformed log line, no timestamp separator: {line:?}"
            )));
        };
        let timestamp = DateTime::parse_from_rfc3339(timestamp).map_err(|e| {
            Error::Internal(format!("malformed log line timestamp {timestamp:?}: {e}"))
        })?;
        Ok(Self {
            timestamp,
            message: strip_ansi(message),
        })
    }
}

/// Parse a whole log body into lines.
pub fn parse_log(raw: &str) -> Result<Vec<LogLine>> {
    raw.lines().map(LogLine::parse).collect()
}

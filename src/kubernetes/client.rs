// Copyright (c) 2026 kubetables contributors
// SPDX-License-Identifier: BSD-3-Clause

//! Thin wrapper over the kube client.
//!
//! Everything the connector needs from the cluster goes through here:
//! discovery, generic list calls, typed workload reads, and pod log
//! fetches. The wrapper owns no state beyond the client itself and is cheap
//! to clone; concurrent use across splits is safe.

use k8s_openapi::api::apps::v1::{Deployment, ReplicaSet, StatefulSet};
use k8s_openapi::api::core::v1::Pod;
use kube::api::{DynamicObject, ListParams, LogParams};
use kube::{Api, Client};
use serde_json::Value;
use tracing::debug;

use crate::config::ConnectorConfig;
use crate::error::{Error, Result};
use crate::kubernetes::discovery::{self, ResourceKind};

#[derive(Clone)]
pub struct KubeApi {
    client: Client,
}

impl std::fmt::Debug for KubeApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeApi").finish_non_exhaustive()
    }
}

impl KubeApi {
    pub async fn connect(config: &ConnectorConfig) -> Result<Self> {
        let client = config.client().await?;
        Ok(Self { client })
    }

    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub async fn discover_resource_kinds(&self) -> Result<Vec<ResourceKind>> {
        discovery::discover_resource_kinds(&self.client).await
    }

    /// One list call against a resource's group/version/plural endpoint,
    /// optionally namespace-scoped and capped. Returns the raw decoded
    /// objects.
    pub async fn list_objects(
        &self,
        kind: &ResourceKind,
        namespace: Option<&str>,
        limit: Option<u32>,
    ) -> Result<Vec<Value>> {
        let resource = kind.to_api_resource();
        let api: Api<DynamicObject> = match namespace {
            Some(ns) => Api::namespaced_with(self.client.clone(), ns, &resource),
            None => Api::all_with(self.client.clone(), &resource),
        };

        let mut params = ListParams::default();
        if let Some(limit) = limit {
            params = params.limit(limit);
        }

        debug!(
            plural = %kind.plural,
            api_version = %kind.api_version(),
            namespace = ?namespace,
            limit = ?limit,
            "Listing resources"
        );

        let list = api.list(&params).await.map_err(Error::from_kube)?;
        list.items
            .into_iter()
            .map(|object| {
                serde_json::to_value(object)
                    .map_err(|e| Error::Internal(format!("object decode failed: {e}")))
            })
            .collect()
    }

    pub async fn get_pod(&self, namespace: &str, name: &str) -> Result<Pod> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        api.get(name).await.map_err(Error::from_kube)
    }

    pub async fn list_pods(&self, namespace: &str) -> Result<Vec<Pod>> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let list = api
            .list(&ListParams::default())
            .await
            .map_err(Error::from_kube)?;
        Ok(list.items)
    }

    pub async fn get_deployment(&self, namespace: &str, name: &str) -> Result<Deployment> {
        let api: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
        api.get(name).await.map_err(Error::from_kube)
    }

    pub async fn get_stateful_set(&self, namespace: &str, name: &str) -> Result<StatefulSet> {
        let api: Api<StatefulSet> = Api::namespaced(self.client.clone(), namespace);
        api.get(name).await.map_err(Error::from_kube)
    }

    pub async fn get_replica_set(&self, namespace: &str, name: &str) -> Result<ReplicaSet> {
        let api: Api<ReplicaSet> = Api::namespaced(self.client.clone(), namespace);
        api.get(name).await.map_err(Error::from_kube)
    }

    pub async fn list_replica_sets(&self, namespace: &str) -> Result<Vec<ReplicaSet>> {
        let api: Api<ReplicaSet> = Api::namespaced(self.client.clone(), namespace);
        let list = api
            .list(&ListParams::default())
            .await
            .map_err(Error::from_kube)?;
        Ok(list.items)
    }

    /// Fetch one container's log: timestamps on, non-follow, tail capped at
    /// `tail_lines` when set.
    pub async fn pod_log(
        &self,
        namespace: &str,
        pod: &str,
        container: Option<&str>,
        tail_lines: Option<u32>,
    ) -> Result<String> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let params = LogParams {
            container: container.map(str::to_string),
            follow: false,
            timestamps: true,
            tail_lines: tail_lines.map(i64::from),
            ..LogParams::default()
        };

        debug!(
            namespace = %namespace,
            pod = %pod,
            container = ?container,
            tail_lines = ?tail_lines,
            "Fetching pod log"
        );

        api.logs(pod, &params).await.map_err(Error::from_kube)
    }
}

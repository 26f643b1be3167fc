// Copyright (c) 2026 kubetables contributors
// SPDX-License-Identifier: BSD-3-Clause

//! Query a live Kubernetes cluster with SQL through DataFusion.
//!
//! kubetables registers every resource kind the cluster advertises
//! (including CRDs) as a table in a `resources` schema, plus a `pod_logs`
//! table function that streams container logs as rows. Nothing is cached:
//! discovery runs once when the connector is registered, and every query
//! goes straight to the Kubernetes API.
//!
//! ```no_run
//! use datafusion::prelude::SessionContext;
//! use kubetables::{ConnectorConfig, register};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let ctx = SessionContext::new();
//! register(&ctx, &ConnectorConfig::default()).await?;
//!
//! ctx.sql("SELECT name, namespace FROM resources.pods WHERE namespace = 'kube-system'")
//!     .await?
//!     .show()
//!     .await?;
//!
//! ctx.sql("SELECT * FROM pod_logs('default', 'deployment/web')")
//!     .await?
//!     .show()
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod datafusion_integration;
pub mod error;
pub mod kubernetes;
pub mod tables;

pub use config::ConnectorConfig;
pub use datafusion_integration::catalog::{KubernetesSchemaProvider, RESOURCES_SCHEMA, register};
pub use error::{Error, Result};
pub use kubernetes::client::KubeApi;
pub use tables::resource::{ResourceCatalog, ResourceTable, TableName};

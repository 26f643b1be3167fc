// Copyright (c) 2026 kubetables contributors
// SPDX-License-Identifier: BSD-3-Clause

//! Error taxonomy for the connector.
//!
//! Every failure surfaces as one of these variants; nothing is retried and
//! nothing is swallowed. `NotFound` is kept distinct from `Api` so callers
//! can tell "no such object" apart from "cluster unreachable".

use datafusion::error::DataFusionError;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// Resource discovery failed; no catalog is usable.
    #[error("Kubernetes discovery failed: {0}")]
    Discovery(#[source] kube::Error),

    /// A qualified table name is absent from the catalog.
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// Request validation: unrecognized selector kinds, malformed table
    /// function arguments, versioned-table requests.
    #[error("{0}")]
    Unsupported(String),

    /// A referenced pod, workload, or log stream does not exist (404).
    #[error("Kubernetes object not found")]
    NotFound,

    /// Any other cluster API failure, with the native status attached.
    #[error("Kubernetes API error: {status}")]
    Api {
        status: u16,
        #[source]
        source: kube::Error,
    },

    /// Kubeconfig could not be read or the requested context resolved.
    #[error("Kubernetes configuration error: {0}")]
    Config(#[from] kube::config::KubeconfigError),

    #[error("{0}")]
    Internal(String),
}

impl Error {
    /// Classify a kube client error: a 404 status is `NotFound`, everything
    /// else keeps its status code (0 when the failure never reached the API
    /// server).
    pub fn from_kube(err: kube::Error) -> Self {
        match err {
            kube::Error::Api(ref response) if response.code == 404 => Error::NotFound,
            kube::Error::Api(ref response) => Error::Api {
                status: response.code,
                source: err,
            },
            other => Error::Api {
                status: 0,
                source: other,
            },
        }
    }
}

impl From<Error> for DataFusionError {
    fn from(err: Error) -> Self {
        DataFusionError::External(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::core::ErrorResponse;

    fn api_error(code: u16) -> kube::Error {
        kube::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message: "boom".to_string(),
            reason: "TestReason".to_string(),
            code,
        })
    }

    #[test]
    fn not_found_is_distinct_from_api_error() {
        assert!(matches!(Error::from_kube(api_error(404)), Error::NotFound));
        assert!(matches!(
            Error::from_kube(api_error(503)),
            Error::Api { status: 503, .. }
        ));
    }

    #[test]
    fn api_error_display_carries_status() {
        let err = Error::from_kube(api_error(500));
        assert_eq!(err.to_string(), "Kubernetes API error: 500");
    }

    #[test]
    fn converts_into_datafusion_error() {
        let err: DataFusionError = Error::TableNotFound("resources.pods".to_string()).into();
        assert!(err.to_string().contains("Table not found"));
    }
}

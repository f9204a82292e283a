// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Error types for control commands

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use ifuse_ioctl::{Operation, ProtocolError, RequestCode};
use thiserror::Error;

/// Result type alias for control operations
pub type Result<T> = std::result::Result<T, CtlError>;

/// Every way a single control invocation can fail
#[derive(Debug, Error)]
pub enum CtlError {
    #[error("unrecognized command: {0}")]
    InvalidCommand(String),

    #[error("cannot open mount path {}", .path.display())]
    MountUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("ioctl {code} rejected")]
    ProtocolRejected {
        code: RequestCode,
        #[source]
        source: io::Error,
    },

    #[error("{operation} failed: driver reported status {status}")]
    OperationFailed { operation: Operation, status: i32 },

    #[error("{operation} returned a malformed reply")]
    MalformedReply {
        operation: Operation,
        #[source]
        source: ProtocolError,
    },

    #[error("ioctl {code} did not complete within {}ms", .timeout.as_millis())]
    TimedOut { code: RequestCode, timeout: Duration },

    /// The timeout worker could not be started or died before replying
    #[error("device-control worker for ioctl {code} failed")]
    WorkerFailed {
        code: RequestCode,
        #[source]
        source: io::Error,
    },

    #[error("{actual}-byte payload exceeds the {size}-byte transfer size of ioctl {code}")]
    PayloadTooLarge {
        code: RequestCode,
        size: usize,
        actual: usize,
    },
}

impl CtlError {
    /// Process exit status for this failure kind
    pub fn exit_code(&self) -> u8 {
        match self {
            CtlError::InvalidCommand(_) | CtlError::PayloadTooLarge { .. } => 2,
            CtlError::MountUnavailable { .. } => 3,
            CtlError::ProtocolRejected { .. } => 4,
            CtlError::OperationFailed { .. } | CtlError::MalformedReply { .. } => 5,
            CtlError::TimedOut { .. } => 6,
            CtlError::WorkerFailed { .. } => 1,
        }
    }
}

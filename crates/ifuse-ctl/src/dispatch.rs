// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Command name → control operation → decoded outcome

use std::path::Path;

use ifuse_ioctl::{ConnectionPoolSnapshot, Operation};
use tracing::{debug, info, info_span};

use crate::error::{CtlError, Result};
use crate::transport::{MountOpener, Transport};

/// Successful result of one control command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    CacheReset,
    Connections(ConnectionPoolSnapshot),
}

impl Outcome {
    pub fn operation(&self) -> Operation {
        match self {
            Outcome::CacheReset => Operation::ResetCache,
            Outcome::Connections(_) => Operation::ShowConnections,
        }
    }
}

pub struct Dispatcher<O> {
    transport: Transport<O>,
}

impl<O: MountOpener> Dispatcher<O> {
    pub fn new(transport: Transport<O>) -> Self {
        Self { transport }
    }

    /// Run the command named `command_name` against the mount.
    ///
    /// Names are case-insensitive. An unknown name fails before the mount is
    /// opened.
    pub fn execute(&self, command_name: &str, mount_path: &Path) -> Result<Outcome> {
        let operation = command_name
            .parse::<Operation>()
            .map_err(|_| CtlError::InvalidCommand(command_name.to_string()))?;
        self.run(operation, mount_path)
    }

    pub fn run(&self, operation: Operation, mount_path: &Path) -> Result<Outcome> {
        let span = info_span!("control", %operation, mount = %mount_path.display());
        let _guard = span.enter();

        let code = operation.request_code();
        let data = self.transport.invoke(mount_path, code, None)?.check(operation)?;

        match operation {
            Operation::ResetCache => {
                info!("metadata cache reset");
                Ok(Outcome::CacheReset)
            }
            Operation::ShowConnections => {
                let snapshot = ConnectionPoolSnapshot::from_bytes(&data)
                    .map_err(|source| CtlError::MalformedReply { operation, source })?;
                debug!(?snapshot, "connection pool snapshot");
                Ok(Outcome::Connections(snapshot))
            }
        }
    }
}

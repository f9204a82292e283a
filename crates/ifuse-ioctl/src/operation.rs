// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! The driver's private control operations

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::code::{io, ior, RequestCode};
use crate::connections::ConnectionPoolSnapshot;
use crate::error::ProtocolError;

/// ioctl type byte reserved by the iRODS FUSE driver
pub const IOCTL_APP_NUMBER: u32 = 0xEE;

pub const RESET_METADATA_CACHE_NR: u32 = 0;
pub const SHOW_CONNECTIONS_NR: u32 = 1;

pub const RESET_METADATA_CACHE: RequestCode = io(IOCTL_APP_NUMBER, RESET_METADATA_CACHE_NR);
pub const SHOW_CONNECTIONS: RequestCode = ior(
    IOCTL_APP_NUMBER,
    SHOW_CONNECTIONS_NR,
    ConnectionPoolSnapshot::WIRE_SIZE as u32,
);

/// Control operations understood by the driver
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Drop every entry of the driver's metadata cache
    ResetCache,
    /// Read the connection pool occupancy counters
    ShowConnections,
}

impl Operation {
    pub const ALL: [Operation; 2] = [Operation::ResetCache, Operation::ShowConnections];

    /// Command name accepted on the command line
    pub const fn name(self) -> &'static str {
        match self {
            Operation::ResetCache => "reset_cache",
            Operation::ShowConnections => "show_connections",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Operation::ResetCache => "invalidate all caches",
            Operation::ShowConnections => "show all established connections",
        }
    }

    pub const fn request_code(self) -> RequestCode {
        match self {
            Operation::ResetCache => RESET_METADATA_CACHE,
            Operation::ShowConnections => SHOW_CONNECTIONS,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = ProtocolError;

    /// Command names are matched case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Operation::ALL
            .into_iter()
            .find(|op| op.name() == normalized)
            .ok_or_else(|| ProtocolError::UnknownOperation(s.to_string()))
    }
}

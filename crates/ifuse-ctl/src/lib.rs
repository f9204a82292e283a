// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Control plane for a mounted iRODS FUSE filesystem
//!
//! Sends the driver's private ioctls through the mount root: resetting the
//! metadata cache and reading connection pool occupancy.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod report;
pub mod transport;

#[cfg(test)]
mod testing;

pub use config::CtlConfig;
pub use dispatch::{Dispatcher, Outcome};
pub use error::{CtlError, Result};
pub use report::Report;
pub use transport::{
    resolve_mount_path, DirectoryOpener, MountHandle, MountOpener, Reply, Transport,
};

// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! iRODS FUSE control protocol
//!
//! The driver exposes two private ioctls on the mount root: one that drops
//! its metadata cache and one that reports connection pool occupancy. This
//! crate builds their request codes and decodes the reply payload; issuing
//! the calls is left to `ifuse-ctl`.

pub mod code;
pub mod connections;
pub mod error;
pub mod operation;

pub use code::{io, ior, iow, iowr, Direction, RequestCode};
pub use connections::ConnectionPoolSnapshot;
pub use error::ProtocolError;
pub use operation::{Operation, IOCTL_APP_NUMBER, RESET_METADATA_CACHE, SHOW_CONNECTIONS};

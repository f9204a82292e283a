// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Human-readable and JSON rendering of command outcomes

use std::io::{self, Write};
use std::path::PathBuf;

use ifuse_ioctl::{ConnectionPoolSnapshot, Operation};
use serde::Serialize;

use crate::dispatch::Outcome;

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub command: Operation,
    pub mount: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connections: Option<ConnectionPoolSnapshot>,
}

impl Report {
    pub fn new(outcome: Outcome, mount: PathBuf) -> Self {
        let connections = match outcome {
            Outcome::CacheReset => None,
            Outcome::Connections(snapshot) => Some(snapshot),
        };
        Self {
            command: outcome.operation(),
            mount,
            connections,
        }
    }

    pub fn write_plaintext(&self, out: &mut impl Write) -> io::Result<()> {
        let title = self.command.name().replace('_', " ");
        writeln!(out, "{}: {}", title, self.mount.display())?;

        if let Some(pool) = &self.connections {
            writeln!(out, "In-Use ShortOp Conn: {}", pool.in_use_short)?;
            writeln!(out, "In-Use Conn: {}", pool.in_use_long)?;
            writeln!(out, "In-Use OneTimeUse Conn: {}", pool.in_use_one_time)?;
            writeln!(out, "Free ShortOp Conn: {}", pool.free_short)?;
            writeln!(out, "Free Conn: {}", pool.free_long)?;
        }
        writeln!(out, "Done!")
    }

    pub fn write_json(&self, out: &mut impl Write) -> io::Result<()> {
        serde_json::to_writer(&mut *out, self)?;
        writeln!(out)
    }
}

// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use thiserror::Error;

/// Errors raised while building request codes or decoding driver replies
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("ioctl {field} field value {value:#x} does not fit in {bits} bits")]
    FieldOverflow {
        field: &'static str,
        value: u32,
        bits: u32,
    },

    #[error("unrecognized command: {0}")]
    UnknownOperation(String),

    #[error("reply is {actual} bytes, expected {expected}")]
    ReplySize { expected: usize, actual: usize },
}

// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use std::mem::size_of;

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

const FIELD_COUNT: usize = 5;

/// Connection pool occupancy as reported by `show_connections`.
///
/// A point-in-time read of the driver's pool. Nothing keeps the counters
/// consistent with the pool or with each other once the reply is returned.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionPoolSnapshot {
    pub in_use_short: u32,
    pub in_use_long: u32,
    pub in_use_one_time: u32,
    pub free_short: u32,
    pub free_long: u32,
}

impl ConnectionPoolSnapshot {
    /// Five host-endian `u32`s
    pub const WIRE_SIZE: usize = FIELD_COUNT * size_of::<u32>();

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProtocolError> {
        if bytes.len() != Self::WIRE_SIZE {
            return Err(ProtocolError::ReplySize {
                expected: Self::WIRE_SIZE,
                actual: bytes.len(),
            });
        }

        let mut fields = [0u32; FIELD_COUNT];
        for (field, chunk) in fields.iter_mut().zip(bytes.chunks_exact(size_of::<u32>())) {
            let mut word = [0u8; 4];
            word.copy_from_slice(chunk);
            *field = u32::from_ne_bytes(word);
        }

        let [in_use_short, in_use_long, in_use_one_time, free_short, free_long] = fields;
        Ok(Self {
            in_use_short,
            in_use_long,
            in_use_one_time,
            free_short,
            free_long,
        })
    }

    /// Encode in the driver's layout. Used by simulated drivers.
    pub fn to_bytes(&self) -> [u8; ConnectionPoolSnapshot::WIRE_SIZE] {
        let mut out = [0u8; ConnectionPoolSnapshot::WIRE_SIZE];
        let fields = [
            self.in_use_short,
            self.in_use_long,
            self.in_use_one_time,
            self.free_short,
            self.free_long,
        ];
        for (chunk, field) in out.chunks_exact_mut(size_of::<u32>()).zip(fields) {
            chunk.copy_from_slice(&field.to_ne_bytes());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(values: [u32; FIELD_COUNT]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_ne_bytes()).collect()
    }

    #[test]
    fn decodes_fields_in_driver_order() {
        let snapshot = ConnectionPoolSnapshot::from_bytes(&words([3, 7, 1, 0, 5])).unwrap();
        assert_eq!(
            snapshot,
            ConnectionPoolSnapshot {
                in_use_short: 3,
                in_use_long: 7,
                in_use_one_time: 1,
                free_short: 0,
                free_long: 5,
            }
        );
    }

    #[test]
    fn wire_size_matches_request_size() {
        assert_eq!(ConnectionPoolSnapshot::WIRE_SIZE, 20);
        assert_eq!(crate::SHOW_CONNECTIONS.size() as usize, ConnectionPoolSnapshot::WIRE_SIZE);
    }

    #[test]
    fn rejects_truncated_and_oversized_replies() {
        let err = ConnectionPoolSnapshot::from_bytes(&[0u8; 16]).unwrap_err();
        assert_eq!(err, ProtocolError::ReplySize { expected: 20, actual: 16 });
        assert!(ConnectionPoolSnapshot::from_bytes(&[0u8; 24]).is_err());
        assert!(ConnectionPoolSnapshot::from_bytes(&[]).is_err());
    }

    #[test]
    fn large_counters_are_unsigned() {
        let snapshot = ConnectionPoolSnapshot::from_bytes(&words([u32::MAX, 0, 0, 0, 1])).unwrap();
        assert_eq!(snapshot.in_use_short, u32::MAX);
        assert_eq!(ConnectionPoolSnapshot::from_bytes(&snapshot.to_bytes()).unwrap(), snapshot);
    }

    #[test]
    fn serializes_with_field_names() {
        let snapshot = ConnectionPoolSnapshot {
            in_use_short: 1,
            ..Default::default()
        };
        let json = serde_json::to_value(snapshot).unwrap();
        assert_eq!(json["in_use_short"], 1);
        assert_eq!(json["free_long"], 0);
    }
}

// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Linux ioctl request-code packing
//!
//! A request code is a 32-bit value made of four fields, from the least
//! significant bit upwards:
//!
//! | field     | bits |
//! |-----------|------|
//! | number    | 8    |
//! | type      | 8    |
//! | size      | 14   |
//! | direction | 2    |
//!
//! This is the generic layout used by x86, ARM and RISC-V Linux kernels and
//! the one FUSE forwards to userspace drivers unchanged.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

pub const NR_BITS: u32 = 8;
pub const TYPE_BITS: u32 = 8;
pub const SIZE_BITS: u32 = 14;
pub const DIR_BITS: u32 = 2;

pub const NR_MASK: u32 = (1 << NR_BITS) - 1;
pub const TYPE_MASK: u32 = (1 << TYPE_BITS) - 1;
pub const SIZE_MASK: u32 = (1 << SIZE_BITS) - 1;
pub const DIR_MASK: u32 = (1 << DIR_BITS) - 1;

pub const NR_SHIFT: u32 = 0;
pub const TYPE_SHIFT: u32 = NR_SHIFT + NR_BITS;
pub const SIZE_SHIFT: u32 = TYPE_SHIFT + TYPE_BITS;
pub const DIR_SHIFT: u32 = SIZE_SHIFT + SIZE_BITS;

/// Data transfer direction, seen from userspace
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u32)]
pub enum Direction {
    /// No payload
    None = 0,
    /// Userspace writes a payload to the driver
    Write = 1,
    /// The driver fills a payload for userspace
    Read = 2,
    /// Payload goes in and comes back out
    ReadWrite = 3,
}

impl Direction {
    pub const fn bits(self) -> u32 {
        self as u32
    }

    /// Decode the two direction bits. Every bit pattern is a valid direction.
    pub const fn from_bits(bits: u32) -> Self {
        match bits & DIR_MASK {
            0 => Direction::None,
            1 => Direction::Write,
            2 => Direction::Read,
            _ => Direction::ReadWrite,
        }
    }

    /// Whether a buffer has to accompany the call
    pub const fn has_payload(self) -> bool {
        !matches!(self, Direction::None)
    }

    /// Whether caller-supplied bytes are copied into the buffer before the call
    pub const fn sends_input(self) -> bool {
        matches!(self, Direction::Write | Direction::ReadWrite)
    }

    /// Whether the driver hands bytes back in the buffer
    pub const fn returns_output(self) -> bool {
        matches!(self, Direction::Read | Direction::ReadWrite)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::None => write!(f, "none"),
            Direction::Write => write!(f, "write"),
            Direction::Read => write!(f, "read"),
            Direction::ReadWrite => write!(f, "read-write"),
        }
    }
}

/// A packed ioctl request code
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestCode(u32);

impl RequestCode {
    /// Pack the four fields into a request code.
    ///
    /// Out-of-range fields are a programming error: evaluating this in a
    /// `const` item fails the build, at runtime it panics. Use
    /// [`RequestCode::try_pack`] for values that are not compile-time constants.
    pub const fn pack(direction: Direction, ty: u32, nr: u32, size: u32) -> Self {
        assert!(ty <= TYPE_MASK, "ioctl type does not fit in 8 bits");
        assert!(nr <= NR_MASK, "ioctl number does not fit in 8 bits");
        assert!(size <= SIZE_MASK, "ioctl size does not fit in 14 bits");
        Self(
            (direction.bits() << DIR_SHIFT)
                | (ty << TYPE_SHIFT)
                | (nr << NR_SHIFT)
                | (size << SIZE_SHIFT),
        )
    }

    pub fn try_pack(
        direction: Direction,
        ty: u32,
        nr: u32,
        size: u32,
    ) -> Result<Self, ProtocolError> {
        check_field("type", ty, TYPE_BITS)?;
        check_field("number", nr, NR_BITS)?;
        check_field("size", size, SIZE_BITS)?;
        Ok(Self::pack(direction, ty, nr, size))
    }

    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn direction(self) -> Direction {
        Direction::from_bits(self.0 >> DIR_SHIFT)
    }

    pub const fn ty(self) -> u32 {
        (self.0 >> TYPE_SHIFT) & TYPE_MASK
    }

    pub const fn number(self) -> u32 {
        (self.0 >> NR_SHIFT) & NR_MASK
    }

    pub const fn size(self) -> u32 {
        (self.0 >> SIZE_SHIFT) & SIZE_MASK
    }
}

impl From<RequestCode> for u32 {
    fn from(code: RequestCode) -> Self {
        code.raw()
    }
}

impl fmt::Display for RequestCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

fn check_field(field: &'static str, value: u32, bits: u32) -> Result<(), ProtocolError> {
    if value >> bits != 0 {
        return Err(ProtocolError::FieldOverflow { field, value, bits });
    }
    Ok(())
}

/// `_IO`: request without a payload
pub const fn io(ty: u32, nr: u32) -> RequestCode {
    RequestCode::pack(Direction::None, ty, nr, 0)
}

/// `_IOR`: the driver fills `size` bytes
pub const fn ior(ty: u32, nr: u32, size: u32) -> RequestCode {
    RequestCode::pack(Direction::Read, ty, nr, size)
}

/// `_IOW`: userspace sends `size` bytes
pub const fn iow(ty: u32, nr: u32, size: u32) -> RequestCode {
    RequestCode::pack(Direction::Write, ty, nr, size)
}

/// `_IOWR`: `size` bytes in both directions
pub const fn iowr(ty: u32, nr: u32, size: u32) -> RequestCode {
    RequestCode::pack(Direction::ReadWrite, ty, nr, size)
}

// Copyright 2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! This module defines the consistency enum and its write legality rule.

use crate::error::BatchError;
use anyhow::anyhow;
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use std::convert::TryFrom;

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
#[repr(u16)]
/// The consistency level enum.
pub enum Consistency {
    /// The any consistency level.
    Any = 0x0,
    /// The one consistency level.
    One = 0x1,
    /// The two consistency level.
    Two = 0x2,
    /// The three consistency level.
    Three = 0x3,
    /// The quorum consistency level.
    Quorum = 0x4,
    /// The all consistency level.
    All = 0x5,
    /// The local quorum consistency level.
    LocalQuorum = 0x6,
    /// The each quorum consistency level.
    EachQuorum = 0x7,
    /// The serial consistency level.
    Serial = 0x8,
    /// The local serial consistency level.
    LocalSerial = 0x9,
    /// The local one consistency level.
    LocalOne = 0xA,
}

impl Default for Consistency {
    fn default() -> Self {
        Consistency::One
    }
}

impl TryFrom<u16> for Consistency {
    type Error = anyhow::Error;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::from_u16(value).ok_or_else(|| anyhow!("Unknown consistency level: {:#x}", value))
    }
}

impl Consistency {
    /// Check that this level can drive a plain write against the given keyspace.
    /// Serial levels belong to the conditional (Paxos) path only.
    pub fn validate_for_write(self, keyspace: &str) -> Result<(), BatchError> {
        match self {
            Consistency::Serial | Consistency::LocalSerial => Err(BatchError::SerialWriteConsistency {
                consistency: self,
                keyspace: keyspace.to_string(),
            }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consistency_from_wire_value() {
        assert_eq!(Consistency::try_from(0x4).unwrap(), Consistency::Quorum);
        assert_eq!(Consistency::try_from(0xA).unwrap(), Consistency::LocalOne);
        assert!(Consistency::try_from(0xB).is_err());
    }

    #[test]
    fn serial_levels_rejected_for_writes() {
        assert!(Consistency::Serial.validate_for_write("my_keyspace").is_err());
        assert!(Consistency::LocalSerial.validate_for_write("my_keyspace").is_err());
        assert!(Consistency::Quorum.validate_for_write("my_keyspace").is_ok());
        assert!(Consistency::Any.validate_for_write("my_keyspace").is_ok());
    }
}

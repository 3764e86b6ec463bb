// Copyright 2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! This module defines the batch coordination errors.

use crate::consistency::Consistency;
use thiserror::Error;

#[derive(Error, Debug)]
/// The error reported while validating, authorizing or assembling a write batch.
/// Every rule is checked eagerly; the first violation aborts the whole batch.
pub enum BatchError {
    /// A TTL was set on the batch itself.
    #[error("Global TTL on the BATCH statement is not supported")]
    BatchTimeToLive,
    /// An individual statement carried an explicit consistency level.
    #[error("Consistency level must be set on the BATCH, not individual statements")]
    StatementConsistency,
    /// Both the batch and an individual statement carried an explicit timestamp.
    #[error("Timestamp must be set either on BATCH or individual statements")]
    TimestampContention,
    /// An individual statement carried a negative TTL.
    #[error("A TTL must be greater or equal to 0, got {0}")]
    NegativeTimeToLive(i32),
    /// The statements' default consistency levels disagree and no batch level was set.
    #[error(
        "The tables involved in the BATCH have different default write consistency \
        (expected {expected:?}, found {found:?}), the BATCH consistency level must be set explicitly"
    )]
    ConsistencyMismatch {
        /// The first default observed while walking the batch.
        expected: Consistency,
        /// The later default that disagreed with it.
        found: Consistency,
    },
    /// The explicit batch consistency level is illegal for a write.
    #[error("{consistency:?} is not supported for writes against keyspace {keyspace}")]
    SerialWriteConsistency {
        /// The rejected level.
        consistency: Consistency,
        /// The keyspace the level was validated against.
        keyspace: String,
    },
    /// The executing client lacks UPDATE permission on a touched table.
    #[error("Missing UPDATE permission on {keyspace}.{table}")]
    Unauthorized {
        /// The keyspace of the denied table.
        keyspace: String,
        /// The denied table.
        table: String,
    },
    /// An execution or availability error reported by a collaborator, propagated unchanged.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// Copyright 2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

#![warn(missing_docs)]
//! Write-batch coordination for a CQL query-execution layer.
//!
//! Given a list of already-bound write statements and the batch-level
//! attributes, the [`BatchStatement`] coordinator enforces the batch-wide
//! invariants (single consistency level, single timestamp source, no
//! batch-level TTL), deduplicates authorization checks and coalesces
//! same-partition writes into at most one row-kind and one counter-kind
//! mutation per partition, the unit the dispatch path applies atomically.
//!
//! Statement parsing/binding and the storage/replication dispatch path are
//! external; this crate consumes them through the [`WriteStatement`] and
//! [`ClientContext`] contracts.

/// Batch-level attributes with explicit-set semantics.
pub mod attributes;
/// The batch coordinator and its prepared form.
pub mod batch;
/// Consistency levels and their write legality rule.
pub mod consistency;
/// The batch coordination errors.
pub mod error;
/// The low-level mutation model and the grouping accumulator.
pub mod mutation;
/// The collaborator contracts consumed by the coordinator.
pub mod statement;

pub use attributes::Attributes;
pub use batch::{BatchKind, BatchStatement, PreparedBatch};
pub use consistency::Consistency;
pub use error::BatchError;
pub use mutation::{Cell, Mutation, MutationAccumulator, MutationKey, MutationKind, MutationOps, TableRef};
pub use statement::{ClientContext, ColumnSpec, WriteStatement};

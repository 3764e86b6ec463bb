// Copyright 2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! This module implements the batch coordinator: it validates a list of
//! bound write statements against the batch-wide invariants, deduplicates
//! authorization checks and assembles the final atomically-groupable
//! mutation list.

use crate::{
    attributes::Attributes,
    consistency::Consistency,
    error::BatchError,
    mutation::{Mutation, MutationAccumulator},
    statement::{ClientContext, ColumnSpec, WriteStatement},
};
use log::debug;
use std::{collections::BTreeSet, fmt};

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// The batch kind as numbered on the wire.
pub enum BatchKind {
    /// The batch is written through the batch log.
    Logged = 0,
    /// The batch skips the batch log.
    Unlogged = 1,
    /// The batch carries counter mutations.
    Counter = 2,
}

impl Default for BatchKind {
    fn default() -> Self {
        BatchKind::Logged
    }
}

/// A `BATCH` write statement: an ordered list of sub-statements plus the
/// batch-level [`Attributes`]. Constructed once per prepared batch and
/// executed possibly many times with different bound values.
pub struct BatchStatement {
    statements: Vec<Box<dyn WriteStatement>>,
    attrs: Attributes,
    kind: BatchKind,
}

impl BatchStatement {
    /// Create a batch from its sub-statements and attributes.
    pub fn new(statements: Vec<Box<dyn WriteStatement>>, attrs: Attributes) -> Self {
        Self {
            statements,
            attrs,
            kind: BatchKind::default(),
        }
    }

    /// Create an empty batch with room for the given number of statements.
    pub fn with_capacity(attrs: Attributes, capacity: usize) -> Self {
        Self::new(Vec::with_capacity(capacity), attrs)
    }

    /// Append a sub-statement.
    pub fn statement(mut self, statement: Box<dyn WriteStatement>) -> Self {
        self.statements.push(statement);
        self
    }

    /// Set the batch kind.
    pub fn batch_kind(mut self, kind: BatchKind) -> Self {
        self.kind = kind;
        self
    }

    /// Get the sub-statements in batch order.
    pub fn statements(&self) -> &[Box<dyn WriteStatement>] {
        &self.statements
    }

    /// Get the batch-level attributes.
    pub fn attributes(&self) -> &Attributes {
        &self.attrs
    }

    /// Get the batch kind.
    pub fn kind(&self) -> BatchKind {
        self.kind
    }

    /// Ensure the executing client holds UPDATE permission on every distinct
    /// table touched by the batch. Each distinct (keyspace, table) pair is
    /// checked exactly once, however many statements share it. Run once per
    /// execution, before any mutation is produced.
    pub fn check_access(&self, ctx: &dyn ClientContext) -> Result<(), BatchError> {
        let mut tables = BTreeSet::new();
        for statement in self.statements.iter() {
            tables.insert((statement.keyspace().clone(), statement.table().clone()));
        }
        for (keyspace, table) in tables {
            ctx.check_write_permission(&keyspace, &table)?;
        }
        Ok(())
    }

    /// Validate the batch-wide invariants. Run once before execution; the
    /// first violated rule aborts the whole batch.
    pub fn validate(&self) -> Result<(), BatchError> {
        if let Some(ttl) = self.attrs.get_time_to_live() {
            if ttl != 0 {
                return Err(BatchError::BatchTimeToLive);
            }
        }

        let mut expected: Option<Consistency> = None;
        for statement in self.statements.iter() {
            if statement.consistency().is_some() {
                return Err(BatchError::StatementConsistency);
            }

            if self.attrs.get_timestamp().is_some() && statement.timestamp().is_some() {
                return Err(BatchError::TimestampContention);
            }

            let ttl = statement.time_to_live();
            if ttl < 0 {
                return Err(BatchError::NegativeTimeToLive(ttl));
            }

            match self.attrs.get_consistency() {
                Some(consistency) => consistency.validate_for_write(statement.keyspace())?,
                None => {
                    // Without an explicit batch level every table must agree
                    // on one default, measured against the first statement's.
                    let default = statement.default_consistency();
                    match expected {
                        Some(consistency) if consistency != default => {
                            return Err(BatchError::ConsistencyMismatch {
                                expected: consistency,
                                found: default,
                            });
                        }
                        _ => expected = Some(default),
                    }
                }
            }
        }
        Ok(())
    }

    /// Get the effective consistency level used to route the execution:
    /// the explicit batch level if set, otherwise the first statement's
    /// default. `validate` has already pinned all defaults to one level, so
    /// no re-verification happens here.
    pub fn consistency(&self) -> Consistency {
        self.attrs.get_consistency().unwrap_or_else(|| {
            self.statements
                .first()
                .map(|statement| statement.default_consistency())
                .unwrap_or_default()
        })
    }

    /// Assemble the flattened, merged mutation list for one execution. Each
    /// statement produces its mutations with the batch timestamp threaded in
    /// as a parameter, and the accumulator collapses same-partition writes
    /// into at most one row-kind and one counter-kind mutation per slot.
    pub fn mutations(
        &self,
        ctx: &dyn ClientContext,
        values: &[Vec<u8>],
        local: bool,
    ) -> Result<Vec<Mutation>, BatchError> {
        let mut accumulator = MutationAccumulator::new();
        for statement in self.statements.iter() {
            for mutation in statement.mutations(ctx, values, self.attrs.get_timestamp(), local)? {
                accumulator.push(mutation)?;
            }
        }
        let batch = accumulator.into_mutations();
        debug!(
            "assembled {} mutation(s) from {} statement(s)",
            batch.len(),
            self.statements.len()
        );
        Ok(batch)
    }

    /// Get the total number of bound placeholder markers across all
    /// sub-statements.
    pub fn bound_marker_count(&self) -> usize {
        self.statements
            .iter()
            .map(|statement| statement.bound_marker_count())
            .sum()
    }

    /// Prepare the batch: invoke every sub-statement's placeholder binding
    /// over one shared slot set and return the prepared form. Sub-statements
    /// bind in place; none of them produces a replacement object.
    pub fn prepare(mut self) -> Result<PreparedBatch, BatchError> {
        let mut slots: Vec<Option<ColumnSpec>> = vec![None; self.bound_marker_count()];
        for statement in self.statements.iter_mut() {
            statement.bind(&mut slots)?;
        }
        Ok(PreparedBatch {
            batch: self,
            bound_columns: slots,
        })
    }
}

impl fmt::Debug for BatchStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BatchStatement(statements={}, kind={:?}, consistency={:?})",
            self.statements.len(),
            self.kind,
            self.consistency()
        )
    }
}

/// A prepared batch: the coordinator together with the column specification
/// of every bound placeholder across all sub-statements.
pub struct PreparedBatch {
    batch: BatchStatement,
    bound_columns: Vec<Option<ColumnSpec>>,
}

impl PreparedBatch {
    /// Get the prepared coordinator.
    pub fn statement(&self) -> &BatchStatement {
        &self.batch
    }

    /// Get the bound column specifications, one slot per placeholder.
    pub fn bound_columns(&self) -> &[Option<ColumnSpec>] {
        &self.bound_columns
    }

    /// Compute the 16 byte id under which re-prepared batches are recognized
    /// downstream, derived from the statements' table identities.
    pub fn id(&self) -> [u8; 16] {
        let mut identity = String::new();
        for statement in self.batch.statements() {
            identity.push_str(statement.keyspace());
            identity.push('.');
            identity.push_str(statement.table());
            identity.push(';');
        }
        md5::compute(identity.as_bytes()).into()
    }
}

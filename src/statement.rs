// Copyright 2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! This module defines the contracts the batch coordinator consumes from
//! its collaborators: the bound write statement and the client context.

use crate::{consistency::Consistency, error::BatchError, mutation::Mutation};
use std::borrow::Cow;

/// The column/type specification of one bound placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    /// The keyspace of the bound column.
    pub keyspace: Cow<'static, str>,
    /// The table of the bound column.
    pub table: Cow<'static, str>,
    /// The column name.
    pub name: Cow<'static, str>,
}

/// The executing client's context, as far as this core needs it: the
/// authorization decision. The implementation lives in the session layer.
pub trait ClientContext: Send + Sync {
    /// Ensure the client holds UPDATE permission on the given table.
    fn check_write_permission(&self, keyspace: &str, table: &str) -> Result<(), BatchError>;
}

/// A bound, single-table write statement as handed over by the parser and
/// binder. Explicitly set per-statement options are reported as `Some`;
/// `None` means the statement fell back to its default.
///
/// The effective timestamp is passed into [`mutations`](Self::mutations) as
/// a parameter rather than stored on the statement, so a prepared statement
/// never carries per-execution state and can be shared across threads.
pub trait WriteStatement: Send + Sync {
    /// Get the keyspace this statement writes to.
    fn keyspace(&self) -> &Cow<'static, str>;

    /// Get the table this statement writes to.
    fn table(&self) -> &Cow<'static, str>;

    /// Get the consistency level explicitly set on this statement, if any.
    fn consistency(&self) -> Option<Consistency>;

    /// Get the level this statement defaults to when none is set.
    fn default_consistency(&self) -> Consistency;

    /// Get the timestamp explicitly set on this statement, if any.
    fn timestamp(&self) -> Option<i64>;

    /// Get the per-statement TTL in seconds. Zero means none.
    fn time_to_live(&self) -> i32;

    /// Get the number of bound placeholder markers this statement contributes.
    fn bound_marker_count(&self) -> usize;

    /// Produce the low-level mutations of this statement for one execution.
    /// `timestamp` is the batch-effective timestamp and overrides the
    /// statement's own when given.
    fn mutations(
        &self,
        ctx: &dyn ClientContext,
        values: &[Vec<u8>],
        timestamp: Option<i64>,
        local: bool,
    ) -> Result<Vec<Mutation>, BatchError>;

    /// Bind this statement's placeholders into the shared slot set. The
    /// statement binds in place and never produces a replacement object.
    fn bind(&mut self, slots: &mut [Option<ColumnSpec>]) -> Result<(), BatchError>;
}

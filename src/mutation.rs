// Copyright 2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! This module defines the low-level mutation model and the accumulator
//! which groups same-partition mutations so they apply atomically.

use anyhow::bail;
use log::debug;
use std::{
    borrow::Cow,
    collections::{BTreeMap, HashMap},
};

/// Identity of a table, qualified by its keyspace.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TableRef {
    /// The keyspace name.
    pub keyspace: Cow<'static, str>,
    /// The table name.
    pub table: Cow<'static, str>,
}

impl TableRef {
    /// Create a table reference.
    pub fn new(keyspace: impl Into<Cow<'static, str>>, table: impl Into<Cow<'static, str>>) -> Self {
        Self {
            keyspace: keyspace.into(),
            table: table.into(),
        }
    }
}

/// Identifies one physical partition-mutation slot within a batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MutationKey {
    /// The target table.
    pub table: TableRef,
    /// The serialized partition key.
    pub partition_key: Vec<u8>,
}

/// A regular cell write. A `None` value is a tombstone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    /// The serialized cell value, or `None` to delete the cell.
    pub value: Option<Vec<u8>>,
    /// The cell TTL in seconds. Zero means no TTL.
    pub ttl: i32,
}

/// The two mutation kinds. The kinds never merge with each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    /// Ordinary column writes and deletes.
    Row,
    /// Commutative counter increments and decrements.
    Counter,
}

/// The kind-bearing operations of a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOps {
    /// Per-column cell writes of a row-kind mutation.
    Row(BTreeMap<Cow<'static, str>, Cell>),
    /// Per-column deltas of a counter-kind mutation.
    Counter(BTreeMap<Cow<'static, str>, i64>),
}

/// A low-level write against one partition of one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    table: TableRef,
    partition_key: Vec<u8>,
    ops: MutationOps,
}

impl Mutation {
    /// Create an empty row-kind mutation for the given partition.
    pub fn row(table: TableRef, partition_key: Vec<u8>) -> Self {
        Self {
            table,
            partition_key,
            ops: MutationOps::Row(BTreeMap::new()),
        }
    }

    /// Create an empty counter-kind mutation for the given partition.
    pub fn counter(table: TableRef, partition_key: Vec<u8>) -> Self {
        Self {
            table,
            partition_key,
            ops: MutationOps::Counter(BTreeMap::new()),
        }
    }

    /// Set a cell value. No-op on a counter-kind mutation.
    pub fn set(mut self, column: impl Into<Cow<'static, str>>, value: Vec<u8>, ttl: i32) -> Self {
        if let MutationOps::Row(ref mut cells) = self.ops {
            cells.insert(column.into(), Cell { value: Some(value), ttl });
        }
        self
    }

    /// Write a cell tombstone. No-op on a counter-kind mutation.
    pub fn delete(mut self, column: impl Into<Cow<'static, str>>) -> Self {
        if let MutationOps::Row(ref mut cells) = self.ops {
            cells.insert(column.into(), Cell { value: None, ttl: 0 });
        }
        self
    }

    /// Add a counter delta. No-op on a row-kind mutation.
    pub fn add(mut self, column: impl Into<Cow<'static, str>>, delta: i64) -> Self {
        if let MutationOps::Counter(ref mut deltas) = self.ops {
            *deltas.entry(column.into()).or_insert(0) += delta;
        }
        self
    }

    /// Get the target table.
    pub fn table(&self) -> &TableRef {
        &self.table
    }

    /// Get the serialized partition key.
    pub fn partition_key(&self) -> &[u8] {
        &self.partition_key
    }

    /// Get the mutation kind.
    pub fn kind(&self) -> MutationKind {
        match self.ops {
            MutationOps::Row(_) => MutationKind::Row,
            MutationOps::Counter(_) => MutationKind::Counter,
        }
    }

    /// Get the operations carried by this mutation.
    pub fn ops(&self) -> &MutationOps {
        &self.ops
    }

    /// Compute the partition-mutation slot this mutation routes into.
    pub fn group_key(&self) -> MutationKey {
        MutationKey {
            table: self.table.clone(),
            partition_key: self.partition_key.clone(),
        }
    }

    /// Merge another mutation into this one. Defined only between mutations
    /// of the same kind targeting the same partition slot. Row merges union
    /// cells (the incoming cell wins per column), counter merges sum deltas;
    /// both are associative and independent of partition iteration order.
    pub fn merge(&mut self, other: Mutation) -> anyhow::Result<()> {
        if self.group_key() != other.group_key() {
            bail!(
                "Cannot merge mutations of different partitions: {:?} vs {:?}",
                self.group_key(),
                other.group_key()
            );
        }
        match (&mut self.ops, other.ops) {
            (MutationOps::Row(cells), MutationOps::Row(other_cells)) => {
                cells.extend(other_cells);
            }
            (MutationOps::Counter(deltas), MutationOps::Counter(other_deltas)) => {
                for (column, delta) in other_deltas {
                    *deltas.entry(column).or_insert(0) += delta;
                }
            }
            _ => bail!("Cannot merge a row mutation with a counter mutation"),
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct PartitionSlot {
    row: Option<Mutation>,
    counter: Option<Mutation>,
}

/// Groups the mutations of one batch execution by partition slot so the
/// downstream dispatch path can apply each slot atomically. Holds at most
/// one row-kind and one counter-kind mutation per slot; same-kind
/// contributions are merged, never replaced. Always allocated fresh per
/// assembly call and discarded after flattening.
#[derive(Debug, Default)]
pub struct MutationAccumulator {
    slots: HashMap<MutationKey, PartitionSlot>,
}

impl MutationAccumulator {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Route a mutation into its partition slot, merging with any mutation
    /// of the same kind already held there.
    pub fn push(&mut self, mutation: Mutation) -> anyhow::Result<()> {
        let slot = self.slots.entry(mutation.group_key()).or_default();
        let held = match mutation.kind() {
            MutationKind::Row => &mut slot.row,
            MutationKind::Counter => &mut slot.counter,
        };
        match held {
            Some(existing) => {
                debug!(
                    "coalescing {:?} mutation for {}.{}",
                    mutation.kind(),
                    mutation.table().keyspace,
                    mutation.table().table
                );
                existing.merge(mutation)?;
            }
            None => *held = Some(mutation),
        }
        Ok(())
    }

    /// Flatten into the final mutation list: for each slot, the row-kind
    /// mutation if present, then the counter-kind mutation if present.
    pub fn into_mutations(self) -> Vec<Mutation> {
        let mut batch = Vec::with_capacity(self.slots.len());
        for (_, slot) in self.slots {
            if let Some(rm) = slot.row {
                batch.push(rm);
            }
            if let Some(cm) = slot.counter {
                batch.push(cm);
            }
        }
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> TableRef {
        TableRef::new("my_keyspace", "table")
    }

    #[test]
    fn row_merge_unions_cells() {
        let mut m1 = Mutation::row(table(), vec![1]).set("col1", vec![0xA], 0);
        let m2 = Mutation::row(table(), vec![1]).set("col2", vec![0xB], 0).delete("col3");
        m1.merge(m2).unwrap();
        match m1.ops() {
            MutationOps::Row(cells) => {
                assert_eq!(cells.len(), 3);
                assert_eq!(cells["col1"].value, Some(vec![0xA]));
                assert_eq!(cells["col2"].value, Some(vec![0xB]));
                assert_eq!(cells["col3"].value, None);
            }
            _ => panic!("expected a row mutation"),
        }
    }

    #[test]
    fn counter_merge_sums_deltas() {
        let mut m1 = Mutation::counter(table(), vec![1]).add("hits", 2);
        let m2 = Mutation::counter(table(), vec![1]).add("hits", 3).add("misses", -1);
        m1.merge(m2).unwrap();
        match m1.ops() {
            MutationOps::Counter(deltas) => {
                assert_eq!(deltas["hits"], 5);
                assert_eq!(deltas["misses"], -1);
            }
            _ => panic!("expected a counter mutation"),
        }
    }

    #[test]
    fn cross_kind_merge_is_rejected() {
        let mut rm = Mutation::row(table(), vec![1]).set("col1", vec![0xA], 0);
        let cm = Mutation::counter(table(), vec![1]).add("hits", 1);
        assert!(rm.merge(cm).is_err());
    }

    #[test]
    fn cross_partition_merge_is_rejected() {
        let mut m1 = Mutation::row(table(), vec![1]).set("col1", vec![0xA], 0);
        let m2 = Mutation::row(table(), vec![2]).set("col1", vec![0xB], 0);
        assert!(m1.merge(m2).is_err());
    }

    #[test]
    fn accumulator_keeps_one_mutation_per_kind() {
        let mut acc = MutationAccumulator::new();
        acc.push(Mutation::row(table(), vec![1]).set("col1", vec![0xA], 0)).unwrap();
        acc.push(Mutation::row(table(), vec![1]).set("col2", vec![0xB], 0)).unwrap();
        acc.push(Mutation::counter(table(), vec![1]).add("hits", 1)).unwrap();
        let batch = acc.into_mutations();
        assert_eq!(batch.len(), 2);
        // row first, then counter
        assert_eq!(batch[0].kind(), MutationKind::Row);
        assert_eq!(batch[1].kind(), MutationKind::Counter);
    }

    #[test]
    fn accumulator_separates_partitions() {
        let mut acc = MutationAccumulator::new();
        acc.push(Mutation::row(table(), vec![1]).set("col1", vec![0xA], 0)).unwrap();
        acc.push(Mutation::row(table(), vec![2]).set("col1", vec![0xB], 0)).unwrap();
        assert_eq!(acc.into_mutations().len(), 2);
    }
}

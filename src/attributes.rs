// Copyright 2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! This module defines the batch-level attributes.

use crate::consistency::Consistency;

/// Batch-scoped attributes: consistency level, timestamp and TTL.
/// A field is `None` unless the user set it explicitly, which is how
/// validation tells a user choice apart from a default.
#[derive(Debug, Clone, Default)]
pub struct Attributes {
    consistency: Option<Consistency>,
    timestamp: Option<i64>,
    time_to_live: Option<i32>,
}

impl Attributes {
    /// Create empty attributes, with nothing set explicitly.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the batch consistency level.
    pub fn consistency(mut self, consistency: Consistency) -> Self {
        self.consistency = Some(consistency);
        self
    }

    /// Set the batch timestamp in microseconds.
    pub fn timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Set the batch TTL in seconds. Only 0 passes validation; TTLs belong
    /// on the individual statements.
    pub fn time_to_live(mut self, ttl: i32) -> Self {
        self.time_to_live = Some(ttl);
        self
    }

    /// Get the explicit batch consistency level, if any.
    pub fn get_consistency(&self) -> Option<Consistency> {
        self.consistency
    }

    /// Get the explicit batch timestamp, if any.
    pub fn get_timestamp(&self) -> Option<i64> {
        self.timestamp
    }

    /// Get the explicit batch TTL, if any.
    pub fn get_time_to_live(&self) -> Option<i32> {
        self.time_to_live
    }
}

// Copyright 2025 Crrow
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Batching of encoded lines by identity key.
//!
//! ```text
//!   record(m, tags, fields, ts)
//!            │
//!            ▼
//!   encode line + key (no lock held)
//!            │
//!            ▼
//!   ┌──────────────────────────────────────────┐
//!   │ Mutex<HashMap<IdentityKey, Vec<String>>> │──► drain_all() swaps the map out
//!   └──────────────────────────────────────────┘
//! ```
//!
//! How a new line is folded into the lines already pending for its key is
//! decided by a [`Merge`] policy; the default [`Append`] keeps every line in
//! arrival order.

use std::{
    collections::HashMap,
    fmt,
    sync::{Mutex, MutexGuard, PoisonError},
};

use lineflux_protocol::{Fields, IdentityKey, Result, Tags, encode_line};

/// Folds a freshly encoded line into the accumulator of its key.
///
/// `existing` is empty the first time a key is seen and after every flush.
/// Any `Fn(String, Vec<String>) -> Vec<String>` closure is a `Merge`.
pub trait Merge: Send + Sync + 'static {
    fn merge(&self, line: String, existing: Vec<String>) -> Vec<String>;

    /// Folds `line` into `existing` in place.
    ///
    /// The default works on a copy of `existing`, so a policy that panics
    /// leaves the accumulator as it was.
    fn merge_into(&self, line: String, existing: &mut Vec<String>) {
        *existing = self.merge(line, existing.clone());
    }
}

/// Keeps every line, in arrival order.
#[derive(Debug, Default, Clone, Copy)]
pub struct Append;

impl Merge for Append {
    fn merge(&self, line: String, mut existing: Vec<String>) -> Vec<String> {
        existing.push(line);
        existing
    }

    fn merge_into(&self, line: String, existing: &mut Vec<String>) { existing.push(line); }
}

/// Keeps only the most recent line of each key.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeepLatest;

impl Merge for KeepLatest {
    fn merge(&self, line: String, _existing: Vec<String>) -> Vec<String> { vec![line] }

    fn merge_into(&self, line: String, existing: &mut Vec<String>) {
        existing.clear();
        existing.push(line);
    }
}

impl<F> Merge for F
where
    F: Fn(String, Vec<String>) -> Vec<String> + Send + Sync + 'static,
{
    fn merge(&self, line: String, existing: Vec<String>) -> Vec<String> { self(line, existing) }
}

/// Pending lines grouped by identity key.
pub struct AggregationStore {
    pending: Mutex<HashMap<IdentityKey, Vec<String>>>,
    merge:   Box<dyn Merge>,
}

impl fmt::Debug for AggregationStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AggregationStore")
            .field("pending_keys", &self.pending_keys())
            .finish_non_exhaustive()
    }
}

impl Default for AggregationStore {
    fn default() -> Self { Self::new() }
}

impl AggregationStore {
    /// Creates a store with the [`Append`] policy
    pub fn new() -> Self { Self::with_merge(Append) }

    pub fn with_merge(merge: impl Merge) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            merge:   Box::new(merge),
        }
    }

    /// Encodes a point and merges it into the accumulator of its key.
    ///
    /// `measurement` is used as given; any prefix must already be applied.
    ///
    /// # Errors
    /// Returns the `EncodeError` of the point. The store is left untouched in
    /// that case.
    pub fn record(
        &self,
        measurement: &str,
        tags: &Tags,
        fields: &Fields,
        timestamp: Option<i64>,
    ) -> Result<()> {
        let line = encode_line(measurement, tags, fields, timestamp)?;
        let key = IdentityKey::new(measurement, tags);

        let mut pending = self.lock();
        match pending.get_mut(&key) {
            Some(existing) => self.merge.merge_into(line, existing),
            None => {
                let mut lines = Vec::new();
                self.merge.merge_into(line, &mut lines);
                pending.insert(key, lines);
            }
        }
        Ok(())
    }

    /// Removes and returns everything pending. The store stays usable.
    pub fn drain_all(&self) -> Vec<(IdentityKey, Vec<String>)> {
        let drained = std::mem::take(&mut *self.lock());
        drained.into_iter().collect()
    }

    /// Number of keys with pending lines
    pub fn pending_keys(&self) -> usize { self.lock().len() }

    /// Total number of pending lines across all keys
    pub fn pending_lines(&self) -> usize { self.lock().values().map(Vec::len).sum() }

    pub fn is_empty(&self) -> bool { self.lock().is_empty() }

    // Merge policies never leave a half-updated map behind, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, HashMap<IdentityKey, Vec<String>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

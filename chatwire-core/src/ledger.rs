//! Usage ledger
//!
//! One entry per completed response. Streamed responses carry no usage or
//! cost, so their entries record zeros for those fields.

use crate::protocol::types::ResponseRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Usage of one completed request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageEntry {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
    pub cost: f64,
    pub model: String,
    pub timestamp: DateTime<Utc>,
    pub temperature: f32,
    pub response_time: f64,
}

impl UsageEntry {
    /// Build an entry from a finished record and the temperature it was sent with
    pub fn from_record(record: &ResponseRecord, temperature: f32) -> Self {
        Self {
            prompt_tokens: record.usage_counter("prompt_tokens"),
            completion_tokens: record.usage_counter("completion_tokens"),
            total_tokens: record.usage_counter("total_tokens"),
            cost: record.cost.unwrap_or(0.0),
            model: record.model.clone(),
            timestamp: Utc::now(),
            temperature,
            response_time: record.response_time.unwrap_or(0.0),
        }
    }
}

/// Append-only list of usage entries
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsageLedger {
    entries: Vec<UsageEntry>,
}

impl UsageLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, entry: UsageEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[UsageEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of `total_tokens` over all entries
    pub fn total_tokens(&self) -> u64 {
        self.entries.iter().map(|e| e.total_tokens).sum()
    }

    /// Sum of `cost` over all entries
    pub fn total_cost(&self) -> f64 {
        self.entries.iter().map(|e| e.cost).sum()
    }

    /// Up to `limit` entries, newest first
    pub fn recent(&self, limit: usize) -> impl Iterator<Item = &UsageEntry> {
        self.entries.iter().rev().take(limit)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

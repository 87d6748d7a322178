//! In-memory list of saved properties, owned by the browser shell.

use serde::{Deserialize, Serialize};
use slotmap::{SlotMap, new_key_type};
use tsify_next::Tsify;

use crate::error::{PlannerError, Result};
use crate::planner::SimulationResult;
use crate::region::Region;
use crate::types::{Money, PropertyFacts, StrategyInputs};

new_key_type! {
    pub struct PropertyId;
}

impl PropertyId {
    pub fn to_u64(self) -> u64 {
        self.0.as_ffi()
    }

    pub fn from_u64(id: u64) -> Self {
        PropertyId::from(slotmap::KeyData::from_ffi(id))
    }
}

/// One saved auction case: its facts, the strategy last used, and the
/// last simulation run on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct PropertyRecord {
    pub case_number: String,
    #[serde(default)]
    pub court: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub region: Option<Region>,
    #[serde(default)]
    pub district: String,
    pub facts: PropertyFacts,
    pub strategy: StrategyInputs,
    #[serde(default)]
    pub bid_price: Money,
    #[serde(default)]
    pub last_result: Option<SimulationResult>,
}

impl PropertyRecord {
    fn matches(&self, needle: &str) -> bool {
        [&self.case_number, &self.location, &self.court]
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
    }
}

/// A record as listed to the shell, with its handle and edit counter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct PropertyEntry {
    pub id: u64,
    pub revision: u64,
    pub record: PropertyRecord,
}

#[derive(Debug, Clone)]
struct Stored {
    revision: u64,
    record: PropertyRecord,
}

#[derive(Debug, Clone, Default)]
pub struct PropertyBook {
    entries: SlotMap<PropertyId, Stored>,
    revision: u64,
}

impl PropertyBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn next_revision(&mut self) -> u64 {
        self.revision += 1;
        self.revision
    }

    pub fn insert(&mut self, record: PropertyRecord) -> PropertyId {
        let revision = self.next_revision();
        self.entries.insert(Stored { revision, record })
    }

    pub fn update(&mut self, id: PropertyId, record: PropertyRecord) -> Result<()> {
        let revision = self.next_revision();
        let stored = self
            .entries
            .get_mut(id)
            .ok_or(PlannerError::UnknownProperty(id.to_u64()))?;
        stored.revision = revision;
        stored.record = record;
        Ok(())
    }

    pub fn remove(&mut self, id: PropertyId) -> Result<PropertyRecord> {
        self.entries
            .remove(id)
            .map(|stored| stored.record)
            .ok_or(PlannerError::UnknownProperty(id.to_u64()))
    }

    pub fn get(&self, id: PropertyId) -> Option<&PropertyRecord> {
        self.entries.get(id).map(|stored| &stored.record)
    }

    /// Most recently modified first.
    pub fn list(&self) -> Vec<PropertyEntry> {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .map(|(id, stored)| PropertyEntry {
                id: id.to_u64(),
                revision: stored.revision,
                record: stored.record.clone(),
            })
            .collect();
        entries.sort_by(|a, b| b.revision.cmp(&a.revision));
        entries
    }

    /// Case-insensitive substring match on case number, location and court.
    /// A blank query lists everything.
    pub fn search(&self, query: &str) -> Vec<PropertyEntry> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.list();
        }
        self.list()
            .into_iter()
            .filter(|entry| entry.record.matches(&needle))
            .collect()
    }

    /// Records only, oldest first, so a re-import keeps the same order.
    pub fn to_json(&self) -> Result<String> {
        let mut entries = self.list();
        entries.reverse();
        let records: Vec<_> = entries.into_iter().map(|entry| entry.record).collect();
        Ok(serde_json::to_string(&records)?)
    }

    /// Replaces nothing: the caller gets a fresh book with fresh ids.
    pub fn from_json(json: &str) -> Result<Self> {
        let records: Vec<PropertyRecord> = serde_json::from_str(json)?;
        let mut book = Self::new();
        for record in records {
            book.insert(record);
        }
        Ok(book)
    }
}

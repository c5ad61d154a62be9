//! Data set store
//!
//! Completed trial records are grouped into named data sets (one per
//! participant run, device, or condition the experimenter wants to compare).
//! Ids are allocated monotonically and never reused.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::error::FittsError;
use crate::types::TrialRecord;

/// Categorical palette used to tag data sets
pub const PALETTE: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

/// Colour assigned to a data set id
pub fn colour_for(id: u32) -> &'static str {
    PALETTE[(id.saturating_sub(1) as usize) % PALETTE.len()]
}

/// An ordered collection of trial records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSet {
    pub records: Vec<TrialRecord>,
    pub colour: String,
}

/// All data sets of a session plus the active selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSetStore {
    sets: BTreeMap<u32, DataSet>,
    active: u32,
    last_id: u32,
}

impl Default for DataSetStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DataSetStore {
    /// Create a store holding one empty, active data set
    pub fn new() -> Self {
        let mut store = Self {
            sets: BTreeMap::new(),
            active: 0,
            last_id: 0,
        };
        store.create();
        store
    }

    /// Allocate a new empty data set and make it active
    pub fn create(&mut self) -> u32 {
        self.last_id += 1;
        let id = self.last_id;
        self.sets.insert(
            id,
            DataSet {
                records: Vec::new(),
                colour: colour_for(id).to_string(),
            },
        );
        self.active = id;
        info!(data_set = id, "created data set");
        id
    }

    /// Remove a data set. The last remaining set cannot be deleted.
    pub fn delete(&mut self, id: u32) -> Result<(), FittsError> {
        if self.sets.len() == 1 {
            return Err(FittsError::InvalidOperation(
                "cannot delete the only data set; create another one first".to_string(),
            ));
        }
        if self.sets.remove(&id).is_none() {
            return Err(FittsError::NotFound(id));
        }

        if self.active == id {
            if let Some(&first) = self.sets.keys().next() {
                self.active = first;
            }
        }
        info!(data_set = id, active = self.active, "deleted data set");
        Ok(())
    }

    pub fn set_active(&mut self, id: u32) -> Result<(), FittsError> {
        if !self.sets.contains_key(&id) {
            return Err(FittsError::NotFound(id));
        }
        self.active = id;
        debug!(data_set = id, "activated data set");
        Ok(())
    }

    /// Append a record to the named data set
    pub fn append(&mut self, id: u32, record: TrialRecord) -> Result<usize, FittsError> {
        let set = self.sets.get_mut(&id).ok_or(FittsError::NotFound(id))?;
        set.records.push(record);
        Ok(set.records.len())
    }

    /// Append a record to the active data set
    pub fn append_active(&mut self, record: TrialRecord) -> Result<usize, FittsError> {
        self.append(self.active, record)
    }

    pub fn get(&self, id: u32) -> Result<&DataSet, FittsError> {
        self.sets.get(&id).ok_or(FittsError::NotFound(id))
    }

    pub fn active_id(&self) -> u32 {
        self.active
    }

    pub fn active(&self) -> &DataSet {
        // the active id always refers to a live set
        &self.sets[&self.active]
    }

    /// Ids in ascending order
    pub fn ids(&self) -> Vec<u32> {
        self.sets.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &DataSet)> {
        self.sets.iter().map(|(id, set)| (*id, set))
    }

    /// Load a store from JSON.
    ///
    /// The store must hold at least one set, the active id must name one of
    /// them and the id counter must not be behind any existing id.
    pub fn from_json(json: &str) -> Result<Self, FittsError> {
        let store: Self = serde_json::from_str(json)?;
        let Some(&max_id) = store.sets.keys().next_back() else {
            return Err(FittsError::ParseError("store holds no data sets".to_string()));
        };
        if !store.sets.contains_key(&store.active) {
            return Err(FittsError::ParseError(format!(
                "active data set {} does not exist",
                store.active
            )));
        }
        if store.last_id < max_id {
            return Err(FittsError::ParseError(format!(
                "id counter {} is behind data set {max_id}",
                store.last_id
            )));
        }
        Ok(store)
    }

    /// Serialize the store to JSON
    pub fn to_json(&self) -> Result<String, FittsError> {
        Ok(serde_json::to_string(self)?)
    }
}

//! Trial battery: the ordered list of conditions administered in one session

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Action name produced by a primary pointer press
pub const CLICK: &str = "click";

/// One experimental condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatteryEntry {
    /// Nominal inter-target distance
    pub distance: f64,
    /// Target diameter
    pub width: f64,
    /// Actions (pointer buttons or key codes) that must all be held to acquire
    #[serde(default = "default_actions")]
    pub actions: Vec<String>,
}

fn default_actions() -> Vec<String> {
    vec![CLICK.to_string()]
}

impl BatteryEntry {
    pub fn new(distance: f64, width: f64, actions: &[&str]) -> Self {
        Self {
            distance,
            width,
            actions: actions.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Whether every required action is among `held`
    pub fn is_satisfied_by(&self, held: &BTreeSet<String>) -> bool {
        self.actions.iter().all(|a| held.contains(a))
    }

    /// Space separated list, as shown in instructions
    pub fn keys_label(&self) -> String {
        self.actions.join(" ")
    }

    /// Comma separated list, as stored on trial records
    pub fn key_press(&self) -> String {
        self.actions.join(",")
    }
}

/// Battery with a forward-only cursor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialBattery {
    entries: Vec<BatteryEntry>,
    current: usize,
}

impl TrialBattery {
    pub fn new(entries: Vec<BatteryEntry>) -> Self {
        Self {
            entries,
            current: 0,
        }
    }

    /// The four-condition battery scaled to the longer screen edge
    pub fn standard(long_dimension: f64) -> Self {
        Self::new(vec![
            BatteryEntry::new(long_dimension * 0.25, long_dimension * 0.08, &[CLICK]),
            BatteryEntry::new(long_dimension * 0.25, long_dimension * 0.02, &[CLICK]),
            BatteryEntry::new(long_dimension * 0.4, long_dimension * 0.08, &[CLICK]),
            BatteryEntry::new(long_dimension * 0.4, long_dimension * 0.02, &[CLICK]),
        ])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cursor in `0..=len`; `len` means the battery is complete
    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn is_complete(&self) -> bool {
        self.current >= self.entries.len()
    }

    pub fn current_entry(&self) -> Option<&BatteryEntry> {
        self.entries.get(self.current)
    }

    pub fn entries(&self) -> &[BatteryEntry] {
        &self.entries
    }

    /// Move the cursor forward and return the new entry, if any
    pub fn advance(&mut self) -> Option<&BatteryEntry> {
        if self.current < self.entries.len() {
            self.current += 1;
        }
        self.entries.get(self.current)
    }
}

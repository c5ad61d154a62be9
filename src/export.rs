//! Export encoding
//!
//! Serializes selected data sets into the session's only persisted artifact:
//! a JSON document carrying the raw trial records of each set together with
//! the participant and device labels. The document can be parsed back for
//! offline re-analysis.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dataset::{DataSet, DataSetStore};
use crate::error::FittsError;
use crate::types::TrialRecord;
use crate::{ENGINE_VERSION, PRODUCER_NAME};

/// Producer metadata attached to every export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// One exported data set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedDataSet {
    pub id: u32,
    pub colour: String,
    pub data: Vec<TrialRecord>,
}

impl ExportedDataSet {
    /// View the exported records as a data set for analysis
    pub fn to_data_set(&self) -> DataSet {
        DataSet {
            records: self.data.clone(),
            colour: self.colour.clone(),
        }
    }
}

/// Exported session data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    /// Participant identifier
    pub id: String,
    /// Input device label
    pub device: String,
    pub data: Vec<ExportedDataSet>,
    pub producer: ExportProducer,
    pub export_id: String,
    /// RFC 3339 creation time
    pub exported_at: String,
}

impl ExportDocument {
    pub fn from_json(json: &str) -> Result<Self, FittsError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, FittsError> {
        serde_json::to_string_pretty(self).map_err(FittsError::JsonError)
    }

    /// Look up an exported set by id
    pub fn data_set(&self, id: u32) -> Option<&ExportedDataSet> {
        self.data.iter().find(|set| set.id == id)
    }
}

/// Builds export documents from a data set store
pub struct ExportEncoder {
    instance_id: String,
}

impl Default for ExportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ExportEncoder {
    /// Create an encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    /// Export the given data sets in the order requested.
    ///
    /// Fails with `NotFound` on the first unknown id.
    pub fn encode(
        &self,
        store: &DataSetStore,
        ids: &[u32],
        participant: &str,
        device: &str,
    ) -> Result<ExportDocument, FittsError> {
        let data = ids
            .iter()
            .map(|&id| {
                let set = store.get(id)?;
                Ok(ExportedDataSet {
                    id,
                    colour: set.colour.clone(),
                    data: set.records.clone(),
                })
            })
            .collect::<Result<Vec<_>, FittsError>>()?;

        Ok(ExportDocument {
            id: participant.to_string(),
            device: device.to_string(),
            data,
            producer: ExportProducer {
                name: PRODUCER_NAME.to_string(),
                version: ENGINE_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            export_id: Uuid::new_v4().to_string(),
            exported_at: Utc::now().to_rfc3339(),
        })
    }

    /// Encode to JSON string
    pub fn encode_to_json(
        &self,
        store: &DataSetStore,
        ids: &[u32],
        participant: &str,
        device: &str,
    ) -> Result<String, FittsError> {
        self.encode(store, ids, participant, device)?.to_json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::types::Target;

    fn record(time: i64) -> TrialRecord {
        TrialRecord::capture(
            Point::at(0.0, 0.0, 0),
            Target {
                x: 100.0,
                y: 0.0,
                w: 20.0,
                distance: 200.0,
            },
            vec![Point::at(0.0, 0.0, 0)],
            Point::at(101.0, 2.0, time),
            "click".to_string(),
        )
        .unwrap()
    }

    fn store() -> DataSetStore {
        let mut store = DataSetStore::new();
        store.append(1, record(400)).unwrap();
        let second = store.create();
        store.append(second, record(500)).unwrap();
        store.append(second, record(450)).unwrap();
        store
    }

    #[test]
    fn test_encode_selected_sets() {
        let encoder = ExportEncoder::with_instance_id("test-instance".to_string());
        let doc = encoder.encode(&store(), &[2, 1], "P07", "trackpad").unwrap();

        assert_eq!(doc.id, "P07");
        assert_eq!(doc.device, "trackpad");
        assert_eq!(doc.data.len(), 2);
        assert_eq!(doc.data[0].id, 2);
        assert_eq!(doc.data[0].data.len(), 2);
        assert_eq!(doc.data[1].colour, "#1f77b4");
        assert_eq!(doc.producer.name, PRODUCER_NAME);
        assert_eq!(doc.producer.instance_id, "test-instance");
        assert!(!doc.export_id.is_empty());
    }

    #[test]
    fn test_unknown_id_is_rejected() {
        let err = ExportEncoder::new()
            .encode(&store(), &[1, 9], "P07", "mouse")
            .unwrap_err();
        assert!(matches!(err, FittsError::NotFound(9)));
    }

    #[test]
    fn test_json_layout_and_parse_back() {
        let json = ExportEncoder::new()
            .encode_to_json(&store(), &[1], "P01", "mouse")
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["id"], "P01");
        assert_eq!(value["data"][0]["id"], 1);
        assert_eq!(value["data"][0]["data"][0]["time"], 400);
        assert_eq!(value["data"][0]["data"][0]["hit"]["x"], 101.0);

        let doc = ExportDocument::from_json(&json).unwrap();
        let set = doc.data_set(1).unwrap().to_data_set();
        assert_eq!(set.records[0].time, 400);
        assert!(doc.data_set(2).is_none());
    }
}

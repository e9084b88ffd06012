use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::graph::{RootGraph, is_meta_key, keys};
use crate::summary::Summary;
use crate::{A2lError, ParseResult};

const NO_FILE_MESSAGE: &str = "No protocol file is loaded.";
const PARSE_ERROR_MESSAGE: &str = "File parse error.";
const INVALID_STATUS_MESSAGE: &str = "File parse error. Invalid summary JSON.";

/// state of the protocol file of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProtocolFileState {
    NoFile,
    Parsed,
    Error,
}

impl ProtocolFileState {
    /// parse a status name; unknown names are treated as errors
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "NO_FILE" => ProtocolFileState::NoFile,
            "PARSED" => ProtocolFileState::Parsed,
            _ => ProtocolFileState::Error,
        }
    }
}

/// The short status record that is stored next to a parsed protocol file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolFileStatus {
    pub status: ProtocolFileState,
    pub message: String,
    pub loaded_entity_count: u32,
    pub loaded_characteristic_count: u32,
    pub loaded_measurement_count: u32,
    pub loaded_curve_count: u32,
    pub loaded_map_count: u32,
    pub file_size_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub updated_at: Option<String>,
}

impl ProtocolFileStatus {
    #[must_use]
    pub fn no_file() -> Self {
        Self::with_message(ProtocolFileState::NoFile, NO_FILE_MESSAGE.to_string(), 0)
    }

    /// status of a successfully parsed file, with counts taken from the summary lists
    ///
    /// If the graph has not been summarized yet, a summary is built for the counts.
    #[must_use]
    pub fn parsed(graph: &RootGraph, file_size: u64) -> Self {
        let built;
        let summary = if let Some(summary) = graph.summary() {
            summary
        } else {
            built = Summary::build(graph);
            &built
        };
        let count = |key: &str| u32::try_from(summary.names(key).count()).unwrap_or(u32::MAX);

        let loaded_entity_count = count(keys::ALL_A2L_VARIABLES);
        let loaded_characteristic_count = count(keys::ALL_A2L_CHARACTERISTICS);
        let loaded_measurement_count = count(keys::ALL_A2L_MEASUREMENTS);
        Self {
            status: ProtocolFileState::Parsed,
            message: format!(
                "Loaded protocol entities: {loaded_entity_count} (characteristics: {loaded_characteristic_count}, measurements: {loaded_measurement_count})."
            ),
            loaded_entity_count,
            loaded_characteristic_count,
            loaded_measurement_count,
            loaded_curve_count: count(keys::ALL_A2L_CURVES),
            loaded_map_count: count(keys::ALL_A2L_MAPS),
            file_size_bytes: file_size,
            updated_at: None,
        }
    }

    #[must_use]
    pub fn parse_error(error_message: &str, file_size: u64) -> Self {
        let message = if error_message.trim().is_empty() {
            PARSE_ERROR_MESSAGE.to_string()
        } else {
            format!("{PARSE_ERROR_MESSAGE} {error_message}")
        };
        Self::with_message(ProtocolFileState::Error, message, file_size)
    }

    /// build the status record from the outcome of a parse
    #[must_use]
    pub fn from_parse_outcome(outcome: &Result<ParseResult, A2lError>, file_size: u64) -> Self {
        match outcome {
            Ok(result) => Self::parsed(&result.graph, file_size),
            Err(error) => Self::parse_error(&error.to_string(), file_size),
        }
    }

    /// set the time stamp of the record, e.g. `2024-05-01T12:00:00`
    #[must_use]
    pub fn with_updated_at(mut self, updated_at: impl Into<String>) -> Self {
        self.updated_at = Some(updated_at.into());
        self
    }

    /// serialize the record to compact json
    ///
    /// # Errors
    ///
    /// [`A2lError::JsonError`] if serialization fails
    pub fn to_json(&self) -> Result<String, A2lError> {
        serde_json::to_string(self).map_err(|json_error| A2lError::JsonError {
            filename: std::path::PathBuf::new(),
            json_error,
        })
    }

    /// read a stored status record
    ///
    /// Reading never fails: empty input is a `NO_FILE` record, while invalid json results in an
    /// `ERROR` record. Missing or unreadable counts are zero.
    #[must_use]
    pub fn from_json(text: &str) -> Self {
        if text.trim().is_empty() {
            return Self::no_file();
        }
        let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(text)
        else {
            return Self::with_message(
                ProtocolFileState::Error,
                INVALID_STATUS_MESSAGE.to_string(),
                0,
            );
        };

        let status = match map.get("status") {
            None => ProtocolFileState::NoFile,
            Some(serde_json::Value::String(name)) => ProtocolFileState::from_name(name),
            Some(_) => ProtocolFileState::Error,
        };
        let message = match map.get("message") {
            None => NO_FILE_MESSAGE.to_string(),
            Some(serde_json::Value::String(message)) => message.clone(),
            Some(other) => other.to_string(),
        };
        let count = |key: &str| {
            map.get(key)
                .and_then(json_integer)
                .and_then(|num| u32::try_from(num).ok())
                .unwrap_or(0)
        };
        Self {
            status,
            message,
            loaded_entity_count: count("loadedEntityCount"),
            loaded_characteristic_count: count("loadedCharacteristicCount"),
            loaded_measurement_count: count("loadedMeasurementCount"),
            loaded_curve_count: count("loadedCurveCount"),
            loaded_map_count: count("loadedMapCount"),
            file_size_bytes: map
                .get("fileSizeBytes")
                .and_then(json_integer)
                .and_then(|num| u64::try_from(num).ok())
                .unwrap_or(0),
            updated_at: map
                .get("updatedAt")
                .and_then(serde_json::Value::as_str)
                .map(str::to_string),
        }
    }

    fn with_message(status: ProtocolFileState, message: String, file_size: u64) -> Self {
        Self {
            status,
            message,
            loaded_entity_count: 0,
            loaded_characteristic_count: 0,
            loaded_measurement_count: 0,
            loaded_curve_count: 0,
            loaded_map_count: 0,
            file_size_bytes: file_size,
            updated_at: None,
        }
    }
}

impl Default for ProtocolFileStatus {
    fn default() -> Self {
        Self::no_file()
    }
}

// numbers are truncated, numeric strings are parsed
fn json_integer(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|num| num as i64)),
        serde_json::Value::String(text) => text.parse::<i64>().ok(),
        _ => None,
    }
}

/// the names of all variables of a graph, without case-insensitive duplicates
///
/// The names are taken from the `_all_a2l_variables` summary list. If that list is missing or
/// empty, the `Name` fields of all entries are used instead. The result is sorted
/// case-insensitively; of several names that only differ in case, the first one is kept.
#[must_use]
pub fn variable_names(graph: &RootGraph) -> Vec<String> {
    let mut names: BTreeMap<String, String> = BTreeMap::new();
    if let Some(summary) = graph.summary() {
        for name in summary.names(keys::ALL_A2L_VARIABLES) {
            add_name(&mut names, name);
        }
    }
    if names.is_empty() {
        for (key, entry) in graph.entries() {
            if is_meta_key(key) {
                continue;
            }
            if let Some(name) = entry.get(keys::NAME) {
                add_name(&mut names, &name.to_string());
            }
        }
    }

    names.into_values().collect()
}

// names are keyed by their lower case form, the first spelling wins
fn add_name(names: &mut BTreeMap<String, String>, name: &str) {
    let name = name.trim();
    if !name.is_empty() {
        names
            .entry(name.to_lowercase())
            .or_insert_with(|| name.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Entry, FieldType, SourceType};

    fn graph_with(names: &[(&str, FieldType, &str)]) -> RootGraph {
        let mut graph = RootGraph::new();
        for (name, field_type, datatype) in names {
            let mut entry = Entry::new(SourceType::A2l, *field_type);
            entry.set(keys::NAME, *name);
            if !datatype.is_empty() {
                entry.set(keys::DATA_TYPE, *datatype);
            }
            graph.insert_entry(name, entry);
        }
        graph
    }

    #[test]
    fn no_file() {
        let status = ProtocolFileStatus::no_file();
        assert_eq!(status.status, ProtocolFileState::NoFile);
        assert_eq!(status.message, "No protocol file is loaded.");
        assert_eq!(status.loaded_entity_count, 0);
        assert_eq!(status.file_size_bytes, 0);
        assert_eq!(ProtocolFileStatus::default(), status);
    }

    #[test]
    fn parsed() {
        let mut graph = graph_with(&[
            ("Speed", FieldType::Characteristic, "VALUE"),
            ("Curve1", FieldType::Characteristic, "CURVE"),
            ("Map1", FieldType::Characteristic, "MAP"),
            ("Rpm", FieldType::Measurement, ""),
        ]);
        let status = ProtocolFileStatus::parsed(&graph, 1234);
        assert_eq!(status.status, ProtocolFileState::Parsed);
        assert_eq!(
            status.message,
            "Loaded protocol entities: 4 (characteristics: 3, measurements: 1)."
        );
        assert_eq!(status.loaded_curve_count, 1);
        assert_eq!(status.loaded_map_count, 1);
        assert_eq!(status.file_size_bytes, 1234);

        // an existing summary is used as-is
        graph.summarize();
        graph.insert_entry("Late", Entry::new(SourceType::A2l, FieldType::Measurement));
        let status2 = ProtocolFileStatus::parsed(&graph, 1234);
        assert_eq!(status2, status);
    }

    #[test]
    fn parse_error() {
        let status = ProtocolFileStatus::parse_error("", 10);
        assert_eq!(status.status, ProtocolFileState::Error);
        assert_eq!(status.message, "File parse error.");
        assert_eq!(status.file_size_bytes, 10);

        let status = ProtocolFileStatus::parse_error("bad address", 10);
        assert_eq!(status.message, "File parse error. bad address");

        let outcome = Err(A2lError::InvalidJsonValue {
            key: "x".to_string(),
            description: "null".to_string(),
        });
        let status = ProtocolFileStatus::from_parse_outcome(&outcome, 5);
        assert_eq!(status.status, ProtocolFileState::Error);
        assert!(status.message.starts_with("File parse error. "));
    }

    #[test]
    fn status_json() {
        let status = ProtocolFileStatus::no_file().with_updated_at("2024-05-01T12:00:00");
        let text = status.to_json().unwrap();
        assert!(text.starts_with(r#"{"status":"NO_FILE","message":"No protocol file is loaded.","loadedEntityCount":0"#));
        assert!(text.contains(r#""updatedAt":"2024-05-01T12:00:00""#));
        assert_eq!(ProtocolFileStatus::from_json(&text), status);

        let text = ProtocolFileStatus::no_file().to_json().unwrap();
        assert!(!text.contains("updatedAt"));
    }

    #[test]
    fn lenient_status_json() {
        assert_eq!(ProtocolFileStatus::from_json("  "), ProtocolFileStatus::no_file());

        let status = ProtocolFileStatus::from_json("{not json");
        assert_eq!(status.status, ProtocolFileState::Error);
        assert_eq!(status.message, "File parse error. Invalid summary JSON.");

        let status = ProtocolFileStatus::from_json(
            r#"{"status":"SOMETHING","loadedEntityCount":"12","loadedMapCount":2.7,"loadedCurveCount":"x","fileSizeBytes":-4}"#,
        );
        assert_eq!(status.status, ProtocolFileState::Error);
        assert_eq!(status.message, "No protocol file is loaded.");
        assert_eq!(status.loaded_entity_count, 12);
        assert_eq!(status.loaded_map_count, 2);
        assert_eq!(status.loaded_curve_count, 0);
        assert_eq!(status.file_size_bytes, 0);

        let status = ProtocolFileStatus::from_json("{}");
        assert_eq!(status.status, ProtocolFileState::NoFile);
    }

    #[test]
    fn names_from_summary() {
        let mut graph = graph_with(&[
            ("speed", FieldType::Characteristic, "VALUE"),
            ("Alpha", FieldType::Measurement, ""),
        ]);
        graph.insert_entry("SPEED", Entry::new(SourceType::A2l, FieldType::Measurement));
        graph.summarize();
        assert_eq!(variable_names(&graph), vec!["Alpha", "speed"]);
    }

    #[test]
    fn names_from_entries() {
        let mut graph = RootGraph::new();
        let mut entry = Entry::new(SourceType::Dbc, FieldType::MemoryRegion);
        entry.set(keys::NAME, " Zeta ");
        graph.insert_entry("Zeta", entry);
        let mut entry = Entry::default();
        entry.set(keys::NAME, "beta");
        graph.insert_entry("beta", entry);
        let mut entry = Entry::default();
        entry.set(keys::NAME, "hidden");
        graph.insert_entry("_hidden", entry);
        graph.insert_entry("unnamed", Entry::default());

        // no summary
        assert_eq!(variable_names(&graph), vec!["beta", "Zeta"]);
        // an empty summary
        graph.summarize();
        assert_eq!(variable_names(&graph), vec!["beta", "Zeta"]);
        assert!(variable_names(&RootGraph::new()).is_empty());
    }
}

use fnv::FnvBuildHasher;
use indexmap::IndexMap;
use std::fmt::Display;

use crate::summary::Summary;
use crate::value::Value;

/// An insertion ordered map with string keys
pub type FieldMap<V> = IndexMap<String, V, FnvBuildHasher>;

/// Field names and fixed keys of the output format
pub mod keys {
    pub const ACCURACY: &str = "Accuracy";
    pub const ADDRESS: &str = "Address";
    pub const ADDRESS_LENGTH: &str = "AddressLength";
    pub const ADDRESS_ORIGINAL: &str = "Address_Original";
    pub const ADDRESS_START: &str = "AddressStart";
    pub const BIT_MASK: &str = "BIT_MASK";
    pub const BYTE_ORDER: &str = "BYTE_ORDER";
    pub const COEFFICIENTS: &str = "Coefficients";
    pub const CONVERSION: &str = "Conversion";
    pub const DATA_TYPE: &str = "DataType";
    pub const FIELD_TYPE: &str = "FieldType";
    pub const FORMAT: &str = "Format";
    pub const IDENTIFIER: &str = "Identifier";
    pub const INDEX: &str = "Index";
    pub const LOWER_LIMIT: &str = "LowerLimit";
    pub const MAX_DIFF: &str = "MaxDiff";
    pub const NAME: &str = "Name";
    pub const RECORD_TYPE: &str = "RecordType";
    pub const RESOLUTION: &str = "Resolution";
    pub const SOURCE: &str = "Source";
    pub const UNITS: &str = "Units";
    pub const UPPER_LIMIT: &str = "UpperLimit";

    // AXIS_PTS
    pub const AXIS_CONVERSION_0: &str = "AxisConversion0";
    pub const AXIS_INPUT_0: &str = "AxisInput0";
    pub const AXIS_LOWER_LIMIT_0: &str = "AxisLowerLimit0";
    pub const AXIS_NUMBER_OF_POINTS_0: &str = "AxisNumberOfPoints0";
    pub const AXIS_UPPER_LIMIT_0: &str = "AxisUpperLimit0";

    // first AXIS_DESCR of a CHARACTERISTIC or MEASUREMENT
    pub const AXIS_X_AXIS_PTS: &str = "AxisX_PTS";
    pub const AXIS_X_BYTE_ORDER: &str = "AxisXByteOrder";
    pub const AXIS_X_CONVERSION: &str = "AxisXConversion";
    pub const AXIS_X_FORMAT: &str = "AxisXFormat";
    pub const AXIS_X_INPUT: &str = "AxisXInput";
    pub const AXIS_X_LOWER_LIMIT: &str = "AxisXLowerLimit";
    pub const AXIS_X_NUMBER_OF_POINTS: &str = "AxisXNumberOfPoints";
    pub const AXIS_X_TYPE: &str = "AxisXType";
    pub const AXIS_X_UPPER_LIMIT: &str = "AxisXUpperLimit";

    // every further AXIS_DESCR
    pub const AXIS_Y_AXIS_PTS: &str = "AxisY_PTS";
    pub const AXIS_Y_BYTE_ORDER: &str = "AxisYByteOrder";
    pub const AXIS_Y_CONVERSION: &str = "AxisYConversion";
    pub const AXIS_Y_FORMAT: &str = "AxisYFormat";
    pub const AXIS_Y_TYPE: &str = "AxisYType";
    pub const AXIS2_INPUT: &str = "Axis2Input";
    pub const AXIS2_LOWER_LIMIT: &str = "Axis2LowerLimit";
    pub const AXIS2_NUMBER_OF_POINTS: &str = "Axis2NumberOfPoints";
    pub const AXIS2_UPPER_LIMIT: &str = "Axis2UpperLimit";

    // meta mappings in the root graph
    pub const COMPUTE_METHODS: &str = "_COMPUTE_METHODS";
    pub const MEMORY_REGIONS: &str = "_MEMORY_REGIONS";
    pub const AXIS_PTS_REF: &str = "_AXIS_PTS_REF";

    // summary lists
    pub const ALL_A2L_VARIABLES: &str = "_all_a2l_variables";
    pub const ALL_A2L_CURVES: &str = "_all_a2l_curves";
    pub const ALL_A2L_MAPS: &str = "_all_a2l_maps";
    pub const ALL_A2L_SINGLE_VALUES: &str = "_all_a2l_single_values";
    pub const ALL_A2L_NONFLOAT_VALUES: &str = "_all_a2l_nonfloat_values";
    pub const ALL_A2L_FLOAT_VALUES: &str = "_all_a2l_float_values";
    pub const ALL_A2L_MEASUREMENTS: &str = "_all_a2l_measurements";
    pub const ALL_A2L_CHARACTERISTICS: &str = "_all_a2l_characteristics";
    pub const ALL_DBC_VALUES: &str = "_all_dbc_values";
    pub const ALL_BUFFER_VALUES: &str = "_all_buffer_values";

    // values of the DataType field
    pub const DATA_TYPE_CURVE: &str = "CURVE";
    pub const DATA_TYPE_MAP: &str = "MAP";
    pub const DATA_TYPE_VALUE: &str = "VALUE";
}

/// origin of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceType {
    A2l = 1,
    Dbc = 2,
    Buffer = 3,
}

impl SourceType {
    #[must_use]
    pub fn code(self) -> i64 {
        self as i64
    }

    #[must_use]
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(SourceType::A2l),
            2 => Some(SourceType::Dbc),
            3 => Some(SourceType::Buffer),
            _ => None,
        }
    }
}

/// the kind of block an entry was built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Characteristic,
    Measurement,
    CompuMethod,
    MemoryRegion,
    AxisPts,
}

impl FieldType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Characteristic => "CHARACTERISTIC",
            FieldType::Measurement => "MEASUREMENT",
            FieldType::CompuMethod => "COMPU_METHOD",
            FieldType::MemoryRegion => "MEMORY_REGION",
            FieldType::AxisPts => "AXIS_PTS",
        }
    }

    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "CHARACTERISTIC" => Some(FieldType::Characteristic),
            "MEASUREMENT" => Some(FieldType::Measurement),
            "COMPU_METHOD" => Some(FieldType::CompuMethod),
            "MEMORY_REGION" => Some(FieldType::MemoryRegion),
            "AXIS_PTS" => Some(FieldType::AxisPts),
            _ => None,
        }
    }
}

impl Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One parsed block: an ordered bag of named fields
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Entry {
    fields: FieldMap<Value>,
}

impl Entry {
    /// create an entry that only contains the `Source` and `FieldType` fields
    #[must_use]
    pub fn new(source: SourceType, field_type: FieldType) -> Self {
        let mut entry = Self::default();
        entry.set(keys::SOURCE, source.code());
        entry.set(keys::FIELD_TYPE, field_type.as_str());
        entry
    }

    /// set a field, replacing the previous value if the field already exists
    pub fn set<V: Into<Value>>(&mut self, key: &str, value: V) {
        self.fields.insert(key.to_string(), value.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// get a field as a string slice; numbers are not converted
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// the `Name` field, or an empty string if the entry has no name
    #[must_use]
    pub fn name(&self) -> &str {
        self.get_str(keys::NAME).unwrap_or_default()
    }

    #[must_use]
    pub fn field_type(&self) -> Option<FieldType> {
        self.get_str(keys::FIELD_TYPE).and_then(FieldType::parse)
    }

    /// the numeric code of the `Source` field
    ///
    /// Numeric strings are accepted, fractional numbers are truncated. A missing or
    /// unreadable source counts as A2L.
    #[must_use]
    pub fn source_code(&self) -> i64 {
        match self.fields.get(keys::SOURCE) {
            Some(Value::Integer(code)) => *code,
            Some(Value::Float(code)) => *code as i64,
            Some(Value::Text(text)) => text
                .trim()
                .parse::<i64>()
                .unwrap_or(SourceType::A2l.code()),
            _ => SourceType::A2l.code(),
        }
    }

    #[must_use]
    pub fn source(&self) -> Option<SourceType> {
        SourceType::from_code(self.source_code())
    }

    #[must_use]
    pub fn is_a2l(&self) -> bool {
        self.source_code() == SourceType::A2l.code()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(key, value)| (key.as_str(), value))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Entry {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

/// The root of the parsed object graph
///
/// Entries are kept in insertion order, keyed by name. `COMPU_METHOD`, `MEMORY_REGION` and
/// `AXIS_PTS` entries live in their own mappings, which are serialized under the meta keys
/// `_COMPUTE_METHODS`, `_MEMORY_REGIONS` and `_AXIS_PTS_REF`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RootGraph {
    pub(crate) entries: FieldMap<Entry>,
    pub(crate) compu_methods: FieldMap<Entry>,
    pub(crate) memory_regions: FieldMap<Entry>,
    pub(crate) axis_pts_refs: FieldMap<Entry>,
    pub(crate) summary: Option<Summary>,
    // top-level scalars of unknown meaning, as found in a json file
    pub(crate) extras: FieldMap<Value>,
}

impl RootGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// all entries except the meta mappings
    #[must_use]
    pub fn entries(&self) -> &FieldMap<Entry> {
        &self.entries
    }

    #[must_use]
    pub fn entry(&self, name: &str) -> Option<&Entry> {
        self.entries.get(name)
    }

    /// insert or replace a top-level entry
    pub fn insert_entry(&mut self, name: &str, entry: Entry) {
        self.entries.insert(name.to_string(), entry);
    }

    #[must_use]
    pub fn compu_methods(&self) -> &FieldMap<Entry> {
        &self.compu_methods
    }

    pub fn insert_compu_method(&mut self, name: &str, entry: Entry) {
        self.compu_methods.insert(name.to_string(), entry);
    }

    #[must_use]
    pub fn memory_regions(&self) -> &FieldMap<Entry> {
        &self.memory_regions
    }

    #[must_use]
    pub fn axis_pts_refs(&self) -> &FieldMap<Entry> {
        &self.axis_pts_refs
    }

    /// the summary lists, available after [`RootGraph::summarize`]
    #[must_use]
    pub fn summary(&self) -> Option<&Summary> {
        self.summary.as_ref()
    }

    #[must_use]
    pub fn extras(&self) -> &FieldMap<Value> {
        &self.extras
    }

    /// number of top-level entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
            && self.compu_methods.is_empty()
            && self.memory_regions.is_empty()
            && self.axis_pts_refs.is_empty()
    }
}

/// keys starting with an underscore are reserved for meta data
pub(crate) fn is_meta_key(key: &str) -> bool {
    key.starts_with('_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_entry() {
        let entry = Entry::new(SourceType::A2l, FieldType::Characteristic);
        assert_eq!(entry.len(), 2);
        assert_eq!(entry.get(keys::SOURCE), Some(&Value::Integer(1)));
        assert_eq!(entry.get_str(keys::FIELD_TYPE), Some("CHARACTERISTIC"));
        assert_eq!(entry.field_type(), Some(FieldType::Characteristic));
        assert_eq!(entry.name(), "");
        assert!(entry.is_a2l());
    }

    #[test]
    fn source_codes() {
        let mut entry = Entry::default();
        assert_eq!(entry.source(), Some(SourceType::A2l));

        entry.set(keys::SOURCE, 2i64);
        assert_eq!(entry.source(), Some(SourceType::Dbc));

        entry.set(keys::SOURCE, "3");
        assert_eq!(entry.source(), Some(SourceType::Buffer));

        entry.set(keys::SOURCE, 2.9);
        assert_eq!(entry.source(), Some(SourceType::Dbc));

        entry.set(keys::SOURCE, "not a number");
        assert_eq!(entry.source(), Some(SourceType::A2l));

        entry.set(keys::SOURCE, 17i64);
        assert_eq!(entry.source(), None);
        assert!(!entry.is_a2l());
    }

    #[test]
    fn field_order_is_preserved() {
        let entry: Entry = [("b", "1"), ("a", "2"), ("c", "3")].into_iter().collect();
        let names: Vec<&str> = entry.iter().map(|(key, _)| key).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn field_types() {
        for field_type in [
            FieldType::Characteristic,
            FieldType::Measurement,
            FieldType::CompuMethod,
            FieldType::MemoryRegion,
            FieldType::AxisPts,
        ] {
            assert_eq!(FieldType::parse(field_type.as_str()), Some(field_type));
        }
        assert_eq!(FieldType::parse("characteristic"), None);
    }

    #[test]
    fn root_graph() {
        let mut graph = RootGraph::new();
        assert!(graph.is_empty());

        let mut entry = Entry::new(SourceType::Dbc, FieldType::Measurement);
        entry.set(keys::NAME, "EngineSpeed");
        graph.insert_entry("EngineSpeed", entry);
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.entry("EngineSpeed").unwrap().name(), "EngineSpeed");
        assert!(graph.entry("enginespeed").is_none());
        assert!(graph.summary().is_none());

        assert!(is_meta_key(keys::COMPUTE_METHODS));
        assert!(!is_meta_key("EngineSpeed"));
    }
}

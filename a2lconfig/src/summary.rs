use crate::graph::{FieldType, RootGraph, SourceType, keys};

/// the keys of all summary lists, in the order in which they are stored
pub const SUMMARY_KEYS: [&str; 10] = [
    keys::ALL_A2L_VARIABLES,
    keys::ALL_A2L_CURVES,
    keys::ALL_A2L_MAPS,
    keys::ALL_A2L_SINGLE_VALUES,
    keys::ALL_A2L_NONFLOAT_VALUES,
    keys::ALL_A2L_FLOAT_VALUES,
    keys::ALL_A2L_MEASUREMENTS,
    keys::ALL_A2L_CHARACTERISTICS,
    keys::ALL_DBC_VALUES,
    keys::ALL_BUFFER_VALUES,
];

const VARIABLES: usize = 0;
const CURVES: usize = 1;
const MAPS: usize = 2;
const SINGLE_VALUES: usize = 3;
const NONFLOAT_VALUES: usize = 4;
const FLOAT_VALUES: usize = 5;
const MEASUREMENTS: usize = 6;
const CHARACTERISTICS: usize = 7;
const DBC_VALUES: usize = 8;
const BUFFER_VALUES: usize = 9;

// artifacts of the bus signal import, these are not real signals
const IGNORED_DBC_NAMES: [&str; 2] = ["DBC__all_pgns_by_address", "_all_pgns_by_address"];

const NONFLOAT_RECORD_TYPES: [&str; 5] = ["UWORD", "UBYTE", "ULONG", "SLONG", "Scalar_BOOLEAN"];
const FLOAT_RECORD_TYPE: &str = "FLOAT32_IEEE";

/// Comma separated name lists derived from the entries of a root graph
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Summary {
    lists: [String; 10],
}

impl Summary {
    /// classify all entries of the graph and build the sorted name lists
    #[must_use]
    pub fn build(graph: &RootGraph) -> Self {
        let mut names: [Vec<&str>; 10] = Default::default();

        for (key, entry) in &graph.entries {
            let key = key.as_str();
            match entry.source() {
                Some(SourceType::Dbc) => names[DBC_VALUES].push(key),
                Some(SourceType::Buffer) => names[BUFFER_VALUES].push(key),
                _ => {}
            }

            let field_type = entry.field_type();
            match field_type {
                Some(FieldType::Characteristic) => {
                    names[VARIABLES].push(key);
                    names[CHARACTERISTICS].push(key);
                }
                Some(FieldType::Measurement) => {
                    names[VARIABLES].push(key);
                    names[MEASUREMENTS].push(key);
                }
                _ => continue,
            }

            let datatype = entry.get_str(keys::DATA_TYPE).unwrap_or_default();
            match datatype {
                keys::DATA_TYPE_MAP => names[MAPS].push(key),
                keys::DATA_TYPE_CURVE => names[CURVES].push(key),
                keys::DATA_TYPE_VALUE => names[SINGLE_VALUES].push(key),
                _ if field_type == Some(FieldType::Measurement) => names[SINGLE_VALUES].push(key),
                _ => {}
            }

            // maps and curves are neither float nor non-float values
            if datatype == keys::DATA_TYPE_MAP || datatype == keys::DATA_TYPE_CURVE {
                continue;
            }
            let record_type = entry.get_str(keys::RECORD_TYPE).unwrap_or_default();
            if NONFLOAT_RECORD_TYPES.contains(&record_type) {
                names[NONFLOAT_VALUES].push(key);
            } else if record_type == FLOAT_RECORD_TYPE {
                names[FLOAT_VALUES].push(key);
            }
        }

        names[DBC_VALUES].retain(|name| !IGNORED_DBC_NAMES.contains(name));

        let lists = names.map(|mut list| {
            // stable: names that only differ in case keep their relative order
            list.sort_by_cached_key(|name| name.to_lowercase());
            list.join(",")
        });
        Self { lists }
    }

    /// get a summary list by its key, e.g. `_all_a2l_variables`
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        SUMMARY_KEYS
            .iter()
            .position(|summary_key| *summary_key == key)
            .map(|idx| self.lists[idx].as_str())
    }

    /// iterate over the non-empty names of one summary list
    pub fn names<'s>(&'s self, key: &str) -> impl Iterator<Item = &'s str> {
        self.get(key)
            .unwrap_or_default()
            .split(',')
            .filter(|name| !name.trim().is_empty())
    }

    /// iterate over all (key, list) pairs in a fixed order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        SUMMARY_KEYS
            .iter()
            .copied()
            .zip(self.lists.iter().map(String::as_str))
    }

    #[must_use]
    pub fn variables(&self) -> &str {
        &self.lists[VARIABLES]
    }

    #[must_use]
    pub fn characteristics(&self) -> &str {
        &self.lists[CHARACTERISTICS]
    }

    #[must_use]
    pub fn measurements(&self) -> &str {
        &self.lists[MEASUREMENTS]
    }

    // used when a stored summary is read back; returns false for unknown keys
    pub(crate) fn set(&mut self, key: &str, value: String) -> bool {
        if let Some(idx) = SUMMARY_KEYS.iter().position(|summary_key| *summary_key == key) {
            self.lists[idx] = value;
            true
        } else {
            false
        }
    }
}

/// add the summary lists to the graph, replacing any previous summary
pub(crate) fn summarize(graph: &mut RootGraph) {
    let summary = Summary::build(graph);
    log::debug!(
        "summarized {} entries: {} variables, {} dbc values, {} buffer values",
        graph.entries.len(),
        summary.names(keys::ALL_A2L_VARIABLES).count(),
        summary.names(keys::ALL_DBC_VALUES).count(),
        summary.names(keys::ALL_BUFFER_VALUES).count()
    );
    graph.summary = Some(summary);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Entry;

    fn entry(source: SourceType, field_type: FieldType, datatype: &str, record_type: &str) -> Entry {
        let mut entry = Entry::new(source, field_type);
        if !datatype.is_empty() {
            entry.set(keys::DATA_TYPE, datatype);
        }
        entry.set(keys::RECORD_TYPE, record_type);
        entry
    }

    #[test]
    fn case_insensitive_sort() {
        let mut graph = RootGraph::new();
        for name in ["Zeta", "alpha", "Beta"] {
            let entry = entry(SourceType::A2l, FieldType::Characteristic, "VALUE", "UBYTE");
            graph.insert_entry(name, entry);
        }
        graph.summarize();
        let summary = graph.summary().unwrap();
        assert_eq!(summary.get(keys::ALL_A2L_VARIABLES), Some("alpha,Beta,Zeta"));
        assert_eq!(summary.get(keys::ALL_A2L_CHARACTERISTICS), Some("alpha,Beta,Zeta"));
        assert_eq!(summary.get(keys::ALL_A2L_MEASUREMENTS), Some(""));
    }

    #[test]
    fn sort_is_stable() {
        let mut graph = RootGraph::new();
        for name in ["b", "B", "a"] {
            graph.insert_entry(name, entry(SourceType::A2l, FieldType::Measurement, "", "UWORD"));
        }
        let summary = Summary::build(&graph);
        assert_eq!(summary.variables(), "a,b,B");
    }

    #[test]
    fn classification() {
        let mut graph = RootGraph::new();
        graph.insert_entry(
            "Curve1",
            entry(SourceType::A2l, FieldType::Characteristic, "CURVE", "FLOAT32_IEEE"),
        );
        graph.insert_entry(
            "Map1",
            entry(SourceType::A2l, FieldType::Characteristic, "MAP", "UWORD"),
        );
        graph.insert_entry(
            "Value1",
            entry(SourceType::A2l, FieldType::Characteristic, "VALUE", "FLOAT32_IEEE"),
        );
        graph.insert_entry(
            "Value2",
            entry(SourceType::A2l, FieldType::Characteristic, "VALUE", "SLONG"),
        );
        // a characteristic with another data type is neither a single value nor a map or curve
        graph.insert_entry(
            "Block1",
            entry(SourceType::A2l, FieldType::Characteristic, "VAL_BLK", "UBYTE"),
        );
        graph.insert_entry(
            "Meas1",
            entry(SourceType::A2l, FieldType::Measurement, "", "ULONG"),
        );
        graph.insert_entry(
            "Meas2",
            entry(SourceType::A2l, FieldType::Measurement, "", "Scalar_BOOLEAN"),
        );
        graph.insert_entry(
            "Axis1",
            entry(SourceType::A2l, FieldType::AxisPts, "", "UBYTE"),
        );

        let summary = Summary::build(&graph);
        assert_eq!(
            summary.get(keys::ALL_A2L_VARIABLES),
            Some("Block1,Curve1,Map1,Meas1,Meas2,Value1,Value2")
        );
        assert_eq!(summary.get(keys::ALL_A2L_CURVES), Some("Curve1"));
        assert_eq!(summary.get(keys::ALL_A2L_MAPS), Some("Map1"));
        assert_eq!(
            summary.get(keys::ALL_A2L_SINGLE_VALUES),
            Some("Meas1,Meas2,Value1,Value2")
        );
        assert_eq!(
            summary.get(keys::ALL_A2L_NONFLOAT_VALUES),
            Some("Block1,Meas1,Meas2,Value2")
        );
        assert_eq!(summary.get(keys::ALL_A2L_FLOAT_VALUES), Some("Value1"));
        assert_eq!(summary.get(keys::ALL_A2L_MEASUREMENTS), Some("Meas1,Meas2"));
        assert_eq!(
            summary.get(keys::ALL_A2L_CHARACTERISTICS),
            Some("Block1,Curve1,Map1,Value1,Value2")
        );
        assert_eq!(summary.get(keys::ALL_DBC_VALUES), Some(""));
        assert_eq!(summary.get(keys::ALL_BUFFER_VALUES), Some(""));
    }

    #[test]
    fn source_lists() {
        let mut graph = RootGraph::new();
        graph.insert_entry(
            "rpm",
            entry(SourceType::Dbc, FieldType::Measurement, "", "UWORD"),
        );
        graph.insert_entry(
            "DBC__all_pgns_by_address",
            entry(SourceType::Dbc, FieldType::Measurement, "", "UWORD"),
        );
        graph.insert_entry(
            "_all_pgns_by_address",
            entry(SourceType::Dbc, FieldType::Measurement, "", "UWORD"),
        );
        graph.insert_entry(
            "Buf",
            entry(SourceType::Buffer, FieldType::Characteristic, "VALUE", "UBYTE"),
        );
        let mut plain = Entry::default();
        plain.set(keys::SOURCE, "3");
        graph.insert_entry("buf2", plain);

        let summary = Summary::build(&graph);
        assert_eq!(summary.get(keys::ALL_DBC_VALUES), Some("rpm"));
        assert_eq!(summary.get(keys::ALL_BUFFER_VALUES), Some("Buf,buf2"));
        // bus signals with a field type are also variables
        assert_eq!(
            summary.get(keys::ALL_A2L_MEASUREMENTS),
            Some("_all_pgns_by_address,DBC__all_pgns_by_address,rpm")
        );
        assert_eq!(summary.get(keys::ALL_A2L_CHARACTERISTICS), Some("Buf"));
    }

    #[test]
    fn meta_maps_are_not_summarized() {
        let mut graph = RootGraph::new();
        graph.insert_compu_method(
            "CM",
            entry(SourceType::A2l, FieldType::CompuMethod, "", ""),
        );
        graph.summarize();
        let summary = graph.summary().unwrap();
        assert!(summary.iter().all(|(_, list)| list.is_empty()));
        assert_eq!(summary.iter().count(), 10);
    }

    #[test]
    fn summary_access() {
        let mut summary = Summary::default();
        assert!(summary.set(keys::ALL_A2L_MAPS, "a,,b".to_string()));
        assert!(!summary.set("_all_something_else", String::new()));
        assert_eq!(summary.get(keys::ALL_A2L_MAPS), Some("a,,b"));
        assert_eq!(summary.get("Speed"), None);
        let names: Vec<&str> = summary.names(keys::ALL_A2L_MAPS).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(summary.names(keys::ALL_A2L_CURVES).count(), 0);
    }
}

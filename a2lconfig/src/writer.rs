use serde::ser::{Error as _, Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::A2lError;
use crate::graph::{Entry, FieldMap, RootGraph, keys};
use crate::loader;
use crate::summary::Summary;
use crate::value::Value;

// the fields of an entry are written in sorted order, regardless of their insertion order
impl Serialize for Entry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let sorted: BTreeMap<&str, &Value> = self.iter().collect();
        let mut map = serializer.serialize_map(Some(sorted.len()))?;
        for (key, value) in sorted {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[derive(serde::Serialize)]
#[serde(untagged)]
enum TopLevel<'a> {
    Entry(&'a Entry),
    Group(BTreeMap<&'a str, &'a Entry>),
    Text(&'a str),
    Value(&'a Value),
}

// all top-level items of the graph, sorted by key
//
// Entries, meta mappings, summary lists and extras share one json object, so every key
// may only be used once. An entry must not use the key of a meta mapping, even if that
// mapping is empty. On a collision the offending key is returned.
fn top_level_items(graph: &RootGraph) -> Result<BTreeMap<&str, TopLevel<'_>>, String> {
    let mut items: BTreeMap<&str, TopLevel> = BTreeMap::new();
    for (key, value) in &graph.extras {
        add_item(&mut items, key, TopLevel::Value(value))?;
    }
    for (key, entry) in &graph.entries {
        if is_group_key(key) {
            return Err(key.clone());
        }
        add_item(&mut items, key, TopLevel::Entry(entry))?;
    }
    for (key, group) in [
        (keys::COMPUTE_METHODS, &graph.compu_methods),
        (keys::MEMORY_REGIONS, &graph.memory_regions),
        (keys::AXIS_PTS_REF, &graph.axis_pts_refs),
    ] {
        // empty meta mappings are left out
        if !group.is_empty() {
            let sorted = group.iter().map(|(name, entry)| (name.as_str(), entry));
            add_item(&mut items, key, TopLevel::Group(sorted.collect()))?;
        }
    }
    if let Some(summary) = &graph.summary {
        for (key, list) in summary.iter() {
            add_item(&mut items, key, TopLevel::Text(list))?;
        }
    }
    Ok(items)
}

fn add_item<'a>(
    items: &mut BTreeMap<&'a str, TopLevel<'a>>,
    key: &'a str,
    item: TopLevel<'a>,
) -> Result<(), String> {
    if items.insert(key, item).is_some() {
        return Err(key.to_string());
    }
    Ok(())
}

fn is_group_key(key: &str) -> bool {
    matches!(
        key,
        keys::COMPUTE_METHODS | keys::MEMORY_REGIONS | keys::AXIS_PTS_REF
    )
}

impl Serialize for RootGraph {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let items = top_level_items(self)
            .map_err(|key| S::Error::custom(format!("duplicate top-level key \"{key}\"")))?;
        let mut map = serializer.serialize_map(Some(items.len()))?;
        for (key, item) in items {
            map.serialize_entry(key, &item)?;
        }
        map.end()
    }
}

/// serialize the graph to pretty-printed json with sorted keys
pub(crate) fn to_pretty_json(graph: &RootGraph) -> Result<String, A2lError> {
    let items = top_level_items(graph).map_err(|key| A2lError::DuplicateKey { key })?;
    serde_json::to_string_pretty(&items).map_err(|json_error| A2lError::JsonError {
        filename: PathBuf::new(),
        json_error,
    })
}

pub(crate) fn write_json(graph: &RootGraph, path: &Path) -> Result<(), A2lError> {
    let text = to_pretty_json(graph)?;
    std::fs::write(path, text).map_err(|ioerror| A2lError::FileWriteError {
        filename: path.to_path_buf(),
        ioerror,
    })?;
    log::debug!("wrote {} entries to {}", graph.len(), path.display());
    Ok(())
}

pub(crate) fn read_json(path: &Path) -> Result<RootGraph, A2lError> {
    let text = loader::load(path)?;
    from_json_impl(&text, path)
}

pub(crate) fn from_json_str(text: &str) -> Result<RootGraph, A2lError> {
    from_json_impl(text, Path::new(""))
}

fn from_json_impl(text: &str, filename: &Path) -> Result<RootGraph, A2lError> {
    let root: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(text).map_err(|json_error| A2lError::JsonError {
            filename: filename.to_path_buf(),
            json_error,
        })?;

    let mut graph = RootGraph::new();
    let mut summary = Summary::default();
    let mut has_summary = false;

    for (key, value) in root {
        match value {
            serde_json::Value::Object(object) => {
                let group = match key.as_str() {
                    keys::COMPUTE_METHODS => Some(&mut graph.compu_methods),
                    keys::MEMORY_REGIONS => Some(&mut graph.memory_regions),
                    keys::AXIS_PTS_REF => Some(&mut graph.axis_pts_refs),
                    _ => None,
                };
                if let Some(group) = group {
                    read_group(group, &key, object)?;
                } else {
                    let entry = read_entry(&key, object)?;
                    graph.entries.insert(key, entry);
                }
            }
            serde_json::Value::String(text) => {
                if summary.set(&key, text.clone()) {
                    has_summary = true;
                } else {
                    graph.extras.insert(key, Value::Text(text));
                }
            }
            other => {
                let value = read_value(&key, other)?;
                graph.extras.insert(key, value);
            }
        }
    }

    if has_summary {
        graph.summary = Some(summary);
    }
    log::debug!(
        "read {} entries and {} compu methods from json",
        graph.entries.len(),
        graph.compu_methods.len()
    );
    Ok(graph)
}

fn read_group(
    group: &mut FieldMap<Entry>,
    group_key: &str,
    object: serde_json::Map<String, serde_json::Value>,
) -> Result<(), A2lError> {
    for (name, value) in object {
        let entry = match value {
            serde_json::Value::Object(fields) => read_entry(&name, fields)?,
            other => {
                return Err(A2lError::InvalidJsonValue {
                    key: format!("{group_key}.{name}"),
                    description: describe(&other).to_string(),
                });
            }
        };
        group.insert(name, entry);
    }
    Ok(())
}

fn read_entry(
    entry_key: &str,
    object: serde_json::Map<String, serde_json::Value>,
) -> Result<Entry, A2lError> {
    let mut entry = Entry::default();
    for (field, value) in object {
        let value = read_value(&format!("{entry_key}.{field}"), value)?;
        entry.set(&field, value);
    }
    Ok(entry)
}

// convert any json value; the key is only used for error messages
fn read_value(key: &str, value: serde_json::Value) -> Result<Value, A2lError> {
    let value = match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(flag) => Value::Bool(flag),
        serde_json::Value::Number(number) => read_number(key, &number)?,
        serde_json::Value::String(text) => Value::Text(text),
        serde_json::Value::Array(items) => Value::List(
            items
                .into_iter()
                .enumerate()
                .map(|(idx, item)| read_value(&format!("{key}[{idx}]"), item))
                .collect::<Result<_, _>>()?,
        ),
        serde_json::Value::Object(object) => Value::Map(
            object
                .into_iter()
                .map(|(name, item)| {
                    let value = read_value(&format!("{key}.{name}"), item)?;
                    Ok((name, value))
                })
                .collect::<Result<_, A2lError>>()?,
        ),
    };
    Ok(value)
}

fn read_number(key: &str, number: &serde_json::Number) -> Result<Value, A2lError> {
    if let Some(num) = number.as_i64() {
        Ok(Value::Integer(num))
    } else if let Some(num) = number.as_f64() {
        Ok(Value::Float(num))
    } else {
        Err(A2lError::InvalidJsonValue {
            key: key.to_string(),
            description: format!("number {number}"),
        })
    }
}

fn describe(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// the location of the json file that accompanies an A2L file
///
/// `engine.a2l` is accompanied by `engine.a2l.json`, any other file name gets the suffix `.a2l.json`.
#[must_use]
pub fn companion_json_path(a2l_path: &Path) -> PathBuf {
    let mut filename = a2l_path.file_name().unwrap_or_default().to_os_string();
    if filename.to_string_lossy().ends_with(".a2l") {
        filename.push(".json");
    } else {
        filename.push(".a2l.json");
    }
    a2l_path.with_file_name(filename)
}

/*************************************************************************************************/

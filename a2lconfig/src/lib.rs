//! a2lconfig is a library that reads the legacy subset of a2l files that describes the calibration
//! data of an ECU and turns it into a flat, summarized json object graph.
//!
//! Only `CHARACTERISTIC`, `MEASUREMENT`, `COMPU_METHOD`, `MEMORY_REGION`, `AXIS_PTS` and
//! `AXIS_DESCR` blocks are read, everything else in the file is skipped.
//! The output is deterministic: all keys are written in sorted order, so parsing the same
//! input twice produces byte-identical json.
//!
//! Entries from other sources (bus signals, buffers) can be merged in from a json file, but they
//! never replace data that was read from an a2l file.

mod graph;
mod loader;
mod merge;
mod parser;
mod status;
mod summary;
mod tokenizer;
mod typedb;
mod value;
mod writer;

use fnv::FnvHashSet;
use std::convert::AsRef;
use std::path::{Path, PathBuf};
use thiserror::Error;

// re-export for the crate user
pub use graph::{Entry, FieldMap, FieldType, RootGraph, SourceType, keys};
pub use parser::ParserError;
pub use status::{ProtocolFileState, ProtocolFileStatus, variable_names};
pub use summary::{SUMMARY_KEYS, Summary};
pub use typedb::{RecordType, TypeTable, builtin_types};
pub use value::Value;
pub use writer::companion_json_path;

/// the maximum number of `CHARACTERISTIC` and `MEASUREMENT` entries in one file
pub const MAX_A2L_ENTRIES: u32 = 100_000;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum A2lError {
    /// `FileOpenError`: An `IoError` that occurred while loading a file
    #[error("Failed to load {filename}: {ioerror}")]
    FileOpenError {
        filename: PathBuf,
        ioerror: std::io::Error,
    },

    /// `FileReadError`: An `IoError` that occurred while reading from a file
    #[error("Could not read from {filename}: {ioerror}")]
    FileReadError {
        filename: PathBuf,
        ioerror: std::io::Error,
    },

    /// `FileWriteError`: An `IoError` that occurred while writing from a file
    #[error("Could not write to {filename}: {ioerror}")]
    FileWriteError {
        filename: PathBuf,
        ioerror: std::io::Error,
    },

    /// `ParserError`: Invalid data, the file could not be parsed
    #[error("Parser error: {parser_error}")]
    ParserError { parser_error: ParserError },

    /// `JsonError`: json data could not be read or written
    #[error("Invalid json data in {filename}: {json_error}")]
    JsonError {
        filename: PathBuf,
        json_error: serde_json::Error,
    },

    /// `InvalidJsonValue`: a json value has a type that cannot be stored in the object graph
    #[error("Unsupported json value for \"{key}\": {description}")]
    InvalidJsonValue { key: String, description: String },

    /// `DuplicateKey`: two items of the graph would be written under the same top-level json key
    #[error("Cannot write json: the key \"{key}\" is used more than once")]
    DuplicateKey { key: String },
}

/// Settings that control parsing
///
/// ```rust
/// let options = a2lconfig::ParseOptions::default()
///     .with_start_index(10)
///     .suppress("InternalCounter");
/// assert!(options.is_suppressed("InternalCounter"));
/// assert_eq!(options.start_index(), 10);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    pub(crate) suppressed_names: FnvHashSet<String>,
    pub(crate) start_index: u32,
}

impl ParseOptions {
    /// the first `Index` assigned to an addressable entry
    #[must_use]
    pub fn with_start_index(mut self, start_index: u32) -> Self {
        self.start_index = start_index;
        self
    }

    /// `CHARACTERISTIC` or `MEASUREMENT` blocks with this name are parsed, but not stored
    #[must_use]
    pub fn suppress(mut self, name: impl Into<String>) -> Self {
        self.suppressed_names.insert(name.into());
        self
    }

    #[must_use]
    pub fn suppress_all<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.suppressed_names
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// suppression is exact and case-sensitive
    #[must_use]
    pub fn is_suppressed(&self, name: &str) -> bool {
        self.suppressed_names.contains(name)
    }

    #[must_use]
    pub fn start_index(&self) -> u32 {
        self.start_index
    }
}

/// The result of parsing one a2l file
#[derive(Debug, Clone)]
pub struct ParseResult {
    pub graph: RootGraph,
    /// the index to use as `start_index` for the next file
    pub next_index: u32,
}

/**
Parse a2l data that has already been split into lines

# Example

Every line contains at most one token.

```rust
let lines = [
    "/begin MEASUREMENT Rpm",
    "\"engine speed\"",
    "UWORD",
    "CM_Rpm",
    "1",
    "100",
    "0",
    "8000",
    "ECU_ADDRESS 0x2000",
    "/end MEASUREMENT",
];
let options = a2lconfig::ParseOptions::default().with_start_index(5);
let result = a2lconfig::parse_lines(&lines, &options).unwrap();
assert_eq!(result.next_index, 6);
assert_eq!(result.graph.entry("Rpm").unwrap().get_str("Address"), Some("0x2000"));
```

# Errors

An `A2lError::ParserError` provides details if the data cannot be parsed.
 */
pub fn parse_lines<S: AsRef<str>>(
    lines: &[S],
    options: &ParseOptions,
) -> Result<ParseResult, A2lError> {
    parser::parse_lines(lines, "(lines)", options)
        .map_err(|parser_error| A2lError::ParserError { parser_error })
}

/**
Load an a2l file

The file may be encoded as UTF-8 (with or without a BOM) or as ISO 8859-1.

# Example
```
match a2lconfig::load("example.a2l", &a2lconfig::ParseOptions::default()) {
    Ok(result) => {/* do something with it*/},
    Err(error_message) => println!("{error_message}")
}
```

# Errors

An `A2lError` provides details information if loading the file fails. If the file
cannot be opened, this is an [`A2lError::FileOpenError`].
 */
pub fn load<P: AsRef<Path>>(path: P, options: &ParseOptions) -> Result<ParseResult, A2lError> {
    let pathref = path.as_ref();
    let filedata = loader::load(pathref)?;
    load_impl(&pathref.to_string_lossy(), &filedata, options)
}

/**
load a2l data stored in a string

# Example

```rust
# use a2lconfig::A2lError;
# fn main() -> Result<(), A2lError> {
let text = r#"
/begin CHARACTERISTIC Speed
  "vehicle speed limit"
  VALUE
  0x1000
  UBYTE
  0
  CM_Speed
  0
  255
/end CHARACTERISTIC
"#;
let result = a2lconfig::load_from_string(text, &a2lconfig::ParseOptions::default())?;
let speed = result.graph.entry("Speed").unwrap();
assert_eq!(speed.get_str("Address"), Some("0x1000"));
assert_eq!(result.next_index, 1);
# Ok(())
# }
```

# Errors

An `A2lError` provides details information if loading the data fails.
 */
pub fn load_from_string(a2ldata: &str, options: &ParseOptions) -> Result<ParseResult, A2lError> {
    load_impl("(string)", a2ldata, options)
}

/// load a2l data from raw file content
///
/// The data is decoded in the same way as a file loaded with [`load`].
///
/// # Errors
///
/// An `A2lError` provides details information if parsing the data fails.
pub fn load_from_bytes(a2ldata: &[u8], options: &ParseOptions) -> Result<ParseResult, A2lError> {
    let text = loader::decode_raw_bytes(a2ldata);
    load_impl("(data)", &text, options)
}

fn load_impl(
    filename: &str,
    filedata: &str,
    options: &ParseOptions,
) -> Result<ParseResult, A2lError> {
    let lines = tokenizer::split_lines(filedata);
    parser::parse_lines(&lines, filename, options)
        .map_err(|parser_error| A2lError::ParserError { parser_error })
}

/// load a2l data stored in a string and add the summary lists
///
/// # Errors
///
/// An `A2lError` provides details information if loading the data fails.
pub fn load_from_string_and_summarize(
    a2ldata: &str,
    options: &ParseOptions,
) -> Result<ParseResult, A2lError> {
    let mut result = load_from_string(a2ldata, options)?;
    result.graph.summarize();
    Ok(result)
}

/// load an a2l file and add the summary lists
///
/// # Errors
///
/// An `A2lError` provides details information if loading the file fails.
pub fn load_and_summarize<P: AsRef<Path>>(
    path: P,
    options: &ParseOptions,
) -> Result<ParseResult, A2lError> {
    let mut result = load(path, options)?;
    result.graph.summarize();
    Ok(result)
}

/// load an a2l file, merge the entries of a supplemental json file and add the summary lists
///
/// A supplemental file that does not exist is not an error; the result is the same as
/// [`load_and_summarize`] in that case.
///
/// # Errors
///
/// An `A2lError` provides details information if loading either file fails.
pub fn load_with_supplement<P: AsRef<Path>, Q: AsRef<Path>>(
    a2l_path: P,
    json_path: Q,
    options: &ParseOptions,
) -> Result<ParseResult, A2lError> {
    let mut result = load(a2l_path, options)?;
    let json_path = json_path.as_ref();
    if json_path.exists() {
        let supplemental = RootGraph::read_json(json_path)?;
        result.graph.merge(&supplemental);
    }
    result.graph.summarize();
    Ok(result)
}

/// load an a2l file and merge the json file next to it, see [`companion_json_path`]
///
/// # Errors
///
/// An `A2lError` provides details information if loading either file fails.
pub fn load_with_companion<P: AsRef<Path>>(
    a2l_path: P,
    options: &ParseOptions,
) -> Result<ParseResult, A2lError> {
    let a2l_path = a2l_path.as_ref();
    let json_path = companion_json_path(a2l_path);
    load_with_supplement(a2l_path, json_path, options)
}

impl RootGraph {
    /// classify all entries and store the summary lists in the graph
    ///
    /// A previous summary is replaced.
    pub fn summarize(&mut self) {
        summary::summarize(self);
    }

    /// Merge the entries of another graph that did not come from an a2l file
    ///
    /// Entries and `COMPU_METHOD`s whose `Source` is A2L are never copied. Existing A2L entries
    /// in this graph are never replaced, while compu methods are always overwritten.
    pub fn merge(&mut self, supplemental: &RootGraph) {
        merge::merge_graphs(self, supplemental);
    }

    /// serialize the graph to pretty-printed json with sorted keys
    ///
    /// # Errors
    ///
    /// [`A2lError::DuplicateKey`] if an entry uses the key of a meta mapping, of a summary list
    /// or of another top-level item; [`A2lError::JsonError`] if serialization fails
    pub fn to_pretty_json(&self) -> Result<String, A2lError> {
        writer::to_pretty_json(self)
    }

    /// write the graph to a json file
    ///
    /// # Errors
    ///
    /// [`A2lError::DuplicateKey`] as for [`RootGraph::to_pretty_json`], or
    /// [`A2lError::FileWriteError`] if writing the file fails.
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<(), A2lError> {
        writer::write_json(self, path.as_ref())
    }

    /// read a graph from json text
    ///
    /// # Errors
    ///
    /// [`A2lError::JsonError`] if the text is not a json object, [`A2lError::InvalidJsonValue`]
    /// if an item of `_COMPUTE_METHODS`, `_MEMORY_REGIONS` or `_AXIS_PTS_REF` is not an object
    pub fn from_json_str(text: &str) -> Result<RootGraph, A2lError> {
        writer::from_json_str(text)
    }

    /// read a graph from a json file
    ///
    /// # Errors
    ///
    /// An `A2lError` provides details information if reading the file fails.
    pub fn read_json<P: AsRef<Path>>(path: P) -> Result<RootGraph, A2lError> {
        writer::read_json(path.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    static SPEED: &str = r#"
/begin CHARACTERISTIC Speed
  "vehicle speed limit"
  VALUE
  0x1000
  UBYTE
  0
  CM_Speed
  0
  255
/end CHARACTERISTIC
"#;

    #[test]
    fn load_empty_string() {
        let result = load_from_string("", &ParseOptions::default()).unwrap();
        assert!(result.graph.is_empty());
        assert_eq!(result.next_index, 0);
        assert_eq!(result.graph.to_pretty_json().unwrap(), "{}");
    }

    #[test]
    fn test_load_file() {
        let dir = tempdir().unwrap();

        // create a file in a temp directory and load it
        let path = dir.path().join("test.a2l");
        std::fs::write(&path, SPEED).unwrap();

        let result = load(&path, &ParseOptions::default()).unwrap();
        assert!(result.graph.entry("Speed").is_some());
        assert!(result.graph.summary().is_none());

        let result = load_and_summarize(&path, &ParseOptions::default()).unwrap();
        assert_eq!(result.graph.summary().unwrap().characteristics(), "Speed");

        // try to load a file that does not exist
        let nonexistent_path = dir.path().join("nonexistent.a2l");
        let result = load(&nonexistent_path, &ParseOptions::default());
        assert!(matches!(result, Err(A2lError::FileOpenError { .. })));
    }

    #[test]
    fn load_bytes() {
        let mut data = b"\xEF\xBB\xBF".to_vec();
        data.extend_from_slice(SPEED.as_bytes());
        let result = load_from_bytes(&data, &ParseOptions::default()).unwrap();
        assert_eq!(result.graph.len(), 1);

        let data = b"/begin MEASUREMENT\nTemp\n\"\xb0C\"\nUBYTE\nCM\n1\n1\n0\n100\nECU_ADDRESS 0x10\n/end MEASUREMENT";
        let result = load_from_bytes(data, &ParseOptions::default()).unwrap();
        let entry = result.graph.entry("Temp").unwrap();
        assert_eq!(entry.get_str(keys::IDENTIFIER), Some("°C"));
    }

    #[test]
    fn parser_errors() {
        let result = load_from_string(
            "/begin CHARACTERISTIC X\n\"\"\nVALUE\n1000\nUBYTE\n0\nCM\n0\n1\n/end CHARACTERISTIC",
            &ParseOptions::default(),
        );
        let Err(error) = result else {
            panic!("expected an error");
        };
        assert!(matches!(
            error,
            A2lError::ParserError {
                parser_error: ParserError::InvalidAddress { error_line: 4, .. }
            }
        ));
        assert!(error.to_string().starts_with("Parser error: (string):4:"));

        let result = parse_lines(&["/begin MEASUREMENT", "X"], &ParseOptions::default());
        assert!(matches!(
            result,
            Err(A2lError::ParserError {
                parser_error: ParserError::MissingField { .. }
            })
        ));
    }

    #[test]
    fn options() {
        let options = ParseOptions::default()
            .suppress("Speed")
            .suppress_all(["A", "B"]);
        assert!(options.is_suppressed("Speed"));
        assert!(options.is_suppressed("B"));
        assert!(!options.is_suppressed("speed"));
        assert_eq!(options.start_index(), 0);

        let result = load_from_string(SPEED, &options).unwrap();
        assert!(result.graph.is_empty());
        // suppressed entries still consume an index
        assert_eq!(result.next_index, 1);
    }

    #[test]
    fn write_nonexistent_file() {
        let graph = RootGraph::new();
        let result = graph.write_json("__NONEXISTENT__/__FILE__/__PATH__/test.json");
        assert!(matches!(result, Err(A2lError::FileWriteError { .. })));
    }

    #[test]
    fn write_and_read_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.a2l.json");

        let result = load_from_string_and_summarize(SPEED, &ParseOptions::default()).unwrap();
        result.graph.write_json(&path).unwrap();
        let graph = RootGraph::read_json(&path).unwrap();
        assert_eq!(
            graph.to_pretty_json().unwrap(),
            result.graph.to_pretty_json().unwrap()
        );

        let result = RootGraph::read_json(dir.path().join("missing.json"));
        assert!(matches!(result, Err(A2lError::FileOpenError { .. })));

        std::fs::write(&path, "not json").unwrap();
        let result = RootGraph::read_json(&path);
        assert!(matches!(result, Err(A2lError::JsonError { .. })));
    }

    #[test]
    fn supplement() {
        let dir = tempdir().unwrap();
        let a2l_path = dir.path().join("node.a2l");
        std::fs::write(&a2l_path, SPEED).unwrap();

        // no companion file: the result is only summarized
        let result = load_with_companion(&a2l_path, &ParseOptions::default()).unwrap();
        assert_eq!(result.graph.len(), 1);
        assert!(result.graph.summary().is_some());

        std::fs::write(
            dir.path().join("node.a2l.json"),
            r#"{"EngineSpeed": {"Name": "EngineSpeed", "Source": 2, "FieldType": "MEASUREMENT"},
                "Speed": {"Name": "Speed", "Source": 3, "FieldType": "MEASUREMENT"}}"#,
        )
        .unwrap();
        let result = load_with_companion(&a2l_path, &ParseOptions::default()).unwrap();
        let graph = result.graph;
        assert_eq!(graph.len(), 2);
        assert!(graph.entry("Speed").unwrap().is_a2l());
        let summary = graph.summary().unwrap();
        assert_eq!(summary.get(keys::ALL_DBC_VALUES), Some("EngineSpeed"));
        assert_eq!(summary.get(keys::ALL_BUFFER_VALUES), Some(""));
        assert_eq!(summary.variables(), "EngineSpeed,Speed");
    }
}

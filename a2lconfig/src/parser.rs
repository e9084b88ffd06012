use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

use crate::graph::{Entry, FieldType, RootGraph, SourceType, keys};
use crate::tokenizer::{LineToken, TokenReader, unquote};
use crate::typedb::resolve_record_type;
use crate::value::{Value, parse_integer, parse_number};
use crate::{MAX_A2L_ENTRIES, ParseOptions, ParseResult};

static HEX_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0x[0-9A-Fa-f]+$").unwrap());

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParserError {
    #[error("{filename}:{error_line}: {what} is missing in block {block}; reached the end of the input")]
    MissingField {
        filename: String,
        error_line: u32,
        block: String,
        what: String,
    },

    #[error("{filename}:{error_line}: encountered end of input while not done parsing block {block} starting here")]
    UnterminatedBlock {
        filename: String,
        error_line: u32,
        block: String,
    },

    #[error("{filename}:{error_line}: invalid address \"{address}\" ({context})")]
    InvalidAddress {
        filename: String,
        error_line: u32,
        context: String,
        address: String,
    },

    #[error("{filename}:{error_line}: invalid hex value \"{value}\" ({context})")]
    InvalidHexValue {
        filename: String,
        error_line: u32,
        context: String,
        value: String,
    },

    #[error("{filename}:{error_line}: unsupported type \"{tag}\"")]
    UnsupportedType {
        filename: String,
        error_line: u32,
        tag: String,
    },

    #[error("{filename}:{error_line}: string \"{text}\" could not be interpreted as a number")]
    MalformedNumber {
        filename: String,
        error_line: u32,
        text: String,
    },

    #[error("{filename}:{error_line}: memory region \"{text}\" has {fields} fields, but 5 are required")]
    MalformedMemoryRegion {
        filename: String,
        error_line: u32,
        text: String,
        fields: usize,
    },

    #[error("A2L file contains more than allowed entries: {max}")]
    TooManyEntries { max: u32 },
}

/// the states of the block state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ParserState {
    None,
    BeginCharacteristic,
    BeginMeasurement,
    BeginCompuMethod,
    BeginMemoryRegion,
    BeginAxisPts,
    InAxisDescr,
}

impl ParserState {
    fn block_name(self) -> &'static str {
        match self {
            ParserState::None => "(none)",
            ParserState::BeginCharacteristic => "CHARACTERISTIC",
            ParserState::BeginMeasurement => "MEASUREMENT",
            ParserState::BeginCompuMethod => "COMPU_METHOD",
            ParserState::BeginMemoryRegion => "MEMORY_REGION",
            ParserState::BeginAxisPts => "AXIS_PTS",
            ParserState::InAxisDescr => "AXIS_DESCR",
        }
    }
}

const BEGIN_AXIS_DESCR: &str = "/begin AXIS_DESCR";
const BEGIN_AXIS_PTS: &str = "/begin AXIS_PTS";
const BEGIN_CHARACTERISTIC: &str = "/begin CHARACTERISTIC";
const BEGIN_COMPU_METHOD: &str = "/begin COMPU_METHOD";
const BEGIN_MEASUREMENT: &str = "/begin MEASUREMENT";
const BEGIN_MEMORY_REGION: &str = "/begin MEMORY_REGION";
const END_AXIS_DESCR: &str = "/end AXIS_DESCR";
const END_AXIS_PTS: &str = "/end AXIS_PTS";
const END_CHARACTERISTIC: &str = "/end CHARACTERISTIC";
const END_COMPU_METHOD: &str = "/end COMPU_METHOD";
const END_MEASUREMENT: &str = "/end MEASUREMENT";
const END_MEMORY_REGION: &str = "/end MEMORY_REGION";

const KW_AXIS_PTS_REF: &str = "AXIS_PTS_REF";
const KW_BIT_MASK: &str = "BIT_MASK";
const KW_BYTE_ORDER: &str = "BYTE_ORDER";
const KW_DEPOSIT: &str = "DEPOSIT";
const KW_ECU_ADDRESS: &str = "ECU_ADDRESS";
const KW_FORMAT: &str = "FORMAT";

// AXIS_DESCR header fields of the first axis and of every further axis
const FIRST_AXIS_KEYS: [&str; 6] = [
    keys::AXIS_X_TYPE,
    keys::AXIS_X_INPUT,
    keys::AXIS_X_CONVERSION,
    keys::AXIS_X_NUMBER_OF_POINTS,
    keys::AXIS_X_LOWER_LIMIT,
    keys::AXIS_X_UPPER_LIMIT,
];
const OTHER_AXIS_KEYS: [&str; 6] = [
    keys::AXIS_Y_TYPE,
    keys::AXIS2_INPUT,
    keys::AXIS_Y_CONVERSION,
    keys::AXIS2_NUMBER_OF_POINTS,
    keys::AXIS2_LOWER_LIMIT,
    keys::AXIS2_UPPER_LIMIT,
];

/// A recognized directive. Only directives that are meaningful in the current state are recognized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Directive<'t> {
    // block openers carry the optional inline name
    BeginCharacteristic(&'t str),
    BeginMeasurement(&'t str),
    BeginCompuMethod(&'t str),
    BeginMemoryRegion,
    BeginAxisPts(&'t str),
    BeginAxisDescr,
    EndBlock,
    EcuAddress(&'t str),
    Format(&'t str),
    ByteOrder(&'t str),
    BitMask(&'t str),
    AxisPtsRef(&'t str),
    Deposit,
    Other,
}

impl<'t> Directive<'t> {
    fn classify(text: &'t str, state: ParserState) -> Self {
        match state {
            ParserState::None => Self::classify_toplevel(text),
            ParserState::BeginCharacteristic | ParserState::BeginMeasurement => {
                if contains_ignore_case(text, END_CHARACTERISTIC)
                    || contains_ignore_case(text, END_MEASUREMENT)
                {
                    Directive::EndBlock
                } else if let Some(value) = strip_keyword(text, KW_ECU_ADDRESS) {
                    Directive::EcuAddress(value)
                } else if let Some(value) = strip_keyword(text, KW_FORMAT) {
                    Directive::Format(value)
                } else if let Some(value) = strip_keyword(text, KW_BYTE_ORDER) {
                    Directive::ByteOrder(value)
                } else if let Some(value) = strip_keyword(text, KW_BIT_MASK) {
                    Directive::BitMask(value)
                } else if strip_keyword(text, BEGIN_AXIS_DESCR).is_some() {
                    Directive::BeginAxisDescr
                } else {
                    Directive::Other
                }
            }
            ParserState::InAxisDescr => {
                if contains_ignore_case(text, END_AXIS_DESCR) {
                    Directive::EndBlock
                } else if let Some(value) = strip_keyword(text, KW_FORMAT) {
                    Directive::Format(value)
                } else if let Some(value) = strip_keyword(text, KW_BYTE_ORDER) {
                    Directive::ByteOrder(value)
                } else if let Some(value) = strip_keyword(text, KW_AXIS_PTS_REF) {
                    Directive::AxisPtsRef(value)
                } else {
                    Directive::Other
                }
            }
            ParserState::BeginAxisPts => {
                if contains_ignore_case(text, END_AXIS_PTS) {
                    Directive::EndBlock
                } else if let Some(value) = strip_keyword(text, KW_FORMAT) {
                    Directive::Format(value)
                } else if let Some(value) = strip_keyword(text, KW_BYTE_ORDER) {
                    Directive::ByteOrder(value)
                } else if strip_keyword(text, KW_DEPOSIT).is_some() {
                    Directive::Deposit
                } else {
                    Directive::Other
                }
            }
            // COMPU_METHOD and MEMORY_REGION blocks are read in one go and never see a token here
            ParserState::BeginCompuMethod | ParserState::BeginMemoryRegion => Directive::Other,
        }
    }

    fn classify_toplevel(text: &'t str) -> Self {
        if let Some(name) = value_after_directive(text, BEGIN_CHARACTERISTIC) {
            Directive::BeginCharacteristic(name)
        } else if let Some(name) = value_after_directive(text, BEGIN_MEASUREMENT) {
            Directive::BeginMeasurement(name)
        } else if let Some(name) = value_after_directive(text, BEGIN_COMPU_METHOD) {
            Directive::BeginCompuMethod(name)
        } else if contains_ignore_case(text, BEGIN_MEMORY_REGION) {
            Directive::BeginMemoryRegion
        } else if let Some(name) = value_after_directive(text, BEGIN_AXIS_PTS) {
            Directive::BeginAxisPts(name)
        } else {
            Directive::Other
        }
    }
}

struct ParseContext<'a, 'o, S: AsRef<str>> {
    reader: TokenReader<'a, S>,
    filename: &'o str,
    options: &'o ParseOptions,
    graph: RootGraph,
    state: ParserState,
    previous_state: ParserState,
    current: Option<Entry>,
    block_line: u32,
    first_axis: bool,
    index_counter: u32,
    entry_count: u32,
}

/// parse a sequence of lines into a root graph
///
/// `filename` is only used in error messages.
pub(crate) fn parse_lines<S: AsRef<str>>(
    lines: &[S],
    filename: &str,
    options: &ParseOptions,
) -> Result<ParseResult, ParserError> {
    log::debug!(
        "parsing {filename}: {} lines, start index {}",
        lines.len(),
        options.start_index
    );
    let context = ParseContext {
        reader: TokenReader::new(lines),
        filename,
        options,
        graph: RootGraph::new(),
        state: ParserState::None,
        previous_state: ParserState::None,
        current: None,
        block_line: 0,
        first_axis: true,
        index_counter: options.start_index,
        entry_count: 0,
    };
    let result = context.run()?;
    log::debug!(
        "parsed {filename}: {} entries, {} compu methods, {} memory regions, {} axis points; next index {}",
        result.graph.entries.len(),
        result.graph.compu_methods.len(),
        result.graph.memory_regions.len(),
        result.graph.axis_pts_refs.len(),
        result.next_index
    );
    Ok(result)
}

impl<'a, S: AsRef<str>> ParseContext<'a, '_, S> {
    fn run(mut self) -> Result<ParseResult, ParserError> {
        while let Some(token) = self.reader.next_token() {
            match Directive::classify(&token.text, self.state) {
                Directive::BeginCharacteristic(name) => self.begin_characteristic(&token, name)?,
                Directive::BeginMeasurement(name) => self.begin_measurement(&token, name)?,
                Directive::BeginCompuMethod(name) => self.compu_method(&token, name)?,
                Directive::BeginMemoryRegion => self.memory_region(&token)?,
                Directive::BeginAxisPts(name) => self.begin_axis_pts(&token, name)?,
                Directive::BeginAxisDescr => self.begin_axis_descr()?,
                Directive::EndBlock => self.end_block()?,
                Directive::EcuAddress(value) => self.ecu_address(&token, value)?,
                Directive::Format(value) => self.format(value),
                Directive::ByteOrder(value) => self.byte_order(value),
                Directive::BitMask(value) => self.set_field(keys::BIT_MASK, value),
                Directive::AxisPtsRef(value) => {
                    let key = self.axis_key(keys::AXIS_X_AXIS_PTS, keys::AXIS_Y_AXIS_PTS);
                    self.set_field(key, value);
                }
                // accepted, but not stored
                Directive::Deposit | Directive::Other => {}
            }
        }

        if self.state != ParserState::None {
            let outer = if self.state == ParserState::InAxisDescr {
                self.previous_state
            } else {
                self.state
            };
            return Err(ParserError::UnterminatedBlock {
                filename: self.filename.to_string(),
                error_line: self.block_line,
                block: outer.block_name().to_string(),
            });
        }

        Ok(ParseResult {
            graph: self.graph,
            next_index: self.index_counter,
        })
    }

    fn begin_characteristic(&mut self, begin: &LineToken, name: &str) -> Result<(), ParserError> {
        self.state = ParserState::BeginCharacteristic;
        self.block_line = begin.line;
        let mut entry = Entry::new(SourceType::A2l, FieldType::Characteristic);

        let name = self.inline_or_next(name, "name")?;
        entry.set(keys::NAME, name);
        entry.set(keys::IDENTIFIER, self.expect_token("identifier")?.text);
        entry.set(keys::DATA_TYPE, self.expect_token("data type")?.text);

        let address_token = self.expect_token("address")?;
        self.check_address(&address_token.text, address_token.line, "characteristic")?;
        entry.set(keys::ADDRESS, address_token.text.as_str());
        entry.set(keys::INDEX, self.next_index());
        entry.set(
            keys::ADDRESS_ORIGINAL,
            address_original(address_token.raw, &address_token.text),
        );

        let layout_token = self.expect_token("record layout")?;
        entry.set(keys::RECORD_TYPE, self.record_type(&layout_token)?);
        entry.set(keys::MAX_DIFF, self.expect_token("max diff")?.text);
        entry.set(keys::CONVERSION, self.expect_token("conversion")?.text);
        entry.set(keys::LOWER_LIMIT, self.expect_number("lower limit")?);
        entry.set(keys::UPPER_LIMIT, self.expect_number("upper limit")?);

        self.current = Some(entry);
        Ok(())
    }

    fn begin_measurement(&mut self, begin: &LineToken, name: &str) -> Result<(), ParserError> {
        self.state = ParserState::BeginMeasurement;
        self.block_line = begin.line;
        let mut entry = Entry::new(SourceType::A2l, FieldType::Measurement);

        let name = self.inline_or_next(name, "name")?;
        entry.set(keys::NAME, name);
        entry.set(keys::IDENTIFIER, self.expect_token("identifier")?.text);
        let datatype_token = self.expect_token("data type")?;
        entry.set(keys::RECORD_TYPE, self.record_type(&datatype_token)?);
        entry.set(keys::CONVERSION, self.expect_token("conversion")?.text);
        entry.set(keys::RESOLUTION, self.expect_token("resolution")?.text);
        entry.set(keys::ACCURACY, self.expect_token("accuracy")?.text);
        entry.set(keys::LOWER_LIMIT, self.expect_number("lower limit")?);
        entry.set(keys::UPPER_LIMIT, self.expect_number("upper limit")?);

        self.current = Some(entry);
        Ok(())
    }

    // COMPU_METHOD blocks have a fixed layout and are stored immediately
    fn compu_method(&mut self, begin: &LineToken, name: &str) -> Result<(), ParserError> {
        self.state = ParserState::BeginCompuMethod;
        self.block_line = begin.line;
        let mut entry = Entry::new(SourceType::A2l, FieldType::CompuMethod);

        let name = self.inline_or_next(name, "name")?;
        entry.set(keys::NAME, name.as_str());
        entry.set(keys::IDENTIFIER, self.expect_token("identifier")?.text);
        entry.set(keys::DATA_TYPE, self.expect_token("data type")?.text);
        entry.set(keys::FORMAT, self.expect_token("format")?.text);
        entry.set(keys::UNITS, self.expect_token("units")?.text);
        entry.set(keys::COEFFICIENTS, self.expect_token("coefficients")?.text);
        self.graph.compu_methods.insert(name, entry);

        self.consume_end(END_COMPU_METHOD)?;
        self.state = ParserState::None;
        Ok(())
    }

    // MEMORY_REGION blocks consist of a single line with five fields
    fn memory_region(&mut self, begin: &LineToken) -> Result<(), ParserError> {
        self.state = ParserState::BeginMemoryRegion;
        self.block_line = begin.line;

        let content = self.expect_token("memory region content")?;
        let fields: Vec<&str> = content.text.split_whitespace().collect();
        let [name, virtual_address, physical_address, size, _] = fields[..] else {
            return Err(ParserError::MalformedMemoryRegion {
                filename: self.filename.to_string(),
                error_line: content.line,
                text: content.text.clone(),
                fields: fields.len(),
            });
        };
        self.check_hex(virtual_address, content.line, "memory region virtual address")?;
        self.check_hex(physical_address, content.line, "memory region physical address")?;
        self.check_hex(size, content.line, "memory region size")?;

        let mut entry = Entry::new(SourceType::A2l, FieldType::MemoryRegion);
        entry.set(keys::NAME, name);
        entry.set(keys::ADDRESS_START, virtual_address);
        entry.set(keys::ADDRESS_LENGTH, physical_address);
        entry.set(keys::FORMAT, size);
        self.graph.memory_regions.insert(name.to_string(), entry);

        self.consume_end(END_MEMORY_REGION)?;
        self.state = ParserState::None;
        Ok(())
    }

    fn begin_axis_pts(&mut self, begin: &LineToken, name: &str) -> Result<(), ParserError> {
        self.state = ParserState::BeginAxisPts;
        self.block_line = begin.line;
        let mut entry = Entry::new(SourceType::A2l, FieldType::AxisPts);

        let name = self.inline_or_next(name, "name")?;
        entry.set(keys::NAME, name);
        entry.set(keys::IDENTIFIER, self.expect_token("identifier")?.text);

        // the address of an AXIS_PTS block does not take part in the index numbering
        let address_token = self.expect_token("address")?;
        self.check_address(&address_token.text, address_token.line, "axis pts")?;
        entry.set(keys::ADDRESS, address_token.text.as_str());
        entry.set(
            keys::ADDRESS_ORIGINAL,
            address_original(address_token.raw, &address_token.text),
        );

        entry.set(keys::AXIS_INPUT_0, self.expect_token("input quantity")?.text);
        let layout_token = self.expect_token("record layout")?;
        entry.set(keys::RECORD_TYPE, self.record_type(&layout_token)?);
        entry.set(keys::MAX_DIFF, self.expect_number("max diff")?);
        entry.set(keys::AXIS_CONVERSION_0, self.expect_token("conversion")?.text);
        entry.set(keys::AXIS_NUMBER_OF_POINTS_0, self.expect_integer("number of points")?);
        entry.set(keys::AXIS_LOWER_LIMIT_0, self.expect_number("lower limit")?);
        entry.set(keys::AXIS_UPPER_LIMIT_0, self.expect_number("upper limit")?);

        self.current = Some(entry);
        Ok(())
    }

    fn begin_axis_descr(&mut self) -> Result<(), ParserError> {
        self.previous_state = self.state;
        self.state = ParserState::InAxisDescr;

        // the line after /begin AXIS_DESCR is always discarded, even if it is only a comment
        if !self.reader.skip_line() {
            return Err(self.missing_field("axis description line"));
        }

        let values: [Value; 6] = [
            self.expect_token("axis type")?.text.into(),
            self.expect_token("input quantity")?.text.into(),
            self.expect_token("conversion")?.text.into(),
            self.expect_integer("number of points")?.into(),
            self.expect_token("lower limit")?.text.into(),
            self.expect_token("upper limit")?.text.into(),
        ];
        let axis_keys = if self.first_axis {
            FIRST_AXIS_KEYS
        } else {
            OTHER_AXIS_KEYS
        };
        for (key, value) in axis_keys.into_iter().zip(values) {
            self.set_field(key, value);
        }
        Ok(())
    }

    fn end_block(&mut self) -> Result<(), ParserError> {
        match self.state {
            ParserState::BeginCharacteristic | ParserState::BeginMeasurement => {
                self.state = ParserState::None;
                self.first_axis = true;
                if let Some(entry) = self.current.take() {
                    let name = entry.name().to_string();
                    if !name.trim().is_empty() && !self.options.is_suppressed(&name) {
                        self.entry_count += 1;
                        if self.entry_count > MAX_A2L_ENTRIES {
                            return Err(ParserError::TooManyEntries {
                                max: MAX_A2L_ENTRIES,
                            });
                        }
                        self.graph.entries.insert(name, entry);
                    }
                }
            }
            ParserState::InAxisDescr => {
                self.first_axis = false;
                self.state = self.previous_state;
            }
            ParserState::BeginAxisPts => {
                self.state = ParserState::None;
                if let Some(entry) = self.current.take() {
                    let name = entry.name().to_string();
                    if !name.trim().is_empty() {
                        self.graph.axis_pts_refs.insert(name, entry);
                    }
                }
            }
            ParserState::None | ParserState::BeginCompuMethod | ParserState::BeginMemoryRegion => {}
        }
        Ok(())
    }

    fn ecu_address(&mut self, token: &LineToken, value: &str) -> Result<(), ParserError> {
        let address = unquote(value.trim());
        self.check_address(address, token.line, "ECU_ADDRESS")?;
        let index = self.next_index();
        self.set_field(keys::ADDRESS, address);
        self.set_field(keys::INDEX, index);
        Ok(())
    }

    fn format(&mut self, value: &str) {
        let key = match self.state {
            ParserState::InAxisDescr => self.axis_key(keys::AXIS_X_FORMAT, keys::AXIS_Y_FORMAT),
            _ => keys::FORMAT,
        };
        self.set_field(key, strip_boundary_quotes(value));
    }

    fn byte_order(&mut self, value: &str) {
        match self.state {
            ParserState::BeginCharacteristic | ParserState::BeginMeasurement => {
                self.set_field(keys::BYTE_ORDER, value);
            }
            ParserState::InAxisDescr => {
                let key = self.axis_key(keys::AXIS_X_BYTE_ORDER, keys::AXIS_Y_BYTE_ORDER);
                self.set_field(key, value);
            }
            // BYTE_ORDER of an AXIS_PTS block is not stored
            _ => {}
        }
    }

    fn set_field<V: Into<Value>>(&mut self, key: &str, value: V) {
        if let Some(entry) = &mut self.current {
            entry.set(key, value);
        }
    }

    fn axis_key(&self, first: &'static str, other: &'static str) -> &'static str {
        if self.first_axis { first } else { other }
    }

    fn next_index(&mut self) -> u32 {
        let index = self.index_counter;
        self.index_counter = self.index_counter.saturating_add(1);
        index
    }

    // the name of a block is either given on the same line as /begin, or on the next line
    fn inline_or_next(&mut self, inline_name: &str, what: &str) -> Result<String, ParserError> {
        if inline_name.is_empty() {
            Ok(self.expect_token(what)?.text)
        } else {
            Ok(inline_name.to_string())
        }
    }

    fn expect_token(&mut self, what: &str) -> Result<LineToken<'a>, ParserError> {
        self.reader
            .next_token()
            .ok_or_else(|| self.missing_field(what))
    }

    fn expect_number(&mut self, what: &str) -> Result<Value, ParserError> {
        let token = self.expect_token(what)?;
        parse_number(&token.text).ok_or_else(|| self.malformed_number(&token))
    }

    fn expect_integer(&mut self, what: &str) -> Result<i64, ParserError> {
        let token = self.expect_token(what)?;
        parse_integer(&token.text).ok_or_else(|| self.malformed_number(&token))
    }

    fn consume_end(&mut self, expected: &str) -> Result<(), ParserError> {
        let token = self.expect_token(expected)?;
        if !contains_ignore_case(&token.text, expected) {
            log::warn!(
                "{}:{}: expected {expected}, but found \"{}\"; the token was consumed",
                self.filename,
                token.line,
                token.text
            );
        }
        Ok(())
    }

    fn record_type(&self, token: &LineToken) -> Result<&'static str, ParserError> {
        resolve_record_type(&token.text)
            .map(|record_type| record_type.as_str())
            .ok_or_else(|| ParserError::UnsupportedType {
                filename: self.filename.to_string(),
                error_line: token.line,
                tag: token.text.clone(),
            })
    }

    fn check_address(&self, address: &str, line: u32, context: &str) -> Result<(), ParserError> {
        if is_hex(address) {
            Ok(())
        } else {
            Err(ParserError::InvalidAddress {
                filename: self.filename.to_string(),
                error_line: line,
                context: context.to_string(),
                address: address.to_string(),
            })
        }
    }

    fn check_hex(&self, value: &str, line: u32, context: &str) -> Result<(), ParserError> {
        if is_hex(value) {
            Ok(())
        } else {
            Err(ParserError::InvalidHexValue {
                filename: self.filename.to_string(),
                error_line: line,
                context: context.to_string(),
                value: value.to_string(),
            })
        }
    }

    fn missing_field(&self, what: &str) -> ParserError {
        ParserError::MissingField {
            filename: self.filename.to_string(),
            error_line: self.block_line,
            block: self.state.block_name().to_string(),
            what: what.to_string(),
        }
    }

    fn malformed_number(&self, token: &LineToken) -> ParserError {
        ParserError::MalformedNumber {
            filename: self.filename.to_string(),
            error_line: token.line,
            text: token.text.clone(),
        }
    }
}

fn is_hex(text: &str) -> bool {
    HEX_PATTERN.is_match(text)
}

// ASCII lowercasing keeps all byte offsets intact
fn find_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .to_ascii_lowercase()
        .find(&needle.to_ascii_lowercase())
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    find_ignore_case(haystack, needle).is_some()
}

// the text following a directive, with one layer of quotes removed
fn value_after_directive<'t>(text: &'t str, directive: &str) -> Option<&'t str> {
    let pos = find_ignore_case(text, directive)?;
    Some(unquote(text[pos + directive.len()..].trim()))
}

// match a keyword at the start of the text; the keyword must be followed by whitespace or the end of the text
fn strip_keyword<'t>(text: &'t str, keyword: &str) -> Option<&'t str> {
    let head = text.get(..keyword.len())?;
    if !head.eq_ignore_ascii_case(keyword) {
        return None;
    }
    let rest = &text[keyword.len()..];
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

// remove a leading and a trailing quote independently of each other
fn strip_boundary_quotes(text: &str) -> &str {
    let text = text.trim();
    let text = text.strip_prefix('"').unwrap_or(text);
    text.strip_suffix('"').unwrap_or(text)
}

// address_original()
// Reconstruct the descriptive label of an address line, e.g. "/* ECU Address */ 0x1234" or
// "0x1234 /* Address */".
fn address_original(raw: &str, address: &str) -> String {
    let normalized = raw
        .replace(&format!(" {address} "), " ")
        .replace("/*", "")
        .replace("*/", "");
    let normalized = normalized.trim();

    if let Some(rest) = strip_prefix_ignore_case(normalized, "Address") {
        rest.trim().to_string()
    } else if let Some(rest) = strip_prefix_ignore_case(normalized, "ECU Address") {
        format!("ECU Address  {}", rest.trim())
    } else {
        normalized.to_string()
    }
}

fn strip_prefix_ignore_case<'t>(text: &'t str, prefix: &str) -> Option<&'t str> {
    let head = text.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&text[prefix.len()..])
    } else {
        None
    }
}

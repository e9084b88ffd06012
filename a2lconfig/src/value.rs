use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;

/// A single field value of an entry
///
/// The legacy output format stores each field as either a string or a number.
/// Numbers that have no fractional part are always stored as integers.
/// Values read from json files can also be booleans, lists, nested objects or null;
/// these are kept as they are.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Null,
}

impl Value {
    /// get the value as a string slice, if it is a Text value
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    /// get the value as an integer, if it is an Integer value
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(num) => Some(*num),
            _ => None,
        }
    }

    /// get the value as a float. Integers are converted
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(num) => Some(*num as f64),
            Value::Float(num) => Some(*num),
            _ => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Text(text) => f.write_str(text),
            Value::Integer(num) => write!(f, "{num}"),
            Value::Float(num) => write!(f, "{num}"),
            Value::Bool(flag) => write!(f, "{flag}"),
            Value::Null => f.write_str("null"),
            Value::List(_) | Value::Map(_) => {
                let text = serde_json::to_string(self).map_err(|_| std::fmt::Error)?;
                f.write_str(&text)
            }
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

/// parse a base-10 integer. Surrounding whitespace is ignored, any other garbage is an error
pub(crate) fn parse_integer(text: &str) -> Option<i64> {
    text.trim().parse::<i64>().ok()
}

/// parse a decimal number
///
/// The text must be a plain decimal number with an optional sign, fraction and exponent.
/// After trailing zeros have been stripped, a value without a fractional part becomes
/// an Integer, anything else becomes a Float. Integral values outside the range of i64
/// are rejected.
pub(crate) fn parse_number(text: &str) -> Option<Value> {
    let text = text.trim();
    let decimal = DecimalParts::scan(text)?;

    if decimal.is_integral() {
        decimal.to_integer().map(Value::Integer)
    } else {
        text.parse::<f64>()
            .ok()
            .filter(|num| num.is_finite())
            .map(Value::Float)
    }
}

// digits of a decimal number without the decimal point; value = digits * 10^(-scale)
struct DecimalParts<'a> {
    negative: bool,
    int_digits: &'a str,
    frac_digits: &'a str,
    exponent: i64,
}

impl<'a> DecimalParts<'a> {
    fn scan(text: &'a str) -> Option<Self> {
        let (negative, rest) = match text.as_bytes().first()? {
            b'-' => (true, &text[1..]),
            b'+' => (false, &text[1..]),
            _ => (false, text),
        };

        let (mantissa, exponent) = match rest.find(['e', 'E']) {
            Some(pos) => {
                let exptext = &rest[pos + 1..];
                let expdigits = exptext.strip_prefix(['+', '-']).unwrap_or(exptext);
                if expdigits.is_empty() || !expdigits.bytes().all(|c| c.is_ascii_digit()) {
                    return None;
                }
                (&rest[..pos], exptext.parse::<i64>().ok()?)
            }
            None => (rest, 0),
        };

        let (int_digits, frac_digits) = match mantissa.split_once('.') {
            Some((int_digits, frac_digits)) => (int_digits, frac_digits),
            None => (mantissa, ""),
        };
        if int_digits.is_empty() && frac_digits.is_empty() {
            return None;
        }
        if !int_digits.bytes().all(|c| c.is_ascii_digit())
            || !frac_digits.bytes().all(|c| c.is_ascii_digit())
        {
            return None;
        }

        Some(Self {
            negative,
            int_digits,
            frac_digits,
            exponent,
        })
    }

    // significant digits without leading and trailing zeros, and the power of ten they are scaled by
    fn significant(&self) -> (String, i64) {
        let digits: String = self
            .int_digits
            .chars()
            .chain(self.frac_digits.chars())
            .collect();
        let digits = digits.trim_start_matches('0');
        let significant = digits.trim_end_matches('0');
        let stripped_zeros = (digits.len() - significant.len()) as i64;
        let scale = (self.frac_digits.len() as i64)
            .saturating_sub(self.exponent)
            .saturating_sub(stripped_zeros);
        (significant.to_string(), scale)
    }

    fn is_integral(&self) -> bool {
        let (significant, scale) = self.significant();
        significant.is_empty() || scale <= 0
    }

    // the exact integer value, or None if the value has a fractional part or does not fit into i64
    fn to_integer(&self) -> Option<i64> {
        let (significant, scale) = self.significant();
        if significant.is_empty() {
            return Some(0);
        }
        // 10^19 already exceeds the range of i64
        if scale > 0 || scale < -19 {
            return None;
        }

        let mut value: i64 = 0;
        for digit in significant.bytes() {
            value = value
                .checked_mul(10)?
                .checked_sub(i64::from(digit - b'0'))?;
        }
        for _ in 0..(-scale) {
            value = value.checked_mul(10)?;
        }
        // accumulated as a negative number, so that i64::MIN can be represented
        if self.negative {
            Some(value)
        } else {
            value.checked_neg()
        }
    }
}

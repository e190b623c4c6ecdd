//! Path parameter coercion.
//!
//! Captures made only of ASCII digits become integers; digits with exactly one
//! decimal point become floats; everything else stays a string. The raw capture is
//! always kept so string-typed parameters see the exact text (`"007"` stays `"007"`).

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Str(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub raw: String,
    pub value: ParamValue,
}

impl Param {
    pub fn new(name: impl Into<String>, raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let value = coerce(&raw);
        Self { name: name.into(), raw, value }
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.raw)
    }
}

pub fn coerce(raw: &str) -> ParamValue {
    let digits = raw.bytes().filter(u8::is_ascii_digit).count();
    let dots = raw.bytes().filter(|b| *b == b'.').count();
    let numeric_shape = digits > 0 && digits + dots == raw.len();

    if numeric_shape && dots == 0 {
        // Out-of-range integers stay strings
        if let Ok(n) = raw.parse::<i64>() {
            return ParamValue::Int(n);
        }
    } else if numeric_shape && dots == 1 {
        if let Ok(x) = raw.parse::<f64>() {
            return ParamValue::Float(x);
        }
    }
    ParamValue::Str(raw.to_string())
}

/// Conversion from a coerced path parameter into a handler argument.
pub trait FromParam: Sized {
    fn from_param(param: Param) -> Option<Self>;
}

impl FromParam for i64 {
    fn from_param(param: Param) -> Option<Self> {
        match param.value {
            ParamValue::Int(n) => Some(n),
            _ => None,
        }
    }
}

impl FromParam for f64 {
    fn from_param(param: Param) -> Option<Self> {
        match param.value {
            ParamValue::Int(n) => Some(n as f64),
            ParamValue::Float(x) => Some(x),
            ParamValue::Str(_) => None,
        }
    }
}

impl FromParam for String {
    fn from_param(param: Param) -> Option<Self> {
        Some(param.raw)
    }
}

impl FromParam for ParamValue {
    fn from_param(param: Param) -> Option<Self> {
        Some(param.value)
    }
}

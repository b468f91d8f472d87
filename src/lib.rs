//
//  lib.rs
//
//  Rust library for serializing and de-serializing data in
//  Linden Lab Structured Data format.
//
//  Format documentation is at http://wiki.secondlife.com/wiki/LLSD
//
//  License: LGPL.
//
//
//  Modules
//
pub mod codec;
pub mod convert;
pub mod de;
pub mod error;
pub mod sax;
pub mod ser;


pub use crate::{
    de::from_bytes,
    error::LLSDError,
    sax::{LLSDHandler, LLSDTreeBuilder},
    ser::{format, LLSDFormat},
};

use enum_as_inner::EnumAsInner;
use indexmap::IndexMap;
use uuid::Uuid;

/// The keyed container behind `LLSDValue::Map`.
///
/// Insertion order is preserved, which the XML and notation encodings need
/// for deterministic output. Inserting an existing key overwrites the prior
/// binding and leaves the entry count unchanged.
pub type LLSDMap = IndexMap<String, LLSDValue>;

/// The primitive LLSD data item.
/// Serialization takes a tree of these.
/// Deserialization returns a tree of these.
///
/// Dates are seconds since the Unix epoch as a 64-bit real, with
/// millisecond precision preserved across the wire. String and URI
/// payloads are valid UTF-8; Binary is arbitrary bytes.
#[derive(Debug, Clone, PartialEq, EnumAsInner)]
pub enum LLSDValue {
    Undefined,
    Boolean(bool),
    Real(f64),
    Integer(i32),
    UUID(Uuid),
    String(String),
    Date(f64),
    URI(String),
    Binary(Vec<u8>),
    Map(LLSDMap),
    Array(Vec<LLSDValue>),
}

/// The runtime kind tag of an `LLSDValue`, detached from any payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LLSDType {
    Undefined,
    Boolean,
    Real,
    Integer,
    UUID,
    String,
    Date,
    URI,
    Binary,
    Map,
    Array,
}

impl std::fmt::Display for LLSDType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        //  Lowercase names, matching the XML tag set.
        let name = match self {
            LLSDType::Undefined => "undef",
            LLSDType::Boolean => "boolean",
            LLSDType::Real => "real",
            LLSDType::Integer => "integer",
            LLSDType::UUID => "uuid",
            LLSDType::String => "string",
            LLSDType::Date => "date",
            LLSDType::URI => "uri",
            LLSDType::Binary => "binary",
            LLSDType::Map => "map",
            LLSDType::Array => "array",
        };
        write!(f, "{}", name)
    }
}

impl Default for LLSDValue {
    /// The "undefined" singleton of LLSD is just the default value here.
    fn default() -> Self {
        LLSDValue::Undefined
    }
}

impl LLSDValue {
    /// Kind tag of this value.
    pub fn llsd_type(&self) -> LLSDType {
        match self {
            LLSDValue::Undefined => LLSDType::Undefined,
            LLSDValue::Boolean(_) => LLSDType::Boolean,
            LLSDValue::Real(_) => LLSDType::Real,
            LLSDValue::Integer(_) => LLSDType::Integer,
            LLSDValue::UUID(_) => LLSDType::UUID,
            LLSDValue::String(_) => LLSDType::String,
            LLSDValue::Date(_) => LLSDType::Date,
            LLSDValue::URI(_) => LLSDType::URI,
            LLSDValue::Binary(_) => LLSDType::Binary,
            LLSDValue::Map(_) => LLSDType::Map,
            LLSDValue::Array(_) => LLSDType::Array,
        }
    }

    /// Element count for an array, entry count for a map.
    /// `None` for every scalar kind.
    pub fn size(&self) -> Option<usize> {
        match self {
            LLSDValue::Array(items) => Some(items.len()),
            LLSDValue::Map(entries) => Some(entries.len()),
            _ => None,
        }
    }

    /// Append a value to an array, taking ownership of it.
    pub fn push(&mut self, value: LLSDValue) -> Result<(), LLSDError> {
        match self {
            LLSDValue::Array(items) => {
                items.push(value);
                Ok(())
            }
            other => Err(LLSDError::structure(format!(
                "append to a {}, not an array",
                other.llsd_type()
            ))),
        }
    }

    /// Insert a key/value pair into a map, taking ownership of both.
    /// An existing binding under the same key is displaced and returned;
    /// the map's size and the key's position are unchanged in that case.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: LLSDValue,
    ) -> Result<Option<LLSDValue>, LLSDError> {
        match self {
            LLSDValue::Map(entries) => Ok(entries.insert(key.into(), value)),
            other => Err(LLSDError::structure(format!(
                "insert into a {}, not a map",
                other.llsd_type()
            ))),
        }
    }
}

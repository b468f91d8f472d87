//! Serialization. Converts a tree of LLSDValue structs to any of the
//! LLSD wire encodings.
pub mod binary;
pub mod notation;
pub mod xml;

use crate::error::LLSDError;
use crate::LLSDValue;
use std::io::Write;

/// The wire encodings `format` can be asked for. JSON is part of the
/// encoding enumeration but has no serializer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LLSDFormat {
    Binary,
    Xml,
    Notation,
    Json,
}

/// Serialize a value in the requested encoding, signature included.
/// The output is accepted by `de::from_bytes` without being told the
/// encoding.
pub fn format<W: Write>(
    value: &LLSDValue,
    fmt: LLSDFormat,
    writer: &mut W,
) -> Result<(), LLSDError> {
    match fmt {
        LLSDFormat::Binary => binary::to_writer(writer, value),
        LLSDFormat::Xml => xml::to_writer(writer, value, false),
        LLSDFormat::Notation => notation::to_writer(writer, value),
        LLSDFormat::Json => Err(LLSDError::UnsupportedEncoding("JSON")),
    }
}

// Unit tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jsonisrejected() {
        let mut out: Vec<u8> = Vec::new();
        assert!(matches!(
            format(&LLSDValue::Integer(1), LLSDFormat::Json, &mut out),
            Err(LLSDError::UnsupportedEncoding("JSON"))
        ));
        assert!(out.is_empty());
    }

    #[test]
    fn everyencodingroundtrips() {
        let mut map = crate::LLSDMap::new();
        map.insert("name".to_string(), LLSDValue::String("test".to_string()));
        map.insert("count".to_string(), LLSDValue::Integer(3));
        let value = LLSDValue::Array(vec![LLSDValue::Map(map), LLSDValue::Boolean(false)]);
        for fmt in [LLSDFormat::Binary, LLSDFormat::Xml, LLSDFormat::Notation] {
            let mut out: Vec<u8> = Vec::new();
            format(&value, fmt, &mut out).unwrap();
            assert_eq!(crate::de::from_bytes(&out).unwrap(), value, "{:?}", fmt);
        }
    }
}

//
//  error.rs -- error taxonomy for LLSD parsing and formatting.
//
//  Library for serializing and de-serializing data in
//  Linden Lab Structured Data format.
//
//  Format documentation is at http://wiki.secondlife.com/wiki/LLSD
//
//  License: LGPL.
//
use thiserror::Error;

/// Everything that can go wrong while parsing or formatting LLSD.
///
/// Coercion failures are not represented here; conversions between value
/// kinds always produce the target kind's default and log a warning.
#[derive(Debug, Error)]
pub enum LLSDError {
    /// Input ended in the middle of a record or element.
    #[error("unexpected end of input while reading {0}")]
    TruncatedInput(&'static str),

    /// The binary encoding contained a type byte outside the record table.
    #[error("unknown type byte {byte:#04x} at record {offset}")]
    UnknownTypeByte { byte: u8, offset: u64 },

    /// The XML encoding contained a tag outside the LLSD tag set.
    #[error("unknown tag <{0}>")]
    UnknownTag(String),

    /// A payload that could not be decoded: bad hex in a UUID, a base
    /// decode failure, integer overflow, an unparseable date.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// A structural violation: terminator without opener, key outside a
    /// map, non-string key, value in a key position.
    #[error("structure error: {0}")]
    StructureError(String),

    /// An encoding that is recognized but not implemented (JSON).
    #[error("{0} encoding is not supported")]
    UnsupportedEncoding(&'static str),

    /// A SAX callback returned `false`, stopping the parse.
    #[error("parse aborted by consumer")]
    Aborted,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
}

impl LLSDError {
    /// Shorthand used by the payload decoders.
    pub(crate) fn malformed(what: impl std::fmt::Display) -> Self {
        LLSDError::MalformedPayload(what.to_string())
    }

    /// Shorthand used by the parsers and the tree builder.
    pub(crate) fn structure(what: impl std::fmt::Display) -> Self {
        LLSDError::StructureError(what.to_string())
    }
}

//
//  convert.rs -- coercions between LLSD value kinds.
//
//  Library for serializing and de-serializing data in
//  Linden Lab Structured Data format.
//
//  Format documentation is at http://wiki.secondlife.com/wiki/LLSD
//
//  Every coercion is total: a conversion outside the defined table
//  produces the target kind's default value and logs a warning, never
//  undefined behavior.
//
//  License: LGPL.
//
use crate::{LLSDType, LLSDValue};

/// Warn once per illegal conversion site.
fn illegal(from: LLSDType, to: &str) {
    log::warn!("illegal conversion of {} to {}", from, to);
}

impl LLSDValue {
    /// Coerce to a boolean. Numbers are true when nonzero, byte-carrying
    /// kinds when non-empty, UUIDs when not the zero UUID.
    pub fn to_boolean(&self) -> bool {
        match self {
            LLSDValue::Undefined => false,
            LLSDValue::Boolean(v) => *v,
            LLSDValue::Integer(v) => *v != 0,
            LLSDValue::Real(v) => *v != 0.0,
            LLSDValue::UUID(v) => !v.is_nil(),
            LLSDValue::String(v) => !v.is_empty(),
            LLSDValue::Binary(v) => !v.is_empty(),
            _ => {
                illegal(self.llsd_type(), "boolean");
                false
            }
        }
    }

    /// Coerce to an integer. Reals truncate; strings are scanned with
    /// trailing junk tolerated; binary takes its first 4 bytes big-endian.
    pub fn to_integer(&self) -> i32 {
        match self {
            LLSDValue::Undefined => 0,
            LLSDValue::Boolean(v) => *v as i32,
            LLSDValue::Integer(v) => *v,
            LLSDValue::Real(v) => *v as i32,
            LLSDValue::String(v) => crate::codec::integer_from_text(v).unwrap_or(0),
            LLSDValue::Binary(v) => match v.get(..4) {
                Some(head) => {
                    let mut be = [0u8; 4];
                    be.copy_from_slice(head);
                    i32::from_be_bytes(be)
                }
                None => {
                    log::warn!("binary shorter than 4 bytes converted to integer");
                    0
                }
            },
            _ => {
                illegal(self.llsd_type(), "integer");
                0
            }
        }
    }

    /// Coerce to a real. Strings are scanned with trailing junk
    /// tolerated; binary takes its first 8 bytes as a big-endian double.
    pub fn to_real(&self) -> f64 {
        match self {
            LLSDValue::Undefined => 0.0,
            LLSDValue::Boolean(v) => *v as i32 as f64,
            LLSDValue::Integer(v) => *v as f64,
            LLSDValue::Real(v) => *v,
            LLSDValue::String(v) => crate::codec::real_from_text(v).unwrap_or(0.0),
            LLSDValue::Binary(v) => match v.get(..8) {
                Some(head) => {
                    let mut be = [0u8; 8];
                    be.copy_from_slice(head);
                    f64::from_be_bytes(be)
                }
                None => {
                    log::warn!("binary shorter than 8 bytes converted to real");
                    0.0
                }
            },
            _ => {
                illegal(self.llsd_type(), "real");
                0.0
            }
        }
    }

    /// Coerce to string text. Reals render with six decimal places; UUIDs
    /// as 8-4-4-4-12 hex; binary as its raw bytes, lossily if they are
    /// not UTF-8.
    pub fn to_text(&self) -> String {
        match self {
            LLSDValue::Undefined => String::new(),
            LLSDValue::Boolean(v) => (if *v { "true" } else { "false" }).to_string(),
            LLSDValue::Integer(v) => v.to_string(),
            LLSDValue::Real(v) => format!("{:.6}", v),
            LLSDValue::UUID(v) => v.to_string(),
            LLSDValue::String(v) => v.clone(),
            LLSDValue::Binary(v) => String::from_utf8_lossy(v).into_owned(),
            _ => {
                illegal(self.llsd_type(), "string");
                String::new()
            }
        }
    }

    /// Coerce to bytes. Booleans become the ASCII digits `0`/`1`;
    /// integers and reals their big-endian encodings; UUIDs their 16 raw
    /// bytes.
    pub fn to_binary(&self) -> Vec<u8> {
        match self {
            LLSDValue::Undefined => Vec::new(),
            LLSDValue::Boolean(v) => (if *v { b"1" } else { b"0" }).to_vec(),
            LLSDValue::Integer(v) => v.to_be_bytes().to_vec(),
            LLSDValue::Real(v) => v.to_be_bytes().to_vec(),
            LLSDValue::UUID(v) => v.as_bytes().to_vec(),
            LLSDValue::String(v) => v.as_bytes().to_vec(),
            LLSDValue::Binary(v) => v.clone(),
            _ => {
                illegal(self.llsd_type(), "binary");
                Vec::new()
            }
        }
    }
}

// Unit tests

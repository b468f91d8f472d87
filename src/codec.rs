//
//  codec.rs -- text and byte codecs shared by the parsers and serializers.
//
//  Library for serializing and de-serializing data in
//  Linden Lab Structured Data format.
//
//  Format documentation is at http://wiki.secondlife.com/wiki/LLSD
//
//  base16/base64/base85 for binary payloads embedded in XML and notation,
//  ISO-8601 dates, and the tolerant numeric text scanners the text
//  encodings require.
//
//  License: LGPL.
//
use crate::error::LLSDError;
use base64::Engine;
use chrono::{SecondsFormat, TimeZone};
use uuid::Uuid;

/// Text encodings a `<binary>` element may carry.
/// The `encoding` attribute selects one; absent means base64.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryTextEncoding {
    Base16,
    Base64,
    Base85,
}

impl BinaryTextEncoding {
    /// Map an `encoding="..."` attribute value.
    pub fn from_attr(attr: &str) -> Result<BinaryTextEncoding, LLSDError> {
        match attr {
            "base16" => Ok(BinaryTextEncoding::Base16),
            "base64" => Ok(BinaryTextEncoding::Base64),
            "base85" => Ok(BinaryTextEncoding::Base85),
            other => Err(LLSDError::malformed(format!(
                "unknown binary encoding \"{}\"",
                other
            ))),
        }
    }
}

/// Encode bytes as lowercase hexadecimal.
pub fn base16_encode(data: &[u8]) -> String {
    hex::encode(data)
}

/// Decode hexadecimal, either case.
pub fn base16_decode(text: &str) -> Result<Vec<u8>, LLSDError> {
    hex::decode(text).map_err(|e| LLSDError::malformed(format!("base16 decode: {}", e)))
}

/// Encode bytes as standard base64 with padding.
pub fn base64_encode(data: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(data)
}

/// Decode standard base64. Whitespace between groups is tolerated;
/// the XML encoder wraps long payloads across lines.
pub fn base64_decode(text: &str) -> Result<Vec<u8>, LLSDError> {
    let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    base64::engine::general_purpose::STANDARD
        .decode(compact)
        .map_err(|e| LLSDError::malformed(format!("base64 decode: {}", e)))
}

/// Encode bytes in the base85 form LLSD XML uses.
pub fn base85_encode(data: &[u8]) -> String {
    ascii85::encode(data)
}

/// Decode base85.
pub fn base85_decode(text: &str) -> Result<Vec<u8>, LLSDError> {
    ascii85::decode(text).map_err(|e| LLSDError::malformed(format!("base85 decode: {:?}", e)))
}

/// Decode a binary payload per its declared text encoding.
pub fn binary_decode(text: &str, enc: BinaryTextEncoding) -> Result<Vec<u8>, LLSDError> {
    match enc {
        BinaryTextEncoding::Base16 => base16_decode(text.trim()),
        BinaryTextEncoding::Base64 => base64_decode(text),
        BinaryTextEncoding::Base85 => base85_decode(text.trim()),
    }
}

/// Format a date (seconds since epoch) as `YYYY-MM-DDThh:mm:ss.sssZ`.
/// Sub-second precision on the wire is milliseconds.
pub fn date_to_text(seconds: f64) -> String {
    let millis = (seconds * 1000.0).round();
    //  Outside chrono's representable span, fall back to the epoch
    //  rather than emitting nothing.
    let when = if millis.is_finite() {
        chrono::Utc.timestamp_millis_opt(millis as i64).single()
    } else {
        None
    };
    match when {
        Some(dt) => dt.to_rfc3339_opts(SecondsFormat::Millis, true),
        None => {
            log::warn!("date {} not representable, formatting as epoch", seconds);
            chrono::Utc
                .timestamp_millis_opt(0)
                .single()
                .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
                .unwrap_or_default()
        }
    }
}

/// Parse an ISO-8601 date to seconds since epoch. Fractional seconds are
/// optional on input; the empty string is the epoch, matching the empty
/// `<date />` element.
pub fn date_from_text(text: &str) -> Result<f64, LLSDError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(0.0);
    }
    let when = chrono::DateTime::parse_from_rfc3339(text)
        .map_err(|e| LLSDError::malformed(format!("date \"{}\": {}", text, e)))?;
    Ok(when.timestamp_millis() as f64 / 1000.0)
}

/// Parse integer text with the scan-with-trailing-junk policy of the C
/// library: skip surrounding whitespace, read an optional sign and digits,
/// ignore whatever follows. The empty string is 0. Overflow is an error.
pub fn integer_from_text(text: &str) -> Result<i32, LLSDError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(0);
    }
    let digits = numeric_prefix(text, |c| c.is_ascii_digit());
    let signed = matches!(digits.chars().next(), Some('+') | Some('-'));
    if digits.len() == signed as usize {
        return Err(LLSDError::malformed(format!("integer \"{}\"", text)));
    }
    digits
        .parse::<i32>()
        .map_err(|e| LLSDError::malformed(format!("integer \"{}\": {}", text, e)))
}

/// Parse real text: same trailing-junk policy, plus `nan` in any case and
/// the `inf` forms Rust's float formatter produces.
pub fn real_from_text(text: &str) -> Result<f64, LLSDError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(0.0);
    }
    if text.eq_ignore_ascii_case("nan") {
        return Ok(f64::NAN);
    }
    let mantissa = numeric_prefix(text, |c| {
        c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | 'i' | 'n' | 'f' | '+' | '-')
    });
    mantissa
        .parse::<f64>()
        .map_err(|e| LLSDError::malformed(format!("real \"{}\": {}", text, e)))
}

/// Leading slice of `text` that looks numeric: an optional sign, then
/// characters accepted by `body`.
fn numeric_prefix(text: &str, body: impl Fn(char) -> bool) -> &str {
    let mut end = 0;
    for (i, c) in text.char_indices() {
        if (i == 0 && matches!(c, '+' | '-')) || body(c) {
            end = i + c.len_utf8();
        } else {
            break;
        }
    }
    &text[..end]
}

/// Boolean text. A leading `1`, `t`, or `T` is true; everything else,
/// the empty string included, is false. "true" and "false" fall out of
/// the first-character rule.
pub fn boolean_from_text(text: &str) -> bool {
    matches!(text.trim().chars().next(), Some('1') | Some('t') | Some('T'))
}

/// Parse a textual UUID. The empty element is the zero UUID; anything
/// else must be strict 8-4-4-4-12 hex.
pub fn uuid_from_text(text: &str) -> Result<Uuid, LLSDError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Uuid::nil());
    }
    Uuid::parse_str(text).map_err(|e| LLSDError::malformed(format!("uuid \"{}\": {}", text, e)))
}

// Unit tests

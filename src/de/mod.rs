//! De-serialization. Converts an LLSD stream to a tree of LLSDValue
//! structs, detecting the wire encoding from its signature.
pub mod binary;
pub mod notation;
pub mod xml;

use crate::error::LLSDError;
use crate::LLSDValue;

/// Parse LLSD, detecting format.
/// Recognizes binary, notation, and XML LLSD, with or without sentinel.
pub fn from_bytes(msg: &[u8]) -> Result<LLSDValue, LLSDError> {
    //  Try binary first
    if msg.len() >= binary::LLSDBINARYSENTINEL.len()
        && &msg[0..binary::LLSDBINARYSENTINEL.len()] == binary::LLSDBINARYSENTINEL
    {
        return binary::from_bytes(&msg[binary::LLSDBINARYSENTINEL.len()..]);
    }
    //  Then notation, which also has an exact sentinel.
    if msg.len() >= notation::LLSDNOTATIONSENTINEL.len()
        && &msg[0..notation::LLSDNOTATIONSENTINEL.len()] == notation::LLSDNOTATIONSENTINEL
    {
        return notation::from_bytes(&msg[notation::LLSDNOTATIONSENTINEL.len()..]);
    }
    //  Check for binary without header. If array or map marker, parse.
    if msg.len() > 1 {
        match msg[0] {
            // check first char
            b'{' | b'[' => return binary::from_bytes(msg),
            _ => {}
        }
    }
    //  No binary sentinel, try text format.
    let msgstring = std::str::from_utf8(msg)
        .map_err(|e| LLSDError::malformed(format!("input is neither binary nor UTF-8: {}", e)))?;
    if msgstring.trim_start().starts_with(xml::LLSDXMLSENTINEL) {
        // try XML
        return xml::from_str(msgstring);
    }
    //  Trim string to N chars for error msg.
    let snippet = msgstring
        .chars()
        .zip(0..60)
        .map(|(c, _)| c)
        .collect::<String>();
    Err(LLSDError::malformed(format!(
        "LLSD format not recognized: {:?}",
        snippet
    )))
}

// Unit tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detectsallsignatures() {
        let value = LLSDValue::Array(vec![
            LLSDValue::Integer(7),
            LLSDValue::String("sig".to_string()),
        ]);
        //  Binary, with sentinel.
        let bin = crate::ser::binary::to_bytes(&value).unwrap();
        assert_eq!(from_bytes(&bin).unwrap(), value);
        //  XML.
        let xml_text = crate::ser::xml::to_string(&value, false).unwrap();
        assert_eq!(from_bytes(xml_text.as_bytes()).unwrap(), value);
        //  Notation, with sentinel.
        let notation_text = crate::ser::notation::to_string(&value).unwrap();
        assert_eq!(from_bytes(notation_text.as_bytes()).unwrap(), value);
    }

    #[test]
    fn detectsheaderlessbinary() {
        let value = LLSDValue::Array(vec![LLSDValue::Boolean(true)]);
        let bin = crate::ser::binary::to_bytes(&value).unwrap();
        let headerless = &bin[crate::de::binary::LLSDBINARYSENTINEL.len()..];
        assert_eq!(from_bytes(headerless).unwrap(), value);
    }

    #[test]
    fn rejectsunknownformat() {
        assert!(from_bytes(b"definitely not llsd").is_err());
        assert!(from_bytes(&[0xFF, 0xFE, 0x00]).is_err());
    }
}

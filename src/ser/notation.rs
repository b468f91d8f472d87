//
//  ser/notation -- serialize LLSD, notation form.
//
//  Library for serializing and de-serializing data in
//  Linden Lab Structured Data format.
//
//  Format documentation is at http://wiki.secondlife.com/wiki/LLSD
//
//  Notation format, serialization. Strings go out in the length-prefixed
//  s(len)"raw" form so no payload byte ever needs escaping; map keys use
//  the quoted form with escapes; binary is base64.
//
//  License: LGPL.
//
use crate::codec;
use crate::error::LLSDError;
use crate::LLSDValue;
use std::io::Write;
//
//  Constants
//
/// Notation LLSD prefix
pub const LLSDNOTATIONPREFIX: &str = "<? llsd/notation ?>\n";
/// Sentinel, must match exactly.
pub const LLSDNOTATIONSENTINEL: &str = LLSDNOTATIONPREFIX;

/// Outputs an LLSDValue as a string, in LLSD "notation" format.
pub fn to_string(val: &LLSDValue) -> Result<String, LLSDError> {
    let mut writer: Vec<u8> = Vec::new();
    to_writer(&mut writer, val)?;
    String::from_utf8(writer)
        .map_err(|e| LLSDError::malformed(format!("generated notation: {}", e)))
}

/// Outputs an LLSD value to an output stream, sentinel included.
pub fn to_writer<W: Write>(writer: &mut W, val: &LLSDValue) -> Result<(), LLSDError> {
    write!(writer, "{}", LLSDNOTATIONPREFIX)?; // prefix
    generate_value(writer, val)?;
    writer.flush()?;
    Ok(())
}

/// Generate one notation token. Recursive for containers.
fn generate_value<W: Write>(writer: &mut W, val: &LLSDValue) -> Result<(), LLSDError> {
    //  Emit notation form for all possible types.
    match val {
        LLSDValue::Undefined => write!(writer, "!")?,
        LLSDValue::Boolean(v) => write!(writer, "{}", if *v { 'T' } else { 'F' })?,
        LLSDValue::String(v) => {
            write!(writer, "s({})\"", v.len())?;
            writer.write_all(v.as_bytes())?;
            write!(writer, "\"")?;
        }
        LLSDValue::URI(v) => write!(writer, "l\"{}\"", urlencoding::encode(v))?,
        LLSDValue::Integer(v) => write!(writer, "i{}", v)?,
        LLSDValue::Real(v) => write!(writer, "r{}", v)?,
        LLSDValue::UUID(v) => write!(writer, "u{}", v)?,
        LLSDValue::Binary(v) => write!(writer, "b64\"{}\"", codec::base64_encode(v))?,
        LLSDValue::Date(v) => write!(writer, "d\"{}\"", codec::date_to_text(*v))?,

        //  Map is { 'key' : value, 'key' : value ... }
        LLSDValue::Map(v) => {
            writer.write_all(b"{")?;
            //  Output key/value pairs
            let mut first: bool = true;
            for (key, value) in v {
                if !first {
                    writer.write_all(b",\n")?;
                }
                first = false;
                write!(writer, "'{}':", escape_quoted(key))?;
                generate_value(writer, value)?;
            }
            writer.write_all(b"}")?;
        }
        //  Array is [ child, child ... ]
        LLSDValue::Array(v) => {
            writer.write_all(b"[")?;
            //  Output array entries
            let mut first: bool = true;
            for value in v {
                if !first {
                    writer.write_all(b",\n")?;
                }
                first = false;
                generate_value(writer, value)?;
            }
            writer.write_all(b"]")?;
        }
    };
    Ok(())
}

/// Escape the single-quote delimiter and backslash in map keys.
fn escape_quoted(s: &str) -> String {
    let mut writer = String::new();
    for ch in s.chars() {
        match ch {
            '\'' | '\\' => {
                writer.push('\\');
                writer.push(ch)
            }
            _ => writer.push(ch),
        }
    }
    writer
}

// Unit tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalartokens() {
        let check = |v: &LLSDValue, expected: &str| {
            let text = to_string(v).unwrap();
            assert_eq!(&text[LLSDNOTATIONPREFIX.len()..], expected);
        };
        check(&LLSDValue::Undefined, "!");
        check(&LLSDValue::Boolean(true), "T");
        check(&LLSDValue::Boolean(false), "F");
        check(&LLSDValue::Integer(-42), "i-42");
        check(&LLSDValue::Real(1.5), "r1.5");
        check(&LLSDValue::String("hi \"there\"".to_string()), "s(10)\"hi \"there\"\"");
        check(
            &LLSDValue::Binary(b"Hello world".to_vec()),
            "b64\"SGVsbG8gd29ybGQ=\"",
        );
        check(
            &LLSDValue::Date(1138804193.0),
            "d\"2006-02-01T14:29:53.000Z\"",
        );
    }

    #[test]
    fn keysescaped() {
        let mut map = crate::LLSDMap::new();
        map.insert("it's".to_string(), LLSDValue::Integer(1));
        let text = to_string(&LLSDValue::Map(map.clone())).unwrap();
        assert!(text.contains(r"'it\'s':i1"));
        //  And it reads back.
        let parsed = crate::de::notation::from_str(&text[LLSDNOTATIONPREFIX.len()..]).unwrap();
        assert_eq!(parsed, LLSDValue::Map(map));
    }

    #[test]
    fn notationroundtrip() {
        let parsed1 = crate::de::xml::from_str(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<llsd><map size=\"3\">\
             <key>uri</key><uri>http://example.com/a b</uri>\
             <key>id</key><uuid>67153d5b-3659-afb4-8510-adda2c034649</uuid>\
             <key>flags</key><array size=\"2\"><boolean>true</boolean><undef /></array>\
             </map></llsd>",
        )
        .unwrap();
        let generated = to_string(&parsed1).unwrap();
        let parsed2 =
            crate::de::notation::from_str(&generated[LLSDNOTATIONPREFIX.len()..]).unwrap();
        assert_eq!(parsed1, parsed2);
    }
}

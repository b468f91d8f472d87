//
//  ser/xml.rs -- XML serializer for LLSD
//
//  Library for serializing and de-serializing data in
//  Linden Lab Structured Data format.
//
//  Format documentation is at http://wiki.secondlife.com/wiki/LLSD
//
//  XML format. One `<llsd>` wrapper around a single value; scalars as
//  ASCII payloads, binary as base64, container tags carrying advisory
//  `size` attributes, map entries as `<key>` followed by the value tag
//  in insertion order.
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
pub const LLSDXMLPREFIX: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<llsd>\n";
pub const LLSDXMLSENTINEL: &str = "<?xml"; // Must begin with this.
const INDENT: usize = 4; // indent 4 spaces if asked

/// LLSDValue to Writer.
pub fn to_writer<W: Write>(
    writer: &mut W,
    value: &LLSDValue,
    do_indent: bool,
) -> Result<(), LLSDError> {
    write!(writer, "{}", LLSDXMLPREFIX)?; // Standard XML prefix
    generate_value(writer, value, if do_indent { INDENT } else { 0 }, 0)?;
    write!(writer, "</llsd>")?;
    writer.flush()?;
    Ok(())
}

/// LLSDValue to String.
/// Pretty prints out the value as XML. Indents by 4 spaces if requested.
pub fn to_string(val: &LLSDValue, do_indent: bool) -> Result<String, LLSDError> {
    let mut s: Vec<u8> = Vec::new();
    to_writer(&mut s, val, do_indent)?;
    String::from_utf8(s).map_err(|e| LLSDError::malformed(format!("generated XML: {}", e)))
}

/// Generate one <TYPE> VALUE </TYPE> output. VALUE is recursive.
fn generate_value<W: Write>(
    writer: &mut W,
    val: &LLSDValue,
    spaces: usize,
    indent: usize,
) -> Result<(), LLSDError> {
    //  Open or close one container tag, with its size attribute on open.
    fn container_tag<W: Write>(
        writer: &mut W,
        tag: &str,
        size: Option<usize>,
        indent: usize,
    ) -> Result<(), LLSDError> {
        if indent > 0 {
            write!(writer, "{:1$}", " ", indent)?;
        };
        match size {
            Some(n) => writeln!(writer, "<{} size=\"{}\">", tag, n)?,
            None => writeln!(writer, "</{}>", tag)?,
        }
        Ok(())
    }

    //  Write out one tag with a value.
    fn tag_value<W: Write>(
        writer: &mut W,
        tag: &str,
        text: &str,
        indent: usize,
    ) -> Result<(), LLSDError> {
        if indent > 0 {
            write!(writer, "{:1$}", " ", indent)?;
        };
        if text.is_empty() {
            // if empty, write as null tag
            writeln!(writer, "<{} />", tag)?;
        } else {
            writeln!(writer, "<{}>{}</{}>", tag, xml_escape(text), tag)?;
        }
        Ok(())
    }

    //  Use SL "nan", not Rust "NaN"
    fn f64_to_xml(v: f64) -> String {
        let ss = v.to_string();
        if ss == "NaN" {
            "nan".to_string()
        } else {
            ss
        }
    }

    //  Emit XML for all possible types.
    match val {
        LLSDValue::Undefined => tag_value(writer, "undef", "", indent)?,
        LLSDValue::Boolean(v) => {
            tag_value(writer, "boolean", if *v { "true" } else { "false" }, indent)?
        }
        LLSDValue::String(v) => tag_value(writer, "string", v.as_str(), indent)?,
        LLSDValue::URI(v) => tag_value(writer, "uri", v.as_str(), indent)?,
        LLSDValue::Integer(v) => tag_value(writer, "integer", v.to_string().as_str(), indent)?,
        LLSDValue::Real(v) => tag_value(writer, "real", f64_to_xml(*v).as_str(), indent)?,
        LLSDValue::UUID(v) => tag_value(writer, "uuid", v.to_string().as_str(), indent)?,
        LLSDValue::Binary(v) => {
            tag_value(writer, "binary", codec::base64_encode(v).as_str(), indent)?
        }
        LLSDValue::Date(v) => tag_value(writer, "date", &codec::date_to_text(*v), indent)?,
        LLSDValue::Map(v) => {
            container_tag(writer, "map", Some(v.len()), indent)?;
            for (key, value) in v {
                tag_value(writer, "key", key, indent + spaces)?;
                generate_value(writer, value, spaces, indent + spaces)?;
            }
            container_tag(writer, "map", None, indent)?;
        }
        LLSDValue::Array(v) => {
            container_tag(writer, "array", Some(v.len()), indent)?;
            for value in v {
                generate_value(writer, value, spaces, indent + spaces)?;
            }
            container_tag(writer, "array", None, indent)?;
        }
    };
    Ok(())
}

/// XML standard character escapes.
fn xml_escape(unescaped: &str) -> String {
    let mut s = String::new();
    for ch in unescaped.chars() {
        match ch {
            '<' => s += "&lt;",
            '>' => s += "&gt;",
            '\'' => s += "&apos;",
            '&' => s += "&amp;",
            '"' => s += "&quot;",
            _ => s.push(ch),
        }
    }
    s
}

// Unit tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arraywithsizeattr() {
        //  ["a", 1] carries its size attribute and round-trips.
        let value = LLSDValue::Array(vec![
            LLSDValue::String("a".to_string()),
            LLSDValue::Integer(1),
        ]);
        let text = to_string(&value, false).unwrap();
        assert!(text.contains("<array size=\"2\">"));
        assert!(text.contains("<string>a</string>"));
        assert!(text.contains("<integer>1</integer>"));
        assert_eq!(crate::de::xml::from_str(&text).unwrap(), value);
    }

    #[test]
    fn uuidtag() {
        let u = uuid::Uuid::parse_str("01020304-0506-0708-0900-010203040506").unwrap();
        let text = to_string(&LLSDValue::UUID(u), false).unwrap();
        assert!(text.contains("<uuid>01020304-0506-0708-0900-010203040506</uuid>"));
        assert_eq!(crate::de::xml::from_str(&text).unwrap(), LLSDValue::UUID(u));
    }

    #[test]
    fn datetagmilliseconds() {
        let text = to_string(&LLSDValue::Date(1138804193.43), false).unwrap();
        assert!(text.contains("<date>2006-02-01T14:29:53.430Z</date>"));
    }

    #[test]
    fn nanspelledlowercase() {
        let text = to_string(&LLSDValue::Real(f64::NAN), false).unwrap();
        assert!(text.contains("<real>nan</real>"));
        //  Parses back to NaN; NaN is never equal to itself, check kind.
        let parsed = crate::de::xml::from_str(&text).unwrap();
        assert!(parsed.as_real().unwrap().is_nan());
    }

    #[test]
    fn escapedtext() {
        let value = LLSDValue::String("a<b&c>\"d\"".to_string());
        let text = to_string(&value, false).unwrap();
        assert!(text.contains("&lt;"));
        assert!(text.contains("&amp;"));
        assert_eq!(crate::de::xml::from_str(&text).unwrap(), value);
    }

    #[test]
    fn emptypayloadsselfclose() {
        let value = LLSDValue::Array(vec![
            LLSDValue::Undefined,
            LLSDValue::String(String::new()),
            LLSDValue::Binary(Vec::new()),
        ]);
        let text = to_string(&value, true).unwrap();
        assert!(text.contains("<undef />"));
        assert!(text.contains("<string />"));
        assert!(text.contains("<binary />"));
        assert_eq!(crate::de::xml::from_str(&text).unwrap(), value);
    }
}

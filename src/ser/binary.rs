//
//  ser/binary -- serialize LLSD, binary form.
//
//  Library for serializing and de-serializing data in
//  Linden Lab Structured Data format.
//
//  Format documentation is at http://wiki.secondlife.com/wiki/LLSD
//
//  Binary format, serialization. Container counts are emitted from the
//  in-memory size and are exact; the terminator byte still follows, since
//  parsers treat the count as advisory.
//
//  License: LGPL.
//
use crate::error::LLSDError;
use crate::LLSDValue;
use std::io::Write;
//
//  Constants
//
/// Binary LLSD prefix
pub const LLSDBINARYPREFIX: &[u8] = b"<? LLSD/Binary ?>\n";
/// Sentinel, must match exactly.
pub const LLSDBINARYSENTINEL: &[u8] = LLSDBINARYPREFIX;

/// Outputs an LLSDValue as a string of bytes, in LLSD "binary" format.
pub fn to_bytes(val: &LLSDValue) -> Result<Vec<u8>, LLSDError> {
    let mut writer: Vec<u8> = Vec::new(); // just make a stream and use the stream form
    to_writer(&mut writer, val)?;
    Ok(writer)
}

/// Outputs an LLSD value to an output stream
pub fn to_writer<W: Write>(writer: &mut W, val: &LLSDValue) -> Result<(), LLSDError> {
    writer.write_all(LLSDBINARYPREFIX)?; // prefix
    generate_value(writer, val)?;
    writer.flush()?;
    Ok(())
}

/// Generate one record. Recursive for containers.
fn generate_value<W: Write>(writer: &mut W, val: &LLSDValue) -> Result<(), LLSDError> {
    //  Emit binary for all possible types.
    match val {
        LLSDValue::Undefined => writer.write_all(b"!")?,
        LLSDValue::Boolean(v) => writer.write_all(if *v { b"1" } else { b"0" })?,
        LLSDValue::String(v) => {
            writer.write_all(b"s")?;
            writer.write_all(&(v.len() as u32).to_be_bytes())?;
            writer.write_all(v.as_bytes())?
        }
        LLSDValue::URI(v) => {
            writer.write_all(b"l")?;
            writer.write_all(&(v.len() as u32).to_be_bytes())?;
            writer.write_all(v.as_bytes())?
        }
        LLSDValue::Integer(v) => {
            writer.write_all(b"i")?;
            writer.write_all(&v.to_be_bytes())?
        }
        LLSDValue::Real(v) => {
            writer.write_all(b"r")?;
            writer.write_all(&v.to_be_bytes())?
        }
        LLSDValue::UUID(v) => {
            writer.write_all(b"u")?;
            writer.write_all(v.as_bytes())?
        }
        LLSDValue::Binary(v) => {
            writer.write_all(b"b")?;
            writer.write_all(&(v.len() as u32).to_be_bytes())?;
            writer.write_all(v)?
        }
        //  Date is seconds since epoch as a big-endian double.
        LLSDValue::Date(v) => {
            writer.write_all(b"d")?;
            writer.write_all(&v.to_be_bytes())?
        }

        //  Map is { childcnt key value key value ... }
        //  Keys go on the wire as ordinary string records.
        LLSDValue::Map(v) => {
            //  Output count of key/value pairs
            writer.write_all(b"{")?;
            writer.write_all(&(v.len() as u32).to_be_bytes())?;
            //  Output key/value pairs
            for (key, value) in v {
                writer.write_all(b"s")?;
                writer.write_all(&(key.len() as u32).to_be_bytes())?;
                writer.write_all(key.as_bytes())?;
                generate_value(writer, value)?;
            }
            writer.write_all(b"}")?
        }
        //  Array is [ childcnt child child ... ]
        LLSDValue::Array(v) => {
            //  Output count of array entries
            writer.write_all(b"[")?;
            writer.write_all(&(v.len() as u32).to_be_bytes())?;
            //  Output array entries
            for value in v {
                generate_value(writer, value)?;
            }
            writer.write_all(b"]")?
        }
    };
    Ok(())
}

// Unit tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booleanwire() {
        //  true is the signature line plus a single '1' - 19 bytes.
        let wire = to_bytes(&LLSDValue::Boolean(true)).unwrap();
        assert_eq!(wire.len(), 19);
        assert_eq!(&wire[..LLSDBINARYSENTINEL.len()], LLSDBINARYSENTINEL);
        assert_eq!(wire[LLSDBINARYSENTINEL.len()], b'1');
        assert_eq!(
            crate::de::binary::from_bytes(&wire[LLSDBINARYSENTINEL.len()..]).unwrap(),
            LLSDValue::Boolean(true)
        );
    }

    #[test]
    fn integerwire() {
        let wire = to_bytes(&LLSDValue::Integer(42)).unwrap();
        let body = &wire[LLSDBINARYSENTINEL.len()..];
        assert_eq!(body, &[b'i', 0x00, 0x00, 0x00, 0x2A]);
    }

    #[test]
    fn mapwire() {
        //  {"k":"v"} per the record table, keys as string records.
        let mut map = crate::LLSDMap::new();
        map.insert("k".to_string(), LLSDValue::String("v".to_string()));
        let wire = to_bytes(&LLSDValue::Map(map)).unwrap();
        let body = &wire[LLSDBINARYSENTINEL.len()..];
        let parts: [&[u8]; 9] = [
            b"{",
            &1u32.to_be_bytes(),
            b"s",
            &1u32.to_be_bytes(),
            b"k",
            b"s",
            &1u32.to_be_bytes(),
            b"v",
            b"}",
        ];
        let expected = parts.concat();
        assert_eq!(body, &expected[..]);
    }

    #[test]
    fn uuidwire() {
        let u = uuid::Uuid::parse_str("01020304-0506-0708-0900-010203040506").unwrap();
        let wire = to_bytes(&LLSDValue::UUID(u)).unwrap();
        let body = &wire[LLSDBINARYSENTINEL.len()..];
        assert_eq!(body[0], b'u');
        assert_eq!(&body[1..], u.as_bytes());
    }

    #[test]
    fn datewire() {
        //  Date is a big-endian double of seconds, sub-second preserved.
        let wire = to_bytes(&LLSDValue::Date(1138804193.437)).unwrap();
        let body = &wire[LLSDBINARYSENTINEL.len()..];
        assert_eq!(body[0], b'd');
        assert_eq!(&body[1..], &1138804193.437f64.to_be_bytes());
        assert_eq!(
            crate::de::binary::from_bytes(body).unwrap(),
            LLSDValue::Date(1138804193.437)
        );
    }
}

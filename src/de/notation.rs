//
//  de/notation -- de-serialize LLSD, "notation" form.
//
//  Library for serializing and de-serializing data in
//  Linden Lab Structured Data format.
//
//  Format documentation is at http://wiki.secondlife.com/wiki/LLSD
//
//  Notation format. Similar to JSON, but not compatible. Single-character
//  type tags with inline payloads; whitespace is skipped between tokens
//  and preserved inside quoted payloads. Length-prefixed payloads
//  (`s(len)"..."`, `b(len)"..."`) count raw bytes and the count is
//  authoritative.
//
//  License: LGPL.
//
use crate::codec;
use crate::error::LLSDError;
use crate::sax::{deliver, LLSDHandler, LLSDTreeBuilder};
use crate::LLSDValue;
use std::borrow::Cow;
//
//  Constants
//
/// Notation LLSD prefix
pub const LLSDNOTATIONPREFIX: &[u8] = b"<? llsd/notation ?>\n";
/// Sentinel, must match exactly.
pub const LLSDNOTATIONSENTINEL: &[u8] = LLSDNOTATIONPREFIX;

///    Parse LLSD expressed in notation format into an LLSDValue tree.
///    No header.
pub fn from_str(notation_str: &str) -> Result<LLSDValue, LLSDError> {
    from_bytes(notation_str.as_bytes())
}

///    Parse notation bytes into an LLSDValue tree. No header.
pub fn from_bytes(b: &[u8]) -> Result<LLSDValue, LLSDError> {
    let mut builder = LLSDTreeBuilder::new();
    if let Err(err) = parse(b, &mut builder) {
        return Err(builder.take_error().unwrap_or(err));
    }
    builder.finish()
}

/// Parse one notation value from `data`, reporting events to the
/// handler. Trailing bytes after the value are left unread.
pub fn parse<H: LLSDHandler>(data: &[u8], handler: &mut H) -> Result<(), LLSDError> {
    let mut scanner = Scanner { data, pos: 0 };
    parse_value(&mut scanner, handler)
}

/// Byte cursor over the notation text.
struct Scanner<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    /// Consume whitespace; the next byte, if any, is non-whitespace.
    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\r' | b'\n')) {
            self.pos += 1;
        }
    }

    /// Consume an expected byte, whitespace before it allowed.
    fn expect(&mut self, wanted: u8) -> Result<(), LLSDError> {
        self.skip_whitespace();
        match self.bump() {
            Some(b) if b == wanted => Ok(()),
            Some(b) => Err(LLSDError::malformed(format!(
                "expected '{}', found '{}'",
                wanted as char, b as char
            ))),
            None => Err(LLSDError::TruncatedInput("notation token")),
        }
    }

    /// Take exactly `n` raw bytes.
    fn take(&mut self, n: usize, what: &'static str) -> Result<&'a [u8], LLSDError> {
        if self.data.len() - self.pos < n {
            return Err(LLSDError::TruncatedInput(what));
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }
}

/// Parse one value - real, integer, map, etc. Recursive.
fn parse_value<H: LLSDHandler>(
    scanner: &mut Scanner,
    handler: &mut H,
) -> Result<(), LLSDError> {
    scanner.skip_whitespace();
    let tag = scanner
        .bump()
        .ok_or(LLSDError::TruncatedInput("notation value"))?;
    match tag {
        //  Undefined - the empty value
        b'!' => deliver(handler.undef()),
        //  Booleans, digit and word forms
        b'0' => deliver(handler.boolean(false)),
        b'1' => deliver(handler.boolean(true)),
        b't' | b'T' | b'f' | b'F' => {
            deliver(handler.boolean(parse_boolean_word(scanner, tag)?))
        }
        //  Integer - "i" then decimal digits
        b'i' => deliver(handler.integer(parse_integer(scanner)?)),
        //  Real - "r" then a floating point number
        b'r' => deliver(handler.real(parse_real(scanner)?)),
        //  UUID - 36 chars, no quotes
        b'u' => {
            let raw = scanner.take(36, "uuid")?;
            let text = std::str::from_utf8(raw)
                .map_err(|e| LLSDError::malformed(format!("uuid: {}", e)))?;
            deliver(handler.uuid(codec::uuid_from_text(text)?))
        }
        //  Date - quoted ISO-8601
        b'd' => {
            let text = parse_quoted_text(scanner)?;
            deliver(handler.date(codec::date_from_text(&text)?))
        }
        //  URI - quoted, percent-encoded
        b'l' => {
            let text = parse_quoted_text(scanner)?;
            let decoded = urlencoding::decode(&text)
                .map_err(|e| LLSDError::malformed(format!("uri: {}", e)))?;
            deliver(handler.uri(Cow::Owned(decoded.into_owned())))
        }
        //  String, quoted with escapes
        b'"' | b'\'' => {
            deliver(handler.string(Cow::Owned(parse_quoted_string(scanner, tag)?)))
        }
        //  String, length-prefixed raw bytes
        b's' => deliver(handler.string(Cow::Owned(parse_sized_string(scanner)?))),
        //  Binary - b16"...", b64"...", or b(len)"raw"
        b'b' => deliver(handler.binary(Cow::Owned(parse_binary(scanner)?))),
        //  Array - [ value, value ... ]
        b'[' => parse_array(scanner, handler),
        //  Map - { 'key' : value, 'key' : value ... }
        b'{' => parse_map(scanner, handler),
        other => Err(LLSDError::malformed(format!(
            "unexpected notation character '{}'",
            other as char
        ))),
    }
}

/// Parse the word forms of a boolean; the first character has already
/// been consumed.
fn parse_boolean_word(scanner: &mut Scanner, first: u8) -> Result<bool, LLSDError> {
    let mut word = String::with_capacity(8);
    word.push(first as char);
    while let Some(b) = scanner.peek() {
        if b.is_ascii_alphabetic() {
            word.push(b as char);
            scanner.pos += 1;
        } else {
            break;
        }
    }
    match word.as_str() {
        "f" | "F" | "false" | "FALSE" => Ok(false),
        "t" | "T" | "true" | "TRUE" => Ok(true),
        _ => Err(LLSDError::malformed(format!("boolean \"{}\"", word))),
    }
}

/// Parse "iNNN"; the "i" has been consumed.
fn parse_integer(scanner: &mut Scanner) -> Result<i32, LLSDError> {
    let mut s = String::with_capacity(16);
    while let Some(b) = scanner.peek() {
        match b {
            b'0'..=b'9' | b'+' | b'-' => {
                s.push(b as char);
                scanner.pos += 1;
            }
            _ => break,
        }
    }
    s.parse::<i32>()
        .map_err(|e| LLSDError::malformed(format!("integer \"{}\": {}", s, e)))
}

/// Parse "rNNN"; exponents and the nan/inf spellings are accepted so
/// that formatter output always reads back.
fn parse_real(scanner: &mut Scanner) -> Result<f64, LLSDError> {
    let mut s = String::with_capacity(24);
    while let Some(b) = scanner.peek() {
        match b {
            b'0'..=b'9' | b'+' | b'-' | b'.' | b'e' | b'E' | b'a' | b'n' | b'N' | b'i'
            | b'f' | b'I' => {
                s.push(b as char);
                scanner.pos += 1;
            }
            _ => break,
        }
    }
    s.parse::<f64>()
        .map_err(|e| LLSDError::malformed(format!("real \"{}\": {}", s, e)))
}

/// Parse a quoted string with '\' escapes; the opening delimiter has
/// been consumed. Bytes are taken verbatim and must form UTF-8.
fn parse_quoted_string(scanner: &mut Scanner, delim: u8) -> Result<String, LLSDError> {
    let mut bytes = Vec::with_capacity(64);
    loop {
        match scanner.bump() {
            Some(b) if b == delim => break,
            Some(b'\\') => match scanner.bump() {
                Some(escaped) => bytes.push(escaped),
                None => return Err(LLSDError::TruncatedInput("quoted string")),
            },
            Some(b) => bytes.push(b),
            None => return Err(LLSDError::TruncatedInput("quoted string")),
        }
    }
    String::from_utf8(bytes)
        .map_err(|e| LLSDError::malformed(format!("string is not UTF-8: {}", e)))
}

/// A quoted payload opened by either quote character.
fn parse_quoted_text(scanner: &mut Scanner) -> Result<String, LLSDError> {
    scanner.skip_whitespace();
    match scanner.bump() {
        Some(delim @ (b'"' | b'\'')) => parse_quoted_string(scanner, delim),
        Some(b) => Err(LLSDError::malformed(format!(
            "expected a quote, found '{}'",
            b as char
        ))),
        None => Err(LLSDError::TruncatedInput("quoted payload")),
    }
}

/// Parse "(len)" - the byte count prefix of sized strings and binary.
fn parse_count(scanner: &mut Scanner) -> Result<usize, LLSDError> {
    scanner.expect(b'(')?;
    let mut s = String::with_capacity(10);
    while let Some(b @ b'0'..=b'9') = scanner.peek() {
        s.push(b as char);
        scanner.pos += 1;
    }
    scanner.expect(b')')?;
    s.parse::<usize>()
        .map_err(|e| LLSDError::malformed(format!("length prefix \"{}\": {}", s, e)))
}

/// Parse s(len)"raw". The count is authoritative; the quotes carry no
/// escapes.
fn parse_sized_string(scanner: &mut Scanner) -> Result<String, LLSDError> {
    let count = parse_count(scanner)?;
    scanner.skip_whitespace();
    let delim = match scanner.bump() {
        Some(d @ (b'"' | b'\'')) => d,
        _ => return Err(LLSDError::malformed("sized string missing its quote")),
    };
    let raw = scanner.take(count, "sized string")?.to_vec();
    if scanner.bump() != Some(delim) {
        return Err(LLSDError::malformed("sized string missing closing quote"));
    }
    String::from_utf8(raw)
        .map_err(|e| LLSDError::malformed(format!("string is not UTF-8: {}", e)))
}

/// Parse the binary forms: b16"hex", b64"base64", b(len)"raw".
fn parse_binary(scanner: &mut Scanner) -> Result<Vec<u8>, LLSDError> {
    match scanner.peek() {
        Some(b'(') => {
            let count = parse_count(scanner)?;
            scanner.skip_whitespace();
            let delim = match scanner.bump() {
                Some(d @ (b'"' | b'\'')) => d,
                _ => return Err(LLSDError::malformed("sized binary missing its quote")),
            };
            let raw = scanner.take(count, "sized binary")?.to_vec();
            if scanner.bump() != Some(delim) {
                return Err(LLSDError::malformed("sized binary missing closing quote"));
            }
            Ok(raw)
        }
        Some(b'1') => {
            scanner.pos += 1;
            scanner.expect(b'6')?;
            codec::base16_decode(parse_quoted_text(scanner)?.trim())
        }
        Some(b'6') => {
            scanner.pos += 1;
            scanner.expect(b'4')?;
            codec::base64_decode(&parse_quoted_text(scanner)?)
        }
        _ => Err(LLSDError::malformed("binary must be b16, b64, or b(len)")),
    }
}

/// Parse "[ value, value ... ]"; the '[' has been consumed.
/// `array_value_end` fires at each comma separator.
fn parse_array<H: LLSDHandler>(
    scanner: &mut Scanner,
    handler: &mut H,
) -> Result<(), LLSDError> {
    deliver(handler.array_begin(0))?;
    loop {
        scanner.skip_whitespace();
        match scanner.peek() {
            Some(b']') => {
                scanner.pos += 1;
                return deliver(handler.array_end());
            }
            Some(_) => {
                parse_value(scanner, handler)?;
                scanner.skip_whitespace();
                if let Some(b',') = scanner.peek() {
                    scanner.pos += 1;
                    deliver(handler.array_value_end())?;
                }
            }
            None => return Err(LLSDError::TruncatedInput("array")),
        }
    }
}

/// Parse "{ 'key' : value, 'key' : value ... }"; the '{' has been
/// consumed. Keys may be quoted or s(len) strings. `map_key_end` fires
/// after each key, `map_value_end` at each comma separator.
fn parse_map<H: LLSDHandler>(scanner: &mut Scanner, handler: &mut H) -> Result<(), LLSDError> {
    deliver(handler.map_begin(0))?;
    loop {
        scanner.skip_whitespace();
        match scanner.peek() {
            Some(b'}') => {
                scanner.pos += 1;
                return deliver(handler.map_end());
            }
            Some(quote @ (b'"' | b'\'')) => {
                scanner.pos += 1;
                let key = parse_quoted_string(scanner, quote)?;
                deliver(handler.string(Cow::Owned(key)))?;
                deliver(handler.map_key_end())?;
                scanner.expect(b':')?;
                parse_value(scanner, handler)?;
                scanner.skip_whitespace();
                if let Some(b',') = scanner.peek() {
                    scanner.pos += 1;
                    deliver(handler.map_value_end())?;
                }
            }
            Some(b's') => {
                scanner.pos += 1;
                let key = parse_sized_string(scanner)?;
                deliver(handler.string(Cow::Owned(key)))?;
                deliver(handler.map_key_end())?;
                scanner.expect(b':')?;
                parse_value(scanner, handler)?;
                scanner.skip_whitespace();
                if let Some(b',') = scanner.peek() {
                    scanner.pos += 1;
                    deliver(handler.map_value_end())?;
                }
            }
            Some(b) => {
                return Err(LLSDError::structure(format!(
                    "map key began with '{}' instead of a quote",
                    b as char
                )))
            }
            None => return Err(LLSDError::TruncatedInput("map")),
        }
    }
}

// Unit tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LLSDMap;
    use uuid::Uuid;

    #[test]
    fn notationparsetest1() {
        //  Construct a test value.
        let mut test1map = LLSDMap::new();
        test1map.insert("val1".to_string(), LLSDValue::Real(456.0));
        test1map.insert("val2".to_string(), LLSDValue::Integer(999));
        let test1: LLSDValue = LLSDValue::Array(vec![
            LLSDValue::Real(123.5),
            LLSDValue::Map(test1map),
            LLSDValue::Integer(42),
            LLSDValue::String("Hello world".to_string()),
        ]);
        //  Convert to notation.
        let test1notation = crate::ser::notation::to_string(&test1).unwrap();
        //  Convert back to value form.
        let test1value =
            from_bytes(&test1notation.as_bytes()[LLSDNOTATIONPREFIX.len()..]).unwrap();
        //  Check that results match after round trip.
        assert_eq!(test1, test1value);
    }

    #[test]
    fn scalarforms() {
        assert_eq!(from_str("!").unwrap(), LLSDValue::Undefined);
        assert_eq!(from_str("1").unwrap(), LLSDValue::Boolean(true));
        assert_eq!(from_str("FALSE").unwrap(), LLSDValue::Boolean(false));
        assert_eq!(from_str("i-17").unwrap(), LLSDValue::Integer(-17));
        assert_eq!(from_str("r2.5e2").unwrap(), LLSDValue::Real(250.0));
        assert_eq!(
            from_str("u67153d5b-3659-afb4-8510-adda2c034649").unwrap(),
            LLSDValue::UUID(
                Uuid::parse_str("67153d5b-3659-afb4-8510-adda2c034649").unwrap()
            )
        );
        assert_eq!(
            from_str(r"'it\'s'").unwrap(),
            LLSDValue::String("it's".to_string())
        );
    }

    #[test]
    fn stringforms() {
        assert_eq!(
            from_str("\"hello\"").unwrap(),
            LLSDValue::String("hello".to_string())
        );
        assert_eq!(
            from_str(r#""say \"hi\"""#).unwrap(),
            LLSDValue::String("say \"hi\"".to_string())
        );
        assert_eq!(
            from_str("s(5)\"a\"b c\"").unwrap(),
            //  Length is authoritative; the interior quote is data.
            LLSDValue::String("a\"b c".to_string())
        );
    }

    #[test]
    fn binaryforms() {
        assert_eq!(
            from_str("b16\"0fa1\"").unwrap(),
            LLSDValue::Binary(vec![0x0f, 0xa1])
        );
        assert_eq!(
            from_str("b64\"SGVsbG8gd29ybGQ=\"").unwrap(),
            LLSDValue::Binary(b"Hello world".to_vec())
        );
        assert_eq!(
            from_str("b(3)\"abc\"").unwrap(),
            LLSDValue::Binary(b"abc".to_vec())
        );
    }

    #[test]
    fn datesanduris() {
        assert_eq!(
            from_str("d\"2006-02-01T14:29:53.000Z\"").unwrap(),
            LLSDValue::Date(1138804193.0)
        );
        assert_eq!(
            from_str("l\"http%3A%2F%2Fexample.com%2Fa%20b\"").unwrap(),
            LLSDValue::URI("http://example.com/a b".to_string())
        );
    }

    #[test]
    fn containers() {
        assert_eq!(from_str("[]").unwrap(), LLSDValue::Array(Vec::new()));
        assert_eq!(from_str("{}").unwrap(), LLSDValue::Map(LLSDMap::new()));
        let parsed = from_str("[ i1 , 'two' , [ r3.5 ] ]").unwrap();
        assert_eq!(
            parsed,
            LLSDValue::Array(vec![
                LLSDValue::Integer(1),
                LLSDValue::String("two".to_string()),
                LLSDValue::Array(vec![LLSDValue::Real(3.5)]),
            ])
        );
        let parsed = from_str("{'a': i1, 'b': {'c': !}}").unwrap();
        let map = parsed.as_map().unwrap();
        assert_eq!(map.get("a"), Some(&LLSDValue::Integer(1)));
        assert_eq!(
            map.get("b").unwrap().as_map().unwrap().get("c"),
            Some(&LLSDValue::Undefined)
        );
    }

    #[test]
    fn malformedinputs() {
        assert!(from_str("q").is_err());
        assert!(from_str("i").is_err());
        assert!(from_str("[i1").is_err());
        assert!(from_str("{i1:i2}").is_err());
        assert!(from_str("s(5)\"ab\"").is_err());
        assert!(from_str("\"unterminated").is_err());
    }
}

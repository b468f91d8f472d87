//
//  de/binary -- de-serialize LLSD, binary form.
//
//  Library for serializing and de-serializing data in
//  Linden Lab Structured Data format.
//
//  Format documentation is at http://wiki.secondlife.com/wiki/LLSD
//
//  Binary format. A flat loop over typed records: one ASCII type byte,
//  then a fixed or length-prefixed body, big-endian throughout. Container
//  openers carry an advisory count; the `]` / `}` terminator records are
//  what actually end them.
//
//  License: LGPL.
//
use crate::error::LLSDError;
use crate::sax::{deliver, LLSDHandler, LLSDTreeBuilder};
use crate::LLSDValue;
use std::borrow::Cow;
use std::io::{Cursor, Read};
use uuid::Uuid;
//
//  Constants
//
/// Binary LLSD prefix
pub const LLSDBINARYPREFIX: &[u8] = b"<? LLSD/Binary ?>\n";
/// Sentinel, must match exactly.
pub const LLSDBINARYSENTINEL: &[u8] = LLSDBINARYPREFIX;

///    Parse LLSD expressed in binary into an LLSDValue tree. No header.
pub fn from_bytes(b: &[u8]) -> Result<LLSDValue, LLSDError> {
    let mut cursor: Cursor<&[u8]> = Cursor::new(b);
    from_reader(&mut cursor)
}

///    Parse LLSD from a reader into an LLSDValue tree. No header.
pub fn from_reader(rdr: &mut dyn Read) -> Result<LLSDValue, LLSDError> {
    let mut builder = LLSDTreeBuilder::new();
    if let Err(err) = parse(rdr, &mut builder) {
        return Err(builder.take_error().unwrap_or(err));
    }
    builder.finish()
}

/// Walk binary records from `rdr` until end of input, reporting each to
/// the handler. No header. The loop itself is stateless; nesting is the
/// consumer's concern.
pub fn parse<H: LLSDHandler>(rdr: &mut dyn Read, handler: &mut H) -> Result<(), LLSDError> {
    fn read_u32(rdr: &mut dyn Read, what: &'static str) -> Result<u32, LLSDError> {
        let mut b: [u8; 4] = [0; 4];
        read_exact(rdr, &mut b, what)?;
        Ok(u32::from_be_bytes(b))
    }
    fn read_i32(rdr: &mut dyn Read, what: &'static str) -> Result<i32, LLSDError> {
        let mut b: [u8; 4] = [0; 4];
        read_exact(rdr, &mut b, what)?;
        Ok(i32::from_be_bytes(b))
    }
    fn read_f64(rdr: &mut dyn Read, what: &'static str) -> Result<f64, LLSDError> {
        let mut b: [u8; 8] = [0; 8];
        read_exact(rdr, &mut b, what)?;
        Ok(f64::from_be_bytes(b))
    }
    /// Length-prefixed body: BE u32 count, then that many bytes. The
    /// buffer is dropped on a short read, not leaked to the handler.
    fn read_variable(rdr: &mut dyn Read, what: &'static str) -> Result<Vec<u8>, LLSDError> {
        let length = read_u32(rdr, what)? as usize;
        let mut buf = vec![0u8; length];
        read_exact(rdr, &mut buf, what)?;
        Ok(buf)
    }
    /// Length-prefixed body that must be UTF-8 on the wire.
    fn read_text(rdr: &mut dyn Read, what: &'static str) -> Result<String, LLSDError> {
        String::from_utf8(read_variable(rdr, what)?)
            .map_err(|e| LLSDError::malformed(format!("{} is not UTF-8: {}", what, e)))
    }
    fn read_exact(
        rdr: &mut dyn Read,
        buf: &mut [u8],
        what: &'static str,
    ) -> Result<(), LLSDError> {
        rdr.read_exact(buf).map_err(|e| match e.kind() {
            std::io::ErrorKind::UnexpectedEof => LLSDError::TruncatedInput(what),
            _ => LLSDError::Io(e),
        })
    }

    let mut offset: u64 = 0;
    loop {
        //  Read the next type byte; clean end of input ends the parse.
        let mut marker = [0u8; 1];
        match rdr.read(&mut marker) {
            Ok(0) => return Ok(()),
            Ok(_) => {}
            Err(e) => return Err(LLSDError::Io(e)),
        }
        match marker[0] {
            //  Undefined - the empty value
            b'!' => deliver(handler.undef())?,
            //  Boolean - 1 or 0
            b'1' => deliver(handler.boolean(true))?,
            b'0' => deliver(handler.boolean(false))?,
            //  Integer - 4 bytes
            b'i' => deliver(handler.integer(read_i32(rdr, "integer record")?))?,
            //  Real - 8 bytes
            b'r' => deliver(handler.real(read_f64(rdr, "real record")?))?,
            //  UUID - 16 raw bytes
            b'u' => {
                let mut bits: [u8; 16] = [0u8; 16];
                read_exact(rdr, &mut bits, "uuid record")?;
                deliver(handler.uuid(Uuid::from_bytes(bits)))?;
            }
            //  String - length followed by data, no terminator on the wire
            b's' => deliver(handler.string(Cow::Owned(read_text(rdr, "string record")?)))?,
            //  URI - length followed by data
            b'l' => deliver(handler.uri(Cow::Owned(read_text(rdr, "uri record")?)))?,
            //  Binary - length followed by data
            b'b' => {
                deliver(handler.binary(Cow::Owned(read_variable(rdr, "binary record")?)))?
            }
            //  Date - 8 byte real, seconds since epoch
            b'd' => deliver(handler.date(read_f64(rdr, "date record")?))?,
            //  Array open - advisory count; `]` is authoritative
            b'[' => {
                let declared = read_u32(rdr, "array header")? as usize;
                deliver(handler.array_begin(declared))?;
            }
            b']' => deliver(handler.array_end())?,
            //  Map open - advisory count, then alternating key/value
            //  records; `}` is authoritative
            b'{' => {
                let declared = read_u32(rdr, "map header")? as usize;
                deliver(handler.map_begin(declared))?;
            }
            b'}' => deliver(handler.map_end())?,

            other => {
                return Err(LLSDError::UnknownTypeByte {
                    byte: other,
                    offset,
                })
            }
        }
        offset += 1;
    }
}

// Unit tests

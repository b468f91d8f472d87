//
//  de/xml.rs -- XML deserializer for LLSD
//
//  Library for serializing and de-serializing data in
//  Linden Lab Structured Data format.
//
//  Format documentation is at http://wiki.secondlife.com/wiki/LLSD
//
//  XML format. Runs on the quick-xml event stream, which reports tags
//  and character data but nothing about where one sibling value ends and
//  the next begins. A stack of `Step` states fills that gap: transitions
//  on value-producing end tags synthesize the `array_value_end`,
//  `map_key_end`, and `map_value_end` events the wire does not carry.
//
//  License: LGPL.
//
use crate::codec;
use crate::error::LLSDError;
use crate::sax::{deliver, LLSDHandler, LLSDTreeBuilder};
use crate::LLSDValue;
use quick_xml::events::attributes::Attributes;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::borrow::Cow;
use std::io::{BufRead, BufReader};
//
//  Constants
//
pub const LLSDXMLPREFIX: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<llsd>\n";
pub const LLSDXMLSENTINEL: &str = "<?xml"; // Must begin with this.

///    Parse LLSD expressed in XML into an LLSD tree.
pub fn from_str(xmlstr: &str) -> Result<LLSDValue, LLSDError> {
    from_reader(&mut BufReader::new(xmlstr.as_bytes()))
}

/// Read XML from a buffered source and parse into an LLSDValue.
pub fn from_reader<R: BufRead>(rdr: &mut R) -> Result<LLSDValue, LLSDError> {
    let mut builder = LLSDTreeBuilder::new();
    if let Err(err) = parse(rdr, &mut builder) {
        return Err(builder.take_error().unwrap_or(err));
    }
    builder.finish()
}

/// Where the parse currently sits relative to the enclosing container.
/// One entry per open `<llsd>`, `<array>`, or `<map>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    TopLevel,
    /// Inside `<array>`, no value delivered yet.
    ArrayStart,
    /// Inside `<array>`, at least one value delivered.
    ArrayValue,
    /// Inside `<map>`, no key delivered yet.
    MapStart,
    /// A key has been delivered; its value is expected.
    MapKey,
    /// A key/value pair is complete; a key or `</map>` is expected.
    MapValue,
}

/// The push-down state machine that synthesizes boundary events.
/// All transitions live here, in one place.
#[derive(Default)]
struct StepStack {
    steps: Vec<Step>,
}

impl StepStack {
    /// A value may only appear at top level, inside an array, or right
    /// after a map key.
    fn in_value_slot(&self) -> bool {
        matches!(
            self.steps.last(),
            Some(Step::TopLevel | Step::ArrayStart | Step::ArrayValue | Step::MapKey)
        )
    }

    /// A value (scalar or container) just closed. Fire whatever boundary
    /// the enclosing context now owes its consumer.
    fn value_closed<H: LLSDHandler>(&mut self, handler: &mut H) -> Result<(), LLSDError> {
        let top = match self.steps.last_mut() {
            Some(top) => top,
            None => return Err(LLSDError::structure("value outside <llsd>")),
        };
        match *top {
            Step::TopLevel => Ok(()),
            Step::ArrayStart => {
                *top = Step::ArrayValue;
                Ok(())
            }
            Step::ArrayValue => deliver(handler.array_value_end()),
            Step::MapKey => {
                *top = Step::MapValue;
                deliver(handler.map_key_end())
            }
            Step::MapStart | Step::MapValue => {
                Err(LLSDError::structure("value in a map where a key is required"))
            }
        }
    }

    /// A `<key>` just closed.
    fn key_closed<H: LLSDHandler>(&mut self, handler: &mut H) -> Result<(), LLSDError> {
        let top = match self.steps.last_mut() {
            Some(top) => top,
            None => return Err(LLSDError::structure("key outside <llsd>")),
        };
        match *top {
            Step::MapStart => {
                *top = Step::MapKey;
                Ok(())
            }
            Step::MapValue => {
                *top = Step::MapKey;
                deliver(handler.map_value_end())
            }
            _ => Err(LLSDError::structure("key outside of a map")),
        }
    }

    /// `<array>` or `<map>` is opening; it must sit in a value slot.
    fn open_container(&mut self, start: Step) -> Result<(), LLSDError> {
        if !self.in_value_slot() {
            return Err(LLSDError::structure(format!(
                "container not allowed here (state {:?})",
                self.steps.last()
            )));
        }
        self.steps.push(start);
        Ok(())
    }

    /// `</array>` closing; the container's own state pops before the
    /// parent context learns a value finished.
    fn close_array(&mut self) -> Result<(), LLSDError> {
        match self.steps.pop() {
            Some(Step::ArrayStart | Step::ArrayValue) => Ok(()),
            Some(other) => Err(LLSDError::structure(format!(
                "</array> while in state {:?}",
                other
            ))),
            None => Err(LLSDError::structure("</array> without opener")),
        }
    }

    /// `</map>` closing. Popping while a key still waits for its value
    /// is a structure error.
    fn close_map(&mut self) -> Result<(), LLSDError> {
        match self.steps.pop() {
            Some(Step::MapStart | Step::MapValue) => Ok(()),
            Some(Step::MapKey) => {
                Err(LLSDError::structure("</map> with a key missing its value"))
            }
            Some(other) => Err(LLSDError::structure(format!(
                "</map> while in state {:?}",
                other
            ))),
            None => Err(LLSDError::structure("</map> without opener")),
        }
    }
}

/// Walk the XML document, reporting values to the handler.
///
/// Character data accumulates between a scalar's start and end tags and
/// is consumed at the end tag; strings keep their interior whitespace,
/// numeric payloads tolerate it. `size` and `encoding` attributes are
/// read at start tags; `size` is advisory only.
pub fn parse<R: BufRead, H: LLSDHandler>(rdr: &mut R, handler: &mut H) -> Result<(), LLSDError> {
    let mut reader = Reader::from_reader(rdr);
    reader.expand_empty_elements(true); // want end tag events always
    let mut buf = Vec::new(); // reader work area
    let mut stack = StepStack::default();
    let mut text = String::new(); // character data for the open scalar
    let mut enc = codec::BinaryTextEncoding::Base64;
    let mut seen_document = false;
    let mut done = false;

    loop {
        match reader.read_event(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name() {
                b"llsd" => {
                    if !stack.steps.is_empty() {
                        return Err(LLSDError::structure("nested <llsd> block"));
                    }
                    if seen_document {
                        return Err(LLSDError::structure("more than one <llsd> block"));
                    }
                    seen_document = true;
                    stack.steps.push(Step::TopLevel);
                }
                b"array" => {
                    let declared = size_attr(&e.attributes())?;
                    stack.open_container(Step::ArrayStart)?;
                    deliver(handler.array_begin(declared))?;
                }
                b"map" => {
                    let declared = size_attr(&e.attributes())?;
                    stack.open_container(Step::MapStart)?;
                    deliver(handler.map_begin(declared))?;
                }
                b"binary" => {
                    enc = match get_attr(&e.attributes(), b"encoding")? {
                        Some(attr) => codec::BinaryTextEncoding::from_attr(&attr)?,
                        None => codec::BinaryTextEncoding::Base64, // default
                    };
                    text.clear();
                }
                b"undef" | b"boolean" | b"integer" | b"real" | b"uuid" | b"date"
                | b"string" | b"key" | b"uri" => text.clear(),
                other => {
                    return Err(LLSDError::UnknownTag(
                        String::from_utf8_lossy(other).into_owned(),
                    ))
                }
            },
            Ok(Event::Text(ref e)) => text.push_str(&e.unescape_and_decode(&reader)?),
            Ok(Event::End(ref e)) => {
                let payload = std::mem::take(&mut text);
                match e.name() {
                    b"llsd" => {
                        stack.steps.pop();
                        done = true;
                    }
                    b"undef" => {
                        deliver(handler.undef())?;
                        stack.value_closed(handler)?;
                    }
                    b"boolean" => {
                        deliver(handler.boolean(codec::boolean_from_text(&payload)))?;
                        stack.value_closed(handler)?;
                    }
                    b"integer" => {
                        deliver(handler.integer(codec::integer_from_text(&payload)?))?;
                        stack.value_closed(handler)?;
                    }
                    b"real" => {
                        deliver(handler.real(codec::real_from_text(&payload)?))?;
                        stack.value_closed(handler)?;
                    }
                    b"uuid" => {
                        deliver(handler.uuid(codec::uuid_from_text(&payload)?))?;
                        stack.value_closed(handler)?;
                    }
                    b"date" => {
                        deliver(handler.date(codec::date_from_text(&payload)?))?;
                        stack.value_closed(handler)?;
                    }
                    b"string" => {
                        deliver(handler.string(Cow::Owned(payload)))?;
                        stack.value_closed(handler)?;
                    }
                    b"key" => {
                        //  Keys are strings to the handler; the state
                        //  machine knows this one names a map entry.
                        deliver(handler.string(Cow::Owned(payload)))?;
                        stack.key_closed(handler)?;
                    }
                    b"uri" => {
                        deliver(handler.uri(Cow::Owned(payload)))?;
                        stack.value_closed(handler)?;
                    }
                    b"binary" => {
                        deliver(handler.binary(Cow::Owned(codec::binary_decode(
                            &payload, enc,
                        )?)))?;
                        stack.value_closed(handler)?;
                    }
                    b"array" => {
                        deliver(handler.array_end())?;
                        stack.close_array()?;
                        stack.value_closed(handler)?;
                    }
                    b"map" => {
                        deliver(handler.map_end())?;
                        stack.close_map()?;
                        stack.value_closed(handler)?;
                    }
                    other => {
                        return Err(LLSDError::UnknownTag(
                            String::from_utf8_lossy(other).into_owned(),
                        ))
                    }
                }
            }
            Ok(Event::Eof) => break,
            Ok(Event::Comment(_)) => {} // ignore comment
            Err(e) => return Err(LLSDError::Xml(e)),
            _ => (), // declaration, processing instructions, and the like
        }
        buf.clear();
    }
    if !seen_document {
        return Err(LLSDError::structure("no <llsd> block in data"));
    }
    if !done {
        return Err(LLSDError::TruncatedInput("llsd document"));
    }
    Ok(())
}

/// Advisory `size="n"` attribute; anything unparseable reads as zero.
fn size_attr(attrs: &Attributes) -> Result<usize, LLSDError> {
    Ok(get_attr(attrs, b"size")?
        .and_then(|s| s.trim().parse::<usize>().ok())
        .unwrap_or(0))
}

/// Search for an attribute in the attribute list.
fn get_attr(attrs: &Attributes, key: &[u8]) -> Result<Option<String>, LLSDError> {
    for attr in attrs.clone() {
        let a = attr.map_err(|e| LLSDError::malformed(format!("attribute: {}", e)))?;
        if a.key != key {
            continue; // not this one
        }
        let v = a
            .unescaped_value()
            .map_err(|e| LLSDError::malformed(format!("attribute value: {}", e)))?;
        let sv = std::str::from_utf8(&v)
            .map_err(|e| LLSDError::malformed(format!("attribute value: {}", e)))?;
        return Ok(Some(sv.to_string()));
    }
    Ok(None)
}

// Unit tests

//
//  sax.rs -- event-driven parsing interface.
//
//  Library for serializing and de-serializing data in
//  Linden Lab Structured Data format.
//
//  Format documentation is at http://wiki.secondlife.com/wiki/LLSD
//
//  Each parser walks its wire format and reports what it finds through
//  the `LLSDHandler` trait rather than building a tree itself. The
//  default consumer, `LLSDTreeBuilder`, assembles an `LLSDValue`;
//  alternative consumers can count, re-encode, or compare without ever
//  materializing one.
//
//  License: LGPL.
//
use crate::error::LLSDError;
use crate::{LLSDMap, LLSDValue};
use std::borrow::Cow;
use uuid::Uuid;

/// Receiver for parse events.
///
/// Every method returns `true` to continue or `false` to abort the parse;
/// an aborted parse surfaces as `LLSDError::Aborted` unless the handler
/// recorded something more specific.
///
/// `string`, `uri`, and `binary` hand over a `Cow`: an owned payload may
/// be kept without copying, a borrowed one must be cloned to outlive the
/// call. The bundled parsers always pass owned payloads. Map keys arrive
/// as ordinary `string` events; context decides which strings are keys.
///
/// The three `*_end` boundary events are synthesized by the parsers'
/// state machines; no wire format carries a token for them. They let a
/// streaming consumer close out a logical record (one array element, one
/// map entry) without counting nesting itself. `LLSDTreeBuilder` ignores
/// them, so they default to no-ops.
pub trait LLSDHandler {
    fn undef(&mut self) -> bool;
    fn boolean(&mut self, value: bool) -> bool;
    fn integer(&mut self, value: i32) -> bool;
    fn real(&mut self, value: f64) -> bool;
    fn uuid(&mut self, value: Uuid) -> bool;
    /// Seconds since the Unix epoch.
    fn date(&mut self, seconds: f64) -> bool;
    fn string(&mut self, value: Cow<'_, str>) -> bool;
    fn uri(&mut self, value: Cow<'_, str>) -> bool;
    fn binary(&mut self, value: Cow<'_, [u8]>) -> bool;
    /// `declared` is the advisory element count from the wire, 0 when the
    /// encoding carries none. The matching `array_end` is authoritative.
    fn array_begin(&mut self, declared: usize) -> bool;
    fn array_end(&mut self) -> bool;
    /// Advisory entry count, as for `array_begin`.
    fn map_begin(&mut self, declared: usize) -> bool;
    fn map_end(&mut self) -> bool;

    /// One array element has been completely delivered.
    fn array_value_end(&mut self) -> bool {
        true
    }
    /// A map key has been delivered and its value comes next.
    fn map_key_end(&mut self) -> bool {
        true
    }
    /// One key/value entry has been completely delivered.
    fn map_value_end(&mut self) -> bool {
        true
    }
}

/// Turn a handler's continue/abort answer into control flow.
pub(crate) fn deliver(keep_going: bool) -> Result<(), LLSDError> {
    if keep_going {
        Ok(())
    } else {
        Err(LLSDError::Aborted)
    }
}

/// A partially assembled container.
enum Frame {
    Array(Vec<LLSDValue>),
    Map {
        entries: LLSDMap,
        pending_key: Option<String>,
    },
}

/// The default handler: builds an `LLSDValue` tree from events.
///
/// Inside a map, string events alternate between keys and values; a
/// non-string in key position or a dangling key is a structure error.
/// Duplicate keys overwrite the earlier binding.
#[derive(Default)]
pub struct LLSDTreeBuilder {
    stack: Vec<Frame>,
    root: Option<LLSDValue>,
    error: Option<LLSDError>,
}

impl LLSDTreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The completed tree, or whatever stopped the build.
    pub fn finish(mut self) -> Result<LLSDValue, LLSDError> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        if !self.stack.is_empty() {
            return Err(LLSDError::TruncatedInput("unterminated container"));
        }
        self.root
            .take()
            .ok_or(LLSDError::TruncatedInput("empty document"))
    }

    /// The recorded structure error, if the builder was what aborted.
    /// Parse drivers prefer this over the generic abort error.
    pub fn take_error(&mut self) -> Option<LLSDError> {
        self.error.take()
    }

    fn fail(&mut self, err: LLSDError) -> bool {
        self.error = Some(err);
        false
    }

    /// Route a finished value to the enclosing container, or make it the
    /// root. Strings double as map keys when one is expected.
    fn emit(&mut self, value: LLSDValue) -> bool {
        //  Structural checks first, so the placement below cannot fail.
        match self.stack.last() {
            None if self.root.is_some() => {
                return self.fail(LLSDError::structure("more than one top-level value"));
            }
            Some(Frame::Map {
                pending_key: None, ..
            }) if !matches!(value, LLSDValue::String(_)) => {
                return self.fail(LLSDError::structure(format!(
                    "map key must be a string, got {}",
                    value.llsd_type()
                )));
            }
            _ => {}
        }
        match self.stack.last_mut() {
            None => self.root = Some(value),
            Some(Frame::Array(items)) => items.push(value),
            Some(Frame::Map {
                entries,
                pending_key,
            }) => match pending_key.take() {
                Some(key) => {
                    entries.insert(key, value);
                }
                None => {
                    if let LLSDValue::String(key) = value {
                        *pending_key = Some(key);
                    }
                }
            },
        }
        true
    }
}

impl LLSDHandler for LLSDTreeBuilder {
    fn undef(&mut self) -> bool {
        self.emit(LLSDValue::Undefined)
    }

    fn boolean(&mut self, value: bool) -> bool {
        self.emit(LLSDValue::Boolean(value))
    }

    fn integer(&mut self, value: i32) -> bool {
        self.emit(LLSDValue::Integer(value))
    }

    fn real(&mut self, value: f64) -> bool {
        self.emit(LLSDValue::Real(value))
    }

    fn uuid(&mut self, value: Uuid) -> bool {
        self.emit(LLSDValue::UUID(value))
    }

    fn date(&mut self, seconds: f64) -> bool {
        self.emit(LLSDValue::Date(seconds))
    }

    fn string(&mut self, value: Cow<'_, str>) -> bool {
        self.emit(LLSDValue::String(value.into_owned()))
    }

    fn uri(&mut self, value: Cow<'_, str>) -> bool {
        self.emit(LLSDValue::URI(value.into_owned()))
    }

    fn binary(&mut self, value: Cow<'_, [u8]>) -> bool {
        self.emit(LLSDValue::Binary(value.into_owned()))
    }

    fn array_begin(&mut self, declared: usize) -> bool {
        //  The declared size is advisory; cap the preallocation so a
        //  hostile header cannot reserve unbounded memory.
        self.stack
            .push(Frame::Array(Vec::with_capacity(declared.min(1024))));
        true
    }

    fn array_end(&mut self) -> bool {
        match self.stack.pop() {
            Some(Frame::Array(items)) => self.emit(LLSDValue::Array(items)),
            Some(frame) => {
                self.stack.push(frame);
                self.fail(LLSDError::structure("array terminator inside a map"))
            }
            None => self.fail(LLSDError::structure("array terminator without opener")),
        }
    }

    fn map_begin(&mut self, declared: usize) -> bool {
        self.stack.push(Frame::Map {
            entries: LLSDMap::with_capacity(declared.min(1024)),
            pending_key: None,
        });
        true
    }

    fn map_end(&mut self) -> bool {
        match self.stack.pop() {
            Some(Frame::Map {
                entries,
                pending_key: None,
            }) => self.emit(LLSDValue::Map(entries)),
            Some(Frame::Map {
                pending_key: Some(key),
                ..
            }) => self.fail(LLSDError::structure(format!(
                "map ended with key \"{}\" missing its value",
                key
            ))),
            Some(frame) => {
                self.stack.push(frame);
                self.fail(LLSDError::structure("map terminator inside an array"))
            }
            None => self.fail(LLSDError::structure("map terminator without opener")),
        }
    }
}

// Unit tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buildsnestedtree() {
        let mut b = LLSDTreeBuilder::new();
        assert!(b.array_begin(2));
        assert!(b.integer(1));
        assert!(b.map_begin(1));
        assert!(b.string(Cow::Borrowed("k")));
        assert!(b.string(Cow::Borrowed("v")));
        assert!(b.map_end());
        assert!(b.array_end());
        let tree = b.finish().unwrap();
        let items = tree.as_array().unwrap();
        assert_eq!(items[0], LLSDValue::Integer(1));
        assert_eq!(
            items[1].as_map().unwrap().get("k"),
            Some(&LLSDValue::String("v".to_string()))
        );
    }

    #[test]
    fn duplicatekeyoverwrites() {
        let mut b = LLSDTreeBuilder::new();
        assert!(b.map_begin(0));
        assert!(b.string(Cow::Borrowed("k")));
        assert!(b.integer(1));
        assert!(b.string(Cow::Borrowed("k")));
        assert!(b.integer(2));
        assert!(b.map_end());
        let tree = b.finish().unwrap();
        let map = tree.as_map().unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("k"), Some(&LLSDValue::Integer(2)));
    }

    #[test]
    fn nonstringkeyaborts() {
        let mut b = LLSDTreeBuilder::new();
        assert!(b.map_begin(0));
        assert!(!b.integer(1)); // integer in key position
        assert!(matches!(
            b.finish(),
            Err(LLSDError::StructureError(_))
        ));
    }

    #[test]
    fn danglingkeyfails() {
        let mut b = LLSDTreeBuilder::new();
        assert!(b.map_begin(0));
        assert!(b.string(Cow::Borrowed("orphan")));
        assert!(!b.map_end());
        assert!(b.finish().is_err());
    }

    #[test]
    fn unterminatedcontainerfails() {
        let mut b = LLSDTreeBuilder::new();
        assert!(b.array_begin(0));
        assert!(b.finish().is_err());
    }
}

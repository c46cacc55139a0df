//! SDP attribute (a=) lines and the per-scope attribute index
//!
//! An attribute line is split into six views of the same bytes. For
//! `a=rtpmap:8 PCMA/8000`:
//!
//! | field        | content               |
//! |--------------|-----------------------|
//! | `full_line`  | `a=rtpmap:8 PCMA/8000\r\n` |
//! | `line_value` | `rtpmap:8 PCMA/8000`  |
//! | `name`       | `rtpmap`              |
//! | `value`      | `8 PCMA/8000`         |
//! | `key`        | `rtpmap:8`            |
//! | `param`      | `PCMA/8000`           |
//!
//! Without a colon only `name` is set. Without a space in the value, `key`
//! covers the whole line value and `param` is absent.

use std::collections::HashMap;

use crate::span::Span;

/// One a= line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribute<'a> {
    /// The whole line including `a=` and its terminator
    pub full_line: Span<'a>,
    /// Everything after `a=`, without the terminator
    pub line_value: Span<'a>,
    pub name: Span<'a>,
    pub value: Option<Span<'a>>,
    pub key: Option<Span<'a>>,
    pub param: Option<Span<'a>>,
}

impl<'a> Attribute<'a> {
    /// Split the line starting at `line_start`, whose value occupies
    /// `value_start..value_end` and which ends (terminator included) at
    /// `line_next`.
    pub(crate) fn split(
        buf: &'a [u8],
        line_start: usize,
        value_start: usize,
        value_end: usize,
        line_next: usize,
    ) -> Self {
        let full_line = Span::new(buf, line_start, line_next);
        let line_value = Span::new(buf, value_start, value_end);

        let line = &buf[value_start..value_end];
        let Some(colon) = line.iter().position(|&b| b == b':') else {
            return Self {
                full_line,
                line_value,
                name: line_value,
                value: None,
                key: None,
                param: None,
            };
        };

        let name_end = value_start + colon;
        let value = Span::new(buf, name_end + 1, value_end);

        let (key_end, param) = match value.as_bytes().iter().position(|&b| b == b' ') {
            Some(space) => {
                let space = value.start() + space;
                let param = (space + 1 < value_end).then(|| Span::new(buf, space + 1, value_end));
                (space, param)
            }
            None => (value_end, None),
        };

        Self {
            full_line,
            line_value,
            name: Span::new(buf, value_start, name_end),
            value: Some(value),
            key: Some(Span::new(buf, value_start, key_end)),
            param,
        }
    }
}

/// Attributes of one session or media block, in order and by lookup key.
///
/// Both the name and, when present, the `name:first-token` key of every
/// attribute are indexed. A later attribute with the same name or key takes
/// over the lookup entry; the ordered list keeps all of them.
#[derive(Debug, Clone, Default)]
pub struct AttributeIndex<'a> {
    list: Vec<Attribute<'a>>,
    lookup: HashMap<&'a [u8], usize>,
}

impl<'a> AttributeIndex<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, attr: Attribute<'a>) {
        let idx = self.list.len();
        self.lookup.insert(attr.name.as_bytes(), idx);
        if let Some(key) = attr.key {
            self.lookup.insert(key.as_bytes(), idx);
        }
        self.list.push(attr);
    }

    /// Most recent attribute whose name or key equals `name`
    pub fn get(&self, name: &str) -> Option<&Attribute<'a>> {
        self.lookup
            .get(name.as_bytes())
            .and_then(|&idx| self.list.get(idx))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup.contains_key(name.as_bytes())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Attribute<'a>> {
        self.list.iter()
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}

impl<'s, 'a> IntoIterator for &'s AttributeIndex<'a> {
    type Item = &'s Attribute<'a>;
    type IntoIter = std::slice::Iter<'s, Attribute<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.list.iter()
    }
}

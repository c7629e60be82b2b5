//! Value dispatcher: one closed set of outcomes for a (pointer, tag) pair.

use std::fmt;
use std::io::Write;

use wpp_contracts::{TAG_ARRAY, TAG_OBJECT, TAG_SCALAR_BASE};

use crate::addr::Addr;
use crate::layout::{decode_array, decode_object, ArrayView, ObjectView};
use crate::policy::Policy;
use crate::scalar::{format_scalar, write_unknown, ScalarKind, ScalarView};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueTag {
    Array,
    Object,
    Scalar(ScalarKind),
}

impl ValueTag {
    pub fn code(self) -> i32 {
        match self {
            ValueTag::Array => TAG_ARRAY,
            ValueTag::Object => TAG_OBJECT,
            ValueTag::Scalar(kind) => TAG_SCALAR_BASE + kind.code(),
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            TAG_ARRAY => Some(ValueTag::Array),
            TAG_OBJECT => Some(ValueTag::Object),
            _ => ScalarKind::from_code(code.checked_sub(TAG_SCALAR_BASE)?).map(ValueTag::Scalar),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ValueTag::Array => "array",
            ValueTag::Object => "object",
            ValueTag::Scalar(kind) => kind.as_str(),
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "array" => Some(ValueTag::Array),
            "object" => Some(ValueTag::Object),
            other => ScalarKind::parse(other).map(ValueTag::Scalar),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Decoded {
    /// Null address; `tag` picks which placeholder is shown.
    Null { tag: i32 },
    Array(ArrayView),
    Object(ObjectView),
    Scalar(ScalarView),
    Unknown { code: i32, at: Addr },
}

/// Decodes the value at `p` as `tag`. The null check runs before any
/// tag-specific branch.
///
/// # Safety
/// If `p` is non-null and passes the address filter, it must point to a
/// value laid out as `tag` says.
pub unsafe fn decode(p: *const u8, tag: i32, policy: &Policy) -> Decoded {
    if p.is_null() {
        return Decoded::Null { tag };
    }
    match ValueTag::from_code(tag) {
        Some(ValueTag::Array) => Decoded::Array(decode_array(p, policy)),
        Some(ValueTag::Object) => Decoded::Object(decode_object(p, policy)),
        Some(ValueTag::Scalar(kind)) => Decoded::Scalar(format_scalar(p, kind.code(), policy)),
        None => Decoded::Unknown {
            code: tag,
            at: Addr::from(p),
        },
    }
}

impl Decoded {
    /// Appends the display form to `out`; text keeps its stored bytes.
    pub fn write_bytes(&self, out: &mut Vec<u8>) {
        match self {
            Decoded::Object(v) => v.write_bytes(out),
            Decoded::Scalar(v) => v.write_bytes(out),
            _ => out.extend_from_slice(self.to_string().as_bytes()),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write_bytes(&mut out);
        out
    }
}

impl fmt::Display for Decoded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decoded::Null { tag } => match ValueTag::from_code(*tag) {
                Some(ValueTag::Array) => fmt::Display::fmt(&ArrayView::Null, f),
                Some(ValueTag::Object) => fmt::Display::fmt(&ObjectView::Null, f),
                _ => fmt::Display::fmt(&ScalarView::Null, f),
            },
            Decoded::Array(v) => fmt::Display::fmt(v, f),
            Decoded::Object(v) => fmt::Display::fmt(v, f),
            Decoded::Scalar(v) => fmt::Display::fmt(v, f),
            Decoded::Unknown { code, at } => write_unknown(f, *code, *at),
        }
    }
}

/// Decodes and writes one line (the value text and `\n`) in a single write.
///
/// # Safety
/// Same contract as [`decode`].
pub unsafe fn dispatch_to<W: Write>(
    out: &mut W,
    p: *const u8,
    tag: i32,
    policy: &Policy,
) -> std::io::Result<()> {
    let mut line = decode(p, tag, policy).to_bytes();
    line.push(b'\n');
    out.write_all(&line)
}

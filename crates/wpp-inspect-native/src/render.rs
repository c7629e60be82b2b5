//! Bounded text renderer.

use std::ffi::{c_char, CStr};
use std::fmt;

use crate::addr::Addr;
use crate::policy::Policy;
use crate::utf8::looks_like_text;

/// A text value staged for display. Text bytes are kept exactly as read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TextView {
    Null,
    /// Failed the address filter or the UTF-8 probe; never read further.
    Invalid(Addr),
    Full(Vec<u8>),
    /// The first `max_visible_bytes` bytes, even when the cut lands inside a
    /// character.
    Truncated { shown: Vec<u8>, omitted: usize },
}

impl TextView {
    /// Byte length of the underlying text, when it was read.
    pub fn source_len(&self) -> Option<usize> {
        match self {
            TextView::Null | TextView::Invalid(_) => None,
            TextView::Full(b) => Some(b.len()),
            TextView::Truncated { shown, omitted } => Some(shown.len() + omitted),
        }
    }

    /// Appends the display form to `out`, text bytes unchanged.
    pub fn write_bytes(&self, out: &mut Vec<u8>) {
        match self {
            TextView::Full(b) => out.extend_from_slice(b),
            TextView::Truncated { shown, omitted } => {
                out.extend_from_slice(shown);
                out.extend_from_slice(b"... [truncated ");
                out.extend_from_slice(itoa::Buffer::new().format(*omitted).as_bytes());
                out.extend_from_slice(b" bytes]");
            }
            TextView::Null | TextView::Invalid(_) => {
                out.extend_from_slice(self.to_string().as_bytes())
            }
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write_bytes(&mut out);
        out
    }
}

/// Lossy: bytes that are not UTF-8 show up as U+FFFD. Sinks that must see
/// the stored bytes use [`TextView::write_bytes`].
impl fmt::Display for TextView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextView::Null => f.write_str("(null)"),
            TextView::Invalid(at) => write!(f, "(invalid UTF-8 or ptr={at})"),
            TextView::Full(b) => f.write_str(&String::from_utf8_lossy(b)),
            TextView::Truncated { shown, omitted } => {
                write!(
                    f,
                    "{}... [truncated {omitted} bytes]",
                    String::from_utf8_lossy(shown)
                )
            }
        }
    }
}

/// Validates `s` and copies at most `max_visible_bytes` of it.
///
/// # Safety
/// If `s` passes [`looks_like_text`], it must point to a readable
/// NUL-terminated buffer.
pub unsafe fn render_text(s: *const c_char, policy: &Policy) -> TextView {
    if s.is_null() {
        return TextView::Null;
    }
    if !looks_like_text(s.cast(), policy.max_probe_bytes as usize) {
        return TextView::Invalid(Addr::from(s));
    }

    let bytes = CStr::from_ptr(s).to_bytes();
    let cap = policy.max_visible_bytes as usize;
    if bytes.len() > cap {
        TextView::Truncated {
            shown: bytes[..cap].to_vec(),
            omitted: bytes.len() - cap,
        }
    } else {
        TextView::Full(bytes.to_vec())
    }
}

//! Decoders for the two compiler-defined record layouts.
//!
//! Counts and sub-pointers embedded in a layout are trusted: nothing here can
//! tell a count that overstates its backing allocation from a correct one.
//! The element clamp of [`Policy::max_elements`] bounds how far such a count
//! can lead the decoder, it does not make the read safe.

use std::ffi::c_char;
use std::fmt;

use wpp_contracts::{
    ARRAY_COUNT_OFFSET, ARRAY_ELEMS_OFFSET, OBJECT_COUNT_OFFSET, OBJECT_FIELDS_OFFSET,
};

use crate::addr::{probably_valid, Addr};
use crate::policy::Policy;
use crate::render::{render_text, TextView};

#[inline]
unsafe fn read_i32_at(base: *const u8, off: usize) -> i32 {
    base.add(off).cast::<i32>().read_unaligned()
}

#[inline]
unsafe fn read_ptr_at<T>(base: *const u8, off: usize) -> *const T {
    base.add(off).cast::<*const T>().read_unaligned()
}

/// Splits a stored count into (decoded, elided) under the element clamp.
fn clamp_count(count: i32, policy: &Policy) -> (usize, usize) {
    let count = count as usize;
    let shown = count.min(policy.max_elements as usize);
    (shown, count - shown)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArrayView {
    Null,
    Invalid(Addr),
    BadLength { len: i32, at: Addr },
    Items { items: Vec<i32>, elided: usize },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ObjectView {
    Null,
    Invalid(Addr),
    BadLength { len: i32, at: Addr },
    /// The key or value array pointer failed the address filter.
    BadFields(Addr),
    Fields {
        fields: Vec<(TextView, i32)>,
        elided: usize,
    },
}

/// Decodes `[count: i32][elem: i32; count]`.
///
/// # Safety
/// If `p` passes the address filter it must point to an array record whose
/// count does not overstate its elements.
pub unsafe fn decode_array(p: *const u8, policy: &Policy) -> ArrayView {
    if p.is_null() {
        return ArrayView::Null;
    }
    if !probably_valid(p) {
        return ArrayView::Invalid(Addr::from(p));
    }
    let count = read_i32_at(p, ARRAY_COUNT_OFFSET);
    if count < 0 {
        return ArrayView::BadLength {
            len: count,
            at: Addr::from(p),
        };
    }
    let (shown, elided) = clamp_count(count, policy);
    let items = (0..shown)
        .map(|i| read_i32_at(p, ARRAY_ELEMS_OFFSET + i * 4))
        .collect();
    ArrayView::Items { items, elided }
}

/// Decodes an object record: a count, then pointers to parallel key and
/// value arrays at [`OBJECT_FIELDS_OFFSET`].
///
/// Keys go through the same text gate as text scalars.
///
/// # Safety
/// If `p` passes the address filter it must point to an object header, and
/// its key and value arrays must hold at least `count` entries each.
pub unsafe fn decode_object(p: *const u8, policy: &Policy) -> ObjectView {
    if p.is_null() {
        return ObjectView::Null;
    }
    if !probably_valid(p) {
        return ObjectView::Invalid(Addr::from(p));
    }
    let count = read_i32_at(p, OBJECT_COUNT_OFFSET);
    if count < 0 {
        return ObjectView::BadLength {
            len: count,
            at: Addr::from(p),
        };
    }
    let (shown, elided) = clamp_count(count, policy);
    if count == 0 {
        return ObjectView::Fields {
            fields: Vec::new(),
            elided,
        };
    }

    let keys: *const *const c_char = read_ptr_at(p, OBJECT_FIELDS_OFFSET);
    let vals: *const i32 = read_ptr_at(p, OBJECT_FIELDS_OFFSET + std::mem::size_of::<usize>());
    if !probably_valid(keys) || !probably_valid(vals) {
        return ObjectView::BadFields(Addr::from(p));
    }

    let fields = (0..shown)
        .map(|i| {
            let key = render_text(keys.add(i).read_unaligned(), policy);
            (key, vals.add(i).read_unaligned())
        })
        .collect();
    ObjectView::Fields { fields, elided }
}

fn write_elided(f: &mut fmt::Formatter<'_>, any_shown: bool, elided: usize) -> fmt::Result {
    if elided == 0 {
        return Ok(());
    }
    if any_shown {
        f.write_str(", ")?;
    }
    write!(f, "... [{elided} more]")
}

impl fmt::Display for ArrayView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrayView::Null => f.write_str("(null array)"),
            ArrayView::Invalid(at) => write!(f, "(invalid array ptr={at})"),
            ArrayView::BadLength { len, at } => {
                write!(f, "(invalid array length={len}, ptr={at})")
            }
            ArrayView::Items { items, elided } => {
                f.write_str("[")?;
                let mut buf = itoa::Buffer::new();
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    f.write_str(buf.format(*v))?;
                }
                write_elided(f, !items.is_empty(), *elided)?;
                f.write_str("]")
            }
        }
    }
}

impl ObjectView {
    /// Appends the display form to `out` with key bytes unchanged.
    pub fn write_bytes(&self, out: &mut Vec<u8>) {
        let ObjectView::Fields { fields, elided } = self else {
            out.extend_from_slice(self.to_string().as_bytes());
            return;
        };
        let mut buf = itoa::Buffer::new();
        out.push(b'{');
        for (i, (k, v)) in fields.iter().enumerate() {
            if i > 0 {
                out.extend_from_slice(b", ");
            }
            k.write_bytes(out);
            out.extend_from_slice(b": ");
            out.extend_from_slice(buf.format(*v).as_bytes());
        }
        if *elided > 0 {
            if !fields.is_empty() {
                out.extend_from_slice(b", ");
            }
            out.extend_from_slice(b"... [");
            out.extend_from_slice(buf.format(*elided).as_bytes());
            out.extend_from_slice(b" more]");
        }
        out.push(b'}');
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write_bytes(&mut out);
        out
    }
}

impl fmt::Display for ObjectView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectView::Null => f.write_str("(null object)"),
            ObjectView::Invalid(at) => write!(f, "(invalid object ptr={at})"),
            ObjectView::BadLength { len, at } => {
                write!(f, "(invalid object length={len}, ptr={at})")
            }
            ObjectView::BadFields(at) => write!(f, "(invalid object fields ptr={at})"),
            ObjectView::Fields { .. } => f.write_str(&String::from_utf8_lossy(&self.to_bytes())),
        }
    }
}

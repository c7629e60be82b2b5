//! Owned values laid out the way generated code lays them out.
//!
//! Hosts and tests use these to hand the runtime real addresses. Every buffer
//! is boxed, so moving a staged value never moves the bytes a pointer into it
//! refers to.

use std::ffi::c_char;
use std::fmt;

/// More entries than an `i32` count can describe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CountOverflow {
    pub len: usize,
}

impl fmt::Display for CountOverflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} entries do not fit an i32 count", self.len)
    }
}

impl std::error::Error for CountOverflow {}

fn layout_count(len: usize) -> Result<i32, CountOverflow> {
    i32::try_from(len).map_err(|_| CountOverflow { len })
}

/// NUL-terminated text.
#[derive(Debug, Clone)]
pub struct StagedText {
    bytes: Box<[u8]>,
}

impl StagedText {
    pub fn new(s: &str) -> Self {
        Self::from_bytes(s.as_bytes())
    }

    /// Raw bytes, not validated; a NUL is appended.
    pub fn from_bytes(b: &[u8]) -> Self {
        let mut v = Vec::with_capacity(b.len() + 1);
        v.extend_from_slice(b);
        v.push(0);
        StagedText {
            bytes: v.into_boxed_slice(),
        }
    }

    pub fn as_ptr(&self) -> *const u8 {
        self.bytes.as_ptr()
    }

    pub fn as_c_ptr(&self) -> *const c_char {
        self.bytes.as_ptr().cast()
    }
}

/// A scalar slot: 4 or 8 bytes holding one value.
#[derive(Debug, Clone)]
pub struct StagedScalar {
    bytes: Box<[u8]>,
}

impl StagedScalar {
    fn from_bytes(b: &[u8]) -> Self {
        StagedScalar {
            bytes: b.to_vec().into_boxed_slice(),
        }
    }

    pub fn from_i32(v: i32) -> Self {
        Self::from_bytes(&v.to_ne_bytes())
    }

    pub fn from_i64(v: i64) -> Self {
        Self::from_bytes(&v.to_ne_bytes())
    }

    pub fn from_f32(v: f32) -> Self {
        Self::from_bytes(&v.to_ne_bytes())
    }

    pub fn from_f64(v: f64) -> Self {
        Self::from_bytes(&v.to_ne_bytes())
    }

    /// Booleans are stored as a 4-byte integer.
    pub fn from_bool(v: bool) -> Self {
        Self::from_i32(v as i32)
    }

    pub fn as_ptr(&self) -> *const u8 {
        self.bytes.as_ptr()
    }
}

/// `[count: i32][elem: i32; count]`
#[derive(Debug, Clone)]
pub struct StagedArray {
    words: Box<[i32]>,
}

impl StagedArray {
    pub fn try_new(items: &[i32]) -> Result<Self, CountOverflow> {
        let count = layout_count(items.len())?;
        let mut words = Vec::with_capacity(items.len() + 1);
        words.push(count);
        words.extend_from_slice(items);
        Ok(StagedArray {
            words: words.into_boxed_slice(),
        })
    }

    /// # Panics
    /// If `items` has more than `i32::MAX` entries.
    pub fn new(items: &[i32]) -> Self {
        match Self::try_new(items) {
            Ok(a) => a,
            Err(e) => panic!("{e}"),
        }
    }

    pub fn as_ptr(&self) -> *const u8 {
        self.words.as_ptr().cast()
    }
}

// Read by the decoder through raw pointers only.
#[allow(dead_code)]
#[repr(C)]
#[derive(Debug)]
struct ObjectHeader {
    count: i32,
    _pad: i32,
    keys: *const *const c_char,
    vals: *const i32,
}

/// Object header plus its parallel key and value arrays.
#[derive(Debug)]
pub struct StagedObject {
    header: Box<ObjectHeader>,
    _keys: Vec<StagedText>,
    _key_ptrs: Box<[*const c_char]>,
    _vals: Box<[i32]>,
}

impl StagedObject {
    /// # Panics
    /// If `fields` has more than `i32::MAX` entries.
    pub fn new(fields: &[(&str, i32)]) -> Self {
        let keys = fields
            .iter()
            .map(|(k, _)| k.as_bytes().to_vec())
            .collect();
        let vals: Vec<i32> = fields.iter().map(|(_, v)| *v).collect();
        Self::from_raw_keys(keys, &vals)
    }

    /// # Panics
    /// If both lists have more than `i32::MAX` entries.
    pub fn from_raw_keys(keys: Vec<Vec<u8>>, vals: &[i32]) -> Self {
        match Self::try_from_raw_keys(keys, vals) {
            Ok(o) => o,
            Err(e) => panic!("{e}"),
        }
    }

    /// Keys are taken as raw bytes so callers can stage keys that are not
    /// valid text. Extra keys or values beyond the shorter list are dropped.
    pub fn try_from_raw_keys(
        keys: Vec<Vec<u8>>,
        vals: &[i32],
    ) -> Result<Self, CountOverflow> {
        let n = keys.len().min(vals.len());
        let count = layout_count(n)?;
        let keys: Vec<StagedText> = keys[..n].iter().map(|k| StagedText::from_bytes(k)).collect();
        let key_ptrs: Box<[*const c_char]> = keys.iter().map(StagedText::as_c_ptr).collect();
        let vals: Box<[i32]> = vals[..n].into();
        let header = Box::new(ObjectHeader {
            count,
            _pad: 0,
            keys: key_ptrs.as_ptr(),
            vals: vals.as_ptr(),
        });
        Ok(StagedObject {
            header,
            _keys: keys,
            _key_ptrs: key_ptrs,
            _vals: vals,
        })
    }

    pub fn len(&self) -> usize {
        self.header.count as usize
    }

    pub fn is_empty(&self) -> bool {
        self.header.count == 0
    }

    pub fn as_ptr(&self) -> *const u8 {
        (&*self.header as *const ObjectHeader).cast()
    }
}

/// Any staged value, for callers that pick the layout at run time.
#[derive(Debug)]
pub enum Staged {
    Scalar(StagedScalar),
    Text(StagedText),
    Array(StagedArray),
    Object(StagedObject),
}

impl Staged {
    pub fn as_ptr(&self) -> *const u8 {
        match self {
            Staged::Scalar(v) => v.as_ptr(),
            Staged::Text(v) => v.as_ptr(),
            Staged::Array(v) => v.as_ptr(),
            Staged::Object(v) => v.as_ptr(),
        }
    }
}

//! Shared, version-pinned ABI identifiers.
//!
//! These constants are the single source of truth for the codes and byte
//! offsets that generated code and the inspection runtime agree on, and for
//! the schema strings that appear in machine-readable CLI output.

pub const WPP_INSPECT_REPORT_SCHEMA_VERSION: &str = "wpp-inspect.report@0.1.0";
pub const WPP_PROBE_REPORT_SCHEMA_VERSION: &str = "wpp-inspect.probe@0.1.0";

// Scalar kinds (`wpp_print_value_basic`).
pub const KIND_I32: i32 = 1;
pub const KIND_I64: i32 = 2;
pub const KIND_F32: i32 = 3;
pub const KIND_F64: i32 = 4;
pub const KIND_BOOL: i32 = 5;
pub const KIND_TEXT: i32 = 6;

// Value tags (`wpp_print_value`). Scalar tags are the scalar kind shifted
// past the two structured layouts.
pub const TAG_ARRAY: i32 = 1;
pub const TAG_OBJECT: i32 = 2;
pub const TAG_SCALAR_BASE: i32 = 2;
pub const TAG_I32: i32 = TAG_SCALAR_BASE + KIND_I32;
pub const TAG_I64: i32 = TAG_SCALAR_BASE + KIND_I64;
pub const TAG_F32: i32 = TAG_SCALAR_BASE + KIND_F32;
pub const TAG_F64: i32 = TAG_SCALAR_BASE + KIND_F64;
pub const TAG_BOOL: i32 = TAG_SCALAR_BASE + KIND_BOOL;
pub const TAG_TEXT: i32 = TAG_SCALAR_BASE + KIND_TEXT;

// Array layout: `[count: i32][elem: i32; count]`.
pub const ARRAY_COUNT_OFFSET: usize = 0;
pub const ARRAY_ELEMS_OFFSET: usize = 4;

// Object layout: `[count: i32][pad: 4][keys: *const *const c_char][vals: *const i32]`.
pub const OBJECT_COUNT_OFFSET: usize = 0;
pub const OBJECT_FIELDS_OFFSET: usize = 8;
pub const OBJECT_HEADER_BYTES: usize = OBJECT_FIELDS_OFFSET + 2 * core::mem::size_of::<usize>();

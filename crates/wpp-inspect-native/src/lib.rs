//! Value-inspection runtime for compiled W++ programs.
//!
//! Generated code calls the `wpp_*` exports below with a raw address and a
//! type code; the runtime prints a display form of whatever lives there. The
//! address may be stale, foreign or garbage, so every read is gated by the
//! heuristics in [`addr`] and [`utf8`]. Those heuristics lower the chance of
//! touching unmapped memory; they cannot rule it out. Counts stored inside
//! array and object records are trusted as given.
//!
//! # ABI
//!
//! | export | output |
//! |---|---|
//! | `wpp_print_value_basic(ptr, kind)` | scalar text, then a space |
//! | `wpp_print_array(ptr)` | `[a, b, ..]`, then `\n` |
//! | `wpp_print_object(ptr)` | `{k: v, ..}`, then `\n` |
//! | `wpp_print_value(ptr, tag)` | any of the above by value tag, then `\n` |
//! | `wpp_readline()` | next stdin line, thread-local storage |
//! | `wpp_int_to_string(v)` | decimal text, thread-local storage |
//!
//! Kind and tag codes live in `wpp-contracts`.

#![allow(clippy::missing_safety_doc)]
#![allow(clippy::not_unsafe_ptr_arg_deref)]

use std::ffi::{c_char, c_void};
use std::io::Write;

pub mod addr;
pub mod layout;
pub mod line;
pub mod policy;
pub mod render;
pub mod scalar;
pub mod staging;
pub mod utf8;
pub mod value;

pub use addr::{probably_valid, Addr};
pub use layout::{decode_array, decode_object, ArrayView, ObjectView};
pub use line::{int_to_text, read_line_from};
pub use policy::{policy, Policy};
pub use render::{render_text, TextView};
pub use scalar::{fmt_general, format_scalar, ScalarKind, ScalarView};
pub use utf8::{looks_like_plain_ascii, looks_like_text};
pub use value::{decode, dispatch_to, Decoded, ValueTag};

pub const INTERNAL_ERROR_TEXT: &str = "(internal error)";

/// Renders on the caller's thread, then writes text and separator in one go.
/// A panic while rendering is written as [`INTERNAL_ERROR_TEXT`].
fn emit_to<W, F>(out: &mut W, sep: &[u8], render: F) -> std::io::Result<()>
where
    W: Write,
    F: FnOnce() -> Vec<u8> + std::panic::UnwindSafe,
{
    let mut bytes = std::panic::catch_unwind(render)
        .unwrap_or_else(|_| INTERNAL_ERROR_TEXT.as_bytes().to_vec());
    bytes.extend_from_slice(sep);
    out.write_all(&bytes)?;
    out.flush()
}

fn print_scalar_to<W: Write>(
    out: &mut W,
    ptr: *const c_void,
    type_id: i32,
    policy: &Policy,
) -> std::io::Result<()> {
    emit_to(out, b" ", || unsafe {
        format_scalar(ptr.cast(), type_id, policy).to_bytes()
    })
}

fn print_array_to<W: Write>(
    out: &mut W,
    ptr: *const c_void,
    policy: &Policy,
) -> std::io::Result<()> {
    emit_to(out, b"\n", || unsafe {
        decode_array(ptr.cast(), policy).to_string().into_bytes()
    })
}

fn print_object_to<W: Write>(
    out: &mut W,
    ptr: *const c_void,
    policy: &Policy,
) -> std::io::Result<()> {
    emit_to(out, b"\n", || unsafe { decode_object(ptr.cast(), policy).to_bytes() })
}

fn print_value_to<W: Write>(
    out: &mut W,
    ptr: *const c_void,
    tag: i32,
    policy: &Policy,
) -> std::io::Result<()> {
    emit_to(out, b"\n", || unsafe { decode(ptr.cast(), tag, policy).to_bytes() })
}

// The print exports never unwind into generated code; a closed stdout is
// ignored.

#[no_mangle]
pub extern "C" fn wpp_print_value_basic(ptr: *const c_void, type_id: i32) {
    let _ = print_scalar_to(&mut std::io::stdout().lock(), ptr, type_id, policy());
}

#[no_mangle]
pub extern "C" fn wpp_print_array(ptr: *const c_void) {
    let _ = print_array_to(&mut std::io::stdout().lock(), ptr, policy());
}

#[no_mangle]
pub extern "C" fn wpp_print_object(ptr: *const c_void) {
    let _ = print_object_to(&mut std::io::stdout().lock(), ptr, policy());
}

#[no_mangle]
pub extern "C" fn wpp_print_value(ptr: *const c_void, tag: i32) {
    let _ = print_value_to(&mut std::io::stdout().lock(), ptr, tag, policy());
}

/// Next line of stdin without its newline; empty at end of input or on a
/// read error. Valid until the next `wpp_readline` on this thread.
#[no_mangle]
pub extern "C" fn wpp_readline() -> *const c_char {
    let bytes = std::panic::catch_unwind(|| {
        let max = policy().max_line_bytes as usize;
        read_line_from(&mut std::io::stdin().lock(), max)
            .ok()
            .flatten()
            .unwrap_or_default()
    })
    .unwrap_or_default();
    line::stash_line(&bytes)
}

/// Valid until the next `wpp_int_to_string` on this thread.
#[no_mangle]
pub extern "C" fn wpp_int_to_string(value: i32) -> *const c_char {
    line::stash_int(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::staging::{StagedArray, StagedObject, StagedScalar, StagedText};
    use std::ffi::CStr;
    use wpp_contracts::{KIND_BOOL, KIND_I32, KIND_TEXT, TAG_OBJECT, TAG_TEXT};

    #[test]
    fn int_export_matches_pure_form() {
        for v in [-42, 0, 7, i32::MAX] {
            let p = wpp_int_to_string(v);
            assert_eq!(
                unsafe { CStr::from_ptr(p) }.to_str().expect("ascii"),
                int_to_text(v)
            );
        }
    }

    fn captured<F>(print: F) -> Vec<u8>
    where
        F: FnOnce(&mut Vec<u8>) -> std::io::Result<()>,
    {
        let mut out = Vec::new();
        print(&mut out).expect("write to vec");
        out
    }

    #[test]
    fn panicking_renderer_writes_internal_error() {
        let out = captured(|w| emit_to(w, b"\n", || panic!("renderer bug")));
        assert_eq!(out, b"(internal error)\n");
        let out = captured(|w| emit_to(w, b" ", || b"still alive".to_vec()));
        assert_eq!(out, b"still alive ");
    }

    #[test]
    fn scalar_export_ends_with_a_space() {
        let p = Policy::default();
        let n = StagedScalar::from_i32(7);
        let b = StagedScalar::from_bool(false);
        let t = StagedText::new("hi");
        assert_eq!(
            captured(|w| print_scalar_to(w, n.as_ptr().cast(), KIND_I32, &p)),
            b"7 "
        );
        assert_eq!(
            captured(|w| print_scalar_to(w, b.as_ptr().cast(), KIND_BOOL, &p)),
            b"false "
        );
        assert_eq!(
            captured(|w| print_scalar_to(w, t.as_ptr().cast(), KIND_TEXT, &p)),
            b"hi "
        );
        assert_eq!(
            captured(|w| print_scalar_to(w, std::ptr::null(), KIND_I32, &p)),
            b"(null) "
        );
    }

    #[test]
    fn container_exports_end_with_a_newline() {
        let p = Policy::default();
        let arr = StagedArray::new(&[1, 2]);
        let obj = StagedObject::new(&[("k", 9)]);
        assert_eq!(
            captured(|w| print_array_to(w, arr.as_ptr().cast(), &p)),
            b"[1, 2]\n"
        );
        assert_eq!(
            captured(|w| print_object_to(w, obj.as_ptr().cast(), &p)),
            b"{k: 9}\n"
        );
        assert_eq!(
            captured(|w| print_array_to(w, std::ptr::null(), &p)),
            b"(null array)\n"
        );
        assert_eq!(
            captured(|w| print_object_to(w, std::ptr::null(), &p)),
            b"(null object)\n"
        );
    }

    #[test]
    fn value_export_ends_with_a_newline() {
        let p = Policy::default();
        let t = StagedText::new("hi");
        assert_eq!(
            captured(|w| print_value_to(w, t.as_ptr().cast(), TAG_TEXT, &p)),
            b"hi\n"
        );
        assert_eq!(
            captured(|w| print_value_to(w, std::ptr::null(), TAG_OBJECT, &p)),
            b"(null object)\n"
        );
        assert_eq!(
            captured(|w| print_value_to(w, std::ptr::null(), 99, &p)),
            b"(null)\n"
        );
    }
}

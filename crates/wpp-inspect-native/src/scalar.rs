//! Scalar formatter.

use std::fmt;

use wpp_contracts::{KIND_BOOL, KIND_F32, KIND_F64, KIND_I32, KIND_I64, KIND_TEXT};

use crate::addr::{probably_valid, Addr};
use crate::policy::Policy;
use crate::render::{render_text, TextView};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    I32,
    I64,
    F32,
    F64,
    Bool,
    Text,
}

impl ScalarKind {
    pub const ALL: [ScalarKind; 6] = [
        ScalarKind::I32,
        ScalarKind::I64,
        ScalarKind::F32,
        ScalarKind::F64,
        ScalarKind::Bool,
        ScalarKind::Text,
    ];

    pub fn code(self) -> i32 {
        match self {
            ScalarKind::I32 => KIND_I32,
            ScalarKind::I64 => KIND_I64,
            ScalarKind::F32 => KIND_F32,
            ScalarKind::F64 => KIND_F64,
            ScalarKind::Bool => KIND_BOOL,
            ScalarKind::Text => KIND_TEXT,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        ScalarKind::ALL.into_iter().find(|k| k.code() == code)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ScalarKind::I32 => "i32",
            ScalarKind::I64 => "i64",
            ScalarKind::F32 => "f32",
            ScalarKind::F64 => "f64",
            ScalarKind::Bool => "bool",
            ScalarKind::Text => "text",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "i32" => Some(ScalarKind::I32),
            "i64" => Some(ScalarKind::I64),
            "f32" => Some(ScalarKind::F32),
            "f64" => Some(ScalarKind::F64),
            "bool" => Some(ScalarKind::Bool),
            "text" | "string" => Some(ScalarKind::Text),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ScalarView {
    Null,
    Invalid(Addr),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Bool(bool),
    Text(TextView),
    Unknown { code: i32, at: Addr },
}

/// Reads the scalar of kind `code` stored at `p`.
///
/// An unknown `code` is reported without touching memory. Text is the one
/// kind where `p` is the value itself rather than a slot holding it.
///
/// # Safety
/// If `p` passes the address filter it must point to a readable value of the
/// width `code` names (or, for text, to a NUL-terminated buffer).
pub unsafe fn format_scalar(p: *const u8, code: i32, policy: &Policy) -> ScalarView {
    if p.is_null() {
        return ScalarView::Null;
    }
    let Some(kind) = ScalarKind::from_code(code) else {
        return ScalarView::Unknown {
            code,
            at: Addr::from(p),
        };
    };
    match kind {
        ScalarKind::Text => ScalarView::Text(render_text(p.cast(), policy)),
        _ if !probably_valid(p) => ScalarView::Invalid(Addr::from(p)),
        ScalarKind::I32 => ScalarView::I32(p.cast::<i32>().read_unaligned()),
        ScalarKind::I64 => ScalarView::I64(p.cast::<i64>().read_unaligned()),
        ScalarKind::F32 => ScalarView::F32(p.cast::<f32>().read_unaligned()),
        ScalarKind::F64 => ScalarView::F64(p.cast::<f64>().read_unaligned()),
        ScalarKind::Bool => ScalarView::Bool(p.cast::<i32>().read_unaligned() != 0),
    }
}

pub(crate) fn write_unknown(f: &mut fmt::Formatter<'_>, code: i32, at: Addr) -> fmt::Result {
    write!(f, "(unknown type_id={code}, ptr={at})")
}

impl ScalarView {
    /// Appends the display form to `out`; text keeps its stored bytes.
    pub fn write_bytes(&self, out: &mut Vec<u8>) {
        match self {
            ScalarView::Text(t) => t.write_bytes(out),
            _ => out.extend_from_slice(self.to_string().as_bytes()),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write_bytes(&mut out);
        out
    }
}

impl fmt::Display for ScalarView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarView::Null => f.write_str("(null)"),
            ScalarView::Invalid(at) => write!(f, "(invalid ptr={at})"),
            ScalarView::I32(v) => f.write_str(itoa::Buffer::new().format(*v)),
            ScalarView::I64(v) => f.write_str(itoa::Buffer::new().format(*v)),
            ScalarView::F32(v) => f.write_str(&fmt_general(f64::from(*v), 6)),
            ScalarView::F64(v) => f.write_str(&fmt_general(*v, 6)),
            ScalarView::Bool(b) => f.write_str(if *b { "true" } else { "false" }),
            ScalarView::Text(t) => fmt::Display::fmt(t, f),
            ScalarView::Unknown { code, at } => write_unknown(f, *code, *at),
        }
    }
}

/// Formats like C's `%.{precision}g`.
pub fn fmt_general(v: f64, precision: usize) -> String {
    let p = precision.max(1);
    if v.is_nan() {
        return if v.is_sign_negative() { "-nan" } else { "nan" }.to_string();
    }
    if v.is_infinite() {
        return if v < 0.0 { "-inf" } else { "inf" }.to_string();
    }
    if v == 0.0 {
        return if v.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    // The exponent is taken after rounding to `p` digits, as C does.
    let sci = format!("{:.*e}", p - 1, v);
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return sci;
    };
    let exp: i32 = exp.parse().unwrap_or(0);

    if exp < -4 || exp >= p as i32 {
        let sign = if exp < 0 { '-' } else { '+' };
        format!(
            "{}e{sign}{:02}",
            trim_fraction(mantissa),
            exp.unsigned_abs()
        )
    } else {
        let decimals = (p as i32 - 1 - exp) as usize;
        trim_fraction(&format!("{v:.decimals$}")).to_string()
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar<T>(v: &T, kind: ScalarKind) -> String {
        let p = (v as *const T).cast::<u8>();
        unsafe { format_scalar(p, kind.code(), &Policy::default()) }.to_string()
    }

    #[test]
    fn kind_codes_round_trip() {
        for k in ScalarKind::ALL {
            assert_eq!(ScalarKind::from_code(k.code()), Some(k));
            assert_eq!(ScalarKind::parse(k.as_str()), Some(k));
        }
        assert_eq!(ScalarKind::from_code(0), None);
        assert_eq!(ScalarKind::from_code(7), None);
    }

    #[test]
    fn integers() {
        assert_eq!(scalar(&-42i32, ScalarKind::I32), "-42");
        assert_eq!(scalar(&i64::MIN, ScalarKind::I64), "-9223372036854775808");
    }

    #[test]
    fn bool_is_nonzero_test_on_four_bytes() {
        assert_eq!(scalar(&0i32, ScalarKind::Bool), "false");
        assert_eq!(scalar(&1i32, ScalarKind::Bool), "true");
        assert_eq!(scalar(&-7i32, ScalarKind::Bool), "true");
    }

    #[test]
    fn floats_use_six_significant_digits() {
        assert_eq!(scalar(&3.14159265f64, ScalarKind::F64), "3.14159");
        assert_eq!(scalar(&0.1f32, ScalarKind::F32), "0.1");
        assert_eq!(scalar(&2.5f32, ScalarKind::F32), "2.5");
    }

    #[test]
    fn text_is_rendered_in_place() {
        let b = b"hi there\0";
        let s = unsafe { format_scalar(b.as_ptr(), ScalarKind::Text.code(), &Policy::default()) };
        assert_eq!(s.to_string(), "hi there");
    }

    #[test]
    fn null_wins_over_unknown_kind() {
        let s = unsafe { format_scalar(std::ptr::null(), 99, &Policy::default()) };
        assert_eq!(s.to_string(), "(null)");
    }

    #[test]
    fn unknown_kind_names_code_and_address() {
        let v = 5i32;
        let p = (&v as *const i32).cast::<u8>();
        let s = unsafe { format_scalar(p, 42, &Policy::default()) };
        assert_eq!(
            s.to_string(),
            format!("(unknown type_id=42, ptr={:#x})", p as usize)
        );
    }

    #[test]
    fn implausible_scalar_address_is_not_read() {
        let s = unsafe { format_scalar(0x8 as *const u8, KIND_I32, &Policy::default()) };
        assert_eq!(s.to_string(), "(invalid ptr=0x8)");
    }

    #[test]
    fn general_format_matches_c() {
        let cases: &[(f64, &str)] = &[
            (0.0, "0"),
            (-0.0, "-0"),
            (1.0, "1"),
            (100000.0, "100000"),
            (1_000_000.0, "1e+06"),
            (123456789.0, "1.23457e+08"),
            (0.0001, "0.0001"),
            (0.00001, "1e-05"),
            (0.000123456789, "0.000123457"),
            (-2.5, "-2.5"),
            (9.9999996, "10"),
            (999999.5, "1e+06"),
            (1.5e-300, "1.5e-300"),
            (f64::INFINITY, "inf"),
            (f64::NEG_INFINITY, "-inf"),
            (f64::NAN, "nan"),
        ];
        for &(v, want) in cases {
            assert_eq!(fmt_general(v, 6), want, "value {v:?}");
        }
    }
}

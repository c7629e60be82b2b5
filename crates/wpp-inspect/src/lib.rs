//! Host side of `wpp-inspect`: stages JSON values in the compiler's layouts
//! and summarizes what the runtime makes of them.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use serde_json::Value;

use wpp_contracts::{WPP_INSPECT_REPORT_SCHEMA_VERSION, WPP_PROBE_REPORT_SCHEMA_VERSION};
use wpp_inspect::staging::{Staged, StagedArray, StagedObject, StagedScalar, StagedText};
use wpp_inspect::{
    decode, looks_like_plain_ascii, looks_like_text, probably_valid, render_text, ArrayView,
    Decoded, ObjectView, Policy, ScalarKind, ScalarView, TextView, ValueTag,
};

#[derive(clap::Args, Debug, Clone, Default)]
pub struct PolicyArgs {
    /// Bytes scanned by the text probes.
    #[arg(long, value_name = "BYTES", value_parser = clap::value_parser!(u32).range(1..))]
    pub max_probe_bytes: Option<u32>,

    /// Bytes of a text value shown before the truncation marker.
    #[arg(long, value_name = "BYTES", value_parser = clap::value_parser!(u32).range(1..))]
    pub max_visible_bytes: Option<u32>,

    /// Array elements or object fields shown per value.
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub max_elements: Option<u32>,
}

impl PolicyArgs {
    pub fn apply(&self, mut policy: Policy) -> Policy {
        if let Some(n) = self.max_probe_bytes {
            policy.max_probe_bytes = n;
        }
        if let Some(n) = self.max_visible_bytes {
            policy.max_visible_bytes = n;
        }
        if let Some(n) = self.max_elements {
            policy.max_elements = n;
        }
        policy
    }
}

fn json_i32(v: &Value, what: &str) -> Result<i32> {
    let n = v
        .as_i64()
        .with_context(|| format!("{what}: expected an integer, got {v}"))?;
    i32::try_from(n).with_context(|| format!("{what}: {n} does not fit in i32"))
}

fn json_text(s: &str, what: &str) -> Result<StagedText> {
    if s.as_bytes().contains(&0) {
        bail!("{what}: text must not contain NUL");
    }
    Ok(StagedText::new(s))
}

/// Lays out `v` the way generated code stores a value of type `tag`.
pub fn stage_json(tag: ValueTag, v: &Value) -> Result<Staged> {
    let staged = match tag {
        ValueTag::Array => {
            let items = v.as_array().context("array: expected a JSON array")?;
            let items = items
                .iter()
                .enumerate()
                .map(|(i, item)| json_i32(item, &format!("array[{i}]")))
                .collect::<Result<Vec<i32>>>()?;
            Staged::Array(StagedArray::try_new(&items).context("array")?)
        }
        ValueTag::Object => {
            let map = v.as_object().context("object: expected a JSON object")?;
            let mut keys = Vec::with_capacity(map.len());
            let mut vals = Vec::with_capacity(map.len());
            for (k, item) in map {
                if k.as_bytes().contains(&0) {
                    bail!("object: key {k:?} must not contain NUL");
                }
                keys.push(k.as_bytes().to_vec());
                vals.push(json_i32(item, &format!("object.{k}"))?);
            }
            Staged::Object(StagedObject::try_from_raw_keys(keys, &vals).context("object")?)
        }
        ValueTag::Scalar(kind) => match kind {
            ScalarKind::I32 => Staged::Scalar(StagedScalar::from_i32(json_i32(v, "i32")?)),
            ScalarKind::I64 => {
                let n = v.as_i64().context("i64: expected an integer")?;
                Staged::Scalar(StagedScalar::from_i64(n))
            }
            ScalarKind::F32 => {
                let n = v.as_f64().context("f32: expected a number")?;
                Staged::Scalar(StagedScalar::from_f32(n as f32))
            }
            ScalarKind::F64 => {
                let n = v.as_f64().context("f64: expected a number")?;
                Staged::Scalar(StagedScalar::from_f64(n))
            }
            ScalarKind::Bool => match v {
                Value::Bool(b) => Staged::Scalar(StagedScalar::from_bool(*b)),
                _ => Staged::Scalar(StagedScalar::from_i32(json_i32(v, "bool")?)),
            },
            ScalarKind::Text => {
                let s = v.as_str().context("text: expected a JSON string")?;
                Staged::Text(json_text(s, "text")?)
            }
        },
    };
    Ok(staged)
}

/// A staged buffer paired with the tag it was laid out for.
#[derive(Debug)]
pub struct StagedValue {
    tag_code: i32,
    staged: Option<Staged>,
}

impl StagedValue {
    pub fn from_json(tag: ValueTag, v: &Value) -> Result<Self> {
        Ok(StagedValue {
            tag_code: tag.code(),
            staged: Some(stage_json(tag, v)?),
        })
    }

    /// A null address under any tag code.
    pub fn null(tag_code: i32) -> Self {
        StagedValue {
            tag_code,
            staged: None,
        }
    }

    /// Stages `v` for a raw tag code. Unknown codes get an 8-byte zero slot,
    /// which the runtime reports without reading.
    pub fn from_raw_tag(tag_code: i32, v: &Value) -> Result<Self> {
        match ValueTag::from_code(tag_code) {
            Some(tag) => Self::from_json(tag, v),
            None => Ok(StagedValue {
                tag_code,
                staged: Some(Staged::Scalar(StagedScalar::from_i64(0))),
            }),
        }
    }

    pub fn tag_code(&self) -> i32 {
        self.tag_code
    }

    pub fn as_ptr(&self) -> *const u8 {
        self.staged.as_ref().map_or(std::ptr::null(), Staged::as_ptr)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Null,
    Value,
    Invalid,
    Unknown,
}

fn text_outcome(t: &TextView) -> Outcome {
    match t {
        TextView::Null => Outcome::Null,
        TextView::Invalid(_) => Outcome::Invalid,
        TextView::Full(_) | TextView::Truncated { .. } => Outcome::Value,
    }
}

pub fn classify(d: &Decoded) -> Outcome {
    match d {
        Decoded::Null { .. } => Outcome::Null,
        Decoded::Unknown { .. } => Outcome::Unknown,
        Decoded::Array(a) => match a {
            ArrayView::Null => Outcome::Null,
            ArrayView::Invalid(_) | ArrayView::BadLength { .. } => Outcome::Invalid,
            ArrayView::Items { .. } => Outcome::Value,
        },
        Decoded::Object(o) => match o {
            ObjectView::Null => Outcome::Null,
            ObjectView::Invalid(_) | ObjectView::BadLength { .. } | ObjectView::BadFields(_) => {
                Outcome::Invalid
            }
            ObjectView::Fields { .. } => Outcome::Value,
        },
        Decoded::Scalar(s) => match s {
            ScalarView::Null => Outcome::Null,
            ScalarView::Invalid(_) => Outcome::Invalid,
            ScalarView::Unknown { .. } => Outcome::Unknown,
            ScalarView::Text(t) => text_outcome(t),
            _ => Outcome::Value,
        },
    }
}

fn is_truncated(t: &TextView) -> bool {
    matches!(t, TextView::Truncated { .. })
}

/// Whether any text in the value was cut at the visible limit.
pub fn any_truncated(d: &Decoded) -> bool {
    match d {
        Decoded::Scalar(ScalarView::Text(t)) => is_truncated(t),
        Decoded::Object(ObjectView::Fields { fields, .. }) => {
            fields.iter().any(|(k, _)| is_truncated(k))
        }
        _ => false,
    }
}

/// Elements or fields left out by the element cap.
pub fn elided(d: &Decoded) -> usize {
    match d {
        Decoded::Array(ArrayView::Items { elided, .. }) => *elided,
        Decoded::Object(ObjectView::Fields { elided, .. }) => *elided,
        _ => 0,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ShowReport {
    pub schema_version: &'static str,
    pub tag: &'static str,
    pub tag_code: i32,
    pub outcome: Outcome,
    pub text: String,
    pub truncated: bool,
    pub elided: usize,
}

/// Dispatches a staged value and reports the result.
pub fn show(value: &StagedValue, policy: &Policy) -> ShowReport {
    let tag_code = value.tag_code;
    // The buffer was laid out for `tag_code`, or is null.
    let d = unsafe { decode(value.as_ptr(), tag_code, policy) };
    ShowReport {
        schema_version: WPP_INSPECT_REPORT_SCHEMA_VERSION,
        tag: ValueTag::from_code(tag_code).map_or("unknown", ValueTag::as_str),
        tag_code,
        outcome: classify(&d),
        text: d.to_string(),
        truncated: any_truncated(&d),
        elided: elided(&d),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    pub schema_version: &'static str,
    pub len: usize,
    pub hex: String,
    pub probably_valid: bool,
    pub looks_like_text: bool,
    pub plain_ascii: bool,
    pub text: String,
    pub truncated: bool,
}

/// Runs the address filter, both text probes and the renderer over `bytes`
/// (NUL appended).
pub fn probe_bytes(bytes: &[u8], policy: &Policy) -> ProbeReport {
    let staged = StagedText::from_bytes(bytes);
    let max_probe = policy.max_probe_bytes as usize;
    let (valid, text_ok, ascii_ok, view) = unsafe {
        (
            probably_valid(staged.as_ptr()),
            looks_like_text(staged.as_ptr(), max_probe),
            looks_like_plain_ascii(staged.as_ptr(), max_probe),
            render_text(staged.as_c_ptr(), policy),
        )
    };
    ProbeReport {
        schema_version: WPP_PROBE_REPORT_SCHEMA_VERSION,
        len: bytes.len(),
        hex: hex::encode(bytes),
        probably_valid: valid,
        looks_like_text: text_ok,
        plain_ascii: ascii_ok,
        truncated: is_truncated(&view),
        text: view.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wpp_contracts::{TAG_ARRAY, TAG_F64, TAG_I32, TAG_OBJECT, TAG_TEXT};

    fn show_json(tag: &str, v: Value) -> ShowReport {
        let tag = ValueTag::parse(tag).expect("known tag");
        let value = StagedValue::from_json(tag, &v).expect("stage");
        show(&value, &Policy::default())
    }

    #[test]
    fn policy_flags_override_only_what_is_given() {
        let args = PolicyArgs {
            max_visible_bytes: Some(8),
            ..PolicyArgs::default()
        };
        let p = args.apply(Policy::default());
        assert_eq!(p.max_visible_bytes, 8);
        assert_eq!(p.max_probe_bytes, Policy::default().max_probe_bytes);
        assert_eq!(p.max_elements, Policy::default().max_elements);
    }

    #[test]
    fn scalars_render_like_the_runtime() {
        assert_eq!(show_json("i32", json!(-7)).text, "-7");
        assert_eq!(show_json("i64", json!(1_i64 << 40)).text, "1099511627776");
        assert_eq!(show_json("f64", json!(3.14159265)).text, "3.14159");
        assert_eq!(show_json("f32", json!(0.5)).text, "0.5");
        assert_eq!(show_json("bool", json!(true)).text, "true");
        assert_eq!(show_json("bool", json!(0)).text, "false");
        assert_eq!(show_json("text", json!("hi")).text, "hi");
    }

    #[test]
    fn containers_render_in_order() {
        let r = show_json("array", json!([1, 2, 3]));
        assert_eq!(r.text, "[1, 2, 3]");
        assert_eq!(r.tag_code, TAG_ARRAY);
        assert_eq!(r.outcome, Outcome::Value);

        let r = show_json("object", json!({"z": 1, "a": 2}));
        assert_eq!(r.text, "{z: 1, a: 2}");
        assert_eq!(r.tag_code, TAG_OBJECT);
    }

    #[test]
    fn shape_mismatches_are_errors() {
        let err = stage_json(ValueTag::Array, &json!({"a": 1})).unwrap_err();
        assert!(format!("{err:#}").contains("expected a JSON array"));
        let err = stage_json(ValueTag::Array, &json!([1, "x"])).unwrap_err();
        assert!(format!("{err:#}").contains("array[1]"));
        let err = stage_json(ValueTag::Scalar(ScalarKind::I32), &json!(1_i64 << 33)).unwrap_err();
        assert!(format!("{err:#}").contains("does not fit"));
        assert!(stage_json(ValueTag::Scalar(ScalarKind::Text), &json!("a\u{0}b")).is_err());
    }

    #[test]
    fn raw_tags_stage_by_their_known_layout() {
        let v = StagedValue::from_raw_tag(TAG_TEXT, &json!("raw")).expect("stage");
        assert_eq!(v.tag_code(), TAG_TEXT);
        assert_eq!(show(&v, &Policy::default()).text, "raw");
        assert!(StagedValue::from_raw_tag(TAG_TEXT, &json!(5)).is_err());
    }

    #[test]
    fn null_and_unknown_outcomes() {
        let r = show(&StagedValue::null(TAG_ARRAY), &Policy::default());
        assert_eq!(r.outcome, Outcome::Null);
        assert_eq!(r.text, "(null array)");

        let r = show(&StagedValue::null(TAG_TEXT), &Policy::default());
        assert_eq!(r.text, "(null)");

        let unknown = StagedValue::from_raw_tag(99, &json!(null)).expect("stage");
        let r = show(&unknown, &Policy::default());
        assert_eq!(r.outcome, Outcome::Unknown);
        assert_eq!(r.tag, "unknown");
        assert!(r.text.starts_with("(unknown type_id=99, ptr=0x"));
    }

    #[test]
    fn long_text_is_flagged_truncated() {
        let long = "x".repeat(301);
        let r = show_json("text", json!(long));
        assert!(r.truncated);
        assert!(r.text.ends_with("... [truncated 1 bytes]"));
    }

    #[test]
    fn element_cap_is_reported() {
        let value = StagedValue::from_json(ValueTag::Array, &json!([1, 2, 3, 4])).expect("stage");
        let policy = PolicyArgs {
            max_elements: Some(2),
            ..PolicyArgs::default()
        }
        .apply(Policy::default());
        let r = show(&value, &policy);
        assert_eq!(r.elided, 2);
        assert_eq!(r.text, "[1, 2, ... [2 more]]");
    }

    #[test]
    fn probe_reports_every_heuristic() {
        let r = probe_bytes(b"caf\xc3\xa9", &Policy::default());
        assert!(r.probably_valid);
        assert!(r.looks_like_text);
        assert!(!r.plain_ascii);
        assert_eq!(r.text, "caf\u{e9}");
        assert_eq!(r.hex, "636166c3a9");

        let r = probe_bytes(&[0xc3, 0x28], &Policy::default());
        assert!(!r.looks_like_text);
        assert!(r.text.starts_with("(invalid UTF-8 or ptr=0x"));
    }

    #[test]
    fn report_json_carries_schema_version() {
        let r = show_json("f64", json!(2.5));
        assert_eq!(r.tag_code, TAG_F64);
        let v = serde_json::to_value(&r).expect("serialize");
        assert_eq!(v["schema_version"], WPP_INSPECT_REPORT_SCHEMA_VERSION);
        assert_eq!(v["outcome"], "value");
        assert_eq!(v["tag"], "f64");
        assert_eq!(show_json("i32", json!(1)).tag_code, TAG_I32);
    }
}

#![no_main]

use libfuzzer_sys::fuzz_target;
use wpp_inspect::{Policy, ValueTag};
use wpp_inspect_cli::{show, Outcome, StagedValue};

const TAGS: [&str; 8] = ["i32", "i64", "f32", "f64", "bool", "text", "array", "object"];

fuzz_target!(|data: &[u8]| {
    let Some((&selector, rest)) = data.split_first() else {
        return;
    };
    let rest = if rest.len() > 64 * 1024 {
        &rest[..64 * 1024]
    } else {
        rest
    };
    let Ok(v) = serde_json::from_slice::<serde_json::Value>(rest) else {
        return;
    };
    let Some(tag) = ValueTag::parse(TAGS[selector as usize % TAGS.len()]) else {
        return;
    };
    let Ok(value) = StagedValue::from_json(tag, &v) else {
        return;
    };

    let report = show(&value, &Policy::default());
    assert_eq!(report.outcome, Outcome::Value, "{}", report.text);
});
